//! Command callback trait and infrastructure
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Callback contract shared by text and interaction invocations

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::args::Arguments;
use super::context::Context;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for command callbacks
///
/// The callback receives the invocation context and the resolved keyword
/// arguments. It is invoked the same way whether the command came in as a
/// text message or as an interaction. State the callback needs (what a
/// bound container would carry) lives on the implementing type.
///
/// # Example
///
/// ```ignore
/// struct Ping;
///
/// #[async_trait]
/// impl CommandCallback for Ping {
///     async fn call(&self, ctx: &Context, _args: Arguments) -> Result<()> {
///         ctx.say("Pong!").await?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait CommandCallback: Send + Sync {
    async fn call(&self, ctx: &Context, args: Arguments) -> Result<()>;
}

/// Adapts a plain function returning a boxed future
pub struct FnCallback<F>(F);

#[async_trait]
impl<F> CommandCallback for FnCallback<F>
where
    F: for<'a> Fn(&'a Context, Arguments) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    async fn call(&self, ctx: &Context, args: Arguments) -> Result<()> {
        (self.0)(ctx, args).await
    }
}

/// Wrap a function as a shareable callback
pub fn from_fn<F>(f: F) -> Arc<dyn CommandCallback>
where
    F: for<'a> Fn(&'a Context, Arguments) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
{
    Arc::new(FnCallback(f))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    // Test that the trait is object-safe (can be used with dyn)
    fn _assert_object_safe(_: &dyn CommandCallback) {}

    /// Records every argument bag it is called with
    #[derive(Clone, Default)]
    pub struct Recorder {
        pub calls: Arc<Mutex<Vec<Arguments>>>,
        pub reply: Option<&'static str>,
    }

    impl Recorder {
        pub fn replying(reply: &'static str) -> Self {
            Self {
                calls: Arc::default(),
                reply: Some(reply),
            }
        }

        pub fn calls(&self) -> Vec<Arguments> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandCallback for Recorder {
        async fn call(&self, ctx: &Context, args: Arguments) -> Result<()> {
            self.calls.lock().unwrap().push(args);
            if let Some(reply) = self.reply {
                ctx.say(reply).await?;
            }
            Ok(())
        }
    }
}
