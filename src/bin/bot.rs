use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::Arc;

use slashkit::commands::{
    ArgValue, Arguments, Choice, CommandCallback, CommandOption, CommandRegistry, Context as CommandContext,
    ContextBase, Converter, Parameter, ParamType, SlashCommand, SlashGroup, SuggestionProvider,
};
use slashkit::core::{Config, Reply};
use slashkit::framework::{Framework, FrameworkOptions};
use slashkit::serenity_adapter::{
    autocomplete_context, command_context, message_context, SerenityRegistrar,
};

const PALETTE: &[(&str, &str)] = &[
    ("Crimson", "crimson"),
    ("Teal", "teal"),
    ("Gold", "gold"),
    ("Indigo", "indigo"),
    ("Coral", "coral"),
];

/// Color names with prefix completion
struct Palette;

#[async_trait]
impl Converter for Palette {
    fn suggestions(&self) -> Option<&dyn SuggestionProvider> {
        Some(self)
    }
}

#[async_trait]
impl SuggestionProvider for Palette {
    async fn get_suggestions(&self, _ctx: &CommandContext, partial: &str) -> Result<Vec<Choice>> {
        let partial = partial.to_lowercase();
        Ok(PALETTE
            .iter()
            .filter(|(_, value)| value.starts_with(&partial))
            .map(|(name, value)| Choice::new(*name, *value))
            .collect())
    }
}

struct Echo;

#[async_trait]
impl CommandCallback for Echo {
    async fn call(&self, ctx: &CommandContext, args: Arguments) -> Result<()> {
        let text = args.get_str("text").unwrap_or_default();
        let times = args.get_i64("times").unwrap_or(1).clamp(1, 5) as usize;
        ctx.say(vec![text; times].join("\n")).await?;
        Ok(())
    }
}

struct Greet;

#[async_trait]
impl CommandCallback for Greet {
    async fn call(&self, ctx: &CommandContext, args: Arguments) -> Result<()> {
        let mention = match args.user("member") {
            Some(user) => user.mention(),
            None => ctx.author().mention(),
        };
        ctx.say(format!("👋 Hello, {mention}!")).await?;
        Ok(())
    }
}

struct Language;

#[async_trait]
impl CommandCallback for Language {
    async fn call(&self, ctx: &CommandContext, args: Arguments) -> Result<()> {
        let lang = args.get_str("language").unwrap_or("en");
        ctx.send(Reply::new(format!("🌐 Language set to `{lang}`")).ephemeral(true))
            .await?;
        Ok(())
    }
}

struct Paint;

#[async_trait]
impl CommandCallback for Paint {
    async fn call(&self, ctx: &CommandContext, args: Arguments) -> Result<()> {
        let color = args.get_str("color").unwrap_or("gold");
        // auto-deferred, so this lands as a followup
        tokio::time::sleep(std::time::Duration::from_secs(4)).await;
        ctx.say(format!("🎨 Painted everything {color}")).await?;
        Ok(())
    }
}

fn build_registry() -> Result<CommandRegistry> {
    let mut registry = CommandRegistry::new();

    registry.register(
        SlashCommand::from_fn("ping", |ctx, _args| {
            Box::pin(async move {
                ctx.say("🏓 Pong!").await?;
                Ok::<_, anyhow::Error>(())
            })
        })
        .description("Check that the bot is alive"),
    )?;

    registry.register(
        SlashCommand::new("echo", Echo)
            .description("Repeat a message")
            .param(
                Parameter::new("text", ParamType::String)
                    .option(CommandOption::required("What to say"))
                    .consume_rest(),
            )
            .param(
                Parameter::new("times", ParamType::Integer)
                    .option(CommandOption::with_default("How many times", 1i64)),
            ),
    )?;

    registry.register(
        SlashCommand::new("greet", Greet)
            .description("Say hello to someone")
            .param(
                Parameter::new("member", ParamType::optional(ParamType::Member))
                    .option(CommandOption::optional("Who to greet").display_name("who")),
            ),
    )?;

    registry.register(
        SlashGroup::new("settings")
            .description("Personal settings")
            .command(
                SlashCommand::new("language", Language)
                    .description("Pick your language")
                    .param(
                        Parameter::new("language", ParamType::String).option(
                            CommandOption::with_default("Language code", ArgValue::from("en"))
                                .choice("English", "en")
                                .choice("Deutsch", "de")
                                .choice("Français", "fr"),
                        ),
                    ),
            )?,
    )?;

    registry.register(
        SlashCommand::new("paint", Paint)
            .description("Paint with a color, slowly")
            .auto_defer(false)
            .param(
                Parameter::new("color", ParamType::String)
                    .option(CommandOption::required("Color to use"))
                    .converter(Arc::new(Palette)),
            ),
    )?;

    Ok(registry)
}

struct Handler {
    framework: Arc<Framework>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let mut context = message_context(&ctx, &msg);
        if let Err(e) = self.framework.dispatch_message(&mut context).await {
            self.framework.report_error(&context, &e).await;
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
        info!("Bot is in {} guilds", ready.guilds.len());

        let registrar = SerenityRegistrar::new(ctx.http.clone());
        if let Err(e) = self.framework.sync_on_ready(&registrar).await {
            error!("❌ Failed to register commands: {e}");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::ApplicationCommand(command) => {
                let mut context = match command_context(&ctx, &command) {
                    Ok(context) => context,
                    Err(e) => {
                        error!("Failed to read slash command '{}': {}", command.data.name, e);
                        return;
                    }
                };
                if let Err(e) = self.framework.dispatch_interaction(&mut context).await {
                    error!("Error handling slash command '{}': {}", command.data.name, e);
                    self.framework.report_error(&context, &e).await;
                }
            }
            Interaction::Autocomplete(autocomplete) => {
                let result = match autocomplete_context(&ctx, &autocomplete) {
                    Ok(mut context) => self.framework.dispatch_interaction(&mut context).await.map_err(anyhow::Error::from),
                    Err(e) => Err(e),
                };
                if let Err(e) = result {
                    error!("Error handling autocomplete for '{}': {}", autocomplete.data.name, e);
                }
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting slashkit demo bot...");

    let registry = build_registry()?;
    info!(
        "📋 Registered {} commands: {}",
        registry.len(),
        registry.command_names().collect::<Vec<_>>().join(", ")
    );
    let framework = Arc::new(Framework::new(registry, FrameworkOptions::from(&config)));

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(Handler { framework })
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Establishing WebSocket connection to Discord gateway...");
    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
