//! Wire enumerations and the declared-type mapping table

use serde::{Serialize, Serializer};

/// Application command option type as sent on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OptionType {
    SubCommand = 1,
    SubCommandGroup = 2,
    String = 3,
    Integer = 4,
    Boolean = 5,
    User = 6,
    Channel = 7,
    Role = 8,
    Mentionable = 9,
    Number = 10,
}

impl OptionType {
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Option<Self> {
        Some(match value {
            1 => OptionType::SubCommand,
            2 => OptionType::SubCommandGroup,
            3 => OptionType::String,
            4 => OptionType::Integer,
            5 => OptionType::Boolean,
            6 => OptionType::User,
            7 => OptionType::Channel,
            8 => OptionType::Role,
            9 => OptionType::Mentionable,
            10 => OptionType::Number,
            _ => return None,
        })
    }

    /// Types whose wire value is taken literally
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            OptionType::String | OptionType::Integer | OptionType::Number | OptionType::Boolean
        )
    }
}

impl Serialize for OptionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.value())
    }
}

/// Top-level application command kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ApplicationCommandType {
    ChatInput = 1,
    User = 2,
    Message = 3,
}

impl ApplicationCommandType {
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// The value type a handler parameter is declared with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Member,
    User,
    TextChannel,
    VoiceChannel,
    CategoryChannel,
    Channel,
    Role,
    Mentionable,
    /// `T` or absent. Displayed as optional, mapped like `T`.
    Optional(Box<ParamType>),
    /// Anything without a dedicated wire type
    Other(&'static str),
}

impl ParamType {
    pub fn optional(inner: ParamType) -> Self {
        ParamType::Optional(Box::new(inner))
    }

    /// Map the declared type to its wire option type. Unknown types are strings.
    pub fn option_type(&self) -> OptionType {
        match self {
            ParamType::Integer => OptionType::Integer,
            ParamType::Number => OptionType::Number,
            ParamType::Boolean => OptionType::Boolean,
            ParamType::Member | ParamType::User => OptionType::User,
            ParamType::TextChannel
            | ParamType::VoiceChannel
            | ParamType::CategoryChannel
            | ParamType::Channel => OptionType::Channel,
            ParamType::Role => OptionType::Role,
            ParamType::Mentionable => OptionType::Mentionable,
            ParamType::Optional(inner) => inner.option_type(),
            ParamType::String | ParamType::Other(_) => OptionType::String,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, ParamType::Optional(_))
    }

    /// The type shown to users, with one optional layer removed
    pub fn display_type(&self) -> &ParamType {
        match self {
            ParamType::Optional(inner) => inner,
            other => other,
        }
    }
}
