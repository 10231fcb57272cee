//! Inbound interaction payloads and the entities they reference
//!
//! Deserialisation is lenient: anything beyond the fields used for argument
//! resolution is ignored, and missing tables default to empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use std::collections::HashMap;

use super::types::OptionType;

/// Interaction kind as sent on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    ApplicationCommand,
    Autocomplete,
}

/// `data` of an application command or autocomplete interaction
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InteractionData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<OptionData>,
    #[serde(default)]
    pub resolved: ResolvedData,
}

/// One node of the option tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionData {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionData>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub focused: bool,
}

impl OptionData {
    pub fn option_type(&self) -> Option<OptionType> {
        OptionType::from_value(self.kind)
    }

    /// Raw entity id carried by a user/role/channel/mentionable option
    pub fn entity_id(&self) -> Option<String> {
        match self.value.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Side table of full entity records keyed by snowflake
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolvedData {
    #[serde(default)]
    pub members: HashMap<String, MemberRecord>,
    #[serde(default)]
    pub users: HashMap<String, UserRecord>,
    #[serde(default)]
    pub roles: HashMap<String, RoleRecord>,
    #[serde(default)]
    pub channels: HashMap<String, ChannelRecord>,
}

impl ResolvedData {
    /// Member record with its user record spliced in, bound to `guild_id`
    pub fn member(&self, id: &str, guild_id: Option<GuildId>) -> Option<Member> {
        let record = self.members.get(id)?;
        let user = self.users.get(id).cloned().or_else(|| record.user.clone())?;
        Some(Member {
            guild_id,
            user,
            nick: record.nick.clone(),
            roles: record.roles.clone(),
            joined_at: record.joined_at,
        })
    }

    pub fn user(&self, id: &str) -> Option<UserRecord> {
        self.users.get(id).cloned()
    }

    pub fn role(&self, id: &str, guild_id: Option<GuildId>) -> Option<Role> {
        self.roles.get(id).map(|r| Role {
            guild_id,
            id: r.id,
            name: r.name.clone(),
            color: r.color,
            position: r.position,
            mentionable: r.mentionable,
        })
    }

    pub fn channel(&self, id: &str, guild_id: Option<GuildId>) -> Option<Channel> {
        self.channels.get(id).map(|c| Channel {
            guild_id,
            id: c.id,
            name: c.name.clone(),
            kind: c.kind,
            parent_id: c.parent_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(rename = "username", alias = "name", default)]
    pub name: String,
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl UserRecord {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id.0)
    }
}

/// Guild-specific part of a member, as found in `resolved.members`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MemberRecord {
    #[serde(default)]
    pub user: Option<UserRecord>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<RoleId>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: RoleId,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "colour")]
    pub color: u32,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub mentionable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: ChannelId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: u8,
    #[serde(default)]
    pub parent_id: Option<ChannelId>,
}

/// A guild member bound to the guild it was resolved in
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub guild_id: Option<GuildId>,
    pub user: UserRecord,
    pub nick: Option<String>,
    pub roles: Vec<RoleId>,
    pub joined_at: Option<DateTime<Utc>>,
}

impl Member {
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or(&self.user.name)
    }

    pub fn mention(&self) -> String {
        self.user.mention()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub guild_id: Option<GuildId>,
    pub id: RoleId,
    pub name: String,
    pub color: u32,
    pub position: i64,
    pub mentionable: bool,
}

impl Role {
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.id.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub guild_id: Option<GuildId>,
    pub id: ChannelId,
    pub name: Option<String>,
    pub kind: u8,
    pub parent_id: Option<ChannelId>,
}

impl Channel {
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id.0)
    }
}
