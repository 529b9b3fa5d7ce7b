use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::render::time::parse_server_timestamp;

/// Opaque chat session id. The server hands out integers but the client
/// never does arithmetic on them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<u64> for SessionId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for SessionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("session id must not be empty".to_string());
        }
        Ok(Self::new(trimmed))
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Closed,
}

/// Who is looking at the chat widget.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewerRole {
    #[default]
    User,
    Admin,
}

impl FromStr for ViewerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "youth" | "senior" => Ok(ViewerRole::User),
            "admin" => Ok(ViewerRole::Admin),
            other => Err(format!("unknown viewer role `{other}`")),
        }
    }
}

/// Author of a message as reported by `sender_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum SenderRole {
    User,
    Admin,
    System,
}

impl From<String> for SenderRole {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => SenderRole::User,
            "admin" => SenderRole::Admin,
            _ => SenderRole::System,
        }
    }
}

impl SenderRole {
    /// Suffix of the `message-*` bubble class.
    pub fn css_suffix(&self) -> &'static str {
        match self {
            SenderRole::User => "user",
            SenderRole::Admin => "admin",
            SenderRole::System => "system",
        }
    }

    /// Whether the message was written by whoever is looking at the chat.
    pub fn is_viewer(&self, role: ViewerRole) -> bool {
        matches!(
            (self, role),
            (SenderRole::User, ViewerRole::User) | (SenderRole::Admin, ViewerRole::Admin)
        )
    }
}

/// A single chat message as returned by the message endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "sender_type")]
    pub sender: SenderRole,
    #[serde(rename = "message_text")]
    pub text: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Client-side view of a session. Only the server ever deletes one.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    pub id: SessionId,
    pub status: SessionStatus,
    pub lock_owner: Option<String>,
    pub participant: Option<String>,
    pub admin_connected: bool,
}

impl ChatSession {
    pub fn new(id: SessionId, status: SessionStatus) -> Self {
        Self {
            id,
            status,
            lock_owner: None,
            participant: None,
            admin_connected: false,
        }
    }
}

/// One full message list for a session, plus whatever session metadata the
/// endpoint piggybacks on it.
#[derive(Debug, Clone, PartialEq)]
pub struct MessagePage {
    pub session_id: SessionId,
    pub messages: Vec<ChatMessage>,
    pub status: Option<SessionStatus>,
    pub admin_connected: Option<bool>,
}

impl MessagePage {
    pub fn new(session_id: SessionId, messages: Vec<ChatMessage>) -> Self {
        Self {
            session_id,
            messages,
            status: None,
            admin_connected: None,
        }
    }
}

/// Everything needed to show a freshly opened session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub session: ChatSession,
    pub page: MessagePage,
}

/// Row of the user's chat history list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatSummary {
    pub session_id: SessionId,
    pub status: SessionStatus,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message_count: u32,
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(|value| {
        let parsed = parse_server_timestamp(value);
        if parsed.is_none() && !value.trim().is_empty() {
            log::warn!("Unrecognized server timestamp `{value}`");
        }
        parsed
    }))
}
