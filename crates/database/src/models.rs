//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::DatabaseError;

/// Kind of conversation subject: a private peer or a group chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Peer,
    Chat,
}

impl SubjectKind {
    /// Column value used in the schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Peer => "peer",
            SubjectKind::Chat => "chat",
        }
    }

    /// Parse a column value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "peer" => Some(SubjectKind::Peer),
            "chat" => Some(SubjectKind::Chat),
            _ => None,
        }
    }
}

/// A conversation subject: the key quota, rules, and locks hang off.
///
/// The id is the internal row id (`peers.id` or `chats.id`), never the
/// external Telegram identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    pub kind: SubjectKind,
    pub id: i64,
}

impl Subject {
    pub fn peer(id: i64) -> Self {
        Self {
            kind: SubjectKind::Peer,
            id,
        }
    }

    pub fn chat(id: i64) -> Self {
        Self {
            kind: SubjectKind::Chat,
            id,
        }
    }

    /// Rebuild a subject from its stored columns.
    pub fn from_columns(kind: &str, id: i64) -> Result<Self, DatabaseError> {
        let kind = SubjectKind::parse(kind)
            .ok_or_else(|| DatabaseError::InvalidSubjectKind(kind.to_string()))?;
        Ok(Self { kind, id })
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

/// A private-chat counterpart, identified by their Telegram user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Peer {
    /// Internal id, assigned once and never reused.
    pub id: i64,
    /// Telegram user id.
    pub tg_peer_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_bot: bool,
    /// Member of the privileged "personal" folder.
    pub in_personal: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Peer {
    /// Display name for logs: first name, else username, else the id.
    pub fn display_name(&self) -> String {
        self.first_name
            .clone()
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| format!("ID:{}", self.tg_peer_id))
    }
}

/// A group chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Chat {
    /// Internal id.
    pub id: i64,
    /// Telegram chat id.
    pub tg_chat_id: i64,
    pub title: Option<String>,
    pub created_at: String,
}

/// A row in the append-only message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StoredMessage {
    pub id: i64,
    pub subject_kind: String,
    pub subject_id: i64,
    /// Telegram message id, unique within the conversation.
    pub tg_message_id: i64,
    /// True if the account itself sent the message.
    pub from_me: bool,
    /// RFC 3339 timestamp.
    pub date: String,
    pub text: Option<String>,
    /// Telegram message id this message replies to, if any.
    pub reply_to_id: Option<i64>,
    pub has_media: bool,
}

impl StoredMessage {
    /// The subject this message belongs to.
    pub fn subject(&self) -> Result<Subject, DatabaseError> {
        Subject::from_columns(&self.subject_kind, self.subject_id)
    }
}

/// An auto-reply rule bound to one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ReplyRule {
    pub id: i64,
    pub account_id: i64,
    pub subject_kind: String,
    pub subject_id: i64,
    /// Reply mode: "ai", "template", or "off".
    pub mode: String,
    /// Literal reply text for template mode.
    pub template: Option<String>,
    /// Per-rule system prompt override for ai mode.
    pub prompt: Option<String>,
    /// Minimum seconds between replies to this subject.
    pub min_interval_sec: i64,
    pub enabled: bool,
    pub created_at: String,
}

impl ReplyRule {
    /// The subject this rule is bound to.
    pub fn subject(&self) -> Result<Subject, DatabaseError> {
        Subject::from_columns(&self.subject_kind, self.subject_id)
    }
}

/// A group-chat trigger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ChatTrigger {
    pub id: i64,
    pub chat_id: i64,
    /// Trigger kind: "mention", "reply", "keyword", or "random".
    pub kind: String,
    /// JSON array of keywords for the keyword kind.
    pub keywords: Option<String>,
    /// Firing probability in [0, 1] for the random kind.
    pub probability: Option<f64>,
    /// Seconds between replies in this chat.
    pub cooldown_sec: i64,
    /// Maximum replies per calendar day for this chat.
    pub daily_cap: i64,
    pub enabled: bool,
    pub created_at: String,
}

impl ChatTrigger {
    /// Parse the keyword list, tolerating a missing or malformed column.
    pub fn keyword_list(&self) -> Vec<String> {
        self.keywords
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }
}

/// Per-subject reply counters and last-reply state.
///
/// Mutated only by the decision engine, after a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct QuotaState {
    pub account_id: i64,
    pub subject_kind: String,
    pub subject_id: i64,
    /// Replies sent on `last_reply_date`.
    pub replies_today: i64,
    /// Cumulative replies while the contact was not in the personal folder.
    pub new_contact_replies: i64,
    /// Calendar day (YYYY-MM-DD) the daily counter belongs to.
    pub last_reply_date: Option<String>,
    /// RFC 3339 timestamp of the last reply.
    pub last_reply_at: Option<String>,
    /// Internal id of the last message replied to.
    pub last_message_id: Option<i64>,
}
