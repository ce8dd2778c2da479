//! Inbound message events delivered by the transport collaborator.

use chrono::{DateTime, Utc};

/// Kind of conversation an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationKind {
    Private,
    Group,
}

/// The conversation an event belongs to, identified by its external
/// (Telegram) id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversation {
    pub kind: ConversationKind,
    pub external_id: i64,
}

impl Conversation {
    pub fn private(external_id: i64) -> Self {
        Self {
            kind: ConversationKind::Private,
            external_id,
        }
    }

    pub fn group(external_id: i64) -> Self {
        Self {
            kind: ConversationKind::Group,
            external_id,
        }
    }

    pub fn is_group(&self) -> bool {
        self.kind == ConversationKind::Group
    }
}

/// Sender profile fields carried on every event, used to keep the peer
/// table fresh.
#[derive(Debug, Clone, Default)]
pub struct SenderProfile {
    /// Telegram user id of the sender.
    pub tg_user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_bot: bool,
}

/// One inbound or outbound message as delivered by the transport.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    /// Message id, unique within the conversation.
    pub external_message_id: i64,
    pub conversation: Conversation,
    pub sender: SenderProfile,
    /// True if the account itself sent this message.
    pub outgoing: bool,
    pub text: Option<String>,
    /// Message id this message replies to, if any.
    pub reply_to_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    /// Group title, when the transport knows it.
    pub chat_title: Option<String>,
}

impl MessageEvent {
    /// An inbound private message with minimal profile data.
    pub fn private(tg_user_id: i64, external_message_id: i64, text: impl Into<String>) -> Self {
        Self {
            external_message_id,
            conversation: Conversation::private(tg_user_id),
            sender: SenderProfile {
                tg_user_id,
                ..Default::default()
            },
            outgoing: false,
            text: Some(text.into()),
            reply_to_id: None,
            timestamp: Utc::now(),
            chat_title: None,
        }
    }

    /// An inbound group message with minimal profile data.
    pub fn group(
        tg_chat_id: i64,
        tg_user_id: i64,
        external_message_id: i64,
        text: impl Into<String>,
    ) -> Self {
        Self {
            external_message_id,
            conversation: Conversation::group(tg_chat_id),
            sender: SenderProfile {
                tg_user_id,
                ..Default::default()
            },
            outgoing: false,
            text: Some(text.into()),
            reply_to_id: None,
            timestamp: Utc::now(),
            chat_title: None,
        }
    }
}
