//! Group trigger matching: whether a group message warrants a reply.

use std::time::Duration;

use database::{message, ChatTrigger, SqlitePool, Subject};
use rand::Rng;
use tracing::debug;

use crate::error::EngineError;
use crate::event::MessageEvent;

/// A matched trigger with the rate parameters it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerHit {
    pub kind: String,
    pub cooldown: Duration,
    pub daily_cap: i64,
}

impl From<&ChatTrigger> for TriggerHit {
    fn from(trigger: &ChatTrigger) -> Self {
        Self {
            kind: trigger.kind.clone(),
            cooldown: Duration::from_secs(trigger.cooldown_sec.max(0) as u64),
            daily_cap: trigger.daily_cap,
        }
    }
}

fn matches_mention(text: &str, self_username: Option<&str>) -> bool {
    let Some(username) = self_username else {
        return false;
    };
    let needle = format!("@{}", username.to_lowercase());
    text.to_lowercase().contains(&needle)
}

fn matches_keywords(text: &str, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return false;
    }
    let text = text.to_lowercase();
    keywords.iter().any(|kw| {
        let kw = kw.trim().to_lowercase();
        !kw.is_empty() && text.contains(&kw)
    })
}

fn matches_random(probability: Option<f64>) -> bool {
    let Some(p) = probability else {
        return false;
    };
    // Independent draw per evaluation: intentionally not deterministic
    // per message.
    rand::thread_rng().gen::<f64>() < p.clamp(0.0, 1.0)
}

/// Evaluate one trigger against a message.
async fn matches(
    pool: &SqlitePool,
    subject: &Subject,
    trigger: &ChatTrigger,
    event: &MessageEvent,
    self_username: Option<&str>,
) -> Result<bool, EngineError> {
    let text = event.text.as_deref().unwrap_or("");

    let hit = match trigger.kind.as_str() {
        "mention" => matches_mention(text, self_username),
        "reply" => match event.reply_to_id {
            Some(reply_to) => message::is_own_message(pool, subject, reply_to).await?,
            None => false,
        },
        "keyword" => matches_keywords(text, &trigger.keyword_list()),
        "random" => matches_random(trigger.probability),
        other => {
            debug!("Unknown trigger kind {:?} for chat {}", other, trigger.chat_id);
            false
        }
    };

    Ok(hit)
}

/// Evaluate the chat's enabled triggers in order, returning the first match.
///
/// Kinds are OR-combined; the first matching trigger supplies the cooldown
/// and daily cap for the quota check.
pub async fn first_match(
    pool: &SqlitePool,
    subject: &Subject,
    triggers: &[ChatTrigger],
    event: &MessageEvent,
    self_username: Option<&str>,
) -> Result<Option<TriggerHit>, EngineError> {
    for trigger in triggers {
        if matches(pool, subject, trigger, event, self_username).await? {
            debug!(
                "Trigger {} matched for {} (message {})",
                trigger.kind, subject, event.external_message_id
            );
            return Ok(Some(TriggerHit::from(trigger)));
        }
    }
    Ok(None)
}
