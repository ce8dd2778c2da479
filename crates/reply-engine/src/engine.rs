//! The decision engine: sequences filtering, resolution, trigger matching,
//! quota checks, generation, and dispatch for each incoming message.

use std::sync::Arc;

use chrono::Utc;
use database::peer::PeerProfile;
use database::{chat, message, peer, quota, rule, settings, trigger as trigger_store};
use database::{Database, DatabaseError, Peer, Subject};
use provider_core::ChatTurn;
use tracing::{debug, error, info, warn};

use crate::error::EngineError;
use crate::event::{ConversationKind, MessageEvent};
use crate::generator::ResponseGenerator;
use crate::ledger::{self, DenyReason, QuotaPolicy};
use crate::locks::SubjectLocks;
use crate::resolver::{self, ReplyMode, ResolvedPolicy};
use crate::settings::GlobalSettings;
use crate::transport::Transport;
use crate::trigger;

/// Telegram's service-notification account.
const SYSTEM_ACCOUNT_ID: i64 = 777_000;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Owning account, scoping rules and quota rows.
    pub account_id: i64,
    /// The account's own username, used by the mention trigger.
    pub self_username: Option<String>,
    /// Sender ids filtered out before any decisioning.
    pub system_account_ids: Vec<i64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            account_id: 1,
            self_username: None,
            system_account_ids: vec![SYSTEM_ACCOUNT_ID],
        }
    }
}

impl EngineConfig {
    pub fn with_username(self_username: impl Into<String>) -> Self {
        Self {
            self_username: Some(self_username.into()),
            ..Default::default()
        }
    }
}

/// Structured outcome of processing one message.
#[derive(Debug)]
pub enum Outcome {
    /// A reply was dispatched and the quota committed.
    Replied {
        subject: Subject,
        message_id: i64,
        text: String,
    },
    /// The message required no reply (filtered, off, duplicate, no trigger).
    Skipped { reason: String },
    /// Quota or interval denied a reply that would otherwise have been sent.
    Denied {
        subject: Subject,
        reason: DenyReason,
    },
    /// Generation or dispatch failed; nothing was sent, no quota consumed.
    Failed { reason: String },
}

/// The per-message orchestrator.
///
/// Holds no per-conversation state between messages; everything is re-read
/// from storage so admin writes take effect immediately.
pub struct ReplyEngine {
    db: Database,
    generator: ResponseGenerator,
    transport: Arc<dyn Transport>,
    locks: SubjectLocks,
    config: EngineConfig,
}

impl ReplyEngine {
    pub fn new(
        db: Database,
        generator: ResponseGenerator,
        transport: Arc<dyn Transport>,
        config: EngineConfig,
    ) -> Self {
        Self {
            db,
            generator,
            transport,
            locks: SubjectLocks::new(),
            config,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Process one message event to completion.
    ///
    /// Never returns an error: storage and transport failures degrade to a
    /// [`Outcome::Failed`] for this message only, and the stream continues.
    pub async fn process(&self, event: &MessageEvent) -> Outcome {
        match self.process_inner(event).await {
            Ok(outcome) => {
                match &outcome {
                    Outcome::Replied { subject, message_id, .. } => {
                        info!("Replied to {} (message {})", subject, message_id);
                    }
                    Outcome::Skipped { reason } => debug!("Skipped: {}", reason),
                    Outcome::Denied { subject, reason } => {
                        info!("Denied for {}: {}", subject, reason);
                    }
                    Outcome::Failed { reason } => warn!("Failed: {}", reason),
                }
                outcome
            }
            Err(e) => {
                error!(
                    "Error processing message {}: {}",
                    event.external_message_id, e
                );
                Outcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn process_inner(&self, event: &MessageEvent) -> Result<Outcome, EngineError> {
        if !event.outgoing && self.config.system_account_ids.contains(&event.sender.tg_user_id) {
            return Ok(Outcome::Skipped {
                reason: "system account".to_string(),
            });
        }

        let (subject, peer) = self.subject_for(event).await?;

        // The unique constraint doubles as the exactly-once guard: a message
        // already seen is never decisioned again.
        let inserted = message::save_message(
            self.db.pool(),
            &subject,
            event.external_message_id,
            event.outgoing,
            &event.timestamp.to_rfc3339(),
            event.text.as_deref(),
            event.reply_to_id,
        )
        .await?;

        if !inserted {
            return Ok(Outcome::Skipped {
                reason: "duplicate message".to_string(),
            });
        }

        // Outbound and bot messages are kept for context but never replied to.
        if event.outgoing {
            return Ok(Outcome::Skipped {
                reason: "own message".to_string(),
            });
        }
        if event.sender.is_bot {
            return Ok(Outcome::Skipped {
                reason: "bot sender".to_string(),
            });
        }
        if event.text.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Ok(Outcome::Skipped {
                reason: "no text".to_string(),
            });
        }

        // Serialize check-to-commit per subject. Unrelated subjects proceed
        // concurrently.
        let lock = self.locks.lock_for(subject);
        let _guard = lock.lock().await;

        let global = GlobalSettings::from_map(&settings::load_all(self.db.pool()).await?);
        let stored_rule =
            rule::get_for_subject(self.db.pool(), self.config.account_id, &subject).await?;

        let (policy, quota_policy) = match event.conversation.kind {
            ConversationKind::Private => {
                let Some(peer) = peer.as_ref() else {
                    return Ok(Outcome::Skipped {
                        reason: "no peer for private message".to_string(),
                    });
                };
                let policy = resolver::resolve_private(peer, stored_rule.as_ref(), &global);
                debug!(
                    "Resolved mode for {}: {:?}",
                    peer.display_name(),
                    policy.mode
                );
                if policy.mode == ReplyMode::Off {
                    return Ok(Outcome::Skipped {
                        reason: "mode off".to_string(),
                    });
                }
                let new_contact_cap = policy
                    .is_new_contact
                    .then_some(global.new_contact_max_replies);
                let quota_policy = QuotaPolicy::private(
                    global.daily_max_replies,
                    new_contact_cap,
                    policy.min_interval,
                );
                (policy, quota_policy)
            }
            ConversationKind::Group => {
                let policy = resolver::resolve_group(stored_rule.as_ref(), &global);
                if policy.mode == ReplyMode::Off {
                    return Ok(Outcome::Skipped {
                        reason: "mode off".to_string(),
                    });
                }
                match self.match_triggers(&subject, event).await? {
                    Some(hit) => {
                        let cooldown = hit.cooldown.max(policy.min_interval);
                        let quota_policy = QuotaPolicy::group(hit.daily_cap, cooldown);
                        (policy, quota_policy)
                    }
                    None => {
                        return Ok(Outcome::Skipped {
                            reason: "no trigger matched".to_string(),
                        })
                    }
                }
            }
        };

        let now = Utc::now();
        let state = quota::get_state(self.db.pool(), self.config.account_id, &subject).await?;
        if let Err(reason) = ledger::check(state.as_ref(), &quota_policy, now) {
            return Ok(Outcome::Denied { subject, reason });
        }

        // A failed generation or dispatch aborts here: no quota is consumed
        // and there is no in-cycle retry. The next inbound message starts a
        // fresh cycle.
        let context = self.context_window(&subject, global.context_window).await?;
        let text = self.generator.generate(&policy.mode, &global, context).await?;
        let receipt = self.transport.send_text(&event.conversation, &text).await?;

        self.record_reply(&subject, event, &policy, &text, &receipt).await?;

        Ok(Outcome::Replied {
            subject,
            message_id: receipt.message_id,
            text,
        })
    }

    /// Map the event to its subject, refreshing peer/chat rows on the way.
    async fn subject_for(
        &self,
        event: &MessageEvent,
    ) -> Result<(Subject, Option<Peer>), EngineError> {
        match event.conversation.kind {
            ConversationKind::Group => {
                let stored = chat::ensure_chat(
                    self.db.pool(),
                    event.conversation.external_id,
                    event.chat_title.as_deref(),
                )
                .await?;

                // Keep the sender's profile fresh even in groups.
                if !event.outgoing && event.sender.tg_user_id != 0 {
                    peer::upsert_peer(self.db.pool(), &profile_from(event)).await?;
                }

                Ok((Subject::chat(stored.id), None))
            }
            ConversationKind::Private => {
                let stored = if event.outgoing {
                    // Own message: the counterpart is the conversation, and
                    // the event carries no profile for them.
                    match peer::get_peer_by_tg_id(self.db.pool(), event.conversation.external_id)
                        .await
                    {
                        Ok(found) => found,
                        Err(DatabaseError::NotFound { .. }) => {
                            peer::upsert_peer(
                                self.db.pool(),
                                &PeerProfile {
                                    tg_peer_id: event.conversation.external_id,
                                    username: None,
                                    first_name: None,
                                    last_name: None,
                                    is_bot: false,
                                },
                            )
                            .await?
                        }
                        Err(e) => return Err(e.into()),
                    }
                } else {
                    peer::upsert_peer(self.db.pool(), &profile_from(event)).await?
                };

                Ok((Subject::peer(stored.id), Some(stored)))
            }
        }
    }

    async fn match_triggers(
        &self,
        subject: &Subject,
        event: &MessageEvent,
    ) -> Result<Option<trigger::TriggerHit>, EngineError> {
        let triggers = trigger_store::enabled_for_chat(self.db.pool(), subject.id).await?;
        trigger::first_match(
            self.db.pool(),
            subject,
            &triggers,
            event,
            self.config.self_username.as_deref(),
        )
        .await
    }

    /// The bounded conversation window handed to the generator, ending with
    /// the message being replied to.
    async fn context_window(
        &self,
        subject: &Subject,
        limit: i64,
    ) -> Result<Vec<ChatTurn>, EngineError> {
        let window = message::recent_for_subject(self.db.pool(), subject, limit).await?;

        Ok(window
            .iter()
            .filter_map(|m| {
                m.text.as_ref().map(|text| {
                    if m.from_me {
                        ChatTurn::assistant(text)
                    } else {
                        ChatTurn::user(text)
                    }
                })
            })
            .collect())
    }

    /// Record the outbound message and commit the quota.
    ///
    /// Runs only after the transport acknowledged the send: a failed
    /// dispatch never consumes quota.
    async fn record_reply(
        &self,
        subject: &Subject,
        event: &MessageEvent,
        policy: &ResolvedPolicy,
        text: &str,
        receipt: &crate::transport::SendReceipt,
    ) -> Result<(), EngineError> {
        message::save_message(
            self.db.pool(),
            subject,
            receipt.message_id,
            true,
            &receipt.timestamp.to_rfc3339(),
            Some(text),
            Some(event.external_message_id),
        )
        .await?;

        let replied_to = message::get_by_tg_id(self.db.pool(), subject, event.external_message_id)
            .await?
            .map(|m| m.id);

        let now = receipt.timestamp;
        quota::commit_reply(
            self.db.pool(),
            self.config.account_id,
            subject,
            &now.format("%Y-%m-%d").to_string(),
            &now.to_rfc3339(),
            replied_to,
            policy.is_new_contact,
        )
        .await?;

        Ok(())
    }
}

fn profile_from(event: &MessageEvent) -> PeerProfile {
    PeerProfile {
        tg_peer_id: event.sender.tg_user_id,
        username: event.sender.username.clone(),
        first_name: event.sender.first_name.clone(),
        last_name: event.sender.last_name.clone(),
        is_bot: event.sender.is_bot,
    }
}
