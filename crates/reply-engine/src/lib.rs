//! The auto-reply decision engine.
//!
//! For each incoming message the [`ReplyEngine`] decides whether, how, and
//! with what content to respond:
//!
//! 1. Filter: own messages, bots, system accounts, duplicates.
//! 2. Resolve: the applicable reply mode (ai / template / off) from the
//!    subject's rule, the personal-folder flag, and global settings.
//! 3. Trigger (groups only): mention, reply-to-self, keyword, or random.
//! 4. Quota: daily caps, new-contact cap, interval/cooldown gates.
//! 5. Generate: template text, or an AI completion with local/remote
//!    fallback.
//! 6. Dispatch, then commit quota and record the outbound message.
//!
//! Messages for the same subject are serialized through a keyed lock map;
//! unrelated conversations are processed concurrently.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use database::Database;
//! use reply_engine::{
//!     EngineConfig, EventListener, LoggingTransport, ReplyEngine, ResponseGenerator,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:autoreply.db?mode=rwc").await?;
//! db.migrate().await?;
//!
//! let local = Arc::new(local_provider::LocalProvider::from_env()?);
//! let claude = Arc::new(claude_provider::ClaudeProvider::from_env()?);
//! let generator = ResponseGenerator::new(local, claude);
//!
//! let engine = Arc::new(ReplyEngine::new(
//!     db,
//!     generator,
//!     Arc::new(LoggingTransport::new()),
//!     EngineConfig::with_username("mybot"),
//! ));
//!
//! // `events` is the transport's inbound stream.
//! # let events = futures::stream::empty();
//! EventListener::new(engine)
//!     .run_with_shutdown(events, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod event;
pub mod generator;
pub mod ledger;
pub mod listener;
pub mod locks;
pub mod resolver;
pub mod settings;
pub mod transport;
pub mod trigger;

pub use engine::{EngineConfig, Outcome, ReplyEngine};
pub use error::EngineError;
pub use event::{Conversation, ConversationKind, MessageEvent, SenderProfile};
pub use generator::{GenerationFailure, ResponseGenerator};
pub use ledger::{DenyReason, QuotaPolicy};
pub use listener::{EventListener, ListenerError};
pub use resolver::{ReplyMode, ResolvedPolicy};
pub use settings::{Engine, GlobalSettings, NewContactMode};
pub use transport::{
    LoggingTransport, NoopTransport, RecordingTransport, SendReceipt, Transport, TransportError,
};
pub use trigger::TriggerHit;
