//! Outbound transport trait and implementations.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::info;

use crate::event::Conversation;

/// Transport-level send failure.
#[derive(Debug, thiserror::Error)]
#[error("send failed: {0}")]
pub struct TransportError(pub String);

/// Acknowledgement for a delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReceipt {
    /// Message id assigned by the transport, unique within the conversation.
    pub message_id: i64,
    pub timestamp: DateTime<Utc>,
}

/// Delivers replies to the messaging network.
///
/// Abstracted so the engine can be driven by tests and by different client
/// backends.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send text to a conversation. Returns a receipt on acknowledgement.
    async fn send_text(
        &self,
        conversation: &Conversation,
        text: &str,
    ) -> Result<SendReceipt, TransportError>;
}

fn receipt(counter: &AtomicI64) -> SendReceipt {
    SendReceipt {
        // Negative ids keep synthetic receipts apart from real inbound ids.
        message_id: -counter.fetch_add(1, Ordering::Relaxed),
        timestamp: Utc::now(),
    }
}

/// Discards all messages. For tests and dry runs.
#[derive(Debug, Default)]
pub struct NoopTransport {
    next_id: AtomicI64,
}

impl NoopTransport {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl Transport for NoopTransport {
    async fn send_text(
        &self,
        _conversation: &Conversation,
        _text: &str,
    ) -> Result<SendReceipt, TransportError> {
        Ok(receipt(&self.next_id))
    }
}

/// Logs every message instead of sending it.
#[derive(Debug, Default)]
pub struct LoggingTransport {
    next_id: AtomicI64,
}

impl LoggingTransport {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl Transport for LoggingTransport {
    async fn send_text(
        &self,
        conversation: &Conversation,
        text: &str,
    ) -> Result<SendReceipt, TransportError> {
        info!("Would send to {:?} {}: {}", conversation.kind, conversation.external_id, text);
        Ok(receipt(&self.next_id))
    }
}

/// Records every sent message for assertions.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<(Conversation, String)>>>,
    next_id: Arc<AtomicI64>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            fail: Arc::new(Mutex::new(false)),
        }
    }

    /// All messages sent so far, in order.
    pub async fn sent(&self) -> Vec<(Conversation, String)> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Make subsequent sends fail, to exercise the dispatch-failure path.
    pub async fn set_failing(&self, failing: bool) {
        *self.fail.lock().await = failing;
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(
        &self,
        conversation: &Conversation,
        text: &str,
    ) -> Result<SendReceipt, TransportError> {
        if *self.fail.lock().await {
            return Err(TransportError("simulated outage".to_string()));
        }
        self.sent.lock().await.push((*conversation, text.to_string()));
        Ok(receipt(&self.next_id))
    }
}
