//! Event-stream listener: drives the engine from a transport's message
//! stream.
//!
//! Each event is processed on its own task; the engine's per-subject locks
//! keep same-subject messages serialized while unrelated conversations run
//! concurrently.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::engine::ReplyEngine;
use crate::event::MessageEvent;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum ListenerError {
    /// The message stream ended unexpectedly.
    #[error("message stream ended")]
    StreamEnded,
}

/// Consumes a transport's event stream and feeds the engine.
pub struct EventListener {
    engine: Arc<ReplyEngine>,
}

impl EventListener {
    pub fn new(engine: Arc<ReplyEngine>) -> Self {
        Self { engine }
    }

    fn dispatch(&self, event: MessageEvent) {
        let engine = self.engine.clone();
        tokio::spawn(async move {
            engine.process(&event).await;
        });
    }

    /// Run until the stream ends.
    pub async fn run<S>(self, stream: S) -> Result<(), ListenerError>
    where
        S: Stream<Item = Result<MessageEvent, TransportError>> + Send,
    {
        info!("Starting event listener");

        let mut stream = std::pin::pin!(stream);
        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => self.dispatch(event),
                Err(e) => {
                    // Stream errors may be transient; keep consuming.
                    error!("Stream error: {}", e);
                }
            }
        }

        warn!("Message stream ended");
        Err(ListenerError::StreamEnded)
    }

    /// Run until the stream ends or the shutdown signal completes.
    pub async fn run_with_shutdown<S, F>(self, stream: S, shutdown: F) -> Result<(), ListenerError>
    where
        S: Stream<Item = Result<MessageEvent, TransportError>> + Send,
        F: std::future::Future<Output = ()> + Send,
    {
        info!("Starting event listener (graceful shutdown enabled)");

        let mut stream = std::pin::pin!(stream);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!("Shutdown signal received, stopping event listener");
                    return Ok(());
                }

                item = stream.next() => {
                    match item {
                        Some(Ok(event)) => self.dispatch(event),
                        Some(Err(e)) => {
                            error!("Stream error: {}", e);
                        }
                        None => {
                            warn!("Message stream ended");
                            return Err(ListenerError::StreamEnded);
                        }
                    }
                }
            }
        }
    }
}
