//! Engine error types.

use database::DatabaseError;
use thiserror::Error;

use crate::generator::GenerationFailure;
use crate::transport::TransportError;

/// Errors raised while processing one message.
///
/// None of these halt the stream; the engine degrades every variant to a
/// failed outcome for that message and keeps going.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Generation(#[from] GenerationFailure),

    #[error("dispatch failed: {0}")]
    Dispatch(#[from] TransportError),
}
