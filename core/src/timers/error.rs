//! Error types for timer table operations

use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by the timer table and the control surface
#[derive(Debug, Error)]
pub enum TimerError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("all {capacity} timer slots are in use")]
    CapacityExceeded { capacity: usize },

    #[error("failed to persist timer")]
    Store(#[from] StoreError),
}

impl TimerError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}
