//! Sync layer error types.

use sigdash_client::ClientError;
use sigdash_core::{CoreError, WorkerCommand};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error("Worker control '{command}' is not available in state {state}")]
    ControlDisabled {
        command: WorkerCommand,
        state: String,
    },

    #[error("Page {page} is outside 1..={page_count}")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("A background job is already in progress")]
    JobInProgress,
}

impl SyncError {
    /// Errors caused by user input, raised before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Invalid(_) | Self::ControlDisabled { .. } | Self::PageOutOfRange { .. }
        )
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
