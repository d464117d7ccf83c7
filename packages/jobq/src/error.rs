use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),

    #[error("job record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
