use crate::error::StorageError;

/// Identity of a received message as the queue needs it for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteEntry {
    pub message_id: String,
    pub receipt_handle: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteStatus {
    Deleted,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub message_id: String,
    pub status: DeleteStatus,
}

impl DeleteOutcome {
    pub fn deleted(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            status: DeleteStatus::Deleted,
        }
    }

    pub fn failed(message_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            status: DeleteStatus::Failed(reason.into()),
        }
    }
}

pub trait QueueService: Send + Sync {
    /// Deletes `entries` from the queue identified by `queue_arn`, reporting an
    /// outcome per entry. `Err` means the request as a whole failed.
    fn delete_message_batch(
        &self,
        queue_arn: &str,
        entries: &[DeleteEntry],
    ) -> Result<Vec<DeleteOutcome>, String>;
}

pub trait ObjectStore: Send + Sync {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Idempotent: deleting a missing key succeeds.
    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}
