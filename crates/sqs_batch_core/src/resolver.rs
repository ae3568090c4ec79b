use std::sync::Arc;

use crate::error::{ResolveError, StorageError};
use crate::message::SqsMessage;
use crate::pointer::PayloadPointer;
use crate::services::ObjectStore;

/// A pointer that was resolved, tied back to the message that carried it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPointer {
    pub message_id: String,
    pub pointer: PayloadPointer,
}

/// Replaces pointer bodies with the S3 content they reference.
#[derive(Clone)]
pub struct OffloadResolver {
    store: Arc<dyn ObjectStore>,
}

impl OffloadResolver {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Returns a working copy of `message` with its body resolved, plus the
    /// pointer it carried. Messages without a pointer are copied unchanged.
    pub fn resolve_message(
        &self,
        message: &SqsMessage,
    ) -> Result<(SqsMessage, Option<PayloadPointer>), ResolveError> {
        let mut working = message.clone();
        let Some(pointer) = PayloadPointer::from_message(message) else {
            return Ok((working, None));
        };

        let content = self
            .store
            .get_object(&pointer.bucket_name, &pointer.key)
            .map_err(|source| ResolveError::Fetch {
                pointer: pointer.clone(),
                source,
            })?;

        if let Some(declared) = pointer.size {
            if declared != content.len() as u64 {
                tracing::warn!(
                    component = "offload_resolver",
                    event = "payload_size_mismatch",
                    message_id = %message.message_id,
                    pointer = %pointer,
                    declared,
                    fetched = content.len(),
                    "offloaded payload size differs from declared size"
                );
            }
        }

        working.body = String::from_utf8(content).map_err(|_| ResolveError::InvalidUtf8 {
            pointer: pointer.clone(),
        })?;
        working.md5_of_body = None;

        tracing::debug!(
            component = "offload_resolver",
            event = "payload_resolved",
            message_id = %message.message_id,
            pointer = %pointer,
            "resolved offloaded payload"
        );

        Ok((working, Some(pointer)))
    }

    /// Resolves every message of `batch`. The first failure aborts the whole
    /// batch; the input is left untouched either way.
    pub fn resolve_batch(
        &self,
        batch: &[SqsMessage],
    ) -> Result<(Vec<SqsMessage>, Vec<ResolvedPointer>), ResolveError> {
        let mut working = Vec::with_capacity(batch.len());
        let mut resolved = Vec::new();

        for message in batch {
            let (copy, pointer) = self.resolve_message(message)?;
            if let Some(pointer) = pointer {
                resolved.push(ResolvedPointer {
                    message_id: message.message_id.clone(),
                    pointer,
                });
            }
            working.push(copy);
        }

        Ok((working, resolved))
    }

    pub fn delete(&self, pointer: &PayloadPointer) -> Result<(), StorageError> {
        self.store.delete_object(&pointer.bucket_name, &pointer.key)
    }

    /// Deletes `pointer`, logging instead of failing. Returns whether the
    /// object is gone.
    pub(crate) fn delete_logged(&self, message_id: &str, pointer: &PayloadPointer) -> bool {
        match self.delete(pointer) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(
                    component = "offload_resolver",
                    event = "payload_delete_failed",
                    message_id,
                    pointer = %pointer,
                    error = %error,
                    "failed to delete offloaded payload"
                );
                false
            }
        }
    }
}
