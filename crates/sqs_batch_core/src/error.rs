use std::fmt;

use thiserror::Error;

use crate::context::FailedMessage;
use crate::pointer::PayloadPointer;

/// Error type returned by message handlers and whole-batch functions.
///
/// Any `std::error::Error + Send + Sync` converts into it with `?`, which keeps
/// closures and handler structs on the same signature.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("object s3://{bucket}/{key} does not exist")]
    NotFound { bucket: String, key: String },
    #[error("object storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to fetch offloaded payload {pointer}: {source}")]
    Fetch {
        pointer: PayloadPointer,
        #[source]
        source: StorageError,
    },
    #[error("offloaded payload {pointer} is not valid UTF-8")]
    InvalidUtf8 { pointer: PayloadPointer },
}

/// Aggregated failure for a batch where at least one message failed.
///
/// Carries every failed message with its cause. The succeeded messages have
/// already been deleted from the queue by the time this is returned.
#[derive(Debug)]
pub struct BatchProcessingError {
    failures: Vec<FailedMessage>,
    succeeded: usize,
}

impl BatchProcessingError {
    pub fn new(failures: Vec<FailedMessage>, succeeded: usize) -> Self {
        Self {
            failures,
            succeeded,
        }
    }

    pub fn failures(&self) -> &[FailedMessage] {
        &self.failures
    }

    pub fn failed_message_ids(&self) -> Vec<&str> {
        self.failures
            .iter()
            .map(|failure| failure.message_id.as_str())
            .collect()
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn into_failures(self) -> Vec<FailedMessage> {
        self.failures
    }
}

impl fmt::Display for BatchProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} message(s) failed processing ({} succeeded)",
            self.failures.len(),
            self.succeeded
        )?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.message_id, failure.cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchProcessingError {}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Failed(#[from] BatchProcessingError),
    #[error("message {message_id} was reported more than once in the same batch")]
    DuplicateReport { message_id: String },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("batch function failed: {0}")]
    BatchFunction(HandlerError),
    #[error("failed to build handler worker pool: {0}")]
    WorkerPool(String),
}
