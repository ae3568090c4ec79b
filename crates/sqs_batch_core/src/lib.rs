//! Partial batch processing primitives for SQS-triggered functions.
//!
//! This crate owns the per-batch bookkeeping (which messages succeeded, which
//! failed, what gets deleted) and the resolution of payloads offloaded to S3 by
//! the extended client. It intentionally excludes AWS SDK and Lambda runtime
//! concerns: queue and object storage are consumed through the traits in
//! [`services`], implemented by `sqs_batch_lambda`.
//!
//! # Architecture
//!
//! - [`message`]: SQS event and record model, queue ARN parsing
//! - [`pointer`]: payload pointer detection and serialization
//! - [`resolver`]: fetch offloaded payloads into working copies, delete them later
//! - [`context`]: per-batch success/failure accumulator and terminal cleanup
//! - [`processor`]: per-message handler orchestration
//! - [`enriched`]: whole-batch entry point over resolved messages
//! - [`middleware`]: explicit wrappers composed around handlers

pub mod context;
pub mod enriched;
pub mod error;
pub mod message;
pub mod middleware;
pub mod pointer;
pub mod processor;
pub mod resolver;
pub mod services;

pub use context::{BatchContext, BatchReport, FailedMessage};
pub use enriched::{with_enriched_batch, with_enriched_batch_and_cleanup};
pub use error::{BatchError, BatchProcessingError, HandlerError, ResolveError, StorageError};
pub use message::{MessageAttribute, QueueArn, SqsEvent, SqsMessage};
pub use middleware::TracedHandler;
pub use pointer::PayloadPointer;
pub use processor::{BatchProcessor, MessageHandler};
pub use resolver::{OffloadResolver, ResolvedPointer};
pub use services::{DeleteEntry, DeleteOutcome, DeleteStatus, ObjectStore, QueueService};
