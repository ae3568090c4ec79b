use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqs_batch_core::message::SQS_EVENT_SOURCE;
use sqs_batch_core::{
    with_enriched_batch, BatchError, BatchProcessor, HandlerError, MessageHandler, ObjectStore,
    OffloadResolver, QueueService, SqsEvent, SqsMessage, TracedHandler,
};
use thiserror::Error;

use crate::config::{ConsumerConfig, ProcessingMode};

const HANDLER_NAME: &str = "JsonRecordHandler";

/// What the consumer learned from one JSON message body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessedRecord {
    pub message_id: String,
    /// Keys of an object, items of an array, 1 for a scalar.
    pub field_count: usize,
    pub byte_len: usize,
}

/// Parses every message body as JSON. Bodies that are not valid JSON fail
/// their message only.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRecordHandler;

impl MessageHandler for JsonRecordHandler {
    type Output = ProcessedRecord;

    fn process(&self, message: &SqsMessage) -> Result<ProcessedRecord, HandlerError> {
        let value: Value = serde_json::from_str(&message.body).map_err(|error| {
            format!(
                "message {} body is not valid JSON: {error}",
                message.message_id
            )
        })?;
        let field_count = match &value {
            Value::Object(fields) => fields.len(),
            Value::Array(items) => items.len(),
            _ => 1,
        };
        Ok(ProcessedRecord {
            message_id: message.message_id.clone(),
            field_count,
            byte_len: message.body.len(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsumerResponse {
    pub status: String,
    pub mode: String,
    pub processed: usize,
    pub failed: usize,
    /// Succeeded messages the queue did not confirm as deleted.
    pub undeleted: Vec<String>,
    pub records: Vec<ProcessedRecord>,
}

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("invalid sqs event: {0}")]
    InvalidEvent(String),
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Queue and storage services shared by every invocation of a warm runtime.
#[derive(Clone)]
pub struct ConsumerServices {
    pub queue: Arc<dyn QueueService>,
    pub store: Arc<dyn ObjectStore>,
}

pub fn is_sqs_event(payload: &Value) -> bool {
    payload
        .get("Records")
        .and_then(Value::as_array)
        .is_some_and(|records| {
            records.iter().all(|record| {
                record.get("eventSource").and_then(Value::as_str) == Some(SQS_EVENT_SOURCE)
            })
        })
}

pub fn decode_sqs_event(payload: Value) -> Result<SqsEvent, ConsumerError> {
    if !is_sqs_event(&payload) {
        return Err(ConsumerError::InvalidEvent(format!(
            "expected Records from {SQS_EVENT_SOURCE}"
        )));
    }
    serde_json::from_value(payload).map_err(|error| ConsumerError::InvalidEvent(error.to_string()))
}

/// Runs one SQS batch through [`JsonRecordHandler`] in the configured mode.
pub fn handle_sqs_event(
    event: &SqsEvent,
    config: &ConsumerConfig,
    services: &ConsumerServices,
) -> Result<ConsumerResponse, ConsumerError> {
    let handler = TracedHandler::new(HANDLER_NAME, JsonRecordHandler)
        .capture_response(config.capture_response)
        .capture_error(config.capture_error);
    let resolver = OffloadResolver::new(Arc::clone(&services.store));

    let response = match config.mode {
        ProcessingMode::Partial => {
            let processor = BatchProcessor::new(Arc::clone(&services.queue))
                .with_offload_resolver(resolver)
                .with_payload_deletion(config.delete_offloaded_payloads)
                .with_max_workers(config.max_concurrent_handlers);
            let report = processor.process_concurrently(
                &event.records,
                &handler,
                config.suppress_batch_errors,
            )?;
            ConsumerResponse {
                status: if report.has_failures() {
                    "partial_failure".to_string()
                } else {
                    "ok".to_string()
                },
                mode: config.mode.as_str().to_string(),
                processed: report.outcomes.len(),
                failed: report.failures.len(),
                undeleted: report.undeleted,
                records: report.outcomes,
            }
        }
        ProcessingMode::Enriched => {
            let records = with_enriched_batch(
                &resolver,
                &event.records,
                config.delete_offloaded_payloads,
                |messages| {
                    messages
                        .iter()
                        .map(|message| handler.process(message))
                        .collect::<Result<Vec<_>, _>>()
                },
            )?;
            ConsumerResponse {
                status: "ok".to_string(),
                mode: config.mode.as_str().to_string(),
                processed: records.len(),
                failed: 0,
                undeleted: Vec::new(),
                records,
            }
        }
    };

    tracing::info!(
        component = "batch_consumer",
        event = "batch_completed",
        mode = %response.mode,
        processed = response.processed,
        failed = response.failed,
        undeleted = response.undeleted.len(),
        "sqs batch handled"
    );
    Ok(response)
}
