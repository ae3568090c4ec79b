use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{BatchError, BatchProcessingError, HandlerError};
use crate::message::SqsMessage;
use crate::pointer::PayloadPointer;
use crate::resolver::OffloadResolver;
use crate::services::{DeleteEntry, DeleteStatus, QueueService};

/// A message whose handler failed, with the cause it failed with.
#[derive(Debug)]
pub struct FailedMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub cause: HandlerError,
}

/// What a finished batch produced.
#[derive(Debug)]
pub struct BatchReport<R> {
    /// Handler outcomes of succeeded messages, in batch order.
    pub outcomes: Vec<R>,
    pub failures: Vec<FailedMessage>,
    /// Succeeded messages the queue did not confirm as deleted. They will be
    /// redelivered even though their handler succeeded.
    pub undeleted: Vec<String>,
}

impl<R> BatchReport<R> {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug)]
struct SuccessRecord<R> {
    message: SqsMessage,
    outcome: R,
    pointer: Option<PayloadPointer>,
}

/// Accumulates the outcome of every message of one batch and performs the
/// terminal cleanup. Owned by a single processing call; never shared across
/// batches.
pub struct BatchContext<R> {
    queue: Arc<dyn QueueService>,
    payload_cleanup: Option<OffloadResolver>,
    reported: HashSet<(String, String)>,
    successes: Vec<SuccessRecord<R>>,
    failures: Vec<FailedMessage>,
    /// Objects referenced by failed messages. Never deleted by this batch.
    failed_payloads: HashSet<(String, String)>,
}

impl<R> BatchContext<R> {
    pub fn new(queue: Arc<dyn QueueService>) -> Self {
        Self {
            queue,
            payload_cleanup: None,
            reported: HashSet::new(),
            successes: Vec::new(),
            failures: Vec::new(),
            failed_payloads: HashSet::new(),
        }
    }

    /// Deletes the offloaded payloads of succeeded messages during `finalize`.
    /// An object still referenced by a failed or undeleted message is kept.
    pub fn with_payload_cleanup(mut self, resolver: OffloadResolver) -> Self {
        self.payload_cleanup = Some(resolver);
        self
    }

    pub fn add_success(&mut self, message: &SqsMessage, outcome: R) -> Result<(), BatchError> {
        self.add_success_with_pointer(message, outcome, None)
    }

    pub fn add_success_with_pointer(
        &mut self,
        message: &SqsMessage,
        outcome: R,
        pointer: Option<PayloadPointer>,
    ) -> Result<(), BatchError> {
        self.mark_reported(message)?;
        self.successes.push(SuccessRecord {
            message: message.clone(),
            outcome,
            pointer,
        });
        Ok(())
    }

    pub fn add_failure(
        &mut self,
        message: &SqsMessage,
        cause: HandlerError,
    ) -> Result<(), BatchError> {
        self.mark_reported(message)?;
        tracing::warn!(
            component = "batch_context",
            event = "message_failed",
            message_id = %message.message_id,
            error = %cause,
            "message failed processing"
        );
        if let Some(pointer) = PayloadPointer::from_message(message) {
            self.failed_payloads.insert(object_id(&pointer));
        }
        self.failures.push(FailedMessage {
            message_id: message.message_id.clone(),
            receipt_handle: message.receipt_handle.clone(),
            cause,
        });
        Ok(())
    }

    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    fn mark_reported(&mut self, message: &SqsMessage) -> Result<(), BatchError> {
        if self.reported.insert(message.identity()) {
            Ok(())
        } else {
            Err(BatchError::DuplicateReport {
                message_id: message.message_id.clone(),
            })
        }
    }

    /// Deletes succeeded messages from their queue, then the payloads of the
    /// ones the queue confirmed, and reports the batch.
    ///
    /// With failures present and `suppress_error` off, returns the aggregated
    /// failure instead of the report. Deletion problems are logged and never
    /// turn a success into a failure.
    pub fn finalize(self, suppress_error: bool) -> Result<BatchReport<R>, BatchError> {
        let undeleted = self.delete_successes();

        self.delete_payloads(&undeleted);

        let succeeded = self.successes.len();
        tracing::info!(
            component = "batch_context",
            event = "batch_completed",
            succeeded,
            failed = self.failures.len(),
            undeleted = undeleted.len(),
            "batch processing completed"
        );

        if !self.failures.is_empty() && !suppress_error {
            return Err(BatchProcessingError::new(self.failures, succeeded).into());
        }

        let mut undeleted: Vec<String> = undeleted.into_iter().collect();
        undeleted.sort();
        Ok(BatchReport {
            outcomes: self
                .successes
                .into_iter()
                .map(|record| record.outcome)
                .collect(),
            failures: self.failures,
            undeleted,
        })
    }

    /// Deletes each object referenced by a confirmed success once. Objects
    /// that a failed or undeleted message also points to stay in place for
    /// redelivery.
    fn delete_payloads(&self, undeleted: &HashSet<String>) {
        let Some(resolver) = &self.payload_cleanup else {
            return;
        };

        let mut retained = self.failed_payloads.clone();
        retained.extend(
            self.successes
                .iter()
                .filter(|record| undeleted.contains(&record.message.message_id))
                .filter_map(|record| record.pointer.as_ref().map(object_id)),
        );

        let mut deleted = HashSet::new();
        for record in &self.successes {
            let Some(pointer) = &record.pointer else {
                continue;
            };
            let object = object_id(pointer);
            if retained.contains(&object) {
                tracing::warn!(
                    component = "batch_context",
                    event = "payload_retained",
                    message_id = %record.message.message_id,
                    pointer = %pointer,
                    "keeping offloaded payload of a message that may be redelivered"
                );
                continue;
            }
            if deleted.insert(object) {
                resolver.delete_logged(&record.message.message_id, pointer);
            }
        }
    }

    /// One delete request per source queue. Returns the ids the queue did not
    /// confirm.
    fn delete_successes(&self) -> HashSet<String> {
        let mut groups: Vec<(&str, Vec<DeleteEntry>)> = Vec::new();
        for record in &self.successes {
            let arn = record.message.event_source_arn.as_str();
            let entry = DeleteEntry {
                message_id: record.message.message_id.clone(),
                receipt_handle: record.message.receipt_handle.clone(),
            };
            match groups.iter_mut().find(|(group_arn, _)| *group_arn == arn) {
                Some((_, entries)) => entries.push(entry),
                None => groups.push((arn, vec![entry])),
            }
        }

        let mut undeleted = HashSet::new();
        for (queue_arn, entries) in groups {
            match self.queue.delete_message_batch(queue_arn, &entries) {
                Ok(outcomes) => {
                    let mut confirmed = HashSet::new();
                    for outcome in outcomes {
                        match outcome.status {
                            DeleteStatus::Deleted => {
                                confirmed.insert(outcome.message_id);
                            }
                            DeleteStatus::Failed(reason) => {
                                tracing::warn!(
                                    component = "batch_context",
                                    event = "delete_rejected",
                                    queue_arn,
                                    message_id = %outcome.message_id,
                                    reason = %reason,
                                    "queue rejected deleting a succeeded message"
                                );
                            }
                        }
                    }
                    undeleted.extend(
                        entries
                            .into_iter()
                            .filter(|entry| !confirmed.contains(&entry.message_id))
                            .map(|entry| entry.message_id),
                    );
                }
                Err(error) => {
                    tracing::error!(
                        component = "batch_context",
                        event = "delete_request_failed",
                        queue_arn,
                        entries = entries.len(),
                        error = %error,
                        "batch delete request failed"
                    );
                    undeleted.extend(entries.into_iter().map(|entry| entry.message_id));
                }
            }
        }
        undeleted
    }
}

fn object_id(pointer: &PayloadPointer) -> (String, String) {
    (pointer.bucket_name.clone(), pointer.key.clone())
}
