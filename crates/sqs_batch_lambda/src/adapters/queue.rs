use std::collections::HashMap;
use std::sync::Mutex;

use aws_sdk_sqs::types::DeleteMessageBatchRequestEntry;
use sqs_batch_core::{DeleteEntry, DeleteOutcome, QueueArn, QueueService};

use super::block_on_sdk;

/// Upper bound SQS places on entries per `DeleteMessageBatch` request.
pub const MAX_DELETE_BATCH_ENTRIES: usize = 10;

/// [`QueueService`] backed by the SQS API.
///
/// Queue URLs are looked up from the event source ARN on first use and cached
/// for the lifetime of the service, which spans warm invocations.
pub struct SqsQueueService {
    client: aws_sdk_sqs::Client,
    queue_urls: Mutex<HashMap<String, String>>,
}

impl SqsQueueService {
    pub fn new(client: aws_sdk_sqs::Client) -> Self {
        Self {
            client,
            queue_urls: Mutex::new(HashMap::new()),
        }
    }

    fn queue_url(&self, queue_arn: &str) -> Result<String, String> {
        if let Some(url) = self
            .queue_urls
            .lock()
            .map_err(|_| "queue url cache lock poisoned".to_string())?
            .get(queue_arn)
        {
            return Ok(url.clone());
        }

        let arn = QueueArn::parse(queue_arn).map_err(|error| error.to_string())?;
        let client = self.client.clone();
        let url = block_on_sdk(async move {
            let output = client
                .get_queue_url()
                .queue_name(arn.queue_name)
                .queue_owner_aws_account_id(arn.account_id)
                .send()
                .await
                .map_err(|error| format!("failed to resolve queue url for {queue_arn}: {error}"))?;
            output
                .queue_url()
                .map(str::to_string)
                .ok_or_else(|| format!("no queue url returned for {queue_arn}"))
        })?;

        self.queue_urls
            .lock()
            .map_err(|_| "queue url cache lock poisoned".to_string())?
            .insert(queue_arn.to_string(), url.clone());
        Ok(url)
    }

    fn delete_chunk(&self, queue_url: &str, chunk: &[DeleteEntry]) -> Vec<DeleteOutcome> {
        let request_entries = match request_entries(chunk) {
            Ok(entries) => entries,
            Err(error) => return failed_chunk(chunk, &error),
        };

        let client = self.client.clone();
        let url = queue_url.to_string();
        let response = block_on_sdk(async move {
            client
                .delete_message_batch()
                .queue_url(url)
                .set_entries(Some(request_entries))
                .send()
                .await
                .map_err(|error| format!("failed to delete message batch: {error}"))
        });

        let output = match response {
            Ok(output) => output,
            Err(error) => return failed_chunk(chunk, &error),
        };

        let mut outcomes = Vec::with_capacity(chunk.len());
        for entry in output.successful() {
            if let Some(owner) = entry_for_id(chunk, entry.id()) {
                outcomes.push(DeleteOutcome::deleted(&owner.message_id));
            }
        }
        for failure in output.failed() {
            if let Some(owner) = entry_for_id(chunk, failure.id()) {
                let reason = format!(
                    "{}: {}",
                    failure.code(),
                    failure.message().unwrap_or("no message")
                );
                outcomes.push(DeleteOutcome::failed(&owner.message_id, reason));
            }
        }
        outcomes
    }
}

impl QueueService for SqsQueueService {
    fn delete_message_batch(
        &self,
        queue_arn: &str,
        entries: &[DeleteEntry],
    ) -> Result<Vec<DeleteOutcome>, String> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let queue_url = self.queue_url(queue_arn)?;
        Ok(entries
            .chunks(MAX_DELETE_BATCH_ENTRIES)
            .flat_map(|chunk| self.delete_chunk(&queue_url, chunk))
            .collect())
    }
}

/// Request entry ids are positions within the chunk; message ids can exceed
/// the 80 character limit SQS puts on entry ids.
fn request_entries(chunk: &[DeleteEntry]) -> Result<Vec<DeleteMessageBatchRequestEntry>, String> {
    chunk
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            DeleteMessageBatchRequestEntry::builder()
                .id(index.to_string())
                .receipt_handle(&entry.receipt_handle)
                .build()
                .map_err(|error| format!("invalid delete entry for {}: {error}", entry.message_id))
        })
        .collect()
}

fn entry_for_id<'a>(chunk: &'a [DeleteEntry], id: &str) -> Option<&'a DeleteEntry> {
    id.parse::<usize>().ok().and_then(|index| chunk.get(index))
}

fn failed_chunk(chunk: &[DeleteEntry], reason: &str) -> Vec<DeleteOutcome> {
    chunk
        .iter()
        .map(|entry| DeleteOutcome::failed(&entry.message_id, reason))
        .collect()
}
