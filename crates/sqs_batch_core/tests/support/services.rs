#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use sqs_batch_core::{DeleteEntry, DeleteOutcome, ObjectStore, QueueService, StorageError};

/// Queue fake that records every batch-delete request.
#[derive(Default)]
pub struct RecordingQueue {
    requests: Mutex<Vec<Vec<String>>>,
    rejected: Vec<String>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects deleting the given message ids with a per-entry failure.
    pub fn rejecting(message_ids: &[&str]) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            rejected: message_ids.iter().map(|id| id.to_string()).collect(),
        }
    }

    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().expect("poisoned mutex").clone()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.requests().into_iter().flatten().collect()
    }
}

impl QueueService for RecordingQueue {
    fn delete_message_batch(
        &self,
        _queue_arn: &str,
        entries: &[DeleteEntry],
    ) -> Result<Vec<DeleteOutcome>, String> {
        self.requests
            .lock()
            .expect("poisoned mutex")
            .push(entries.iter().map(|entry| entry.message_id.clone()).collect());

        Ok(entries
            .iter()
            .map(|entry| {
                if self.rejected.contains(&entry.message_id) {
                    DeleteOutcome::failed(&entry.message_id, "ReceiptHandleIsInvalid")
                } else {
                    DeleteOutcome::deleted(&entry.message_id)
                }
            })
            .collect())
    }
}

/// In-memory bucket store that counts deletes per `bucket/key`.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    deletes: Mutex<Vec<String>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_object(&self, bucket: &str, key: &str, body: &str) {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .insert(format!("{bucket}/{key}"), body.as_bytes().to_vec());
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .contains_key(&format!("{bucket}/{key}"))
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().expect("poisoned mutex").clone()
    }

    pub fn delete_count(&self, bucket: &str, key: &str) -> usize {
        let target = format!("{bucket}/{key}");
        self.deletes().iter().filter(|entry| **entry == target).count()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(&format!("{bucket}/{key}"))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let target = format!("{bucket}/{key}");
        self.objects.lock().expect("poisoned mutex").remove(&target);
        self.deletes.lock().expect("poisoned mutex").push(target);
        Ok(())
    }
}
