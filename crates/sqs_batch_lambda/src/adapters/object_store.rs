use sqs_batch_core::{ObjectStore, StorageError};

use super::block_on_sdk;

/// [`ObjectStore`] backed by the S3 API. Buckets come from each payload
/// pointer, so one client serves every bucket the producers offload to.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

impl ObjectStore for S3ObjectStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let client = self.client.clone();
        let bucket = bucket.to_string();
        let key = key.to_string();

        block_on_sdk(async move {
            let output = client
                .get_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
                .map_err(|error| {
                    let missing = error
                        .as_service_error()
                        .map(|service_error| service_error.is_no_such_key())
                        .unwrap_or(false);
                    if missing {
                        StorageError::NotFound {
                            bucket: bucket.clone(),
                            key: key.clone(),
                        }
                    } else {
                        StorageError::Unavailable(format!(
                            "failed to read object s3://{bucket}/{key}: {error}"
                        ))
                    }
                })?;

            let body = output.body.collect().await.map_err(|error| {
                StorageError::Unavailable(format!(
                    "failed to read body of s3://{bucket}/{key}: {error}"
                ))
            })?;
            Ok(body.into_bytes().to_vec())
        })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let client = self.client.clone();
        let bucket = bucket.to_string();
        let key = key.to_string();

        block_on_sdk(async move {
            client
                .delete_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    StorageError::Unavailable(format!(
                        "failed to delete object s3://{bucket}/{key}: {error}"
                    ))
                })
        })
    }
}
