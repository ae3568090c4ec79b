use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SQS_EVENT_SOURCE: &str = "aws:sqs";

/// Lambda event delivered by an SQS event source mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SqsEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<SqsMessage>,
}

/// One SQS record as it appears in a Lambda event.
///
/// Records handed in by the caller are never mutated; offload resolution and
/// handlers work on clones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SqsMessage {
    pub message_id: String,
    pub receipt_handle: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5_of_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5_of_message_attributes: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub message_attributes: BTreeMap<String, MessageAttribute>,
    #[serde(default)]
    pub event_source: String,
    #[serde(rename = "eventSourceARN", default)]
    pub event_source_arn: String,
    #[serde(default)]
    pub aws_region: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageAttribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_value: Option<String>,
    #[serde(default)]
    pub string_list_values: Vec<String>,
    #[serde(default)]
    pub binary_list_values: Vec<String>,
    #[serde(default)]
    pub data_type: String,
}

impl SqsMessage {
    pub fn string_attribute(&self, name: &str) -> Option<&str> {
        self.message_attributes
            .get(name)
            .and_then(|attribute| attribute.string_value.as_deref())
    }

    pub fn receive_count(&self) -> Option<u32> {
        self.attributes
            .get("ApproximateReceiveCount")
            .and_then(|value| value.parse().ok())
    }

    /// Identity used to reject double reporting: the same message id delivered
    /// twice carries a different receipt handle.
    pub(crate) fn identity(&self) -> (String, String) {
        (self.message_id.clone(), self.receipt_handle.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid SQS queue ARN '{arn}': {reason}")]
pub struct QueueArnError {
    pub arn: String,
    pub reason: &'static str,
}

/// Parsed `arn:<partition>:sqs:<region>:<account>:<queue>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueArn {
    pub partition: String,
    pub region: String,
    pub account_id: String,
    pub queue_name: String,
}

impl QueueArn {
    pub fn parse(arn: &str) -> Result<Self, QueueArnError> {
        let invalid = |reason| QueueArnError {
            arn: arn.to_string(),
            reason,
        };

        let parts: Vec<&str> = arn.split(':').collect();
        if parts.len() != 6 {
            return Err(invalid("expected six ':'-separated segments"));
        }
        if parts[0] != "arn" {
            return Err(invalid("missing 'arn' prefix"));
        }
        if parts[2] != "sqs" {
            return Err(invalid("service is not sqs"));
        }
        if parts[1].is_empty() || parts[3].is_empty() || parts[4].is_empty() || parts[5].is_empty()
        {
            return Err(invalid("partition, region, account and queue name are required"));
        }

        Ok(Self {
            partition: parts[1].to_string(),
            region: parts[3].to_string(),
            account_id: parts[4].to_string(),
            queue_name: parts[5].to_string(),
        })
    }

    pub fn is_fifo(&self) -> bool {
        self.queue_name.ends_with(".fifo")
    }
}
