#![allow(dead_code)]

use sqs_batch_core::{PayloadPointer, SqsMessage};

pub const ORDERS_QUEUE_ARN: &str = "arn:aws:sqs:eu-central-1:123456789012:orders";

/// Builds an SQS record as delivered by the event source mapping.
pub fn sqs_message(id: &str, body: &str) -> SqsMessage {
    SqsMessage {
        message_id: id.to_string(),
        receipt_handle: format!("AQEB-{id}"),
        body: body.to_string(),
        md5_of_body: Some(format!("md5-{id}")),
        event_source: "aws:sqs".to_string(),
        event_source_arn: ORDERS_QUEUE_ARN.to_string(),
        aws_region: "eu-central-1".to_string(),
        ..SqsMessage::default()
    }
}

pub fn offloaded_message(id: &str, bucket: &str, key: &str) -> SqsMessage {
    sqs_message(id, &PayloadPointer::new(bucket, key).to_body())
}

pub fn three_message_batch() -> Vec<SqsMessage> {
    vec![
        sqs_message("message-1", "first"),
        sqs_message("message-2", "second"),
        sqs_message("message-3", "third"),
    ]
}
