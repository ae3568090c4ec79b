use std::fmt;

use serde::{Deserialize, Serialize};

use crate::message::SqsMessage;

pub const PAYLOAD_POINTER_CLASS: &str = "software.amazon.payloadoffloading.PayloadS3Pointer";
pub const LEGACY_POINTER_CLASS: &str = "com.amazon.sqs.javamessaging.MessageS3Pointer";

pub const PAYLOAD_SIZE_ATTRIBUTE: &str = "ExtendedPayloadSize";
pub const LEGACY_PAYLOAD_SIZE_ATTRIBUTE: &str = "SQSLargePayloadSize";

/// Location of a message body offloaded to S3 by the extended client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayloadPointer {
    pub bucket_name: String,
    pub key: String,
    pub size: Option<u64>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PointerFields {
    s3_bucket_name: String,
    s3_key: String,
}

impl PayloadPointer {
    pub fn new(bucket_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            key: key.into(),
            size: None,
        }
    }

    /// Parses a message body as a pointer. Anything that is not a two-element
    /// `[class, {s3BucketName, s3Key}]` array with a known class is not a pointer.
    pub fn from_body(body: &str) -> Option<Self> {
        let trimmed = body.trim_start();
        if !trimmed.starts_with('[') {
            return None;
        }

        let (class, fields): (String, PointerFields) = serde_json::from_str(trimmed).ok()?;
        if class != PAYLOAD_POINTER_CLASS && class != LEGACY_POINTER_CLASS {
            return None;
        }
        if fields.s3_bucket_name.is_empty() || fields.s3_key.is_empty() {
            return None;
        }

        Some(Self::new(fields.s3_bucket_name, fields.s3_key))
    }

    /// Pointer carried by `message`, with the declared payload size when the
    /// sender attached one.
    pub fn from_message(message: &SqsMessage) -> Option<Self> {
        let mut pointer = Self::from_body(&message.body)?;
        pointer.size = message
            .string_attribute(PAYLOAD_SIZE_ATTRIBUTE)
            .or_else(|| message.string_attribute(LEGACY_PAYLOAD_SIZE_ATTRIBUTE))
            .and_then(|value| value.trim().parse().ok());
        Some(pointer)
    }

    /// Serialized form as written into the message body by the sender.
    pub fn to_body(&self) -> String {
        let fields = PointerFields {
            s3_bucket_name: self.bucket_name.clone(),
            s3_key: self.key.clone(),
        };
        serde_json::json!([PAYLOAD_POINTER_CLASS, fields]).to_string()
    }
}

impl fmt::Display for PayloadPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket_name, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageAttribute;

    #[test]
    fn parses_extended_client_pointer_body() {
        let body = r#"["software.amazon.payloadoffloading.PayloadS3Pointer",{"s3BucketName":"large-payloads","s3Key":"c71eb2ae-37e0-4265-8909-32f4153faddf"}]"#;

        let pointer = PayloadPointer::from_body(body).expect("body should be a pointer");
        assert_eq!(pointer.bucket_name, "large-payloads");
        assert_eq!(pointer.key, "c71eb2ae-37e0-4265-8909-32f4153faddf");
        assert_eq!(pointer.size, None);
    }

    #[test]
    fn accepts_legacy_pointer_class() {
        let body = r#"["com.amazon.sqs.javamessaging.MessageS3Pointer",{"s3BucketName":"b","s3Key":"k"}]"#;
        assert_eq!(
            PayloadPointer::from_body(body),
            Some(PayloadPointer::new("b", "k"))
        );
    }

    #[test]
    fn plain_bodies_are_not_pointers() {
        for body in [
            "",
            "hello world",
            r#"{"s3BucketName":"b","s3Key":"k"}"#,
            r#"["some.other.Class",{"s3BucketName":"b","s3Key":"k"}]"#,
            r#"["software.amazon.payloadoffloading.PayloadS3Pointer",{"s3BucketName":"","s3Key":"k"}]"#,
            r#"["software.amazon.payloadoffloading.PayloadS3Pointer"]"#,
            r#"["software.amazon.payloadoffloading.PayloadS3Pointer",{"s3BucketName":"b","s3Key":"k","note":"user data"}]"#,
            "[1, 2, 3]",
        ] {
            assert_eq!(PayloadPointer::from_body(body), None, "body: {body}");
        }
    }

    #[test]
    fn serialized_body_parses_back_to_same_location() {
        let pointer = PayloadPointer::new("bucket", "key");
        assert_eq!(PayloadPointer::from_body(&pointer.to_body()), Some(pointer));
    }

    #[test]
    fn reads_declared_size_from_message_attribute() {
        let mut message = SqsMessage {
            body: PayloadPointer::new("bucket", "key").to_body(),
            ..SqsMessage::default()
        };
        message.message_attributes.insert(
            LEGACY_PAYLOAD_SIZE_ATTRIBUTE.to_string(),
            MessageAttribute {
                string_value: Some("2048".to_string()),
                data_type: "Number".to_string(),
                ..MessageAttribute::default()
            },
        );

        let pointer = PayloadPointer::from_message(&message).expect("message should carry pointer");
        assert_eq!(pointer.size, Some(2048));
    }
}
