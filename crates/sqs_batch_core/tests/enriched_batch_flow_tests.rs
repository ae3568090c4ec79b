mod support;

use std::sync::Arc;

use sqs_batch_core::{
    with_enriched_batch, with_enriched_batch_and_cleanup, BatchError, HandlerError,
    OffloadResolver,
};
use support::messages::{offloaded_message, sqs_message};
use support::services::MemoryObjectStore;

fn resolver_with(store: &Arc<MemoryObjectStore>) -> OffloadResolver {
    OffloadResolver::new(store.clone())
}

#[test]
fn successful_function_deletes_payload_exactly_once() {
    let store = Arc::new(MemoryObjectStore::new());
    store.seed_object("bucket", "key", "large body");
    let resolver = resolver_with(&store);
    let batch = vec![
        sqs_message("message-1", "inline"),
        offloaded_message("message-2", "bucket", "key"),
    ];

    let bodies = with_enriched_batch(&resolver, &batch, true, |messages| {
        assert!(store.contains("bucket", "key"), "payload deleted too early");
        Ok::<_, HandlerError>(
            messages
                .iter()
                .map(|message| message.body.clone())
                .collect::<Vec<_>>(),
        )
    })
    .expect("batch should succeed");

    assert_eq!(bodies, vec!["inline", "large body"]);
    assert_eq!(store.delete_count("bucket", "key"), 1);
}

#[test]
fn failing_function_never_deletes_payload() {
    let store = Arc::new(MemoryObjectStore::new());
    store.seed_object("bucket", "key", "large body");
    let resolver = resolver_with(&store);
    let batch = vec![offloaded_message("message-1", "bucket", "key")];

    let error = with_enriched_batch(&resolver, &batch, true, |_| -> Result<(), HandlerError> {
        Err("downstream unavailable".into())
    })
    .expect_err("function error should propagate");

    assert!(matches!(
        error,
        BatchError::BatchFunction(ref cause) if cause.to_string() == "downstream unavailable"
    ));
    assert!(store.deletes().is_empty());
    assert!(store.contains("bucket", "key"));
}

#[test]
fn deletion_can_be_disabled() {
    let store = Arc::new(MemoryObjectStore::new());
    store.seed_object("bucket", "key", "large body");
    let resolver = resolver_with(&store);
    let batch = vec![offloaded_message("message-1", "bucket", "key")];

    let count = with_enriched_batch(&resolver, &batch, false, |messages| Ok(messages.len()))
        .expect("batch should succeed");

    assert_eq!(count, 1);
    assert!(store.deletes().is_empty());
}

#[test]
fn one_missing_payload_aborts_the_whole_batch() {
    let store = Arc::new(MemoryObjectStore::new());
    store.seed_object("bucket", "present", "body");
    let resolver = resolver_with(&store);
    let batch = vec![
        offloaded_message("message-1", "bucket", "present"),
        offloaded_message("message-2", "bucket", "absent"),
    ];

    let error = with_enriched_batch(&resolver, &batch, true, |_| Ok(()))
        .expect_err("missing payload should abort");

    assert!(matches!(error, BatchError::Resolve(_)));
    assert!(store.deletes().is_empty());
}

#[test]
fn cleanup_variant_deletes_payload_after_success() {
    let store = Arc::new(MemoryObjectStore::new());
    store.seed_object("bucket", "key", "large body");
    let resolver = resolver_with(&store);
    let batch = vec![offloaded_message("message-1", "bucket", "key")];

    let count = with_enriched_batch_and_cleanup(&resolver, &batch, |messages| {
        Ok::<_, HandlerError>(messages.len())
    })
    .expect("batch should succeed");

    assert_eq!(count, 1);
    assert_eq!(store.delete_count("bucket", "key"), 1);
    assert!(!store.contains("bucket", "key"));
}

#[test]
fn cleanup_variant_keeps_payload_when_function_fails() {
    let store = Arc::new(MemoryObjectStore::new());
    store.seed_object("bucket", "key", "large body");
    let resolver = resolver_with(&store);
    let batch = vec![offloaded_message("message-1", "bucket", "key")];

    let error = with_enriched_batch_and_cleanup(&resolver, &batch, |_| {
        Err::<(), HandlerError>("downstream unavailable".into())
    })
    .expect_err("function failure should surface");

    assert!(matches!(error, BatchError::BatchFunction(_)));
    assert!(store.deletes().is_empty());
}
