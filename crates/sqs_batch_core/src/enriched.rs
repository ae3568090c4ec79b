use crate::error::{BatchError, HandlerError};
use crate::message::SqsMessage;
use crate::resolver::OffloadResolver;

/// Resolves every offloaded payload of `batch` and calls `function` once with
/// the resolved working copies.
///
/// Any resolve failure aborts before `function` runs. Resolved payloads are
/// deleted only when `delete_payloads` is set and `function` returned `Ok`;
/// deletion failures are logged and do not change the returned value.
pub fn with_enriched_batch<R, F>(
    resolver: &OffloadResolver,
    batch: &[SqsMessage],
    delete_payloads: bool,
    function: F,
) -> Result<R, BatchError>
where
    F: FnOnce(&[SqsMessage]) -> Result<R, HandlerError>,
{
    let (working, resolved) = resolver.resolve_batch(batch).map_err(|error| {
        tracing::error!(
            component = "enriched_batch",
            event = "resolve_failed",
            messages = batch.len(),
            error = %error,
            "failed to resolve offloaded payloads"
        );
        BatchError::from(error)
    })?;

    tracing::info!(
        component = "enriched_batch",
        event = "batch_resolved",
        messages = working.len(),
        resolved_payloads = resolved.len(),
        "invoking batch function"
    );

    let value = function(&working).map_err(BatchError::BatchFunction)?;

    if delete_payloads {
        for entry in &resolved {
            resolver.delete_logged(&entry.message_id, &entry.pointer);
        }
    }

    Ok(value)
}

/// [`with_enriched_batch`] that deletes resolved payloads once `function`
/// succeeds.
pub fn with_enriched_batch_and_cleanup<R, F>(
    resolver: &OffloadResolver,
    batch: &[SqsMessage],
    function: F,
) -> Result<R, BatchError>
where
    F: FnOnce(&[SqsMessage]) -> Result<R, HandlerError>,
{
    with_enriched_batch(resolver, batch, true, function)
}
