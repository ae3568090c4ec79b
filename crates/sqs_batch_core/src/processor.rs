use std::sync::Arc;

use rayon::prelude::*;

use crate::context::{BatchContext, BatchReport};
use crate::error::{BatchError, HandlerError};
use crate::message::SqsMessage;
use crate::pointer::PayloadPointer;
use crate::resolver::OffloadResolver;
use crate::services::QueueService;

/// Per-message business logic.
///
/// Closures `Fn(&SqsMessage) -> Result<R, E>` implement this directly, so a
/// struct handler and an inline closure go through the same processor API.
pub trait MessageHandler {
    type Output;

    fn process(&self, message: &SqsMessage) -> Result<Self::Output, HandlerError>;
}

impl<F, R, E> MessageHandler for F
where
    F: Fn(&SqsMessage) -> Result<R, E>,
    E: Into<HandlerError>,
{
    type Output = R;

    fn process(&self, message: &SqsMessage) -> Result<R, HandlerError> {
        self(message).map_err(Into::into)
    }
}

type Prepared = Result<(SqsMessage, Option<PayloadPointer>), HandlerError>;

/// Runs a handler over every message of a batch, isolating failures per
/// message, then deletes what succeeded.
///
/// Holds only shared client handles; every call builds its own
/// [`BatchContext`].
#[derive(Clone)]
pub struct BatchProcessor {
    queue: Arc<dyn QueueService>,
    resolver: Option<OffloadResolver>,
    delete_payloads: bool,
    max_workers: usize,
}

impl BatchProcessor {
    pub fn new(queue: Arc<dyn QueueService>) -> Self {
        Self {
            queue,
            resolver: None,
            delete_payloads: true,
            max_workers: 1,
        }
    }

    /// Resolve offloaded payloads before each handler call. A message whose
    /// payload cannot be fetched fails on its own.
    pub fn with_offload_resolver(mut self, resolver: OffloadResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_payload_deletion(mut self, enabled: bool) -> Self {
        self.delete_payloads = enabled;
        self
    }

    /// Worker count for [`BatchProcessor::process_concurrently`]; values below
    /// one are treated as one.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn queue(&self) -> &Arc<dyn QueueService> {
        &self.queue
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Returns the outcomes of succeeded messages in batch order, or the
    /// aggregated failure when any message failed and `suppress_error` is off.
    pub fn process<H: MessageHandler>(
        &self,
        batch: &[SqsMessage],
        handler: &H,
        suppress_error: bool,
    ) -> Result<Vec<H::Output>, BatchError> {
        self.process_with_report(batch, handler, suppress_error)
            .map(|report| report.outcomes)
    }

    /// Like [`BatchProcessor::process`] with a handler built fresh for this
    /// batch.
    pub fn process_with_default_handler<H: MessageHandler + Default>(
        &self,
        batch: &[SqsMessage],
        suppress_error: bool,
    ) -> Result<Vec<H::Output>, BatchError> {
        self.process(batch, &H::default(), suppress_error)
    }

    /// Sequential processing that also hands back failures and undeleted
    /// messages when the aggregated failure is suppressed.
    pub fn process_with_report<H: MessageHandler>(
        &self,
        batch: &[SqsMessage],
        handler: &H,
        suppress_error: bool,
    ) -> Result<BatchReport<H::Output>, BatchError> {
        self.log_batch_started(batch, 1);
        let mut context = self.new_context();

        for message in batch {
            let result = self
                .prepare(message)
                .and_then(|(working, pointer)| Ok((handler.process(&working)?, pointer)));
            record(&mut context, message, result)?;
        }

        context.finalize(suppress_error)
    }

    /// Runs handlers on a bounded worker pool. Payload resolution stays on the
    /// calling thread, and outcomes are recorded in batch order once every
    /// handler returned.
    pub fn process_concurrently<H>(
        &self,
        batch: &[SqsMessage],
        handler: &H,
        suppress_error: bool,
    ) -> Result<BatchReport<H::Output>, BatchError>
    where
        H: MessageHandler + Sync,
        H::Output: Send,
    {
        if self.max_workers <= 1 || batch.len() <= 1 {
            return self.process_with_report(batch, handler, suppress_error);
        }

        self.log_batch_started(batch, self.max_workers);
        let prepared: Vec<Prepared> = batch.iter().map(|message| self.prepare(message)).collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|error| BatchError::WorkerPool(error.to_string()))?;

        let results: Vec<Result<(H::Output, Option<PayloadPointer>), HandlerError>> =
            pool.install(|| {
                prepared
                    .into_par_iter()
                    .map(|prepared| {
                        let (working, pointer) = prepared?;
                        Ok((handler.process(&working)?, pointer))
                    })
                    .collect()
            });

        let mut context = self.new_context();
        for (message, result) in batch.iter().zip(results) {
            record(&mut context, message, result)?;
        }

        context.finalize(suppress_error)
    }

    fn new_context<R>(&self) -> BatchContext<R> {
        let context = BatchContext::new(Arc::clone(&self.queue));
        match (&self.resolver, self.delete_payloads) {
            (Some(resolver), true) => context.with_payload_cleanup(resolver.clone()),
            _ => context,
        }
    }

    fn prepare(&self, message: &SqsMessage) -> Prepared {
        match &self.resolver {
            Some(resolver) => resolver
                .resolve_message(message)
                .map_err(HandlerError::from),
            None => Ok((message.clone(), None)),
        }
    }

    fn log_batch_started(&self, batch: &[SqsMessage], workers: usize) {
        tracing::info!(
            component = "batch_processor",
            event = "batch_started",
            messages = batch.len(),
            workers,
            resolves_payloads = self.resolver.is_some(),
            "processing batch"
        );
    }
}

fn record<R>(
    context: &mut BatchContext<R>,
    message: &SqsMessage,
    result: Result<(R, Option<PayloadPointer>), HandlerError>,
) -> Result<(), BatchError> {
    match result {
        Ok((outcome, pointer)) => context.add_success_with_pointer(message, outcome, pointer),
        Err(cause) => context.add_failure(message, cause),
    }
}
