use std::future::Future;

pub mod object_store;
pub mod queue;

/// Drives an SDK future from the synchronous service traits. Must be called
/// from a multi-threaded tokio runtime.
pub(crate) fn block_on_sdk<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
