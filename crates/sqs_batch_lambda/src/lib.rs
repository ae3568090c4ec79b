//! Lambda consumer for SQS batches with S3-offloaded payloads.
//!
//! `adapters` implements the core service traits on the AWS SDK clients,
//! `handlers::consumer` decides per invocation between partial and enriched
//! processing, and the `batch_consumer` binary wires both together with the
//! settings from `config`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;
