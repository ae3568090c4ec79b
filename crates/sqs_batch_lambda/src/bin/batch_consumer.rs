use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use sqs_batch_lambda::adapters::object_store::S3ObjectStore;
use sqs_batch_lambda::adapters::queue::SqsQueueService;
use sqs_batch_lambda::config::ConsumerConfig;
use sqs_batch_lambda::handlers::consumer::{
    decode_sqs_event, handle_sqs_event, ConsumerResponse, ConsumerServices,
};
use sqs_batch_lambda::logging::init_logging;

struct Runtime {
    config: ConsumerConfig,
    services: ConsumerServices,
}

async fn handle_request(
    event: LambdaEvent<serde_json::Value>,
    runtime: &Runtime,
) -> Result<ConsumerResponse, Error> {
    let request_id = event.context.request_id.clone();
    let sqs_event = decode_sqs_event(event.payload)?;

    tracing::info!(
        component = "batch_consumer",
        event = "invocation_started",
        request_id = %request_id,
        records = sqs_event.records.len(),
        mode = runtime.config.mode.as_str(),
        "handling sqs batch"
    );

    handle_sqs_event(&sqs_event, &runtime.config, &runtime.services).map_err(|error| {
        tracing::error!(
            component = "batch_consumer",
            event = "invocation_failed",
            request_id = %request_id,
            error = %error,
            "sqs batch failed"
        );
        Error::from(error)
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = ConsumerConfig::from_env()?;
    init_logging(&config.log_level)?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let services = ConsumerServices {
        queue: Arc::new(SqsQueueService::new(aws_sdk_sqs::Client::new(&aws_config))),
        store: Arc::new(S3ObjectStore::new(aws_sdk_s3::Client::new(&aws_config))),
    };
    let runtime = Runtime { config, services };
    let runtime = &runtime;

    lambda_runtime::run(service_fn(move |event| async move {
        handle_request(event, runtime).await
    }))
    .await
}
