mod util;

use address_dedup_service::dto::DedupRequest;
use address_dedup_service::error::ServiceError;
use address_dedup_service::pipeline::Pipeline;
use address_dedup_service::response::make_response_payload;
use address_dedup_service::util::get_region;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use rusoto_core::Client;
use rusoto_s3::S3Client;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .without_time()
        .init();
    let client = S3Client::new_with_client(Client::shared(), get_region()?);
    let client = &client;
    run(service_fn(move |event: LambdaEvent<DedupRequest>| async move {
        process(event, client).await
    }))
    .await?;
    Ok(())
}

async fn process(event: LambdaEvent<DedupRequest>, client: &S3Client) -> Result<Value, Error> {
    let (request, context) = event.into_parts();
    info!(request_id = %context.request_id, bucket = %request.data.bucket, key = %request.data.key, "received dedup request");
    let result = dedup(client, request).await;
    make_response_payload(result)
}

async fn dedup(client: &S3Client, request: DedupRequest) -> Result<Value, ServiceError> {
    let pipeline = Pipeline::new(request.config)?;
    let start = Instant::now();
    let table = util::pull_table(client, &request.data, &request.columns).await?;
    info!(
        rows = table.rows.len(),
        elapsed_secs = start.elapsed().as_secs_f64(),
        "table downloaded"
    );
    let records = pipeline.normalize_records(table.rows);
    let report = pipeline.run(&records);
    let output = util::push_export(
        client,
        &request.data,
        &report,
        &table.headers,
        &request.columns,
        request.export,
    )
    .await?;
    info!(
        flagged = report.flagged.len(),
        elapsed_secs = start.elapsed().as_secs_f64(),
        "export uploaded"
    );
    Ok(json!({ "summary": report.summary(), "output": output }))
}
