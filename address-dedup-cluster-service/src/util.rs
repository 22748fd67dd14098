use address_dedup_service::dto::{ColumnConfig, DataFile, ExportMode};
use address_dedup_service::error::ServiceError;
use address_dedup_service::report::Report;
use address_dedup_service::table::{export_bytes, read_table, Table};
use address_dedup_service::util::{download_data_file, output_location, upload_data_file};
use rusoto_s3::S3Client;
use serde_json::{json, Value};

pub async fn pull_table(
    client: &S3Client,
    data: &DataFile,
    columns: &ColumnConfig,
) -> Result<Table, ServiceError> {
    let bytes = download_data_file(client, data).await?;
    Ok(read_table(bytes.as_slice(), columns)?)
}

pub async fn push_export(
    client: &S3Client,
    data: &DataFile,
    report: &Report<'_>,
    headers: &[String],
    columns: &ColumnConfig,
    mode: ExportMode,
) -> Result<Value, ServiceError> {
    let object = export_bytes(report, headers, columns, mode)?;
    let output = output_location(data);
    upload_data_file(client, object, &output).await?;
    Ok(json!({ "bucket": output.bucket, "key": output.key }))
}
