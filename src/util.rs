use crate::dto::DataFile;
use crate::error::ServiceError;
use futures::stream::TryStreamExt;
use rusoto_core::{Region, RusotoError};
use rusoto_s3::{GetObjectError, GetObjectRequest, PutObjectRequest, S3Client, S3};
use std::env;
use std::str::FromStr;

pub fn get_region() -> Result<Region, ServiceError> {
    let val = get_env_var("REGION")?;
    Region::from_str(val.as_str())
        .map_err(|_| ServiceError::internal_server_error(format!("Unable to parse region {}", val)))
}

pub fn get_env_var(name: &str) -> Result<String, ServiceError> {
    env::var(name).map_err(|_| {
        ServiceError::internal_server_error(format!("Environment variable '{}' not found", name))
    })
}

/// Result tables land next to their input, under `/output` instead of `/input`.
pub fn output_location(data: &DataFile) -> DataFile {
    DataFile {
        bucket: data.bucket.replace("/input", "/output"),
        key: data.key.clone(),
    }
}

pub async fn download_data_file(client: &S3Client, data: &DataFile) -> Result<Vec<u8>, ServiceError> {
    let request = GetObjectRequest {
        bucket: data.bucket.clone(),
        key: data.key.clone(),
        ..Default::default()
    };
    let mut object = client.get_object(request).await.map_err(|err| match err {
        RusotoError::Service(GetObjectError::NoSuchKey(_)) => {
            ServiceError::not_found(format!("No data file at {}/{}", data.bucket, data.key))
        }
        other => ServiceError::internal_server_error(other),
    })?;
    let body = object
        .body
        .take()
        .ok_or_else(|| ServiceError::internal_server_error("Unable to extract body"))?;
    body.map_ok(|b| b.to_vec())
        .try_concat()
        .await
        .map_err(ServiceError::internal_server_error)
}

pub async fn upload_data_file(
    client: &S3Client,
    object: Vec<u8>,
    data: &DataFile,
) -> Result<(), ServiceError> {
    let request = PutObjectRequest {
        bucket: data.bucket.clone(),
        key: data.key.clone(),
        body: Some(object.into()),
        content_type: Some(String::from("text/csv")),
        ..Default::default()
    };
    client
        .put_object(request)
        .await
        .map(|_| ())
        .map_err(ServiceError::internal_server_error)
}
