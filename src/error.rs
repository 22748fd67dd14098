use crate::config::ConfigError;
use crate::response::Status;
use crate::table::TableError;
use serde::Serialize;
use std::error;
use std::fmt;

/// Error surfaced to a service caller, tagged with the status it maps to.
#[derive(Debug, Serialize, Clone)]
pub struct ServiceError {
    pub msg: String,
    pub status: Status,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let json = serde_json::to_string_pretty(&self).map_err(|_| fmt::Error)?;
        write!(f, "{}", json)
    }
}

impl error::Error for ServiceError {}

impl ServiceError {
    pub fn bad_request<T: fmt::Display>(msg: T) -> ServiceError {
        ServiceError {
            msg: msg.to_string(),
            status: Status::BadRequest,
        }
    }

    pub fn not_found<T: fmt::Display>(msg: T) -> ServiceError {
        ServiceError {
            msg: msg.to_string(),
            status: Status::NotFound,
        }
    }

    pub fn internal_server_error<T: fmt::Display>(msg: T) -> ServiceError {
        ServiceError {
            msg: msg.to_string(),
            status: Status::InternalServerError,
        }
    }
}

impl From<TableError> for ServiceError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::MissingColumns(_) | TableError::Csv(_) => ServiceError::bad_request(err),
            TableError::Io(_) => ServiceError::internal_server_error(err),
        }
    }
}

impl From<ConfigError> for ServiceError {
    fn from(err: ConfigError) -> Self {
        ServiceError::bad_request(err)
    }
}
