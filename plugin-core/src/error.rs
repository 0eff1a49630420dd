use thiserror::Error;

use crate::protocol::{INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR};
use crate::services::time_api::TimeFetchError;

/// Failures a request can end in. Every variant maps onto one wire error code.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("{0}")]
    InvalidParams(String),

    #[error("product analysis error: {0}")]
    Analysis(String),

    #[error(transparent)]
    TimeFetch(#[from] TimeFetchError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PluginError {
    pub fn code(&self) -> i64 {
        match self {
            PluginError::Parse(_) => PARSE_ERROR,
            PluginError::MethodNotFound(_) => METHOD_NOT_FOUND,
            PluginError::InvalidParams(_) => INVALID_PARAMS,
            PluginError::Analysis(_) | PluginError::TimeFetch(_) | PluginError::Internal(_) => {
                INTERNAL_ERROR
            }
        }
    }
}

/// Failures of the loop itself, as opposed to a single request.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to read request line: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write response line: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}
