//! Error types for the oas-client crate.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while resolving operations or dispatching requests.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("operation {operation_id} not found")]
    OperationNotFound { operation_id: String },

    #[error("missing path parameter {parameter} for operation {operation_id}")]
    MissingPathParameter {
        operation_id: String,
        parameter: String,
    },

    #[error("non-local reference {reference} is not implemented")]
    UnsupportedReference { reference: String },

    #[error("reference {reference} does not point to anything in the document")]
    UnresolvableReference { reference: String },

    #[error("can't choose an appropriate default value for header {header} of operation {operation_id}")]
    AmbiguousHeaderDefault {
        operation_id: String,
        header: String,
    },

    #[error("HTTP {status}: client error")]
    ClientError {
        status: StatusCode,
        body: Option<Value>,
    },

    #[error("HTTP {status}: server error")]
    ServerError {
        status: StatusCode,
        body: Option<Value>,
    },

    #[error("expected HTTP {expected}, got {status}")]
    UnexpectedStatus {
        expected: StatusCode,
        status: StatusCode,
        body: Option<Value>,
    },

    #[error("unsupported schema version: {}", .version.as_deref().unwrap_or("unknown"))]
    UnsupportedSchemaVersion { version: Option<String> },

    #[error("failed to parse schema document")]
    SchemaParse(#[source] serde_yaml::Error),

    #[error("HTTP request failed")]
    Request(#[source] reqwest::Error),

    #[error("invalid URL: {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid header {name}")]
    InvalidHeader { name: String },

    #[error("failed to encode JWT")]
    Token(#[source] jsonwebtoken::errors::Error),

    #[error("failed to read config file: {path}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {path}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid client config: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    /// The decoded response body carried by HTTP status errors, if any.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::ClientError { body, .. }
            | Self::ServerError { body, .. }
            | Self::UnexpectedStatus { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// The HTTP status of a response that was classified as a failure.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::ClientError { status, .. }
            | Self::ServerError { status, .. }
            | Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Request(err) => err.status(),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
