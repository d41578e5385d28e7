// src/error.rs

//! Unified error handling for the sync application.

use std::fmt;

use thiserror::Error;

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed (network, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote service answered with a non-success status
    #[error("{context} returned HTTP {status}: {body}")]
    Status {
        context: String,
        status: u16,
        body: String,
    },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// GraphQL endpoint reported errors or returned no data
    #[error("{service} GraphQL error: {message}")]
    GraphQl { service: String, message: String },

    /// A watch state outside the known vocabulary reached the mapper
    #[error("{service} sent an unmappable watch state '{value}'")]
    UnmappableState { service: String, value: String },

    /// One partition of a library fetch failed; the whole fetch is void
    #[error("{service} library fetch failed in partition {partition}: {source}")]
    PartialFetch {
        service: String,
        partition: String,
        #[source]
        source: Box<AppError>,
    },

    /// Missing or unreadable access token
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a status error from a failed response.
    pub fn status(context: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            context: context.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a GraphQL error.
    pub fn graphql(service: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::GraphQl {
            service: service.into(),
            message: message.to_string(),
        }
    }

    /// Create an unmappable state error.
    pub fn unmappable_state(service: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UnmappableState {
            service: service.into(),
            value: value.into(),
        }
    }

    /// Wrap a page failure as a failure of the whole partitioned fetch.
    pub fn partial_fetch(
        service: impl Into<String>,
        partition: impl fmt::Display,
        source: AppError,
    ) -> Self {
        Self::PartialFetch {
            service: service.into(),
            partition: partition.to_string(),
            source: Box::new(source),
        }
    }

    /// Create an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error (or the partition failure it wraps) is an
    /// unmappable watch state.
    pub fn is_unmappable_state(&self) -> bool {
        match self {
            Self::UnmappableState { .. } => true,
            Self::PartialFetch { source, .. } => source.is_unmappable_state(),
            _ => false,
        }
    }
}
