use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common error type for all state query responses
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum QueryError {
    /// The requested resource was not found
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Invalid request parameters
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Query variant is not implemented yet
    #[error("Query not implemented: {query}")]
    NotImplemented { query: String },

    /// An error occurred while processing the query
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl QueryError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn not_implemented(query: impl Into<String>) -> Self {
        Self::NotImplemented {
            query: query.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for QueryError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal_error(error.to_string())
    }
}
