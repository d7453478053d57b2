//! Error types for port operations.

/// Failure talking to one of the remote services.
///
/// Every variant is recovered locally by the use cases (logged, degraded
/// mode); none is surfaced to the end user. `Clone` so a single in-flight
/// load can hand the same failure to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Request could not be sent or the connection broke.
    #[error("Request to {endpoint} failed: {message}")]
    Request {
        endpoint: &'static str,
        message: String,
    },

    /// Remote answered with a non-success HTTP status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    /// Response body did not match the expected shape.
    #[error("Failed to decode {endpoint} response: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },

    /// Envelope carried `success: false` or no data.
    #[error("{endpoint} reported failure: {message}")]
    Unsuccessful {
        endpoint: &'static str,
        message: String,
    },

    /// The service (or a load shared with other callers) went away.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl TransportError {
    pub fn request(endpoint: &'static str, message: impl ToString) -> Self {
        Self::Request {
            endpoint,
            message: message.to_string(),
        }
    }

    pub fn status(endpoint: &'static str, status: u16, body: impl ToString) -> Self {
        Self::Status {
            endpoint,
            status,
            body: body.to_string(),
        }
    }

    pub fn decode(endpoint: &'static str, message: impl ToString) -> Self {
        Self::Decode {
            endpoint,
            message: message.to_string(),
        }
    }

    pub fn unsuccessful(endpoint: &'static str, message: impl ToString) -> Self {
        Self::Unsuccessful {
            endpoint,
            message: message.to_string(),
        }
    }

    pub fn unavailable(message: impl ToString) -> Self {
        Self::Unavailable(message.to_string())
    }
}
