#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use thiserror::Error;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Failures surfaced by the gateway and the stores. Callers branch on the
/// variant, the message is for display only.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ClientError {
    /// The service could not be reached.
    #[error("{message}")]
    Network { message: String },

    /// The service answered with a non-success status.
    #[error("{message}")]
    Service { status: u16, message: String },

    /// A guest tried to create more to-dos than the service allows.
    #[error("{message}")]
    GuestLimitExceeded { message: String },

    /// The service answered successfully with a body that could not be read.
    #[error("{message}")]
    InvalidResponse { message: String },

    /// The request could not be built from what the caller handed over.
    #[error("{message}")]
    InvalidRequest { message: String },

    /// No to-do with this id is loaded locally.
    #[error("Todo not found")]
    NotFound { id: i64 },
}

impl ClientError {
    pub fn network(message: &str) -> ClientError {
        return ClientError::Network {
            message: message.to_string(),
        };
    }

    pub fn service(status: u16, message: &str) -> ClientError {
        return ClientError::Service {
            status,
            message: message.to_string(),
        };
    }

    pub fn message(&self) -> String {
        return self.to_string();
    }

    pub fn status(&self) -> Option<u16> {
        return match self {
            ClientError::Service { status, .. } => Some(*status),
            ClientError::GuestLimitExceeded { .. } => Some(403),
            _ => None,
        };
    }

    pub fn guest_limit_reached(&self) -> bool {
        return matches!(self, ClientError::GuestLimitExceeded { .. });
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> ClientError {
        if err.is_decode() {
            return ClientError::InvalidResponse {
                message: err.to_string(),
            };
        }

        return ClientError::Network {
            message: err.to_string(),
        };
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> ClientError {
        return ClientError::InvalidResponse {
            message: err.to_string(),
        };
    }
}
