//! Errors returned by the REST client
//!
//! Every failure of a request falls into one of three kinds. Command handlers
//! catch all of them and turn them into a notice for the user.

use thiserror::Error;

/// Error kinds for API calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was obtained (connection refused, DNS failure, ...)
    Transport,
    /// A response arrived with a non-success status
    Server,
    /// A success response carried a body that is not the expected JSON
    Parse,
}

impl ErrorKind {
    /// Get the error kind as a stable string for log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "TRANSPORT_ERROR",
            ErrorKind::Server => "SERVER_ERROR",
            ErrorKind::Parse => "PARSE_ERROR",
        }
    }
}

/// Failure of a single API call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("{0}")]
    Transport(String),

    /// The body is the raw response text, which the server fills with a
    /// human-readable message.
    #[error("server responded with status {status}: {body}")]
    Server { status: u16, body: String },

    #[error("invalid JSON response: {0}")]
    Parse(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Transport(_) => ErrorKind::Transport,
            ClientError::Server { .. } => ErrorKind::Server,
            ClientError::Parse(_) => ErrorKind::Parse,
        }
    }

    /// HTTP status of a server error
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message shown when loading a collection fails, e.g. `users`
    pub fn load_message(&self, resource: &str) -> String {
        match self {
            ClientError::Server { .. } => format!("Failed to load {}", resource),
            other => format!("Error loading {}: {}", resource, other),
        }
    }

    /// Message shown when a mutation fails, e.g. `creating user`.
    ///
    /// Server errors show the response body verbatim.
    pub fn action_message(&self, action: &str) -> String {
        match self {
            ClientError::Server { body, .. } => body.clone(),
            other => format!("Error {}: {}", action, other),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ClientError::Transport("connection refused".into()).kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            ClientError::Server {
                status: 404,
                body: "not found".into()
            }
            .kind(),
            ErrorKind::Server
        );
        assert_eq!(ClientError::Parse("eof".into()).kind(), ErrorKind::Parse);
        assert_eq!(ErrorKind::Server.as_str(), "SERVER_ERROR");
    }

    #[test]
    fn test_status_only_for_server_errors() {
        let err = ClientError::Server {
            status: 409,
            body: "conflict".into(),
        };
        assert_eq!(err.status(), Some(409));
        assert_eq!(ClientError::Parse("x".into()).status(), None);
    }

    #[test]
    fn test_action_message_uses_raw_body() {
        let err = ClientError::Server {
            status: 409,
            body: "Cannot delete: release has active deployments".into(),
        };
        assert_eq!(
            err.action_message("deleting user"),
            "Cannot delete: release has active deployments"
        );

        let err = ClientError::Transport("connection refused".into());
        assert_eq!(
            err.action_message("deleting user"),
            "Error deleting user: connection refused"
        );
    }

    #[test]
    fn test_load_message() {
        let err = ClientError::Server {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.load_message("users"), "Failed to load users");

        let err = ClientError::Parse("expected value at line 1 column 1".into());
        assert_eq!(
            err.load_message("releases"),
            "Error loading releases: invalid JSON response: expected value at line 1 column 1"
        );
    }
}
