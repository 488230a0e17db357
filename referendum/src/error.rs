use crate::*;

use thiserror::Error;

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("referendum: invalid argument: {0}")]
    InvalidArgument(String),

    #[error("referendum: {0} already voted")]
    AlreadyVoted(String),

    #[error("referendum: ballot {0} has not been initialized")]
    LedgerUninitialized(String),

    #[error("referendum: error deserializing ballot record: {0}")]
    DeserializationFailed(#[source] serde_json::Error),

    #[error("referendum: error serializing ballot record: {0}")]
    SerializationFailed(#[source] serde_json::Error),

    #[error("referendum: tally for ballot {0} is full")]
    TallyOverflow(String),

    #[error("referendum: state read failed: {0}")]
    StoreReadFailed(#[source] StoreError),

    #[error("referendum: state write failed: {0}")]
    StoreWriteFailed(#[source] StoreError),

    /// `message` carries the structured payload handed back to the caller,
    /// e.g. `{"Error":"Failed to get vote for alice"}`.
    #[error("{message}")]
    NotFound { key: String, message: String },

    #[error("referendum: received unknown function invocation: {0}")]
    UnknownFunction(String),

    #[error("referendum: diagnostic error requested")]
    Diagnostic,

    #[error("referendum: invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn vote_not_found(voter_key: &str) -> Self {
        let message = serde_json::json!({
            "Error": format!("Failed to get vote for {}", voter_key)
        })
        .to_string();

        Error::NotFound {
            key: voter_key.to_owned(),
            message,
        }
    }

    pub(crate) fn arity(expected: usize) -> Self {
        Error::InvalidArgument(format!(
            "Incorrect number of arguments. Expecting {}",
            expected
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_payload_is_structured() {
        let err = Error::vote_not_found("alice");
        assert_eq!(
            format!("{}", err),
            r#"{"Error":"Failed to get vote for alice"}"#
        );

        let parsed: serde_json::Value = serde_json::from_str(&err.to_string()).unwrap();
        assert_eq!(parsed["Error"], "Failed to get vote for alice");
    }

    #[test]
    fn store_errors_keep_their_source() {
        use std::error::Error as _;

        let err = Error::StoreWriteFailed(StoreError::new("bob", "disk full"));
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "referendum: state write failed: state error at bob: disk full"
        );
    }
}
