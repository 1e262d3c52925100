use camdict_http::{HttpError, StatusCode};
use camdict_parser::ParseError;
use thiserror::Error;

use crate::storage::StorageError;

/// The site answered, but not in the way the redirect protocol says it should.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unexpected response code from {url}: expected {expected}, got {actual}")]
    UnexpectedStatus {
        expected: StatusCode,
        actual: StatusCode,
        url: String,
    },

    #[error("empty lemma id in redirect")]
    EmptyLemmaId,

    #[error("unknown redirect: {0}")]
    UnknownRedirect(String),

    #[error("redirect without a Location header")]
    MissingLocation,

    #[error("can not get suggestions: {0}")]
    NoSuggestions(#[source] ParseError),
}

/// Everything a [`crate::Querier`] call can fail with.
///
/// Parse, protocol and decode failures are deterministic for a given page and
/// are safe to cache; transport failures and cancellation are not.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("transport: {0}")]
    Transport(HttpError),

    #[error("malformed page body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("operation cancelled")]
    Cancelled,

    #[error("querier is closed")]
    Closed,

    #[error("parse worker failed: {0}")]
    Worker(String),

    /// A failure recorded by the cache and returned again without asking the site.
    #[error("{kind} (cached): {message}")]
    Replayed { kind: String, message: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("close failed: {0}")]
    Close(String),
}

impl From<HttpError> for QueryError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Cancelled => Self::Cancelled,
            other => Self::Transport(other),
        }
    }
}

impl QueryError {
    /// Stable short name, used in logs and cache records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::Protocol(_) => "protocol",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
            Self::Cancelled => "cancelled",
            Self::Closed => "closed",
            Self::Worker(_) => "worker",
            Self::Replayed { .. } => "replayed",
            Self::Storage(_) => "storage",
            Self::Close(_) => "close",
        }
    }

    /// Network trouble or cancellation: the same call may succeed later.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Cancelled)
    }

    /// Whether the failure says something about the page itself rather than
    /// about this attempt to fetch it.
    pub fn is_cacheable(&self) -> bool {
        matches!(
            self,
            Self::Parse(_) | Self::Protocol(_) | Self::Decode(_) | Self::Replayed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_transport_is_its_own_variant() {
        let err = QueryError::from(HttpError::Cancelled);
        assert!(matches!(err, QueryError::Cancelled));
        assert!(err.is_transport());
        assert!(!err.is_cacheable());
    }

    #[test]
    fn network_errors_are_transport() {
        let err = QueryError::from(HttpError::Network("reset".into()));
        assert_eq!(err.kind(), "transport");
        assert!(err.is_transport());
    }

    #[test]
    fn protocol_and_parse_errors_are_cacheable() {
        let protocol = QueryError::from(ProtocolError::EmptyLemmaId);
        let parse = QueryError::from(ParseError::MissingDefinition);
        assert!(protocol.is_cacheable() && !protocol.is_transport());
        assert!(parse.is_cacheable());
        assert_eq!(parse.to_string(), "div.ddef_h has no div.def");
    }

    #[test]
    fn unexpected_status_names_both_codes() {
        let err = ProtocolError::UnexpectedStatus {
            expected: StatusCode::FOUND,
            actual: StatusCode::OK,
            url: "http://x/".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("302"), "{msg}");
        assert!(msg.contains("200"), "{msg}");
    }
}
