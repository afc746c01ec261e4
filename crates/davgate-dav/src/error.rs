//! Error types for the WebDAV session adapter.

use thiserror::Error;

/// Errors that can occur during WebDAV mailbox operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Bootstrap could not establish the user identity or mailbox root.
    /// Usually an expired or invalid credential. The session is unusable.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The well-known folder discovery request returned no entries.
    /// The session is unusable.
    #[error("Unable to discover mailbox folders at {0}")]
    MailboxDiscovery(String),

    /// The requested item does not exist (HTTP 404 or unrecognized
    /// content class). Callers may fall back to an alternate lookup.
    #[error("Item not found")]
    ItemNotFound,

    /// The requested folder does not exist.
    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    /// A condition referenced an attribute missing from the field
    /// registry. Programming error, surfaced immediately.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// An operator with no defined query token was compiled.
    #[error("Operator {0} has no query token")]
    UnsupportedOperator(&'static str),

    /// Conflicting concurrent write, or a move/copy target that already
    /// exists (HTTP 412). Never silently retried.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Precondition failure on a copy target.
    #[error("Unable to copy message: {0}")]
    CopyConflict(String),

    /// Any other non-success transport status.
    #[error("Transport error: {status} {reason}")]
    Transport {
        /// HTTP status code (after vendor status renormalization).
        status: u16,
        /// Status line or reason phrase for diagnostics.
        reason: String,
    },

    /// I/O error from the transport or body decoding.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Builds the typed error for a non-success response status.
    ///
    /// 404 maps to [`Error::ItemNotFound`] and 412 to
    /// [`Error::PreconditionFailed`]; everything else is a generic
    /// transport failure.
    #[must_use]
    pub fn from_status(status: u16, reason: impl Into<String>) -> Self {
        match status {
            404 => Self::ItemNotFound,
            412 => Self::PreconditionFailed(reason.into()),
            _ => Self::Transport {
                status,
                reason: reason.into(),
            },
        }
    }

    /// Returns true for the recoverable "not found" variants.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ItemNotFound | Self::FolderNotFound(_))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_status_not_found() {
        assert!(matches!(
            Error::from_status(404, "Not Found"),
            Error::ItemNotFound
        ));
    }

    #[test]
    fn from_status_precondition() {
        assert!(matches!(
            Error::from_status(412, "Precondition Failed"),
            Error::PreconditionFailed(_)
        ));
    }

    #[test]
    fn from_status_other() {
        match Error::from_status(503, "Service Unavailable") {
            Error::Transport { status, reason } => {
                assert_eq!(status, 503);
                assert_eq!(reason, "Service Unavailable");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn is_not_found() {
        assert!(Error::ItemNotFound.is_not_found());
        assert!(Error::FolderNotFound("x".into()).is_not_found());
        assert!(!Error::from_status(500, "boom").is_not_found());
    }
}
