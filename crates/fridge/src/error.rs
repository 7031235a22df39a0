//! Fridge actor error types.

use thiserror::Error;

/// Errors returned by actor handles.
///
/// Fire-and-forget sends only fail when the receiving actor has stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FridgeError {
    /// The actor's mailbox is closed.
    #[error("Mailbox closed: {actor} is no longer running")]
    MailboxClosed { actor: &'static str },

    /// The actor stopped before answering a query.
    #[error("Reply dropped: {actor} stopped before answering")]
    ReplyDropped { actor: &'static str },
}

/// Convenience type alias for fridge results.
pub type Result<T> = std::result::Result<T, FridgeError>;
