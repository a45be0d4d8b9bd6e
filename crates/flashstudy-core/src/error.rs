//! Session error types.
//!
//! Returned by [`Session`](crate::session::Session) transitions that cannot
//! apply in the current state. Benign no-ops (answering twice, advancing past
//! the last card) are reported as outcomes, not errors.

use thiserror::Error;

use crate::model::Mode;

/// Errors raised by session transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The subject id is not in the catalog.
    #[error("unknown subject: {0}")]
    UnknownSubject(String),

    /// The transition needs an active subject.
    #[error("no subject selected")]
    NoActiveSubject,

    /// The transition belongs to a different mode.
    #[error("'{action}' is only available in {expected} mode (current mode: {actual})")]
    ModeMismatch {
        action: &'static str,
        expected: Mode,
        actual: Mode,
    },

    /// The active subject has no cards.
    #[error("subject '{0}' has no flashcards")]
    EmptySubject(String),

    /// A match board position outside the board.
    #[error("no match item at position {0}")]
    UnknownMatchItem(usize),
}
