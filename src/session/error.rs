//! Session error types.

use crate::games::chess::{IllegalMove, Side};
use derive_more::{Display, Error};

/// Everything a session operation can refuse or fail with.
///
/// Most variants are recoverable rejections: state is unchanged and the
/// caller may try something else. [`SessionError::is_fatal`] picks out the
/// internal-consistency faults that end the session.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SessionError {
    /// The request did not name a legal move.
    #[display("{}", _0)]
    IllegalMove(IllegalMove),
    /// The match has already ended; the request was ignored.
    #[display("The match is already over")]
    MatchAlreadyOver,
    /// No match has been started yet.
    #[display("No match has been started")]
    MatchNotStarted,
    /// Moves are not accepted while paused.
    #[display("The match is paused")]
    MatchPaused,
    /// Human input arrived on the computer's turn.
    #[display("It is the computer's turn")]
    ComputerToMove,
    /// The computer was asked to move with nothing to choose from.
    #[display("Computer found no move for {} in a non-terminal position", side)]
    HeuristicFoundNoMove {
        /// Side the computer plays.
        side: Side,
    },
    /// The rules oracle failed on a move it had resolved itself.
    #[display("Rules oracle failure: {}", _0)]
    Oracle(#[error(not(source))] String),
    /// A state invariant failed after a transition (debug builds).
    #[display("Invariant violated: {}", _0)]
    InvariantViolation(#[error(not(source))] String),
    /// The session task has stopped.
    #[display("The session has closed")]
    SessionClosed,
}

impl From<IllegalMove> for SessionError {
    fn from(err: IllegalMove) -> Self {
        SessionError::IllegalMove(err)
    }
}

impl SessionError {
    /// Returns true for faults that end the session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::HeuristicFoundNoMove { .. }
                | SessionError::Oracle(_)
                | SessionError::InvariantViolation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(!SessionError::MatchAlreadyOver.is_fatal());
        assert!(!SessionError::from(IllegalMove::new("e2e5", "blocked")).is_fatal());
        assert!(SessionError::HeuristicFoundNoMove { side: Side::Black }.is_fatal());
        assert!(SessionError::Oracle("corrupt".to_string()).is_fatal());
    }

    #[test]
    fn test_display() {
        let err = SessionError::from(IllegalMove::new("e2e5", "not a legal move for white"));
        assert_eq!(err.to_string(), "Illegal move e2e5: not a legal move for white");
    }
}
