//! Authoritative match outcome.

use super::types::Side;
use serde::{Deserialize, Serialize};

/// Result of a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Winner {
    /// White won.
    White,
    /// Black won.
    Black,
    /// Nobody won.
    Draw,
}

impl From<Side> for Winner {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Winner::White,
            Side::Black => Winner::Black,
        }
    }
}

/// The rule that ended a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationCause {
    /// Side to move is mated.
    Checkmate,
    /// Side to move has no legal move and is not in check.
    Stalemate,
    /// Neither side can mate.
    #[strum(to_string = "Insufficient material")]
    InsufficientMaterial,
    /// Threefold repetition.
    Repetition,
    /// Any other rule draw reported by the rules oracle (fifty-move rule).
    #[strum(to_string = "Fifty-move rule")]
    OtherDraw,
    /// A clock reached zero.
    Timeout,
    /// Both players agreed to a draw.
    Agreement,
}

/// Exactly one of these is authoritative per match.
///
/// Once `Terminated`, the value is frozen until a new match starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum GameOutcome {
    /// The match is still being played.
    InProgress {
        /// Whose move it is.
        side_to_move: Side,
        /// Whether that side is in check.
        in_check: bool,
    },
    /// The match is over.
    Terminated {
        /// Who won.
        winner: Winner,
        /// Why it ended.
        cause: TerminationCause,
    },
}

impl GameOutcome {
    /// Outcome at the start of every match.
    pub fn initial() -> Self {
        GameOutcome::InProgress {
            side_to_move: Side::White,
            in_check: false,
        }
    }

    /// Returns true once the match has ended.
    pub fn is_terminated(&self) -> bool {
        matches!(self, GameOutcome::Terminated { .. })
    }

    /// Side to move, while in progress.
    pub fn side_to_move(&self) -> Option<Side> {
        match self {
            GameOutcome::InProgress { side_to_move, .. } => Some(*side_to_move),
            GameOutcome::Terminated { .. } => None,
        }
    }

    /// Winner, once terminated.
    pub fn winner(&self) -> Option<Winner> {
        match self {
            GameOutcome::InProgress { .. } => None,
            GameOutcome::Terminated { winner, .. } => Some(*winner),
        }
    }

    /// Cause, once terminated.
    pub fn cause(&self) -> Option<TerminationCause> {
        match self {
            GameOutcome::InProgress { .. } => None,
            GameOutcome::Terminated { cause, .. } => Some(*cause),
        }
    }
}

impl std::fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameOutcome::InProgress {
                side_to_move,
                in_check: false,
            } => write!(f, "{} to move", side_to_move.label()),
            GameOutcome::InProgress {
                side_to_move,
                in_check: true,
            } => write!(f, "{} is in check!", side_to_move.label()),
            GameOutcome::Terminated { winner, cause } => match (winner, cause) {
                (Winner::White, TerminationCause::Checkmate) => write!(f, "White wins by checkmate!"),
                (Winner::Black, TerminationCause::Checkmate) => write!(f, "Black wins by checkmate!"),
                (Winner::White, TerminationCause::Timeout) => write!(f, "White wins on time!"),
                (Winner::Black, TerminationCause::Timeout) => write!(f, "Black wins on time!"),
                (_, TerminationCause::Stalemate) => write!(f, "Stalemate - Draw!"),
                (Winner::Draw, cause) => write!(f, "{} - Draw", cause),
                (winner, cause) => write!(f, "{} wins ({})", winner, cause),
            },
        }
    }
}
