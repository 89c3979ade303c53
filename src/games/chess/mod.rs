//! Chess: domain types, outcome classification and the rules oracle.

mod action;
mod outcome;
mod rules;
mod standard;
mod types;

pub use action::{IllegalMove, MoveRequest, ParseMoveError, Promotion};
pub use outcome::{GameOutcome, TerminationCause, Winner};
pub use rules::{RulesOracle, TerminalCause};
pub use standard::{FenError, StandardPosition, StandardRules};
pub use types::{
    Difficulty, GameMode, MatchConfig, MoveHistory, MovePair, MoveRecord, ParseTimeControlError,
    Side, TimeControl, TimeControlPreset,
};
