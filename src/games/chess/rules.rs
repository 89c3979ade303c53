//! Contract for the chess rules oracle.
//!
//! The session owns exactly one authoritative position. The oracle never
//! mutates a position in place: `apply_move` returns a fresh value, so any
//! speculative application works on a scratch copy that is simply dropped.

use super::action::{IllegalMove, MoveRequest};
use super::outcome::TerminationCause;
use super::types::Side;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Terminal condition reported by the oracle for a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalCause {
    /// Side to move is mated.
    Checkmate,
    /// Side to move has no legal move and is not in check.
    Stalemate,
    /// Neither side has mating material.
    InsufficientMaterial,
    /// The same position occurred for the third time.
    Repetition,
    /// Any other rule draw (fifty-move rule).
    OtherDraw,
}

impl From<TerminalCause> for TerminationCause {
    fn from(cause: TerminalCause) -> Self {
        match cause {
            TerminalCause::Checkmate => TerminationCause::Checkmate,
            TerminalCause::Stalemate => TerminationCause::Stalemate,
            TerminalCause::InsufficientMaterial => TerminationCause::InsufficientMaterial,
            TerminalCause::Repetition => TerminationCause::Repetition,
            TerminalCause::OtherDraw => TerminationCause::OtherDraw,
        }
    }
}

/// Legality, application and terminal detection for one variant of chess.
///
/// Implementations are assumed correct. The session treats any failure to
/// apply a move the oracle itself resolved as a fatal fault.
pub trait RulesOracle: Send + 'static {
    /// Opaque position value.
    type Position: Clone + Debug + Send + 'static;
    /// Opaque legal move value.
    type Move: Clone + Debug + Send + 'static;

    /// Position every new match starts from.
    fn initial_position(&self) -> Self::Position;

    /// All legal moves for the side to move.
    fn legal_moves(&self, position: &Self::Position) -> Vec<Self::Move>;

    /// Maps a request onto a legal move in `position`.
    fn resolve_move(
        &self,
        position: &Self::Position,
        request: &MoveRequest,
    ) -> Result<Self::Move, IllegalMove>;

    /// Returns the position after `mv`. The input is left untouched.
    fn apply_move(
        &self,
        position: &Self::Position,
        mv: &Self::Move,
    ) -> Result<Self::Position, IllegalMove>;

    /// Standard algebraic notation for `mv` played from `position`.
    fn notation(&self, position: &Self::Position, mv: &Self::Move) -> String;

    /// Returns true if `mv` captures a piece.
    fn is_capture(&self, position: &Self::Position, mv: &Self::Move) -> bool;

    /// Returns true if the side to move is in check.
    fn is_check(&self, position: &Self::Position) -> bool;

    /// Terminal condition of `position`, if any.
    fn terminal_cause(&self, position: &Self::Position) -> Option<TerminalCause>;

    /// Whose move it is.
    fn side_to_move(&self, position: &Self::Position) -> Side;

    /// Board notation for display (FEN for standard chess).
    fn to_display_string(&self, position: &Self::Position) -> String;
}
