//! Standard chess rules backed by `shakmaty`.

use super::action::{IllegalMove, MoveRequest, Promotion};
use super::rules::{RulesOracle, TerminalCause};
use super::types::Side;
use derive_more::{Display, Error};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Halfmove clock value at which the fifty-move rule applies.
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Occurrences of one position that make a repetition draw.
const REPETITION_LIMIT: u32 = 3;

/// A board plus the repetition counts of every position since the last
/// irreversible move.
#[derive(Debug, Clone)]
pub struct StandardPosition {
    board: Chess,
    seen: HashMap<String, u32>,
}

impl StandardPosition {
    fn new(board: Chess) -> Self {
        let mut position = Self {
            board,
            seen: HashMap::new(),
        };
        position.record();
        position
    }

    fn record(&mut self) {
        // Captures and pawn moves reset the halfmove clock; nothing before
        // them can repeat.
        if self.board.halfmoves() == 0 {
            self.seen.clear();
        }
        *self.seen.entry(repetition_key(&self.board)).or_insert(0) += 1;
    }

    /// Underlying board.
    pub fn board(&self) -> &Chess {
        &self.board
    }

    /// How many times the current position has occurred.
    pub fn repetitions(&self) -> u32 {
        self.seen
            .get(&repetition_key(&self.board))
            .copied()
            .unwrap_or(0)
    }
}

/// Placement, side to move, castling rights and en-passant square.
fn repetition_key(board: &Chess) -> String {
    let fen = Fen::from_position(board.clone(), EnPassantMode::Legal).to_string();
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

/// Failure to set up a position from FEN.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Invalid FEN '{}': {} at {}:{}", fen, reason, file, line)]
pub struct FenError {
    /// The rejected FEN.
    pub fen: String,
    /// Parser or setup diagnostic.
    pub reason: String,
    /// Line number where the error occurred.
    pub line: u32,
    /// Source file where the error occurred.
    pub file: &'static str,
}

impl FenError {
    /// Creates a new FEN error with caller location.
    #[track_caller]
    pub fn new(fen: impl Into<String>, reason: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            fen: fen.into(),
            reason: reason.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Orthodox chess with standard castling.
#[derive(Debug, Clone, Default)]
pub struct StandardRules {
    start: Chess,
}

impl StandardRules {
    /// Rules starting from the standard initial setup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules whose matches start from a custom position.
    #[instrument]
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let setup = fen
            .trim()
            .parse::<Fen>()
            .map_err(|e| FenError::new(fen, e.to_string()))?;
        let start: Chess = setup
            .into_position(CastlingMode::Standard)
            .map_err(|e| FenError::new(fen, e.to_string()))?;
        debug!(fen, "Loaded custom start position");
        Ok(Self { start })
    }

    fn uci_move(board: &Chess, request: &MoveRequest) -> Option<Move> {
        let uci: UciMove = request.to_string().parse().ok()?;
        uci.to_move(board).ok()
    }
}

fn side_of(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}

impl RulesOracle for StandardRules {
    type Position = StandardPosition;
    type Move = Move;

    fn initial_position(&self) -> StandardPosition {
        StandardPosition::new(self.start.clone())
    }

    fn legal_moves(&self, position: &StandardPosition) -> Vec<Move> {
        position.board.legal_moves().into_iter().collect()
    }

    #[instrument(skip(self, position), fields(request = %request))]
    fn resolve_move(
        &self,
        position: &StandardPosition,
        request: &MoveRequest,
    ) -> Result<Move, IllegalMove> {
        if let Some(mv) = Self::uci_move(&position.board, request) {
            return Ok(mv);
        }
        // A pawn reaching the last rank without a named piece becomes a queen.
        if request.promotion().is_none()
            && let Some(mv) = Self::uci_move(&position.board, &request.promoted_to(Promotion::Queen))
        {
            debug!("Defaulted promotion to queen");
            return Ok(mv);
        }
        Err(IllegalMove::new(
            request.to_string(),
            format!("not a legal move for {}", side_of(position.board.turn())),
        ))
    }

    fn apply_move(&self, position: &StandardPosition, mv: &Move) -> Result<StandardPosition, IllegalMove> {
        if !position.board.is_legal(mv) {
            return Err(IllegalMove::new(
                UciMove::from_standard(mv).to_string(),
                "not legal in this position",
            ));
        }
        let mut next = position.clone();
        next.board.play_unchecked(mv);
        next.record();
        Ok(next)
    }

    fn notation(&self, position: &StandardPosition, mv: &Move) -> String {
        let mut san = San::from_move(&position.board, mv).to_string();
        let mut after = position.board.clone();
        after.play_unchecked(mv);
        if after.is_checkmate() {
            san.push('#');
        } else if after.is_check() {
            san.push('+');
        }
        san
    }

    fn is_capture(&self, _position: &StandardPosition, mv: &Move) -> bool {
        mv.is_capture()
    }

    fn is_check(&self, position: &StandardPosition) -> bool {
        position.board.is_check()
    }

    fn terminal_cause(&self, position: &StandardPosition) -> Option<TerminalCause> {
        let board = &position.board;
        if board.is_checkmate() {
            Some(TerminalCause::Checkmate)
        } else if board.is_stalemate() {
            Some(TerminalCause::Stalemate)
        } else if board.is_insufficient_material() {
            Some(TerminalCause::InsufficientMaterial)
        } else if position.repetitions() >= REPETITION_LIMIT {
            Some(TerminalCause::Repetition)
        } else if board.halfmoves() >= FIFTY_MOVE_HALFMOVES {
            Some(TerminalCause::OtherDraw)
        } else {
            None
        }
    }

    fn side_to_move(&self, position: &StandardPosition) -> Side {
        side_of(position.board.turn())
    }

    fn to_display_string(&self, position: &StandardPosition) -> String {
        Fen::from_position(position.board.clone(), EnPassantMode::Legal).to_string()
    }
}
