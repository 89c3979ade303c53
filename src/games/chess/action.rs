//! First-class move requests.
//!
//! A request is a player's intent (from-square, to-square, optional
//! promotion piece). It carries no legality; the rules oracle decides
//! whether it names a legal move in the current position.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::instrument;

/// Piece a pawn may promote to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Promotion {
    /// Queen.
    Queen,
    /// Rook.
    Rook,
    /// Bishop.
    Bishop,
    /// Knight.
    Knight,
}

impl Promotion {
    /// Lowercase letter used in coordinate notation.
    pub fn as_char(self) -> char {
        match self {
            Promotion::Queen => 'q',
            Promotion::Rook => 'r',
            Promotion::Bishop => 'b',
            Promotion::Knight => 'n',
        }
    }

    /// Parses a promotion letter (either case).
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'q' => Some(Promotion::Queen),
            'r' => Some(Promotion::Rook),
            'b' => Some(Promotion::Bishop),
            'n' => Some(Promotion::Knight),
            _ => None,
        }
    }
}

/// A move as submitted by an input adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveRequest {
    from: String,
    to: String,
    promotion: Option<Promotion>,
}

impl MoveRequest {
    /// Creates a request from two algebraic squares such as `"e2"` and `"e4"`.
    #[instrument]
    pub fn new(from: &str, to: &str, promotion: Option<Promotion>) -> Result<Self, ParseMoveError> {
        let from = normalize_square(from).ok_or_else(|| ParseMoveError::new(from))?;
        let to = normalize_square(to).ok_or_else(|| ParseMoveError::new(to))?;
        Ok(Self {
            from,
            to,
            promotion,
        })
    }

    /// Origin square, lowercase.
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Destination square, lowercase.
    pub fn to(&self) -> &str {
        &self.to
    }

    /// Requested promotion piece.
    pub fn promotion(&self) -> Option<Promotion> {
        self.promotion
    }

    /// The same request with an explicit promotion piece.
    pub fn promoted_to(&self, promotion: Promotion) -> Self {
        Self {
            promotion: Some(promotion),
            ..self.clone()
        }
    }
}

fn normalize_square(s: &str) -> Option<String> {
    let lower = s.trim().to_ascii_lowercase();
    let mut chars = lower.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(file @ 'a'..='h'), Some(rank @ '1'..='8'), None) => Some(format!("{}{}", file, rank)),
        _ => None,
    }
}

impl std::fmt::Display for MoveRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.as_char())?;
        }
        Ok(())
    }
}

/// Error parsing coordinate notation.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Cannot parse move '{}' at {}:{}", input, file, line)]
pub struct ParseMoveError {
    /// The rejected text.
    pub input: String,
    /// Line number where the error occurred.
    pub line: u32,
    /// Source file where the error occurred.
    pub file: &'static str,
}

impl ParseMoveError {
    #[track_caller]
    fn new(input: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            input: input.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl FromStr for MoveRequest {
    type Err = ParseMoveError;

    /// Accepts `e2e4`, `e7e8q`, `e2-e4` and `e7-e8=Q`.
    #[instrument]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '=' | ' '))
            .collect();
        if !compact.is_ascii() || !(4..=5).contains(&compact.len()) {
            return Err(ParseMoveError::new(s));
        }
        let promotion = match compact.chars().nth(4) {
            Some(c) => Some(Promotion::from_char(c).ok_or_else(|| ParseMoveError::new(s))?),
            None => None,
        };
        MoveRequest::new(&compact[0..2], &compact[2..4], promotion).map_err(|_| ParseMoveError::new(s))
    }
}

/// Rejection of a move request.
///
/// Always recoverable: state is unchanged and the caller may try again.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Illegal move {}: {}", request, reason)]
pub struct IllegalMove {
    /// What was attempted, in coordinate notation.
    pub request: String,
    /// Why it was refused.
    pub reason: String,
}

impl IllegalMove {
    /// Creates a rejection.
    pub fn new(request: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            reason: reason.into(),
        }
    }
}
