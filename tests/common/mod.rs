//! Scripted rules oracle for exercising the session independent of chess.

#![allow(dead_code)]

use std::cell::Cell;
use strictly_chess::{IllegalMove, MoveRequest, RulesOracle, Side, TerminalCause};

/// A move with fixed properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeMove {
    pub name: &'static str,
    pub capture: bool,
    pub check: bool,
}

impl FakeMove {
    pub fn quiet(name: &'static str) -> Self {
        Self {
            name,
            capture: false,
            check: false,
        }
    }

    pub fn capture(name: &'static str) -> Self {
        Self {
            name,
            capture: true,
            check: false,
        }
    }

    pub fn check(name: &'static str) -> Self {
        Self {
            name,
            capture: false,
            check: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakePosition {
    pub ply: usize,
    pub in_check: bool,
}

/// Offers the same moves in every position.
///
/// With `terminal_once_asked` set, the position turns terminal (stalemate)
/// the first time legal moves are requested.
#[derive(Debug)]
pub struct ScriptedOracle {
    pub moves: Vec<FakeMove>,
    pub terminal_once_asked: bool,
    asked: Cell<bool>,
}

impl ScriptedOracle {
    pub fn new(moves: Vec<FakeMove>) -> Self {
        Self {
            moves,
            terminal_once_asked: false,
            asked: Cell::new(false),
        }
    }

    pub fn terminal_once_asked(mut self) -> Self {
        self.terminal_once_asked = true;
        self
    }
}

impl RulesOracle for ScriptedOracle {
    type Position = FakePosition;
    type Move = FakeMove;

    fn initial_position(&self) -> FakePosition {
        FakePosition {
            ply: 0,
            in_check: false,
        }
    }

    fn legal_moves(&self, _position: &FakePosition) -> Vec<FakeMove> {
        self.asked.set(true);
        self.moves.clone()
    }

    fn resolve_move(
        &self,
        _position: &FakePosition,
        request: &MoveRequest,
    ) -> Result<FakeMove, IllegalMove> {
        self.moves
            .iter()
            .find(|mv| mv.name == request.to_string())
            .cloned()
            .ok_or_else(|| IllegalMove::new(request.to_string(), "not scripted"))
    }

    fn apply_move(&self, position: &FakePosition, mv: &FakeMove) -> Result<FakePosition, IllegalMove> {
        Ok(FakePosition {
            ply: position.ply + 1,
            in_check: mv.check,
        })
    }

    fn notation(&self, _position: &FakePosition, mv: &FakeMove) -> String {
        mv.name.to_string()
    }

    fn is_capture(&self, _position: &FakePosition, mv: &FakeMove) -> bool {
        mv.capture
    }

    fn is_check(&self, position: &FakePosition) -> bool {
        position.in_check
    }

    fn terminal_cause(&self, _position: &FakePosition) -> Option<TerminalCause> {
        (self.terminal_once_asked && self.asked.get()).then_some(TerminalCause::Stalemate)
    }

    fn side_to_move(&self, position: &FakePosition) -> Side {
        Side::to_move_after(position.ply)
    }

    fn to_display_string(&self, position: &FakePosition) -> String {
        format!("ply {}", position.ply)
    }
}
