//! Move selection for the computer opponent.
//!
//! Deliberately weak: each tier narrows the candidate list by a simple
//! preference and then picks uniformly at random. There is no search.

use crate::games::chess::{Difficulty, RulesOracle};
use derive_more::{Display, Error};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, instrument};

/// Failure to pick a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum HeuristicError {
    /// The legal-move list was empty.
    #[display("No legal moves to choose from")]
    NoLegalMoves,
}

/// Picks one of `legal_moves` according to `difficulty`.
///
/// Checking moves are found by applying each candidate to a scratch copy
/// of `position`; the caller's position is never touched.
#[instrument(skip(oracle, position, legal_moves, rng), fields(candidates = legal_moves.len()))]
pub fn select_move<R, G>(
    oracle: &R,
    position: &R::Position,
    legal_moves: &[R::Move],
    difficulty: Difficulty,
    rng: &mut G,
) -> Result<R::Move, HeuristicError>
where
    R: RulesOracle,
    G: Rng + ?Sized,
{
    if legal_moves.is_empty() {
        return Err(HeuristicError::NoLegalMoves);
    }

    let captures = || -> Vec<R::Move> {
        legal_moves
            .iter()
            .filter(|mv| oracle.is_capture(position, mv))
            .cloned()
            .collect()
    };

    let pool: Vec<R::Move> = match difficulty {
        Difficulty::Easy => Vec::new(),
        Difficulty::Medium => captures(),
        Difficulty::Hard => {
            let checks: Vec<R::Move> = legal_moves
                .iter()
                .filter(|mv| gives_check(oracle, position, mv))
                .cloned()
                .collect();
            debug!(checks = checks.len(), "Checking moves found");
            if checks.is_empty() { captures() } else { checks }
        }
    };

    let candidates: &[R::Move] = if pool.is_empty() { legal_moves } else { &pool };
    debug!(pool = candidates.len(), "Choosing from pool");
    candidates
        .choose(rng)
        .cloned()
        .ok_or(HeuristicError::NoLegalMoves)
}

fn gives_check<R: RulesOracle>(oracle: &R, position: &R::Position, mv: &R::Move) -> bool {
    oracle
        .apply_move(position, mv)
        .map(|scratch| oracle.is_check(&scratch))
        .unwrap_or(false)
}
