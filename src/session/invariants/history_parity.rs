//! Move history length agrees with the oracle's side to move.

use super::Invariant;
use crate::games::chess::RulesOracle;
use crate::session::SessionController;

/// Invariant: the side implied by history parity is the side the oracle
/// reports to move.
pub struct HistoryParity;

impl<R: RulesOracle> Invariant<SessionController<R>> for HistoryParity {
    fn holds(session: &SessionController<R>) -> bool {
        session.history().side_to_move() == session.side_to_move()
    }

    fn description() -> &'static str {
        "History parity matches the side to move"
    }
}
