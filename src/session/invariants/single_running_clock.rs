//! At most one clock runs.

use super::Invariant;
use crate::games::chess::RulesOracle;
use crate::session::SessionController;

/// Invariant: never both clocks counting down at once.
pub struct SingleRunningClock;

impl<R: RulesOracle> Invariant<SessionController<R>> for SingleRunningClock {
    fn holds(session: &SessionController<R>) -> bool {
        session.clocks().running_count() <= 1
    }

    fn description() -> &'static str {
        "At most one clock is running"
    }
}
