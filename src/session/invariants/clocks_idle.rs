//! Clocks only run during active play with a finite time control.

use super::Invariant;
use crate::games::chess::RulesOracle;
use crate::session::{MatchPhase, SessionController};

/// Invariant: no clock runs unless the match is active and timed.
///
/// While active and timed, exactly the side to move's clock runs.
pub struct ClocksIdleUnlessActive;

impl<R: RulesOracle> Invariant<SessionController<R>> for ClocksIdleUnlessActive {
    fn holds(session: &SessionController<R>) -> bool {
        let clocks = session.clocks();
        let timed = !session.match_config().time_control.is_unlimited();
        if session.phase() == MatchPhase::Active && timed {
            // A flagged clock cannot restart, so a side at zero may leave
            // both stopped for the instant before expiry is processed.
            let to_move = session.side_to_move();
            clocks.running_side() == Some(to_move)
                || session.clock(to_move).seconds() == Some(0)
        } else {
            clocks.running_count() == 0
        }
    }

    fn description() -> &'static str {
        "Only the side to move's clock runs, and only while the match is active"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::chess::{MatchConfig, StandardRules, TimeControl};

    #[test]
    fn test_pause_stops_everything() {
        let mut session = SessionController::new(
            StandardRules::new(),
            MatchConfig::human_vs_human(TimeControl::Limited(30)),
        );
        assert!(ClocksIdleUnlessActive::holds(&session));
        session.start_new_match(None).unwrap();
        assert!(ClocksIdleUnlessActive::holds(&session));
        session.pause().unwrap();
        assert!(ClocksIdleUnlessActive::holds(&session));
        assert_eq!(session.clocks().running_count(), 0);
        session.resume().unwrap();
        assert!(ClocksIdleUnlessActive::holds(&session));
    }

    #[test]
    fn test_unlimited_holds_with_nothing_running() {
        let mut session =
            SessionController::new(StandardRules::new(), MatchConfig::human_vs_human(TimeControl::Unlimited));
        session.start_new_match(None).unwrap();
        assert!(ClocksIdleUnlessActive::holds(&session));
        assert_eq!(session.clocks().running_count(), 0);
    }
}
