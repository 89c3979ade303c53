//! First-class invariants for a chess session.
//!
//! Invariants are logical properties that must hold after every controller
//! transition. Debug builds check them and turn a violation into a fatal
//! [`SessionError::InvariantViolation`](super::SessionError::InvariantViolation).

mod clocks_idle;
mod history_parity;
mod single_running_clock;

pub use clocks_idle::ClocksIdleUnlessActive;
pub use history_parity::HistoryParity;
pub use single_running_clock::SingleRunningClock;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let violations: Vec<InvariantViolation> = [
            (I1::holds(state), I1::description()),
            (I2::holds(state), I2::description()),
            (I3::holds(state), I3::description()),
        ]
        .into_iter()
        .filter(|(holds, _)| !holds)
        .map(|(_, description)| InvariantViolation::new(description))
        .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// All session invariants as a composable set.
pub type SessionInvariants = (SingleRunningClock, ClocksIdleUnlessActive, HistoryParity);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::chess::{MatchConfig, MoveRequest, StandardRules, TimeControl};
    use crate::session::SessionController;

    #[test]
    fn test_invariant_set_holds_through_a_match() {
        let mut session = SessionController::new(
            StandardRules::new(),
            MatchConfig::human_vs_human(TimeControl::Limited(60)),
        );
        assert!(SessionInvariants::check_all(&session).is_ok());
        session.start_new_match(None).unwrap();
        for text in ["e2e4", "e7e5", "g1f3"] {
            let request: MoveRequest = text.parse().unwrap();
            session.submit_move(&request).unwrap();
            assert!(SessionInvariants::check_all(&session).is_ok());
        }
        session.pause().unwrap();
        assert!(SessionInvariants::check_all(&session).is_ok());
        session.agree_draw().unwrap();
        assert!(SessionInvariants::check_all(&session).is_ok());
    }
}
