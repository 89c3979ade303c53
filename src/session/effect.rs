//! Side effects and notifications produced by controller transitions.

use crate::games::chess::{GameOutcome, MatchConfig, Side};
use serde::Serialize;
use std::time::Duration;

/// Messages sent from the session to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SessionEvent {
    /// A new match began.
    MatchStarted {
        /// Generation of the new match.
        generation: u64,
        /// Its configuration.
        config: MatchConfig,
    },
    /// A move was accepted.
    MoveMade {
        /// Who moved.
        side: Side,
        /// Standard algebraic notation.
        notation: String,
        /// Position after the move.
        fen: String,
    },
    /// The active clock was halted.
    Paused,
    /// Play continues.
    Resumed,
    /// The match ended. Sent exactly once per match.
    MatchEnded {
        /// Final outcome.
        outcome: GameOutcome,
    },
    /// Configuration for the next match changed.
    ConfigChanged {
        /// The new configuration.
        config: MatchConfig,
    },
}

/// Work requested by a state transition.
///
/// Clock effects have already been applied to the controller's clocks when
/// they are returned, so they are informational for the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// `side`'s clock began counting down.
    StartClock(Side),
    /// `side`'s clock stopped.
    StopClock(Side),
    /// Invoke the heuristic for the computer after `delay`.
    ScheduleComputerMove {
        /// Match the request belongs to.
        generation: u64,
        /// History length the move is meant for.
        ply: usize,
        /// Simulated thinking time.
        delay: Duration,
    },
    /// Drop any pending computer move.
    CancelComputerMove,
    /// Tell observers.
    Notify(SessionEvent),
}
