//! Strictly Chess library - a chess session controller
//!
//! Orchestrates a two-player (or player-vs-computer) chess match: turn
//! taking, two countdown clocks, legality via a rules oracle, and a single
//! authoritative outcome that is decided exactly once.
//!
//! # Architecture
//!
//! - **Rules oracle**: [`RulesOracle`] trait, with [`StandardRules`] backed by `shakmaty`
//! - **Clocks**: [`ClockPair`], a dumb dual countdown timer
//! - **Heuristic**: [`select_move`], the weak computer opponent
//! - **Controller**: [`SessionController`], the state machine returning [`Effect`]s
//! - **Runtime**: [`spawn_session`], one tokio task serialising input, ticks and computer moves
//! - **Console**: [`run_console`], the line-based input adapter
//!
//! # Example
//!
//! ```no_run
//! use strictly_chess::{MatchConfig, MoveRequest, SessionController, StandardRules, TimeControl};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = SessionController::new(
//!     StandardRules::new(),
//!     MatchConfig::human_vs_human(TimeControl::Limited(180)),
//! );
//! session.start_new_match(None)?;
//! session.submit_move(&"e2e4".parse::<MoveRequest>()?)?;
//! assert_eq!(session.history().len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod clock;
mod config;
mod console;
mod games;
mod heuristic;
mod session;

// Crate-level exports - Chess domain
pub use games::chess::{
    Difficulty, FenError, GameMode, GameOutcome, IllegalMove, MatchConfig, MoveHistory, MovePair,
    MoveRecord, MoveRequest, ParseMoveError, ParseTimeControlError, Promotion, RulesOracle, Side,
    StandardPosition, StandardRules, TerminalCause, TerminationCause, TimeControl,
    TimeControlPreset, Winner,
};

// Crate-level exports - Clocks
pub use clock::{Clock, ClockPair, ClockState, Remaining};

// Crate-level exports - Computer opponent
pub use heuristic::{HeuristicError, select_move};

// Crate-level exports - Session
pub use session::invariants;
pub use session::{
    DEFAULT_THINK_DELAY, Effect, MatchPhase, SessionCommand, SessionController, SessionError,
    SessionEvent, SessionHandle, SessionSnapshot, spawn_session,
};

// Crate-level exports - Configuration
pub use config::{CONFIG_ENV_VAR, ConfigError, SessionSettings};

// Crate-level exports - Console
pub use console::{
    CommandSource, ConsoleCommand, HELP, ScriptedSource, StdinSource, UnknownCommand, run_console,
};
