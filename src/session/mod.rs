//! Session orchestration: the controller state machine and the task that
//! drives it.

mod controller;
mod effect;
mod error;
pub mod invariants;
mod runtime;

pub use controller::{DEFAULT_THINK_DELAY, MatchPhase, SessionController, SessionSnapshot};
pub use effect::{Effect, SessionEvent};
pub use error::SessionError;
pub use runtime::{SessionCommand, SessionHandle, spawn_session};
