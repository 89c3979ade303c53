//! The task that owns a controller.
//!
//! Input commands, the computer's thinking delay and the running clock's
//! next whole second are the only wake-ups. A single task serialises them
//! with a biased `select!`. Every wake-up first charges the time elapsed
//! since the previous one to the running clock; a clock that reaches zero
//! is only flagged after any move that arrived in the same instant, so a
//! move that ends the game beats a flag falling at the same time.

use super::controller::{SessionController, SessionSnapshot};
use super::effect::{Effect, SessionEvent};
use super::error::SessionError;
use crate::games::chess::{MatchConfig, MoveRequest, RulesOracle, Side};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, instrument};

type Reply = oneshot::Sender<Result<(), SessionError>>;

/// Requests accepted by the session task.
#[derive(Debug)]
pub enum SessionCommand {
    /// Play a human move.
    SubmitMove {
        /// The move.
        request: MoveRequest,
        /// Acceptance or rejection.
        reply: Reply,
    },
    /// Start a fresh match, optionally with a new configuration.
    StartNewMatch {
        /// Replacement configuration.
        config: Option<MatchConfig>,
        /// Completion.
        reply: Reply,
    },
    /// Replace the configuration used by the next match.
    SetConfig {
        /// New configuration.
        config: MatchConfig,
        /// Completion.
        reply: Reply,
    },
    /// Halt the clocks.
    Pause {
        /// Completion.
        reply: Reply,
    },
    /// Continue after a pause.
    Resume {
        /// Completion.
        reply: Reply,
    },
    /// End the match as a draw by agreement.
    AgreeDraw {
        /// Completion.
        reply: Reply,
    },
    /// Read the observable state.
    Snapshot {
        /// The snapshot.
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Stop the task.
    Shutdown,
}

/// Cloneable handle for talking to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    async fn request(
        &self,
        build: impl FnOnce(Reply) -> SessionCommand,
    ) -> Result<(), SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .map_err(|_| SessionError::SessionClosed)?;
        response.await.map_err(|_| SessionError::SessionClosed)?
    }

    /// Submits a human move.
    #[instrument(skip(self, request), fields(request = %request))]
    pub async fn submit_move(&self, request: MoveRequest) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::SubmitMove { request, reply })
            .await
    }

    /// Starts a new match.
    #[instrument(skip(self))]
    pub async fn start_new_match(&self, config: Option<MatchConfig>) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::StartNewMatch { config, reply })
            .await
    }

    /// Replaces the configuration for the next match.
    #[instrument(skip(self))]
    pub async fn set_config(&self, config: MatchConfig) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::SetConfig { config, reply })
            .await
    }

    /// Pauses the match.
    pub async fn pause(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Pause { reply }).await
    }

    /// Resumes the match.
    pub async fn resume(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Resume { reply }).await
    }

    /// Agrees a draw.
    pub async fn agree_draw(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::AgreeDraw { reply })
            .await
    }

    /// Reads the current state.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(SessionCommand::Snapshot { reply })
            .map_err(|_| SessionError::SessionClosed)?;
        response.await.map_err(|_| SessionError::SessionClosed)
    }

    /// Asks the task to stop.
    pub fn shutdown(&self) {
        if self.commands.send(SessionCommand::Shutdown).is_err() {
            debug!("Session already closed");
        }
    }
}

/// A computer move waiting for its thinking delay.
#[derive(Debug, Clone, Copy)]
struct PendingMove {
    generation: u64,
    ply: usize,
    due: Instant,
}

/// A clock that reached zero, waiting to be delivered.
#[derive(Debug, Clone, Copy)]
struct Flag {
    side: Side,
    generation: u64,
}

struct SessionTask<R: RulesOracle> {
    controller: SessionController<R>,
    events: mpsc::UnboundedSender<SessionEvent>,
    pending: Option<PendingMove>,
    /// When the running clock next loses a second.
    next_second: Option<Instant>,
    /// Time up to which the running clock has been charged.
    charged_at: Instant,
}

/// Moves `controller` onto its own task.
///
/// Returns a handle for commands, the stream of session events, and the
/// task's join handle. The task ends on [`SessionHandle::shutdown`], when
/// every handle is dropped, or with the first fatal error.
#[instrument(skip(controller))]
pub fn spawn_session<R: RulesOracle>(
    controller: SessionController<R>,
) -> (
    SessionHandle,
    mpsc::UnboundedReceiver<SessionEvent>,
    JoinHandle<Result<(), SessionError>>,
) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let mut task = SessionTask {
        controller,
        events: event_tx,
        pending: None,
        next_second: None,
        charged_at: Instant::now(),
    };
    task.rearm();
    info!("Spawning session task");
    let join = tokio::spawn(task.run(command_rx));

    (
        SessionHandle {
            commands: command_tx,
        },
        event_rx,
        join,
    )
}

impl<R: RulesOracle> SessionTask<R> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    ) -> Result<(), SessionError> {
        loop {
            let due = self.pending.map(|pending| pending.due);
            let next_second = self.next_second;
            tokio::select! {
                biased;

                command = commands.recv() => {
                    let Some(command) = command else {
                        info!("All session handles dropped");
                        return Ok(());
                    };
                    if !self.handle_command(command)? {
                        info!("Session shut down");
                        return Ok(());
                    }
                }

                _ = sleep_until(due.unwrap_or_else(Instant::now)), if due.is_some() => {
                    let flag = self.charge();
                    if let Some(pending) = self.pending.take() {
                        let result = self
                            .controller
                            .on_computer_move_due(pending.generation, pending.ply);
                        if let Err(e) = self.settle(result)? {
                            debug!(error = %e, "Computer move rejected");
                        }
                    }
                    self.deliver(flag)?;
                }

                _ = sleep_until(next_second.unwrap_or_else(Instant::now)), if next_second.is_some() => {
                    // Let a move made in this same instant land before the flag.
                    tokio::task::yield_now().await;
                    while let Ok(command) = commands.try_recv() {
                        if !self.handle_command(command)? {
                            info!("Session shut down");
                            return Ok(());
                        }
                    }
                    let flag = self.charge();
                    self.deliver(flag)?;
                }
            }
            self.rearm();
        }
    }

    /// Runs one command. Returns false on shutdown.
    fn handle_command(&mut self, command: SessionCommand) -> Result<bool, SessionError> {
        let flag = self.charge();
        let (result, reply) = match command {
            SessionCommand::Shutdown => return Ok(false),
            SessionCommand::Snapshot { reply } => {
                self.deliver(flag)?;
                if reply.send(self.controller.snapshot()).is_err() {
                    debug!("Snapshot requester went away");
                }
                return Ok(true);
            }
            SessionCommand::SubmitMove { request, reply } => {
                (self.controller.submit_move(&request), reply)
            }
            SessionCommand::StartNewMatch { config, reply } => {
                (self.controller.start_new_match(config), reply)
            }
            SessionCommand::SetConfig { config, reply } => {
                (self.controller.set_config(config), reply)
            }
            SessionCommand::Pause { reply } => (self.controller.pause(), reply),
            SessionCommand::Resume { reply } => (self.controller.resume(), reply),
            SessionCommand::AgreeDraw { reply } => (self.controller.agree_draw(), reply),
        };

        match self.settle(result) {
            Ok(answer) => {
                if reply.send(answer).is_err() {
                    debug!("Command requester went away");
                }
                self.deliver(flag)?;
                Ok(true)
            }
            Err(fatal) => {
                if reply.send(Err(fatal.clone())).is_err() {
                    debug!("Command requester went away");
                }
                Err(fatal)
            }
        }
    }

    /// Charges the time since the last wake-up to the running clock.
    fn charge(&mut self) -> Option<Flag> {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.charged_at);
        self.charged_at = now;
        self.controller.charge_time(elapsed).map(|side| Flag {
            side,
            generation: self.controller.generation(),
        })
    }

    /// Ends the match on time unless it ended or was replaced meanwhile.
    fn deliver(&mut self, flag: Option<Flag>) -> Result<(), SessionError> {
        let Some(flag) = flag else {
            return Ok(());
        };
        if flag.generation != self.controller.generation() {
            debug!(side = %flag.side, "Dropping flag from a previous match");
            return Ok(());
        }
        let result = self.controller.on_clock_expired(flag.side);
        if let Err(e) = self.settle(result)? {
            debug!(error = %e, "Clock expiry rejected");
        }
        Ok(())
    }

    /// Schedules the next wake-up for the running clock.
    fn rearm(&mut self) {
        self.next_second = self
            .controller
            .clocks()
            .until_next_second()
            .map(|left| self.charged_at + left);
    }

    /// Carries out effects. Recoverable errors come back in the inner
    /// result; fatal ones in the outer.
    fn settle(
        &mut self,
        result: Result<Vec<Effect>, SessionError>,
    ) -> Result<Result<(), SessionError>, SessionError> {
        match result {
            Ok(effects) => {
                self.apply(effects);
                Ok(Ok(()))
            }
            Err(e) if e.is_fatal() => {
                error!(error = %e, "Fatal session error");
                Err(e)
            }
            Err(e) => Ok(Err(e)),
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartClock(side) => debug!(%side, "Clock started"),
                Effect::StopClock(side) => debug!(%side, "Clock stopped"),
                Effect::ScheduleComputerMove {
                    generation,
                    ply,
                    delay,
                } => {
                    self.pending = Some(PendingMove {
                        generation,
                        ply,
                        due: Instant::now() + delay,
                    });
                }
                Effect::CancelComputerMove => {
                    if self.pending.take().is_some() {
                        debug!("Pending computer move cancelled");
                    }
                }
                Effect::Notify(event) => {
                    if self.events.send(event).is_err() {
                        debug!("No event listener");
                    }
                }
            }
        }
    }
}
