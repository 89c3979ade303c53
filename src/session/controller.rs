//! The session state machine.
//!
//! One controller owns one rules oracle, the authoritative position, the
//! move history, both clocks and the outcome. Every transition runs to
//! completion and returns the effects the runtime must carry out.

use super::effect::{Effect, SessionEvent};
use super::error::SessionError;
use crate::clock::{ClockPair, ClockState};
use crate::games::chess::{
    GameOutcome, MatchConfig, MoveHistory, MoveRecord, MoveRequest, RulesOracle, Side,
    TerminalCause, TerminationCause, Winner,
};
use crate::heuristic::{HeuristicError, select_move};
use derive_getters::Getters;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Default simulated thinking time for the computer.
pub const DEFAULT_THINK_DELAY: Duration = Duration::from_millis(800);

/// Match lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchPhase {
    /// Constructed; no match started yet.
    Idle,
    /// Moves are accepted and the side to move's clock runs.
    Active,
    /// Clocks halted, match not over.
    Paused,
    /// Outcome is final until the next match.
    Terminated,
}

/// Read-only bundle of everything observers may look at.
#[derive(Debug, Clone, Serialize, Getters)]
pub struct SessionSnapshot {
    /// Match instance.
    generation: u64,
    /// Lifecycle phase.
    phase: MatchPhase,
    /// Configuration of the current match.
    config: MatchConfig,
    /// Position in FEN.
    fen: String,
    /// Moves played.
    history: Vec<MoveRecord>,
    /// White's clock.
    white_clock: ClockState,
    /// Black's clock.
    black_clock: ClockState,
    /// Authoritative outcome.
    outcome: GameOutcome,
    /// Status banner text.
    status: String,
}

/// Orchestrates one chess session.
pub struct SessionController<R: RulesOracle> {
    oracle: R,
    config: MatchConfig,
    match_config: MatchConfig,
    position: R::Position,
    history: MoveHistory,
    outcome: GameOutcome,
    phase: MatchPhase,
    clocks: ClockPair,
    generation: u64,
    think_delay: Duration,
    rng: StdRng,
}

impl<R: RulesOracle> std::fmt::Debug for SessionController<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("generation", &self.generation)
            .field("phase", &self.phase)
            .field("plies", &self.history.len())
            .field("outcome", &self.outcome)
            .finish()
    }
}

impl<R: RulesOracle> SessionController<R> {
    /// Creates an idle controller. Call [`Self::start_new_match`] to play.
    #[instrument(skip(oracle))]
    pub fn new(oracle: R, config: MatchConfig) -> Self {
        info!("Creating SessionController");
        let position = oracle.initial_position();
        let history = MoveHistory::starting_with(oracle.side_to_move(&position));
        let outcome = GameOutcome::InProgress {
            side_to_move: oracle.side_to_move(&position),
            in_check: oracle.is_check(&position),
        };
        Self {
            oracle,
            config,
            match_config: config,
            position,
            history,
            outcome,
            phase: MatchPhase::Idle,
            clocks: ClockPair::new(config.time_control),
            generation: 0,
            think_delay: DEFAULT_THINK_DELAY,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Makes the computer's random choices reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Overrides the computer's thinking delay.
    pub fn with_think_delay(mut self, delay: Duration) -> Self {
        self.think_delay = delay;
        self
    }

    // ─────────────────────────────────────────────────────────────
    //  Observers
    // ─────────────────────────────────────────────────────────────

    /// Board notation of the current position.
    pub fn display_string(&self) -> String {
        self.oracle.to_display_string(&self.position)
    }

    /// Moves played this match.
    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    /// State of `side`'s clock.
    pub fn clock(&self, side: Side) -> ClockState {
        self.clocks.state(side)
    }

    /// Both clocks.
    pub fn clocks(&self) -> &ClockPair {
        &self.clocks
    }

    /// Authoritative outcome.
    pub fn outcome(&self) -> GameOutcome {
        self.outcome
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Configuration the next match will use.
    pub fn config(&self) -> MatchConfig {
        self.config
    }

    /// Configuration of the current match.
    pub fn match_config(&self) -> MatchConfig {
        self.match_config
    }

    /// Current match instance. Bumped by every new match.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The rules oracle.
    pub fn oracle(&self) -> &R {
        &self.oracle
    }

    /// The authoritative position.
    pub fn position(&self) -> &R::Position {
        &self.position
    }

    /// Whose move it is according to the oracle.
    pub fn side_to_move(&self) -> Side {
        self.oracle.side_to_move(&self.position)
    }

    /// Everything observers may read, in one value.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            generation: self.generation,
            phase: self.phase,
            config: self.match_config,
            fen: self.display_string(),
            history: self.history.records().to_vec(),
            white_clock: self.clock(Side::White),
            black_clock: self.clock(Side::Black),
            outcome: self.outcome,
            status: self.outcome.to_string(),
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Transitions
    // ─────────────────────────────────────────────────────────────

    /// Replaces the configuration used by the next match.
    ///
    /// A running match keeps the configuration it started with.
    #[instrument(skip(self))]
    pub fn set_config(&mut self, config: MatchConfig) -> Result<Vec<Effect>, SessionError> {
        info!(phase = %self.phase, "Configuration replaced");
        self.config = config;
        Ok(vec![Effect::Notify(SessionEvent::ConfigChanged { config })])
    }

    /// Discards the current match and starts a fresh one.
    #[instrument(skip(self), fields(generation = self.generation + 1))]
    pub fn start_new_match(
        &mut self,
        config: Option<MatchConfig>,
    ) -> Result<Vec<Effect>, SessionError> {
        if let Some(config) = config {
            self.config = config;
        }
        self.generation += 1;
        self.match_config = self.config;
        self.position = self.oracle.initial_position();
        let first = self.side_to_move();
        self.history.reset(first);
        self.clocks.reset_all(self.match_config.time_control);
        self.phase = MatchPhase::Active;
        self.outcome = self.in_progress_outcome();

        info!(
            generation = self.generation,
            mode = %self.match_config.mode,
            time_control = %self.match_config.time_control,
            "Match started"
        );

        let mut effects = vec![
            Effect::CancelComputerMove,
            Effect::Notify(SessionEvent::MatchStarted {
                generation: self.generation,
                config: self.match_config,
            }),
        ];

        // A custom start position can already be over.
        if let Some(cause) = self.oracle.terminal_cause(&self.position) {
            let winner = winner_for(cause, first.opposite());
            self.terminate(winner, cause.into(), &mut effects);
        } else {
            self.start_turn(first, &mut effects);
        }

        self.verify()?;
        Ok(effects)
    }

    /// Applies a human move.
    #[instrument(skip(self, request), fields(request = %request, generation = self.generation))]
    pub fn submit_move(&mut self, request: &MoveRequest) -> Result<Vec<Effect>, SessionError> {
        match self.phase {
            MatchPhase::Active => {}
            MatchPhase::Idle => {
                warn!("Move before any match started");
                return Err(SessionError::MatchNotStarted);
            }
            MatchPhase::Paused => {
                warn!("Move rejected while paused");
                return Err(SessionError::MatchPaused);
            }
            MatchPhase::Terminated => {
                warn!("Move rejected, match already over");
                return Err(SessionError::MatchAlreadyOver);
            }
        }

        let side = self.side_to_move();
        if self.match_config.is_computer(side) {
            warn!(%side, "Human move on the computer's turn");
            return Err(SessionError::ComputerToMove);
        }

        let mv = self
            .oracle
            .resolve_move(&self.position, request)
            .inspect_err(|e| warn!(error = %e, "Illegal move rejected"))?;
        self.commit_move(mv)
    }

    /// Ends the match on time. Ignored once the match is over.
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn on_clock_expired(&mut self, side: Side) -> Result<Vec<Effect>, SessionError> {
        if matches!(self.phase, MatchPhase::Idle | MatchPhase::Terminated) {
            debug!(phase = %self.phase, "Ignoring clock expiry");
            return Ok(Vec::new());
        }
        info!(%side, "Flag fell");
        self.clocks.stop(side);
        let mut effects = Vec::new();
        self.terminate(side.opposite().into(), TerminationCause::Timeout, &mut effects);
        self.verify()?;
        Ok(effects)
    }

    /// One elapsed second, tagged with the match it was armed for.
    #[instrument(level = "trace", skip(self))]
    pub fn on_tick(&mut self, generation: u64) -> Result<Vec<Effect>, SessionError> {
        if generation != self.generation || self.phase != MatchPhase::Active {
            debug!(
                current = self.generation,
                phase = %self.phase,
                "Discarding stale tick"
            );
            return Ok(Vec::new());
        }
        match self.clocks.tick() {
            Some(side) => self.on_clock_expired(side),
            None => Ok(Vec::new()),
        }
    }

    /// Charges `elapsed` running time to the side whose clock runs.
    ///
    /// Returns the side whose clock reached zero without ending the match.
    /// The caller delivers that through [`Self::on_clock_expired`] after any
    /// move that arrived in the same instant, so a finishing move wins.
    #[instrument(level = "trace", skip(self))]
    pub fn charge_time(&mut self, elapsed: Duration) -> Option<Side> {
        if self.phase != MatchPhase::Active {
            return None;
        }
        let flagged = self.clocks.advance(elapsed);
        if let Some(side) = flagged {
            debug!(%side, "Clock reached zero");
        }
        flagged
    }

    /// Plays the computer's move once its thinking delay has elapsed.
    #[instrument(skip(self))]
    pub fn on_computer_move_due(
        &mut self,
        generation: u64,
        ply: usize,
    ) -> Result<Vec<Effect>, SessionError> {
        if generation != self.generation
            || ply != self.history.len()
            || self.phase != MatchPhase::Active
        {
            debug!(
                current = self.generation,
                plies = self.history.len(),
                phase = %self.phase,
                "Discarding stale computer move"
            );
            return Ok(Vec::new());
        }

        let side = self.side_to_move();
        if !self.match_config.is_computer(side) {
            debug!(%side, "Computer move due on a human turn");
            return Ok(Vec::new());
        }

        let legal = self.oracle.legal_moves(&self.position);
        match select_move(
            &self.oracle,
            &self.position,
            &legal,
            self.match_config.difficulty,
            &mut self.rng,
        ) {
            Ok(mv) => self.commit_move(mv),
            Err(HeuristicError::NoLegalMoves) => {
                if let Some(cause) = self.oracle.terminal_cause(&self.position) {
                    warn!(%cause, "Computer had no move; position was terminal");
                    let mut effects = Vec::new();
                    self.terminate(winner_for(cause, side.opposite()), cause.into(), &mut effects);
                    self.verify()?;
                    return Ok(effects);
                }
                error!(%side, "Computer found no move in a live position");
                Err(SessionError::HeuristicFoundNoMove { side })
            }
        }
    }

    /// Halts the running clock without ending the match.
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn pause(&mut self) -> Result<Vec<Effect>, SessionError> {
        match self.phase {
            MatchPhase::Active => {}
            MatchPhase::Paused => return Ok(Vec::new()),
            MatchPhase::Idle => return Err(SessionError::MatchNotStarted),
            MatchPhase::Terminated => return Err(SessionError::MatchAlreadyOver),
        }
        let mut effects = vec![Effect::CancelComputerMove];
        self.stop_clocks(&mut effects);
        self.phase = MatchPhase::Paused;
        effects.push(Effect::Notify(SessionEvent::Paused));
        info!("Match paused");
        self.verify()?;
        Ok(effects)
    }

    /// Restarts the side to move's clock and any pending computer move.
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn resume(&mut self) -> Result<Vec<Effect>, SessionError> {
        match self.phase {
            MatchPhase::Paused => {}
            MatchPhase::Active => return Ok(Vec::new()),
            MatchPhase::Idle => return Err(SessionError::MatchNotStarted),
            MatchPhase::Terminated => return Err(SessionError::MatchAlreadyOver),
        }
        self.phase = MatchPhase::Active;
        let mut effects = vec![Effect::Notify(SessionEvent::Resumed)];
        self.start_turn(self.side_to_move(), &mut effects);
        info!("Match resumed");
        self.verify()?;
        Ok(effects)
    }

    /// Ends the match as a draw by agreement.
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn agree_draw(&mut self) -> Result<Vec<Effect>, SessionError> {
        match self.phase {
            MatchPhase::Active | MatchPhase::Paused => {}
            MatchPhase::Idle => return Err(SessionError::MatchNotStarted),
            MatchPhase::Terminated => return Err(SessionError::MatchAlreadyOver),
        }
        let mut effects = Vec::new();
        self.terminate(Winner::Draw, TerminationCause::Agreement, &mut effects);
        self.verify()?;
        Ok(effects)
    }

    // ─────────────────────────────────────────────────────────────
    //  Internals
    // ─────────────────────────────────────────────────────────────

    /// Applies an already-resolved legal move and classifies the result.
    fn commit_move(&mut self, mv: R::Move) -> Result<Vec<Effect>, SessionError> {
        let side = self.side_to_move();
        let notation = self.oracle.notation(&self.position, &mv);
        let next = self.oracle.apply_move(&self.position, &mv).map_err(|e| {
            error!(error = %e, "Oracle rejected a move it resolved");
            SessionError::Oracle(e.to_string())
        })?;
        self.position = next;
        self.history.push(MoveRecord::new(side, notation.clone()));
        info!(%side, %notation, ply = self.history.len(), "Move accepted");

        let mut effects = vec![Effect::Notify(SessionEvent::MoveMade {
            side,
            notation,
            fen: self.display_string(),
        })];

        if let Some(cause) = self.oracle.terminal_cause(&self.position) {
            self.terminate(winner_for(cause, side), cause.into(), &mut effects);
        } else {
            self.outcome = self.in_progress_outcome();
            self.start_turn(side.opposite(), &mut effects);
        }

        self.verify()?;
        Ok(effects)
    }

    /// Hands the turn to `side`: only its clock runs, and the computer is
    /// scheduled if it plays `side`.
    fn start_turn(&mut self, side: Side, effects: &mut Vec<Effect>) {
        if self.clocks.state(side.opposite()).running {
            self.clocks.stop(side.opposite());
            effects.push(Effect::StopClock(side.opposite()));
        }
        if self.clocks.start(side) {
            effects.push(Effect::StartClock(side));
        }
        if self.match_config.is_computer(side) {
            debug!(%side, delay_ms = self.think_delay.as_millis() as u64, "Scheduling computer move");
            effects.push(Effect::ScheduleComputerMove {
                generation: self.generation,
                ply: self.history.len(),
                delay: self.think_delay,
            });
        }
    }

    fn stop_clocks(&mut self, effects: &mut Vec<Effect>) {
        for side in [Side::White, Side::Black] {
            if self.clocks.state(side).running {
                self.clocks.stop(side);
                effects.push(Effect::StopClock(side));
            }
        }
    }

    /// Freezes the outcome. A second call is a no-op.
    fn terminate(&mut self, winner: Winner, cause: TerminationCause, effects: &mut Vec<Effect>) {
        if self.phase == MatchPhase::Terminated {
            debug!(%cause, "Match already terminated");
            return;
        }
        self.stop_clocks(effects);
        self.phase = MatchPhase::Terminated;
        self.outcome = GameOutcome::Terminated { winner, cause };
        info!(%winner, %cause, generation = self.generation, "Match ended");
        effects.push(Effect::CancelComputerMove);
        effects.push(Effect::Notify(SessionEvent::MatchEnded {
            outcome: self.outcome,
        }));
    }

    fn in_progress_outcome(&self) -> GameOutcome {
        GameOutcome::InProgress {
            side_to_move: self.side_to_move(),
            in_check: self.oracle.is_check(&self.position),
        }
    }

    #[cfg(debug_assertions)]
    fn verify(&self) -> Result<(), SessionError> {
        use super::invariants::{InvariantSet, SessionInvariants};
        SessionInvariants::check_all(self).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            error!(%descriptions, "Session invariant violated");
            SessionError::InvariantViolation(descriptions)
        })
    }

    #[cfg(not(debug_assertions))]
    fn verify(&self) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Checkmate goes to the side that delivered it; everything else is a draw.
fn winner_for(cause: TerminalCause, mover: Side) -> Winner {
    match cause {
        TerminalCause::Checkmate => mover.into(),
        _ => Winner::Draw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::chess::{StandardRules, TimeControl};

    fn controller(config: MatchConfig) -> SessionController<StandardRules> {
        SessionController::new(StandardRules::new(), config).with_seed(11)
    }

    #[test]
    fn test_idle_until_started() {
        let mut session = controller(MatchConfig::default());
        assert_eq!(session.phase(), MatchPhase::Idle);
        assert_eq!(session.clocks().running_count(), 0);
        let request: MoveRequest = "e2e4".parse().unwrap();
        assert_eq!(
            session.submit_move(&request),
            Err(SessionError::MatchNotStarted)
        );
    }

    #[test]
    fn test_start_runs_white_clock_only() {
        let mut session = controller(MatchConfig::human_vs_human(TimeControl::Limited(180)));
        let effects = session.start_new_match(None).unwrap();
        assert!(effects.contains(&Effect::StartClock(Side::White)));
        assert_eq!(session.generation(), 1);
        assert_eq!(session.clocks().running_side(), Some(Side::White));
        assert_eq!(session.outcome(), GameOutcome::initial());
    }

    #[test]
    fn test_unlimited_never_starts_a_clock() {
        let mut session = controller(MatchConfig::human_vs_human(TimeControl::Unlimited));
        let effects = session.start_new_match(None).unwrap();
        assert!(!effects.iter().any(|e| matches!(e, Effect::StartClock(_))));
        let request: MoveRequest = "e2e4".parse().unwrap();
        session.submit_move(&request).unwrap();
        assert_eq!(session.clocks().running_count(), 0);
    }

    #[test]
    fn test_computer_as_white_is_scheduled_at_start() {
        let config = MatchConfig::default()
            .with_mode(crate::games::chess::GameMode::HumanVsComputer)
            .with_computer_side(Side::White);
        let mut session = controller(config);
        let effects = session.start_new_match(None).unwrap();
        assert!(effects.contains(&Effect::ScheduleComputerMove {
            generation: 1,
            ply: 0,
            delay: DEFAULT_THINK_DELAY,
        }));
        let request: MoveRequest = "e2e4".parse().unwrap();
        assert_eq!(
            session.submit_move(&request),
            Err(SessionError::ComputerToMove)
        );
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut session = controller(MatchConfig::default());
        session.start_new_match(None).unwrap();
        let json = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(json["phase"], "active");
        assert_eq!(json["status"], "White to move");
        assert_eq!(json["outcome"]["state"], "in-progress");
    }
}
