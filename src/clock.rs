//! Dual countdown clocks.
//!
//! The pair is a dumb timer: it counts whole seconds for whichever side is
//! running and reports expiry once. Deciding which side runs is the session
//! controller's job.

use crate::games::chess::{Side, TimeControl};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const SECOND: Duration = Duration::from_secs(1);

/// Time left on one clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Remaining {
    /// Whole seconds left, never below zero.
    Seconds(u32),
    /// The clock never runs.
    Unlimited,
}

impl From<TimeControl> for Remaining {
    fn from(time_control: TimeControl) -> Self {
        match time_control {
            TimeControl::Limited(secs) => Remaining::Seconds(secs),
            TimeControl::Unlimited => Remaining::Unlimited,
        }
    }
}

/// One side's countdown timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    remaining: Remaining,
    running: bool,
    expired: bool,
    /// Running time not yet charged as a whole second. Survives stop and
    /// start so short turns still add up.
    carry: Duration,
}

impl Clock {
    /// Creates a stopped clock.
    pub fn new(time_control: TimeControl) -> Self {
        Self {
            remaining: time_control.into(),
            running: false,
            expired: false,
            carry: Duration::ZERO,
        }
    }

    /// Starts counting down. Unlimited and empty clocks refuse to start.
    pub fn start(&mut self) -> bool {
        match self.remaining {
            Remaining::Seconds(secs) if secs > 0 => {
                self.running = true;
                true
            }
            _ => false,
        }
    }

    /// Halts counting without touching the remaining time.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Sets the remaining time and stops the clock.
    pub fn reset(&mut self, time_control: TimeControl) {
        *self = Self::new(time_control);
    }

    /// Advances one second. Returns true only on the tick that reaches zero.
    pub fn tick(&mut self) -> bool {
        self.advance(SECOND)
    }

    /// Charges `elapsed` running time, one second off the display for
    /// every whole second accumulated. Returns true only on the call that
    /// reaches zero.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if !self.running {
            return false;
        }
        let Remaining::Seconds(mut secs) = self.remaining else {
            self.running = false;
            return false;
        };
        self.carry += elapsed;
        while self.carry >= SECOND && secs > 0 {
            self.carry -= SECOND;
            secs -= 1;
        }
        self.remaining = Remaining::Seconds(secs);
        if secs == 0 {
            self.running = false;
            self.carry = Duration::ZERO;
            if !self.expired {
                self.expired = true;
                return true;
            }
        }
        false
    }

    /// Running time left until the next whole second is charged.
    pub fn until_next_second(&self) -> Option<Duration> {
        match self.remaining {
            Remaining::Seconds(_) if self.running => Some(SECOND.saturating_sub(self.carry)),
            _ => None,
        }
    }

    /// Whether the clock is counting down.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Time left.
    pub fn remaining(&self) -> Remaining {
        self.remaining
    }

    /// Read-only view for observers.
    pub fn state(&self) -> ClockState {
        ClockState {
            remaining: self.remaining,
            running: self.running,
        }
    }
}

/// Observable state of one clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockState {
    /// Time left.
    pub remaining: Remaining,
    /// Whether it is counting down.
    pub running: bool,
}

impl ClockState {
    /// Remaining seconds, if limited.
    pub fn seconds(&self) -> Option<u32> {
        match self.remaining {
            Remaining::Seconds(secs) => Some(secs),
            Remaining::Unlimited => None,
        }
    }

    /// Cosmetic low-time flag: running with less than `threshold` seconds left.
    pub fn is_low_time(&self, threshold: u32) -> bool {
        self.running && self.seconds().is_some_and(|secs| secs < threshold)
    }
}

impl std::fmt::Display for ClockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.remaining {
            Remaining::Seconds(secs) => write!(f, "{}:{:02}", secs / 60, secs % 60),
            Remaining::Unlimited => write!(f, "∞"),
        }
    }
}

/// White's and Black's clocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockPair {
    white: Clock,
    black: Clock,
}

impl ClockPair {
    /// Both clocks stopped at the time control's allotment.
    pub fn new(time_control: TimeControl) -> Self {
        Self {
            white: Clock::new(time_control),
            black: Clock::new(time_control),
        }
    }

    fn clock(&self, side: Side) -> &Clock {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    fn clock_mut(&mut self, side: Side) -> &mut Clock {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }

    /// Starts `side`'s clock. Returns false if it cannot run.
    #[instrument(skip(self))]
    pub fn start(&mut self, side: Side) -> bool {
        let started = self.clock_mut(side).start();
        debug!(started, "Clock start requested");
        started
    }

    /// Stops `side`'s clock.
    #[instrument(skip(self))]
    pub fn stop(&mut self, side: Side) {
        self.clock_mut(side).stop();
    }

    /// Stops both clocks.
    pub fn stop_all(&mut self) {
        self.white.stop();
        self.black.stop();
    }

    /// Resets `side`'s clock, leaving it stopped.
    #[instrument(skip(self))]
    pub fn reset(&mut self, side: Side, time_control: TimeControl) {
        self.clock_mut(side).reset(time_control);
    }

    /// Resets both clocks, leaving them stopped.
    pub fn reset_all(&mut self, time_control: TimeControl) {
        self.white.reset(time_control);
        self.black.reset(time_control);
    }

    /// One elapsed second for every running clock.
    ///
    /// Returns the side whose clock reached zero on this tick. Each clock
    /// reports its expiry at most once per reset.
    pub fn tick(&mut self) -> Option<Side> {
        self.advance(SECOND)
    }

    /// Charges `elapsed` to every running clock.
    ///
    /// Returns the side whose clock reached zero on this call.
    pub fn advance(&mut self, elapsed: Duration) -> Option<Side> {
        let white = self.white.advance(elapsed);
        let black = self.black.advance(elapsed);
        match (white, black) {
            (true, _) => Some(Side::White),
            (false, true) => Some(Side::Black),
            (false, false) => None,
        }
    }

    /// Time until the running clock next loses a second.
    pub fn until_next_second(&self) -> Option<Duration> {
        match self.running_side() {
            Some(side) => self.clock(side).until_next_second(),
            None => None,
        }
    }

    /// The side whose clock is running, if exactly one is.
    pub fn running_side(&self) -> Option<Side> {
        match (self.white.is_running(), self.black.is_running()) {
            (true, false) => Some(Side::White),
            (false, true) => Some(Side::Black),
            _ => None,
        }
    }

    /// Number of clocks counting down.
    pub fn running_count(&self) -> usize {
        [self.white.is_running(), self.black.is_running()]
            .into_iter()
            .filter(|running| *running)
            .count()
    }

    /// Observable state of `side`'s clock.
    pub fn state(&self, side: Side) -> ClockState {
        self.clock(side).state()
    }
}
