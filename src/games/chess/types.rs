//! Core domain types for a chess match.

use derive_more::{Display, Error};
use derive_new::new;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::instrument;

/// One of the two players.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Side {
    /// White (moves first).
    White,
    /// Black.
    Black,
}

impl Side {
    /// Returns the other side.
    pub fn opposite(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Capitalised name for status lines.
    pub fn label(self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }

    /// The side to move after `plies` half-moves from the initial position.
    pub fn to_move_after(plies: usize) -> Self {
        if plies % 2 == 0 { Side::White } else { Side::Black }
    }
}

/// Who is playing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum GameMode {
    /// Two humans sharing one input adapter.
    #[default]
    HumanVsHuman,
    /// A human against the heuristic opponent.
    HumanVsComputer,
}

/// Heuristic tier for the computer opponent.
///
/// Governs move-selection bias only; there is no search depth.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Difficulty {
    /// Uniform over all legal moves.
    Easy,
    /// Prefers captures.
    #[default]
    Medium,
    /// Prefers checks, then captures.
    Hard,
}

/// Named time controls offered to players.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum TimeControlPreset {
    /// 3 minutes each.
    #[strum(serialize = "blitz-3")]
    Blitz3,
    /// 5 minutes each.
    #[strum(serialize = "blitz-5")]
    Blitz5,
    /// 10 minutes each.
    #[strum(serialize = "rapid-10")]
    Rapid10,
    /// 30 minutes each.
    #[strum(serialize = "classical-30")]
    Classical30,
    /// No clocks.
    #[strum(to_string = "unlimited", serialize = "freestyle")]
    Unlimited,
}

impl TimeControlPreset {
    /// The time control this preset stands for.
    pub fn time_control(self) -> TimeControl {
        match self {
            Self::Blitz3 => TimeControl::Limited(3 * 60),
            Self::Blitz5 => TimeControl::Limited(5 * 60),
            Self::Rapid10 => TimeControl::Limited(10 * 60),
            Self::Classical30 => TimeControl::Limited(30 * 60),
            Self::Unlimited => TimeControl::Unlimited,
        }
    }

    /// Human-readable description, e.g. `Blitz (3+0)`.
    pub fn description(self) -> &'static str {
        match self {
            Self::Blitz3 => "Blitz (3+0)",
            Self::Blitz5 => "Blitz (5+0)",
            Self::Rapid10 => "Rapid (10+0)",
            Self::Classical30 => "Classical (30+0)",
            Self::Unlimited => "Freestyle (no clock)",
        }
    }
}

/// Initial clock allotment per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum TimeControl {
    /// Each side starts with this many seconds.
    Limited(u32),
    /// Clocks never run.
    Unlimited,
}

impl TimeControl {
    /// Returns true when clocks are disabled.
    pub fn is_unlimited(self) -> bool {
        matches!(self, TimeControl::Unlimited)
    }

    /// Seconds per side, if limited.
    pub fn seconds(self) -> Option<u32> {
        match self {
            TimeControl::Limited(secs) => Some(secs),
            TimeControl::Unlimited => None,
        }
    }
}

impl Default for TimeControl {
    fn default() -> Self {
        TimeControlPreset::Blitz5.time_control()
    }
}

impl std::fmt::Display for TimeControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeControl::Limited(secs) => write!(f, "{}", secs),
            TimeControl::Unlimited => write!(f, "unlimited"),
        }
    }
}

/// Error parsing a time control.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display(
    "Invalid time control '{}': expected a preset or a positive number of seconds at {}:{}",
    input,
    file,
    line
)]
pub struct ParseTimeControlError {
    /// The rejected input.
    pub input: String,
    /// Line number where the error occurred.
    pub line: u32,
    /// Source file where the error occurred.
    pub file: &'static str,
}

impl ParseTimeControlError {
    /// Creates a new parse error with caller location.
    #[track_caller]
    pub fn new(input: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            input: input.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl FromStr for TimeControl {
    type Err = ParseTimeControlError;

    #[instrument]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(preset) = trimmed.parse::<TimeControlPreset>() {
            return Ok(preset.time_control());
        }
        match trimmed.parse::<u32>() {
            Ok(secs) if secs > 0 => Ok(TimeControl::Limited(secs)),
            _ => Err(ParseTimeControlError::new(s)),
        }
    }
}

/// Accepts `"blitz-3"`, `"600"` or a bare `600` in config files.
#[derive(Deserialize)]
#[serde(untagged)]
enum TimeControlRepr {
    Seconds(u32),
    Text(String),
}

impl<'de> Deserialize<'de> for TimeControl {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed = match TimeControlRepr::deserialize(deserializer)? {
            TimeControlRepr::Seconds(secs) => secs.to_string().parse(),
            TimeControlRepr::Text(text) => text.parse(),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

impl From<TimeControl> for String {
    fn from(value: TimeControl) -> Self {
        value.to_string()
    }
}

/// Match configuration, immutable once a match starts.
///
/// Reconfiguration builds a new value with the `with_*` setters and hands
/// it to the controller wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Setters)]
#[setters(prefix = "with_")]
pub struct MatchConfig {
    /// Who is playing.
    pub mode: GameMode,
    /// Heuristic tier, meaningful only against the computer.
    pub difficulty: Difficulty,
    /// Clock allotment per side.
    pub time_control: TimeControl,
    /// Side played by the computer in [`GameMode::HumanVsComputer`].
    #[serde(default = "default_computer_side")]
    pub computer_side: Side,
}

fn default_computer_side() -> Side {
    Side::Black
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::human_vs_human(TimeControl::default())
    }
}

impl MatchConfig {
    /// Human vs human with the given time control.
    pub fn human_vs_human(time_control: TimeControl) -> Self {
        Self {
            mode: GameMode::HumanVsHuman,
            difficulty: Difficulty::default(),
            time_control,
            computer_side: default_computer_side(),
        }
    }

    /// Human vs computer; the computer plays Black.
    pub fn human_vs_computer(difficulty: Difficulty, time_control: TimeControl) -> Self {
        Self {
            mode: GameMode::HumanVsComputer,
            difficulty,
            time_control,
            computer_side: default_computer_side(),
        }
    }

    /// Returns true when `side` is driven by the heuristic opponent.
    pub fn is_computer(&self, side: Side) -> bool {
        self.mode == GameMode::HumanVsComputer && self.computer_side == side
    }
}

/// One accepted move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct MoveRecord {
    /// Who moved.
    pub side: Side,
    /// Standard algebraic notation.
    pub notation: String,
}

/// A numbered pair of moves for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovePair {
    /// Full-move number, starting at 1.
    pub number: usize,
    /// White's move.
    pub white: Option<String>,
    /// Black's reply, if played.
    pub black: Option<String>,
}

/// Append-only move list for the current match.
///
/// From the standard setup, even length means White is to move. Matches
/// started from a custom position record which side made the first move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveHistory {
    first_mover: Side,
    records: Vec<MoveRecord>,
}

impl Default for MoveHistory {
    fn default() -> Self {
        Self::starting_with(Side::White)
    }
}

impl MoveHistory {
    /// Creates an empty history for a match where White moves first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty history for a match where `first_mover` moves first.
    pub fn starting_with(first_mover: Side) -> Self {
        Self {
            first_mover,
            records: Vec::new(),
        }
    }

    /// Side that made (or will make) the first move.
    pub fn first_mover(&self) -> Side {
        self.first_mover
    }

    /// Number of plies played.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true before the first move.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in play order.
    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    /// The most recent move.
    pub fn last(&self) -> Option<&MoveRecord> {
        self.records.last()
    }

    /// Side to move implied by the history length.
    pub fn side_to_move(&self) -> Side {
        match self.first_mover {
            Side::White => Side::to_move_after(self.records.len()),
            Side::Black => Side::to_move_after(self.records.len() + 1),
        }
    }

    /// Groups plies into numbered pairs.
    ///
    /// When Black moved first, the opening pair has no White move.
    pub fn pairs(&self) -> Vec<MovePair> {
        let mut slots: Vec<Option<&str>> = Vec::with_capacity(self.records.len() + 1);
        if self.first_mover == Side::Black {
            slots.push(None);
        }
        slots.extend(self.records.iter().map(|r| Some(r.notation.as_str())));
        slots
            .chunks(2)
            .enumerate()
            .map(|(idx, chunk)| MovePair {
                number: idx + 1,
                white: chunk.first().copied().flatten().map(str::to_string),
                black: chunk.get(1).copied().flatten().map(str::to_string),
            })
            .collect()
    }

    pub(crate) fn push(&mut self, record: MoveRecord) {
        self.records.push(record);
    }

    pub(crate) fn reset(&mut self, first_mover: Side) {
        self.first_mover = first_mover;
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_control_presets_parse() {
        assert_eq!("blitz-3".parse::<TimeControl>(), Ok(TimeControl::Limited(180)));
        assert_eq!("Rapid-10".parse::<TimeControl>(), Ok(TimeControl::Limited(600)));
        assert_eq!("classical-30".parse::<TimeControl>(), Ok(TimeControl::Limited(1800)));
        assert_eq!("unlimited".parse::<TimeControl>(), Ok(TimeControl::Unlimited));
        assert_eq!("freestyle".parse::<TimeControl>(), Ok(TimeControl::Unlimited));
        assert_eq!("90".parse::<TimeControl>(), Ok(TimeControl::Limited(90)));
    }

    #[test]
    fn test_time_control_rejects_zero_and_garbage() {
        assert!("0".parse::<TimeControl>().is_err());
        assert!("bullet".parse::<TimeControl>().is_err());
        assert!("-5".parse::<TimeControl>().is_err());
    }

    #[test]
    fn test_history_pairs() {
        let mut history = MoveHistory::new();
        history.push(MoveRecord::new(Side::White, "e4".to_string()));
        history.push(MoveRecord::new(Side::Black, "e5".to_string()));
        history.push(MoveRecord::new(Side::White, "Nf3".to_string()));

        let pairs = history.pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].number, 1);
        assert_eq!(pairs[0].black.as_deref(), Some("e5"));
        assert_eq!(pairs[1].white.as_deref(), Some("Nf3"));
        assert_eq!(pairs[1].black, None);
        assert_eq!(history.side_to_move(), Side::Black);
    }

    #[test]
    fn test_history_pairs_when_black_moves_first() {
        let mut history = MoveHistory::starting_with(Side::Black);
        assert_eq!(history.side_to_move(), Side::Black);
        history.push(MoveRecord::new(Side::Black, "Kb7".to_string()));
        assert_eq!(history.side_to_move(), Side::White);

        let pairs = history.pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].white, None);
        assert_eq!(pairs[0].black.as_deref(), Some("Kb7"));
    }

    #[test]
    fn test_config_setters_replace_wholesale() {
        let base = MatchConfig::human_vs_human(TimeControl::Unlimited);
        let next = base
            .with_mode(GameMode::HumanVsComputer)
            .with_difficulty(Difficulty::Hard);
        assert_eq!(base.mode, GameMode::HumanVsHuman);
        assert!(next.is_computer(Side::Black));
        assert!(!next.is_computer(Side::White));
    }

    #[test]
    fn test_time_control_error_records_location() {
        let err = "bullet".parse::<TimeControl>().unwrap_err();
        assert_eq!(err.input, "bullet");
        assert!(err.file.ends_with("types.rs"));
        assert!(err.line > 0);
    }
}
