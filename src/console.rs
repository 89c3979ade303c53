//! Line-oriented input adapter.
//!
//! Reads commands from a [`CommandSource`], forwards them to a running
//! session and prints session events as they arrive.

use crate::games::chess::{MoveRequest, Side};
use crate::session::{SessionError, SessionEvent, SessionHandle, SessionSnapshot};
use anyhow::Result;
use derive_more::{Display, Error};
use std::collections::VecDeque;
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Help text printed by the `help` command.
pub const HELP: &str = "\
Commands:
  e2e4, e7e8q, e7-e8=n   play a move (coordinate notation)
  new                    start a new match
  pause / resume         halt or restart the clocks
  draw                   agree a draw
  board                  show the position (FEN)
  history                list moves played
  clocks                 show both clocks
  status                 show the match status
  json                   dump the session state as JSON
  help                   show this text
  quit                   leave";

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Play a move.
    Move(MoveRequest),
    /// Start a new match.
    New,
    /// Pause the match.
    Pause,
    /// Resume the match.
    Resume,
    /// Agree a draw.
    Draw,
    /// Show the position.
    Board,
    /// Show the move list.
    History,
    /// Show both clocks.
    Clocks,
    /// Show the status line.
    Status,
    /// Dump the snapshot as JSON.
    Json,
    /// Show help.
    Help,
    /// Leave.
    Quit,
}

/// Input that is neither a command nor a move.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Unknown command '{}' (type 'help')", input)]
pub struct UnknownCommand {
    /// The rejected line.
    pub input: String,
}

impl FromStr for ConsoleCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim().to_ascii_lowercase();
        let command = match line.as_str() {
            "new" | "n" => ConsoleCommand::New,
            "pause" | "p" => ConsoleCommand::Pause,
            "resume" | "r" => ConsoleCommand::Resume,
            "draw" => ConsoleCommand::Draw,
            "board" | "fen" => ConsoleCommand::Board,
            "history" | "moves" => ConsoleCommand::History,
            "clocks" | "clock" => ConsoleCommand::Clocks,
            "status" => ConsoleCommand::Status,
            "json" => ConsoleCommand::Json,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" | "q" => ConsoleCommand::Quit,
            other => ConsoleCommand::Move(other.parse().map_err(|_| UnknownCommand {
                input: s.trim().to_string(),
            })?),
        };
        Ok(command)
    }
}

/// Source of console input lines.
#[async_trait::async_trait]
pub trait CommandSource: Send {
    /// Next line of input, or `None` at end of input.
    async fn next_line(&mut self) -> Result<Option<String>>;
}

/// Reads lines from standard input.
pub struct StdinSource {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinSource {
    /// Wraps the process's standard input.
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CommandSource for StdinSource {
    async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.next_line().await?)
    }
}

/// Replays a fixed list of lines.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    lines: VecDeque<String>,
}

impl ScriptedSource {
    /// Creates a source that yields `lines` in order, then ends.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait::async_trait]
impl CommandSource for ScriptedSource {
    async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

/// Runs the console until `quit`, end of input, or the session closes.
#[instrument(skip_all)]
pub async fn run_console<S, W>(
    handle: SessionHandle,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
    mut source: S,
    mut out: W,
    low_time_threshold: u32,
) -> Result<()>
where
    S: CommandSource,
    W: Write + Send,
{
    info!("Console started");
    writeln!(out, "Type 'help' for commands.")?;

    loop {
        tokio::select! {
            biased;

            event = events.recv() => {
                match event {
                    Some(event) => print_event(&mut out, &event)?,
                    None => {
                        info!("Session closed");
                        return Ok(());
                    }
                }
            }

            line = source.next_line() => {
                let Some(line) = line? else {
                    info!("End of input");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let command = match line.parse::<ConsoleCommand>() {
                    Ok(command) => command,
                    Err(e) => {
                        writeln!(out, "! {}", e)?;
                        continue;
                    }
                };
                if command == ConsoleCommand::Quit {
                    break;
                }
                execute(&handle, command, &mut out, low_time_threshold).await?;
            }
        }
    }

    handle.shutdown();
    // Print whatever the session reported before it stopped.
    while let Some(event) = events.recv().await {
        print_event(&mut out, &event)?;
    }
    out.flush()?;
    Ok(())
}

async fn execute<W: Write>(
    handle: &SessionHandle,
    command: ConsoleCommand,
    out: &mut W,
    low_time_threshold: u32,
) -> Result<()> {
    debug!(?command, "Executing console command");
    let result = match command {
        ConsoleCommand::Move(request) => handle.submit_move(request).await,
        ConsoleCommand::New => handle.start_new_match(None).await,
        ConsoleCommand::Pause => handle.pause().await,
        ConsoleCommand::Resume => handle.resume().await,
        ConsoleCommand::Draw => handle.agree_draw().await,
        ConsoleCommand::Help => {
            writeln!(out, "{}", HELP)?;
            Ok(())
        }
        ConsoleCommand::Quit => Ok(()),
        view => {
            let snapshot = handle.snapshot().await?;
            render(out, &view, &snapshot, low_time_threshold)?;
            Ok(())
        }
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_fatal() || e == SessionError::SessionClosed => Err(e.into()),
        Err(e) => {
            warn!(error = %e, "Command rejected");
            writeln!(out, "! {}", e)?;
            Ok(())
        }
    }
}

fn render<W: Write>(
    out: &mut W,
    view: &ConsoleCommand,
    snapshot: &SessionSnapshot,
    low_time_threshold: u32,
) -> Result<()> {
    match view {
        ConsoleCommand::Board => writeln!(out, "{}", snapshot.fen())?,
        ConsoleCommand::History => {
            let history = snapshot.history();
            if history.is_empty() {
                writeln!(out, "No moves yet")?;
            }
            for pair in move_pairs(history) {
                writeln!(out, "{}", pair)?;
            }
        }
        ConsoleCommand::Clocks => {
            for (side, state) in [
                (Side::White, snapshot.white_clock()),
                (Side::Black, snapshot.black_clock()),
            ] {
                let marker = if state.running { " *" } else { "" };
                let low = if state.is_low_time(low_time_threshold) {
                    " (low)"
                } else {
                    ""
                };
                writeln!(out, "{:<5} {}{}{}", side.label(), state, marker, low)?;
            }
        }
        ConsoleCommand::Status => {
            writeln!(out, "{} [{}]", snapshot.status(), snapshot.phase())?
        }
        ConsoleCommand::Json => writeln!(out, "{}", serde_json::to_string_pretty(snapshot)?)?,
        _ => {}
    }
    Ok(())
}

fn move_pairs(history: &[crate::games::chess::MoveRecord]) -> Vec<String> {
    let mut log = crate::games::chess::MoveHistory::starting_with(
        history.first().map(|r| r.side).unwrap_or(Side::White),
    );
    for record in history {
        log.push(record.clone());
    }
    log.pairs()
        .into_iter()
        .map(|pair| {
            format!(
                "{}. {} {}",
                pair.number,
                pair.white.as_deref().unwrap_or("..."),
                pair.black.as_deref().unwrap_or("")
            )
            .trim_end()
            .to_string()
        })
        .collect()
}

fn print_event<W: Write>(out: &mut W, event: &SessionEvent) -> Result<()> {
    match event {
        SessionEvent::MatchStarted { config, .. } => writeln!(
            out,
            "New match: {}, {}, time control {}",
            config.mode, config.difficulty, config.time_control
        )?,
        SessionEvent::MoveMade { side, notation, .. } => {
            writeln!(out, "{}: {}", side.label(), notation)?
        }
        SessionEvent::Paused => writeln!(out, "Paused")?,
        SessionEvent::Resumed => writeln!(out, "Resumed")?,
        SessionEvent::MatchEnded { outcome } => writeln!(out, "{}", outcome)?,
        SessionEvent::ConfigChanged { config } => {
            writeln!(out, "Next match: {}, {}", config.mode, config.time_control)?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::chess::{MoveRecord, Promotion};

    #[test]
    fn test_parse_commands() {
        assert_eq!("new".parse::<ConsoleCommand>(), Ok(ConsoleCommand::New));
        assert_eq!(" Quit ".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Quit));
        assert_eq!("?".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Help));
        match "e7-e8=n".parse::<ConsoleCommand>() {
            Ok(ConsoleCommand::Move(request)) => {
                assert_eq!(request.promotion(), Some(Promotion::Knight))
            }
            other => panic!("unexpected parse: {:?}", other),
        }
        assert!("castle".parse::<ConsoleCommand>().is_err());
    }

    #[test]
    fn test_move_pairs_formatting() {
        let history = vec![
            MoveRecord::new(Side::White, "e4".to_string()),
            MoveRecord::new(Side::Black, "e5".to_string()),
            MoveRecord::new(Side::White, "Nf3".to_string()),
        ];
        assert_eq!(move_pairs(&history), vec!["1. e4 e5", "2. Nf3"]);
    }
}
