//! Scenario tests for the session state machine over standard chess.

use std::time::Duration;
use strictly_chess::{
    Effect, GameMode, GameOutcome, MatchConfig, MatchPhase, MoveRequest, SessionController,
    SessionError, SessionEvent, Side, StandardRules, TerminationCause, TimeControl, Winner,
};

fn session(config: MatchConfig) -> SessionController<StandardRules> {
    SessionController::new(StandardRules::new(), config).with_seed(7)
}

fn mv(text: &str) -> MoveRequest {
    text.parse().unwrap()
}

fn play(session: &mut SessionController<StandardRules>, moves: &[&str]) -> Vec<Effect> {
    moves
        .iter()
        .flat_map(|m| session.submit_move(&mv(m)).unwrap())
        .collect()
}

fn match_ended_count(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::Notify(SessionEvent::MatchEnded { .. })))
        .count()
}

fn blitz() -> MatchConfig {
    MatchConfig::human_vs_human(TimeControl::Limited(180))
}

#[test]
fn test_first_move_hands_the_clock_to_black() {
    let mut session = session(blitz());
    session.start_new_match(None).unwrap();
    let effects = session.submit_move(&mv("e2e4")).unwrap();

    assert!(effects.contains(&Effect::StopClock(Side::White)));
    assert!(effects.contains(&Effect::StartClock(Side::Black)));
    assert_eq!(session.clocks().running_side(), Some(Side::Black));
    assert_eq!(session.history().records()[0].notation, "e4");
    assert_eq!(
        session.outcome(),
        GameOutcome::InProgress {
            side_to_move: Side::Black,
            in_check: false
        }
    );
}

#[test]
fn test_fools_mate_ends_once() {
    let mut session = session(blitz());
    session.start_new_match(None).unwrap();
    let effects = play(&mut session, &["f2f3", "e7e5", "g2g4", "d8h4"]);

    assert_eq!(
        session.outcome(),
        GameOutcome::Terminated {
            winner: Winner::Black,
            cause: TerminationCause::Checkmate
        }
    );
    assert_eq!(session.phase(), MatchPhase::Terminated);
    assert_eq!(session.clocks().running_count(), 0);
    assert_eq!(match_ended_count(&effects), 1);
    assert_eq!(session.history().last().unwrap().notation, "Qh4#");
}

#[test]
fn test_flag_falls_on_tick() {
    let mut session = session(MatchConfig::human_vs_human(TimeControl::Limited(3)));
    session.start_new_match(None).unwrap();
    let generation = session.generation();

    assert!(session.on_tick(generation).unwrap().is_empty());
    assert!(session.on_tick(generation).unwrap().is_empty());
    let effects = session.on_tick(generation).unwrap();

    assert_eq!(match_ended_count(&effects), 1);
    assert_eq!(
        session.outcome(),
        GameOutcome::Terminated {
            winner: Winner::Black,
            cause: TerminationCause::Timeout
        }
    );
    assert_eq!(session.clock(Side::White).seconds(), Some(0));
    assert_eq!(session.clock(Side::Black).seconds(), Some(3));
    assert!(session.on_tick(generation).unwrap().is_empty());
}

#[test]
fn test_expiry_after_checkmate_is_ignored() {
    let mut session = session(blitz());
    session.start_new_match(None).unwrap();
    play(&mut session, &["f2f3", "e7e5", "g2g4", "d8h4"]);
    let before = session.outcome();

    assert!(session.on_clock_expired(Side::White).unwrap().is_empty());
    assert!(session.on_clock_expired(Side::Black).unwrap().is_empty());
    assert_eq!(session.outcome(), before);
}

#[test]
fn test_illegal_moves_change_nothing() {
    let mut session = session(blitz());
    session.start_new_match(None).unwrap();
    session.submit_move(&mv("e2e4")).unwrap();
    let fen = session.display_string();
    let outcome = session.outcome();

    for _ in 0..5 {
        let err = session.submit_move(&mv("e2e4")).unwrap_err();
        assert!(matches!(err, SessionError::IllegalMove(_)));
        assert!(!err.is_fatal());
    }
    assert_eq!(session.display_string(), fen);
    assert_eq!(session.outcome(), outcome);
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.clocks().running_side(), Some(Side::Black));
}

#[test]
fn test_moves_after_the_end_are_refused() {
    let mut session = session(blitz());
    session.start_new_match(None).unwrap();
    session.agree_draw().unwrap();
    assert_eq!(
        session.submit_move(&mv("e2e4")),
        Err(SessionError::MatchAlreadyOver)
    );
    assert_eq!(session.agree_draw(), Err(SessionError::MatchAlreadyOver));
    assert_eq!(
        session.outcome(),
        GameOutcome::Terminated {
            winner: Winner::Draw,
            cause: TerminationCause::Agreement
        }
    );
}

#[test]
fn test_stale_callbacks_from_an_old_match_are_dropped() {
    let config = MatchConfig::default()
        .with_mode(GameMode::HumanVsComputer)
        .with_time_control(TimeControl::Limited(60));
    let mut session = session(config);
    session.start_new_match(None).unwrap();
    session.submit_move(&mv("e2e4")).unwrap();
    let old = session.generation();

    session.start_new_match(None).unwrap();
    assert!(session.on_computer_move_due(old, 1).unwrap().is_empty());
    assert!(session.on_tick(old).unwrap().is_empty());
    assert_eq!(session.history().len(), 0);
    assert_eq!(session.clock(Side::White).seconds(), Some(60));
}

#[test]
fn test_computer_replies_when_due() {
    let config = MatchConfig::default()
        .with_mode(GameMode::HumanVsComputer)
        .with_time_control(TimeControl::Limited(60));
    let mut session = session(config);
    session.start_new_match(None).unwrap();
    let effects = session.submit_move(&mv("e2e4")).unwrap();
    let (generation, ply) = effects
        .iter()
        .find_map(|e| match e {
            Effect::ScheduleComputerMove {
                generation, ply, ..
            } => Some((*generation, *ply)),
            _ => None,
        })
        .unwrap();

    session.on_computer_move_due(generation, ply).unwrap();
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.history().records()[1].side, Side::Black);
    assert_eq!(session.clocks().running_side(), Some(Side::White));

    // Delivered twice, the second is stale.
    assert!(session.on_computer_move_due(generation, ply).unwrap().is_empty());
    assert_eq!(session.history().len(), 2);
}

#[test]
fn test_pause_freezes_the_clocks() {
    let mut session = session(blitz());
    session.start_new_match(None).unwrap();
    let generation = session.generation();
    session.on_tick(generation).unwrap();

    session.pause().unwrap();
    assert_eq!(session.phase(), MatchPhase::Paused);
    assert_eq!(session.clocks().running_count(), 0);
    assert!(session.on_tick(generation).unwrap().is_empty());
    assert_eq!(session.clock(Side::White).seconds(), Some(179));
    assert_eq!(session.submit_move(&mv("e2e4")), Err(SessionError::MatchPaused));
    assert!(session.pause().unwrap().is_empty());

    let effects = session.resume().unwrap();
    assert!(effects.contains(&Effect::StartClock(Side::White)));
    assert_eq!(session.outcome(), GameOutcome::initial());
    session.submit_move(&mv("e2e4")).unwrap();
}

#[test]
fn test_draw_can_be_agreed_while_paused() {
    let mut session = session(blitz());
    session.start_new_match(None).unwrap();
    session.pause().unwrap();
    let effects = session.agree_draw().unwrap();
    assert_eq!(match_ended_count(&effects), 1);
    assert_eq!(session.resume(), Err(SessionError::MatchAlreadyOver));
}

#[test]
fn test_custom_position_can_start_stalemated() {
    let rules = StandardRules::from_fen("k7/8/1Q6/8/8/8/8/K7 b - - 0 1").unwrap();
    let mut session = SessionController::new(rules, blitz());
    let effects = session.start_new_match(None).unwrap();
    assert_eq!(match_ended_count(&effects), 1);
    assert_eq!(
        session.outcome(),
        GameOutcome::Terminated {
            winner: Winner::Draw,
            cause: TerminationCause::Stalemate
        }
    );
    assert_eq!(session.clocks().running_count(), 0);
}

#[test]
fn test_knight_shuffle_repeats_to_a_draw() {
    let mut session = session(blitz());
    session.start_new_match(None).unwrap();
    let effects = play(
        &mut session,
        &[
            "g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8",
        ],
    );
    assert_eq!(match_ended_count(&effects), 1);
    assert_eq!(
        session.outcome(),
        GameOutcome::Terminated {
            winner: Winner::Draw,
            cause: TerminationCause::Repetition
        }
    );
}

#[test]
fn test_unlimited_match_never_runs_a_clock() {
    let mut session = session(MatchConfig::human_vs_human(TimeControl::Unlimited));
    session.start_new_match(None).unwrap();
    let generation = session.generation();
    for m in ["e2e4", "e7e5", "g1f3"] {
        session.submit_move(&mv(m)).unwrap();
        session.on_tick(generation).unwrap();
        assert_eq!(session.clocks().running_count(), 0);
    }
    assert_eq!(session.clock(Side::Black).seconds(), None);
    assert_eq!(session.phase(), MatchPhase::Active);
}

#[test]
fn test_config_change_waits_for_the_next_match() {
    let mut session = session(blitz());
    session.start_new_match(None).unwrap();
    let rapid = MatchConfig::human_vs_human(TimeControl::Limited(600));
    session.set_config(rapid).unwrap();

    assert_eq!(session.match_config(), blitz());
    assert_eq!(session.clock(Side::White).seconds(), Some(180));

    session.start_new_match(None).unwrap();
    assert_eq!(session.match_config(), rapid);
    assert_eq!(session.clock(Side::White).seconds(), Some(600));
}

#[test]
fn test_history_parity_tracks_side_to_move() {
    let mut session = session(blitz());
    session.start_new_match(None).unwrap();
    for m in ["d2d4", "d7d5", "c2c4", "e7e6", "b1c3"] {
        session.submit_move(&mv(m)).unwrap();
        assert_eq!(session.history().side_to_move(), session.side_to_move());
    }
}

#[test]
fn test_charged_time_flags_without_ending_the_match() {
    let mut session = session(MatchConfig::human_vs_human(TimeControl::Limited(2)));
    assert_eq!(session.charge_time(Duration::from_secs(5)), None);
    session.start_new_match(None).unwrap();

    assert_eq!(session.charge_time(Duration::from_millis(1500)), None);
    assert_eq!(session.clock(Side::White).seconds(), Some(1));
    assert_eq!(
        session.charge_time(Duration::from_millis(500)),
        Some(Side::White)
    );
    assert_eq!(session.phase(), MatchPhase::Active);

    let effects = session.on_clock_expired(Side::White).unwrap();
    assert_eq!(match_ended_count(&effects), 1);
    assert_eq!(
        session.outcome(),
        GameOutcome::Terminated {
            winner: Winner::Black,
            cause: TerminationCause::Timeout
        }
    );
    assert_eq!(session.charge_time(Duration::from_secs(1)), None);
}
