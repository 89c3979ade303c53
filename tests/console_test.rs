//! Drives the console end to end with scripted input.

use strictly_chess::{
    MatchConfig, ScriptedSource, SessionController, StandardRules, TimeControl, run_console,
    spawn_session,
};

async fn run_script(config: MatchConfig, lines: &[&str]) -> String {
    let controller = SessionController::new(StandardRules::new(), config);
    let (handle, events, task) = spawn_session(controller);
    handle.start_new_match(None).await.unwrap();

    let mut out = Vec::new();
    run_console(
        handle,
        events,
        ScriptedSource::new(lines.iter().copied()),
        &mut out,
        30,
    )
    .await
    .unwrap();
    task.await.unwrap().unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_moves_history_and_rejections() {
    let out = run_script(
        MatchConfig::human_vs_human(TimeControl::Unlimited),
        &["e2e4", "e7e5", "history", "clocks", "e2e4", "castle", "quit"],
    )
    .await;

    assert!(out.contains("New match:"));
    assert!(out.contains("White: e4"));
    assert!(out.contains("Black: e5"));
    assert!(out.contains("1. e4 e5"));
    assert!(out.contains("∞"));
    assert!(out.contains("! Illegal move e2e4"));
    assert!(out.contains("Unknown command 'castle'"));
}

#[tokio::test]
async fn test_status_and_draw() {
    let out = run_script(
        MatchConfig::human_vs_human(TimeControl::Limited(300)),
        &["clocks", "status", "draw", "status", "e2e4"],
    )
    .await;

    assert!(out.contains("White 5:00 *"));
    assert!(out.contains("White to move [active]"));
    assert!(out.contains("Agreement - Draw"));
    assert!(out.contains("[terminated]"));
    assert!(out.contains("! The match is already over"));
}

#[tokio::test]
async fn test_json_dump_and_new_match() {
    let out = run_script(
        MatchConfig::default(),
        &["e2e4", "new", "json", "board"],
    )
    .await;

    assert!(out.contains("\"generation\": 2"));
    assert!(out.contains("\"history\": []"));
    assert!(out.contains("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"));
}
