use arcade_core::config::HubConfig;
use arcade_core::error::HubError;
use arcade_core::game_trait::{GameConfig, GameKey};
use arcade_core::hub::HubPhase;
use arcade_core::surface::SurfaceBackend;
use serde_json::json;

use arcade_headless::{RunOptions, builtin_games, parse_script, recording_hub, run, run_on};

#[test]
fn builtin_registry_has_both_games() {
    let keys: Vec<_> = builtin_games().into_iter().map(|d| d.key.0).collect();
    assert_eq!(keys, ["snake", "merge"]);
}

#[test]
fn idle_snake_crashes_into_wall() {
    let mut options = RunOptions::new("snake");
    options.seed = Some(11);
    options.frames = 2_000;

    let report = run(&options).unwrap();
    assert_eq!(report.final_phase, HubPhase::Idle);
    assert_eq!(report.sessions.len(), 1);
    assert_eq!(report.sessions[0].reason, "lost");
    assert!(report.frames_run < options.frames, "ended before the frame budget");
    assert_eq!(report.stats.sessions_started, 1);
}

#[test]
fn steering_snake_survives_longer() {
    let mut idle = RunOptions::new("snake");
    idle.seed = Some(3);
    idle.frames = 2_000;
    let idle_frames = run(&idle).unwrap().frames_run;

    let mut steered = idle.clone();
    steered.script = parse_script("600:ArrowDown,1200:ArrowLeft,2800:ArrowUp").unwrap();
    let report = run(&steered).unwrap();
    assert_eq!(report.keys_delivered, 3);
    assert!(report.frames_run > idle_frames);
}

#[test]
fn unfinished_session_is_exited_with_score() {
    let mut options = RunOptions::new("merge");
    options.seed = Some(5);
    options.frames = 30;
    options.script = parse_script("0:ArrowLeft,100:ArrowUp,200:ArrowRight").unwrap();

    let report = run(&options).unwrap();
    assert_eq!(report.frames_run, 30);
    assert_eq!(report.final_phase, HubPhase::Idle);
    let session = &report.sessions[0];
    assert_eq!(session.reason, "exited");
    assert!(session.score.is_some());
    assert_eq!(report.stats.frames_forwarded, 30);
}

#[test]
fn same_seed_same_outcome() {
    let mut options = RunOptions::new("snake");
    options.seed = Some(99);
    options.frames = 1_000;
    options.script = parse_script("300:ArrowUp,900:ArrowLeft").unwrap();

    let a = run(&options).unwrap();
    let b = run(&options).unwrap();
    assert_eq!(a.frames_run, b.frames_run);
    assert_eq!(a.sessions, b.sessions);
}

#[test]
fn unknown_game_is_an_error() {
    let options = RunOptions::new("pong");
    let err = run(&options).unwrap_err();
    assert_eq!(err, HubError::UnknownGame(GameKey::from("pong")));
}

#[test]
fn invalid_session_config_fails_init() {
    let (mut hub, _) = recording_hub(HubConfig::default(), 400, 300);
    for game in builtin_games() {
        hub.register_game(game).unwrap();
    }
    let mut config = GameConfig::default();
    config.custom.insert("board_size".into(), json!(1));
    hub.set_game_config("merge", config);

    // run_on re-applies its own session config, so select directly.
    let err = hub.select_game("merge").unwrap_err();
    assert!(matches!(err, HubError::GameInit { .. }));
    assert_eq!(hub.phase(), HubPhase::Idle);

    let options = RunOptions::new("snake");
    let report = run_on(hub, &options).unwrap();
    assert_eq!(report.stats.init_failures, 1);
    assert_eq!(report.stats.sessions_started, 1);
}

#[test]
fn resize_reaches_the_surface() {
    let (mut hub, recording) = recording_hub(HubConfig::default(), 400, 300);
    for game in builtin_games() {
        hub.register_game(game).unwrap();
    }
    let mut options = RunOptions::new("merge");
    options.width = 640;
    options.height = 480;
    options.frames = 3;
    run_on(hub, &options).unwrap();

    let size = recording.borrow().size();
    assert_eq!((size.width, size.height), (640, 480));
}
