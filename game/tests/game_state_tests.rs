use engine::HeadlessRunner;
use game::logic::{InputAction, TetrisLogic};
use game::settings::GameSettings;
use game::state::{GameInput, GamePhase, GameState};
use game::tetris_core::Color;

fn running_state(interval_ms: u32) -> GameState {
    let mut state = GameState::new(10, 20, 1, interval_ms);
    assert!(state.start());
    state
}

#[test]
fn lifecycle_moves_through_running_paused_and_back() {
    let mut state = GameState::new(10, 20, 1, 500);
    assert_eq!(state.phase(), GamePhase::NotStarted);

    assert!(state.start());
    assert_eq!(state.phase(), GamePhase::Running);
    assert!(!state.start(), "start is ignored while running");

    state.advance(1_000);
    let before = state.tetris().snapshot();
    assert_eq!(state.toggle_pause(), GamePhase::Paused);
    assert_eq!(state.advance(10_000), 0);
    assert_eq!(state.tetris().snapshot(), before);

    assert_eq!(state.toggle_pause(), GamePhase::Running);
    assert_eq!(state.tetris().snapshot(), before);
    assert_eq!(state.advance(499), 0);
    assert_eq!(state.advance(1), 1);
}

#[test]
fn inputs_are_ignored_unless_running_with_a_piece() {
    let mut state = GameState::new(10, 20, 1, 500);
    assert!(!state.apply(GameInput::MoveLeft));

    state.start();
    assert!(!state.apply(GameInput::MoveLeft), "no piece until the first tick");

    state.advance(500);
    assert!(state.apply(GameInput::MoveLeft));
    assert!(state.apply(GameInput::SoftDrop));
    assert_eq!(state.tetris().score(), 1);

    state.toggle_pause();
    assert!(!state.apply(GameInput::MoveRight));
}

#[test]
fn blocked_spawn_moves_to_game_over_and_stops_ticking() {
    let mut state = running_state(100);
    for x in 0..10 {
        state.tetris_mut().set_cell(x, 0, Some(Color(0xFFFFFF)));
    }

    assert_eq!(state.advance(1_000), 1);
    assert_eq!(state.phase(), GamePhase::GameOver);
    assert_eq!(state.advance(1_000), 0);
    assert_eq!(state.toggle_pause(), GamePhase::GameOver);
}

#[test]
fn starting_again_after_game_over_replaces_the_board() {
    let mut state = running_state(100);
    for x in 0..10 {
        state.tetris_mut().set_cell(x, 0, Some(Color(0xFFFFFF)));
    }
    state.advance(100);
    assert_eq!(state.phase(), GamePhase::GameOver);

    assert!(state.start());
    assert_eq!(state.phase(), GamePhase::Running);
    assert!(state.tetris().board().rows().iter().flatten().all(Option::is_none));
    assert_eq!(state.tetris().score(), 0);
    assert!(!state.tetris().is_game_over());
}

#[test]
fn game_state_round_trip_preserves_state() {
    let mut state = running_state(400);
    state.advance(1_300);
    state.apply(GameInput::Rotate);

    let json = serde_json::to_string(&state).expect("serialize game state");
    let restored: GameState = serde_json::from_str(&json).expect("deserialize game state");

    assert_eq!(restored.phase(), state.phase());
    assert_eq!(restored.tetris().snapshot(), state.tetris().snapshot());
    assert_eq!(restored.gravity_interval_ms(), 400);
}

#[test]
fn headless_runner_plays_a_session_until_the_stack_tops_out() {
    let mut runner = HeadlessRunner::with_history_limit(TetrisLogic::new(GameSettings::default()), 8);
    runner.step(InputAction::Start);
    assert_eq!(runner.state().phase(), GamePhase::Running);

    // With no player input every piece falls straight down the middle column.
    for _ in 0..2_000 {
        runner.step(InputAction::Elapse(500));
        if runner.state().phase() == GamePhase::GameOver {
            break;
        }
    }

    assert_eq!(runner.state().phase(), GamePhase::GameOver);
    assert!(runner.state().tetris().is_game_over());
    assert_eq!(runner.history_len(), 8);
}

#[test]
fn logic_ignores_player_input_while_paused() {
    let runner_logic = TetrisLogic::new(GameSettings::default());
    let mut runner = HeadlessRunner::new(runner_logic);
    runner.run([
        InputAction::Start,
        InputAction::Elapse(500),
        InputAction::TogglePause,
    ]);
    let before = runner.state().tetris().snapshot();

    runner.run([
        InputAction::MoveLeft,
        InputAction::Rotate,
        InputAction::SoftDrop,
        InputAction::Elapse(5_000),
        InputAction::Noop,
    ]);
    assert_eq!(runner.state().phase(), GamePhase::Paused);
    assert_eq!(runner.state().tetris().snapshot(), before);
}
