use engine::GameLogic;

use crate::settings::GameSettings;
use crate::state::{GameInput, GameState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Noop,
    Start,
    TogglePause,
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
    /// Wall-clock time passing, in milliseconds.
    Elapse(u32),
}

#[derive(Debug, Clone)]
pub struct TetrisLogic {
    settings: GameSettings,
}

impl TetrisLogic {
    pub fn new(settings: GameSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }
}

impl GameLogic for TetrisLogic {
    type State = GameState;
    type Input = InputAction;

    fn initial_state(&self) -> Self::State {
        GameState::from_settings(&self.settings)
    }

    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State {
        let mut next = state.clone();

        match input {
            InputAction::Noop => {}
            InputAction::Start => {
                next.start();
            }
            InputAction::TogglePause => {
                next.toggle_pause();
            }
            InputAction::MoveLeft => {
                next.apply(GameInput::MoveLeft);
            }
            InputAction::MoveRight => {
                next.apply(GameInput::MoveRight);
            }
            InputAction::SoftDrop => {
                next.apply(GameInput::SoftDrop);
            }
            InputAction::Rotate => {
                next.apply(GameInput::Rotate);
            }
            InputAction::Elapse(dt_ms) => {
                next.advance(dt_ms);
            }
        }

        next
    }
}
