use engine::FixedStep;
use serde::{Deserialize, Serialize};

use crate::settings::GameSettings;
use crate::tetris_core::{TetrisCore, TickOutcome};

pub const DEFAULT_GRAVITY_INTERVAL_MS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    NotStarted,
    Running,
    Paused,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameInput {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
}

/// One game session: the placement engine plus its lifecycle and gravity cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    phase: GamePhase,
    tetris: TetrisCore,
    gravity: FixedStep,
    width: usize,
    height: usize,
    seed: u64,
    games_started: u64,
}

impl GameState {
    pub fn new(width: usize, height: usize, seed: u64, gravity_interval_ms: u32) -> Self {
        Self {
            phase: GamePhase::NotStarted,
            tetris: TetrisCore::with_size(width, height, seed),
            gravity: FixedStep::new(gravity_interval_ms),
            width,
            height,
            seed,
            games_started: 0,
        }
    }

    pub fn from_settings(settings: &GameSettings) -> Self {
        Self::new(
            settings.board.width,
            settings.board.height,
            settings.gameplay.seed,
            settings.gameplay.gravity_interval_ms,
        )
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn tetris(&self) -> &TetrisCore {
        &self.tetris
    }

    pub fn tetris_mut(&mut self) -> &mut TetrisCore {
        &mut self.tetris
    }

    pub fn gravity_interval_ms(&self) -> u32 {
        self.gravity.interval_ms()
    }

    /// Starts a fresh game with an empty board. Ignored while already running.
    pub fn start(&mut self) -> bool {
        if self.phase == GamePhase::Running {
            return false;
        }
        // Each new game gets its own piece sequence, reproducible from the base seed.
        let seed = self.seed.wrapping_add(self.games_started);
        self.tetris = TetrisCore::with_size(self.width, self.height, seed);
        self.games_started += 1;
        self.gravity.reset();
        self.phase = GamePhase::Running;
        tracing::debug!(seed, "game started");
        true
    }

    pub fn toggle_pause(&mut self) -> GamePhase {
        match self.phase {
            GamePhase::Running => {
                self.phase = GamePhase::Paused;
            }
            GamePhase::Paused => {
                self.gravity.reset();
                self.phase = GamePhase::Running;
            }
            GamePhase::NotStarted | GamePhase::GameOver => {}
        }
        self.phase
    }

    /// Runs every gravity tick that falls due within `dt_ms`. Returns how many ran.
    pub fn advance(&mut self, dt_ms: u32) -> u32 {
        if self.phase != GamePhase::Running {
            return 0;
        }
        let due = self.gravity.advance(dt_ms);
        for ran in 0..due {
            if self.tetris.tick() == TickOutcome::GameOver {
                self.phase = GamePhase::GameOver;
                self.gravity.reset();
                return ran + 1;
            }
        }
        due
    }

    /// Applies a player input. Only acts while running with a piece in play.
    pub fn apply(&mut self, input: GameInput) -> bool {
        if self.phase != GamePhase::Running || self.tetris.active_piece().is_none() {
            return false;
        }
        match input {
            GameInput::MoveLeft => self.tetris.move_left(),
            GameInput::MoveRight => self.tetris.move_right(),
            GameInput::SoftDrop => self.tetris.soft_drop(),
            GameInput::Rotate => self.tetris.rotate_active(),
        }
    }
}
