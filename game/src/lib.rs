pub mod logic;
pub mod settings;
pub mod state;
pub mod tetris_core;
