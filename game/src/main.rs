use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use engine::HeadlessRunner;
use game::logic::{InputAction, TetrisLogic};
use game::settings::SettingsStore;
use game::state::GameState;

#[derive(Debug, Parser)]
#[command(name = "game")]
#[command(about = "Headless block-stacking game runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Play a scripted session and print the final board.
    Play {
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 400)]
        ticks: usize,
        #[arg(long, default_value_t = 3)]
        rotate_every: usize,
    },
    /// Show the effective settings and where they are loaded from.
    Settings,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let store = SettingsStore::from_env();

    match cli.command {
        Commands::Play {
            seed,
            ticks,
            rotate_every,
        } => cmd_play(&store, seed, ticks, rotate_every),
        Commands::Settings => cmd_settings(&store),
    }
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn cmd_play(store: &SettingsStore, seed: Option<u64>, ticks: usize, rotate_every: usize) -> Result<()> {
    let mut settings = store.load();
    if let Some(seed) = seed {
        settings.gameplay.seed = seed;
    }
    let interval = settings.gameplay.gravity_interval_ms;
    let mut runner = HeadlessRunner::new(TetrisLogic::new(settings));

    runner.step(InputAction::Start);
    for tick in 0..ticks {
        runner.run(scripted_inputs(tick, rotate_every));
        runner.step(InputAction::Elapse(interval));
        if runner.state().tetris().is_game_over() {
            break;
        }
    }

    print!("{}", render_ascii(runner.state()));
    Ok(())
}

/// A fixed, seed-independent input pattern that spreads pieces across the board.
fn scripted_inputs(tick: usize, rotate_every: usize) -> Vec<InputAction> {
    let mut inputs = Vec::new();
    if rotate_every > 0 && tick % rotate_every == 0 {
        inputs.push(InputAction::Rotate);
    }
    match tick % 7 {
        0 | 1 => inputs.push(InputAction::MoveLeft),
        2 | 3 | 4 => inputs.push(InputAction::MoveRight),
        _ => inputs.push(InputAction::SoftDrop),
    }
    inputs
}

fn render_ascii(state: &GameState) -> String {
    let core = state.tetris();
    let mut out = String::new();
    for row in core.board_with_active_piece() {
        out.push('|');
        for cell in row {
            out.push(if cell.is_some() { '#' } else { '.' });
        }
        out.push_str("|\n");
    }
    out.push_str(&format!(
        "phase {:?} score {} lines {}\n",
        state.phase(),
        core.score(),
        core.lines_cleared()
    ));
    out
}

fn cmd_settings(store: &SettingsStore) -> Result<()> {
    let settings = store.load();
    let json = serde_json::to_string_pretty(&settings).context("Failed to encode settings")?;
    println!("{}", store.path().display());
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use game::settings::GameSettings;

    #[test]
    fn render_ascii_draws_one_line_per_row_plus_status() {
        let state = GameState::from_settings(&GameSettings::default());
        let text = render_ascii(&state);
        assert_eq!(text.lines().count(), 21);
        assert!(text.starts_with("|..........|"));
        assert!(text.ends_with("phase NotStarted score 0 lines 0\n"));
    }
}
