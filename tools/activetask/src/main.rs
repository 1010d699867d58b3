use std::thread;
use std::time::Duration;

use activetask::config::TrackerConfig;
use activetask::format::format_duration_ms;
use activetask::reminder::ReminderTimer;
use activetask::{ActiveTask, Clock, FileBackend, SystemClock, TaskController, TaskStore, Transition};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

const REMINDER_POLL: Duration = Duration::from_millis(500);

#[derive(Debug, Parser)]
#[command(name = "activetask")]
#[command(about = "Track time spent on the task at hand")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start a task, check in if it is already current, or switch to it.
    Start { name: String },
    /// Check in on the current task.
    Working,
    /// Record that the time since the last check-in was lost to distraction.
    Distracted,
    /// Show the current task.
    Status,
    /// List today's tasks.
    Today,
    /// Ring the terminal bell whenever a check-in is due.
    Remind {
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

type Controller = TaskController<FileBackend, SystemClock>;

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = TrackerConfig::from_env();
    let backend = FileBackend::open(&config.state_dir)
        .with_context(|| format!("Failed to open task storage at {}", config.state_dir.display()))?;
    let mut controller = TaskController::new(TaskStore::new(backend), SystemClock);

    match cli.command {
        Commands::Start { name } => cmd_start(&mut controller, &name),
        Commands::Working => cmd_transition(controller.still_working()),
        Commands::Distracted => cmd_transition(controller.distracted()),
        Commands::Status => cmd_status(&controller),
        Commands::Today => cmd_today(&controller),
        Commands::Remind { interval_secs } => {
            let interval_ms = interval_secs
                .map(reminder_interval_ms)
                .unwrap_or(config.reminder_interval_ms);
            cmd_remind(&controller, interval_ms)
        }
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

fn cmd_start(controller: &mut Controller, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Task name must not be empty");
    }
    let transition = controller
        .start_or_switch(name)
        .with_context(|| format!("Failed to start task {name}"))?;
    if let Transition::Switched { archived } = &transition {
        println!("Archived previous task as {archived}");
    }
    cmd_transition(Ok(transition))?;
    cmd_status(controller)
}

fn cmd_transition(result: activetask::error::Result<Transition>) -> Result<()> {
    match result.context("Failed to update the current task")? {
        Transition::NoCurrentTask => println!("No current task"),
        Transition::Started => println!("Started"),
        Transition::CheckedIn => println!("Checked in"),
        Transition::MarkedDistracted => println!("Marked distracted"),
        Transition::Switched { .. } => println!("Switched"),
    }
    Ok(())
}

fn cmd_status(controller: &Controller) -> Result<()> {
    match controller.current_task().context("Failed to read the current task")? {
        Some(task) => println!("{}", render_task(&task)),
        None => println!("No current task"),
    }
    Ok(())
}

fn cmd_today(controller: &Controller) -> Result<()> {
    let tasks = controller.today().context("Failed to read today's tasks")?;
    if tasks.is_empty() {
        println!("No Task");
        return Ok(());
    }
    for task in &tasks {
        println!("{}", render_task(task));
    }
    Ok(())
}

fn cmd_remind(controller: &Controller, interval_ms: i64) -> Result<()> {
    let mut timer = ReminderTimer::new(interval_ms);
    // The first poll would fire immediately; start counting from now instead.
    timer.poll(controller.clock().now_ms());
    loop {
        thread::sleep(REMINDER_POLL);
        if timer.poll(controller.clock().now_ms()) {
            let label = controller
                .current_task()
                .context("Failed to read the current task")?
                .map(|task| task.name)
                .unwrap_or_else(|| "no task".to_string());
            println!("\x07Check in: {label}");
        }
    }
}

fn reminder_interval_ms(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1_000)).unwrap_or(i64::MAX)
}

fn render_task(task: &ActiveTask) -> String {
    let marker = if task.distracted { " (distracted)" } else { "" };
    format!(
        "{}  {}  distracted {}{}",
        task.name,
        format_duration_ms(task.task_length),
        format_duration_ms(task.time_distracted),
        marker
    )
}
