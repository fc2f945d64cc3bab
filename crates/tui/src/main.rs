mod app;
mod events;
mod persist;
mod strings;
mod terminal;
mod theme;
mod ui;

use anyhow::Result;
use terminal::TerminalGuard;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

// Logs go to a daily file under the data dir; the terminal belongs to the UI.
fn init_logging() -> Option<WorkerGuard> {
    let dir = mathmex_core::settings::data_dir()?.join("logs");
    std::fs::create_dir_all(&dir).ok()?;
    let appender = tracing_appender::rolling::daily(dir, "mathmex.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_env("MATHMEX_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .ok()?;
    Some(guard)
}

fn main() -> Result<()> {
    let _log_guard = init_logging();
    info!(target: "tui", "mathmex {} starting", env!("CARGO_PKG_VERSION"));
    let mut app = app::App::new();
    let mut term = TerminalGuard::new()?;
    events::run(&mut term.terminal, &mut app)
}
