// Pocket Shell binary
//
// Parses the command line, loads configuration, wires up tracing and hands
// control to the shell's main loop.

use anyhow::Result;
use pocket_shell::cli::{self, RunArgs};
use pocket_shell::config::{Config, LogRotation};
use pocket_shell::display::{restore_terminal, Display, TerminalDisplay};
use pocket_shell::gfx::Size;
use pocket_shell::logging::{LogBuffer, ShellLogLayer};
use pocket_shell::{Shell, ShellError};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn main() {
    // Handle CLI commands first (apps, config --show, --reset, --path)
    let Some(args) = cli::handle_cli() else {
        return;
    };

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            e.report();
            std::process::exit(1);
        }
    };
    if args.headless {
        config.display.headless = true;
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let logs = LogBuffer::new();
    let _file_guard = init_tracing(&config, &logs);
    install_panic_hook(config.display.headless);

    if let Err(e) = run(config, logs, &args) {
        restore_terminal();
        let fatal = e.downcast_ref::<ShellError>().is_some_and(ShellError::is_fatal);
        tracing::error!(error = %format!("{:#}", e), fatal, "Shell terminated");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(config: Config, logs: LogBuffer, args: &RunArgs) -> Result<()> {
    let mut shell = if config.display.headless {
        let (shell, _display) = Shell::headless(config, logs);
        shell
    } else {
        let screen = Size::new(config.display.width, config.display.height);
        let display: Box<dyn Display> = Box::new(TerminalDisplay::new(screen)?);
        Shell::new(config, display, logs)
    };

    tracing::info!(version = pocket_shell::config::VERSION, "Starting pocket-shell");
    if let Err(e) = shell.boot(args.app.as_deref()) {
        shell.shutdown();
        return Err(e);
    }

    // Headless runs have nobody to press quit
    let frames = match (shell.config().display.headless, args.frames) {
        (true, None) => Some(300),
        (_, frames) => frames,
    };
    shell.run(frames)
}

/// Tracing subscriber setup
///
/// - terminal mode: capture logs to the in-memory buffer (prevents garbling
///   the alternate screen); error reports embed its tail
/// - headless mode: logs go to stdout
/// - file logging: optional JSON lines in a rotating file, in addition
///
/// Precedence: RUST_LOG env var > config file > default "info"
fn init_tracing(config: &Config, logs: &LogBuffer) -> Option<WorkerGuard> {
    let default_filter = format!("pocket_shell={}", config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let console = if config.display.headless {
        tracing_subscriber::fmt::layer().boxed()
    } else {
        ShellLogLayer::new(logs.clone()).boxed()
    };

    // The guard must be kept alive for the duration of the program to ensure logs flush
    let (file_layer, guard) = match file_writer(config) {
        Some((writer, guard)) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false),
            ),
            Some(guard),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();
    guard
}

fn file_writer(config: &Config) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let logging = &config.logging;
    if !logging.file_enabled {
        return None;
    }
    if let Err(e) = std::fs::create_dir_all(&logging.file_dir) {
        eprintln!(
            "Warning: Could not create log directory {:?}: {}",
            logging.file_dir, e
        );
        return None;
    }

    let appender = match logging.file_rotation {
        LogRotation::Hourly => tracing_appender::rolling::hourly(&logging.file_dir, &logging.file_prefix),
        LogRotation::Daily => tracing_appender::rolling::daily(&logging.file_dir, &logging.file_prefix),
        LogRotation::Never => tracing_appender::rolling::never(&logging.file_dir, &logging.file_prefix),
    };
    // Writes happen on a background thread
    Some(tracing_appender::non_blocking(appender))
}

/// Panics inside handlers and task bodies are caught and recovered from, so
/// the hook only records them. The default hook would print over the
/// alternate screen, so it only runs in headless mode.
fn install_panic_hook(headless: bool) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        tracing::error!(location = %location, "Panic: {}", pocket_shell::util::panic_message(info.payload()));
        if headless {
            default_hook(info);
        }
    }));
}
