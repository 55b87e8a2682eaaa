// CLI module - command-line argument parsing and handlers
//
// - run [--headless] [--frames N] [--app NAME]: start the shell (default)
// - apps: list the builtin applications
// - config --show | --path | --reset: configuration management

use crate::apps::builtin;
use crate::config::{Config, VERSION};
use clap::{Args, Parser, Subcommand};
use std::io::Write;

/// Pocket Shell - a small-screen graphical shell
#[derive(Parser, Debug)]
#[command(name = "pocket-shell")]
#[command(version = VERSION)]
#[command(about = "Small-screen application shell with cooperative tasks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the shell (the default when no command is given)
    Run(RunArgs),

    /// List the builtin applications
    Apps,

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct RunArgs {
    /// Run without a terminal UI (in-memory display, logs to stdout)
    #[arg(long)]
    pub headless: bool,

    /// Stop after this many frames
    #[arg(long, value_name = "N")]
    pub frames: Option<u64>,

    /// Application to open after home
    #[arg(long, value_name = "NAME")]
    pub app: Option<String>,
}

/// Handle CLI commands. Returns the run arguments when the shell should
/// start, `None` when a command was handled (exit after).
pub fn handle_cli() -> Option<RunArgs> {
    dispatch(Cli::parse())
}

fn dispatch(cli: Cli) -> Option<RunArgs> {
    match cli.command {
        None => Some(RunArgs::default()),
        Some(Commands::Run(args)) => Some(args),
        Some(Commands::Apps) => {
            handle_apps();
            None
        }
        Some(Commands::Config { show, reset, path }) => {
            if path {
                handle_config_path();
            } else if show {
                handle_config_show();
            } else if reset {
                handle_config_reset();
            } else {
                println!("Usage: pocket-shell config [--show|--reset|--path]");
                println!();
                println!("Options:");
                println!("  --show    Display effective configuration");
                println!("  --reset   Reset config file to defaults");
                println!("  --path    Show config file path");
            }
            None
        }
    }
}

fn handle_apps() {
    let manifests = match builtin::manifests() {
        Ok(manifests) => manifests,
        Err(e) => {
            eprintln!("Error: builtin manifests are invalid: {:#}", e);
            std::process::exit(1);
        }
    };
    for manifest in manifests {
        println!(
            "{:<10} {:<12} v{:<5} {}",
            manifest.name,
            manifest.title(),
            manifest.version,
            manifest.description
        );
    }
}

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => {
            eprintln!("Error: Could not determine config path");
            std::process::exit(1);
        }
    }
}

fn handle_config_show() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            e.report();
            std::process::exit(1);
        }
    };

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
}

fn handle_config_reset() {
    if let Some(path) = Config::config_path().filter(|p| p.exists()) {
        eprint!("Config file exists at {}. Overwrite? [y/N] ", path.display());
        let _ = std::io::stderr().flush();

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input).is_err() || !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return;
        }
    }

    match Config::reset() {
        Ok(path) => println!("Config reset to defaults: {}", path.display()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_no_command_runs_with_defaults() {
        assert_eq!(dispatch(parse(&["pocket-shell"])), Some(RunArgs::default()));
    }

    #[test]
    fn test_run_flags() {
        let args = dispatch(parse(&["pocket-shell", "run", "--headless", "--frames", "5", "--app", "tasks"])).unwrap();
        assert!(args.headless);
        assert_eq!(args.frames, Some(5));
        assert_eq!(args.app.as_deref(), Some("tasks"));
    }

    #[test]
    fn test_config_flags_parse() {
        match parse(&["pocket-shell", "config", "--path"]).command {
            Some(Commands::Config { path, show, reset }) => {
                assert!(path);
                assert!(!show && !reset);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(Cli::try_parse_from(["pocket-shell", "run", "--frames", "many"]).is_err());
    }
}
