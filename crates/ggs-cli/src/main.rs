//! `ggs`: command-line control for Spider Farmer GGS grow-light controllers.

mod cli;
mod commands;
mod config;
mod format;
mod style;
mod util;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use config::Config;

/// Exit status after an operator interrupt.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "ggs", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    init_tracing(&cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if util::is_cancelled(&e) => {
            eprintln!("Interrupted.");
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing(cli: &Cli) {
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Config::path);
    let config = Config::load(&config_path);
    let no_color = cli.no_color || config.no_color;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Control {
            device,
            on,
            level,
            status_only,
            pull_status_after,
            wait,
        } => {
            let cancel = util::interrupt_token();
            let args = commands::ControlArgs {
                on,
                level,
                status_only,
                pull_status_after,
            };
            commands::cmd_control(&device, args, wait, &config, no_color, quiet, &cancel).await
        }
        Commands::Console { device } => {
            let cancel = util::interrupt_token();
            commands::cmd_console(&device, &config, no_color, quiet, &cancel).await
        }
        Commands::Listen { device } => {
            let cancel = util::interrupt_token();
            commands::cmd_listen(&device, &config, no_color, quiet, &cancel).await
        }
        Commands::Scan { timeout, name } => {
            commands::cmd_scan(timeout, name, &config, no_color, quiet).await
        }
        Commands::Config { action } => commands::cmd_config(action, &config_path, &config),
        Commands::Completions { .. } => Ok(()),
    }
}
