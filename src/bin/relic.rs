//! Relic CLI binary
//!
//! Command-line interface for the relic version-control engine. A failed
//! command reports its error and still exits 0; only an integrity-check
//! failure or an unparsable command line exits 1.

use clap::Parser;
use relic::cli::{Cli, Commands, RunContext};
use relic::config::ConfigLoader;
use relic::logging::{init_logging, LoggingConfig};
use relic::CONTROL_DIR;
use std::process;
use tracing::{debug, error};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("failed to initialize logging: {}", e);
        process::exit(1);
    }

    debug!("relic CLI starting");

    let context = RunContext::new(cli.workdir.clone());
    match context.execute(&cli.command) {
        Ok(output) => {
            print!("{}", output);
        }
        Err(e) => {
            error!("command failed: {}", e);
            eprintln!("error: {}", e);
            if matches!(cli.command, Commands::VerifyIntegrity) {
                process::exit(1);
            }
        }
    }
}

/// Build logging configuration from CLI args, environment, and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = ConfigLoader::load(&cli.workdir.join(CONTROL_DIR))
        .ok()
        .map(|c| c.logging)
        .unwrap_or_default();

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }

    config
}
