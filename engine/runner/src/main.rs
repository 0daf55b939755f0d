//! Spiral Runner - Headless Terminal Surface
//!
//! Runs one spiral session in the terminal. Each stdin line is a command
//! (`help` lists them); engine messages are printed to stdout as they happen.
//! Logs go to stderr so stdout stays the narrative.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults
//! spiral-runner
//!
//! # Reproducible run with a faster heartbeat
//! spiral-runner --seed 42 --tick-ms 50
//!
//! # Slow typist, fast spiral
//! spiral-runner --typing-ms 1000,3000 --spiral-period-secs 5
//!
//! # Machine-readable output, end automatically after five minutes
//! spiral-runner --json --duration-secs 300
//!
//! # Verbose logging
//! RUST_LOG=debug spiral-runner
//! ```
//!
//! Closing stdin ends the session unless `--duration-secs` is set.
//!
//! # Signals
//!
//! - `SIGINT` (Ctrl-C): end the session and print the final view

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use spiral_core::{
    default_config_path, load_config_from_path, ConfigOverrides, Session, SessionRuntime,
    SurfaceEvent,
};

use commands::{Command, CommandError};
use output::Printer;

/// Spiral Runner - drive a spiral session from the terminal
#[derive(Parser, Debug)]
#[command(name = "spiral-runner")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "SPIRAL_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fixed RNG seed for a reproducible session
    #[arg(short = 's', long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "SPIRAL_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Heartbeat interval in milliseconds
    #[arg(long, value_name = "MS")]
    tick_ms: Option<u64>,

    /// Narrator typing delay range in milliseconds
    #[arg(long, value_name = "MIN,MAX", value_parser = parse_typing_range)]
    typing_ms: Option<(u64, u64)>,

    /// Seconds between spiral ticks
    #[arg(long, value_name = "SECS")]
    spiral_period_secs: Option<u64>,

    /// Scale applied to text scrambling
    #[arg(long, value_name = "X")]
    scramble_multiplier: Option<f64>,

    /// End the session after this many seconds of session time
    #[arg(long, value_name = "SECS")]
    duration_secs: Option<u64>,

    /// Print messages and views as JSON lines
    #[arg(long)]
    json: bool,
}

/// Parse `MIN,MAX` milliseconds
fn parse_typing_range(s: &str) -> Result<(u64, u64), String> {
    let (min, max) = s
        .split_once(',')
        .ok_or_else(|| format!("expected MIN,MAX, got `{s}`"))?;
    let min = min
        .trim()
        .parse()
        .map_err(|e| format!("invalid minimum `{min}`: {e}"))?;
    let max = max
        .trim()
        .parse()
        .map_err(|e| format!("invalid maximum `{max}`: {e}"))?;
    Ok((min, max))
}

/// Command-line overrides, applied over file and environment
fn overrides(args: &Args) -> ConfigOverrides {
    let mut overrides = ConfigOverrides::new();
    if let Some(seed) = args.seed {
        overrides = overrides.with_seed(seed);
    }
    if let Some(ms) = args.tick_ms {
        overrides = overrides.with_tick_interval_ms(ms);
    }
    if let Some((min, max)) = args.typing_ms {
        overrides = overrides.with_typing_delay_ms(min, max);
    }
    if let Some(secs) = args.spiral_period_secs {
        overrides = overrides.with_spiral_period_secs(secs);
    }
    if let Some(multiplier) = args.scramble_multiplier {
        overrides = overrides.with_scramble_multiplier(multiplier);
    }
    overrides
}

/// Initialize logging with the specified level
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("spiral_runner={level},spiral_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level)?;

    info!("Spiral runner starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = args.config.clone().or_else(default_config_path);
    let mut config =
        load_config_from_path(config_path).context("Failed to load configuration")?;

    overrides(&args).apply(&mut config);
    config.validate().context("Invalid configuration")?;

    info!(
        source = %config.source(),
        seed = ?config.runtime.seed,
        tick_ms = config.runtime.tick_interval.as_millis() as u64,
        "Configuration resolved"
    );

    let printer = Printer::new(args.json);
    let mut handle = SessionRuntime::spawn(Session::from_config(config));
    let mut views = handle.subscribe();
    let mut deadline_ms = args.duration_secs.map(|secs| secs.saturating_mul(1000));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    if !args.json {
        printer.banner();
    }

    loop {
        tokio::select! {
            message = handle.next_message() => match message {
                Some(message) => printer.message(&message)?,
                None => {
                    debug!("Session runtime stopped");
                    break;
                }
            },
            line = lines.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    Some(line) => match commands::parse(&line) {
                        Ok(Command::Event(event)) => {
                            if handle.send(event).await.is_err() {
                                break;
                            }
                        }
                        Ok(Command::Status) => printer.view(&handle.view())?,
                        Ok(Command::Help) => printer.help(),
                        Ok(Command::Quit) => {
                            // The runtime stops after delivering SessionEnded
                            let _ = handle.send(SurfaceEvent::EndSession).await;
                        }
                        Err(CommandError::Empty) => {}
                        Err(e) => warn!(error = %e, "Ignoring command"),
                    },
                    None => {
                        debug!("stdin closed");
                        stdin_open = false;
                        // Without a deadline nothing else would end the session
                        if deadline_ms.is_none() {
                            let _ = handle.send(SurfaceEvent::EndSession).await;
                        }
                    }
                }
            },
            changed = views.changed(), if deadline_ms.is_some() => {
                if changed.is_err() {
                    break;
                }
                let elapsed_ms = views.borrow_and_update().elapsed_ms;
                if deadline_ms.is_some_and(|deadline| elapsed_ms >= deadline) {
                    info!(elapsed_ms, "Session duration reached");
                    deadline_ms = None;
                    let _ = handle.send(SurfaceEvent::EndSession).await;
                }
            },
            _ = &mut ctrl_c => {
                info!("Received SIGINT, ending session");
                break;
            }
        }
    }

    let final_view = handle.shutdown().await.context("Session runtime failed")?;
    printer.view(&final_view)?;
    info!("Spiral runner stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use spiral_core::SessionConfig;
    use std::time::Duration;

    #[test]
    fn test_typing_range_parsing() {
        assert_eq!(parse_typing_range("200, 800"), Ok((200, 800)));
        assert!(parse_typing_range("200").is_err());
        assert!(parse_typing_range("fast,slow").is_err());
    }

    #[test]
    fn test_flags_reach_config() {
        let args = Args::try_parse_from([
            "spiral-runner",
            "--seed",
            "9",
            "--typing-ms",
            "100,300",
            "--spiral-period-secs",
            "5",
            "--scramble-multiplier",
            "2.5",
        ])
        .expect("valid args");

        let mut config = SessionConfig::default();
        overrides(&args).apply(&mut config);
        assert_eq!(config.runtime.seed, Some(9));
        assert_eq!(config.narrator.typing_delay_min, Duration::from_millis(100));
        assert_eq!(config.narrator.typing_delay_max, Duration::from_millis(300));
        assert_eq!(config.timers.spiral_period, Duration::from_secs(5));
        assert!((config.scramble_multiplier - 2.5).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }
}
