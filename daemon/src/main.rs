//! NXD daemon: deploys an engine from configuration and replays call scripts.

mod script;

use anyhow::Context;
use clap::Parser;
use nxd_engine::{Engine, EngineConfig};
use nxd_types::Timestamp;
use nxd_utils::LogFormat;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nxd-daemon", about = "NXD token engine local harness")]
struct Cli {
    /// Path to a TOML deployment file. Built-in defaults are used without one.
    #[arg(long, env = "NXD_CONFIG")]
    config: Option<PathBuf>,

    /// Log format: "human" or "json". Overrides the config file.
    #[arg(long, env = "NXD_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error". Overrides the
    /// config file.
    #[arg(long, env = "NXD_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the effective configuration as TOML.
    Config,
    /// Deploy, run a JSON call script and print the outcome as JSON.
    Replay {
        /// Call script to replay.
        script: PathBuf,

        /// Block time of the deployment, in Unix seconds.
        #[arg(long, default_value_t = 0)]
        deployed_at: u64,

        /// Stop at the first rejected call.
        #[arg(long)]
        fail_fast: bool,
    },
}

#[derive(Serialize)]
struct Report<'a> {
    outcomes: Vec<script::Outcome>,
    halted: Option<&'a str>,
    state: &'a nxd_engine::EngineState,
    events: &'a [nxd_engine::EventRecord],
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    nxd_utils::init_logging(config.log_format, &config.log_level);

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
        Command::Replay {
            script,
            deployed_at,
            fail_fast,
        } => {
            let json = std::fs::read_to_string(&script)
                .with_context(|| format!("reading {}", script.display()))?;
            let steps = script::parse(&json)?;

            let mut engine = Engine::deploy(&config, Timestamp::new(deployed_at))?;
            tracing::info!(steps = steps.len(), "replaying call script");

            let mut outcomes = Vec::with_capacity(steps.len());
            for (index, step) in steps.iter().enumerate() {
                let outcome = script::apply(&mut engine, index, step)?;
                let rejected = !outcome.ok;
                outcomes.push(outcome);
                if rejected && fail_fast {
                    break;
                }
            }
            let failed = outcomes.iter().filter(|o| !o.ok).count();
            tracing::info!(applied = outcomes.len(), failed, "replay finished");

            let report = Report {
                outcomes,
                halted: engine.halt_reason(),
                state: engine.state(),
                events: engine.events(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
