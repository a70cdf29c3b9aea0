//! Entry point wiring that parses the command line, loads `.rp5rc`, and lets the
//! runner dispatch. Launch actions come back as a `Handoff`, which is the only
//! place the process is actually replaced.

mod cli;
mod create;
mod error;
mod export;
mod java_args;
mod launch;
mod paths;
mod platform;
mod runner;
mod setup;

use std::env;
use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use rp5config::Rp5Config;
use tracing_subscriber::EnvFilter;

use cli::Options;
use error::RunnerError;
use paths::InstallPaths;
use runner::{Action, Outcome, Runner};

fn main() -> Result<ExitCode> {
    initialise_tracing();

    let args = match cli::decode_args(env::args_os().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            return Ok(ExitCode::FAILURE);
        }
    };
    let options = Options::parse(args);
    let paths = InstallPaths::discover()?;
    let action = Action::from_keyword(options.action.as_deref());
    let config = match load_config(&paths) {
        Ok(config) => config,
        Err(err) if !action.reads_config() => {
            let reason = format!("{err:#}");
            tracing::warn!(error = %reason, "ignoring unreadable configuration");
            Rp5Config::default()
        }
        Err(err) => return Err(err),
    };
    let cwd = env::current_dir().context("failed to read the working directory")?;
    tracing::debug!(
        root = %paths.root().display(),
        config = ?paths.config_file(),
        cwd = %cwd.display(),
        "resolved rp5 paths"
    );

    let mut runner = Runner::new(options, config, paths, cwd, platform::host_os());
    let outcome = {
        let mut out = io::stdout().lock();
        runner.execute(&mut out)
    };

    match outcome {
        Ok(Outcome::Done) => Ok(ExitCode::SUCCESS),
        Ok(Outcome::Handoff(handoff)) => {
            let program = handoff.program.clone();
            let err = handoff.exec();
            Err(err).with_context(|| format!("failed to launch {program}"))
        }
        Err(err) => match err.downcast_ref::<RunnerError>() {
            Some(runner_err) if runner_err.is_missing_resource() => {
                eprintln!("{runner_err}");
                Ok(ExitCode::FAILURE)
            }
            _ => Err(err),
        },
    }
}

fn load_config(paths: &InstallPaths) -> Result<Rp5Config> {
    let Some(path) = paths.config_file() else {
        return Ok(Rp5Config::default());
    };
    Rp5Config::load_or_default(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
