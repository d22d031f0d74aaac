mod animations;
mod config;
mod export;
mod landing;
mod render;
mod terminal;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use config::Config;
use export::{ExportOptions, Exporter};
use render::properties::WindowSize;
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};
use terminal::{draw::CellMetrics, PlayOutcome, TerminalPlayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "HORIZON_LOG";

/// Plays the MovieVerse landing reveal: a starfield and a glowing event horizon.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// The path to the configuration file.
    #[arg(short, long, global = true, env = "HORIZON_CONFIG")]
    config: Option<PathBuf>,

    /// Write logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Seed the star placement so runs are reproducible.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Print the JSON schema of the configuration file and exit.
    #[cfg(feature = "json-schema")]
    #[arg(long)]
    generate_config_schema: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Play the animation in the terminal (the default).
    Play {
        /// Virtual pixels per terminal column.
        #[arg(long, default_value_t = 10)]
        cell_width: u32,

        /// Virtual pixels per terminal row.
        #[arg(long, default_value_t = 20)]
        cell_height: u32,
    },

    /// Render the animation to a GIF.
    Export {
        path: PathBuf,

        #[command(flatten)]
        viewport: ViewportArgs,

        #[arg(long, default_value_t = 30)]
        fps: u32,

        /// How much of the animation to render.
        #[arg(long, default_value_t = 4000)]
        duration_ms: u64,
    },

    /// Render a single frame to a PNG and print the animation state at that time.
    Snapshot {
        path: PathBuf,

        #[command(flatten)]
        viewport: ViewportArgs,

        /// Time since the animation started.
        #[arg(long, default_value_t = 3000)]
        at_ms: u64,
    },
}

#[derive(Args)]
struct ViewportArgs {
    #[arg(long, default_value_t = 1920)]
    width: u32,

    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Output size relative to the viewport.
    #[arg(long, default_value_t = 0.5)]
    scale: f32,
}

impl ViewportArgs {
    fn options(&self, fps: u32, duration: Duration, seed: Option<u64>) -> ExportOptions {
        ExportOptions { window: WindowSize::new(self.width, self.height), fps, duration, scale: self.scale, seed }
    }
}

/// Where log lines go, if anywhere.
#[derive(Debug, PartialEq, Eq)]
enum LogTarget<'a> {
    File(&'a Path),
    Stderr,
    Disabled,
}

impl<'a> LogTarget<'a> {
    fn select(log_file: Option<&'a Path>, interactive: bool) -> Self {
        match log_file {
            Some(path) => Self::File(path),
            // The terminal belongs to the player while it runs.
            None if interactive => Self::Disabled,
            None => Self::Stderr,
        }
    }
}

fn init_logging(target: LogTarget) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let result = match target {
        LogTarget::File(path) => {
            let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
            tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        LogTarget::Stderr => tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init(),
        LogTarget::Disabled => return Ok(()),
    };
    result.map_err(anyhow::Error::msg).context("installing log subscriber")
}

fn run(cli: Cli) -> anyhow::Result<()> {
    #[cfg(feature = "json-schema")]
    if cli.generate_config_schema {
        let schema = schemars::schema_for!(Config);
        println!("{}", serde_json::to_string_pretty(&schema).context("serializing schema")?);
        return Ok(());
    }

    let command = cli.command.unwrap_or(Command::Play { cell_width: 10, cell_height: 20 });
    init_logging(LogTarget::select(cli.log_file.as_deref(), matches!(command, Command::Play { .. })))?;

    let (config, source) = Config::discover(cli.config.as_deref()).context("loading configuration")?;
    match &source {
        Some(path) => info!("using configuration from {}", path.display()),
        None => info!("using default configuration"),
    }

    match command {
        Command::Play { cell_width, cell_height } => {
            anyhow::ensure!(cell_width > 0 && cell_height > 1, "cells must be at least 1x2 virtual pixels");
            let metrics = CellMetrics { width: cell_width, height: cell_height };
            let outcome = TerminalPlayer::new(config, metrics, cli.seed).run().context("playing in the terminal")?;
            if let PlayOutcome::Navigate(route) = outcome {
                println!("{route}");
            }
        }
        Command::Export { path, viewport, fps, duration_ms } => {
            let options = viewport.options(fps, Duration::from_millis(duration_ms), cli.seed);
            let frames = Exporter::new(config)
                .export_gif(&path, &options)
                .with_context(|| format!("exporting to {}", path.display()))?;
            eprintln!("[horizon] wrote {frames} frames to {}", path.display());
        }
        Command::Snapshot { path, viewport, at_ms } => {
            let options = viewport.options(1, Duration::ZERO, cli.seed);
            let summary = Exporter::new(config)
                .snapshot(&path, Duration::from_millis(at_ms), &options)
                .with_context(|| format!("writing snapshot to {}", path.display()))?;
            println!("{}", serde_json::to_string_pretty(&summary).context("serializing summary")?);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    run(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_play() {
        let cli = Cli::try_parse_from(["horizon"]).expect("parse failed");
        assert!(cli.command.is_none());
    }

    #[test]
    fn log_target_keeps_the_terminal_clean() {
        let path = Path::new("horizon.log");
        assert_eq!(LogTarget::select(None, true), LogTarget::Disabled);
        assert_eq!(LogTarget::select(None, false), LogTarget::Stderr);
        assert_eq!(LogTarget::select(Some(path), true), LogTarget::File(path));
    }

    #[test]
    fn second_subscriber_is_reported() {
        let directory = tempfile::tempdir().expect("temp dir");
        let first = directory.path().join("first.log");
        let second = directory.path().join("second.log");
        // Other tests may have installed the global subscriber already; only the second call is certain to fail.
        let _ = init_logging(LogTarget::File(&first));
        let error = init_logging(LogTarget::File(&second)).expect_err("installed twice");
        assert!(error.to_string().contains("installing log subscriber"));
        assert!(init_logging(LogTarget::Disabled).is_ok());
    }

    #[test]
    fn export_arguments() {
        let cli = Cli::try_parse_from(["horizon", "export", "out.gif", "--fps", "12", "--scale", "0.25", "--seed", "4"])
            .expect("parse failed");
        let Some(Command::Export { path, viewport, fps, duration_ms }) = cli.command else {
            panic!("not an export");
        };
        assert_eq!(path, PathBuf::from("out.gif"));
        assert_eq!((viewport.width, viewport.height, viewport.scale), (1920, 1080, 0.25));
        assert_eq!((fps, duration_ms), (12, 4000));
        assert_eq!(cli.seed, Some(4));
    }
}
