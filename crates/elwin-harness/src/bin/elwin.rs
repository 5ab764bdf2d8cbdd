//! CLI entrypoint for elwin operator tooling.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use elwin_core::example::example_namespaces;
use elwin_core::storage::ConfigDocument;
use elwin_core::structured_log::LogEmitter;
use elwin_core::{EngineConfig, JsonFileStore, Refresher, Registry, Storage};
use elwin_harness::{ConfigReport, OutputFormat, build_units, load_namespaces, render};

/// Deterministic experiment assignment from the command line.
#[derive(Debug, Parser)]
#[command(name = "elwin")]
#[command(about = "Resolve, validate and watch elwin experiment configuration")]
struct Cli {
    /// Hash salt (defaults to $ELWIN_SALT, then "choices").
    #[arg(long, global = true)]
    salt: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve one caller's assignments.
    Resolve {
        /// Configuration document (if omitted, the built-in example is used).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Team whose namespaces are evaluated.
        #[arg(long)]
        team: String,
        /// Value for the `userid` unit.
        #[arg(long)]
        user: Option<String>,
        /// Extra unit as key=value (repeatable).
        #[arg(long = "unit")]
        units: Vec<String>,
        /// Output format: `json` or `plain`.
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// Parse and validate a configuration document.
    Validate {
        #[arg(long)]
        config: PathBuf,
        /// Output format: `json` or `plain`.
        #[arg(long, default_value = "plain")]
        format: String,
    },
    /// Write the built-in example configuration document.
    ExampleConfig {
        /// Output path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Refresh from a configuration file in the background and print the
    /// caller's assignments whenever they change.
    Watch {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        team: String,
        #[arg(long)]
        user: Option<String>,
        #[arg(long = "unit")]
        units: Vec<String>,
        /// Refresh interval in milliseconds (defaults to $ELWIN_REFRESH_INTERVAL_MS, then 5000).
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Exit after printing this many assignment changes.
        #[arg(long)]
        max_updates: Option<u64>,
        /// Structured JSONL log path (if omitted, logs go to stderr).
        #[arg(long)]
        log: Option<PathBuf>,
        /// Output format: `json` or `plain`.
        #[arg(long, default_value = "plain")]
        format: String,
    },
}

fn engine_config(salt: Option<String>) -> EngineConfig {
    let config = EngineConfig::from_env();
    match salt {
        Some(salt) => config.with_salt(salt),
        None => config,
    }
}

fn write_or_print(output: Option<&Path>, body: &str) -> std::io::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, body)?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{body}"),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = engine_config(cli.salt);

    match cli.command {
        Command::Resolve {
            config: path,
            team,
            user,
            units,
            format,
        } => {
            let format: OutputFormat = format.parse()?;
            let units = build_units(user.as_deref(), &units)?;
            let namespaces = match path {
                Some(path) => load_namespaces(&path)?,
                None => example_namespaces()?,
            };
            let registry = Registry::new(config);
            let generation = registry.publish(namespaces)?;
            let response = registry.namespaces(&team, &units)?;
            println!(
                "{}",
                render::render_response(&team, generation, &response, format)?
            );
        }
        Command::Validate {
            config: path,
            format,
        } => {
            let format: OutputFormat = format.parse()?;
            let namespaces = load_namespaces(&path)?;
            // Cross-namespace checks live in snapshot construction.
            Registry::new(config).publish(namespaces.clone())?;
            print!("{}", ConfigReport::from_namespaces(&namespaces).render(format)?);
        }
        Command::ExampleConfig { output } => {
            let doc = ConfigDocument::from_namespaces(&example_namespaces()?);
            let mut body = doc.to_json_pretty()?;
            body.push('\n');
            write_or_print(output.as_deref(), &body)?;
        }
        Command::Watch {
            config: path,
            team,
            user,
            units,
            interval_ms,
            max_updates,
            log,
            format,
        } => {
            let format: OutputFormat = format.parse()?;
            let units = build_units(user.as_deref(), &units)?;
            let interval = interval_ms
                .filter(|&ms| ms > 0)
                .map_or(config.refresh_interval(), Duration::from_millis);
            let emitter = match &log {
                Some(log) => LogEmitter::to_file(log, "watch")?,
                None => LogEmitter::to_stderr("watch"),
            };

            let registry = Arc::new(Registry::new(config).with_emitter(emitter));
            let store: Arc<dyn Storage> = Arc::new(JsonFileStore::open(&path)?);
            registry.refresh(store.as_ref())?;
            let refresher = Refresher::spawn(Arc::clone(&registry), store, interval)?;

            let mut printed = 0u64;
            let mut last_generation = 0u64;
            let mut last_response = None;
            loop {
                let snapshot = registry.snapshot();
                if snapshot.generation() != last_generation {
                    last_generation = snapshot.generation();
                    let response = snapshot.resolve(registry.config().salt(), &team, &units)?;
                    if last_response.as_ref() != Some(&response) {
                        println!(
                            "{}",
                            render::render_response(&team, last_generation, &response, format)?
                        );
                        last_response = Some(response);
                        printed += 1;
                        if max_updates.is_some_and(|max| printed >= max) {
                            break;
                        }
                    }
                }
                std::thread::sleep(interval);
            }
            let attempts = refresher.stop();
            eprintln!(
                "Watch finished: updates={printed}, generation={last_generation}, refresh_attempts={attempts}"
            );
        }
    }

    Ok(())
}
