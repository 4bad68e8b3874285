use std::path::{Path, PathBuf};

mod ensembl;
mod fix;
mod info;
mod terminal;
mod upgrade;
mod validate;

use anyhow::Context;
use clap::ArgAction;
use ensembl::Ensembl;
use fix::Fix;
use info::Info;
use pathway::{Config, GpmlVersion, GpmlWriter, PathwayModel, storage::gpml};
use tracing::{debug, instrument};
use upgrade::Upgrade;
use validate::Validate;

/// Name of the configuration file looked up in the working directory.
const CONFIG_FILE: &str = "gpml.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a configuration file [default: ./gpml.toml, if present]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config = match &self.config {
            Some(path) => Config::load(path).map_err(|e| anyhow::anyhow!(e))?,
            None => load_default_config(Path::new(CONFIG_FILE)),
        };

        self.command.run(&config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn load_default_config(path: &Path) -> Config {
    Config::load(path).unwrap_or_else(|e| {
        debug!("Failed to load config: {e}");
        Config::default()
    })
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Summarise a pathway document
    Info(Info),

    /// Check documents for invalid properties and dangling references
    ///
    /// Directories are searched recursively for `.gpml` files, which are
    /// checked in parallel.
    Validate(Validate),

    /// Clear dangling references and rewrite the document
    Fix(Fix),

    /// Rewrite a document of any supported version in the current format
    Upgrade(Upgrade),

    /// Convert generic Ensembl cross-references to the species-specific
    /// Ensembl database
    Ensembl(Ensembl),
}

impl Command {
    fn run(self, config: &Config) -> anyhow::Result<()> {
        match self {
            Self::Info(command) => command.run(config)?,
            Self::Validate(command) => command.run()?,
            Self::Fix(command) => command.run(config)?,
            Self::Upgrade(command) => command.run(config)?,
            Self::Ensembl(command) => command.run(config)?,
        }
        Ok(())
    }
}

/// Read a document, clearing dangling references if the configuration
/// asks for it.
#[instrument(level = "debug", skip(config))]
fn load_model(path: &Path, config: &Config) -> anyhow::Result<(PathwayModel, GpmlVersion)> {
    let (mut model, version) = gpml::read_versioned_from_path(path, false)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if config.fix_references_on_load {
        let fixed = model.fix_references();
        debug!(fixed, "cleared dangling references on load");
    }
    Ok((model, version))
}

/// Write a document using the configured writer settings.
fn save_model(model: &PathwayModel, path: &Path, config: &Config) -> anyhow::Result<()> {
    GpmlWriter::from_config(config)
        .write_to_path(model, path)
        .with_context(|| format!("failed to write {}", path.display()))
}
