use std::path::PathBuf;

use chrono::Local;
use clap::Parser;
use pathway::{Config, GpmlVersion, StaticProperty};
use tracing::{info, instrument};

use super::terminal::Mark;

#[derive(Debug, Parser)]
pub struct Upgrade {
    /// The document to upgrade
    file: PathBuf,

    /// Write the upgraded document here instead of in place
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Record today's date as the last modification date
    #[arg(long)]
    touch: bool,
}

impl Upgrade {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let (mut model, version) = super::load_model(&self.file, config)?;

        if version == GpmlVersion::CANONICAL && self.output.is_none() && !self.touch {
            println!(
                "{} already in GPML {}",
                Mark::Pass,
                GpmlVersion::CANONICAL
            );
            return Ok(());
        }

        if self.touch {
            let today = Local::now().format("%Y-%m-%d").to_string();
            model
                .pathway_mut()
                .set_property(StaticProperty::LastModified, today)?;
        }

        let destination = self.output.as_ref().unwrap_or(&self.file);
        super::save_model(&model, destination, config)?;
        info!(from = %version, to = %GpmlVersion::CANONICAL, "upgraded");
        println!(
            "{} {} → {} ({})",
            Mark::Pass,
            version,
            GpmlVersion::CANONICAL,
            destination.display()
        );
        Ok(())
    }
}
