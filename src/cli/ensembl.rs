use std::path::PathBuf;

use clap::Parser;
use dialoguer::Confirm;
use pathway::{
    Config,
    domain::{EnsemblUpgrade, compat},
};
use tracing::instrument;

use super::terminal::{Colorize, Mark};

#[derive(Debug, Parser)]
pub struct Ensembl {
    /// The document to convert
    file: PathBuf,

    /// Write the converted document here instead of in place
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the configured policy (ask, always, never)
    #[arg(long)]
    policy: Option<EnsemblUpgrade>,

    /// Convert without asking
    #[arg(long, short)]
    yes: bool,
}

impl Ensembl {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let (mut model, _) = super::load_model(&self.file, config)?;

        if !compat::uses_old_ensembl(&model) {
            println!("{} no generic Ensembl references", Mark::Pass);
            return Ok(());
        }

        let policy = match (self.yes, self.policy) {
            (true, _) => EnsemblUpgrade::Always,
            (false, Some(policy)) => policy,
            (false, None) => config.ensembl_upgrade,
        };

        let proceed = match policy {
            EnsemblUpgrade::Always => true,
            EnsemblUpgrade::Never => false,
            EnsemblUpgrade::Ask => {
                let species = compat::species_ensembl(&model)
                    .map(|source| source.to_string())
                    .unwrap_or_default();
                Confirm::new()
                    .with_prompt(format!(
                        "{} uses the generic Ensembl database. Convert to {species}?",
                        self.file.display()
                    ))
                    .default(false)
                    .interact()?
            }
        };

        if !proceed {
            println!("{}", "Skipped".dim());
            return Ok(());
        }

        let converted = compat::convert_ensembl(&mut model);
        let destination = self.output.as_ref().unwrap_or(&self.file);
        super::save_model(&model, destination, config)?;
        println!(
            "{} converted {converted} cross-reference(s) in {}",
            Mark::Pass,
            destination.display()
        );
        Ok(())
    }
}
