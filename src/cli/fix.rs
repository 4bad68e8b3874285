use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use pathway::{Config, storage::gpml};
use tracing::instrument;

use super::terminal::Mark;

#[derive(Debug, Parser)]
pub struct Fix {
    /// The document to repair
    file: PathBuf,

    /// Write the repaired document here instead of in place
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report what would be cleared without writing anything
    #[arg(long)]
    dry_run: bool,
}

impl Fix {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let mut model = gpml::read_from_path(&self.file, false)
            .with_context(|| format!("failed to read {}", self.file.display()))?;

        let cleared = model.fix_references();
        if cleared == 0 {
            println!("{} no dangling references", Mark::Pass);
            return Ok(());
        }

        if self.dry_run {
            println!("Would clear {cleared} dangling reference(s)");
            return Ok(());
        }

        let destination = self.output.as_ref().unwrap_or(&self.file);
        super::save_model(&model, destination, config)?;
        println!(
            "{} cleared {cleared} dangling reference(s) in {}",
            Mark::Pass,
            destination.display()
        );
        Ok(())
    }
}
