use std::path::PathBuf;

use clap::Parser;
use pathway::{Config, ElementType, PathwayModel, storage::Summary};
use serde::Serialize;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
pub struct Info {
    /// The document to describe
    file: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Serialize)]
struct Details {
    #[serde(flatten)]
    summary: Summary,
    counts: Vec<(&'static str, usize)>,
}

const COUNTED: &[ElementType] = &[
    ElementType::DataNode,
    ElementType::State,
    ElementType::Interaction,
    ElementType::GraphicalLine,
    ElementType::Label,
    ElementType::Shape,
    ElementType::Group,
];

fn counts(model: &PathwayModel) -> Vec<(&'static str, usize)> {
    COUNTED
        .iter()
        .map(|element_type| {
            let count = model
                .elements()
                .filter(|e| e.element_type() == *element_type)
                .count();
            (element_type.as_str(), count)
        })
        .collect()
}

impl Info {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let (model, version) = super::load_model(&self.file, config)?;

        let details = Details {
            counts: counts(&model),
            summary: Summary::of(self.file, version, &model),
        };

        match self.output {
            OutputFormat::Table => print_table(&details),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&details)?),
        }
        Ok(())
    }
}

fn print_table(details: &Details) {
    let summary = &details.summary;

    println!("{}", summary.title);
    println!("  {:<12} {}", "file".dim(), summary.path.display());
    println!("  {:<12} {}", "format".dim(), summary.version);
    println!(
        "  {:<12} {}",
        "organism".dim(),
        summary.organism.as_deref().unwrap_or("-")
    );
    println!("  {:<12} {}", "elements".dim(), summary.elements);
    for (name, count) in &details.counts {
        println!("    {name:<10} {count}");
    }

    let dangling = format!("{}", summary.dangling);
    println!(
        "  {:<12} {}",
        "dangling".dim(),
        if summary.dangling == 0 {
            dangling.success()
        } else {
            dangling.warning()
        }
    );
    println!("  {:<12} {}", "fingerprint".dim(), &summary.fingerprint[..16]);
}
