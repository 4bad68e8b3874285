//! Export collaborators.
//!
//! An exporter turns a complete [`PathwayModel`] into some other artifact
//! on disk. Image and tabular exporters live outside this crate; they only
//! need to implement [`Exporter`].

use std::path::Path;

use crate::{
    domain::PathwayModel,
    storage::gpml::{GpmlWriter, WriteError},
};

/// Writes a model to a destination in some format.
pub trait Exporter {
    /// The exporter-specific failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// A short human readable name, such as `GPML`.
    fn name(&self) -> &str;

    /// File extensions this exporter produces, without the leading dot.
    fn extensions(&self) -> &[&str];

    /// Export `model` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns the exporter's own error type.
    fn export(&self, destination: &Path, model: &PathwayModel) -> Result<(), Self::Error>;
}

impl Exporter for GpmlWriter {
    type Error = WriteError;

    fn name(&self) -> &str {
        "GPML"
    }

    fn extensions(&self) -> &[&str] {
        &["gpml"]
    }

    fn export(&self, destination: &Path, model: &PathwayModel) -> Result<(), Self::Error> {
        self.write_to_path(model, destination)
    }
}

/// Find the exporter in `exporters` that produces files with `destination`'s
/// extension.
#[must_use]
pub fn exporter_for<'a, E: Exporter>(exporters: &'a [E], destination: &Path) -> Option<&'a E> {
    let extension = destination.extension()?.to_str()?;
    exporters.iter().find(|exporter| {
        exporter
            .extensions()
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(extension))
    })
}
