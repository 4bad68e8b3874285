//! Inspecting many GPML files at once.
//!
//! Every `.gpml` file below a root is read and checked in parallel. Models
//! themselves never leave the worker that loaded them; only a
//! [`Summary`] of each is collected.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::Serialize;
use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::{
    domain::PathwayModel,
    storage::gpml::{self, GpmlVersion, ReadError},
};

/// What was learned about one readable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// The file.
    pub path: PathBuf,
    /// The schema version it is stored in.
    pub version: GpmlVersion,
    /// The pathway title.
    pub title: String,
    /// The organism, if recorded.
    pub organism: Option<String>,
    /// Number of elements, including the metadata element.
    pub elements: usize,
    /// Number of reference fields whose target is missing.
    pub dangling: usize,
    /// Validation problems, one message per issue.
    pub problems: Vec<String>,
    /// Content fingerprint, see [`PathwayModel::fingerprint`].
    pub fingerprint: String,
}

impl Summary {
    /// Summarise a loaded model.
    #[must_use]
    pub fn of(path: PathBuf, version: GpmlVersion, model: &PathwayModel) -> Self {
        let info = model.pathway().as_pathway();
        let dangling = model
            .elements()
            .flat_map(|element| element.references())
            .filter(|(_, target)| !model.contains_element_id(target))
            .count();
        let problems = model.validate().map_or_else(
            |err| err.issues().iter().map(ToString::to_string).collect(),
            |()| Vec::new(),
        );

        Self {
            path,
            version,
            title: info.map(|i| i.title().to_string()).unwrap_or_default(),
            organism: info.and_then(|i| i.organism()).map(str::to_string),
            elements: model.len(),
            dangling,
            problems,
            fingerprint: model.fingerprint(),
        }
    }

    /// Whether the file passed validation.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }
}

/// A file that could not be read.
#[derive(Debug)]
pub struct Failure {
    /// The file.
    pub path: PathBuf,
    /// Why it could not be read.
    pub error: ReadError,
}

/// The outcome of a scan.
#[derive(Debug, Default)]
pub struct Report {
    /// Files that were read, ordered by path.
    pub summaries: Vec<Summary>,
    /// Files that could not be read, ordered by path.
    pub failures: Vec<Failure>,
}

impl Report {
    /// Whether every file was read and passed validation.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.summaries.iter().all(Summary::is_valid)
    }
}

/// Read and summarise every GPML file at or below `root`.
///
/// `root` may also name a single file, which is then read whatever its
/// extension.
#[instrument]
pub fn scan(root: &Path) -> Report {
    let paths = collect_gpml_paths(root);
    debug!(files = paths.len(), "scanning");

    let (summaries, failures): (Vec<_>, Vec<_>) = paths
        .par_iter()
        .map(|path| summarise(path))
        .partition(Result::is_ok);

    Report {
        summaries: summaries.into_iter().filter_map(Result::ok).collect(),
        failures: failures.into_iter().filter_map(Result::err).collect(),
    }
}

fn summarise(path: &Path) -> Result<Summary, Failure> {
    gpml::read_versioned_from_path(path, false)
        .map(|(model, version)| Summary::of(path.to_path_buf(), version, &model))
        .map_err(|error| Failure {
            path: path.to_path_buf(),
            error,
        })
}

/// All `.gpml` files below `root`, sorted, or `root` itself if it is a file.
#[must_use]
pub fn collect_gpml_paths(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(OsStr::to_str)
                .is_some_and(|ext| ext.eq_ignore_ascii_case("gpml"))
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}
