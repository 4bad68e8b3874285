use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

/// Configuration for reading and writing pathway documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Number of spaces per indentation level in written documents.
    indent: usize,

    /// Whether documents are validated before they are written.
    ///
    /// When `false`, documents are written best-effort.
    pub validate_on_write: bool,

    /// Whether dangling references are cleared right after a document is
    /// loaded.
    pub fix_references_on_load: bool,

    /// What to do with documents that still use generic Ensembl
    /// cross-references.
    pub ensembl_upgrade: EnsemblUpgrade,
}

/// Policy for the legacy Ensembl upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnsemblUpgrade {
    /// Ask before upgrading.
    #[default]
    Ask,
    /// Upgrade without asking.
    Always,
    /// Never upgrade.
    Never,
}

impl fmt::Display for EnsemblUpgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ask => "ask",
            Self::Always => "always",
            Self::Never => "never",
        })
    }
}

impl FromStr for EnsemblUpgrade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ask" => Ok(Self::Ask),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            other => Err(format!("unknown Ensembl upgrade policy '{other}'")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            validate_on_write: true,
            fix_references_on_load: false,
            ensembl_upgrade: EnsemblUpgrade::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the number of spaces per indentation level.
    #[must_use]
    pub const fn indent(&self) -> usize {
        self.indent
    }

    /// Sets the indentation width.
    ///
    /// Widths above 16 are clamped.
    pub fn set_indent(&mut self, indent: usize) {
        self.indent = indent.min(MAX_INDENT);
    }
}

const MAX_INDENT: usize = 16;

const fn default_indent() -> usize {
    4
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        /// Spaces per indentation level in written documents.
        #[serde(default = "default_indent")]
        indent: usize,

        #[serde(default = "default_true")]
        validate_on_write: bool,

        #[serde(default)]
        fix_references_on_load: bool,

        #[serde(default)]
        ensembl_upgrade: EnsemblUpgrade,
    },
}

const fn default_true() -> bool {
    true
}

impl From<Versions> for super::Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                indent,
                validate_on_write,
                fix_references_on_load,
                ensembl_upgrade,
            } => Self {
                indent: indent.min(MAX_INDENT),
                validate_on_write,
                fix_references_on_load,
                ensembl_upgrade,
            },
        }
    }
}

impl From<super::Config> for Versions {
    fn from(config: super::Config) -> Self {
        Self::V1 {
            indent: config.indent,
            validate_on_write: config.validate_on_write,
            fix_references_on_load: config.fix_references_on_load,
            ensembl_upgrade: config.ensembl_upgrade,
        }
    }
}
