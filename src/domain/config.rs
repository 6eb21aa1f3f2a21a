use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::Xref;

/// Configuration for a report run.
///
/// Loaded from a TOML file such as:
///
/// ```toml
/// _version = "1"
/// island_preview = 10
///
/// [fixed_band]
/// start = 9001
/// members = ["@I501665@", "@I501670@"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Individuals numbered on a fixed band instead of by generation.
    pub fixed_band: FixedBand,

    /// How many disconnected individuals a connectivity report lists.
    island_preview: usize,
}

/// An ordered list of individuals forced onto consecutive identifiers
/// starting at a fixed offset.
///
/// Members that already received an identifier from the generation walk keep
/// it, and occupied integers are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedBand {
    /// First identifier of the band.
    #[serde(default = "default_band_start")]
    pub start: u32,

    /// Members, in numbering order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Xref>,
}

impl Default for FixedBand {
    fn default() -> Self {
        Self {
            start: default_band_start(),
            members: Vec::new(),
        }
    }
}

impl FixedBand {
    /// Creates a band with the given start and members.
    #[must_use]
    pub const fn new(start: u32, members: Vec<Xref>) -> Self {
        Self { start, members }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fixed_band: FixedBand::default(),
            island_preview: default_island_preview(),
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
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the configuration from `path` if one is given, otherwise returns
    /// the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a given file cannot be read or parsed.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        path.map_or_else(
            || {
                tracing::debug!("No config file given, using defaults");
                Ok(Self::default())
            },
            Self::load,
        )
    }

    /// Returns how many disconnected individuals a report lists.
    #[must_use]
    pub const fn island_preview(&self) -> usize {
        self.island_preview
    }
}

/// Errors that can occur while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        /// The file that was read.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
    /// The file is not valid configuration TOML.
    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        /// The file that was parsed.
        path: PathBuf,
        /// The underlying error.
        source: toml::de::Error,
    },
}

const fn default_band_start() -> u32 {
    9001
}

const fn default_island_preview() -> usize {
    20
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_island_preview")]
        island_preview: usize,

        #[serde(default)]
        fixed_band: FixedBand,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                island_preview,
                fixed_band,
            } => Self {
                fixed_band,
                island_preview,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            island_preview: config.island_preview,
            fixed_band: config.fixed_band,
        }
    }
}
