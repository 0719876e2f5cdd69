//! Configuration loading from disk.
//!
//! Values are layered: explicit overrides win over the YAML file, and the
//! file wins over built-in defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

use crate::config::schema::Config;

/// File name used when none is given.
pub const DEFAULT_FILENAME: &str = "apid.yml";

/// Directories searched, in order, when none are given.
pub const DEFAULT_SEARCH_DIRS: &[&str] = &["/run/config", ".", ".."];

const FILENAME_PATTERN: &str = r"^[a-z]+\.yml$";

/// Error type for configuration loading and writing.
///
/// Missing, empty and malformed files are deliberately distinct variants.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The filename is not in the form [NAME].yml")]
    InvalidFilename,

    #[error("built-in filename pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),

    #[error("No file exists at path: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("The file {name} is completely empty. What do you want me to do with this?")]
    Empty { name: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Could not marshal the config: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("Could not write file to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Check a configuration file name against `^[a-z]+\.yml$` before any I/O.
pub fn verify_filename(name: &str) -> Result<(), ConfigError> {
    let pattern = Regex::new(FILENAME_PATTERN)?;
    if pattern.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidFilename)
    }
}

/// Read and parse a YAML configuration file. Absent keys take their defaults.
pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConfigError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ConfigError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    if content.is_empty() {
        return Err(ConfigError::Empty {
            name: display_name(path),
        });
    }

    serde_yaml::from_slice(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a configuration to YAML and write it to `path`.
pub fn write_file(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let yaml = serde_yaml::to_string(config).map_err(ConfigError::Serialize)?;
    fs::write(path, yaml).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "Wrote config");
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Values that take precedence over the file, typically from flags or the
/// environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub listen_address: Option<String>,
}

impl ConfigOverrides {
    /// Write every set override into `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(address) = &self.listen_address {
            config.http.listen_address = address.clone();
        }
    }
}

/// Layered configuration source: overrides > file > defaults.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    directories: Vec<PathBuf>,
    filename: String,
    overrides: ConfigOverrides,
}

impl Default for ConfigSource {
    fn default() -> Self {
        Self {
            directories: DEFAULT_SEARCH_DIRS.iter().map(PathBuf::from).collect(),
            filename: DEFAULT_FILENAME.to_string(),
            overrides: ConfigOverrides::default(),
        }
    }
}

impl ConfigSource {
    /// Create a source searching the default directories for `apid.yml`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the search directories. An empty list keeps the defaults.
    pub fn with_directories<I, P>(mut self, directories: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let directories: Vec<PathBuf> = directories.into_iter().map(Into::into).collect();
        if !directories.is_empty() {
            self.directories = directories;
        }
        self
    }

    /// Replace the file name. It is verified when the source is loaded.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Find the first search directory that contains the file.
    pub fn locate(&self) -> Result<PathBuf, ConfigError> {
        verify_filename(&self.filename)?;
        self.directories
            .iter()
            .map(|dir| dir.join(&self.filename))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| ConfigError::NotFound {
                path: self
                    .directories
                    .first()
                    .map(|dir| dir.join(&self.filename))
                    .unwrap_or_else(|| PathBuf::from(&self.filename)),
            })
    }

    /// Load the layered configuration. Fails if the file cannot be found.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let path = self.locate()?;
        self.load_from(&path)
    }

    /// Load the file at `path` and apply the overrides on top.
    pub fn load_from(&self, path: &Path) -> Result<Config, ConfigError> {
        let mut config = load_file(path)?;
        self.overrides.apply(&mut config);
        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Defaults with the overrides applied, used when no file is usable.
    pub fn defaults(&self) -> Config {
        let mut config = Config::default();
        self.overrides.apply(&mut config);
        config
    }
}
