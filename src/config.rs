// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the configuration file that pathsync uses to
//! simplify the process of serialization and deserialization, and load it
//! from disk.

use crate::env::{ScopePair, ScopeSelection};

use serde::{Deserialize, Serialize};
use tracing::debug;
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Configuration file layout.
///
/// # General Layout
///
/// The configuration is composed of two parts: sync settings and profile
/// settings. The sync settings select which two scopes get merged, and which
/// of them takes priority. The profile settings locate the shell profile to
/// link into place, and are optional.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Settings for PATH synchronization.
    #[serde(default)]
    pub sync: SyncSettings,

    /// Settings for shell profile installation.
    pub profile: Option<ProfileSettings>,
}

impl Config {
    /// Load configuration from target file.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if the file cannot be read.
    /// - Return [`ConfigError::Deserialize`] or [`ConfigError::ShellExpansion`]
    ///   if the file contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        data.parse()
    }

    /// Load configuration from target file, or use defaults if it is absent.
    ///
    /// # Errors
    ///
    /// - Return any error of [`Config::load`] if the file exists.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no configuration at {:?}, use defaults", path.display());
            return Ok(Self::default());
        }

        Self::load(path)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: Config = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on profile paths.
        if let Some(profile) = config.profile.as_mut() {
            profile.source = expand_path(&profile.source)?;
            profile.target = expand_path(&profile.target)?;
        }

        Ok(config)
    }
}

impl Display for Config {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// PATH synchronization settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct SyncSettings {
    /// Pair of scopes to merge, e.g., "user+machine".
    #[serde(default)]
    pub mode: ScopePair,

    /// Make the right-hand scope of the pair take priority.
    #[serde(default)]
    pub reverse: bool,
}

impl SyncSettings {
    /// Selection of scopes described by these settings.
    pub fn selection(&self) -> ScopeSelection {
        ScopeSelection::new(self.mode, self.reverse)
    }

    /// Selection of scopes with command line overrides applied.
    ///
    /// Each override that is set replaces the matching setting.
    pub fn with_overrides(&self, mode: Option<ScopePair>, reverse: Option<bool>) -> ScopeSelection {
        ScopeSelection::new(mode.unwrap_or(self.mode), reverse.unwrap_or(self.reverse))
    }
}

/// Shell profile location settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ProfileSettings {
    /// Profile script kept under version control.
    pub source: PathBuf,

    /// Location where the shell expects to find its profile.
    pub target: PathBuf,
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("cannot read configuration file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
