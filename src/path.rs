// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for external files that need to be
//! interacted with, or managed in some way.

use std::path::PathBuf;

/// Determine default absolute path to configuration file.
///
/// Uses `$XDG_CONFIG_HOME/pathsync/config.toml` on Unix-like systems, and
/// `%APPDATA%\pathsync\config.toml` on Windows. Does not check if the path
/// returned actually exists.
///
/// # Errors
///
/// - Return [`PathError::NoConfigDir`] if configuration directory cannot be
///   determined.
pub fn default_config_file() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("pathsync").join("config.toml"))
        .ok_or(PathError::NoConfigDir)
}

/// Determine default absolute path to the PowerShell profile script.
///
/// PowerShell reads `Documents\PowerShell\Microsoft.PowerShell_profile.ps1`
/// on Windows, and `$XDG_CONFIG_HOME/powershell/Microsoft.PowerShell_profile.ps1`
/// elsewhere.
///
/// # Errors
///
/// - Return [`PathError::NoDocumentDir`] or [`PathError::NoConfigDir`] if the
///   parent directory cannot be determined.
pub fn default_profile_target() -> Result<PathBuf> {
    const PROFILE: &str = "Microsoft.PowerShell_profile.ps1";

    if cfg!(windows) {
        dirs::document_dir()
            .map(|path| path.join("PowerShell").join(PROFILE))
            .ok_or(PathError::NoDocumentDir)
    } else {
        dirs::config_dir()
            .map(|path| path.join("powershell").join(PROFILE))
            .ok_or(PathError::NoConfigDir)
    }
}

/// Path resolution error types.
///
/// # See Also
///
/// - [`dirs`](https://docs.rs/dirs/latest/dirs/)
#[derive(Clone, Debug, thiserror::Error)]
pub enum PathError {
    #[error("cannot determine absolute path to user's configuration directory")]
    NoConfigDir,

    #[error("cannot determine absolute path to user's documents directory")]
    NoDocumentDir,
}

/// Friendly result alias :3
pub type Result<T, E = PathError> = std::result::Result<T, E>;
