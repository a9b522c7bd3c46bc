// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Shell profile installation.
//!
//! The shell profile is kept in a version controlled directory, and the shell
//! is pointed at it through a symbolic link placed where the shell expects its
//! profile to be. Installing the profile therefore never copies anything.
//! Edits made through either path land in the same file.
//!
//! Symbolic links on Windows require either administrator rights or developer
//! mode to be enabled.

use crate::{
    config::ProfileSettings,
    path::{default_profile_target, PathError},
};

use std::{
    ffi::OsString,
    fs,
    io::Error as IoError,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

/// What to do when the link target is already occupied.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
    /// Leave the existing file alone and fail.
    #[default]
    Fail,

    /// Move the existing file to `<target>.bak` before linking.
    Backup,
}

/// Result of a successful installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// New link was created.
    Created,

    /// Target already linked to source, nothing changed.
    AlreadyLinked,

    /// Existing target was moved aside and replaced by the link.
    Replaced { backup: PathBuf },
}

/// Symbolic link from a shell's profile location to a tracked profile script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLink {
    source: PathBuf,
    target: PathBuf,
}

impl ProfileLink {
    /// Construct new profile link.
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn source(&self) -> &Path {
        self.source.as_path()
    }

    pub fn target(&self) -> &Path {
        self.target.as_path()
    }

    /// Resolve link from explicit paths, falling back to profile settings.
    ///
    /// The target falls back further to [`default_profile_target`].
    ///
    /// # Errors
    ///
    /// - Return [`LinkError::NoSource`] if neither an explicit source nor
    ///   profile settings were given.
    /// - Return [`LinkError::Path`] if default target cannot be determined.
    pub fn resolve(
        source: Option<PathBuf>,
        target: Option<PathBuf>,
        profile: Option<&ProfileSettings>,
    ) -> Result<Self> {
        let source = source
            .or_else(|| profile.map(|profile| profile.source.clone()))
            .ok_or(LinkError::NoSource)?;
        let target = match target.or_else(|| profile.map(|profile| profile.target.clone())) {
            Some(target) => target,
            None => default_profile_target()?,
        };

        Ok(Self::new(source, target))
    }

    /// Check if target is occupied by anything other than a link to source.
    pub fn is_conflicting(&self) -> bool {
        fs::symlink_metadata(&self.target).is_ok() && !self.is_linked()
    }

    /// Check if target already resolves to source.
    pub fn is_linked(&self) -> bool {
        let Ok(meta) = fs::symlink_metadata(&self.target) else {
            return false;
        };
        if !meta.file_type().is_symlink() {
            return false;
        }

        match (fs::canonicalize(&self.target), fs::canonicalize(&self.source)) {
            (Ok(target), Ok(source)) => target == source,
            _ => false,
        }
    }

    /// Install link at target pointing to source.
    ///
    /// Creates missing parent directories of the target. The link always
    /// stores the absolute path of the source. The link is created under a
    /// temporary sibling name first, so a failure to create it leaves an
    /// existing target and its older backup untouched.
    ///
    /// # Errors
    ///
    /// - Return [`LinkError::MissingSource`] if source does not exist.
    /// - Return [`LinkError::TargetExists`] if target is occupied, and
    ///   `on_conflict` is [`OnConflict::Fail`].
    /// - Return [`LinkError::Io`] if any filesystem operation fails.
    pub fn install(&self, on_conflict: OnConflict) -> Result<LinkOutcome> {
        self.install_with(on_conflict, symlink)
    }

    #[instrument(skip(self, make_link), level = "debug")]
    fn install_with(
        &self,
        on_conflict: OnConflict,
        make_link: impl Fn(&Path, &Path) -> Result<()>,
    ) -> Result<LinkOutcome> {
        let source = fs::canonicalize(&self.source)
            .map_err(|_| LinkError::MissingSource(self.source.clone()))?;

        if self.is_linked() {
            info!("{} already links to {}", self.target.display(), source.display());
            return Ok(LinkOutcome::AlreadyLinked);
        }

        let occupied = fs::symlink_metadata(&self.target).is_ok();
        if occupied && on_conflict == OnConflict::Fail {
            return Err(LinkError::TargetExists(self.target.clone()));
        }

        if let Some(parent) = self.target.parent().filter(|p| !p.as_os_str().is_empty()) {
            mkdirp::mkdirp(parent)?;
        }

        let staged = sibling_path(&self.target, ".pathsync-new");
        clear_path(&staged)?;
        make_link(&source, &staged)?;

        if !occupied {
            fs::rename(&staged, &self.target)?;
            info!("link {} to {}", self.target.display(), source.display());
            return Ok(LinkOutcome::Created);
        }

        let held = sibling_path(&self.target, ".pathsync-old");
        if let Err(error) = clear_path(&held)
            .and_then(|_| fs::rename(&self.target, &held).map_err(LinkError::from))
        {
            clear_path(&staged)?;
            return Err(error);
        }

        // INVARIANT: Put the previous target back if the link cannot take its place.
        if let Err(error) = fs::rename(&staged, &self.target) {
            fs::rename(&held, &self.target)?;
            clear_path(&staged)?;
            return Err(error.into());
        }
        info!("link {} to {}", self.target.display(), source.display());

        // INVARIANT: Older backup is only replaced once the new link is in place.
        let backup = sibling_path(&self.target, ".bak");
        clear_path(&backup)?;
        warn!("move previous {} to {}", self.target.display(), backup.display());
        fs::rename(&held, &backup)?;

        Ok(LinkOutcome::Replaced { backup })
    }
}

fn sibling_path(target: &Path, suffix: &str) -> PathBuf {
    let mut sibling = OsString::from(target.as_os_str());
    sibling.push(suffix);
    PathBuf::from(sibling)
}

fn clear_path(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path)?,
        Ok(_) => fs::remove_file(path)?,
        Err(_) => {}
    }

    Ok(())
}

#[cfg(unix)]
fn symlink(source: &Path, target: &Path) -> Result<()> {
    Ok(std::os::unix::fs::symlink(source, target)?)
}

#[cfg(windows)]
fn symlink(source: &Path, target: &Path) -> Result<()> {
    Ok(std::os::windows::fs::symlink_file(source, target)?)
}

/// Profile link error types.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// No profile script was given to link to.
    #[error("no profile source given, pass --source or set [profile] source")]
    NoSource,

    /// Default profile location cannot be determined.
    #[error(transparent)]
    Path(#[from] PathError),

    /// Profile script to link does not exist.
    #[error("profile source {0:?} does not exist")]
    MissingSource(PathBuf),

    /// Target path is occupied by something else.
    #[error("profile target {0:?} already exists")]
    TargetExists(PathBuf),

    /// Filesystem operation failed.
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Friendly result alias :3
type Result<T, E = LinkError> = std::result::Result<T, E>;

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    fn write_source() -> anyhow::Result<PathBuf> {
        fs::create_dir_all("dotfiles")?;
        fs::write("dotfiles/profile.ps1", "Set-Alias ll lsd\n")?;
        Ok(fs::canonicalize("dotfiles/profile.ps1")?)
    }

    #[sealed_test]
    fn install_creates_link_and_parents() -> anyhow::Result<()> {
        let source = write_source()?;
        let link = ProfileLink::new("dotfiles/profile.ps1", "config/powershell/profile.ps1");

        assert_eq!(link.install(OnConflict::Fail)?, LinkOutcome::Created);
        assert!(link.is_linked());
        assert_eq!(fs::read_link(link.target())?, source);
        assert_eq!(fs::read_to_string(link.target())?, "Set-Alias ll lsd\n");

        Ok(())
    }

    #[sealed_test]
    fn install_twice_is_noop() -> anyhow::Result<()> {
        write_source()?;
        let link = ProfileLink::new("dotfiles/profile.ps1", "profile.ps1");

        assert_eq!(link.install(OnConflict::Fail)?, LinkOutcome::Created);
        assert_eq!(link.install(OnConflict::Fail)?, LinkOutcome::AlreadyLinked);
        assert!(!sibling_path(link.target(), ".bak").exists());

        Ok(())
    }

    #[sealed_test]
    fn install_refuses_occupied_target() -> anyhow::Result<()> {
        write_source()?;
        fs::write("profile.ps1", "old profile\n")?;
        let link = ProfileLink::new("dotfiles/profile.ps1", "profile.ps1");

        assert!(link.is_conflicting());
        let result = link.install(OnConflict::Fail);
        assert!(matches!(result, Err(LinkError::TargetExists(_))));
        assert_eq!(fs::read_to_string("profile.ps1")?, "old profile\n");

        Ok(())
    }

    #[sealed_test]
    fn install_backs_up_occupied_target() -> anyhow::Result<()> {
        write_source()?;
        fs::write("profile.ps1", "old profile\n")?;
        fs::write("profile.ps1.bak", "older profile\n")?;
        let link = ProfileLink::new("dotfiles/profile.ps1", "profile.ps1");

        let result = link.install(OnConflict::Backup)?;
        let expect = LinkOutcome::Replaced {
            backup: PathBuf::from("profile.ps1.bak"),
        };
        assert_eq!(result, expect);
        assert!(link.is_linked());
        assert_eq!(fs::read_to_string("profile.ps1.bak")?, "old profile\n");
        assert!(fs::symlink_metadata("profile.ps1.pathsync-old").is_err());

        Ok(())
    }

    #[sealed_test]
    fn failed_link_keeps_target_and_backup() -> anyhow::Result<()> {
        write_source()?;
        fs::write("profile.ps1", "old profile\n")?;
        fs::write("profile.ps1.bak", "older profile\n")?;
        let link = ProfileLink::new("dotfiles/profile.ps1", "profile.ps1");

        let result = link.install_with(OnConflict::Backup, |_, _| {
            Err(LinkError::Io(IoError::new(
                std::io::ErrorKind::PermissionDenied,
                "symbolic link privilege not held",
            )))
        });
        assert!(matches!(result, Err(LinkError::Io(_))));
        assert_eq!(fs::read_to_string("profile.ps1")?, "old profile\n");
        assert_eq!(fs::read_to_string("profile.ps1.bak")?, "older profile\n");
        assert!(fs::symlink_metadata("profile.ps1.pathsync-new").is_err());
        assert!(fs::symlink_metadata("profile.ps1.pathsync-old").is_err());

        Ok(())
    }

    #[sealed_test]
    fn install_replaces_stale_staged_link() -> anyhow::Result<()> {
        let source = write_source()?;
        fs::write("profile.ps1.pathsync-new", "leftover\n")?;
        let link = ProfileLink::new("dotfiles/profile.ps1", "profile.ps1");

        assert_eq!(link.install(OnConflict::Fail)?, LinkOutcome::Created);
        assert_eq!(fs::read_link("profile.ps1")?, source);
        assert!(fs::symlink_metadata("profile.ps1.pathsync-new").is_err());

        Ok(())
    }

    #[test]
    fn resolve_prefers_explicit_paths() -> anyhow::Result<()> {
        let profile = ProfileSettings {
            source: PathBuf::from("/home/blah/dotfiles/profile.ps1"),
            target: PathBuf::from("/home/blah/profile.ps1"),
        };

        let result = ProfileLink::resolve(None, None, Some(&profile))?;
        assert_eq!(result.source(), profile.source.as_path());
        assert_eq!(result.target(), profile.target.as_path());

        let result = ProfileLink::resolve(
            Some(PathBuf::from("/blah/other.ps1")),
            Some(PathBuf::from("/blah/target.ps1")),
            Some(&profile),
        )?;
        assert_eq!(result, ProfileLink::new("/blah/other.ps1", "/blah/target.ps1"));

        Ok(())
    }

    #[sealed_test(env = [("HOME", "/home/blah"), ("XDG_CONFIG_HOME", "/home/blah/.config")])]
    fn resolve_falls_back_to_default_target() -> anyhow::Result<()> {
        let result = ProfileLink::resolve(Some(PathBuf::from("/blah/profile.ps1")), None, None)?;
        assert_eq!(result.source(), Path::new("/blah/profile.ps1"));
        if cfg!(target_os = "linux") {
            assert_eq!(
                result.target(),
                Path::new("/home/blah/.config/powershell/Microsoft.PowerShell_profile.ps1")
            );
        }

        Ok(())
    }

    #[test]
    fn resolve_requires_source() {
        let result = ProfileLink::resolve(None, Some(PathBuf::from("/blah/profile.ps1")), None);
        assert!(matches!(result, Err(LinkError::NoSource)));
    }

    #[sealed_test]
    fn install_requires_source() {
        let link = ProfileLink::new("dotfiles/missing.ps1", "profile.ps1");
        let result = link.install(OnConflict::Backup);
        assert!(matches!(result, Err(LinkError::MissingSource(_))));
        assert!(fs::symlink_metadata("profile.ps1").is_err());
    }
}
