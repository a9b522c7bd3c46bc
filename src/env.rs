// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Environment scope access.
//!
//! PATH values live at different __scopes__. The process scope is the copy
//! the current process inherited. On Windows the user and machine scopes are
//! stored in the registry, and new processes assemble their PATH from them.
//!
//! All reads and writes go through the [`Environment`] port so that merge
//! logic can be exercised against [`MemoryEnvironment`] without touching real
//! process state.

use crate::sync::PathList;

use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt::{Display, Formatter, Result as FmtResult},
    io::{Error as IoError, ErrorKind},
    str::FromStr,
};
use tracing::{debug, instrument};

/// Platform separator for PATH entries.
pub const PATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// Name of PATH variable in the process environment.
pub const PATH_VAR: &str = "PATH";

/// Registry subkey of `HKEY_CURRENT_USER` holding variables of the user scope.
pub const USER_ENV_KEY: &str = "Environment";

/// Registry subkey of `HKEY_LOCAL_MACHINE` holding variables of the machine
/// scope.
pub const MACHINE_ENV_KEY: &str =
    r"SYSTEM\CurrentControlSet\Control\Session Manager\Environment";

/// Storage level of an environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Variables of the current process.
    Process,

    /// Variables of the current user.
    User,

    /// Variables shared by every user of the machine.
    Machine,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Process => "process",
            Self::User => "user",
            Self::Machine => "machine",
        }
    }
}

impl Display for Scope {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = ScopeError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data.trim().to_lowercase().as_str() {
            "process" => Ok(Self::Process),
            "user" => Ok(Self::User),
            "machine" => Ok(Self::Machine),
            _ => Err(ScopeError::Unknown(data.to_string())),
        }
    }
}

/// Two distinct scopes to merge, written as `"<left>+<right>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScopePair {
    left: Scope,
    right: Scope,
}

impl ScopePair {
    /// Construct new scope pair.
    ///
    /// # Errors
    ///
    /// - Return [`ScopeError::SameScope`] if both scopes are identical.
    pub fn new(left: Scope, right: Scope) -> Result<Self, ScopeError> {
        if left == right {
            return Err(ScopeError::SameScope(left));
        }

        Ok(Self { left, right })
    }
}

impl Default for ScopePair {
    fn default() -> Self {
        Self {
            left: Scope::User,
            right: Scope::Machine,
        }
    }
}

impl Display for ScopePair {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{}+{}", self.left, self.right)
    }
}

impl FromStr for ScopePair {
    type Err = ScopeError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let (left, right) = data
            .split_once('+')
            .ok_or_else(|| ScopeError::MalformedPair(data.to_string()))?;
        if left.trim().is_empty() || right.trim().is_empty() {
            return Err(ScopeError::MalformedPair(data.to_string()));
        }

        Self::new(left.parse()?, right.parse()?)
    }
}

impl TryFrom<String> for ScopePair {
    type Error = ScopeError;

    fn try_from(data: String) -> Result<Self, Self::Error> {
        data.parse()
    }
}

impl From<ScopePair> for String {
    fn from(pair: ScopePair) -> Self {
        pair.to_string()
    }
}

/// Scope pair together with its merge priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScopeSelection {
    pair: ScopePair,
    reverse: bool,
}

impl ScopeSelection {
    /// Construct new scope selection.
    ///
    /// The left scope of the pair is primary unless `reverse` is set.
    pub fn new(pair: ScopePair, reverse: bool) -> Self {
        Self { pair, reverse }
    }

    /// Scope whose entries come first.
    pub fn primary(&self) -> Scope {
        if self.reverse {
            self.pair.right
        } else {
            self.pair.left
        }
    }

    /// Scope whose entries only fill in what the primary scope lacks.
    pub fn secondary(&self) -> Scope {
        if self.reverse {
            self.pair.left
        } else {
            self.pair.right
        }
    }
}

impl Display for ScopeSelection {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{} over {}", self.primary(), self.secondary())
    }
}

/// Read and write access to PATH values by scope.
pub trait Environment {
    /// Read PATH of target scope.
    fn read(&self, scope: Scope) -> Result<PathList>;

    /// Assign PATH of the current process.
    ///
    /// Either the whole value is assigned, or nothing changes.
    fn write(&mut self, value: &str) -> Result<()>;
}

/// Environment port over the real operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnvironment;

impl SystemEnvironment {
    pub fn new() -> Self {
        Self
    }

    fn read_process(&self) -> Result<PathList> {
        match std::env::var_os(PATH_VAR) {
            Some(value) => {
                let value = value.into_string().map_err(|_| EnvError::NotUnicode {
                    scope: Scope::Process,
                })?;
                Ok(PathList::parse(value, PATH_SEPARATOR))
            }
            None => {
                debug!("{PATH_VAR} is not set for current process");
                Ok(PathList::default())
            }
        }
    }

    #[cfg(windows)]
    fn read_registry(&self, scope: Scope, subkey: &str) -> Result<PathList> {
        use winreg::{
            enums::{RegType, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_READ},
            types::FromRegValue,
            RegKey,
        };

        let hive = match scope {
            Scope::Machine => RegKey::predef(HKEY_LOCAL_MACHINE),
            _ => RegKey::predef(HKEY_CURRENT_USER),
        };
        let registry_error = |error: IoError| EnvError::Registry {
            scope,
            message: error.to_string(),
        };

        // INVARIANT: A scope without any Path value reads as an empty list.
        let raw = match hive
            .open_subkey_with_flags(subkey, KEY_READ)
            .and_then(|key| key.get_raw_value("Path"))
        {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                tracing::warn!("no Path value stored at {scope} scope");
                return Ok(PathList::default());
            }
            Err(error) => return Err(registry_error(error)),
        };

        let text = String::from_reg_value(&raw).map_err(registry_error)?;
        let value = match raw.vtype {
            RegType::REG_EXPAND_SZ => RegValue::Expandable(text),
            _ => RegValue::Plain(text),
        };

        Ok(PathList::parse(value.expand(), PATH_SEPARATOR))
    }

    #[cfg(not(windows))]
    fn read_registry(&self, scope: Scope, _subkey: &str) -> Result<PathList> {
        Err(EnvError::UnsupportedScope(scope))
    }
}

impl Environment for SystemEnvironment {
    #[instrument(skip(self), level = "debug")]
    fn read(&self, scope: Scope) -> Result<PathList> {
        match scope {
            Scope::Process => self.read_process(),
            Scope::User => self.read_registry(scope, USER_ENV_KEY),
            Scope::Machine => self.read_registry(scope, MACHINE_ENV_KEY),
        }
    }

    #[instrument(skip(self, value), level = "debug")]
    fn write(&mut self, value: &str) -> Result<()> {
        // INVARIANT: Reject values the OS cannot store before mutating anything.
        if value.contains('\0') {
            return Err(EnvError::InvalidValue);
        }

        std::env::set_var(PATH_VAR, value);
        debug!("assigned {PATH_VAR} for current process");

        Ok(())
    }
}

/// String value read from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegValue {
    /// Plain string value.
    Plain(String),

    /// String value containing `%NAME%` references.
    Expandable(String),
}

impl RegValue {
    /// Resolve value into its final text.
    ///
    /// References to unknown variables are left verbatim.
    pub fn expand(self) -> String {
        match self {
            Self::Plain(value) => value,
            Self::Expandable(value) => expand_percent_vars(&value, |name| std::env::var(name).ok()),
        }
    }
}

/// Expand `%NAME%` references through target lookup function.
pub fn expand_percent_vars(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut expanded = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find('%') {
        expanded.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) => {
                let name = &after[..end];
                match lookup(name).filter(|_| !name.is_empty()) {
                    Some(found) => expanded.push_str(found.as_str()),
                    None => {
                        expanded.push('%');
                        expanded.push_str(name);
                        expanded.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                expanded.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    expanded.push_str(rest);

    expanded
}

/// Environment port held entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryEnvironment {
    scopes: HashMap<Scope, String>,
    written: Option<String>,
    write_failure: Option<String>,
}

impl MemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw separator-delimited PATH value for target scope.
    pub fn with_scope(mut self, scope: Scope, value: impl Into<String>) -> Self {
        self.scopes.insert(scope, value.into());
        self
    }

    /// Make every write fail with target message.
    pub fn with_write_failure(mut self, message: impl Into<String>) -> Self {
        self.write_failure = Some(message.into());
        self
    }

    /// Last value assigned through [`Environment::write`].
    pub fn written(&self) -> Option<&str> {
        self.written.as_deref()
    }
}

impl Environment for MemoryEnvironment {
    fn read(&self, scope: Scope) -> Result<PathList> {
        self.scopes
            .get(&scope)
            .map(|value| PathList::parse(value, PATH_SEPARATOR))
            .ok_or(EnvError::UnsupportedScope(scope))
    }

    fn write(&mut self, value: &str) -> Result<()> {
        if let Some(message) = &self.write_failure {
            return Err(EnvError::Write(IoError::new(
                ErrorKind::PermissionDenied,
                message.clone(),
            )));
        }

        self.scopes.insert(Scope::Process, value.to_string());
        self.written = Some(value.to_string());

        Ok(())
    }
}

/// Scope parsing error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    /// Scope name is not one of process, user, or machine.
    #[error("unknown scope {0:?}, expect one of process, user, or machine")]
    Unknown(String),

    /// Scope pair is not written as "<scope>+<scope>".
    #[error("malformed scope pair {0:?}, expect \"<scope>+<scope>\"")]
    MalformedPair(String),

    /// Scope pair names the same scope twice.
    #[error("scope pair names {0} scope twice")]
    SameScope(Scope),
}

/// Environment access error types.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    /// Scope cannot be read by this environment.
    #[error("{0} scope is not available on this platform")]
    UnsupportedScope(Scope),

    /// PATH value is not valid Unicode.
    #[error("PATH at {scope} scope is not valid unicode")]
    NotUnicode { scope: Scope },

    /// Registry read failed.
    #[error("cannot read PATH at {scope} scope: {message}")]
    Registry { scope: Scope, message: String },

    /// PATH value cannot be stored by the OS.
    #[error("PATH value contains a NUL character")]
    InvalidValue,

    /// OS refused to assign PATH.
    #[error("cannot assign PATH for current process")]
    Write(#[source] IoError),

}

/// Friendly result alias :3
type Result<T, E = EnvError> = std::result::Result<T, E>;
