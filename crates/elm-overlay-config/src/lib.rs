//! # elm-overlay-config
//!
//! Configuration for the `elm-package.json` overlay.
//!
//! The overlay is driven by two values:
//! 1. `USE_ELM_PACKAGE` - the file to open instead
//! 2. `INSTEAD_OF_ELM_PACKAGE` - the canonical path whose reads get replaced
//!
//! The preloaded shim reads both from its own environment on every call.
//! Library users build an [`OverlayConfig`] once and hand it to the resolver.
//! The launcher can additionally read them from a TOML file (`[overlay]`
//! table), with environment variables taking priority.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod logging;
pub mod testing;

/// Replacement path variable.
pub const USE_ENV: &str = "USE_ELM_PACKAGE";
/// Replacee reference path variable.
pub const INSTEAD_OF_ENV: &str = "INSTEAD_OF_ELM_PACKAGE";
/// Linux preload list.
pub const LD_PRELOAD_ENV: &str = "LD_PRELOAD";
/// macOS preload list.
pub const DYLD_INSERT_ENV: &str = "DYLD_INSERT_LIBRARIES";
/// Enables shim diagnostics on stderr when set.
pub const DEBUG_ENV: &str = "ELM_OVERLAY_DEBUG";
/// Log filter for the launcher (falls back to `RUST_LOG`).
pub const LOG_ENV: &str = "ELM_OVERLAY_LOG";
/// Explicit location of the shim library for the launcher.
pub const SHIM_ENV: &str = "ELM_OVERLAY_SHIM";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// The two paths that make up a redirection rule.
///
/// Values are kept as raw OS strings; nothing here validates or
/// canonicalizes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayConfig {
    /// Substitute file handed to the real open primitive.
    pub use_path: PathBuf,
    /// Absolute path the canonicalized request must equal.
    pub instead_of: PathBuf,
}

impl OverlayConfig {
    pub fn new(use_path: impl Into<PathBuf>, instead_of: impl Into<PathBuf>) -> Self {
        Self {
            use_path: use_path.into(),
            instead_of: instead_of.into(),
        }
    }

    /// Read the rule from the process environment.
    ///
    /// Returns `None` unless both variables are set. Empty values count as set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Same as [`OverlayConfig::from_env`], with the lookup supplied by the caller.
    pub fn from_lookup<F>(mut lookup: F) -> Option<Self>
    where
        F: FnMut(&str) -> Option<OsString>,
    {
        let use_path = lookup(USE_ENV)?;
        let instead_of = lookup(INSTEAD_OF_ENV)?;
        Some(Self::new(use_path, instead_of))
    }

    /// Environment a child process needs so the shim at `shim` applies this rule.
    ///
    /// Existing preload lists (as returned by `lookup`) are kept after the shim.
    pub fn overlay_env<F>(&self, shim: &Path, lookup: F) -> Vec<(&'static str, OsString)>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        vec![
            (USE_ENV, self.use_path.clone().into_os_string()),
            (INSTEAD_OF_ENV, self.instead_of.clone().into_os_string()),
            (
                DYLD_INSERT_ENV,
                prepend_preload(shim, lookup(DYLD_INSERT_ENV)),
            ),
            (LD_PRELOAD_ENV, prepend_preload(shim, lookup(LD_PRELOAD_ENV))),
        ]
    }
}

/// Put `shim` in front of a colon-separated preload list.
pub fn prepend_preload(shim: &Path, existing: Option<OsString>) -> OsString {
    let mut value = shim.as_os_str().to_os_string();
    if let Some(existing) = existing {
        value.push(":");
        value.push(existing);
    }
    value
}

/// Launcher configuration, loaded from an optional TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub overlay: OverlaySection,
}

/// `[overlay]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySection {
    /// Substitute manifest
    #[serde(rename = "use")]
    pub use_path: Option<PathBuf>,
    /// Manifest to replace
    pub instead_of: Option<PathBuf>,
    /// Shim library location
    pub shim: Option<PathBuf>,
}

impl LauncherConfig {
    /// Load from `path` (if given), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                debug!("Loading launcher config from {:?}", path);
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var_os(key));
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Environment values win over file values.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<OsString>,
    {
        if let Some(value) = lookup(USE_ENV) {
            self.overlay.use_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(INSTEAD_OF_ENV) {
            self.overlay.instead_of = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(SHIM_ENV) {
            self.overlay.shim = Some(PathBuf::from(value));
        }
    }

    /// The rule, if both halves are configured.
    pub fn overlay_config(&self) -> Option<OverlayConfig> {
        match (&self.overlay.use_path, &self.overlay.instead_of) {
            (Some(use_path), Some(instead_of)) => {
                Some(OverlayConfig::new(use_path.clone(), instead_of.clone()))
            }
            _ => None,
        }
    }

    /// Fails for paths TOML cannot carry (not valid UTF-8).
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
