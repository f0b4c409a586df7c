//! Redirect decision for `elm-package.json`.
//!
//! Only a request that is byte-for-byte the bare literal is considered.
//! The host tool changes into the package directory before reading its
//! manifest, so `./elm-package.json` or `sub/elm-package.json` never match.
//! Every failure along the way (no rule, canonicalization error, different
//! package) means the request passes through untouched.

use std::borrow::{Borrow, Cow};
use std::path::{Path, PathBuf};

use elm_overlay_config::{log_resolver_debug, log_resolver_trace, OverlayConfig};

/// The only filename ever redirected.
pub const TARGET_FILENAME: &str = "elm-package.json";

/// Outcome of one resolution. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    Passthrough,
    Substitute(PathBuf),
}

impl Redirect {
    pub fn is_substitute(&self) -> bool {
        matches!(self, Redirect::Substitute(_))
    }

    /// Path to hand to the real open primitive.
    pub fn apply<'a>(&'a self, requested: &'a Path) -> &'a Path {
        match self {
            Redirect::Passthrough => requested,
            Redirect::Substitute(path) => path,
        }
    }
}

/// Exact match against the target literal; no syscalls.
pub fn is_target(requested: &Path) -> bool {
    requested.as_os_str() == TARGET_FILENAME
}

/// Decide using the process environment as it is right now.
///
/// The environment is only consulted once the filename matches, and is read
/// again on every call.
pub fn resolve_from_env(requested: &Path) -> Redirect {
    decide_with(requested, None, OverlayConfig::from_env)
}

fn decide_with<C, F>(requested: &Path, base_dir: Option<&Path>, load: F) -> Redirect
where
    C: Borrow<OverlayConfig>,
    F: FnOnce() -> Option<C>,
{
    if !is_target(requested) {
        return Redirect::Passthrough;
    }
    let Some(config) = load() else {
        return Redirect::Passthrough;
    };
    let config = config.borrow();

    let candidate: Cow<'_, Path> = match base_dir {
        Some(dir) => Cow::Owned(dir.join(requested)),
        None => Cow::Borrowed(requested),
    };
    let canonical = match std::fs::canonicalize(&candidate) {
        Ok(path) => path,
        Err(err) => {
            log_resolver_trace!(
                "Cannot canonicalize manifest, passing through",
                path = display(candidate.display()),
                error = display(&err),
            );
            return Redirect::Passthrough;
        }
    };

    if canonical.as_os_str() != config.instead_of.as_os_str() {
        return Redirect::Passthrough;
    }

    log_resolver_debug!(
        "Substituting manifest",
        canonical = display(canonical.display()),
        replacement = display(config.use_path.display()),
    );
    Redirect::Substitute(config.use_path.clone())
}

/// Resolver holding an explicit rule.
///
/// Relative requests are canonicalized against `base_dir` when set, otherwise
/// against the process working directory at call time.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    config: Option<OverlayConfig>,
    base_dir: Option<PathBuf>,
}

impl PathResolver {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            config: Some(config),
            base_dir: None,
        }
    }

    /// A resolver that never substitutes.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> Option<&OverlayConfig> {
        self.config.as_ref()
    }

    pub fn decide(&self, requested: &Path) -> Redirect {
        decide_with(requested, self.base_dir.as_deref(), || self.config.as_ref())
    }

    pub fn resolve<'a>(&self, requested: &'a Path) -> Cow<'a, Path> {
        match self.decide(requested) {
            Redirect::Passthrough => Cow::Borrowed(requested),
            Redirect::Substitute(path) => Cow::Owned(path),
        }
    }
}
