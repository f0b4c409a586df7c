//! File access abstraction with an overlay decorator.
//!
//! Call sites hold a `FileAccess` instead of calling `open` directly:
//!
//! - [`RealFs`]: delegates to the operating system
//! - [`OverlayFs`]: runs the redirect decision, then delegates to an inner
//!   `FileAccess` with the effective path
//!
//! The [`create_file_access()`] factory picks the right one for a
//! configuration that was built once at startup.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use elm_overlay_config::{log_fs_trace, OverlayConfig};

use crate::flags::OpenRequest;
use crate::resolver::PathResolver;

/// Narrow open interface that host code calls instead of the OS primitive.
pub trait FileAccess: Send + Sync {
    /// `open(2)`-style: raw flags plus permission bits.
    fn open(&self, path: &Path, request: &OpenRequest) -> io::Result<File>;

    /// `fopen(3)`-style: mode string such as `"r"` or `"w+"`.
    fn open_stream(&self, path: &Path, mode: &str) -> io::Result<File> {
        let request = OpenRequest::from_fopen_mode(mode).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid open mode: {:?}", mode),
            )
        })?;
        self.open(path, &request)
    }

    /// Directory relative paths are opened against, if not the process cwd.
    fn working_dir(&self) -> Option<&Path> {
        None
    }

    /// Implementation name for logging/debugging
    fn name(&self) -> &'static str;
}

impl<T: FileAccess + ?Sized> FileAccess for Box<T> {
    fn open(&self, path: &Path, request: &OpenRequest) -> io::Result<File> {
        (**self).open(path, request)
    }

    fn open_stream(&self, path: &Path, mode: &str) -> io::Result<File> {
        (**self).open_stream(path, mode)
    }

    fn working_dir(&self) -> Option<&Path> {
        (**self).working_dir()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

// ============================================================================
// Real filesystem
// ============================================================================

/// Opens files through `std::fs::OpenOptions`.
#[derive(Debug, Clone, Default)]
pub struct RealFs {
    working_dir: Option<PathBuf>,
}

impl RealFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `dir` instead of the process cwd.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
        }
    }
}

impl FileAccess for RealFs {
    fn open(&self, path: &Path, request: &OpenRequest) -> io::Result<File> {
        let options = request.to_open_options();
        match &self.working_dir {
            Some(dir) => options.open(dir.join(path)),
            None => options.open(path),
        }
    }

    fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    fn name(&self) -> &'static str {
        "real"
    }
}

// ============================================================================
// Overlay decorator
// ============================================================================

/// Applies the `elm-package.json` redirect before delegating.
///
/// The request (flags and mode) is forwarded unchanged and whatever the inner
/// implementation returns, including errors, goes straight back.
#[derive(Debug, Clone)]
pub struct OverlayFs<F> {
    inner: F,
    resolver: PathResolver,
}

impl<F: FileAccess> OverlayFs<F> {
    /// Relative requests are canonicalized against `inner`'s working directory.
    pub fn new(inner: F, config: OverlayConfig) -> Self {
        let mut resolver = PathResolver::new(config);
        if let Some(dir) = inner.working_dir() {
            resolver = resolver.with_base_dir(dir);
        }
        Self { inner, resolver }
    }

    pub fn with_resolver(inner: F, resolver: PathResolver) -> Self {
        Self { inner, resolver }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<F: FileAccess> FileAccess for OverlayFs<F> {
    fn open(&self, path: &Path, request: &OpenRequest) -> io::Result<File> {
        let redirect = self.resolver.decide(path);
        let effective = redirect.apply(path);
        log_fs_trace!(
            "open",
            requested = display(path.display()),
            effective = display(effective.display()),
            flags = request.flags(),
            write = request.is_write(),
        );
        self.inner.open(effective, request)
    }

    fn working_dir(&self) -> Option<&Path> {
        self.inner.working_dir()
    }

    fn name(&self) -> &'static str {
        "overlay"
    }
}

/// Build the file access layer for a configuration read once at startup.
pub fn create_file_access(config: Option<OverlayConfig>) -> Box<dyn FileAccess> {
    match config {
        Some(config) => Box::new(OverlayFs::new(RealFs::new(), config)),
        None => Box::new(RealFs::new()),
    }
}
