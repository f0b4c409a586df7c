//! Test environment abstraction for isolated testing.
//!
//! Provides `TestEnvironment` to manage:
//! - A package directory holding the real `elm-package.json`
//! - An alternate directory holding the substitute manifest
//!
//! # Usage
//!
//! ```ignore
//! use elm_overlay_config::testing::TestEnvironment;
//!
//! #[test]
//! fn test_something() {
//!     let env = TestEnvironment::new().unwrap();
//!     // env.pkg_dir, env.target, env.substitute are all isolated
//! }
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Context;
use tempfile::TempDir;

use crate::OverlayConfig;

/// Atomic counter for unique test IDs
static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Contents written to the real manifest.
pub const ORIGINAL_MANIFEST: &str = r#"{"version": "1.0.0", "exposed-modules": []}"#;
/// Contents written to the substitute manifest.
pub const SUBSTITUTE_MANIFEST: &str = r#"{"version": "1.0.0", "exposed-modules": ["Main"]}"#;

/// Isolated `/pkg` + `/alt` layout
pub struct TestEnvironment {
    /// Temporary directory (dropped on cleanup)
    _temp_dir: TempDir,
    /// Canonical temp root
    pub root: PathBuf,
    /// Package directory (the host's working directory)
    pub pkg_dir: PathBuf,
    /// Directory holding the substitute
    pub alt_dir: PathBuf,
    /// Canonical path of `pkg_dir/elm-package.json`
    pub target: PathBuf,
    /// Path of `alt_dir/elm-package.json`
    pub substitute: PathBuf,
    /// Unique test ID
    pub test_id: u32,
}

impl TestEnvironment {
    /// Create a new isolated test environment
    pub fn new() -> anyhow::Result<Self> {
        let test_id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_dir = TempDir::new()?;
        // /tmp may itself be a symlink (e.g. /private/tmp on macOS)
        let root = temp_dir.path().canonicalize()?;

        let pkg_dir = root.join("pkg");
        let alt_dir = root.join("alt");
        std::fs::create_dir_all(&pkg_dir)?;
        std::fs::create_dir_all(&alt_dir)?;

        let target = pkg_dir.join("elm-package.json");
        let substitute = alt_dir.join("elm-package.json");
        std::fs::write(&target, ORIGINAL_MANIFEST)?;
        std::fs::write(&substitute, SUBSTITUTE_MANIFEST)?;

        Ok(Self {
            _temp_dir: temp_dir,
            root,
            pkg_dir,
            alt_dir,
            target,
            substitute,
            test_id,
        })
    }

    /// Rule redirecting `target` to `substitute`
    pub fn config(&self) -> OverlayConfig {
        OverlayConfig::new(&self.substitute, &self.target)
    }

    /// Create a file under the temp root
    pub fn create_file(&self, relative_path: &str, content: &[u8]) -> anyhow::Result<PathBuf> {
        let path = self.root.join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Create a directory under the temp root
    pub fn create_dir(&self, relative_path: &str) -> anyhow::Result<PathBuf> {
        let path = self.root.join(relative_path);
        std::fs::create_dir_all(&path)?;
        Ok(path)
    }
}

/// File name of the preload library on this platform
pub fn shim_file_name() -> String {
    format!(
        "{}elm_overlay_shim{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_SUFFIX
    )
}

/// Build `elm-overlay-shim` with cargo and return the library path.
///
/// Nothing in the workspace links the cdylib, so `cargo test` alone never
/// produces it. `target_dir` must not be the target directory the calling
/// tests were built in; the outer cargo may still hold its lock.
pub fn build_shim_library(target_dir: &Path) -> anyhow::Result<PathBuf> {
    let workspace = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");
    let status = Command::new(env!("CARGO"))
        .args(["build", "--quiet", "--package", "elm-overlay-shim", "--target-dir"])
        .arg(target_dir)
        .current_dir(&workspace)
        .status()
        .context("Failed to run cargo")?;
    anyhow::ensure!(status.success(), "Building elm-overlay-shim failed: {}", status);

    let library = target_dir.join("debug").join(shim_file_name());
    anyhow::ensure!(
        library.is_file(),
        "Build succeeded but {} is missing",
        library.display()
    );
    Ok(library)
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}
