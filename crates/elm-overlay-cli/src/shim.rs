//! Locating the preload library.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::path::{Path, PathBuf};

use anyhow::Result;
use elm_overlay_config::{log_cli_debug, SHIM_ENV};

/// File name of the shim for the host platform.
pub fn shim_file_name() -> String {
    format!("{}elm_overlay_shim{}", DLL_PREFIX, DLL_SUFFIX)
}

/// Search locations, in order, when no path was given explicitly.
pub fn candidate_paths(exe: Option<&Path>) -> Vec<PathBuf> {
    let name = shim_file_name();
    let mut candidates = Vec::new();

    // Development: next to the binary, or in its deps/ during `cargo test`
    if let Some(dir) = exe.and_then(Path::parent) {
        candidates.push(dir.join(&name));
        candidates.push(dir.join("deps").join(&name));
        if let Some(profile_dir) = dir.parent() {
            candidates.push(profile_dir.join(&name));
        }
    }

    candidates.push(PathBuf::from("target/release").join(&name));
    candidates.push(PathBuf::from("target/debug").join(&name));
    // Installed location
    candidates.push(PathBuf::from("/usr/local/lib/elm-overlay").join(&name));

    candidates
}

/// An explicit path must exist; otherwise the first existing candidate wins.
pub fn find_shim_library(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Shim library not found: {}", path.display());
        }
        return Ok(path.to_path_buf());
    }

    let exe = std::env::current_exe().ok();
    for candidate in candidate_paths(exe.as_deref()) {
        log_cli_debug!("Checking shim location", path = &*candidate.to_string_lossy());
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    anyhow::bail!(
        "Could not find {}. \n\
         Build it with: cargo build --release -p elm-overlay-shim\n\
         or point {} (or --shim) at the library.",
        shim_file_name(),
        SHIM_ENV
    )
}
