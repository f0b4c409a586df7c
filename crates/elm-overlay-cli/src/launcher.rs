//! Building the overlay environment and launching under it.

use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use elm_overlay_config::{
    log_cli_debug, log_cli_info, log_cli_warn, LauncherConfig, OverlayConfig, INSTEAD_OF_ENV,
    USE_ENV,
};
use elm_overlay_fs::PathResolver;

use crate::RuleArgs;

/// Flags win over the already-merged file and environment values.
pub fn merge(config: &LauncherConfig, args: &RuleArgs) -> LauncherConfig {
    let mut merged = config.clone();
    if let Some(path) = &args.use_path {
        merged.overlay.use_path = Some(path.clone());
    }
    if let Some(path) = &args.instead_of {
        merged.overlay.instead_of = Some(path.clone());
    }
    if let Some(path) = &args.shim {
        merged.overlay.shim = Some(path.clone());
    }
    merged
}

/// Both halves of the rule, made absolute.
///
/// The manifest being replaced must exist: the shim compares canonical
/// paths, so it is canonicalized here once. The substitute only needs to be
/// absolute so that it still resolves after a `--cwd` change.
pub fn require_rule(config: &LauncherConfig) -> Result<OverlayConfig> {
    let use_path = config
        .overlay
        .use_path
        .as_deref()
        .with_context(|| format!("No substitute manifest: pass --use or set {}", USE_ENV))?;
    let instead_of = config.overlay.instead_of.as_deref().with_context(|| {
        format!(
            "No manifest to replace: pass --instead-of or set {}",
            INSTEAD_OF_ENV
        )
    })?;

    let instead_of = instead_of
        .canonicalize()
        .with_context(|| format!("Failed to resolve manifest: {}", instead_of.display()))?;
    let use_path = normalize_or_original(use_path)?;

    if !use_path.exists() {
        log_cli_warn!(
            "Substitute manifest does not exist yet",
            path = &*use_path.to_string_lossy()
        );
    }

    Ok(OverlayConfig::new(use_path, instead_of))
}

/// Canonical path when it exists, otherwise joined onto the working directory.
fn normalize_or_original(path: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    Ok(cwd.join(path))
}

/// Variables a child needs, layered over the current environment.
pub fn overlay_vars(overlay: &OverlayConfig, shim: &Path) -> Vec<(&'static str, OsString)> {
    overlay.overlay_env(shim, |key| std::env::var_os(key))
}

/// Run `command` under the overlay and return its exit code.
pub fn cmd_run(
    overlay: &OverlayConfig,
    shim: &Path,
    cwd: Option<&Path>,
    command: &[String],
) -> Result<i32> {
    let (program, args) = command.split_first().context("No command specified")?;

    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    for (key, value) in overlay_vars(overlay, shim) {
        log_cli_debug!("Setting overlay variable", key = key, value = &*value.to_string_lossy());
        cmd.env(key, value);
    }

    log_cli_info!(
        "Running with overlay",
        program = program.as_str(),
        instead_of = &*overlay.instead_of.to_string_lossy(),
        use_path = &*overlay.use_path.to_string_lossy()
    );

    let status = cmd
        .status()
        .with_context(|| format!("Failed to execute: {}", program))?;

    Ok(status.code().unwrap_or(1))
}

/// `export KEY='value'` lines for `eval`.
pub fn cmd_env(overlay: &OverlayConfig, shim: &Path) -> Vec<u8> {
    render_exports(&overlay_vars(overlay, shim))
}

/// Values are written byte for byte; paths need not be UTF-8.
pub fn render_exports(vars: &[(&str, OsString)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (key, value) in vars {
        out.extend_from_slice(b"export ");
        out.extend_from_slice(key.as_bytes());
        out.push(b'=');
        out.extend_from_slice(&shell_quote(value.as_bytes()));
        out.push(b'\n');
    }
    out
}

/// POSIX single-quote escaping.
pub fn shell_quote(value: &[u8]) -> Vec<u8> {
    let mut quoted = Vec::with_capacity(value.len() + 2);
    quoted.push(b'\'');
    for &byte in value {
        if byte == b'\'' {
            quoted.extend_from_slice(br"'\''");
        } else {
            quoted.push(byte);
        }
    }
    quoted.push(b'\'');
    quoted
}

/// The path the shim would actually open for `requested` made from `dir`.
///
/// Uses the rule exactly as the shim would see it in the environment, so a
/// missing half or a non-canonical `instead_of` shows up as no substitution.
pub fn cmd_resolve(config: &LauncherConfig, dir: Option<&Path>, requested: &Path) -> PathBuf {
    let resolver = match config.overlay_config() {
        Some(rule) => PathResolver::new(rule),
        None => {
            log_cli_warn!("No overlay rule configured; nothing is substituted");
            PathResolver::disabled()
        }
    };
    let resolver = match dir {
        Some(dir) => resolver.with_base_dir(dir),
        None => resolver,
    };
    resolver.resolve(requested).into_owned()
}
