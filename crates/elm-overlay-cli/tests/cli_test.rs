//! E2E tests for the elm-overlay launcher
//!
//! These run the built binary. The preload test also builds the shim library
//! with cargo.

use std::path::Path;
use std::process::{Command, Output};

use elm_overlay_config::testing::TestEnvironment;
use elm_overlay_config::{
    LauncherConfig, DYLD_INSERT_ENV, INSTEAD_OF_ENV, LD_PRELOAD_ENV, SHIM_ENV, USE_ENV,
};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_elm-overlay")
}

/// Launcher with none of the overlay variables inherited from the test runner
fn elm_overlay() -> Command {
    let mut cmd = Command::new(bin());
    for key in [USE_ENV, INSTEAD_OF_ENV, SHIM_ENV, LD_PRELOAD_ENV, DYLD_INSERT_ENV] {
        cmd.env_remove(key);
    }
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("Failed to execute elm-overlay")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ========== E2E: env ==========

#[test]
fn e2e_env_prints_exports() {
    let env = TestEnvironment::new().unwrap();
    let shim = env.create_file("lib/libshim.so", b"").unwrap();

    let output = run(elm_overlay()
        .args(["env", "--use"])
        .arg(&env.substitute)
        .arg("--instead-of")
        .arg(&env.target)
        .arg("--shim")
        .arg(&shim)
        .env(LD_PRELOAD_ENV, "/existing/lib.so"));

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains(&format!("export {}='{}'", USE_ENV, env.substitute.display())));
    assert!(out.contains(&format!("export {}='{}'", INSTEAD_OF_ENV, env.target.display())));
    assert!(out.contains(&format!(
        "export {}='{}:/existing/lib.so'",
        LD_PRELOAD_ENV,
        shim.display()
    )));
    assert!(out.contains(&format!("export {}='{}'", DYLD_INSERT_ENV, shim.display())));
}

#[test]
fn e2e_env_reads_rule_from_environment() {
    let env = TestEnvironment::new().unwrap();
    let shim = env.create_file("lib/libshim.so", b"").unwrap();

    let output = run(elm_overlay()
        .arg("env")
        .env(USE_ENV, &env.substitute)
        .env(INSTEAD_OF_ENV, &env.target)
        .env(SHIM_ENV, &shim));

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains(&format!("export {}='{}'", LD_PRELOAD_ENV, shim.display())));
}

#[test]
fn e2e_env_without_rule_fails() {
    let output = run(elm_overlay().arg("env"));

    assert!(!output.status.success());
    assert!(stderr(&output).contains("--use"));
}

#[test]
fn e2e_env_with_missing_shim_fails() {
    let env = TestEnvironment::new().unwrap();

    let output = run(elm_overlay()
        .args(["env", "--use"])
        .arg(&env.substitute)
        .arg("--instead-of")
        .arg(&env.target)
        .arg("--shim")
        .arg(env.root.join("missing.so")));

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Shim library not found"));
}

// ========== E2E: resolve ==========

#[test]
fn e2e_resolve_bare_name_in_package_dir() {
    let env = TestEnvironment::new().unwrap();

    let output = run(elm_overlay()
        .args(["resolve", "--use"])
        .arg(&env.substitute)
        .arg("--instead-of")
        .arg(&env.target)
        .arg("--dir")
        .arg(&env.pkg_dir));

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), env.substitute.display().to_string());
}

#[test]
fn e2e_resolve_prefixed_name_is_untouched() {
    let env = TestEnvironment::new().unwrap();

    let output = run(elm_overlay()
        .args(["resolve", "--use"])
        .arg(&env.substitute)
        .arg("--instead-of")
        .arg(&env.target)
        .arg("--dir")
        .arg(&env.pkg_dir)
        .arg("./elm-package.json"));

    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "./elm-package.json");
}

#[test]
fn e2e_resolve_uses_config_file() {
    let env = TestEnvironment::new().unwrap();
    let config_path = env
        .create_file(
            "overlay.toml",
            format!(
                "[overlay]\nuse = {:?}\ninstead_of = {:?}\n",
                env.substitute.display().to_string(),
                env.target.display().to_string()
            )
            .as_bytes(),
        )
        .unwrap();

    let output = run(elm_overlay()
        .arg("--config")
        .arg(&config_path)
        .args(["resolve", "--dir"])
        .arg(&env.pkg_dir));

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), env.substitute.display().to_string());
}

// ========== E2E: config ==========

#[test]
fn e2e_config_returns_valid_toml() {
    let output = run(elm_overlay()
        .arg("config")
        .env(USE_ENV, "/alt/elm-package.json"));

    assert!(output.status.success());
    let parsed: LauncherConfig = toml::from_str(&stdout(&output)).expect("valid TOML");
    assert_eq!(
        parsed.overlay.use_path.as_deref(),
        Some(Path::new("/alt/elm-package.json"))
    );
    assert!(parsed.overlay.instead_of.is_none());
}

#[test]
fn e2e_missing_config_file_fails() {
    let output = run(elm_overlay()
        .args(["--config", "/nonexistent/overlay.toml", "config"]));

    assert!(!output.status.success());
}

// ========== E2E: run ==========

#[test]
fn e2e_run_propagates_exit_code() {
    let env = TestEnvironment::new().unwrap();
    let shim = env.create_file("lib/libshim.so", b"").unwrap();

    // The dynamic loader reports the placeholder shim and carries on.
    let output = run(elm_overlay()
        .args(["run", "--use"])
        .arg(&env.substitute)
        .arg("--instead-of")
        .arg(&env.target)
        .arg("--shim")
        .arg(&shim)
        .args(["--", "sh", "-c", "exit 7"]));

    assert_eq!(output.status.code(), Some(7), "stderr: {}", stderr(&output));
}

// System binaries on macOS drop DYLD_* variables
#[cfg(target_os = "linux")]
#[test]
fn e2e_run_substitutes_manifest_for_child() {
    use elm_overlay_config::testing::{build_shim_library, SUBSTITUTE_MANIFEST};

    let target_dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("elm-overlay-shim");
    let shim = build_shim_library(&target_dir).expect("Failed to build elm-overlay-shim");
    let env = TestEnvironment::new().unwrap();

    let output = run(elm_overlay()
        .args(["run", "--use"])
        .arg(&env.substitute)
        .arg("--instead-of")
        .arg(&env.target)
        .arg("--shim")
        .arg(&shim)
        .arg("--cwd")
        .arg(&env.pkg_dir)
        .args(["--", "cat", "elm-package.json"]));

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), SUBSTITUTE_MANIFEST);
}
