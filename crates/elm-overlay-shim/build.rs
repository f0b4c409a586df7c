//! Build script for elm-overlay-shim
//!
//! Compiles the C variadic replacement for `open` on macOS. Apple arm64
//! passes variadic arguments on the stack, so the optional mode has to be
//! read with `va_arg`, which stable Rust cannot do in a callee.

fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os == "macos" {
        println!("cargo:rerun-if-changed=src/c/variadic_open.c");

        cc::Build::new()
            .file("src/c/variadic_open.c")
            .opt_level(2)
            .compile("variadic_open");
    }
}
