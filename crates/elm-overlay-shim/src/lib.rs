//! # elm-overlay-shim
//!
//! LD_PRELOAD / DYLD_INSERT_LIBRARIES shim that makes a host process read a
//! substitute `elm-package.json`.
//!
//! Every `open`/`fopen` in the process goes through
//! [`elm_overlay_fs::resolve_from_env`] first. Only a request for the bare
//! literal `elm-package.json` whose canonical path equals
//! `INSTEAD_OF_ELM_PACKAGE` is rewritten, to `USE_ELM_PACKAGE`. Everything
//! else, including the real call's return value and `errno`, passes through.
//!
//! Installation differs per platform:
//! - macOS: `__DATA,__interpose` table read by dyld at load time
//! - Linux: exported `open`/`open64`/`fopen`/`fopen64` (and glibc's
//!   fortified `__open_2`/`__open64_2`) preempt libc by symbol resolution
//!   order; originals come from `dlsym(RTLD_NEXT, ..)`
//!
//! Set `ELM_OVERLAY_DEBUG=1` to print each substitution to stderr.

// Allow unsafe FFI functions without safety docs - these are inherently unsafe C ABI
#![allow(clippy::missing_safety_doc)]

#[macro_use]
mod macros;

mod guard;
pub mod interpose;
mod open;
#[cfg(target_os = "linux")]
mod reals;

#[cfg(target_os = "macos")]
pub use interpose::*;

/// Predicate the C variadic bridge uses to decide whether to `va_arg` a mode.
#[cfg(target_os = "macos")]
#[no_mangle]
pub extern "C" fn elm_overlay_open_needs_mode(flags: libc::c_int) -> libc::c_int {
    elm_overlay_fs::open_needs_mode(flags) as libc::c_int
}
