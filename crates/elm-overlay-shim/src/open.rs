//! Shared open/fopen forwarding.
//!
//! Both installation mechanisms end up here: compute the effective path,
//! then call the real primitive with the caller's remaining arguments.

use std::ffi::{CStr, CString, OsStr};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::Path;

use elm_overlay_fs::{is_target, resolve_from_env, Redirect};
use libc::{c_char, c_int, c_uint};

use crate::guard::OverlayGuard;

/// Signature of the real `open`/`open64`.
pub(crate) type OpenFn = unsafe extern "C" fn(*const c_char, c_int, ...) -> c_int;
/// Signature of glibc's fortified `__open_2`/`__open64_2` (never takes a mode).
#[cfg(target_os = "linux")]
pub(crate) type Open2Fn = unsafe extern "C" fn(*const c_char, c_int) -> c_int;
/// Signature of the real `fopen`/`fopen64`.
pub(crate) type FopenFn = unsafe extern "C" fn(*const c_char, *const c_char) -> *mut libc::FILE;

/// Substitute path for `path`, or `None` to open it as requested.
pub(crate) unsafe fn substitute_for(path: *const c_char) -> Option<CString> {
    if path.is_null() {
        return None;
    }
    let requested = Path::new(OsStr::from_bytes(CStr::from_ptr(path).to_bytes()));
    if !is_target(requested) {
        return None;
    }

    let _guard = OverlayGuard::enter()?;
    match resolve_from_env(requested) {
        Redirect::Passthrough => None,
        Redirect::Substitute(replacement) => {
            overlay_debug!("{} -> {}", requested.display(), replacement.display());
            CString::new(replacement.into_os_string().into_vec()).ok()
        }
    }
}

/// Call `real` with the mode argument only when the caller supplied one.
#[inline]
pub(crate) unsafe fn forward_open(
    real: OpenFn,
    path: *const c_char,
    flags: c_int,
    mode: Option<c_uint>,
) -> c_int {
    match mode {
        Some(mode) => real(path, flags, mode),
        None => real(path, flags),
    }
}

/// Resolve, then forward to `real`.
pub(crate) unsafe fn open_with(
    real: OpenFn,
    path: *const c_char,
    flags: c_int,
    mode: Option<c_uint>,
) -> c_int {
    let substitute = substitute_for(path);
    let actual = substitute.as_ref().map_or(path, |p| p.as_ptr());
    forward_open(real, actual, flags, mode)
}

/// Resolve, then forward to `real`.
#[cfg(target_os = "linux")]
pub(crate) unsafe fn open2_with(real: Open2Fn, path: *const c_char, flags: c_int) -> c_int {
    let substitute = substitute_for(path);
    let actual = substitute.as_ref().map_or(path, |p| p.as_ptr());
    real(actual, flags)
}

/// Resolve, then forward to `real`.
pub(crate) unsafe fn fopen_with(
    real: FopenFn,
    path: *const c_char,
    mode: *const c_char,
) -> *mut libc::FILE {
    let substitute = substitute_for(path);
    let actual = substitute.as_ref().map_or(path, |p| p.as_ptr());
    real(actual, mode)
}
