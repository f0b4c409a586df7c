//! Installation of the open/fopen replacements.
//! Safety: All extern "C" functions here are dangerous FFI and must be used correctly.

use libc::{c_char, c_int, c_uint, FILE};

use crate::open::{fopen_with, open_with};

// ============================================================================
// macOS: load-time substitution table
// ============================================================================

#[cfg(target_os = "macos")]
#[repr(C)]
pub struct Interpose {
    pub new_func: *const (),
    pub old_func: *const (),
}

#[cfg(target_os = "macos")]
unsafe impl Sync for Interpose {}

#[cfg(target_os = "macos")]
extern "C" {
    // src/c/variadic_open.c
    fn elm_overlay_open_variadic(path: *const c_char, flags: c_int, ...) -> c_int;
}

#[cfg(target_os = "macos")]
#[link_section = "__DATA,__interpose"]
#[used]
pub static IT_OPEN: Interpose = Interpose {
    new_func: elm_overlay_open_variadic as _,
    old_func: libc::open as _,
};

#[cfg(target_os = "macos")]
#[link_section = "__DATA,__interpose"]
#[used]
pub static IT_FOPEN: Interpose = Interpose {
    new_func: fopen_overlay as _,
    old_func: libc::fopen as _,
};

/// Called by the C variadic bridge once it has decided whether a mode exists.
///
/// dyld does not rewire calls made from the interposing image itself, so
/// `libc::open` here is the genuine one.
#[cfg(target_os = "macos")]
#[no_mangle]
pub unsafe extern "C" fn elm_overlay_open(
    path: *const c_char,
    flags: c_int,
    has_mode: c_int,
    mode: c_uint,
) -> c_int {
    let mode = (has_mode != 0).then_some(mode);
    open_with(libc::open, path, flags, mode)
}

#[cfg(target_os = "macos")]
#[no_mangle]
pub unsafe extern "C" fn fopen_overlay(path: *const c_char, mode: *const c_char) -> *mut FILE {
    fopen_with(libc::fopen, path, mode)
}

// ============================================================================
// Linux: link-order preemption
// ============================================================================
//
// On x86_64 and aarch64 Linux a variadic argument travels in the same
// register as a third fixed parameter would, so `open` can be defined with a
// fixed `mode` slot. The slot holds unspecified data unless the flags call
// for a mode, and it is only read and forwarded in that case.

#[cfg(target_os = "linux")]
unsafe fn open_next(
    real: &crate::reals::RealSymbol,
    path: *const c_char,
    flags: c_int,
    mode_slot: c_uint,
) -> c_int {
    let ptr = real.get();
    if ptr.is_null() {
        crate::reals::set_errno(libc::ENOSYS);
        return -1;
    }
    let real = std::mem::transmute::<*mut libc::c_void, crate::open::OpenFn>(ptr);
    let mode = elm_overlay_fs::open_needs_mode(flags).then_some(mode_slot);
    open_with(real, path, flags, mode)
}

#[cfg(target_os = "linux")]
unsafe fn open2_next(real: &crate::reals::RealSymbol, path: *const c_char, flags: c_int) -> c_int {
    let ptr = real.get();
    if ptr.is_null() {
        crate::reals::set_errno(libc::ENOSYS);
        return -1;
    }
    let real = std::mem::transmute::<*mut libc::c_void, crate::open::Open2Fn>(ptr);
    crate::open::open2_with(real, path, flags)
}

#[cfg(target_os = "linux")]
unsafe fn fopen_next(
    real: &crate::reals::RealSymbol,
    path: *const c_char,
    mode: *const c_char,
) -> *mut FILE {
    let ptr = real.get();
    if ptr.is_null() {
        crate::reals::set_errno(libc::ENOSYS);
        return std::ptr::null_mut();
    }
    let real = std::mem::transmute::<*mut libc::c_void, crate::open::FopenFn>(ptr);
    fopen_with(real, path, mode)
}

#[cfg(target_os = "linux")]
#[no_mangle]
pub unsafe extern "C" fn open(path: *const c_char, flags: c_int, mode: c_uint) -> c_int {
    open_next(&crate::reals::REAL_OPEN, path, flags, mode)
}

#[cfg(target_os = "linux")]
#[no_mangle]
pub unsafe extern "C" fn open64(path: *const c_char, flags: c_int, mode: c_uint) -> c_int {
    open_next(&crate::reals::REAL_OPEN64, path, flags, mode)
}

// Fortified entry points: `-D_FORTIFY_SOURCE` builds call these for `open`
// with non-constant flags and no mode.
#[cfg(target_os = "linux")]
#[no_mangle]
pub unsafe extern "C" fn __open_2(path: *const c_char, flags: c_int) -> c_int {
    open2_next(&crate::reals::REAL_OPEN_2, path, flags)
}

#[cfg(target_os = "linux")]
#[no_mangle]
pub unsafe extern "C" fn __open64_2(path: *const c_char, flags: c_int) -> c_int {
    open2_next(&crate::reals::REAL_OPEN64_2, path, flags)
}

#[cfg(target_os = "linux")]
#[no_mangle]
pub unsafe extern "C" fn fopen(path: *const c_char, mode: *const c_char) -> *mut FILE {
    fopen_next(&crate::reals::REAL_FOPEN, path, mode)
}

#[cfg(target_os = "linux")]
#[no_mangle]
pub unsafe extern "C" fn fopen64(path: *const c_char, mode: *const c_char) -> *mut FILE {
    fopen_next(&crate::reals::REAL_FOPEN64, path, mode)
}
