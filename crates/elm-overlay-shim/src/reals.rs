//! Real Symbol Storage
//!
//! Our exported `open`/`fopen` shadow libc's, so the originals are looked up
//! with `dlsym(RTLD_NEXT, ..)`: the next definition after this library in
//! the search order. Lookups are cached per symbol.

use libc::{c_char, c_int, c_void};
use std::sync::atomic::{AtomicPtr, Ordering};

/// Lazily resolved pointer to the next definition of a libc symbol
pub struct RealSymbol {
    ptr: AtomicPtr<c_void>,
    name: &'static str,
}

impl RealSymbol {
    /// `name` must be NUL-terminated.
    pub const fn new(name: &'static str) -> Self {
        Self {
            ptr: AtomicPtr::new(std::ptr::null_mut()),
            name,
        }
    }

    /// The real function pointer, or null if no later object defines it.
    pub unsafe fn get(&self) -> *mut c_void {
        let p = self.ptr.load(Ordering::Acquire);
        if !p.is_null() {
            return p;
        }
        let f = libc::dlsym(libc::RTLD_NEXT, self.name.as_ptr() as *const c_char);
        self.ptr.store(f, Ordering::Release);
        f
    }
}

pub static REAL_OPEN: RealSymbol = RealSymbol::new("open\0");
pub static REAL_OPEN64: RealSymbol = RealSymbol::new("open64\0");
pub static REAL_OPEN_2: RealSymbol = RealSymbol::new("__open_2\0");
pub static REAL_OPEN64_2: RealSymbol = RealSymbol::new("__open64_2\0");
pub static REAL_FOPEN: RealSymbol = RealSymbol::new("fopen\0");
pub static REAL_FOPEN64: RealSymbol = RealSymbol::new("fopen64\0");

pub(crate) unsafe fn set_errno(e: c_int) {
    *libc::__errno_location() = e;
}
