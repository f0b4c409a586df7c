//! Per-thread re-entrancy guard.
//!
//! Resolution may call back into libc (canonicalization, environment
//! access). If any of that reaches an interposed primitive on the same
//! thread, the nested call must go straight to the real one.

use std::cell::Cell;

thread_local! {
    // const-initialized: no lazy init and no destructor registration
    static IN_OVERLAY: Cell<bool> = const { Cell::new(false) };
}

pub(crate) struct OverlayGuard(());

impl OverlayGuard {
    /// `None` when already inside the overlay on this thread, or when
    /// thread-local storage is being torn down.
    pub(crate) fn enter() -> Option<Self> {
        IN_OVERLAY
            .try_with(|active| {
                if active.replace(true) {
                    None
                } else {
                    Some(OverlayGuard(()))
                }
            })
            .ok()
            .flatten()
    }
}

impl Drop for OverlayGuard {
    fn drop(&mut self) {
        let _ = IN_OVERLAY.try_with(|active| active.set(false));
    }
}
