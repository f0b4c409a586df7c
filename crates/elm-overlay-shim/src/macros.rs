/// Diagnostics for a substitution, written straight to fd 2.
///
/// Off unless `ELM_OVERLAY_DEBUG` is set. Formats into a stack buffer and
/// uses `write(2)` so nothing here opens files or installs a subscriber in
/// the host process.
macro_rules! overlay_debug {
    ($($arg:tt)*) => {
        if $crate::macros::debug_enabled() {
            use std::fmt::Write;
            let mut buf = [0u8; 512];
            let mut writer = $crate::macros::StackWriter::new(&mut buf);
            let pid = unsafe { libc::getpid() };
            let _ = write!(writer, "[elm-overlay][{}] ", pid);
            let _ = write!(writer, $($arg)*);
            let _ = writeln!(writer);

            let msg = writer.as_bytes();
            unsafe {
                libc::write(2, msg.as_ptr() as *const libc::c_void, msg.len());
            }
        }
    };
}

pub(crate) fn debug_enabled() -> bool {
    std::env::var_os(elm_overlay_config::DEBUG_ENV).is_some()
}

/// `fmt::Write` over a fixed buffer; output past the end is dropped.
pub(crate) struct StackWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> StackWriter<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.pos]
    }
}

impl<'a> std::fmt::Write for StackWriter<'a> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.pos;
        let to_copy = std::cmp::min(bytes.len(), remaining);
        self.buf[self.pos..self.pos + to_copy].copy_from_slice(&bytes[..to_copy]);
        self.pos += to_copy;
        Ok(())
    }
}
