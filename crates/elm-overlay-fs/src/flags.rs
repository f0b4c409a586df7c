//! Open flags and the optional permission argument.
//!
//! `open(path, flags, ...)` only carries a mode when the C library will read
//! one. [`open_needs_mode`] evaluates the same predicate glibc and Darwin libc
//! use, so a forwarded call reads and passes the mode exactly when the
//! caller supplied it.

use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;

use libc::c_int;

/// Mode `fopen` uses for files it creates, before the umask.
pub const DEFAULT_CREATE_MODE: u32 = 0o666;

/// Whether `open` reads its third argument for these flags.
///
/// `O_CREAT` always does. On Linux `O_TMPFILE` does too; it is a multi-bit
/// flag, so all of its bits must be present.
#[inline]
pub fn open_needs_mode(flags: c_int) -> bool {
    if flags & libc::O_CREAT != 0 {
        return true;
    }
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        if flags & libc::O_TMPFILE == libc::O_TMPFILE {
            return true;
        }
    }
    false
}

/// Raw open request: `O_*` flags plus the permission bits that go with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenRequest {
    flags: c_int,
    mode: u32,
}

impl OpenRequest {
    pub fn from_raw(flags: c_int, mode: u32) -> Self {
        Self { flags, mode }
    }

    pub fn read_only() -> Self {
        Self::from_raw(libc::O_RDONLY, 0)
    }

    /// Parse an `fopen` mode string.
    ///
    /// The first character picks the base mode (`r`, `w`, `a`). Later
    /// characters: `+` read/write, `x` exclusive create, `e` close-on-exec;
    /// `b` and anything else is ignored. Returns `None` for an unknown base.
    pub fn from_fopen_mode(mode: &str) -> Option<Self> {
        let mut chars = mode.chars();
        let (mut access, mut extra) = match chars.next()? {
            'r' => (libc::O_RDONLY, 0),
            'w' => (libc::O_WRONLY, libc::O_CREAT | libc::O_TRUNC),
            'a' => (libc::O_WRONLY, libc::O_CREAT | libc::O_APPEND),
            _ => return None,
        };
        for c in chars {
            match c {
                '+' => access = libc::O_RDWR,
                'x' => extra |= libc::O_EXCL,
                'e' => extra |= libc::O_CLOEXEC,
                // glibc stops at the ccs= suffix
                ',' => break,
                _ => {}
            }
        }
        Some(Self::from_raw(access | extra, DEFAULT_CREATE_MODE))
    }

    pub fn flags(&self) -> c_int {
        self.flags
    }

    pub fn needs_mode(&self) -> bool {
        open_needs_mode(self.flags)
    }

    /// Permission bits, present only when the flags ask for them.
    pub fn mode(&self) -> Option<u32> {
        self.needs_mode().then_some(self.mode)
    }

    pub fn is_write(&self) -> bool {
        self.flags & libc::O_ACCMODE != libc::O_RDONLY
    }

    /// Translate into `OpenOptions`.
    ///
    /// Flags `OpenOptions` has no setter for travel as custom flags. A mode is
    /// set only when [`OpenRequest::mode`] returns one.
    pub fn to_open_options(&self) -> OpenOptions {
        let access = self.flags & libc::O_ACCMODE;
        let mut options = OpenOptions::new();
        options
            .read(access == libc::O_RDONLY || access == libc::O_RDWR)
            .write(access == libc::O_WRONLY || access == libc::O_RDWR)
            .append(self.flags & libc::O_APPEND != 0)
            .truncate(self.flags & libc::O_TRUNC != 0);

        if self.flags & libc::O_CREAT != 0 {
            if self.flags & libc::O_EXCL != 0 {
                options.create_new(true);
            } else {
                options.create(true);
            }
        }

        let handled =
            libc::O_ACCMODE | libc::O_APPEND | libc::O_TRUNC | libc::O_CREAT | libc::O_EXCL;
        options.custom_flags(self.flags & !handled);
        if let Some(mode) = self.mode() {
            options.mode(mode);
        }
        options
    }
}

impl Default for OpenRequest {
    fn default() -> Self {
        Self::read_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creat_needs_mode() {
        assert!(open_needs_mode(libc::O_CREAT));
        assert!(open_needs_mode(libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC));
        assert!(open_needs_mode(libc::O_RDWR | libc::O_CREAT | libc::O_EXCL));
    }

    #[test]
    fn test_plain_open_has_no_mode() {
        assert!(!open_needs_mode(libc::O_RDONLY));
        assert!(!open_needs_mode(libc::O_RDWR | libc::O_TRUNC));
        assert!(!open_needs_mode(libc::O_WRONLY | libc::O_APPEND | libc::O_CLOEXEC));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_tmpfile_needs_mode() {
        assert!(open_needs_mode(libc::O_TMPFILE | libc::O_RDWR));
        // O_DIRECTORY alone shares bits with O_TMPFILE but is not it
        assert!(!open_needs_mode(libc::O_DIRECTORY));
    }

    #[test]
    fn test_mode_only_reported_when_needed() {
        let create = OpenRequest::from_raw(libc::O_WRONLY | libc::O_CREAT, 0o640);
        assert_eq!(create.mode(), Some(0o640));

        let read = OpenRequest::from_raw(libc::O_RDONLY, 0o640);
        assert_eq!(read.mode(), None);
        assert!(!read.is_write());
    }

    #[test]
    fn test_fopen_read() {
        let request = OpenRequest::from_fopen_mode("r").unwrap();
        assert_eq!(request.flags(), libc::O_RDONLY);
        assert_eq!(request.mode(), None);

        let request = OpenRequest::from_fopen_mode("rb").unwrap();
        assert_eq!(request.flags(), libc::O_RDONLY);
    }

    #[test]
    fn test_fopen_write_creates_with_default_mode() {
        let request = OpenRequest::from_fopen_mode("w").unwrap();
        assert_eq!(
            request.flags(),
            libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC
        );
        assert_eq!(request.mode(), Some(DEFAULT_CREATE_MODE));
    }

    #[test]
    fn test_fopen_modifiers() {
        let append = OpenRequest::from_fopen_mode("a+").unwrap();
        assert_eq!(
            append.flags(),
            libc::O_RDWR | libc::O_CREAT | libc::O_APPEND
        );

        let exclusive = OpenRequest::from_fopen_mode("wxe").unwrap();
        assert_eq!(
            exclusive.flags(),
            libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC | libc::O_EXCL | libc::O_CLOEXEC
        );

        let update = OpenRequest::from_fopen_mode("r+b").unwrap();
        assert_eq!(update.flags(), libc::O_RDWR);
    }

    #[test]
    fn test_fopen_invalid_mode() {
        assert!(OpenRequest::from_fopen_mode("").is_none());
        assert!(OpenRequest::from_fopen_mode("z").is_none());
        assert!(OpenRequest::from_fopen_mode("+r").is_none());
    }

    #[test]
    fn test_open_options_create_file_with_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("created.json");
        let request =
            OpenRequest::from_raw(libc::O_WRONLY | libc::O_CREAT | libc::O_EXCL, 0o600);
        request.to_open_options().open(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        // O_EXCL maps to create_new
        assert!(request.to_open_options().open(&path).is_err());
    }

    #[test]
    fn test_open_options_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = OpenRequest::read_only()
            .to_open_options()
            .open(dir.path().join("missing"))
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
