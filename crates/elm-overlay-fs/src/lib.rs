//! # elm-overlay-fs
//!
//! Decides when a request for `elm-package.json` should open a different file,
//! and provides a [`FileAccess`] layer that applies that decision.
//!
//! - [`resolver`]: the pure redirect decision ([`PathResolver`], [`resolve_from_env`])
//! - [`flags`]: open flags, and when the optional permission argument is present
//! - [`fs`]: [`FileAccess`] with [`RealFs`] and the [`OverlayFs`] decorator
//!
//! The preloaded shim uses [`resolve_from_env`] and [`open_needs_mode`]; code
//! that can take a dependency on this crate should hold a [`FileAccess`] built
//! by [`create_file_access`] instead of relying on interposition.

pub mod flags;
pub mod fs;
pub mod resolver;

pub use elm_overlay_config::OverlayConfig;
pub use flags::{open_needs_mode, OpenRequest};
pub use fs::{create_file_access, FileAccess, OverlayFs, RealFs};
pub use resolver::{is_target, resolve_from_env, PathResolver, Redirect, TARGET_FILENAME};
