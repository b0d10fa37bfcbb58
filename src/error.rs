//! Library-boundary error type.
//!
//! Malformed Markdown is never an error (§7 of the design notes): a
//! construct that fails to match simply falls through to the next
//! recogniser. The only failure this crate's public API can return is
//! running into the [`Buffer`](crate::buffer::Buffer) allocation cap.

use thiserror::Error;

/// Failure modes that can escape [`crate::render`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RenderError {
    /// A buffer tried to grow past its allocation cap.
    #[error("buffer grow to {requested} bytes exceeds the {cap} byte cap")]
    OutOfMemory { requested: usize, cap: usize },
}

pub type Result<T> = std::result::Result<T, RenderError>;
