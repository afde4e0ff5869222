//! # Formats Module
//!
//! Packed (persisted) form of the shared state and its encodings.
//!
//! This module contains:
//! - [`Packed`]: the keyed record (`GlobalAges`, `TeamAges`) and the
//!   `pack`/`unpack` mapping to and from [`crate::SharedStateStore`]
//! - [`Encoding`]: JSON (tolerant keyed record) and framed postcard binary
//!
//! Note: File and database I/O live in [`crate::storage`]. This module only
//! handles format conversion (pure transformations).

mod encoding;
mod packed;

pub use encoding::*;
pub use packed::*;
