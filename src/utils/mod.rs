//! Utility functions.
//!
//! - [`bytes`] - Byte-level term helpers (trimming, word splitting)

pub mod bytes;

pub use bytes::*;
