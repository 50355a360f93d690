//! # mapview Core
//!
//! Declarative key/value emission for map views, plus the `_stats` reduction
//! helpers used to read them back.
//!
//! This crate is `no_std` compatible (it needs an allocator) and provides:
//! - JSON-shaped values and composite keys with CouchDB collation
//! - `emit_array`: one emission per (field, value) pair of a document
//! - `_stats` rows and the reductions applied to them
//! - Key ranges for reading one field back out of a view
//!
//! ## Feature Flags
//!
//! - `std` (default): Enable standard library support
//! - `alloc`: Enable allocator for dynamic memory (included with `std`)
//! - `telemetry`: Enable tracing-based telemetry

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "alloc"))]
compile_error!("`mapview-core` requires the `alloc` feature.");

extern crate alloc;

pub mod emit;
pub mod range;
pub mod reduce;
pub mod value;

#[cfg(feature = "telemetry")]
pub mod telemetry;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::emit::*;
    pub use crate::range::*;
    pub use crate::reduce::*;
    pub use crate::value::*;
}

#[doc(hidden)]
pub mod __private {
    pub use alloc::vec;
}

/// Build a [`value::Key`] from anything convertible into [`value::Value`].
///
/// ```
/// use mapview_core::{key, value::Value};
///
/// let k = key!["a", 1, true];
/// assert_eq!(k, vec![Value::from("a"), Value::from(1), Value::Bool(true)]);
/// ```
#[macro_export]
macro_rules! key {
    ($($component:expr),* $(,)?) => {
        $crate::__private::vec![$($crate::value::Value::from($component)),*]
    };
}

/// Result type for mapview core operations
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for mapview core operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The reduce row is a bare scalar where a `_stats` row was required
    NotStats,
    /// A non-numeric value reached a numeric reduction
    NonNumeric,
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::NotStats => write!(f, "reduce row is not a _stats row"),
            Error::NonNumeric => write!(f, "non-numeric value in numeric reduction"),
        }
    }
}
