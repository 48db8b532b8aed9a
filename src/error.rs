//! Error type shared by the table and its map/set façades.
//!
//! Only conditions that cannot be expressed as an ordinary return value live
//! here. A missing key or a duplicate insert is a normal result, not an
//! `Error`; `KeyNotFound` exists solely for the `at()` accessors of the
//! façades.

use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The allocator refused to provide a bucket array.
    #[error("allocation failed while growing the bucket array: {0}")]
    OutOfMemory(#[from] TryReserveError),

    /// The requested bucket count does not fit in `usize`.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// A maximum load factor must be finite and strictly positive.
    #[error("invalid max load factor {0}; expected a finite value > 0")]
    InvalidLoadFactor(f32),

    #[error("key not found")]
    KeyNotFound,
}

pub type Result<T> = core::result::Result<T, Error>;
