//! Construction-time tuning for `HashTable` and its façades.

use crate::error::{Error, Result};

/// Bucket count used by `new()` and restored by `clear()`.
pub const DEFAULT_BUCKETS: usize = 8;

/// Load factor bound used unless a config says otherwise.
pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 1.0;

/// Initial shape of a table: how many buckets to start with and how full
/// the table may get before it grows.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TableConfig {
    pub buckets: usize,
    pub max_load_factor: f32,
}

impl TableConfig {
    pub const fn new() -> Self {
        Self {
            buckets: DEFAULT_BUCKETS,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }

    /// A zero bucket count is raised to one when the table is built.
    pub const fn with_buckets(mut self, buckets: usize) -> Self {
        self.buckets = buckets;
        self
    }

    pub const fn with_max_load_factor(mut self, max_load_factor: f32) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_load_factor(self.max_load_factor)
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn validate_load_factor(f: f32) -> Result<()> {
    if f.is_finite() && f > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidLoadFactor(f))
    }
}
