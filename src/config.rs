//! Construction-time configuration for `TreeHashMap`.

use crate::error::{MapError, Result};

pub const DEFAULT_INITIAL_CAPACITY: usize = 16;
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;
/// Smallest accepted load factor. Below this, a handful of entries would
/// already need a bucket array too large to allocate.
pub const MIN_LOAD_FACTOR: f64 = 1.0 / 1024.0;

/// Bucket count and growth threshold used when a table is built.
///
/// Invalid values are rejected by [`TableConfig::validate`] rather than
/// clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    /// Number of buckets allocated up front. Must be at least 1.
    pub initial_capacity: usize,
    /// Maximum `len / capacity` ratio before the bucket array doubles.
    /// Must lie in `[MIN_LOAD_FACTOR, 1]`.
    pub load_factor: f64,
}

impl TableConfig {
    pub const fn new() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }

    pub const fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub const fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(MapError::InvalidCapacity {
                capacity: self.initial_capacity,
            });
        }
        // NaN fails both comparisons and is rejected here too.
        if !(self.load_factor >= MIN_LOAD_FACTOR && self.load_factor <= 1.0) {
            return Err(MapError::InvalidLoadFactor {
                load_factor: self.load_factor,
            });
        }
        Ok(())
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = TableConfig::default();
        assert_eq!(c.initial_capacity, 16);
        assert_eq!(c.load_factor, 0.75);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn zero_capacity_rejected() {
        let c = TableConfig::new().with_initial_capacity(0);
        assert_eq!(
            c.validate(),
            Err(MapError::InvalidCapacity { capacity: 0 })
        );
    }

    #[test]
    fn load_factor_bounds() {
        for lf in [0.0, -0.5, 1.0001, f64::INFINITY] {
            let c = TableConfig::new().with_load_factor(lf);
            assert!(
                matches!(c.validate(), Err(MapError::InvalidLoadFactor { .. })),
                "{lf} should be rejected"
            );
        }
        assert!(TableConfig::new()
            .with_load_factor(f64::NAN)
            .validate()
            .is_err());
        assert!(TableConfig::new().with_load_factor(1.0).validate().is_ok());
        assert!(TableConfig::new().with_load_factor(0.01).validate().is_ok());
    }

    #[test]
    fn tiny_load_factor_rejected() {
        for lf in [1e-20, 1e-9, f64::MIN_POSITIVE, MIN_LOAD_FACTOR / 2.0] {
            let c = TableConfig::new()
                .with_initial_capacity(1)
                .with_load_factor(lf);
            assert_eq!(
                c.validate(),
                Err(MapError::InvalidLoadFactor { load_factor: lf }),
                "{lf} should be rejected"
            );
        }
        let c = TableConfig::new()
            .with_initial_capacity(1)
            .with_load_factor(MIN_LOAD_FACTOR);
        assert!(c.validate().is_ok());
    }
}
