//! Error types for table construction, structural inserts and cursor use.
//!
//! Absence of a key is never an error; lookups return `Option`.

use thiserror::Error;

/// Result alias for fallible table operations.
pub type Result<T> = std::result::Result<T, MapError>;

/// Errors surfaced by `TreeHashMap` construction and `KeyCursor`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("invalid initial capacity {capacity}: must be at least 1")]
    InvalidCapacity { capacity: usize },

    #[error("invalid load factor {load_factor}: must lie in [1/1024, 1]")]
    InvalidLoadFactor { load_factor: f64 },

    /// `next_key` was called after the cursor had already produced every key.
    #[error("no such element: `{operation}` called on an exhausted cursor after {emitted} keys")]
    NoSuchElement {
        operation: &'static str,
        emitted: usize,
    },
}

/// Structural insert into an `OrderedTree` failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    /// The key is already present; the tree was left unchanged.
    #[error("duplicate key: use `update` to replace the value")]
    DuplicateKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_structured_fields() {
        let e = MapError::NoSuchElement {
            operation: "next_key",
            emitted: 3,
        };
        assert_eq!(
            e.to_string(),
            "no such element: `next_key` called on an exhausted cursor after 3 keys"
        );
        let e = MapError::InvalidLoadFactor { load_factor: 1.5 };
        assert!(e.to_string().contains("1.5"));
        assert_eq!(
            MapError::InvalidCapacity { capacity: 0 }.to_string(),
            "invalid initial capacity 0: must be at least 1"
        );
    }
}
