//! Deterministic hash-based type identity.
//!
//! [`TypeHash`] is a 64-bit hash computed from a type's fully qualified name. The
//! same name always yields the same hash, so templates can name their governor
//! before the type registry has seen the declaration.
//!
//! # Examples
//!
//! ```
//! use ttcn_core::TypeHash;
//!
//! let int_hash = TypeHash::from_name("integer");
//! assert_eq!(int_hash, TypeHash::from_name("integer"));
//! assert_ne!(int_hash, TypeHash::from_name("float"));
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Separator used when deriving anonymous element types.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;
}

/// A deterministic 64-bit hash identifying a declared type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a qualified type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Hash of an anonymous type nested inside `self`, such as the element
    /// type of `record of record { ... }`.
    #[inline]
    pub fn nested(self, component: &str) -> Self {
        let inner = xxh64(component.as_bytes(), hash_constants::SEP);
        TypeHash(self.0.rotate_left(5) ^ inner ^ hash_constants::SEP)
    }

    /// Whether this is the empty hash.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

impl Default for TypeHash {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_is_deterministic() {
        assert_eq!(TypeHash::from_name("MyRec"), TypeHash::from_name("MyRec"));
    }

    #[test]
    fn different_names_differ() {
        assert_ne!(TypeHash::from_name("A"), TypeHash::from_name("B"));
    }

    #[test]
    fn nested_differs_from_parent() {
        let parent = TypeHash::from_name("MyList");
        assert_ne!(parent.nested("<elem>"), parent);
        assert_eq!(parent.nested("<elem>"), parent.nested("<elem>"));
    }

    #[test]
    fn empty_hash() {
        assert!(TypeHash::EMPTY.is_empty());
        assert!(TypeHash::default().is_empty());
        assert!(!TypeHash::from_name("integer").is_empty());
    }
}
