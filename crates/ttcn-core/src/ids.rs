//! Identifier types for definitions and template nodes.
//!
//! Both are plain indices: [`DefId`] into a [`DefinitionTable`](crate::DefinitionTable),
//! [`TemplateId`] into the template arena owned by the checker. Holding an id never
//! implies ownership of the node it names.

use std::fmt;

/// Identifies a definition (template, constant, variable, parameter, function).
///
/// # Example
///
/// ```
/// use ttcn_core::DefId;
///
/// let def = DefId::new(0);
/// assert_eq!(def.index(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(u32);

impl DefId {
    /// Create a new definition ID with the given index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the underlying index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "def_{}", self.0)
    }
}

impl From<u32> for DefId {
    fn from(index: u32) -> Self {
        Self::new(index)
    }
}

impl From<DefId> for u32 {
    fn from(id: DefId) -> Self {
        id.0
    }
}

/// Identifies a template node inside a template arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(u32);

impl TemplateId {
    /// Create a new template ID with the given index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the underlying index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tpl_{}", self.0)
    }
}

impl From<u32> for TemplateId {
    fn from(index: u32) -> Self {
        Self::new(index)
    }
}

impl From<TemplateId> for u32 {
    fn from(id: TemplateId) -> Self {
        id.0
    }
}
