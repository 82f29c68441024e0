//! The template model.
//!
//! A template is a tree of [`Template`] nodes stored in a [`TemplateArena`].
//! Children are referenced by [`ttcn_core::TemplateId`]; the tree is mutated in
//! place while checking, but a node's variant only changes through
//! [`TemplateArena::replace_kind`].

mod arena;
mod node;

pub use arena::{TemplateArena, transition_allowed};
pub use node::{
    CharPattern, IndexedTemplate, LengthRestriction, ListShape, NamedTemplate, PatternSegment,
    Template, TemplateFlags, TemplateInstance, TemplateKind, ValueRange,
};
