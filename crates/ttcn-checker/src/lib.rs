//! Semantic checking of TTCN-3 templates.
//!
//! A [`Checker`] validates template trees stored in a
//! [`TemplateArena`](template::TemplateArena) against their governing types.
//! It binds governors, checks structural compatibility per type category,
//! folds `all from` and concatenation where the operands are known, validates
//! length restrictions and enforces template restrictions. Problems are
//! reported to a [`ttcn_core::Diagnostics`] sink; only defects in the checker
//! itself surface as [`ttcn_core::InternalError`].
//!
//! ## Modules
//!
//! - [`check`]: structural compatibility per governor category
//! - [`fold`]: `all from` splicing and concatenation folding
//! - [`template`]: the template node model and its arena
//!
//! Governor binding, reference resolution, length restrictions and template
//! restrictions are methods on [`Checker`] defined in private modules.

pub mod check;
mod config;
mod context;
pub mod fold;
mod governor;
mod length;
mod refchain;
mod resolve;
mod restriction;
pub mod template;

#[cfg(test)]
mod test_support;

pub use check::{CheckOptions, Checked, Completeness};
pub use config::CheckerConfig;
pub use context::Checker;
pub use fold::ListCardinality;
pub use refchain::ReferenceChain;
pub use template::{
    CharPattern, LengthRestriction, ListShape, NamedTemplate, Template, TemplateArena,
    TemplateFlags, TemplateInstance, TemplateKind, ValueRange,
};
