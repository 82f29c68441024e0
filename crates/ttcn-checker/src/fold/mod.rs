//! Compile-time folding.
//!
//! Two constructs are reduced while checking when their operands are known:
//!
//! - `all from <target>` inside a list is replaced by copies of the target's
//!   elements ([`Checker::flatten`](crate::Checker::flatten)). A target only known at run time stays in
//!   place and marks the list with
//!   [`TemplateFlags::NEEDS_RUNTIME_EXPANSION`](crate::template::TemplateFlags).
//! - `left & right` on a string governor becomes a single value, `?` or
//!   pattern once both operands are constant.
//!
//! Both are idempotent: a folded list carries `FOLDED` and a folded
//! concatenation is no longer a concatenation.

mod all_from;
mod concat;

pub use all_from::ListCardinality;
