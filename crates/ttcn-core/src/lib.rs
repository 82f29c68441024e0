//! Core types shared by the TTCN-3 template checker.
//!
//! Everything the checker consumes but does not decide lives here: source
//! locations, type identity, the declared-type oracle, the value model and its
//! constant folder, the definition table, the restriction lattice and the
//! diagnostic sink.
//!
//! ## Modules
//!
//! - [`defs`]: definitions templates can refer to
//! - [`diagnostics`]: the diagnostic sink
//! - [`error`]: user diagnostics and internal errors
//! - [`eval`]: compile-time folding of values
//! - [`ids`]: definition and template node identifiers
//! - [`restriction`]: the four-state restriction lattice
//! - [`span`]: source locations
//! - [`type_hash`]: deterministic type identity
//! - [`types`]: declared types and the type oracle
//! - [`value`]: the value model

pub mod defs;
pub mod diagnostics;
pub mod error;
pub mod eval;
pub mod ids;
pub mod restriction;
pub mod span;
pub mod type_hash;
pub mod types;
pub mod value;

pub use defs::{DefKind, Definition, DefinitionTable, Returns};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{CheckError, InternalError};
pub use eval::{ConstantFolder, Folded};
pub use ids::{DefId, TemplateId};
pub use restriction::{Restriction, is_less_restrictive, sub_restriction};
pub use span::Span;
pub use type_hash::TypeHash;
pub use types::{
    ArrayDimension, Field, ParamDirection, SignatureParam, StringKind, TypeDef, TypeKind,
    TypeOracle, TypeRegistry,
};
pub use value::{Reference, SubRef, Value};
