//! Semantic checking of TTCN-3 templates.
//!
//! This crate re-exports [`ttcn_core`], the model the checker consumes
//! (types, values, definitions, diagnostics), and [`ttcn_checker`], the
//! checker itself. [`check_module`] runs the checker over every template
//! definition of a definition table.
//!
//! ```
//! use ttcn_templates::prelude::*;
//!
//! let types = TypeRegistry::with_builtins();
//! let mut defs = DefinitionTable::new();
//! let mut arena = TemplateArena::new();
//! let mut diags = Diagnostics::new();
//!
//! let body = arena.add(TemplateKind::AnyValue, Span::default());
//! defs.add(Definition::new(
//!     "t",
//!     Some(TypeHash::from_name("integer")),
//!     DefKind::Template {
//!         body,
//!         restriction: Restriction::Value,
//!         modifies: None,
//!         parameterized: false,
//!     },
//!     Span::default(),
//! ));
//!
//! let config = CheckerConfig::default();
//! let checked = check_module(&config, &types, &defs, &mut arena, &mut diags).unwrap();
//! assert_eq!(checked, 1);
//! assert!(diags.mentions("does not allow usage of any value"));
//! ```

pub use ttcn_checker as checker;
pub use ttcn_core as core;

use ttcn_checker::{Checker, CheckerConfig, TemplateArena};
use ttcn_core::{DefKind, DefinitionTable, Diagnostics, InternalError, TypeOracle};

pub mod prelude {
    pub use ttcn_checker::{
        CharPattern, CheckOptions, Checked, Checker, CheckerConfig, Completeness,
        LengthRestriction, ListCardinality, ListShape, NamedTemplate, Template, TemplateArena,
        TemplateFlags, TemplateInstance, TemplateKind, ValueRange,
    };
    pub use ttcn_core::{
        ArrayDimension, CheckError, DefId, DefKind, Definition, DefinitionTable, Diagnostic,
        Diagnostics, Field, InternalError, ParamDirection, Reference, Restriction, Returns,
        Severity, SignatureParam, Span, StringKind, SubRef, TemplateId, TypeDef, TypeHash,
        TypeKind, TypeOracle, TypeRegistry, Value,
    };

    pub use crate::check_module;
}

/// Check the body of every template definition in `defs`, in declaration
/// order. Returns how many definitions were checked.
///
/// Stops at the first internal error; diagnostics reported before it stay in
/// `diags`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn check_module(
    config: &CheckerConfig,
    types: &dyn TypeOracle,
    defs: &DefinitionTable,
    arena: &mut TemplateArena,
    diags: &mut Diagnostics,
) -> Result<usize, InternalError> {
    let mut checker = Checker::new(config, types, defs, arena, diags);
    let mut checked = 0;
    for (id, def) in defs.iter() {
        if matches!(def.kind, DefKind::Template { .. }) {
            checker.check_definition(id)?;
            checked += 1;
        }
    }
    tracing::debug!(
        templates = checked,
        errors = checker.diagnostics().error_count(),
        "module checked"
    );
    Ok(checked)
}
