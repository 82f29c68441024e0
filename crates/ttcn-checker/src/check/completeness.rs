//! How much of a structured template may be left out.

use ttcn_core::TemplateId;

use crate::context::{Checker, Result};
use crate::template::{ListShape, TemplateKind};

/// Completeness obligation of a list or field-list template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// Every mandatory field or element must be present.
    MustComplete,
    /// Anything may be omitted.
    MayIncomplete,
    /// Only positions that exist in the base template may be omitted.
    Partial,
}

/// Completeness of a record of, set of or array template.
pub(crate) fn list_completeness(
    checker: &mut Checker<'_>,
    id: TemplateId,
    incomplete_allowed: bool,
    is_sequence_of: bool,
) -> Result<Completeness> {
    if !incomplete_allowed {
        return Ok(Completeness::MustComplete);
    }
    let Some(base) = checker.node(id)?.base else {
        return Ok(Completeness::MayIncomplete);
    };
    let base_last = checker.template_refd_last(base)?;
    Ok(match checker.arena.kind(base_last)? {
        TemplateKind::Error
        | TemplateKind::NotUsed
        | TemplateKind::AnyValue
        | TemplateKind::AnyOrOmit
        | TemplateKind::Referenced { .. }
        | TemplateKind::Invoke { .. }
        | TemplateKind::NamedList(_)
        | TemplateKind::IndexedList(_) => Completeness::MayIncomplete,
        TemplateKind::List {
            shape: ListShape::Positional,
            ..
        } if is_sequence_of => Completeness::Partial,
        TemplateKind::List {
            shape: ListShape::Positional,
            ..
        } => Completeness::MayIncomplete,
        _ => Completeness::MustComplete,
    })
}

/// Number of positional items in the base template of `id`, if it has one.
pub(crate) fn base_items(checker: &mut Checker<'_>, id: TemplateId) -> Result<Vec<TemplateId>> {
    let Some(base) = checker.node(id)?.base else {
        return Ok(Vec::new());
    };
    let base_last = checker.template_refd_last(base)?;
    Ok(match checker.arena.kind(base_last)? {
        TemplateKind::List {
            shape: ListShape::Positional,
            items,
        } => items.clone(),
        _ => Vec::new(),
    })
}

/// Completeness of the alternative `field` of a union template.
pub(crate) fn union_completeness(
    checker: &mut Checker<'_>,
    id: TemplateId,
    incomplete_allowed: bool,
    field: &str,
) -> Result<Completeness> {
    if !incomplete_allowed {
        return Ok(Completeness::MustComplete);
    }
    let Some(base) = checker.node(id)?.base else {
        return Ok(Completeness::MayIncomplete);
    };
    let base_last = checker.template_refd_last(base)?;
    Ok(match checker.arena.kind(base_last)? {
        TemplateKind::Error
        | TemplateKind::NotUsed
        | TemplateKind::AnyValue
        | TemplateKind::AnyOrOmit
        | TemplateKind::Referenced { .. }
        | TemplateKind::Invoke { .. } => Completeness::MayIncomplete,
        TemplateKind::NamedList(entries) if entries.iter().any(|e| e.name == field) => {
            Completeness::MayIncomplete
        }
        _ => Completeness::MustComplete,
    })
}
