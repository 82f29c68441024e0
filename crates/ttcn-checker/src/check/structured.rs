//! Record, set and union templates.

use rustc_hash::FxHashMap;
use ttcn_core::{CheckError, Field, Span, TemplateId, TypeDef};

use super::completeness::{Completeness, union_completeness};
use super::{CheckOptions, Checked};
use crate::context::{Checker, Result};
use crate::template::{ListShape, NamedTemplate, Template, TemplateFlags, TemplateKind};

fn field_names(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| format!("`{}'", f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

impl<'a> Checker<'a> {
    pub(super) fn check_record(
        &mut self,
        id: TemplateId,
        gdef: &'a TypeDef,
        fields: &'a [Field],
        opts: CheckOptions,
    ) -> Result<Checked> {
        if let TemplateKind::List {
            shape: ListShape::Positional,
            items,
        } = self.kind(id)?
        {
            if items.len() > fields.len() {
                self.error_at(
                    id,
                    CheckError::TooManyListElements {
                        ty: gdef.name.clone(),
                        expected: fields.len(),
                        found: items.len(),
                    },
                )?;
            }
            let mut entries = Vec::with_capacity(fields.len());
            for (field, item) in fields.iter().zip(items) {
                entries.push(NamedTemplate::new(field.name.clone(), item, self.span(item)?));
            }
            self.arena.replace_kind(id, TemplateKind::NamedList(entries))?;
        }
        match self.kind(id)? {
            TemplateKind::NamedList(entries) => self.check_named_fields(id, gdef, fields, entries, opts),
            _ => {
                self.illegal_matching(id, gdef)?;
                Ok(Checked::default())
            }
        }
    }

    pub(super) fn check_set(
        &mut self,
        id: TemplateId,
        gdef: &'a TypeDef,
        fields: &'a [Field],
        opts: CheckOptions,
    ) -> Result<Checked> {
        if let TemplateKind::List {
            shape: ListShape::Positional,
            items,
        } = self.kind(id)?
        {
            if !items.is_empty() {
                self.error_at(
                    id,
                    CheckError::SetValueListNotation {
                        ty: gdef.name.clone(),
                    },
                )?;
                return Ok(Checked::default());
            }
            if !fields.is_empty() {
                self.error_at(
                    id,
                    CheckError::Other(format!(
                        "A non-empty set template was expected for type `{}'",
                        gdef.name
                    )),
                )?;
                return Ok(Checked::default());
            }
            self.arena.replace_kind(id, TemplateKind::NamedList(Vec::new()))?;
        }
        match self.kind(id)? {
            TemplateKind::NamedList(entries) => self.check_named_fields(id, gdef, fields, entries, opts),
            _ => {
                self.illegal_matching(id, gdef)?;
                Ok(Checked::default())
            }
        }
    }

    /// Assignment notation for a record or set.
    fn check_named_fields(
        &mut self,
        id: TemplateId,
        gdef: &'a TypeDef,
        fields: &'a [Field],
        mut entries: Vec<NamedTemplate>,
        opts: CheckOptions,
    ) -> Result<Checked> {
        let category = gdef.category_name();
        let mut seen: FxHashMap<String, Span> = FxHashMap::default();
        let mut result = Checked::default();

        for entry in &entries {
            let Some((_, field)) = gdef.field(&entry.name) else {
                self.error(
                    entry.span,
                    CheckError::UnknownField {
                        field: entry.name.clone(),
                        kind: category,
                        ty: gdef.name.clone(),
                    },
                );
                self.note(
                    entry.span,
                    format!("Valid field names are: {}", field_names(fields)),
                );
                continue;
            };
            if let Some(previous) = seen.insert(entry.name.clone(), entry.span) {
                self.error(
                    entry.span,
                    CheckError::DuplicateField {
                        field: entry.name.clone(),
                    },
                );
                self.note(previous, format!("Field `{}' is already given here", entry.name));
                continue;
            }
            if !opts.incomplete_allowed
                && matches!(self.arena.kind(entry.template)?, TemplateKind::NotUsed)
            {
                self.error_at(entry.template, CheckError::NotUsedSymbol)?;
                continue;
            }
            let checked = self.in_context(
                format!("In template for {category} field `{}'", entry.name),
                |c| {
                    c.check(
                        entry.template,
                        field.ty,
                        CheckOptions::new(opts.incomplete_allowed, field.optional, field.optional),
                    )
                },
            )?;
            result.merge(checked);
        }

        // A modified template inherits what it leaves out, even when its base
        // body is not known here (template variables, parameters).
        let inherits = opts.incomplete_allowed || self.node(id)?.base.is_some();
        let mut implicit = Vec::new();
        for field in fields.iter().filter(|f| !seen.contains_key(&f.name)) {
            if field.optional {
                if !inherits {
                    implicit.push(field);
                }
            } else if !opts.incomplete_allowed {
                self.error_at(
                    id,
                    CheckError::MissingField {
                        field: field.name.clone(),
                        kind: category,
                        ty: gdef.name.clone(),
                    },
                )?;
            }
        }
        if !implicit.is_empty() {
            let span = self.span(id)?;
            for field in implicit {
                let mut omit = Template::new(TemplateKind::Omit, span);
                omit.governor = Some(field.ty);
                omit.flags |= TemplateFlags::IMPLICIT_OMIT | TemplateFlags::CHECKED;
                let omit = self.arena.alloc(omit);
                entries.push(NamedTemplate::new(field.name.clone(), omit, span));
            }
            self.arena.replace_kind(id, TemplateKind::NamedList(entries))?;
        }
        Ok(result)
    }

    pub(super) fn check_union(
        &mut self,
        id: TemplateId,
        gdef: &'a TypeDef,
        alternatives: &'a [Field],
        opts: CheckOptions,
    ) -> Result<Checked> {
        let TemplateKind::NamedList(entries) = self.kind(id)? else {
            self.illegal_matching(id, gdef)?;
            return Ok(Checked::default());
        };
        if entries.len() != 1 {
            self.error_at(id, CheckError::UnionFieldCount)?;
        }
        let mut seen: FxHashMap<String, Span> = FxHashMap::default();
        let mut result = Checked::default();
        for entry in &entries {
            let Some((_, field)) = gdef.field(&entry.name) else {
                self.error(
                    entry.span,
                    CheckError::UnknownField {
                        field: entry.name.clone(),
                        kind: "union",
                        ty: gdef.name.clone(),
                    },
                );
                self.note(
                    entry.span,
                    format!("Valid alternatives are: {}", field_names(alternatives)),
                );
                continue;
            };
            if let Some(previous) = seen.insert(entry.name.clone(), entry.span) {
                self.error(
                    entry.span,
                    CheckError::DuplicateField {
                        field: entry.name.clone(),
                    },
                );
                self.note(previous, format!("Field `{}' is already given here", entry.name));
                continue;
            }
            let completeness = union_completeness(self, id, opts.incomplete_allowed, &entry.name)?;
            let checked = self.in_context(
                format!("In template for union field `{}'", entry.name),
                |c| {
                    c.check(
                        entry.template,
                        field.ty,
                        CheckOptions::new(completeness == Completeness::MayIncomplete, false, false),
                    )
                },
            )?;
            result.merge(checked);
        }
        Ok(result)
    }
}
