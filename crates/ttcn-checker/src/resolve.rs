//! Following references to the templates they denote.
//!
//! A referenced template is resolved to the last template of its chain: the
//! body of the referenced template definition, narrowed by field and index
//! sub-references, and followed again if that is itself a reference. The result
//! is cached in the referencing node. References that can only be resolved at
//! run time (variables, parameters, function results, parameterized templates)
//! resolve to the referencing node itself.

use ttcn_core::{CheckError, DefKind, Span, SubRef, TemplateId, TypeDef, TypeHash, TypeKind, Value};

use crate::context::{Checker, Result};
use crate::refchain::ReferenceChain;
use crate::template::{ListShape, TemplateFlags, TemplateKind};

/// Outcome of narrowing a template by sub-references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubTemplate {
    /// The sub-template and its governor.
    Found(TemplateId, TypeHash),
    /// Depends on something only known at run time.
    Unfoldable,
    /// A sub-reference cannot be followed; already reported.
    Invalid,
}

impl<'a> Checker<'a> {
    /// Turn a specific value that references a template-bearing definition
    /// into a referenced template. An undefined name makes the node erroneous.
    pub(crate) fn classify_reference(&mut self, id: TemplateId) -> Result<()> {
        let TemplateKind::SpecificValue(Value::Ref(reference)) = self.kind(id)? else {
            return Ok(());
        };
        let Some(def) = reference.target.and_then(|d| self.definition(d)) else {
            self.error_at(
                id,
                CheckError::UnresolvedReference {
                    name: reference.name.clone(),
                },
            )?;
            return self.set_error(id);
        };
        if def.is_template_bearing() {
            self.arena.replace_kind(
                id,
                TemplateKind::Referenced {
                    reference,
                    resolved: None,
                },
            )?;
        }
        Ok(())
    }

    /// The last template of the reference chain starting at `id`.
    pub fn template_refd_last(&mut self, id: TemplateId) -> Result<TemplateId> {
        let mut refch = ReferenceChain::new("While searching for referenced template");
        self.refd_last_in(id, &mut refch)
    }

    pub(crate) fn refd_last_in(
        &mut self,
        id: TemplateId,
        refch: &mut ReferenceChain,
    ) -> Result<TemplateId> {
        let TemplateKind::Referenced {
            reference,
            resolved,
        } = self.kind(id)?
        else {
            return Ok(id);
        };
        if let Some(last) = resolved {
            return Ok(last);
        }
        let Some(def) = reference.target.and_then(|d| self.definition(d)) else {
            return Ok(id);
        };
        let (DefKind::Template { body, .. }, Some(def_ty)) = (&def.kind, def.ty) else {
            self.cache_resolution(id, id)?;
            return Ok(id);
        };
        if reference.is_parameterized() {
            self.cache_resolution(id, id)?;
            return Ok(id);
        }

        refch.mark_state();
        let last = if refch.add(id, &reference.to_string()) {
            match self.sub_template(*body, def_ty, &reference.subrefs, reference.span, refch)? {
                SubTemplate::Found(t, _) => self.refd_last_in(t, refch)?,
                SubTemplate::Unfoldable => id,
                SubTemplate::Invalid => {
                    self.set_error(id)?;
                    id
                }
            }
        } else {
            let chain = refch.cycle_text(id);
            self.error_at(id, CheckError::CircularReference { chain })?;
            self.set_error(id)?;
            id
        };
        refch.prev_state();

        self.cache_resolution(id, last)?;
        self.node_mut(id)?
            .flags
            .insert(TemplateFlags::RECURSIONS_CHECKED);
        Ok(last)
    }

    fn cache_resolution(&mut self, id: TemplateId, last: TemplateId) -> Result<()> {
        if let TemplateKind::Referenced { resolved, .. } = &mut self.node_mut(id)?.kind {
            *resolved = Some(last);
        }
        Ok(())
    }

    /// Narrow `start` (governed by `ty`) by `subrefs`.
    ///
    /// Problems are reported at `at`, the location of the reference.
    pub(crate) fn sub_template(
        &mut self,
        start: TemplateId,
        ty: TypeHash,
        subrefs: &[SubRef],
        at: Span,
        refch: &mut ReferenceChain,
    ) -> Result<SubTemplate> {
        let mut current = start;
        let mut current_ty = ty;
        for sub in subrefs {
            current = self.refd_last_in(current, refch)?;
            match self.arena.kind(current)? {
                TemplateKind::Error => return Ok(SubTemplate::Found(current, current_ty)),
                TemplateKind::Referenced { .. }
                | TemplateKind::IndexedList(_)
                | TemplateKind::SpecificValue(_)
                | TemplateKind::Invoke { .. }
                | TemplateKind::Concat { .. } => return Ok(SubTemplate::Unfoldable),
                _ => {}
            }
            let Some(def) = self.type_def(current_ty) else {
                return Ok(SubTemplate::Unfoldable);
            };
            let step = match sub {
                SubRef::Field(name) => self.field_template(current, def, name, at, refch)?,
                SubRef::Index(index) => self.element_template(current, def, index, at, refch)?,
            };
            match step {
                SubTemplate::Found(t, t_ty) => {
                    current = t;
                    current_ty = t_ty;
                }
                other => return Ok(other),
            }
        }
        Ok(SubTemplate::Found(current, current_ty))
    }

    fn invalid(&mut self, at: Span, message: String) -> SubTemplate {
        self.error(at, CheckError::InvalidSubReference { message });
        SubTemplate::Invalid
    }

    fn field_template(
        &mut self,
        t: TemplateId,
        def: &'a TypeDef,
        name: &str,
        at: Span,
        refch: &mut ReferenceChain,
    ) -> Result<SubTemplate> {
        let kind = self.kind(t)?;
        if matches!(
            kind,
            TemplateKind::Omit
                | TemplateKind::AnyValue
                | TemplateKind::AnyOrOmit
                | TemplateKind::List {
                    shape: ListShape::ValueList | ListShape::Complemented,
                    ..
                }
        ) {
            return Ok(self.invalid(
                at,
                format!("Reference to field `{name}' of {}", kind.describe()),
            ));
        }
        let Some((index, field)) = def.field(name) else {
            let message = match def.fields() {
                Some(_) => format!(
                    "Reference to non-existent field `{name}' in {} template for type `{}'",
                    def.category_name(),
                    def.name
                ),
                None => format!(
                    "Invalid field reference `{name}': type `{}' does not have fields",
                    def.name
                ),
            };
            return Ok(self.invalid(at, message));
        };
        match (&def.kind, kind) {
            (TypeKind::Union { .. }, TemplateKind::NamedList(entries)) => match entries.first() {
                Some(entry) if entry.name == name => Ok(SubTemplate::Found(entry.template, field.ty)),
                Some(entry) => Ok(self.invalid(
                    at,
                    format!(
                        "Reference to inactive field `{name}' in a template of union type `{}'. The active field is `{}'",
                        def.name, entry.name
                    ),
                )),
                None => Ok(self.invalid(at, format!("Reference to an unbound field `{name}'"))),
            },
            (TypeKind::Record { .. } | TypeKind::Set { .. }, TemplateKind::NamedList(entries)) => {
                if let Some(entry) = entries.iter().find(|e| e.name == name) {
                    return Ok(SubTemplate::Found(entry.template, field.ty));
                }
                match self.node(t)?.base {
                    Some(base) => {
                        let base_last = self.refd_last_in(base, refch)?;
                        self.field_template(base_last, def, name, at, refch)
                    }
                    None => Ok(self.invalid(at, format!("Reference to an unbound field `{name}'"))),
                }
            }
            (
                TypeKind::Record { .. },
                TemplateKind::List {
                    shape: ListShape::Positional,
                    items,
                },
            ) => match items.get(index) {
                Some(&item) => Ok(SubTemplate::Found(item, field.ty)),
                None => Ok(self.invalid(at, format!("Reference to an unbound field `{name}'"))),
            },
            _ => Ok(SubTemplate::Unfoldable),
        }
    }

    fn element_template(
        &mut self,
        t: TemplateId,
        def: &'a TypeDef,
        index: &Value,
        at: Span,
        refch: &mut ReferenceChain,
    ) -> Result<SubTemplate> {
        let (element, offset) = match &def.kind {
            TypeKind::RecordOf { element } | TypeKind::SetOf { element } => (*element, 0),
            TypeKind::Array { element, dimension } => (*element, dimension.offset),
            _ => {
                return Ok(self.invalid(
                    at,
                    format!(
                        "Invalid array element reference: type `{}' cannot be indexed",
                        def.name
                    ),
                ));
            }
        };
        let Some(raw) = self.folder().fold_integer(index) else {
            return Ok(SubTemplate::Unfoldable);
        };
        let position = raw - offset;
        if position < 0 {
            return Ok(self.invalid(
                at,
                format!(
                    "A non-negative integer value was expected instead of {raw} for indexing a template of `{}' type `{}'",
                    def.category_name(),
                    def.name
                ),
            ));
        }
        let TemplateKind::List {
            shape: ListShape::Positional,
            items,
        } = self.kind(t)?
        else {
            return Ok(SubTemplate::Unfoldable);
        };
        let Some(&item) = items.get(position as usize) else {
            return Ok(self.invalid(
                at,
                format!(
                    "Index overflow in a template of `{}' type `{}': the index is {raw}, but the template has only {} elements",
                    def.category_name(),
                    def.name,
                    items.len()
                ),
            ));
        };
        if !matches!(self.arena.kind(item)?, TemplateKind::NotUsed) {
            return Ok(SubTemplate::Found(item, element));
        }
        match self.node(t)?.base {
            Some(base) => {
                let base_last = self.refd_last_in(base, refch)?;
                self.element_template(base_last, def, index, at, refch)
            }
            None => Ok(self.invalid(
                at,
                "Not used symbol is not allowed in this context".to_string(),
            )),
        }
    }
}
