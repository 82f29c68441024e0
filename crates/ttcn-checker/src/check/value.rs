//! Specific values inside templates.
//!
//! Only the shape of a value is checked here: its kind against the governor
//! category, field names of assignment notation, element counts of arrays and
//! the type of referenced definitions. Expression evaluation belongs to the
//! value subsystem.

use ttcn_core::{
    CheckError, DefKind, Reference, Span, TemplateId, TypeHash, TypeKind, Value,
};

use crate::context::{Checker, Result};
use crate::template::{TemplateFlags, TemplateKind};

const VERDICTS: [&str; 5] = ["none", "pass", "inconc", "fail", "error"];

/// What kind of value a governor category expects, for diagnostics.
pub(crate) fn value_word(kind: &TypeKind) -> &'static str {
    match kind {
        TypeKind::Boolean => "boolean",
        TypeKind::Integer => "integer",
        TypeKind::Real => "float",
        TypeKind::Verdict => "verdict",
        TypeKind::Enumerated { .. } => "enumerated",
        TypeKind::ObjectIdentifier => "objid",
        TypeKind::Default => "default",
        TypeKind::Component => "component reference",
        TypeKind::Port => "port",
        TypeKind::Behaviour { .. } => "function reference",
        TypeKind::String(kind) => kind.type_name(),
        TypeKind::Record { .. } => "record",
        TypeKind::Set { .. } => "set",
        TypeKind::Union { .. } => "union",
        TypeKind::RecordOf { .. } => "record of",
        TypeKind::SetOf { .. } => "set of",
        TypeKind::Array { .. } => "array",
        TypeKind::Signature { .. } => "signature",
        TypeKind::Alias(_) | TypeKind::Error => "erroneous",
    }
}

impl<'a> Checker<'a> {
    /// `allow_omit` is whether the site accepts `omit` as the whole value;
    /// nested values only accept it for optional fields.
    pub(crate) fn check_specific_value(
        &mut self,
        id: TemplateId,
        governor: TypeHash,
        allow_omit: bool,
    ) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.flags.contains(TemplateFlags::SPECIFIC_VALUE_CHECKED) {
            return Ok(());
        }
        node.flags.insert(TemplateFlags::SPECIFIC_VALUE_CHECKED);
        let span = node.span;
        let TemplateKind::SpecificValue(value) = self.kind(id)? else {
            return Ok(());
        };
        self.check_value(&value, governor, span, allow_omit);
        Ok(())
    }

    fn check_value(&mut self, value: &Value, ty: TypeHash, span: Span, allow_omit: bool) {
        let Some(def) = self.type_def(ty) else {
            return;
        };
        let mismatch = CheckError::ValueKindMismatch {
            expected: value_word(&def.kind),
        };
        match (value, &def.kind) {
            (Value::Error | Value::Expr(_), _) | (_, TypeKind::Error) => {}
            (Value::Ref(reference), _) => self.check_value_reference(reference, ty, span),
            (Value::Omit, _) if allow_omit => {}
            (Value::Omit, _) => self.error(span, CheckError::OmitNotAllowed),
            (Value::NotUsed, _) => self.error(span, CheckError::NotUsedSymbol),
            (Value::Boolean(_), TypeKind::Boolean)
            | (Value::Integer(_), TypeKind::Integer)
            | (Value::Real(_), TypeKind::Real)
            | (Value::Null, TypeKind::Default | TypeKind::Component)
            | (Value::List(_), TypeKind::ObjectIdentifier) => {}
            (Value::Enumerated(name), TypeKind::Enumerated { items }) => {
                if !items.contains(name) {
                    self.error(
                        span,
                        CheckError::Other(format!(
                            "There is no enumerated value with name `{name}' in type `{}'",
                            def.name
                        )),
                    );
                }
            }
            (Value::Enumerated(name), TypeKind::Verdict) => {
                if !VERDICTS.contains(&name.as_str()) {
                    self.error(span, mismatch);
                }
            }
            (v, TypeKind::String(kind)) => match v.string_kind() {
                Some(k) if kind.accepts(k) => {}
                _ => self.error(span, mismatch),
            },
            (Value::List(items), TypeKind::RecordOf { element } | TypeKind::SetOf { element }) => {
                for item in items {
                    self.check_value(item, *element, span, false);
                }
            }
            (Value::List(items), TypeKind::Array { element, dimension }) => {
                if items.len() != dimension.size {
                    self.error(
                        span,
                        CheckError::ArraySize {
                            direction: if items.len() < dimension.size { "few" } else { "many" },
                            expected: dimension.size,
                            found: items.len(),
                        },
                    );
                }
                for item in items {
                    self.check_value(item, *element, span, false);
                }
            }
            (Value::List(items), TypeKind::Record { fields }) => {
                if items.len() > fields.len() {
                    self.error(
                        span,
                        CheckError::TooManyListElements {
                            ty: def.name.clone(),
                            expected: fields.len(),
                            found: items.len(),
                        },
                    );
                }
                for (item, field) in items.iter().zip(fields) {
                    self.check_value(item, field.ty, span, field.optional);
                }
            }
            (
                Value::Fields(given),
                TypeKind::Record { fields } | TypeKind::Set { fields } | TypeKind::Union { alternatives: fields },
            ) => {
                if matches!(def.kind, TypeKind::Union { .. }) && given.len() != 1 {
                    self.error(span, CheckError::UnionFieldCount);
                }
                for (name, item) in given {
                    match fields.iter().find(|f| &f.name == name) {
                        Some(field) => self.check_value(item, field.ty, span, field.optional),
                        None => self.error(
                            span,
                            CheckError::UnknownField {
                                field: name.clone(),
                                kind: def.category_name(),
                                ty: def.name.clone(),
                            },
                        ),
                    }
                }
            }
            _ => self.error(span, mismatch),
        }
    }

    /// A reference inside a value must name something with a compatible type.
    fn check_value_reference(&mut self, reference: &Reference, ty: TypeHash, span: Span) {
        let Some(def) = reference.target.and_then(|d| self.definition(d)) else {
            self.error(
                span,
                CheckError::UnresolvedReference {
                    name: reference.name.clone(),
                },
            );
            return;
        };
        if matches!(def.kind, DefKind::Altstep | DefKind::Testcase) {
            self.error(
                span,
                CheckError::Other(format!(
                    "Reference to a value was expected instead of {}",
                    def.description()
                )),
            );
            return;
        }
        let Some(def_ty) = def.ty else {
            return;
        };
        match self.subref_type(def_ty, &reference.subrefs) {
            Some(sub) if !self.compatible(ty, sub.ty) => self.error(
                span,
                CheckError::TypeMismatch {
                    expected: self.type_name(ty),
                    found: self.type_name(sub.ty),
                },
            ),
            Some(_) => {}
            None => self.error(
                span,
                CheckError::InvalidSubReference {
                    message: format!(
                        "Invalid field or element reference `{reference}' in a value of type `{}'",
                        self.type_name(def_ty)
                    ),
                },
            ),
        }
    }
}
