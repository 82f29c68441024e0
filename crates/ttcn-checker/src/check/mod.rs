//! The structural compatibility checker.
//!
//! [`Checker::check`] validates one template node against its governor and
//! recurses into its children. Terminal matches, value lists, references and
//! `all from` are handled here for every governor; everything else is
//! dispatched on the governor's category:
//!
//! ```text
//! integer, float                  -> scalar
//! string families                 -> string
//! record, set, union              -> structured
//! record of, set of, array        -> sequence
//! signature                       -> signature
//! everything else                 -> specific values only
//! ```

mod completeness;
mod scalar;
mod sequence;
mod signature;
mod string;
mod structured;
mod value;

pub use completeness::Completeness;

use ttcn_core::{CheckError, DefKind, Folded, TemplateId, TypeDef, TypeHash, TypeKind, Value};

use crate::context::{Checker, Result};
use crate::template::{ListShape, TemplateFlags, TemplateKind};

/// What the caller permits at a check site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// Mandatory parts may be left out (modified templates).
    pub incomplete_allowed: bool,
    /// `omit` is acceptable here.
    pub allow_omit: bool,
    /// `*` is acceptable here.
    pub allow_any_or_omit: bool,
    /// An array template may use permutation and index notation. Only
    /// applies to the node itself, never to its elements.
    pub allow_slicing: bool,
}

impl CheckOptions {
    pub fn new(incomplete_allowed: bool, allow_omit: bool, allow_any_or_omit: bool) -> Self {
        Self {
            incomplete_allowed,
            allow_omit,
            allow_any_or_omit,
            allow_slicing: true,
        }
    }

    /// The same options for a context where arrays cannot be sliced.
    pub fn without_slicing(mut self) -> Self {
        self.allow_slicing = false;
        self
    }

    /// Options for a top-level template: omit and `*` allowed.
    pub fn top_level(incomplete_allowed: bool) -> Self {
        Self::new(incomplete_allowed, true, true)
    }

    /// A complete element of a list: no omit, `*` allowed.
    pub fn element() -> Self {
        Self::new(false, false, true)
    }
}

/// What a check reports back to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Checked {
    /// The subtree refers back to the definition under check.
    pub self_ref: bool,
    /// The node is now the error sentinel.
    pub erroneous: bool,
}

impl Checked {
    pub(crate) fn merge(&mut self, other: Checked) {
        self.self_ref |= other.self_ref;
    }
}

impl<'a> Checker<'a> {
    /// Check `id` against `governor`.
    ///
    /// Runs at most once per node; later calls return immediately.
    pub fn check(
        &mut self,
        id: TemplateId,
        governor: TypeHash,
        opts: CheckOptions,
    ) -> Result<Checked> {
        if self.node(id)?.is_checked() {
            return Ok(Checked {
                self_ref: false,
                erroneous: self.is_error(id)?,
            });
        }
        {
            let node = self.node_mut(id)?;
            node.flags.insert(TemplateFlags::CHECKED);
            node.governor = Some(governor);
        }

        let Some(gdef) = self.type_def(governor) else {
            self.error_at(id, CheckError::UnknownGovernor)?;
            self.set_error(id)?;
            return Ok(Checked {
                self_ref: false,
                erroneous: true,
            });
        };
        match gdef.kind {
            TypeKind::Error => return Ok(Checked::default()),
            TypeKind::Port => {
                self.error_at(
                    id,
                    CheckError::Other(format!(
                        "Template cannot be defined for port type `{}'",
                        gdef.name
                    )),
                )?;
                self.set_error(id)?;
                return Ok(Checked {
                    self_ref: false,
                    erroneous: true,
                });
            }
            _ => {}
        }

        self.classify_reference(id)?;
        self.check_feature_support(id)?;

        let last = self.template_refd_last(id)?;
        let misplaced = match self.arena.kind(last)? {
            TemplateKind::Omit if !opts.allow_omit => Some(CheckError::OmitNotAllowed),
            TemplateKind::AnyOrOmit if !opts.allow_any_or_omit => {
                Some(CheckError::AnyOrOmitForMandatory)
            }
            _ => None,
        };
        if let Some(error) = misplaced {
            self.error_at(id, error)?;
        }

        let mut result = Checked::default();
        match self.kind(id)? {
            TemplateKind::Error => {}
            kind @ (TemplateKind::NotUsed
            | TemplateKind::Omit
            | TemplateKind::AnyValue
            | TemplateKind::AnyOrOmit) => {
                self.check_terminal(id, &kind, gdef)?;
            }
            TemplateKind::AllFrom(inner) => {
                result.merge(self.check_all_from_target(id, inner)?);
            }
            TemplateKind::List {
                shape: shape @ (ListShape::ValueList | ListShape::Complemented),
                ..
            } => {
                result.merge(self.check_value_list(id, shape, governor, opts)?);
            }
            TemplateKind::SpecificValue(_) => {
                self.check_specific_value(id, governor, opts.allow_omit)?
            }
            TemplateKind::Referenced { .. } => {
                result.merge(self.check_referenced(id, governor)?);
            }
            TemplateKind::Invoke { .. } => self.check_invoke(id, governor)?,
            TemplateKind::Concat { .. } => {
                result.merge(self.check_concat(id, governor)?);
            }
            _ => result.merge(self.check_category(id, governor, gdef, opts)?),
        }

        if self.node(id)?.length.is_some() && !self.is_error(id)? {
            self.check_length(id, governor)?;
        }
        if self.node(id)?.ifpresent && !opts.allow_omit {
            self.error_at(id, CheckError::IfpresentNotAllowed)?;
        }
        result.erroneous = self.is_error(id)?;
        Ok(result)
    }

    /// Concatenation and decoded content matching may be switched off.
    fn check_feature_support(&mut self, id: TemplateId) -> Result<()> {
        if self.config.string_concat_enabled {
            return Ok(());
        }
        let error = match self.arena.kind(id)? {
            TemplateKind::Concat { .. } => CheckError::ConcatNotSupported,
            TemplateKind::DecodeMatch { .. } => CheckError::DecodeNotSupported,
            _ => return Ok(()),
        };
        self.error_at(id, error)?;
        self.set_error(id)
    }

    fn check_terminal(&mut self, id: TemplateId, kind: &TemplateKind, gdef: &'a TypeDef) -> Result<()> {
        match &gdef.kind {
            TypeKind::Signature { .. } => {
                let symbol = match kind {
                    TemplateKind::NotUsed => "-",
                    TemplateKind::Omit => "omit",
                    TemplateKind::AnyValue => "?",
                    _ => "*",
                };
                self.error_at(
                    id,
                    CheckError::WildcardForSignature {
                        symbol,
                        ty: gdef.name.clone(),
                    },
                )?;
            }
            TypeKind::RecordOf { .. } | TypeKind::SetOf { .. } | TypeKind::Array { .. }
                if matches!(kind, TemplateKind::Omit) && self.node(id)?.length.is_some() =>
            {
                self.warning_at(id, "Redundant usage of length restriction with `omit'")?;
            }
            _ => {}
        }
        Ok(())
    }

    fn check_value_list(
        &mut self,
        id: TemplateId,
        shape: ListShape,
        governor: TypeHash,
        opts: CheckOptions,
    ) -> Result<Checked> {
        self.flatten(id)?;
        let items = match self.arena.kind(id)? {
            TemplateKind::List { items, .. } => items.clone(),
            _ => return Ok(Checked::default()),
        };
        let item_opts = CheckOptions::new(
            false,
            self.config.omit_allowed_in_value_lists && opts.allow_omit,
            true,
        );
        let mut result = Checked::default();
        for (i, item) in items.into_iter().enumerate() {
            let checked = self.in_context(format!("In list item {}", i + 1), |c| {
                c.check(item, governor, item_opts)
            })?;
            result.merge(checked);
            if shape == ListShape::Complemented
                && matches!(self.arena.kind(item)?, TemplateKind::AnyOrOmit)
            {
                self.warning_at(
                    item,
                    "`*' in complemented list. This template will not match anything",
                )?;
            }
        }
        Ok(result)
    }

    fn check_referenced(&mut self, id: TemplateId, governor: TypeHash) -> Result<Checked> {
        let TemplateKind::Referenced { reference, .. } = self.kind(id)? else {
            return Ok(Checked::default());
        };
        let Some(def) = reference.target.and_then(|d| self.definition(d)) else {
            return Err(ttcn_core::InternalError::invariant(format!(
                "referenced template `{reference}' has no definition"
            )));
        };
        let self_ref = self.current_def.is_some() && reference.target == self.current_def;
        let erroneous = Checked {
            self_ref,
            erroneous: true,
        };

        if let Some(def_ty) = def.ty {
            let Some(sub) = self.subref_type(def_ty, &reference.subrefs) else {
                self.error_at(
                    id,
                    CheckError::InvalidSubReference {
                        message: format!(
                            "Invalid field or element reference `{reference}' in a template of type `{}'",
                            self.type_name(def_ty)
                        ),
                    },
                )?;
                self.set_error(id)?;
                return Ok(erroneous);
            };
            if !self.compatible(governor, sub.ty) {
                self.error_at(
                    id,
                    CheckError::TypeMismatch {
                        expected: self.type_name(governor),
                        found: self.type_name(sub.ty),
                    },
                )?;
                self.set_error(id)?;
                return Ok(erroneous);
            }
        }

        let last = self.template_refd_last(id)?;
        if self.is_error(id)? {
            return Ok(erroneous);
        }
        if last != id && !reference.is_parameterized() {
            self.collapse_onto_constant(id, last, governor)?;
        }
        Ok(Checked {
            self_ref,
            erroneous: false,
        })
    }

    /// A reference whose target is a plain constant value becomes that value.
    fn collapse_onto_constant(
        &mut self,
        id: TemplateId,
        last: TemplateId,
        governor: TypeHash,
    ) -> Result<()> {
        let target = self.node(last)?;
        if target.length.is_some() || target.ifpresent {
            return Ok(());
        }
        let TemplateKind::SpecificValue(value) = &target.kind else {
            return Ok(());
        };
        let Folded::Constant(constant) = self.folder().fold(value) else {
            return Ok(());
        };
        if matches!(constant, Value::Ref(_)) {
            return Ok(());
        }
        self.arena
            .replace_kind(id, TemplateKind::SpecificValue(constant))?;
        self.check_specific_value(id, governor, false)
    }

    fn check_invoke(&mut self, id: TemplateId, governor: TypeHash) -> Result<()> {
        let TemplateKind::Invoke { callee, .. } = self.kind(id)? else {
            return Ok(());
        };
        self.in_context("In `apply()' operation", |c| {
            let callee_ty = callee
                .as_reference()
                .and_then(|r| {
                    let def = c.definition(r.target?)?;
                    c.subref_type(def.ty?, &r.subrefs)
                })
                .map(|sub| sub.ty);
            let returns = match callee_ty.and_then(|ty| c.type_def(ty)) {
                Some(TypeDef {
                    kind: TypeKind::Behaviour { returns },
                    ..
                }) => *returns,
                Some(other) => {
                    c.error_at(
                        id,
                        CheckError::NotAFunction {
                            ty: other.name.clone(),
                        },
                    )?;
                    return c.set_error(id);
                }
                None => {
                    c.error_at(
                        id,
                        CheckError::Other(
                            "A value of type function was expected in the argument".into(),
                        ),
                    )?;
                    return c.set_error(id);
                }
            };
            if let Some(returns) = returns
                && !c.compatible(governor, returns)
            {
                c.error_at(
                    id,
                    CheckError::TypeMismatch {
                        expected: c.type_name(governor),
                        found: c.type_name(returns),
                    },
                )?;
                return c.set_error(id);
            }
            Ok(())
        })
    }

    /// Validate what an unspliced `all from` refers to.
    fn check_all_from_target(&mut self, id: TemplateId, inner: TemplateId) -> Result<Checked> {
        let reference = match self.kind(inner)? {
            TemplateKind::SpecificValue(Value::Ref(r)) => r,
            TemplateKind::Referenced { reference, .. } => reference,
            TemplateKind::Error => return Ok(Checked::default()),
            other => {
                self.error_at(
                    id,
                    CheckError::AllFromTarget {
                        what: other.describe(),
                    },
                )?;
                self.set_error(id)?;
                return Ok(Checked {
                    self_ref: false,
                    erroneous: true,
                });
            }
        };
        let Some(def) = reference.target.and_then(|d| self.definition(d)) else {
            self.error_at(
                id,
                CheckError::UnresolvedReference {
                    name: reference.name.clone(),
                },
            )?;
            self.set_error(id)?;
            return Ok(Checked {
                self_ref: false,
                erroneous: true,
            });
        };
        if matches!(def.kind, DefKind::Altstep | DefKind::Testcase) {
            self.error_at(
                id,
                CheckError::Other(format!(
                    "A {} cannot be used as the target of `all from'",
                    def.kind_word()
                )),
            )?;
            self.set_error(id)?;
            return Ok(Checked {
                self_ref: false,
                erroneous: true,
            });
        }
        Ok(Checked {
            self_ref: reference.target == self.current_def && self.current_def.is_some(),
            erroneous: false,
        })
    }

    /// Variants whose legality depends on the governor category.
    fn check_category(
        &mut self,
        id: TemplateId,
        governor: TypeHash,
        gdef: &'a TypeDef,
        opts: CheckOptions,
    ) -> Result<Checked> {
        match &gdef.kind {
            TypeKind::Integer | TypeKind::Real => {
                self.check_numeric(id, gdef)?;
                Ok(Checked::default())
            }
            TypeKind::String(kind) => self.check_string(id, *kind, gdef),
            TypeKind::Record { fields } => self.check_record(id, gdef, fields, opts),
            TypeKind::Set { fields } => self.check_set(id, gdef, fields, opts),
            TypeKind::Union { alternatives } => self.check_union(id, gdef, alternatives, opts),
            TypeKind::RecordOf { .. } | TypeKind::SetOf { .. } | TypeKind::Array { .. } => {
                self.check_sequence(id, governor, gdef, opts)
            }
            TypeKind::Signature { params, .. } => self.check_signature(id, gdef, params, opts),
            TypeKind::Alias(_) => Err(ttcn_core::InternalError::invariant(format!(
                "governor `{}' was not resolved past its alias",
                gdef.name
            ))),
            TypeKind::Error | TypeKind::Port => Ok(Checked::default()),
            TypeKind::Boolean
            | TypeKind::Verdict
            | TypeKind::Enumerated { .. }
            | TypeKind::ObjectIdentifier
            | TypeKind::Default
            | TypeKind::Component
            | TypeKind::Behaviour { .. } => {
                self.illegal_matching(id, gdef)?;
                Ok(Checked::default())
            }
        }
    }

    /// "<variant> cannot be used for type `T'".
    pub(crate) fn illegal_matching(&mut self, id: TemplateId, gdef: &TypeDef) -> Result<()> {
        let what = self.arena.kind(id)?.describe();
        self.error_at(
            id,
            CheckError::IllegalMatching {
                what,
                ty: gdef.name.clone(),
            },
        )
    }
}
