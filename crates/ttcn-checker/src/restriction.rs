//! Template restriction checking.
//!
//! A definition declared `template(omit)`, `template(value)` or
//! `template(present)` constrains what its body may match. The check is
//! static where it can be and otherwise asks for a run-time check: every
//! `check_restriction` call returns `true` when the generated code must still
//! verify the restriction.
//!
//! ```text
//! required   forbidden on the node            forbidden variants
//! omit       length restriction, ifpresent    everything but values, lists, omit
//! value      length restriction, ifpresent    everything but values and lists
//! present    ifpresent                        omit, `*`
//! ```
//!
//! Fields of structured templates are always checked against `omit`, since an
//! absent field is an omitted one.

use rustc_hash::FxHashSet;
use ttcn_core::{CheckError, DefKind, Reference, Restriction, Span, TemplateId, TypeKind};

use crate::context::{Checker, Result};
use crate::template::{ListShape, TemplateFlags, TemplateKind};

impl<'a> Checker<'a> {
    /// Check the subtree at `id` against `required`.
    ///
    /// `definition` names the restricted definition in diagnostics
    /// ("template `t'"); errors are reported at `usage_span`. Returns whether
    /// a run-time check is still needed.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check_restriction(
        &mut self,
        id: TemplateId,
        definition: &str,
        required: Restriction,
        usage_span: Span,
    ) -> Result<bool> {
        if required == Restriction::None {
            return Ok(false);
        }
        tracing::debug!(template = %id, restriction = %required, "checking template restriction");

        let (has_length, ifpresent, span) = {
            let node = self.node(id)?;
            (node.length.is_some(), node.ifpresent, node.span)
        };
        let violation = |usage: String| CheckError::RestrictionViolation {
            definition: definition.to_string(),
            usage,
        };

        let mut runtime = false;
        let mut erroneous = false;
        if ifpresent {
            self.error(usage_span, violation("`ifpresent'".into()));
            erroneous = true;
        }
        let kind = self.kind(id)?;
        match required {
            Restriction::None => {}
            Restriction::Omit | Restriction::Value => {
                if has_length {
                    self.error(usage_span, violation("length restriction".into()));
                    erroneous = true;
                }
                match &kind {
                    TemplateKind::Error | TemplateKind::SpecificValue(_) | TemplateKind::Invoke { .. } => {}
                    TemplateKind::NotUsed => match self.node(id)?.base {
                        Some(base) => {
                            runtime |= self.check_restriction(base, definition, required, usage_span)?;
                        }
                        None => runtime = true,
                    },
                    TemplateKind::Referenced { reference, .. } => {
                        runtime |= self.restriction_refd(id, reference, definition, required, usage_span)?;
                    }
                    TemplateKind::List {
                        shape: ListShape::Positional,
                        items,
                    } => {
                        for &item in items {
                            runtime |=
                                self.check_restriction(item, definition, Restriction::Omit, usage_span)?;
                        }
                    }
                    TemplateKind::NamedList(entries) => {
                        let needed = self.needed_field_count(id)?;
                        let mut seen = FxHashSet::default();
                        for entry in entries {
                            runtime |= self.check_restriction(
                                entry.template,
                                definition,
                                Restriction::Omit,
                                usage_span,
                            )?;
                            if needed > 0 {
                                seen.insert(entry.name.clone());
                            }
                        }
                        if needed > 0
                            && let Some(base) = self.node(id)?.base
                        {
                            runtime |= self.restriction_named_list(
                                base,
                                definition,
                                &mut seen,
                                needed,
                                usage_span,
                            )?;
                        }
                    }
                    TemplateKind::IndexedList(entries) => {
                        for entry in entries {
                            self.check_restriction(
                                entry.template,
                                definition,
                                Restriction::Omit,
                                usage_span,
                            )?;
                        }
                        runtime = true;
                    }
                    TemplateKind::Concat { left, right } => {
                        runtime |= self.check_restriction(*left, definition, required, usage_span)?;
                        runtime |= self.check_restriction(*right, definition, required, usage_span)?;
                    }
                    TemplateKind::Omit if required == Restriction::Omit => {}
                    other => {
                        self.error(usage_span, violation(other.describe().to_string()));
                        erroneous = true;
                    }
                }
            }
            Restriction::Present => match &kind {
                TemplateKind::Referenced { reference, .. } => {
                    runtime |= self.restriction_refd(id, reference, definition, required, usage_span)?;
                }
                TemplateKind::List {
                    shape: ListShape::ValueList,
                    items,
                } => {
                    for &item in items {
                        runtime |= self.check_restriction(item, definition, required, usage_span)?;
                    }
                }
                TemplateKind::List {
                    shape: ListShape::Complemented,
                    items,
                } => {
                    runtime = true;
                    if self.config.omit_allowed_in_value_lists {
                        let mut has_omit = false;
                        for &item in items {
                            if matches!(
                                self.arena.kind(item)?,
                                TemplateKind::Omit | TemplateKind::AnyOrOmit
                            ) {
                                has_omit = true;
                                break;
                            }
                        }
                        if !has_omit {
                            self.error(
                                usage_span,
                                violation(format!(
                                    "{} without omit or AnyValueOrNone in the list",
                                    kind.describe()
                                )),
                            );
                            erroneous = true;
                        }
                    }
                }
                TemplateKind::Omit | TemplateKind::AnyOrOmit => {
                    self.error(usage_span, violation(kind.describe().to_string()));
                    erroneous = true;
                }
                TemplateKind::Concat { left, right } => {
                    runtime |= self.check_restriction(*left, definition, required, usage_span)?;
                    runtime |= self.check_restriction(*right, definition, required, usage_span)?;
                }
                _ => {}
            },
        }

        if erroneous && usage_span != span {
            self.note(span, "Referenced template is here");
        }
        if runtime {
            self.node_mut(id)?
                .flags
                .insert(TemplateFlags::NEEDS_RUNTIME_RESTRICTION_CHECK);
        }
        Ok(runtime)
    }

    /// How many fields a modified template must cover before its base stops
    /// contributing; zero when there is no base.
    fn needed_field_count(&self, id: TemplateId) -> Result<usize> {
        let node = self.node(id)?;
        let (Some(_), Some(governor)) = (node.base, node.governor) else {
            return Ok(0);
        };
        Ok(match self.type_def(governor).map(|d| &d.kind) {
            Some(TypeKind::Record { fields } | TypeKind::Set { fields }) => fields.len(),
            Some(TypeKind::Signature { params, .. }) => params.len(),
            _ => 0,
        })
    }

    /// Check the fields a base template supplies and the modified template
    /// does not mention.
    fn restriction_named_list(
        &mut self,
        base: TemplateId,
        definition: &str,
        seen: &mut FxHashSet<String>,
        needed: usize,
        usage_span: Span,
    ) -> Result<bool> {
        if seen.len() >= needed {
            return Ok(false);
        }
        let base = self.template_refd_last(base)?;
        let mut runtime = false;
        match self.kind(base)? {
            TemplateKind::NamedList(entries) => {
                for entry in entries {
                    if seen.insert(entry.name.clone()) {
                        runtime |= self.check_restriction(
                            entry.template,
                            definition,
                            Restriction::Omit,
                            usage_span,
                        )?;
                    }
                }
                if let Some(next) = self.node(base)?.base {
                    runtime |= self.restriction_named_list(next, definition, seen, needed, usage_span)?;
                }
            }
            kind @ (TemplateKind::AnyValue | TemplateKind::AnyOrOmit) => {
                self.error_at(
                    base,
                    CheckError::RestrictionViolation {
                        definition: definition.to_string(),
                        usage: kind.describe().to_string(),
                    },
                )?;
            }
            _ => {}
        }
        Ok(runtime)
    }

    /// Restriction of a referenced template-bearing definition.
    fn restriction_refd(
        &mut self,
        id: TemplateId,
        reference: &Reference,
        definition: &str,
        required: Restriction,
        usage_span: Span,
    ) -> Result<bool> {
        let Some(def) = reference.target.and_then(|d| self.definition(d)) else {
            return Err(ttcn_core::InternalError::invariant(format!(
                "referenced template `{reference}' has no definition"
            )));
        };
        let mut runtime = false;
        let declared = match &def.kind {
            DefKind::Template { .. } => {
                let last = self.template_refd_last(id)?;
                if last != id {
                    runtime |= self.check_restriction(last, definition, required, usage_span)?;
                }
                return Ok(runtime);
            }
            DefKind::ModuleParTemplate => Restriction::None,
            DefKind::VarTemplate { restriction } | DefKind::TemplateParam { restriction, .. } => {
                *restriction
            }
            DefKind::ExtFunction { .. } => {
                runtime = true;
                def.restriction().unwrap_or_default()
            }
            DefKind::Function { .. } => def.restriction().unwrap_or_default(),
            _ => return Ok(false),
        };

        let through_optional = def
            .ty
            .and_then(|ty| self.subref_type(ty, &reference.subrefs))
            .is_some_and(|sub| sub.through_optional);
        let actual = declared.sub_restriction(through_optional);
        tracing::trace!(reference = %reference, %declared, %actual, "restriction of referenced definition");
        if required.is_less_restrictive(actual) {
            runtime = true;
            self.warning_at(
                id,
                format!(
                    "Inadequate restriction on the referenced {} `{reference}', this may cause a dynamic test case error at runtime",
                    def.kind_word()
                ),
            )?;
            self.note(def.span, format!("Referenced {} is here", def.kind_word()));
        }
        Ok(runtime)
    }
}

#[cfg(test)]
mod tests {
    use crate::check::CheckOptions;
    use crate::template::{LengthRestriction, ListShape, Template, TemplateFlags, TemplateKind};
    use crate::test_support::Fixture;
    use ttcn_core::{
        DefKind, Definition, Field, ParamDirection, Restriction, Returns, Span, TypeDef, TypeHash,
        TypeKind, Value,
    };

    const DEF: &str = "template `t'";

    fn record(fx: &mut Fixture) -> TypeHash {
        fx.types.register(TypeDef::new(
            "R",
            TypeKind::Record {
                fields: vec![
                    Field::mandatory("a", Fixture::int()),
                    Field::optional("b", Fixture::int()),
                ],
            },
        ))
    }

    fn restrict(fx: &mut Fixture, id: ttcn_core::TemplateId, required: Restriction) -> bool {
        fx.checker()
            .check_restriction(id, DEF, required, Span::default())
            .unwrap()
    }

    #[test]
    fn wildcards_against_value() {
        let mut fx = Fixture::new();
        let any = fx.add(TemplateKind::AnyValue);
        assert!(!restrict(&mut fx, any, Restriction::Value));
        assert!(fx.diags.mentions("Restriction on template `t' does not allow usage of any value"));
    }

    #[test]
    fn omit_is_fine_for_omit_restriction_only() {
        let mut fx = Fixture::new();
        let omit = fx.add(TemplateKind::Omit);
        restrict(&mut fx, omit, Restriction::Omit);
        assert!(fx.diags.is_empty());
        restrict(&mut fx, omit, Restriction::Value);
        assert!(fx.diags.mentions("does not allow usage of omit value"));
    }

    #[test]
    fn present_rejects_omit_and_any_or_omit() {
        let mut fx = Fixture::new();
        let star = fx.add(TemplateKind::AnyOrOmit);
        let any = fx.add(TemplateKind::AnyValue);
        restrict(&mut fx, any, Restriction::Present);
        assert!(fx.diags.is_empty());
        restrict(&mut fx, star, Restriction::Present);
        assert!(fx.diags.mentions("does not allow usage of any or omit"));
    }

    #[test]
    fn length_and_ifpresent_are_forbidden_for_value() {
        let mut fx = Fixture::new();
        let id = fx.arena.alloc(
            Template::new(TemplateKind::SpecificValue(Value::chars("ab")), Span::new(2, 1, 4))
                .with_length(LengthRestriction::single(2))
                .with_ifpresent(),
        );
        restrict(&mut fx, id, Restriction::Value);
        assert!(fx.diags.mentions("does not allow usage of length restriction"));
        assert!(fx.diags.mentions("does not allow usage of `ifpresent'"));
        assert!(fx.diags.mentions("Referenced template is here"));
    }

    #[test]
    fn fields_are_checked_against_omit() {
        let mut fx = Fixture::new();
        let rec = record(&mut fx);
        let a = fx.value(1);
        let b = fx.add(TemplateKind::Omit);
        let id = fx.named(&[("a", a), ("b", b)]);
        fx.check(id, rec, CheckOptions::top_level(false));
        assert!(!restrict(&mut fx, id, Restriction::Value));
        assert!(fx.diags.is_empty());

        let any = fx.add(TemplateKind::AnyValue);
        let id = fx.named(&[("a", any)]);
        restrict(&mut fx, id, Restriction::Value);
        assert!(fx.diags.mentions("does not allow usage of any value"));
    }

    #[test]
    fn base_fields_not_mentioned_are_checked() {
        let mut fx = Fixture::new();
        let rec = record(&mut fx);
        let a = fx.value(1);
        let b = fx.add(TemplateKind::AnyValue);
        let base = fx.named(&[("a", a), ("b", b)]);
        fx.check(base, rec, CheckOptions::top_level(false));
        let a2 = fx.value(2);
        let derived = fx.named(&[("a", a2)]);
        fx.arena.get_mut(derived).unwrap().base = Some(base);
        fx.check(derived, rec, CheckOptions::top_level(true));
        restrict(&mut fx, derived, Restriction::Omit);
        assert!(fx.diags.mentions("does not allow usage of any value"));
    }

    #[test]
    fn indexed_list_always_needs_runtime_check() {
        let mut fx = Fixture::new();
        let item = fx.value(1);
        let id = fx.add(TemplateKind::IndexedList(vec![crate::template::IndexedTemplate {
            index: Value::Integer(0),
            template: item,
            span: Span::default(),
        }]));
        assert!(restrict(&mut fx, id, Restriction::Value));
        assert!(fx
            .arena
            .get(id)
            .unwrap()
            .flags
            .contains(TemplateFlags::NEEDS_RUNTIME_RESTRICTION_CHECK));
    }

    #[test]
    fn complemented_list_needs_omit_when_configured() {
        let mut fx = Fixture::new();
        fx.config = fx.config.with_omit_in_value_lists(true);
        let id = fx.int_list(ListShape::Complemented, &[1, 2]);
        assert!(restrict(&mut fx, id, Restriction::Present));
        assert!(fx.diags.mentions(
            "complemented list match without omit or AnyValueOrNone in the list"
        ));

        let omit = fx.add(TemplateKind::Omit);
        let id = fx.list(ListShape::Complemented, vec![omit]);
        let errors = fx.diags.error_count();
        assert!(restrict(&mut fx, id, Restriction::Present));
        assert_eq!(fx.diags.error_count(), errors);
    }

    #[test]
    fn weaker_variable_restriction_warns() {
        let mut fx = Fixture::new();
        fx.defs.add(Definition::new(
            "vt",
            Some(Fixture::int()),
            DefKind::VarTemplate {
                restriction: Restriction::Present,
            },
            Span::new(9, 1, 2),
        ));
        let id = fx.add(TemplateKind::Referenced {
            reference: fx.reference("vt"),
            resolved: None,
        });
        assert!(restrict(&mut fx, id, Restriction::Value));
        assert!(fx.diags.mentions(
            "Inadequate restriction on the referenced template variable `vt', this may cause a dynamic test case error at runtime"
        ));
        assert!(fx.diags.mentions("Referenced template variable is here"));
        assert!(!fx.diags.has_errors());
    }

    #[test]
    fn optional_path_downgrades_declared_restriction() {
        let mut fx = Fixture::new();
        let rec = record(&mut fx);
        fx.defs.add(Definition::new(
            "p",
            Some(rec),
            DefKind::TemplateParam {
                direction: ParamDirection::In,
                restriction: Restriction::Value,
            },
            Span::default(),
        ));
        let through_b = fx.add(TemplateKind::Referenced {
            reference: fx.reference("p").field("b"),
            resolved: None,
        });
        assert!(restrict(&mut fx, through_b, Restriction::Value));
        let through_a = fx.add(TemplateKind::Referenced {
            reference: fx.reference("p").field("a"),
            resolved: None,
        });
        assert!(!restrict(&mut fx, through_a, Restriction::Value));
    }

    #[test]
    fn external_function_result_needs_runtime_check() {
        let mut fx = Fixture::new();
        fx.defs.add(Definition::new(
            "ef",
            Some(Fixture::int()),
            DefKind::ExtFunction {
                returns: Some(Returns::Template(Restriction::Value)),
            },
            Span::default(),
        ));
        let id = fx.add(TemplateKind::Referenced {
            reference: fx.reference("ef"),
            resolved: None,
        });
        assert!(restrict(&mut fx, id, Restriction::Value));
        assert!(fx.diags.is_empty());
    }

    #[test]
    fn referenced_template_is_followed() {
        let mut fx = Fixture::new();
        let body = fx.add(TemplateKind::AnyOrOmit);
        fx.template_def("base", Fixture::int(), body);
        let id = fx.add(TemplateKind::Referenced {
            reference: fx.reference("base"),
            resolved: None,
        });
        restrict(&mut fx, id, Restriction::Present);
        assert!(fx.diags.mentions("does not allow usage of any or omit"));
    }
}
