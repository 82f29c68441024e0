//! Signature templates: parameters matched by name, in declaration order.

use rustc_hash::FxHashMap;
use ttcn_core::{CheckError, ParamDirection, SignatureParam, Span, TemplateId, TypeDef};

use super::{CheckOptions, Checked};
use crate::context::{Checker, Result};
use crate::template::{ListShape, NamedTemplate, TemplateKind};

impl<'a> Checker<'a> {
    pub(super) fn check_signature(
        &mut self,
        id: TemplateId,
        gdef: &'a TypeDef,
        params: &'a [SignatureParam],
        opts: CheckOptions,
    ) -> Result<Checked> {
        if let TemplateKind::List {
            shape: ListShape::Positional,
            items,
        } = self.kind(id)?
        {
            let expected = params.len();
            let found = items.len();
            if found > expected {
                self.error_at(
                    id,
                    CheckError::TooManyListElements {
                        ty: gdef.name.clone(),
                        expected,
                        found,
                    },
                )?;
            } else if found < expected {
                self.error_at(
                    id,
                    CheckError::TooFewListElements {
                        ty: gdef.name.clone(),
                        expected,
                        found,
                    },
                )?;
            }
            let mut entries = Vec::with_capacity(expected.min(found));
            for (param, item) in params.iter().zip(items) {
                entries.push(NamedTemplate::new(param.name.clone(), item, self.span(item)?));
            }
            self.arena.replace_kind(id, TemplateKind::NamedList(entries))?;
        }
        let TemplateKind::NamedList(entries) = self.kind(id)? else {
            self.illegal_matching(id, gdef)?;
            return Ok(Checked::default());
        };

        let mut seen: FxHashMap<String, Span> = FxHashMap::default();
        let mut in_synch = true;
        let mut next_position = 0usize;
        let mut result = Checked::default();
        for entry in &entries {
            let Some(position) = params.iter().position(|p| p.name == entry.name) else {
                self.error(
                    entry.span,
                    CheckError::UnknownParameter {
                        param: entry.name.clone(),
                        ty: gdef.name.clone(),
                    },
                );
                in_synch = false;
                continue;
            };
            if let Some(previous) = seen.insert(entry.name.clone(), entry.span) {
                self.error(
                    entry.span,
                    CheckError::DuplicateParameter {
                        param: entry.name.clone(),
                        ty: gdef.name.clone(),
                    },
                );
                self.note(
                    previous,
                    format!("Parameter `{}' is already given here", entry.name),
                );
                continue;
            }
            if in_synch {
                if position >= next_position {
                    next_position = position + 1;
                } else {
                    self.error(
                        entry.span,
                        CheckError::UnexpectedParameter {
                            param: entry.name.clone(),
                        },
                    );
                    in_synch = false;
                }
            }
            let param = &params[position];
            let checked = self.in_context(
                format!("In template for signature parameter `{}'", param.name),
                |c| {
                    c.check(
                        entry.template,
                        param.ty,
                        CheckOptions::new(opts.incomplete_allowed, false, false),
                    )
                },
            )?;
            result.merge(checked);
        }

        if !opts.incomplete_allowed {
            self.check_signature_complete(id, params, &entries)?;
        }
        Ok(result)
    }

    /// A complete signature template must give every inout parameter, and may
    /// not leave out both an in and an out parameter.
    fn check_signature_complete(
        &mut self,
        id: TemplateId,
        params: &[SignatureParam],
        entries: &[NamedTemplate],
    ) -> Result<()> {
        let mut first_in = None;
        let mut first_out = None;
        for param in params {
            let given = match entries.iter().find(|e| e.name == param.name) {
                Some(entry) => !matches!(self.arena.kind(entry.template)?, TemplateKind::NotUsed),
                None => false,
            };
            if given {
                continue;
            }
            match param.direction {
                ParamDirection::InOut => self.error_at(
                    id,
                    CheckError::IncompleteSignature {
                        detail: format!("the inout parameter `{}' is missing", param.name),
                    },
                )?,
                ParamDirection::In => {
                    first_in.get_or_insert(&param.name);
                }
                ParamDirection::Out => {
                    first_out.get_or_insert(&param.name);
                }
            }
        }
        if let (Some(p_in), Some(p_out)) = (first_in, first_out) {
            self.error_at(
                id,
                CheckError::IncompleteSignature {
                    detail: format!(
                        "the in parameter `{p_in}' and the out parameter `{p_out}' are missing"
                    ),
                },
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::check::CheckOptions;
    use crate::template::{ListShape, TemplateKind};
    use crate::test_support::Fixture;
    use ttcn_core::{ParamDirection, SignatureParam, TypeDef, TypeHash, TypeKind};

    fn signature(fx: &mut Fixture) -> TypeHash {
        fx.types.register(TypeDef::new(
            "Sig",
            TypeKind::Signature {
                params: vec![
                    SignatureParam::new("a", Fixture::int(), ParamDirection::In),
                    SignatureParam::new("b", Fixture::int(), ParamDirection::Out),
                    SignatureParam::new("c", Fixture::int(), ParamDirection::InOut),
                ],
                returns: None,
                exceptions: vec![],
            },
        ))
    }

    #[test]
    fn complete_signature_template() {
        let mut fx = Fixture::new();
        let sig = signature(&mut fx);
        let id = fx.int_list(ListShape::Positional, &[1, 2, 3]);
        fx.check(id, sig, CheckOptions::top_level(false));
        assert!(fx.diags.is_empty());
        assert!(matches!(fx.kind(id), TemplateKind::NamedList(_)));
    }

    #[test]
    fn value_list_needs_exact_count() {
        let mut fx = Fixture::new();
        let sig = signature(&mut fx);
        let id = fx.int_list(ListShape::Positional, &[1, 2]);
        fx.check(id, sig, CheckOptions::top_level(true));
        assert!(fx.diags.mentions("Too few elements in value list notation"));
    }

    #[test]
    fn out_of_order_parameter() {
        let mut fx = Fixture::new();
        let sig = signature(&mut fx);
        let a = fx.value(1);
        let b = fx.value(2);
        let c = fx.value(3);
        let id = fx.named(&[("b", b), ("a", a), ("c", c)]);
        fx.check(id, sig, CheckOptions::top_level(false));
        assert!(fx.diags.mentions("Unexpected parameter `a' in signature template"));
    }

    #[test]
    fn missing_in_and_out_parameters() {
        let mut fx = Fixture::new();
        let sig = signature(&mut fx);
        let c = fx.value(3);
        let id = fx.named(&[("c", c)]);
        fx.check(id, sig, CheckOptions::top_level(false));
        assert!(fx.diags.mentions(
            "Signature template is incomplete, because the in parameter `a' and the out parameter `b' are missing"
        ));
    }

    #[test]
    fn missing_inout_parameter() {
        let mut fx = Fixture::new();
        let sig = signature(&mut fx);
        let a = fx.value(1);
        let id = fx.named(&[("a", a)]);
        fx.check(id, sig, CheckOptions::top_level(false));
        assert!(fx.diags.mentions("the inout parameter `c' is missing"));
        assert_eq!(fx.diags.error_count(), 1);
    }

    #[test]
    fn wildcard_on_signature() {
        let mut fx = Fixture::new();
        let sig = signature(&mut fx);
        let id = fx.add(TemplateKind::AnyValue);
        fx.check(id, sig, CheckOptions::top_level(false));
        assert!(fx.diags.mentions("Generic wildcard `?' cannot be used for signature `Sig'"));
    }

    #[test]
    fn star_for_parameter_is_rejected() {
        let mut fx = Fixture::new();
        let sig = signature(&mut fx);
        let a = fx.add(TemplateKind::AnyOrOmit);
        let b = fx.value(2);
        let c = fx.value(3);
        let id = fx.named(&[("a", a), ("b", b), ("c", c)]);
        fx.check(id, sig, CheckOptions::top_level(false));
        assert!(fx.diags.mentions("Using `*' for mandatory field"));
    }
}
