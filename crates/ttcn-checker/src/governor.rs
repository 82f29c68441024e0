//! Governor binding and the definition-level entry point.
//!
//! A [`TemplateInstance`] carries up to three sources of type information: an
//! explicit type annotation, a `modifies` reference and the type expected by
//! the context. [`Checker::bind`] picks the effective governor and links a
//! modified template to its base.

use ttcn_core::{CheckError, DefId, DefKind, Restriction, TypeHash};

use crate::check::{CheckOptions, Checked};
use crate::context::{Checker, Result};
use crate::refchain::ReferenceChain;
use crate::resolve::SubTemplate;
use crate::template::TemplateInstance;

impl<'a> Checker<'a> {
    /// The effective governor of `instance`.
    ///
    /// `None` only when no source provides a type.
    pub fn bind(
        &mut self,
        instance: &TemplateInstance,
        contextual: Option<TypeHash>,
    ) -> Result<Option<TypeHash>> {
        if let Some(explicit) = instance.explicit_type {
            if let Some(expected) = contextual
                && !self.compatible(expected, explicit)
            {
                self.error(
                    instance.span,
                    CheckError::ExplicitTypeMismatch {
                        expected: self.type_name(expected),
                        found: self.type_name(explicit),
                    },
                );
            }
            self.link_base(instance, Some(explicit))?;
            return Ok(Some(explicit));
        }
        if instance.derived.is_some() {
            return self.link_base(instance, contextual);
        }
        Ok(contextual)
    }

    /// Resolve the `modifies` reference of `instance`.
    ///
    /// Returns the governor to use: `expected` when the base agrees with it,
    /// otherwise the base's own type.
    fn link_base(
        &mut self,
        instance: &TemplateInstance,
        expected: Option<TypeHash>,
    ) -> Result<Option<TypeHash>> {
        let Some(derived) = &instance.derived else {
            return Ok(expected);
        };
        let Some(def) = derived.target.and_then(|d| self.definition(d)) else {
            self.error(
                derived.span,
                CheckError::UnresolvedReference {
                    name: derived.name.clone(),
                },
            );
            return Ok(expected);
        };
        if !def.is_template_bearing() {
            self.error(
                derived.span,
                CheckError::NotATemplate {
                    found: def.description(),
                },
            );
            return Ok(expected);
        }
        let Some(def_ty) = def.ty else {
            return Ok(expected);
        };
        let base_ty = match self.subref_type(def_ty, &derived.subrefs) {
            Some(sub) => sub.ty,
            None => def_ty,
        };

        let governor = match expected {
            Some(expected) if !self.compatible(expected, base_ty) => {
                self.error(
                    derived.span,
                    CheckError::BaseTypeMismatch {
                        base: derived.to_string(),
                        expected: self.type_name(expected),
                        found: self.type_name(base_ty),
                    },
                );
                base_ty
            }
            Some(expected) => expected,
            None => base_ty,
        };

        if let DefKind::Template { body, .. } = &def.kind {
            let mut refch = ReferenceChain::new("While searching for the base template");
            let base = match self.sub_template(*body, def_ty, &derived.subrefs, derived.span, &mut refch)? {
                SubTemplate::Found(t, _) => Some(t),
                SubTemplate::Unfoldable | SubTemplate::Invalid => None,
            };
            if let Some(base) = base {
                self.node_mut(instance.body)?.base = Some(base);
            }
        }
        Ok(Some(governor))
    }

    /// Bind and check a template instance.
    pub fn check_instance(
        &mut self,
        instance: &TemplateInstance,
        contextual: Option<TypeHash>,
    ) -> Result<Checked> {
        tracing::debug!(template = %instance.body, "checking template instance");
        let Some(governor) = self.bind(instance, contextual)? else {
            self.error(instance.span, CheckError::UnknownGovernor);
            self.set_error(instance.body)?;
            return Ok(Checked {
                self_ref: false,
                erroneous: true,
            });
        };
        self.check(
            instance.body,
            governor,
            CheckOptions::top_level(instance.derived.is_some()),
        )
    }

    /// Check the body of a template definition, then its declared restriction.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check_definition(&mut self, def_id: DefId) -> Result<Checked> {
        let Some(def) = self.definition(def_id) else {
            return Err(ttcn_core::InternalError::invariant(format!(
                "no definition {def_id}"
            )));
        };
        let DefKind::Template {
            body,
            restriction,
            modifies,
            ..
        } = &def.kind
        else {
            return Ok(Checked::default());
        };
        tracing::debug!(definition = %def.name, template = %body, "checking template definition");

        let previous = self.current_def.replace(def_id);
        let mut instance = TemplateInstance::new(*body, def.span);
        instance.derived = modifies.clone();
        let result = self.check_instance(&instance, def.ty);
        self.current_def = previous;
        let result = result?;

        if *restriction != Restriction::None && !result.erroneous {
            self.check_restriction(*body, &def.description(), *restriction, def.span)?;
        }
        Ok(result)
    }
}
