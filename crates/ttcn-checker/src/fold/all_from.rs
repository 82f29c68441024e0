//! `all from` splicing.
//!
//! A slot `all from t` inside a list is replaced by copies of `t`'s elements
//! when `t` is a template or constant whose contents are known. Anything only
//! known at run time keeps the slot, and the list's element count becomes
//! `fixed + len(target_1) + ... + len(target_n)`.

use ttcn_core::{
    CheckError, DefId, DefKind, Definition, Folded, Reference, Returns, Span, SubRef, TemplateId,
    TypeHash, TypeKind, Value,
};

use crate::context::{Checker, Result};
use crate::template::{ListShape, TemplateFlags, TemplateKind};

/// Element count of a list whose `all from` targets may be unknown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListCardinality {
    /// Elements present at compile time.
    pub fixed: usize,
    /// `all from` slots whose length is only known at run time.
    pub runtime_targets: Vec<TemplateId>,
}

impl ListCardinality {
    pub fn is_fixed(&self) -> bool {
        self.runtime_targets.is_empty()
    }
}

/// What one `all from` slot turns into.
enum Splice {
    /// Copies of the target's elements; `false` when some of them are
    /// themselves unresolved `all from` slots.
    Elements(Vec<TemplateId>, bool),
    Runtime,
    /// Already reported.
    Invalid,
}

impl<'a> Checker<'a> {
    /// Splice every foldable `all from` of the list at `id`.
    ///
    /// Returns whether the list is now free of `all from` slots. Runs once
    /// per node; later calls report the earlier outcome.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn flatten(&mut self, id: TemplateId) -> Result<bool> {
        let mut stack: Vec<DefId> = self.current_def.into_iter().collect();
        self.flatten_list(id, false, &mut stack)
    }

    fn flatten_list(
        &mut self,
        id: TemplateId,
        from_permutation: bool,
        stack: &mut Vec<DefId>,
    ) -> Result<bool> {
        let node = self.node(id)?;
        if node.flags.contains(TemplateFlags::FOLDED) {
            return Ok(node.is_flattened());
        }
        let TemplateKind::List { shape, items } = self.kind(id)? else {
            return Ok(true);
        };
        self.node_mut(id)?.flags.insert(TemplateFlags::FOLDED);
        tracing::debug!(template = %id, shape = shape.describe(), items = items.len(), "flattening list");

        let (expanded, flattened) = self.expand_items(&items, from_permutation, stack)?;
        let count = expanded.len();
        self.arena.replace_kind(
            id,
            TemplateKind::List {
                shape,
                items: expanded,
            },
        )?;
        let node = self.node_mut(id)?;
        if flattened {
            node.flags.insert(TemplateFlags::FLATTENED);
        } else {
            node.flags.remove(TemplateFlags::FLATTENED);
            node.flags.insert(TemplateFlags::NEEDS_RUNTIME_EXPANSION);
        }
        tracing::trace!(template = %id, before = items.len(), after = count, flattened, "list flattened");
        Ok(flattened)
    }

    fn expand_items(
        &mut self,
        items: &[TemplateId],
        from_permutation: bool,
        stack: &mut Vec<DefId>,
    ) -> Result<(Vec<TemplateId>, bool)> {
        let mut out = Vec::with_capacity(items.len());
        let mut flattened = true;
        for &item in items {
            match self.kind(item)? {
                TemplateKind::AllFrom(target) => {
                    match self.splice(item, target, from_permutation, stack)? {
                        Splice::Elements(elements, complete) => {
                            out.extend(elements);
                            flattened &= complete;
                        }
                        Splice::Runtime => {
                            self.node_mut(item)?
                                .flags
                                .insert(TemplateFlags::NEEDS_RUNTIME_EXPANSION);
                            flattened = false;
                            out.push(item);
                        }
                        Splice::Invalid => out.push(item),
                    }
                }
                TemplateKind::List {
                    shape: ListShape::Permutation,
                    ..
                } => {
                    flattened &= self.flatten_list(item, true, stack)?;
                    out.push(item);
                }
                TemplateKind::List {
                    shape: ListShape::Positional | ListShape::ValueList,
                    ..
                } => {
                    flattened &= self.flatten_list(item, false, stack)?;
                    out.push(item);
                }
                _ => out.push(item),
            }
        }
        Ok((out, flattened))
    }

    fn splice(
        &mut self,
        slot: TemplateId,
        target: TemplateId,
        from_permutation: bool,
        stack: &mut Vec<DefId>,
    ) -> Result<Splice> {
        let reference = match self.kind(target)? {
            TemplateKind::SpecificValue(Value::Ref(r)) | TemplateKind::Referenced { reference: r, .. } => r,
            TemplateKind::Error => {
                self.set_error(slot)?;
                return Ok(Splice::Invalid);
            }
            other => {
                self.error_at(
                    slot,
                    CheckError::AllFromTarget {
                        what: other.describe(),
                    },
                )?;
                self.set_error(slot)?;
                return Ok(Splice::Invalid);
            }
        };
        let (Some(def_id), Some(def)) = (
            reference.target,
            reference.target.and_then(|d| self.definition(d)),
        ) else {
            self.error_at(
                slot,
                CheckError::UnresolvedReference {
                    name: reference.name.clone(),
                },
            )?;
            self.set_error(slot)?;
            return Ok(Splice::Invalid);
        };
        if stack.contains(&def_id) {
            let mut chain = String::new();
            for id in stack.iter() {
                if let Some(d) = self.definition(*id) {
                    chain.push_str(&format!("`{}' -> ", d.name));
                }
            }
            chain.push_str(&format!("`{}'", def.name));
            self.error_at(slot, CheckError::CircularReference { chain })?;
            self.set_error(slot)?;
            return Ok(Splice::Invalid);
        }

        let can_flatten = !reference.is_parameterized();
        let result = match &def.kind {
            DefKind::Template { body, .. } => {
                stack.push(def_id);
                let result =
                    self.splice_template(slot, def, *body, &reference, can_flatten, from_permutation, stack);
                stack.pop();
                result?
            }
            DefKind::Const { .. } => self.splice_constant(slot, def, &reference, can_flatten)?,
            DefKind::Altstep | DefKind::Testcase => {
                self.error_at(
                    slot,
                    CheckError::Other(format!(
                        "A {} cannot be used as the target of `all from'",
                        def.kind_word()
                    )),
                )?;
                Splice::Invalid
            }
            _ => self.runtime_target(def, &reference)?,
        };
        if matches!(result, Splice::Invalid) && !self.is_error(slot)? {
            self.set_error(slot)?;
        }
        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    fn splice_template(
        &mut self,
        slot: TemplateId,
        def: &'a Definition,
        body: TemplateId,
        reference: &Reference,
        mut can_flatten: bool,
        from_permutation: bool,
        stack: &mut Vec<DefId>,
    ) -> Result<Splice> {
        let Some(mut ty) = def.ty else {
            return Ok(Splice::Invalid);
        };
        let at = reference.span;
        let mut tpl = body;
        for sub in &reference.subrefs {
            let Some(owner) = self.type_def(ty) else {
                return Ok(Splice::Invalid);
            };
            let Some(next_ty) = self.step_type(ty, sub, at) else {
                return Ok(Splice::Invalid);
            };
            if can_flatten {
                tpl = self.template_refd_last(tpl)?;
                let kind = self.kind(tpl)?;
                let expected = |what: &str| {
                    CheckError::Other(format!(
                        "Expected a specific value of type '{}' instead of {what}",
                        owner.name
                    ))
                };
                match sub {
                    SubRef::Index(index) => match (self.folder().fold_integer(index), kind) {
                        (None, _)
                        | (Some(_), TemplateKind::IndexedList(_) | TemplateKind::Referenced { .. }) => {
                            can_flatten = false;
                        }
                        (
                            Some(raw),
                            TemplateKind::List {
                                shape: ListShape::Positional | ListShape::ValueList,
                                items,
                            },
                        ) => {
                            let offset = match owner.kind {
                                TypeKind::Array { dimension, .. } => dimension.offset,
                                _ => 0,
                            };
                            let element = usize::try_from(raw - offset)
                                .ok()
                                .and_then(|p| items.get(p).copied());
                            let Some(element) = element else {
                                self.error(
                                    at,
                                    CheckError::InvalidSubReference {
                                        message: format!(
                                            "Index overflow in a template of `{}' type `{}': the index is {raw}, but the template has only {} elements",
                                            owner.category_name(),
                                            owner.name,
                                            items.len()
                                        ),
                                    },
                                );
                                return Ok(Splice::Invalid);
                            };
                            if matches!(self.arena.kind(element)?, TemplateKind::NotUsed) {
                                self.error(
                                    at,
                                    CheckError::Other(
                                        "An uninitialized list element can not be used as target of 'all from'"
                                            .into(),
                                    ),
                                );
                                return Ok(Splice::Invalid);
                            }
                            tpl = element;
                        }
                        (Some(_), other) => {
                            self.error(at, expected(other.describe()));
                            return Ok(Splice::Invalid);
                        }
                    },
                    SubRef::Field(name) => match kind {
                        TemplateKind::NamedList(entries) => {
                            let Some(entry) = entries.iter().find(|e| &e.name == name) else {
                                self.error(
                                    at,
                                    CheckError::Other(
                                        "An uninitialized field can not be used as target of 'all from'"
                                            .into(),
                                    ),
                                );
                                return Ok(Splice::Invalid);
                            };
                            let state = match self.arena.kind(entry.template)? {
                                TemplateKind::Omit => Some("omitted"),
                                TemplateKind::NotUsed => Some("uninitialized"),
                                _ => None,
                            };
                            if let Some(state) = state {
                                self.error(
                                    at,
                                    CheckError::Other(format!(
                                        "An {state} field can not be used as target of 'all from'"
                                    )),
                                );
                                return Ok(Splice::Invalid);
                            }
                            tpl = entry.template;
                        }
                        TemplateKind::Referenced { .. } => can_flatten = false,
                        other => {
                            self.error(at, expected(other.describe()));
                            return Ok(Splice::Invalid);
                        }
                    },
                }
            }
            ty = next_ty;
        }

        if !can_flatten {
            return self.list_or_error(ty, at, "template");
        }
        let tpl = self.template_refd_last(tpl)?;
        match self.kind(tpl)? {
            TemplateKind::Referenced { .. } | TemplateKind::IndexedList(_) => Ok(Splice::Runtime),
            TemplateKind::List {
                shape: ListShape::Positional | ListShape::ValueList,
                items,
            } => {
                let mut foldable = true;
                for &item in &items {
                    match self.kind(item)? {
                        TemplateKind::SpecificValue(Value::Ref(r))
                        | TemplateKind::Referenced { reference: r, .. }
                            if r.is_parameterized() =>
                        {
                            foldable = false;
                        }
                        TemplateKind::AnyOrOmit if from_permutation => {}
                        TemplateKind::AnyOrOmit
                        | TemplateKind::List {
                            shape: ListShape::Permutation,
                            ..
                        } => {
                            self.error_at(slot, CheckError::AllFromPermutation)?;
                            return Ok(Splice::Invalid);
                        }
                        _ => {}
                    }
                }
                if !foldable {
                    return Ok(Splice::Runtime);
                }
                let mut copies = Vec::with_capacity(items.len());
                for item in items {
                    copies.push(self.arena.deep_clone(item)?);
                }
                let (expanded, complete) = self.expand_items(&copies, from_permutation, stack)?;
                Ok(Splice::Elements(expanded, complete))
            }
            TemplateKind::NamedList(entries) => {
                for entry in &entries {
                    if matches!(
                        self.arena.kind(entry.template)?,
                        TemplateKind::List {
                            shape: ListShape::Permutation,
                            ..
                        }
                    ) {
                        self.error_at(slot, CheckError::AllFromPermutation)?;
                        return Ok(Splice::Invalid);
                    }
                }
                Ok(Splice::Runtime)
            }
            TemplateKind::AnyValue | TemplateKind::AnyOrOmit => {
                self.error_at(tpl, CheckError::AllFromMatching)?;
                Ok(Splice::Invalid)
            }
            TemplateKind::Error => Ok(Splice::Invalid),
            _ => {
                self.error_at(
                    tpl,
                    CheckError::AllFromKind {
                        what: "template".into(),
                        ty: self.type_name(ty),
                    },
                )?;
                Ok(Splice::Invalid)
            }
        }
    }

    fn splice_constant(
        &mut self,
        slot: TemplateId,
        def: &'a Definition,
        reference: &Reference,
        can_flatten: bool,
    ) -> Result<Splice> {
        let Some(def_ty) = def.ty else {
            return Ok(Splice::Runtime);
        };
        let at = reference.span;
        let Some(ty) = self.walk_type(def_ty, &reference.subrefs, at) else {
            return Ok(Splice::Invalid);
        };
        if let Splice::Invalid = self.list_or_error(ty, at, "constant")? {
            return Ok(Splice::Invalid);
        }
        if !can_flatten {
            return Ok(Splice::Runtime);
        }
        match self.folder().fold(&Value::Ref(reference.clone())) {
            Folded::Constant(Value::List(values)) => {
                let span = self.span(slot)?;
                let elements = values
                    .into_iter()
                    .map(|v| self.arena.add(TemplateKind::SpecificValue(v), span))
                    .collect();
                Ok(Splice::Elements(elements, true))
            }
            Folded::Constant(_) | Folded::Unfoldable => Ok(Splice::Runtime),
            Folded::Invalid(message) => {
                self.error(at, CheckError::InvalidSubReference { message });
                Ok(Splice::Invalid)
            }
        }
    }

    /// Variables, parameters and function results: never spliced, but their
    /// type must still be a list.
    fn runtime_target(&mut self, def: &'a Definition, reference: &Reference) -> Result<Splice> {
        let Some(def_ty) = def.ty else {
            return Ok(Splice::Runtime);
        };
        let Some(ty) = self.walk_type(def_ty, &reference.subrefs, reference.span) else {
            return Ok(Splice::Invalid);
        };
        let what = match &def.kind {
            DefKind::Function { returns } | DefKind::ExtFunction { returns } => {
                let function = if matches!(def.kind, DefKind::Function { .. }) {
                    "function"
                } else {
                    "external function"
                };
                match returns {
                    Some(Returns::Template(_)) => format!("{function} returning a template"),
                    Some(Returns::Value) => format!("{function} returning a value"),
                    None => function.to_string(),
                }
            }
            _ => def.kind_word().to_string(),
        };
        self.list_or_error(ty, reference.span, &what)
    }

    /// `Runtime` for a list type, otherwise report `what` as an illegal target.
    fn list_or_error(&mut self, ty: TypeHash, at: Span, what: &str) -> Result<Splice> {
        match self.type_def(ty) {
            Some(def) if def.is_list() => Ok(Splice::Runtime),
            Some(def) => {
                self.error(
                    at,
                    CheckError::AllFromKind {
                        what: what.to_string(),
                        ty: def.name.clone(),
                    },
                );
                Ok(Splice::Invalid)
            }
            None => Ok(Splice::Invalid),
        }
    }

    fn walk_type(&mut self, ty: TypeHash, subrefs: &[SubRef], at: Span) -> Option<TypeHash> {
        let mut current = ty;
        for sub in subrefs {
            current = self.step_type(current, sub, at)?;
        }
        Some(current)
    }

    /// Type of one sub-reference step of an `all from` target.
    fn step_type(&mut self, ty: TypeHash, sub: &SubRef, at: Span) -> Option<TypeHash> {
        let def = self.type_def(ty)?;
        let message = match sub {
            SubRef::Index(_) => match def.element() {
                Some(element) => return Some(element),
                None => format!("Cannot apply an array index to type '{}'", def.name),
            },
            SubRef::Field(name) => match (def.fields(), def.field(name)) {
                (Some(_), Some((_, field))) => return Some(field.ty),
                (Some(_), None) => format!(
                    "Type '{}' does not have a field with name '{name}'",
                    def.name
                ),
                (None, _) => format!("Cannot apply a field name to type '{}'", def.name),
            },
        };
        self.error(at, CheckError::InvalidSubReference { message });
        None
    }

    /// Fixed element count of the list at `id` and the `all from` slots whose
    /// length is only known at run time. Permutation members count towards
    /// the enclosing list.
    pub fn list_cardinality(&self, id: TemplateId) -> Result<ListCardinality> {
        let mut cardinality = ListCardinality::default();
        self.count_into(id, &mut cardinality)?;
        Ok(cardinality)
    }

    fn count_into(&self, id: TemplateId, cardinality: &mut ListCardinality) -> Result<()> {
        let TemplateKind::List { items, .. } = self.arena.kind(id)? else {
            return Ok(());
        };
        for &item in items {
            match self.arena.kind(item)? {
                TemplateKind::AllFrom(_) => cardinality.runtime_targets.push(item),
                TemplateKind::List {
                    shape: ListShape::Permutation,
                    ..
                } => self.count_into(item, cardinality)?,
                _ => cardinality.fixed += 1,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::template::{ListShape, TemplateFlags, TemplateKind};
    use crate::test_support::Fixture;
    use ttcn_core::{DefKind, Definition, Span, TemplateId, TypeHash, Value};

    fn int_list_type(fx: &mut Fixture) -> TypeHash {
        fx.types.record_of("IntList", Fixture::int())
    }

    fn all_from(fx: &mut Fixture, name: &str) -> TemplateId {
        let target = fx.add(TemplateKind::SpecificValue(Value::Ref(fx.reference(name))));
        fx.add(TemplateKind::AllFrom(target))
    }

    fn items(fx: &Fixture, id: TemplateId) -> Vec<TemplateId> {
        fx.kind(id).children()
    }

    fn values(fx: &Fixture, id: TemplateId) -> Vec<i64> {
        items(fx, id)
            .into_iter()
            .filter_map(|item| match fx.kind(item) {
                TemplateKind::SpecificValue(v) => v.as_integer(),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn constant_target_is_spliced_in_order() {
        let mut fx = Fixture::new();
        let list = int_list_type(&mut fx);
        fx.const_def("x", list, Value::int_list(&[10, 20, 30]));
        let one = fx.value(1);
        let slot = all_from(&mut fx, "x");
        let id = fx.list(ListShape::Subset, vec![one, slot]);

        assert!(fx.checker().flatten(id).unwrap());
        assert_eq!(values(&fx, id), vec![1, 10, 20, 30]);
        let node = fx.arena.get(id).unwrap();
        assert!(node.is_flattened());
        assert!(!node.flags.contains(TemplateFlags::NEEDS_RUNTIME_EXPANSION));
    }

    #[test]
    fn refolding_is_a_no_op() {
        let mut fx = Fixture::new();
        let list = int_list_type(&mut fx);
        fx.const_def("x", list, Value::int_list(&[1, 2]));
        let slot = all_from(&mut fx, "x");
        let id = fx.list(ListShape::Positional, vec![slot]);
        fx.checker().flatten(id).unwrap();
        let once = items(&fx, id);
        let nodes = fx.arena.len();
        assert!(fx.checker().flatten(id).unwrap());
        assert_eq!(items(&fx, id), once);
        assert_eq!(fx.arena.len(), nodes);
    }

    #[test]
    fn template_element_is_spliced_through_index() {
        let mut fx = Fixture::new();
        let list = int_list_type(&mut fx);
        let outer = fx.types.record_of("Outer", list);
        let inner_a = fx.int_list(ListShape::Positional, &[1, 2]);
        let inner_b = fx.int_list(ListShape::Positional, &[3, 4, 5]);
        let body = fx.list(ListShape::Positional, vec![inner_a, inner_b]);
        fx.template_def("t", outer, body);

        let target = fx.add(TemplateKind::SpecificValue(Value::Ref(
            fx.reference("t").index(Value::Integer(1)),
        )));
        let slot = fx.add(TemplateKind::AllFrom(target));
        let id = fx.list(ListShape::ValueList, vec![slot]);
        assert!(fx.checker().flatten(id).unwrap());
        assert_eq!(values(&fx, id), vec![3, 4, 5]);
        assert!(fx.diags.is_empty());
    }

    #[test]
    fn variable_target_expands_at_runtime() {
        let mut fx = Fixture::new();
        let list = int_list_type(&mut fx);
        fx.defs
            .add(Definition::new("v", Some(list), DefKind::Var, Span::default()));
        let one = fx.value(1);
        let slot = all_from(&mut fx, "v");
        let two = fx.value(2);
        let id = fx.list(ListShape::Positional, vec![one, slot, two]);

        assert!(!fx.checker().flatten(id).unwrap());
        let node = fx.arena.get(id).unwrap();
        assert!(!node.is_flattened());
        assert!(node.flags.contains(TemplateFlags::NEEDS_RUNTIME_EXPANSION));
        let cardinality = fx.checker().list_cardinality(id).unwrap();
        assert_eq!(cardinality.fixed, 2);
        assert_eq!(cardinality.runtime_targets, vec![slot]);
        assert!(!cardinality.is_fixed());
    }

    #[test]
    fn non_list_variable_is_rejected() {
        let mut fx = Fixture::new();
        fx.defs.add(Definition::new(
            "vt",
            Some(Fixture::int()),
            DefKind::VarTemplate {
                restriction: ttcn_core::Restriction::None,
            },
            Span::default(),
        ));
        let slot = all_from(&mut fx, "vt");
        let id = fx.list(ListShape::Positional, vec![slot]);
        fx.checker().flatten(id).unwrap();
        assert!(fx.diags.mentions(
            "A template variable of type `integer' can not be used as target of 'all from'"
        ));
        assert!(fx.kind(slot).is_error());
    }

    #[test]
    fn wildcard_template_is_not_a_target() {
        let mut fx = Fixture::new();
        let list = int_list_type(&mut fx);
        let body = fx.add(TemplateKind::AnyValue);
        fx.template_def("t", list, body);
        let slot = all_from(&mut fx, "t");
        let id = fx.list(ListShape::Positional, vec![slot]);
        fx.checker().flatten(id).unwrap();
        assert!(fx.diags.mentions("Matching mechanism can not be used as target of 'all from'"));
    }

    #[test]
    fn any_or_omit_contents_only_inside_permutation() {
        let mut fx = Fixture::new();
        let list = int_list_type(&mut fx);
        let star = fx.add(TemplateKind::AnyOrOmit);
        let one = fx.value(1);
        let body = fx.list(ListShape::Positional, vec![one, star]);
        fx.template_def("t", list, body);

        let slot = all_from(&mut fx, "t");
        let plain = fx.list(ListShape::Positional, vec![slot]);
        fx.checker().flatten(plain).unwrap();
        assert!(fx.diags.mentions("'all from' can not refer to permutation or AnyElementsOrNone"));

        let errors = fx.diags.error_count();
        let slot = all_from(&mut fx, "t");
        let permutation = fx.list(ListShape::Permutation, vec![slot]);
        let outer = fx.list(ListShape::Positional, vec![permutation]);
        assert!(fx.checker().flatten(outer).unwrap());
        assert_eq!(fx.diags.error_count(), errors);
        assert_eq!(items(&fx, permutation).len(), 2);
    }

    #[test]
    fn self_splice_is_circular() {
        let mut fx = Fixture::new();
        let list = int_list_type(&mut fx);
        let t = fx.defs.next_id();
        let target = fx.add(TemplateKind::SpecificValue(Value::Ref(ttcn_core::Reference::new(
            "t",
            Some(t),
            Span::default(),
        ))));
        let slot = fx.add(TemplateKind::AllFrom(target));
        let body = fx.list(ListShape::Positional, vec![slot]);
        fx.template_def("t", list, body);
        fx.checker().check_definition(t).unwrap();
        assert!(fx.diags.mentions("Circular reference"));
    }

    #[test]
    fn constant_of_scalar_type_is_rejected() {
        let mut fx = Fixture::new();
        fx.const_def("c", Fixture::int(), Value::Integer(3));
        let slot = all_from(&mut fx, "c");
        let id = fx.list(ListShape::Positional, vec![slot]);
        fx.checker().flatten(id).unwrap();
        assert!(fx.diags.mentions(
            "A constant of type `integer' can not be used as target of 'all from'"
        ));
    }
}
