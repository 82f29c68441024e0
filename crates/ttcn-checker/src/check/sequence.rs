//! Record of, set of and array templates.

use rustc_hash::FxHashMap;
use ttcn_core::{ArrayDimension, CheckError, Folded, TemplateId, TypeDef, TypeHash, TypeKind};

use super::completeness::{Completeness, base_items, list_completeness};
use super::{CheckOptions, Checked};
use crate::context::{Checker, Result};
use crate::template::{IndexedTemplate, ListShape, TemplateFlags, TemplateKind};

/// The parts of a list governor the element checks need.
#[derive(Clone, Copy)]
struct ListGovernor<'a> {
    def: &'a TypeDef,
    element: TypeHash,
    array: Option<ArrayDimension>,
    set_of: bool,
    /// Permutation and index notation are usable.
    sliceable: bool,
}

impl<'a> Checker<'a> {
    pub(super) fn check_sequence(
        &mut self,
        id: TemplateId,
        governor: TypeHash,
        gdef: &'a TypeDef,
        opts: CheckOptions,
    ) -> Result<Checked> {
        let lg = match &gdef.kind {
            TypeKind::RecordOf { element } => ListGovernor {
                def: gdef,
                element: *element,
                array: None,
                set_of: false,
                sliceable: true,
            },
            TypeKind::SetOf { element } => ListGovernor {
                def: gdef,
                element: *element,
                array: None,
                set_of: true,
                sliceable: true,
            },
            TypeKind::Array { element, dimension } => ListGovernor {
                def: gdef,
                element: *element,
                array: Some(*dimension),
                set_of: false,
                sliceable: opts.allow_slicing,
            },
            _ => {
                return Err(ttcn_core::InternalError::invariant(format!(
                    "`{}' is not a list type",
                    gdef.name
                )));
            }
        };
        tracing::trace!(template = %id, governor = %governor, "checking list template");

        match self.kind(id)? {
            TemplateKind::List {
                shape: ListShape::Positional,
                ..
            } => self.check_positional_list(id, lg, opts),
            TemplateKind::List {
                shape: shape @ (ListShape::Superset | ListShape::Subset),
                ..
            } if lg.set_of => self.check_super_or_subset(id, shape, lg),
            TemplateKind::IndexedList(_) if !lg.sliceable => {
                self.not_sliceable(id, "Index notation", lg)?;
                Ok(Checked::default())
            }
            TemplateKind::IndexedList(entries) => self.check_indexed_list(id, entries, lg),
            _ => {
                self.illegal_matching(id, gdef)?;
                Ok(Checked::default())
            }
        }
    }

    /// Value list notation, possibly with permutations and `all from`.
    fn check_positional_list(
        &mut self,
        id: TemplateId,
        lg: ListGovernor<'a>,
        opts: CheckOptions,
    ) -> Result<Checked> {
        self.flatten(id)?;
        let TemplateKind::List { items, .. } = self.kind(id)? else {
            return Ok(Checked::default());
        };
        let completeness = list_completeness(self, id, opts.incomplete_allowed, lg.array.is_none())?;
        let base = if completeness == Completeness::Partial {
            base_items(self, id)?
        } else {
            Vec::new()
        };
        let offset = lg.array.map_or(0, |d| d.offset);

        let mut result = Checked::default();
        let mut count = 0usize;
        for (i, &item) in items.iter().enumerate() {
            match self.kind(item)? {
                TemplateKind::List {
                    shape: ListShape::Permutation,
                    items: members,
                } => {
                    count += members.len();
                    if lg.set_of {
                        self.illegal_matching(item, lg.def)?;
                        continue;
                    }
                    if !lg.sliceable {
                        self.not_sliceable(item, "Permutation match", lg)?;
                        continue;
                    }
                    self.node_mut(id)?.flags.insert(TemplateFlags::HAS_PERMUTATION);
                    result.merge(self.check_permutation(item, &members, lg)?);
                }
                TemplateKind::NotUsed => {
                    count += 1;
                    match completeness {
                        Completeness::MustComplete => {
                            self.error_at(item, CheckError::NotUsedSymbol)?;
                        }
                        Completeness::Partial if i >= base.len() => {
                            self.error_at(item, CheckError::NotUsedWithoutBase)?;
                        }
                        _ => {}
                    }
                }
                _ => {
                    count += 1;
                    let with_base = completeness == Completeness::Partial && i < base.len();
                    if with_base && self.node(item)?.base.is_none() {
                        self.node_mut(item)?.base = Some(base[i]);
                    }
                    let incomplete = completeness == Completeness::MayIncomplete || with_base;
                    let context = match lg.array {
                        Some(_) => format!("In array element {}", offset + i as i64),
                        None => format!("In component {}", i + 1),
                    };
                    let checked = self.in_context(context, |c| {
                        c.check(item, lg.element, CheckOptions::new(incomplete, false, true))
                    })?;
                    result.merge(checked);
                }
            }
        }

        if let Some(dimension) = lg.array {
            if self.node(id)?.is_flattened() {
                if count != dimension.size {
                    self.error_at(
                        id,
                        CheckError::ArraySize {
                            direction: if count < dimension.size { "few" } else { "many" },
                            expected: dimension.size,
                            found: count,
                        },
                    )?;
                }
            } else {
                self.warning_at(
                    id,
                    "The size of template cannot be resolved so it could not be compared to the array size",
                )?;
            }
        }
        Ok(result)
    }

    fn not_sliceable(&mut self, id: TemplateId, what: &'static str, lg: ListGovernor<'a>) -> Result<()> {
        self.error_at(
            id,
            CheckError::ArrayNotSliceable {
                what,
                ty: lg.def.name.clone(),
            },
        )
    }

    fn check_permutation(
        &mut self,
        id: TemplateId,
        members: &[TemplateId],
        lg: ListGovernor<'a>,
    ) -> Result<Checked> {
        {
            let node = self.node_mut(id)?;
            node.flags.insert(TemplateFlags::CHECKED);
            node.governor = Some(lg.element);
        }
        let mut result = Checked::default();
        for (i, &member) in members.iter().enumerate() {
            let checked = self.in_context(format!("In element {} of permutation", i + 1), |c| {
                c.check(member, lg.element, CheckOptions::element())
            })?;
            result.merge(checked);
        }
        Ok(result)
    }

    fn check_super_or_subset(
        &mut self,
        id: TemplateId,
        shape: ListShape,
        lg: ListGovernor<'a>,
    ) -> Result<Checked> {
        self.flatten(id)?;
        let TemplateKind::List { items, .. } = self.kind(id)? else {
            return Ok(Checked::default());
        };
        let word = if shape == ListShape::Superset {
            "superset"
        } else {
            "subset"
        };
        let mut result = Checked::default();
        for (i, &item) in items.iter().enumerate() {
            let checked = self.in_context(format!("In element {} of {word}", i + 1), |c| {
                c.check(item, lg.element, CheckOptions::element())
            })?;
            result.merge(checked);
            if matches!(self.arena.kind(item)?, TemplateKind::AnyOrOmit) {
                let message = if shape == ListShape::Superset {
                    "`*' in superset has no effect during matching"
                } else {
                    "`*' in subset. This template will match everything"
                };
                self.warning_at(item, message)?;
            }
        }
        Ok(result)
    }

    /// Assignment notation with explicit indices.
    fn check_indexed_list(
        &mut self,
        id: TemplateId,
        entries: Vec<IndexedTemplate>,
        lg: ListGovernor<'a>,
    ) -> Result<Checked> {
        let mut seen: FxHashMap<i64, usize> = FxHashMap::default();
        let mut result = Checked::default();
        for (i, entry) in entries.iter().enumerate() {
            match self.folder().fold(&entry.index) {
                Folded::Constant(ttcn_core::Value::Integer(index)) => {
                    self.check_constant_index(entry, index, lg)?;
                    if let Some(previous) = seen.insert(index, i + 1) {
                        self.error(
                            entry.span,
                            CheckError::DuplicateIndex {
                                index,
                                previous,
                                current: i + 1,
                            },
                        );
                    }
                }
                Folded::Constant(ttcn_core::Value::Error) | Folded::Unfoldable => {}
                Folded::Constant(_) => {
                    self.error(entry.span, CheckError::ValueKindMismatch { expected: "integer" });
                }
                Folded::Invalid(message) => self.error(entry.span, CheckError::Other(message)),
            }
            let checked = self.in_context(format!("In component {}", i + 1), |c| {
                c.check(entry.template, lg.element, CheckOptions::new(true, false, true))
            })?;
            result.merge(checked);
        }
        tracing::trace!(template = %id, entries = entries.len(), "indexed list checked");
        Ok(result)
    }

    fn check_constant_index(
        &mut self,
        entry: &IndexedTemplate,
        index: i64,
        lg: ListGovernor<'a>,
    ) -> Result<()> {
        match lg.array {
            None if index < 0 => self.error(
                entry.span,
                CheckError::NegativeIndex {
                    ty: lg.def.name.clone(),
                    index,
                },
            ),
            None => {}
            Some(dimension) => {
                let last = dimension.offset + dimension.size as i64 - 1;
                if index < dimension.offset {
                    self.error(
                        entry.span,
                        CheckError::Other(format!(
                            "Array index underflow: the index value must be at least `{}' instead of `{index}'",
                            dimension.offset
                        )),
                    );
                } else if index > last {
                    self.error(
                        entry.span,
                        CheckError::Other(format!(
                            "Array index overflow: the index value must be at most `{last}' instead of `{index}'"
                        )),
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::check::CheckOptions;
    use crate::template::{IndexedTemplate, ListShape, TemplateFlags, TemplateKind};
    use crate::test_support::Fixture;
    use ttcn_core::{Span, TypeHash, Value};

    fn ints(fx: &mut Fixture) -> TypeHash {
        fx.types.record_of("Ints", Fixture::int())
    }

    #[test]
    fn elements_are_checked_against_element_type() {
        let mut fx = Fixture::new();
        let list = ints(&mut fx);
        let bad = fx.add(TemplateKind::SpecificValue(Value::chars("x")));
        let good = fx.value(1);
        let id = fx.list(ListShape::Positional, vec![good, bad]);
        fx.check(id, list, CheckOptions::top_level(false));
        assert!(fx.diags.mentions("integer value was expected"));
        assert_eq!(fx.diags.errors().next().unwrap().context, vec!["In component 2"]);
    }

    #[test]
    fn omit_element_is_rejected() {
        let mut fx = Fixture::new();
        let list = ints(&mut fx);
        let omit = fx.add(TemplateKind::Omit);
        let id = fx.list(ListShape::Positional, vec![omit]);
        fx.check(id, list, CheckOptions::top_level(false));
        assert!(fx.diags.mentions("`omit' value is not allowed"));
    }

    #[test]
    fn not_used_needs_base_element() {
        let mut fx = Fixture::new();
        let list = ints(&mut fx);
        let base = fx.int_list(ListShape::Positional, &[1]);
        let first = fx.add(TemplateKind::NotUsed);
        let second = fx.add(TemplateKind::NotUsed);
        let id = fx.list(ListShape::Positional, vec![first, second]);
        fx.arena.get_mut(id).unwrap().base = Some(base);
        fx.check(id, list, CheckOptions::top_level(true));
        assert_eq!(fx.diags.error_count(), 1);
        assert!(fx.diags.mentions("no corresponding element in the base template"));
    }

    #[test]
    fn permutation_in_set_of_is_illegal() {
        let mut fx = Fixture::new();
        let set = fx.types.set_of("IntSet", Fixture::int());
        let perm = fx.int_list(ListShape::Permutation, &[1, 2]);
        let id = fx.list(ListShape::Positional, vec![perm]);
        fx.check(id, set, CheckOptions::top_level(false));
        assert!(fx.diags.mentions("permutation match cannot be used"));
    }

    #[test]
    fn permutation_marks_list() {
        let mut fx = Fixture::new();
        let list = ints(&mut fx);
        let perm = fx.int_list(ListShape::Permutation, &[1, 2]);
        let id = fx.list(ListShape::Positional, vec![perm]);
        fx.check(id, list, CheckOptions::top_level(false));
        assert!(fx.diags.is_empty());
        assert!(
            fx.arena
                .get(id)
                .unwrap()
                .flags
                .contains(TemplateFlags::HAS_PERMUTATION)
        );
    }

    #[test]
    fn array_size_mismatch() {
        let mut fx = Fixture::new();
        let arr = fx.types.array("A3", Fixture::int(), 3);
        let id = fx.int_list(ListShape::Positional, &[1, 2]);
        fx.check(id, arr, CheckOptions::top_level(false));
        assert!(fx.diags.mentions("Too few elements in the array template: 3 was expected instead of 2"));
    }

    #[test]
    fn indexed_list_rejects_negative_and_duplicate_indices() {
        let mut fx = Fixture::new();
        let list = ints(&mut fx);
        let a = fx.value(1);
        let b = fx.value(2);
        let c = fx.value(3);
        let entry = |index: i64, template| IndexedTemplate {
            index: Value::Integer(index),
            template,
            span: Span::default(),
        };
        let id = fx.add(TemplateKind::IndexedList(vec![
            entry(-1, a),
            entry(2, b),
            entry(2, c),
        ]));
        fx.check(id, list, CheckOptions::top_level(false));
        assert!(fx.diags.mentions("non-negative integer value was expected"));
        assert!(fx.diags.mentions("Duplicate index value `2' for components `2' and `3'"));
    }

    #[test]
    fn permutation_needs_a_sliceable_array() {
        let mut fx = Fixture::new();
        let arr = fx.types.array("A2", Fixture::int(), 2);
        let perm = fx.int_list(ListShape::Permutation, &[1, 2]);
        let id = fx.list(ListShape::Positional, vec![perm]);
        fx.check(id, arr, CheckOptions::top_level(false));
        assert!(!fx.diags.has_errors());

        let perm = fx.int_list(ListShape::Permutation, &[1, 2]);
        let id = fx.list(ListShape::Positional, vec![perm]);
        fx.check(id, arr, CheckOptions::top_level(false).without_slicing());
        assert!(fx.diags.mentions(
            "Permutation match cannot be used for array type `A2' in this context, because the array cannot be sliced"
        ));
    }

    #[test]
    fn index_notation_needs_a_sliceable_array() {
        let mut fx = Fixture::new();
        let arr = fx.types.array("A2", Fixture::int(), 2);
        let one = fx.value(1);
        let id = fx.add(TemplateKind::IndexedList(vec![IndexedTemplate {
            index: Value::Integer(0),
            template: one,
            span: Span::default(),
        }]));
        fx.check(id, arr, CheckOptions::top_level(false).without_slicing());
        assert_eq!(fx.diags.error_count(), 1);
        assert!(fx.diags.mentions("Index notation cannot be used for array type `A2'"));
    }

    #[test]
    fn slicing_only_restricts_arrays() {
        let mut fx = Fixture::new();
        let list = ints(&mut fx);
        let perm = fx.int_list(ListShape::Permutation, &[1, 2]);
        let id = fx.list(ListShape::Positional, vec![perm]);
        fx.check(id, list, CheckOptions::top_level(false).without_slicing());
        assert!(fx.diags.is_empty());
    }

    #[test]
    fn star_in_superset_is_a_warning() {
        let mut fx = Fixture::new();
        let set = fx.types.set_of("IntSet", Fixture::int());
        let one = fx.value(1);
        let star = fx.add(TemplateKind::AnyOrOmit);
        let id = fx.list(ListShape::Superset, vec![one, star]);
        fx.check(id, set, CheckOptions::top_level(false));
        assert!(!fx.diags.has_errors());
        assert_eq!(fx.diags.warning_count(), 1);
    }

    #[test]
    fn superset_is_illegal_for_record_of() {
        let mut fx = Fixture::new();
        let list = ints(&mut fx);
        let id = fx.int_list(ListShape::Superset, &[1]);
        fx.check(id, list, CheckOptions::top_level(false));
        assert!(fx.diags.mentions("superset match cannot be used"));
    }
}
