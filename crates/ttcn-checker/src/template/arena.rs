//! Owning storage for template nodes.

use std::mem;

use ttcn_core::{InternalError, Span, TemplateId, Value};

use super::{IndexedTemplate, NamedTemplate, Template, TemplateFlags, TemplateKind};

type Result<T> = std::result::Result<T, InternalError>;

/// All template nodes of a module, indexed by [`TemplateId`].
///
/// Nodes are never removed. Back-references (`base`, cached resolutions) are
/// plain ids into the same arena.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateArena {
    nodes: Vec<Template>,
}

impl TemplateArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its id.
    pub fn alloc(&mut self, template: Template) -> TemplateId {
        let id = TemplateId::new(self.nodes.len() as u32);
        self.nodes.push(template);
        id
    }

    /// Store a node with no modifiers.
    pub fn add(&mut self, kind: TemplateKind, span: Span) -> TemplateId {
        self.alloc(Template::new(kind, span))
    }

    pub fn get(&self, id: TemplateId) -> Result<&Template> {
        self.nodes
            .get(id.index() as usize)
            .ok_or(InternalError::DanglingTemplate(id))
    }

    pub fn get_mut(&mut self, id: TemplateId) -> Result<&mut Template> {
        self.nodes
            .get_mut(id.index() as usize)
            .ok_or(InternalError::DanglingTemplate(id))
    }

    pub fn kind(&self, id: TemplateId) -> Result<&TemplateKind> {
        Ok(&self.get(id)?.kind)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Change the variant of a node in place, returning the previous variant.
    ///
    /// Only the transitions in [`transition_allowed`] are accepted; anything
    /// else is a checker defect.
    pub fn replace_kind(&mut self, id: TemplateId, kind: TemplateKind) -> Result<TemplateKind> {
        let node = self.get_mut(id)?;
        if !transition_allowed(&node.kind, &kind) {
            return Err(InternalError::IllegalTransition {
                from: node.kind.describe(),
                to: kind.describe(),
            });
        }
        tracing::trace!(template = %id, from = node.kind.describe(), to = kind.describe(), "variant transition");
        Ok(mem::replace(&mut node.kind, kind))
    }

    /// Rewrite a node to the error sentinel.
    pub fn set_error(&mut self, id: TemplateId) -> Result<()> {
        self.replace_kind(id, TemplateKind::Error).map(|_| ())
    }

    /// Copy a subtree into fresh slots.
    ///
    /// The copy starts unchecked and ungoverned; `base` links are shared with
    /// the original since they are not owned.
    pub fn deep_clone(&mut self, id: TemplateId) -> Result<TemplateId> {
        let mut node = self.get(id)?.clone();
        node.kind = match node.kind {
            TemplateKind::List { shape, items } => TemplateKind::List {
                shape,
                items: self.clone_all(&items)?,
            },
            TemplateKind::NamedList(entries) => {
                let mut cloned = Vec::with_capacity(entries.len());
                for entry in entries {
                    cloned.push(NamedTemplate {
                        template: self.deep_clone(entry.template)?,
                        ..entry
                    });
                }
                TemplateKind::NamedList(cloned)
            }
            TemplateKind::IndexedList(entries) => {
                let mut cloned = Vec::with_capacity(entries.len());
                for entry in entries {
                    cloned.push(IndexedTemplate {
                        template: self.deep_clone(entry.template)?,
                        ..entry
                    });
                }
                TemplateKind::IndexedList(cloned)
            }
            TemplateKind::AllFrom(inner) => TemplateKind::AllFrom(self.deep_clone(inner)?),
            TemplateKind::DecodeMatch { encoding, mut target } => {
                target.body = self.deep_clone(target.body)?;
                TemplateKind::DecodeMatch { encoding, target }
            }
            TemplateKind::Concat { left, right } => TemplateKind::Concat {
                left: self.deep_clone(left)?,
                right: self.deep_clone(right)?,
            },
            other => other,
        };
        node.governor = None;
        node.flags = TemplateFlags::default();
        Ok(self.alloc(node))
    }

    fn clone_all(&mut self, ids: &[TemplateId]) -> Result<Vec<TemplateId>> {
        ids.iter().map(|&id| self.deep_clone(id)).collect()
    }

    /// Ids of the subtree rooted at `id`, parents before children.
    pub fn subtree(&self, id: TemplateId) -> Result<Vec<TemplateId>> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let children = self.kind(current)?.children();
            stack.extend(children.into_iter().rev());
        }
        Ok(out)
    }
}

/// Whether a node of variant `from` may become `to`.
pub fn transition_allowed(from: &TemplateKind, to: &TemplateKind) -> bool {
    use TemplateKind as K;
    match (from, to) {
        (K::List { shape: a, .. }, K::List { shape: b, .. }) => a == b,
        _ if mem::discriminant(from) == mem::discriminant(to) => true,
        (_, K::Error) => true,
        (K::List { shape, .. }, K::NamedList(_)) => *shape == super::ListShape::Positional,
        (K::SpecificValue(Value::Ref(_)), K::Referenced { .. } | K::Invoke { .. }) => true,
        (K::Referenced { .. }, K::SpecificValue(_)) => true,
        (K::CharPattern(_), K::UCharPattern(_)) => true,
        (
            K::Concat { .. },
            K::SpecificValue(_)
            | K::AnyValue
            | K::BitPattern(_)
            | K::HexPattern(_)
            | K::OctetPattern(_)
            | K::CharPattern(_)
            | K::UCharPattern(_),
        ) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::ListShape;
    use ttcn_core::Reference;

    fn list(arena: &mut TemplateArena, shape: ListShape, values: &[i64]) -> TemplateId {
        let items = values
            .iter()
            .map(|&v| arena.add(TemplateKind::SpecificValue(Value::Integer(v)), Span::default()))
            .collect();
        arena.add(TemplateKind::List { shape, items }, Span::default())
    }

    #[test]
    fn dangling_id_is_internal_error() {
        let arena = TemplateArena::new();
        let err = arena.get(TemplateId::new(7)).unwrap_err();
        assert_eq!(err, InternalError::DanglingTemplate(TemplateId::new(7)));
    }

    #[test]
    fn positional_list_becomes_named() {
        let mut arena = TemplateArena::new();
        let id = list(&mut arena, ListShape::Positional, &[1]);
        assert!(arena.replace_kind(id, TemplateKind::NamedList(vec![])).is_ok());
    }

    #[test]
    fn list_keeps_its_shape() {
        let mut arena = TemplateArena::new();
        let id = list(&mut arena, ListShape::Positional, &[1, 2]);
        let reshaped = TemplateKind::List {
            shape: ListShape::Permutation,
            items: vec![],
        };
        assert!(arena.replace_kind(id, reshaped).is_err());
        let spliced = TemplateKind::List {
            shape: ListShape::Positional,
            items: vec![],
        };
        assert!(arena.replace_kind(id, spliced).is_ok());
    }

    #[test]
    fn named_list_never_becomes_positional() {
        let mut arena = TemplateArena::new();
        let id = arena.add(TemplateKind::NamedList(vec![]), Span::default());
        let err = arena
            .replace_kind(
                id,
                TemplateKind::List {
                    shape: ListShape::Positional,
                    items: vec![],
                },
            )
            .unwrap_err();
        assert!(matches!(err, InternalError::IllegalTransition { .. }));
    }

    #[test]
    fn value_list_cannot_become_named() {
        let mut arena = TemplateArena::new();
        let id = list(&mut arena, ListShape::ValueList, &[1, 2]);
        assert!(arena.replace_kind(id, TemplateKind::NamedList(vec![])).is_err());
    }

    #[test]
    fn reference_value_becomes_referenced_or_invoke() {
        let r = Reference::new("t", None, Span::default());
        let from = TemplateKind::SpecificValue(Value::Ref(r.clone()));
        assert!(transition_allowed(
            &from,
            &TemplateKind::Referenced {
                reference: r,
                resolved: None
            }
        ));
        assert!(transition_allowed(
            &from,
            &TemplateKind::Invoke {
                callee: Value::Null,
                args: vec![]
            }
        ));
        assert!(!transition_allowed(
            &TemplateKind::SpecificValue(Value::Integer(1)),
            &TemplateKind::Invoke {
                callee: Value::Null,
                args: vec![]
            }
        ));
    }

    #[test]
    fn anything_becomes_error() {
        let mut arena = TemplateArena::new();
        let id = arena.add(TemplateKind::AnyOrOmit, Span::default());
        arena.set_error(id).unwrap();
        assert!(arena.kind(id).unwrap().is_error());
    }

    #[test]
    fn deep_clone_copies_children() {
        let mut arena = TemplateArena::new();
        let id = list(&mut arena, ListShape::Superset, &[1, 2]);
        arena.get_mut(id).unwrap().flags.insert(TemplateFlags::CHECKED);
        let copy = arena.deep_clone(id).unwrap();
        assert_ne!(copy, id);
        assert!(!arena.get(copy).unwrap().is_checked());
        let original = arena.kind(id).unwrap().children();
        let cloned = arena.kind(copy).unwrap().children();
        assert_eq!(original.len(), cloned.len());
        assert!(original.iter().all(|c| !cloned.contains(c)));
        assert_eq!(arena.len(), 6);
    }

    #[test]
    fn subtree_is_preorder() {
        let mut arena = TemplateArena::new();
        let id = list(&mut arena, ListShape::Positional, &[1, 2]);
        let ids = arena.subtree(id).unwrap();
        assert_eq!(ids[0], id);
        assert_eq!(ids.len(), 3);
    }
}
