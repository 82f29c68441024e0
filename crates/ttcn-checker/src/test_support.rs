//! Shared fixtures for unit tests.

use ttcn_core::{
    DefId, DefKind, Definition, DefinitionTable, Diagnostics, Reference, Restriction, Span,
    TemplateId, TypeHash, TypeRegistry, Value,
};

use crate::check::{CheckOptions, Checked};
use crate::config::CheckerConfig;
use crate::context::Checker;
use crate::template::{ListShape, NamedTemplate, TemplateArena, TemplateKind};

/// Owns everything a [`Checker`] borrows.
pub(crate) struct Fixture {
    pub types: TypeRegistry,
    pub defs: DefinitionTable,
    pub arena: TemplateArena,
    pub diags: Diagnostics,
    pub config: CheckerConfig,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            types: TypeRegistry::with_builtins(),
            defs: DefinitionTable::new(),
            arena: TemplateArena::new(),
            diags: Diagnostics::new(),
            config: CheckerConfig::default(),
        }
    }

    pub fn int() -> TypeHash {
        TypeHash::from_name("integer")
    }

    pub fn charstring() -> TypeHash {
        TypeHash::from_name("charstring")
    }

    pub fn checker(&mut self) -> Checker<'_> {
        Checker::new(
            &self.config,
            &self.types,
            &self.defs,
            &mut self.arena,
            &mut self.diags,
        )
    }

    pub fn add(&mut self, kind: TemplateKind) -> TemplateId {
        self.arena.add(kind, Span::default())
    }

    pub fn value(&mut self, v: i64) -> TemplateId {
        self.add(TemplateKind::SpecificValue(Value::Integer(v)))
    }

    pub fn list(&mut self, shape: ListShape, items: Vec<TemplateId>) -> TemplateId {
        self.add(TemplateKind::List { shape, items })
    }

    pub fn int_list(&mut self, shape: ListShape, values: &[i64]) -> TemplateId {
        let items = values.iter().map(|&v| self.value(v)).collect();
        self.list(shape, items)
    }

    pub fn named(&mut self, entries: &[(&str, TemplateId)]) -> TemplateId {
        let entries = entries
            .iter()
            .map(|(name, id)| NamedTemplate::new(*name, *id, Span::default()))
            .collect();
        self.add(TemplateKind::NamedList(entries))
    }

    pub fn template_def(&mut self, name: &str, ty: TypeHash, body: TemplateId) -> DefId {
        self.defs.add(Definition::new(
            name,
            Some(ty),
            DefKind::Template {
                body,
                restriction: Restriction::None,
                modifies: None,
                parameterized: false,
            },
            Span::default(),
        ))
    }

    pub fn const_def(&mut self, name: &str, ty: TypeHash, value: Value) -> DefId {
        self.defs.add(Definition::new(
            name,
            Some(ty),
            DefKind::Const { value },
            Span::default(),
        ))
    }

    pub fn reference(&self, name: &str) -> Reference {
        self.defs.reference(name, Span::default())
    }

    pub fn check(&mut self, id: TemplateId, governor: TypeHash, opts: CheckOptions) -> Checked {
        self.checker().check(id, governor, opts).unwrap()
    }

    pub fn kind(&self, id: TemplateId) -> &TemplateKind {
        self.arena.kind(id).unwrap()
    }
}
