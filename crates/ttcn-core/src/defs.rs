//! Definitions that templates and values can refer to.

use rustc_hash::FxHashMap;

use crate::types::ParamDirection;
use crate::{DefId, Reference, Restriction, Span, TemplateId, TypeHash, Value};

/// What a function or external function returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returns {
    Value,
    Template(Restriction),
}

/// The kind of a definition together with its kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum DefKind {
    Const {
        value: Value,
    },
    ExtConst,
    ModulePar,
    ModuleParTemplate,
    Var,
    VarTemplate {
        restriction: Restriction,
    },
    /// A global or local template definition.
    Template {
        body: TemplateId,
        restriction: Restriction,
        /// The `modifies` clause.
        modifies: Option<Reference>,
        parameterized: bool,
    },
    ValueParam {
        direction: ParamDirection,
    },
    TemplateParam {
        direction: ParamDirection,
        restriction: Restriction,
    },
    Function {
        returns: Option<Returns>,
    },
    ExtFunction {
        returns: Option<Returns>,
    },
    Altstep,
    Testcase,
}

/// A named, typed definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: String,
    /// Declared type (return type for functions).
    pub ty: Option<TypeHash>,
    pub kind: DefKind,
    pub span: Span,
}

impl Definition {
    pub fn new(name: impl Into<String>, ty: Option<TypeHash>, kind: DefKind, span: Span) -> Self {
        Self {
            name: name.into(),
            ty,
            kind,
            span,
        }
    }

    /// The kind word without the name ("template variable").
    pub fn kind_word(&self) -> &'static str {
        match &self.kind {
            DefKind::Const { .. } => "constant",
            DefKind::ExtConst => "external constant",
            DefKind::ModulePar => "module parameter",
            DefKind::ModuleParTemplate => "template module parameter",
            DefKind::Var => "variable",
            DefKind::VarTemplate { .. } => "template variable",
            DefKind::Template { .. } => "template",
            DefKind::ValueParam { .. } => "value parameter",
            DefKind::TemplateParam { .. } => "template parameter",
            DefKind::Function { .. } => "function",
            DefKind::ExtFunction { .. } => "external function",
            DefKind::Altstep => "altstep",
            DefKind::Testcase => "testcase",
        }
    }

    /// Kind and name, as used in diagnostics: "template variable `v'".
    pub fn description(&self) -> String {
        format!("{} `{}'", self.kind_word(), self.name)
    }

    /// Whether a reference to this definition yields a template.
    pub fn is_template_bearing(&self) -> bool {
        match &self.kind {
            DefKind::Template { .. }
            | DefKind::VarTemplate { .. }
            | DefKind::TemplateParam { .. }
            | DefKind::ModuleParTemplate => true,
            DefKind::Function { returns } | DefKind::ExtFunction { returns } => {
                matches!(returns, Some(Returns::Template(_)))
            }
            _ => false,
        }
    }

    /// Whether a reference to this definition yields a value (no template).
    pub fn is_value_bearing(&self) -> bool {
        match &self.kind {
            DefKind::Const { .. }
            | DefKind::ExtConst
            | DefKind::ModulePar
            | DefKind::Var
            | DefKind::ValueParam { .. } => true,
            DefKind::Function { returns } | DefKind::ExtFunction { returns } => {
                matches!(returns, Some(Returns::Value))
            }
            _ => false,
        }
    }

    /// Restriction declared on a template-bearing definition.
    pub fn restriction(&self) -> Option<Restriction> {
        match &self.kind {
            DefKind::Template { restriction, .. }
            | DefKind::VarTemplate { restriction }
            | DefKind::TemplateParam { restriction, .. } => Some(*restriction),
            DefKind::ModuleParTemplate => Some(Restriction::None),
            DefKind::Function { returns } | DefKind::ExtFunction { returns } => match returns {
                Some(Returns::Template(r)) => Some(*r),
                _ => None,
            },
            _ => None,
        }
    }

    /// Body of a template definition.
    pub fn template_body(&self) -> Option<TemplateId> {
        match &self.kind {
            DefKind::Template { body, .. } => Some(*body),
            _ => None,
        }
    }

    /// Value of a constant.
    pub fn const_value(&self) -> Option<&Value> {
        match &self.kind {
            DefKind::Const { value } => Some(value),
            _ => None,
        }
    }
}

/// All definitions of a module, indexed by [`DefId`].
#[derive(Debug, Default)]
pub struct DefinitionTable {
    defs: Vec<Definition>,
    by_name: FxHashMap<String, DefId>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next [`DefinitionTable::add`] will return.
    ///
    /// Lets a template body refer to its own definition before it is added.
    pub fn next_id(&self) -> DefId {
        DefId::new(self.defs.len() as u32)
    }

    /// Add a definition; a later definition with the same name shadows the
    /// earlier one for [`DefinitionTable::lookup`].
    pub fn add(&mut self, def: Definition) -> DefId {
        let id = self.next_id();
        self.by_name.insert(def.name.clone(), id);
        self.defs.push(def);
        id
    }

    pub fn get(&self, id: DefId) -> Option<&Definition> {
        self.defs.get(id.index() as usize)
    }

    pub fn lookup(&self, name: &str) -> Option<DefId> {
        self.by_name.get(name).copied()
    }

    /// A reference to `name`, resolved against this table.
    pub fn reference(&self, name: &str, span: Span) -> Reference {
        Reference::new(name, self.lookup(name), span)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DefId, &Definition)> {
        self.defs
            .iter()
            .enumerate()
            .map(|(i, d)| (DefId::new(i as u32), d))
    }
}
