//! The checker context shared by every pass.

use ttcn_core::{
    CheckError, ConstantFolder, DefId, Definition, DefinitionTable, Diagnostics, InternalError,
    Span, SubRef, TemplateId, TypeDef, TypeHash, TypeKind, TypeOracle,
};

use crate::config::CheckerConfig;
use crate::template::{Template, TemplateArena, TemplateKind};

pub(crate) type Result<T> = std::result::Result<T, InternalError>;

/// Checks templates of one module.
///
/// Holds the read-only collaborators (configuration, type oracle, definition
/// table) and the two mutable ones: the template arena, which is rewritten in
/// place, and the diagnostic sink.
pub struct Checker<'a> {
    pub(crate) config: &'a CheckerConfig,
    pub(crate) types: &'a dyn TypeOracle,
    pub(crate) defs: &'a DefinitionTable,
    pub(crate) arena: &'a mut TemplateArena,
    pub(crate) diags: &'a mut Diagnostics,
    /// The definition whose body is being checked.
    pub(crate) current_def: Option<DefId>,
}

/// Result of following sub-references through a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SubType {
    pub ty: TypeHash,
    /// Some step went through an optional field.
    pub through_optional: bool,
}

impl<'a> Checker<'a> {
    pub fn new(
        config: &'a CheckerConfig,
        types: &'a dyn TypeOracle,
        defs: &'a DefinitionTable,
        arena: &'a mut TemplateArena,
        diags: &'a mut Diagnostics,
    ) -> Self {
        Self {
            config,
            types,
            defs,
            arena,
            diags,
            current_def: None,
        }
    }

    pub fn config(&self) -> &CheckerConfig {
        self.config
    }

    pub fn arena(&self) -> &TemplateArena {
        self.arena
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.diags
    }

    // ---- nodes --------------------------------------------------------------

    pub(crate) fn node(&self, id: TemplateId) -> Result<&Template> {
        self.arena.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: TemplateId) -> Result<&mut Template> {
        self.arena.get_mut(id)
    }

    /// A copy of the node's variant, so children can be visited while the
    /// arena is borrowed mutably.
    pub(crate) fn kind(&self, id: TemplateId) -> Result<TemplateKind> {
        Ok(self.arena.kind(id)?.clone())
    }

    pub(crate) fn span(&self, id: TemplateId) -> Result<Span> {
        Ok(self.node(id)?.span)
    }

    pub(crate) fn is_error(&self, id: TemplateId) -> Result<bool> {
        Ok(self.arena.kind(id)?.is_error())
    }

    pub(crate) fn set_error(&mut self, id: TemplateId) -> Result<()> {
        self.arena.set_error(id)
    }

    // ---- types and definitions ---------------------------------------------

    /// The final (non-alias) definition of a type.
    pub(crate) fn type_def(&self, ty: TypeHash) -> Option<&'a TypeDef> {
        let types = self.types;
        types.resolve_last(ty).map(|(_, def)| def)
    }

    pub(crate) fn type_name(&self, ty: TypeHash) -> String {
        self.types.type_name(ty)
    }

    pub(crate) fn compatible(&self, expected: TypeHash, actual: TypeHash) -> bool {
        self.types.is_compatible(expected, actual)
    }

    pub(crate) fn definition(&self, id: DefId) -> Option<&'a Definition> {
        let defs = self.defs;
        defs.get(id)
    }

    pub(crate) fn folder(&self) -> ConstantFolder<'a> {
        ConstantFolder::new(self.defs)
    }

    /// Follow field and index sub-references through `ty`.
    ///
    /// `None` when a step does not exist in the type.
    pub(crate) fn subref_type(&self, ty: TypeHash, subrefs: &[SubRef]) -> Option<SubType> {
        let mut current = SubType {
            ty,
            through_optional: false,
        };
        for sub in subrefs {
            let def = self.type_def(current.ty)?;
            match sub {
                SubRef::Field(name) => {
                    let (_, field) = def.field(name)?;
                    current.ty = field.ty;
                    current.through_optional |= field.optional;
                }
                SubRef::Index(_) => match &def.kind {
                    TypeKind::RecordOf { element }
                    | TypeKind::SetOf { element }
                    | TypeKind::Array { element, .. } => current.ty = *element,
                    TypeKind::String(_) => {}
                    _ => return None,
                },
            }
        }
        Some(current)
    }

    // ---- diagnostics --------------------------------------------------------

    pub(crate) fn error(&mut self, span: Span, error: CheckError) {
        self.diags.error(span, error);
    }

    /// Report `error` at the location of `id`.
    pub(crate) fn error_at(&mut self, id: TemplateId, error: CheckError) -> Result<()> {
        let span = self.span(id)?;
        self.diags.error(span, error);
        Ok(())
    }

    pub(crate) fn warning_at(&mut self, id: TemplateId, message: impl Into<String>) -> Result<()> {
        let span = self.span(id)?;
        self.diags.warning(span, message);
        Ok(())
    }

    pub(crate) fn note(&mut self, span: Span, message: impl Into<String>) {
        self.diags.note(span, message);
    }

    /// Run `f` with `context` pushed on the diagnostic context stack.
    pub(crate) fn in_context<T>(
        &mut self,
        context: impl Into<String>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.diags.push_context(context);
        let result = f(self);
        self.diags.pop_context();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttcn_core::{Field, TypeRegistry};

    #[test]
    fn subref_type_tracks_optional_path() {
        let mut types = TypeRegistry::with_builtins();
        let int = TypeHash::from_name("integer");
        let inner = types.register(TypeDef::new(
            "Inner",
            TypeKind::Record {
                fields: vec![Field::mandatory("x", int)],
            },
        ));
        let outer = types.register(TypeDef::new(
            "Outer",
            TypeKind::Record {
                fields: vec![Field::optional("i", inner), Field::mandatory("j", inner)],
            },
        ));
        let defs = DefinitionTable::new();
        let config = CheckerConfig::default();
        let mut arena = TemplateArena::new();
        let mut diags = Diagnostics::new();
        let checker = Checker::new(&config, &types, &defs, &mut arena, &mut diags);

        let through_i = checker
            .subref_type(outer, &[SubRef::Field("i".into()), SubRef::Field("x".into())])
            .unwrap();
        assert_eq!(through_i.ty, int);
        assert!(through_i.through_optional);

        let through_j = checker
            .subref_type(outer, &[SubRef::Field("j".into())])
            .unwrap();
        assert!(!through_j.through_optional);

        assert!(checker.subref_type(outer, &[SubRef::Field("nope".into())]).is_none());
    }

    #[test]
    fn context_is_popped_after_closure() {
        let types = TypeRegistry::with_builtins();
        let defs = DefinitionTable::new();
        let config = CheckerConfig::default();
        let mut arena = TemplateArena::new();
        let mut diags = Diagnostics::new();
        let mut checker = Checker::new(&config, &types, &defs, &mut arena, &mut diags);
        checker
            .in_context("In list item 1", |c| {
                assert_eq!(c.diags.context_depth(), 1);
                Ok(())
            })
            .unwrap();
        assert_eq!(checker.diags.context_depth(), 0);
    }
}
