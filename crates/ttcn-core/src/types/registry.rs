//! Read-only type queries and an in-memory registry.

use rustc_hash::FxHashMap;

use super::{ArrayDimension, StringKind, TypeDef, TypeKind};
use crate::TypeHash;

/// Alias chains longer than this are treated as unresolvable.
const MAX_ALIAS_DEPTH: usize = 64;

/// Query interface over the declared-type system.
///
/// Only [`TypeOracle::get`] is required; everything else is derived from it.
pub trait TypeOracle {
    /// The definition registered under `hash`, without following aliases.
    fn get(&self, hash: TypeHash) -> Option<&TypeDef>;

    /// Follow aliases to the final type.
    fn resolve_last(&self, hash: TypeHash) -> Option<(TypeHash, &TypeDef)> {
        let mut current = hash;
        for _ in 0..MAX_ALIAS_DEPTH {
            let def = self.get(current)?;
            match def.kind {
                TypeKind::Alias(target) => current = target,
                _ => return Some((current, def)),
            }
        }
        None
    }

    /// Display name of a type, `<unknown>` when it is not registered.
    fn type_name(&self, hash: TypeHash) -> String {
        self.get(hash)
            .map(|def| def.name.clone())
            .unwrap_or_else(|| "<unknown>".to_string())
    }

    /// Whether a template of type `actual` may be used where `expected` is
    /// required.
    ///
    /// Identical final types are compatible; so are list types with compatible
    /// elements (and equal size for arrays), and a character string where a
    /// universal character string is expected. Erroneous types are compatible
    /// with everything so that one bad declaration does not cascade.
    fn is_compatible(&self, expected: TypeHash, actual: TypeHash) -> bool {
        let (Some((eh, edef)), Some((ah, adef))) =
            (self.resolve_last(expected), self.resolve_last(actual))
        else {
            return false;
        };
        if eh == ah {
            return true;
        }
        match (&edef.kind, &adef.kind) {
            (TypeKind::Error, _) | (_, TypeKind::Error) => true,
            (TypeKind::String(e), TypeKind::String(a)) => e.accepts(*a),
            (TypeKind::RecordOf { element: e }, TypeKind::RecordOf { element: a })
            | (TypeKind::SetOf { element: e }, TypeKind::SetOf { element: a }) => {
                self.is_compatible(*e, *a)
            }
            (
                TypeKind::Array {
                    element: e,
                    dimension: ed,
                },
                TypeKind::Array {
                    element: a,
                    dimension: ad,
                },
            ) => ed.size == ad.size && self.is_compatible(*e, *a),
            _ => false,
        }
    }
}

/// An in-memory [`TypeOracle`].
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: FxHashMap<TypeHash, TypeDef>,
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the predefined TTCN-3 types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(TypeDef::new("boolean", TypeKind::Boolean));
        registry.register(TypeDef::new("integer", TypeKind::Integer));
        registry.register(TypeDef::new("float", TypeKind::Real));
        registry.register(TypeDef::new("verdicttype", TypeKind::Verdict));
        registry.register(TypeDef::new("objid", TypeKind::ObjectIdentifier));
        registry.register(TypeDef::new("default", TypeKind::Default));
        for kind in [
            StringKind::Bit,
            StringKind::Hex,
            StringKind::Octet,
            StringKind::Char,
            StringKind::UniversalChar,
        ] {
            registry.register(TypeDef::new(kind.type_name(), TypeKind::String(kind)));
        }
        registry
    }

    /// Register a type under the hash of its name, replacing any previous one.
    pub fn register(&mut self, def: TypeDef) -> TypeHash {
        let hash = def.hash();
        self.types.insert(hash, def);
        hash
    }

    /// Register `record of <element>` under `name`.
    pub fn record_of(&mut self, name: &str, element: TypeHash) -> TypeHash {
        self.register(TypeDef::new(name, TypeKind::RecordOf { element }))
    }

    /// Register `set of <element>` under `name`.
    pub fn set_of(&mut self, name: &str, element: TypeHash) -> TypeHash {
        self.register(TypeDef::new(name, TypeKind::SetOf { element }))
    }

    /// Register a one-dimensional array type under `name`.
    pub fn array(&mut self, name: &str, element: TypeHash, size: usize) -> TypeHash {
        self.register(TypeDef::new(
            name,
            TypeKind::Array {
                element,
                dimension: ArrayDimension::new(size),
            },
        ))
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeOracle for TypeRegistry {
    fn get(&self, hash: TypeHash) -> Option<&TypeDef> {
        self.types.get(&hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let reg = TypeRegistry::with_builtins();
        let int = TypeHash::from_name("integer");
        assert_eq!(reg.get(int).unwrap().kind, TypeKind::Integer);
        assert_eq!(reg.type_name(TypeHash::from_name("charstring")), "charstring");
    }

    #[test]
    fn alias_resolves_to_final() {
        let mut reg = TypeRegistry::with_builtins();
        let int = TypeHash::from_name("integer");
        let alias = reg.register(TypeDef::new("MyInt", TypeKind::Alias(int)));
        let (hash, def) = reg.resolve_last(alias).unwrap();
        assert_eq!(hash, int);
        assert_eq!(def.kind, TypeKind::Integer);
        assert!(reg.is_compatible(int, alias));
    }

    #[test]
    fn alias_cycle_does_not_resolve() {
        let mut reg = TypeRegistry::new();
        let a = TypeHash::from_name("A");
        let b = TypeHash::from_name("B");
        reg.register(TypeDef::new("A", TypeKind::Alias(b)));
        reg.register(TypeDef::new("B", TypeKind::Alias(a)));
        assert!(reg.resolve_last(a).is_none());
    }

    #[test]
    fn structural_list_compatibility() {
        let mut reg = TypeRegistry::with_builtins();
        let int = TypeHash::from_name("integer");
        let l1 = reg.record_of("L1", int);
        let l2 = reg.record_of("L2", int);
        let s1 = reg.set_of("S1", int);
        assert!(reg.is_compatible(l1, l2));
        assert!(!reg.is_compatible(l1, s1));

        let a5 = reg.array("A5", int, 5);
        let b5 = reg.array("B5", int, 5);
        let a6 = reg.array("A6", int, 6);
        assert!(reg.is_compatible(a5, b5));
        assert!(!reg.is_compatible(a5, a6));
    }

    #[test]
    fn charstring_promotes() {
        let reg = TypeRegistry::with_builtins();
        let cs = TypeHash::from_name("charstring");
        let ucs = TypeHash::from_name("universal charstring");
        assert!(reg.is_compatible(ucs, cs));
        assert!(!reg.is_compatible(cs, ucs));
    }
}
