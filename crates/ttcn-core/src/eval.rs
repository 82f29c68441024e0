//! Compile-time evaluation of values.
//!
//! The checker asks two questions of a value: can it be reduced to a constant,
//! and if so, what is it. [`ConstantFolder`] answers both by chasing references
//! through constant definitions and applying field and index sub-references.

use crate::{DefinitionTable, SubRef, Value};

/// Reference chains through constants deeper than this are not folded.
const MAX_FOLD_DEPTH: usize = 64;

/// Outcome of folding a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Folded {
    /// The value reduces to this constant.
    Constant(Value),
    /// The value depends on something only known at run time.
    Unfoldable,
    /// Following a sub-reference failed; the message describes why.
    Invalid(String),
}

impl Folded {
    pub fn constant(self) -> Option<Value> {
        match self {
            Folded::Constant(v) => Some(v),
            _ => None,
        }
    }
}

/// Reduces values to constants through a definition table.
#[derive(Debug, Clone, Copy)]
pub struct ConstantFolder<'a> {
    defs: &'a DefinitionTable,
}

impl<'a> ConstantFolder<'a> {
    pub fn new(defs: &'a DefinitionTable) -> Self {
        Self { defs }
    }

    /// Fold `value` to a constant if possible.
    pub fn fold(&self, value: &Value) -> Folded {
        self.fold_depth(value, 0)
    }

    /// Fold to an integer constant.
    pub fn fold_integer(&self, value: &Value) -> Option<i64> {
        match self.fold(value) {
            Folded::Constant(Value::Integer(i)) => Some(i),
            _ => None,
        }
    }

    /// Whether `value` cannot be reduced at compile time.
    pub fn is_unfoldable(&self, value: &Value) -> bool {
        !matches!(self.fold(value), Folded::Constant(_))
    }

    fn fold_depth(&self, value: &Value, depth: usize) -> Folded {
        if depth > MAX_FOLD_DEPTH {
            return Folded::Unfoldable;
        }
        match value {
            Value::Error | Value::Expr(_) => Folded::Unfoldable,
            Value::Ref(reference) => {
                let Some(def) = reference.target.and_then(|id| self.defs.get(id)) else {
                    return Folded::Unfoldable;
                };
                let Some(init) = def.const_value() else {
                    return Folded::Unfoldable;
                };
                let mut current = match self.fold_depth(init, depth + 1) {
                    Folded::Constant(v) => v,
                    other => return other,
                };
                for sub in &reference.subrefs {
                    current = match self.apply_subref(current, sub, depth) {
                        Folded::Constant(v) => v,
                        other => return other,
                    };
                }
                Folded::Constant(current)
            }
            Value::List(items) => {
                let mut folded = Vec::with_capacity(items.len());
                for item in items {
                    match self.fold_depth(item, depth + 1) {
                        Folded::Constant(v) => folded.push(v),
                        other => return other,
                    }
                }
                Folded::Constant(Value::List(folded))
            }
            Value::Fields(fields) => {
                let mut folded = Vec::with_capacity(fields.len());
                for (name, item) in fields {
                    match self.fold_depth(item, depth + 1) {
                        Folded::Constant(v) => folded.push((name.clone(), v)),
                        other => return other,
                    }
                }
                Folded::Constant(Value::Fields(folded))
            }
            other => Folded::Constant(other.clone()),
        }
    }

    fn apply_subref(&self, current: Value, sub: &SubRef, depth: usize) -> Folded {
        match (current, sub) {
            (Value::Fields(fields), SubRef::Field(name)) => {
                match fields.into_iter().find(|(n, _)| n == name) {
                    Some((_, Value::Omit)) => {
                        Folded::Invalid(format!("Reference to field `{name}' which is omitted"))
                    }
                    Some((_, v)) => Folded::Constant(v),
                    None => Folded::Invalid(format!("Reference to an unbound field `{name}'")),
                }
            }
            (Value::List(items), SubRef::Index(index)) => {
                let index = match self.fold_depth(index, depth + 1) {
                    Folded::Constant(Value::Integer(i)) => i,
                    Folded::Constant(_) => {
                        return Folded::Invalid("An integer value was expected as index".into());
                    }
                    other => return other,
                };
                if index < 0 {
                    return Folded::Invalid(format!(
                        "A non-negative integer value was expected as index instead of {index}"
                    ));
                }
                let len = items.len();
                match items.into_iter().nth(index as usize) {
                    Some(Value::NotUsed) => Folded::Invalid(format!(
                        "An unbound element is referenced with index {index}"
                    )),
                    Some(v) => Folded::Constant(v),
                    None => Folded::Invalid(format!(
                        "Index overflow in a value: the index is {index}, but the value has only {len} elements"
                    )),
                }
            }
            (_, SubRef::Field(name)) => Folded::Invalid(format!(
                "Invalid field reference `{name}': the value does not have fields"
            )),
            (_, SubRef::Index(_)) => {
                Folded::Invalid("Invalid array element reference: the value cannot be indexed".into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DefKind, Definition, Reference, Span, TypeHash};

    fn table() -> DefinitionTable {
        let mut defs = DefinitionTable::new();
        let int = TypeHash::from_name("integer");
        defs.add(Definition::new(
            "c_list",
            None,
            DefKind::Const {
                value: Value::int_list(&[10, 20, 30]),
            },
            Span::default(),
        ));
        defs.add(Definition::new(
            "c_alias",
            None,
            DefKind::Const {
                value: Value::Ref(Reference::new("c_list", Some(crate::DefId::new(0)), Span::default())),
            },
            Span::default(),
        ));
        defs.add(Definition::new("v", Some(int), DefKind::Var, Span::default()));
        defs
    }

    #[test]
    fn literal_folds_to_itself() {
        let defs = DefinitionTable::new();
        let folder = ConstantFolder::new(&defs);
        assert_eq!(folder.fold(&Value::Integer(4)), Folded::Constant(Value::Integer(4)));
        assert_eq!(folder.fold(&Value::Expr("rnd()".into())), Folded::Unfoldable);
    }

    #[test]
    fn reference_through_constants() {
        let defs = table();
        let folder = ConstantFolder::new(&defs);
        let r = defs.reference("c_alias", Span::default()).index(Value::Integer(1));
        assert_eq!(folder.fold_integer(&Value::Ref(r)), Some(20));
    }

    #[test]
    fn index_overflow_is_invalid() {
        let defs = table();
        let folder = ConstantFolder::new(&defs);
        let r = defs.reference("c_list", Span::default()).index(Value::Integer(3));
        assert!(matches!(folder.fold(&Value::Ref(r)), Folded::Invalid(msg) if msg.contains("overflow")));
    }

    #[test]
    fn variable_is_unfoldable() {
        let defs = table();
        let folder = ConstantFolder::new(&defs);
        let r = defs.reference("v", Span::default());
        assert!(folder.is_unfoldable(&Value::Ref(r)));
    }

    #[test]
    fn self_referencing_constant_terminates() {
        let mut defs = DefinitionTable::new();
        let id = defs.next_id();
        defs.add(Definition::new(
            "loop",
            None,
            DefKind::Const {
                value: Value::Ref(Reference::new("loop", Some(id), Span::default())),
            },
            Span::default(),
        ));
        let folder = ConstantFolder::new(&defs);
        assert_eq!(
            folder.fold(&Value::Ref(defs.reference("loop", Span::default()))),
            Folded::Unfoldable
        );
    }
}
