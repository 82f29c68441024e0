//! The declared-type model consumed by the checker.
//!
//! Types are registered once and never change while templates are checked; the
//! checker only reads them through [`TypeOracle`].
//!
//! ## Components
//!
//! - [`TypeDef`] / [`TypeKind`]: one declared type and its structural category
//! - [`Field`], [`ArrayDimension`], [`SignatureParam`]: category payloads
//! - [`TypeOracle`]: the read-only query interface
//! - [`TypeRegistry`]: an in-memory oracle keyed by [`TypeHash`]

mod registry;

pub use registry::{TypeOracle, TypeRegistry};

use crate::TypeHash;

/// The five fixed-content string families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    Bit,
    Hex,
    Octet,
    Char,
    UniversalChar,
}

impl StringKind {
    /// The TTCN-3 type keyword.
    pub fn type_name(self) -> &'static str {
        match self {
            StringKind::Bit => "bitstring",
            StringKind::Hex => "hexstring",
            StringKind::Octet => "octetstring",
            StringKind::Char => "charstring",
            StringKind::UniversalChar => "universal charstring",
        }
    }

    /// Character strings (as opposed to binary strings).
    pub fn is_character(self) -> bool {
        matches!(self, StringKind::Char | StringKind::UniversalChar)
    }

    /// Whether a value or template of kind `other` may be used where `self`
    /// is expected. Character strings promote to universal character strings.
    pub fn accepts(self, other: StringKind) -> bool {
        self == other || (self == StringKind::UniversalChar && other == StringKind::Char)
    }
}

/// A field of a record or set, or an alternative of a union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: TypeHash,
    pub optional: bool,
    pub has_default: bool,
}

impl Field {
    /// A mandatory field.
    pub fn mandatory(name: impl Into<String>, ty: TypeHash) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            has_default: false,
        }
    }

    /// An optional field.
    pub fn optional(name: impl Into<String>, ty: TypeHash) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: true,
            has_default: false,
        }
    }
}

/// Size and first index of one array dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayDimension {
    pub size: usize,
    pub offset: i64,
}

impl ArrayDimension {
    pub fn new(size: usize) -> Self {
        Self { size, offset: 0 }
    }

    pub fn with_offset(size: usize, offset: i64) -> Self {
        Self { size, offset }
    }
}

/// Direction of a signature parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamDirection {
    In,
    Out,
    InOut,
}

impl ParamDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            ParamDirection::In => "in",
            ParamDirection::Out => "out",
            ParamDirection::InOut => "inout",
        }
    }
}

/// A formal parameter of a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureParam {
    pub name: String,
    pub ty: TypeHash,
    pub direction: ParamDirection,
}

impl SignatureParam {
    pub fn new(name: impl Into<String>, ty: TypeHash, direction: ParamDirection) -> Self {
        Self {
            name: name.into(),
            ty,
            direction,
        }
    }
}

/// Structural category of a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Boolean,
    Integer,
    Real,
    Verdict,
    Enumerated { items: Vec<String> },
    ObjectIdentifier,
    Default,
    Component,
    Port,
    /// Function, altstep or testcase reference type.
    Behaviour { returns: Option<TypeHash> },
    String(StringKind),
    Record { fields: Vec<Field> },
    Set { fields: Vec<Field> },
    Union { alternatives: Vec<Field> },
    RecordOf { element: TypeHash },
    SetOf { element: TypeHash },
    Array {
        element: TypeHash,
        dimension: ArrayDimension,
    },
    Signature {
        params: Vec<SignatureParam>,
        returns: Option<TypeHash>,
        exceptions: Vec<TypeHash>,
    },
    /// A named alias of another type.
    Alias(TypeHash),
    /// A type that failed its own checks; templates of it are not examined.
    Error,
}

/// A declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
}

impl TypeDef {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// The hash this definition is registered under.
    pub fn hash(&self) -> TypeHash {
        TypeHash::from_name(&self.name)
    }

    /// Fields of a record or set, alternatives of a union.
    pub fn fields(&self) -> Option<&[Field]> {
        match &self.kind {
            TypeKind::Record { fields } | TypeKind::Set { fields } => Some(fields),
            TypeKind::Union { alternatives } => Some(alternatives),
            _ => None,
        }
    }

    /// Look up a field or alternative by name.
    pub fn field(&self, name: &str) -> Option<(usize, &Field)> {
        self.fields()?
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
    }

    /// Element type of a record-of, set-of or array.
    pub fn element(&self) -> Option<TypeHash> {
        match &self.kind {
            TypeKind::RecordOf { element }
            | TypeKind::SetOf { element }
            | TypeKind::Array { element, .. } => Some(*element),
            _ => None,
        }
    }

    /// The string family, if this is a string type.
    pub fn string_kind(&self) -> Option<StringKind> {
        match self.kind {
            TypeKind::String(kind) => Some(kind),
            _ => None,
        }
    }

    /// Record-of, set-of or array.
    pub fn is_list(&self) -> bool {
        self.element().is_some()
    }

    /// Whether a decoded content match may target this type.
    pub fn is_decodable(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Record { .. }
                | TypeKind::Set { .. }
                | TypeKind::Union { .. }
                | TypeKind::RecordOf { .. }
                | TypeKind::SetOf { .. }
                | TypeKind::String(_)
                | TypeKind::Integer
                | TypeKind::Real
                | TypeKind::Boolean
                | TypeKind::Enumerated { .. }
        )
    }

    /// Category word used in diagnostics ("record", "set", "union").
    pub fn category_name(&self) -> &'static str {
        match &self.kind {
            TypeKind::Record { .. } => "record",
            TypeKind::Set { .. } => "set",
            TypeKind::Union { .. } => "union",
            TypeKind::RecordOf { .. } => "record of",
            TypeKind::SetOf { .. } => "set of",
            TypeKind::Array { .. } => "array",
            TypeKind::Signature { .. } => "signature",
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int() -> TypeHash {
        TypeHash::from_name("integer")
    }

    #[test]
    fn field_lookup() {
        let rec = TypeDef::new(
            "R",
            TypeKind::Record {
                fields: vec![Field::mandatory("a", int()), Field::optional("b", int())],
            },
        );
        let (idx, field) = rec.field("b").unwrap();
        assert_eq!(idx, 1);
        assert!(field.optional);
        assert!(rec.field("c").is_none());
    }

    #[test]
    fn element_of_lists() {
        let seof = TypeDef::new("L", TypeKind::RecordOf { element: int() });
        let arr = TypeDef::new(
            "A",
            TypeKind::Array {
                element: int(),
                dimension: ArrayDimension::new(5),
            },
        );
        assert_eq!(seof.element(), Some(int()));
        assert!(arr.is_list());
        assert!(!TypeDef::new("i", TypeKind::Integer).is_list());
    }

    #[test]
    fn char_promotes_to_universal() {
        assert!(StringKind::UniversalChar.accepts(StringKind::Char));
        assert!(!StringKind::Char.accepts(StringKind::UniversalChar));
        assert!(!StringKind::Bit.accepts(StringKind::Hex));
    }
}
