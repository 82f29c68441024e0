//! The value model referenced by templates.
//!
//! Only what the template checker needs is modelled: literal constants of every
//! scalar and string family, structured literals, references to definitions and
//! an opaque expression form the constant folder never evaluates.

use std::fmt;

use ordered_float::OrderedFloat;

use crate::types::StringKind;
use crate::{DefId, Span};

/// A value node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// A value that already failed its checks.
    Error,
    /// `omit`.
    Omit,
    /// `-` inside a partial value list.
    NotUsed,
    /// `null` component or default reference.
    Null,
    Boolean(bool),
    Integer(i64),
    Real(OrderedFloat<f64>),
    /// An enumerated item or verdict.
    Enumerated(String),
    Bits(String),
    Hex(String),
    Octets(String),
    Chars(String),
    UChars(String),
    /// Value list notation: record-of, set-of or array value.
    List(Vec<Value>),
    /// Assignment notation: record, set or union value.
    Fields(Vec<(String, Value)>),
    /// Reference to a definition, possibly with sub-references.
    Ref(Reference),
    /// An expression only known at run time.
    Expr(String),
}

impl Value {
    /// Real value from an `f64`.
    pub fn real(v: f64) -> Self {
        Value::Real(OrderedFloat(v))
    }

    /// Character string value.
    pub fn chars(s: impl Into<String>) -> Self {
        Value::Chars(s.into())
    }

    /// Integer list value.
    pub fn int_list(items: &[i64]) -> Self {
        Value::List(items.iter().copied().map(Value::Integer).collect())
    }

    /// The string family of a string literal.
    pub fn string_kind(&self) -> Option<StringKind> {
        match self {
            Value::Bits(_) => Some(StringKind::Bit),
            Value::Hex(_) => Some(StringKind::Hex),
            Value::Octets(_) => Some(StringKind::Octet),
            Value::Chars(_) => Some(StringKind::Char),
            Value::UChars(_) => Some(StringKind::UniversalChar),
            _ => None,
        }
    }

    /// The raw text of a string literal.
    pub fn string_text(&self) -> Option<&str> {
        match self {
            Value::Bits(s) | Value::Hex(s) | Value::Octets(s) | Value::Chars(s) | Value::UChars(s) => {
                Some(s)
            }
            _ => None,
        }
    }

    /// Length of a string literal in elements (octets count two hex digits).
    pub fn string_len(&self) -> Option<usize> {
        match self {
            Value::Bits(s) | Value::Hex(s) => Some(s.len()),
            Value::Octets(s) => Some(s.len() / 2),
            Value::Chars(s) | Value::UChars(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    /// Build a string literal of the given family.
    pub fn from_string(kind: StringKind, text: String) -> Self {
        match kind {
            StringKind::Bit => Value::Bits(text),
            StringKind::Hex => Value::Hex(text),
            StringKind::Octet => Value::Octets(text),
            StringKind::Char => Value::Chars(text),
            StringKind::UniversalChar => Value::UChars(text),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Human-readable kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Error => "erroneous value",
            Value::Omit => "omit value",
            Value::NotUsed => "not used symbol",
            Value::Null => "null value",
            Value::Boolean(_) => "boolean value",
            Value::Integer(_) => "integer value",
            Value::Real(_) => "float value",
            Value::Enumerated(_) => "enumerated value",
            Value::Bits(_) => "bitstring value",
            Value::Hex(_) => "hexstring value",
            Value::Octets(_) => "octetstring value",
            Value::Chars(_) => "charstring value",
            Value::UChars(_) => "universal charstring value",
            Value::List(_) => "value list",
            Value::Fields(_) => "assignment notation",
            Value::Ref(_) => "reference",
            Value::Expr(_) => "expression",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Error => write!(f, "<erroneous>"),
            Value::Omit => write!(f, "omit"),
            Value::NotUsed => write!(f, "-"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{}", r.0),
            Value::Enumerated(e) => write!(f, "{e}"),
            Value::Bits(s) => write!(f, "'{s}'B"),
            Value::Hex(s) => write!(f, "'{s}'H"),
            Value::Octets(s) => write!(f, "'{s}'O"),
            Value::Chars(s) | Value::UChars(s) => write!(f, "\"{s}\""),
            Value::List(items) => {
                write!(f, "{{ ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, " }}")
            }
            Value::Fields(fields) => {
                write!(f, "{{ ")?;
                for (i, (name, item)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name} := {item}")?;
                }
                write!(f, " }}")
            }
            Value::Ref(r) => write!(f, "{r}"),
            Value::Expr(e) => write!(f, "{e}"),
        }
    }
}

/// One step of a sub-reference path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubRef {
    /// `.field`
    Field(String),
    /// `[index]`
    Index(Value),
}

/// A reference to a definition: `name.field[index](args)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// The name as written.
    pub name: String,
    /// The resolved definition, `None` when the name is undefined.
    pub target: Option<DefId>,
    pub subrefs: Vec<SubRef>,
    /// Actual parameters of a parameterized reference.
    pub args: Option<Vec<Value>>,
    pub span: Span,
}

impl Reference {
    /// A plain reference to `target`.
    pub fn new(name: impl Into<String>, target: Option<DefId>, span: Span) -> Self {
        Self {
            name: name.into(),
            target,
            subrefs: Vec::new(),
            args: None,
            span,
        }
    }

    /// Append a `.field` sub-reference.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.subrefs.push(SubRef::Field(name.into()));
        self
    }

    /// Append an `[index]` sub-reference.
    pub fn index(mut self, index: Value) -> Self {
        self.subrefs.push(SubRef::Index(index));
        self
    }

    /// Attach actual parameters.
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = Some(args);
        self
    }

    pub fn is_parameterized(&self) -> bool {
        self.args.is_some()
    }

    pub fn has_subrefs(&self) -> bool {
        !self.subrefs.is_empty()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(args) = &self.args {
            write!(f, "(")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ")")?;
        }
        for sub in &self.subrefs {
            match sub {
                SubRef::Field(name) => write!(f, ".{name}")?,
                SubRef::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}
