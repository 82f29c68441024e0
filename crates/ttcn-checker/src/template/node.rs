//! Template nodes.

use bitflags::bitflags;
use ttcn_core::{Reference, Span, TemplateId, TypeHash, Value};

/// Match policy of a list of sub-templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListShape {
    /// Value list notation `{ a, b, c }`.
    Positional,
    /// `(a, b, c)`
    ValueList,
    /// `complement(a, b)`
    Complemented,
    /// `superset(a, b)`
    Superset,
    /// `subset(a, b)`
    Subset,
    /// `permutation(a, b)`
    Permutation,
}

impl ListShape {
    /// Diagnostic description of a list of this shape.
    pub fn describe(self) -> &'static str {
        match self {
            ListShape::Positional => "value list notation",
            ListShape::ValueList => "value list match",
            ListShape::Complemented => "complemented list match",
            ListShape::Superset => "superset match",
            ListShape::Subset => "subset match",
            ListShape::Permutation => "permutation match",
        }
    }
}

/// `name := template` in assignment notation.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTemplate {
    pub name: String,
    pub template: TemplateId,
    pub span: Span,
}

impl NamedTemplate {
    pub fn new(name: impl Into<String>, template: TemplateId, span: Span) -> Self {
        Self {
            name: name.into(),
            template,
            span,
        }
    }
}

/// `[index] := template` in indexed list notation.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedTemplate {
    pub index: Value,
    pub template: TemplateId,
    pub span: Span,
}

/// `(min .. max)`; a missing bound is infinite.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueRange {
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub min_exclusive: bool,
    pub max_exclusive: bool,
}

impl ValueRange {
    /// Inclusive range between two bounds.
    pub fn new(min: Option<Value>, max: Option<Value>) -> Self {
        Self {
            min,
            max,
            min_exclusive: false,
            max_exclusive: false,
        }
    }

    pub fn exclusive(mut self, min: bool, max: bool) -> Self {
        self.min_exclusive = min;
        self.max_exclusive = max;
        self
    }
}

/// `length(n)` or `length(lower .. upper)`; a missing upper bound is infinite.
#[derive(Debug, Clone, PartialEq)]
pub enum LengthRestriction {
    Single(Value),
    Range { lower: Value, upper: Option<Value> },
}

impl LengthRestriction {
    pub fn single(n: i64) -> Self {
        LengthRestriction::Single(Value::Integer(n))
    }

    pub fn range(lower: i64, upper: Option<i64>) -> Self {
        LengthRestriction::Range {
            lower: Value::Integer(lower),
            upper: upper.map(Value::Integer),
        }
    }
}

/// One piece of a character pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternSegment {
    /// Pattern text as written.
    Literal(String),
    /// `{ref}`: a reference whose string value is inserted.
    Ref(Reference),
}

/// A character or universal character pattern.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CharPattern {
    pub segments: Vec<PatternSegment>,
}

impl CharPattern {
    /// A pattern made of literal text only.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            segments: vec![PatternSegment::Literal(text.into())],
        }
    }

    /// The full text when the pattern has no embedded references.
    pub fn text(&self) -> Option<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                PatternSegment::Literal(s) => out.push_str(s),
                PatternSegment::Ref(_) => return None,
            }
        }
        Some(out)
    }

    pub fn has_refs(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, PatternSegment::Ref(_)))
    }

    /// Append literal text, merging with a trailing literal segment.
    pub fn push_literal(&mut self, text: &str) {
        if let Some(PatternSegment::Literal(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(PatternSegment::Literal(text.to_string()));
        }
    }

    /// Append every segment of `other`.
    pub fn extend(&mut self, other: &CharPattern) {
        for segment in &other.segments {
            match segment {
                PatternSegment::Literal(s) => self.push_literal(s),
                PatternSegment::Ref(r) => self.segments.push(PatternSegment::Ref(r.clone())),
            }
        }
    }
}

/// A template with its own governor context: an optional explicit type and an
/// optional `modifies` reference.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateInstance {
    pub explicit_type: Option<TypeHash>,
    pub derived: Option<Reference>,
    pub body: TemplateId,
    pub span: Span,
}

impl TemplateInstance {
    pub fn new(body: TemplateId, span: Span) -> Self {
        Self {
            explicit_type: None,
            derived: None,
            body,
            span,
        }
    }

    pub fn with_type(mut self, ty: TypeHash) -> Self {
        self.explicit_type = Some(ty);
        self
    }

    pub fn modifying(mut self, base: Reference) -> Self {
        self.derived = Some(base);
        self
    }
}

/// The variant of a template node.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateKind {
    /// A node that failed its checks; dependents skip it.
    Error,
    /// `-`
    NotUsed,
    Omit,
    /// `?`
    AnyValue,
    /// `*`
    AnyOrOmit,
    SpecificValue(Value),
    /// A reference to a template-bearing definition. `resolved` caches the
    /// last template of the reference chain once it is known.
    Referenced {
        reference: Reference,
        resolved: Option<TemplateId>,
    },
    /// `callee.apply(args)`
    Invoke { callee: Value, args: Vec<Value> },
    List {
        shape: ListShape,
        items: Vec<TemplateId>,
    },
    NamedList(Vec<NamedTemplate>),
    IndexedList(Vec<IndexedTemplate>),
    Range(ValueRange),
    /// `all from <target>`
    AllFrom(TemplateId),
    BitPattern(String),
    HexPattern(String),
    OctetPattern(String),
    CharPattern(CharPattern),
    UCharPattern(CharPattern),
    /// `decmatch [encoding] target`
    DecodeMatch {
        encoding: Option<Value>,
        target: TemplateInstance,
    },
    /// `left & right`
    Concat {
        left: TemplateId,
        right: TemplateId,
    },
}

impl TemplateKind {
    /// Diagnostic description ("value range match").
    pub fn describe(&self) -> &'static str {
        match self {
            TemplateKind::Error => "erroneous template",
            TemplateKind::NotUsed => "not used symbol",
            TemplateKind::Omit => "omit value",
            TemplateKind::AnyValue => "any value",
            TemplateKind::AnyOrOmit => "any or omit",
            TemplateKind::SpecificValue(_) => "specific value",
            TemplateKind::Referenced { .. } => "referenced template",
            TemplateKind::Invoke { .. } => "template returning invoke",
            TemplateKind::List { shape, .. } => shape.describe(),
            TemplateKind::NamedList(_) => "assignment notation",
            TemplateKind::IndexedList(_) => "assignment notation with array indices",
            TemplateKind::Range(_) => "value range match",
            TemplateKind::AllFrom(_) => "template with 'all from'",
            TemplateKind::BitPattern(_) => "bitstring pattern",
            TemplateKind::HexPattern(_) => "hexstring pattern",
            TemplateKind::OctetPattern(_) => "octetstring pattern",
            TemplateKind::CharPattern(_) => "character string pattern",
            TemplateKind::UCharPattern(_) => "universal string pattern",
            TemplateKind::DecodeMatch { .. } => "decoded content match",
            TemplateKind::Concat { .. } => "template concatenation",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TemplateKind::Error)
    }

    /// The list shape, if this is a list of any shape.
    pub fn list_shape(&self) -> Option<ListShape> {
        match self {
            TemplateKind::List { shape, .. } => Some(*shape),
            _ => None,
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<TemplateId> {
        match self {
            TemplateKind::List { items, .. } => items.clone(),
            TemplateKind::NamedList(entries) => entries.iter().map(|e| e.template).collect(),
            TemplateKind::IndexedList(entries) => entries.iter().map(|e| e.template).collect(),
            TemplateKind::AllFrom(inner) => vec![*inner],
            TemplateKind::DecodeMatch { target, .. } => vec![target.body],
            TemplateKind::Concat { left, right } => vec![*left, *right],
            _ => Vec::new(),
        }
    }
}

bitflags! {
    /// Per-node state set while checking.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TemplateFlags: u16 {
        /// The structural check has run.
        const CHECKED = 1 << 0;
        /// Reference recursion has been checked.
        const RECURSIONS_CHECKED = 1 << 1;
        /// The specific value has been checked.
        const SPECIFIC_VALUE_CHECKED = 1 << 2;
        /// The length restriction has been validated.
        const LENGTH_CHECKED = 1 << 3;
        /// Every `all from` below this list was spliced at compile time.
        const FLATTENED = 1 << 4;
        /// The flattening pass has run on this list.
        const FOLDED = 1 << 5;
        /// The list contains a permutation.
        const HAS_PERMUTATION = 1 << 6;
        /// Element count is only known at run time.
        const NEEDS_RUNTIME_EXPANSION = 1 << 7;
        /// The required restriction must be verified at run time.
        const NEEDS_RUNTIME_RESTRICTION_CHECK = 1 << 8;
        /// An `omit` added for an absent optional field.
        const IMPLICIT_OMIT = 1 << 9;
    }
}

impl Default for TemplateFlags {
    fn default() -> Self {
        TemplateFlags::FLATTENED
    }
}

/// A template node with its modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub kind: TemplateKind,
    /// The declared type this node was checked against.
    pub governor: Option<TypeHash>,
    pub length: Option<LengthRestriction>,
    pub ifpresent: bool,
    /// Base template of a modified template. Non-owning.
    pub base: Option<TemplateId>,
    pub flags: TemplateFlags,
    pub span: Span,
}

impl Template {
    pub fn new(kind: TemplateKind, span: Span) -> Self {
        Self {
            kind,
            governor: None,
            length: None,
            ifpresent: false,
            base: None,
            flags: TemplateFlags::default(),
            span,
        }
    }

    pub fn with_length(mut self, length: LengthRestriction) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_ifpresent(mut self) -> Self {
        self.ifpresent = true;
        self
    }

    pub fn is_checked(&self) -> bool {
        self.flags.contains(TemplateFlags::CHECKED)
    }

    pub fn is_flattened(&self) -> bool {
        self.flags.contains(TemplateFlags::FLATTENED)
    }
}
