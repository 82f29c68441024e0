//! Error types for template checking.
//!
//! Two classes live here:
//!
//! ```text
//! CheckError     - user diagnostics, attached to a Diagnostic and never fatal
//! InternalError  - checker defects; abort the definition being checked
//! ```
//!
//! Recoverable structural failures (unresolved references, unresolved indices)
//! are reported as a [`CheckError`] and the offending node is rewritten to the
//! error sentinel by the checker.

use thiserror::Error;

use crate::TemplateId;

// ============================================================================
// User diagnostics
// ============================================================================

/// A user-facing problem found while checking a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    // ---- wildcard and terminal policy -------------------------------------
    /// `omit` where the context forbids it.
    #[error("`omit' value is not allowed in this context")]
    OmitNotAllowed,

    /// `*` where full information is required.
    #[error("Using `*' for mandatory field")]
    AnyOrOmitForMandatory,

    /// `?` or `*` directly on a signature governor.
    #[error("Generic wildcard `{symbol}' cannot be used for signature `{ty}'")]
    WildcardForSignature { symbol: &'static str, ty: String },

    /// `ifpresent` where the value may not be absent.
    #[error("`ifpresent' is not allowed here")]
    IfpresentNotAllowed,

    /// A matching mechanism the governor category does not accept.
    #[error("{what} cannot be used for type `{ty}'")]
    IllegalMatching { what: &'static str, ty: String },

    // ---- governor binding and references ----------------------------------
    /// Explicit type annotation incompatible with the context.
    #[error("Incompatible explicit type specification: `{expected}' was expected instead of `{found}'")]
    ExplicitTypeMismatch { expected: String, found: String },

    /// `modifies` names something that holds no template.
    #[error("Reference to a template was expected in the `modifies' definition instead of {found}")]
    NotATemplate { found: String },

    /// `modifies` base has a type incompatible with the context.
    #[error("Base template `{base}' has incompatible type: `{expected}' was expected instead of `{found}'")]
    BaseTypeMismatch {
        base: String,
        expected: String,
        found: String,
    },

    /// A referenced or invoked template has an incompatible type.
    #[error("Type mismatch: a value or template of type `{expected}' was expected instead of `{found}'")]
    TypeMismatch { expected: String, found: String },

    /// A value of the wrong kind where a scalar of a fixed kind is required.
    #[error("{expected} value was expected")]
    ValueKindMismatch { expected: &'static str },

    /// A reference to a name with no definition.
    #[error("There is no local or imported definition with name `{name}'")]
    UnresolvedReference { name: String },

    /// A chain of references that leads back to its start.
    #[error("Circular reference: {chain}")]
    CircularReference { chain: String },

    /// A field or index sub-reference that cannot be followed.
    #[error("{message}")]
    InvalidSubReference { message: String },

    /// The governor of a template could not be determined.
    #[error("Cannot determine the type of the template")]
    UnknownGovernor,

    // ---- structured templates ---------------------------------------------
    /// Field or alternative name that the type does not declare.
    #[error("Reference to non-existent field `{field}' in {kind} template for type `{ty}'")]
    UnknownField {
        field: String,
        kind: &'static str,
        ty: String,
    },

    /// Same field named twice.
    #[error("Duplicate field `{field}' in template")]
    DuplicateField { field: String },

    /// Mandatory field absent in a complete template.
    #[error("Field `{field}' is missing from template for {kind} type `{ty}'")]
    MissingField {
        field: String,
        kind: &'static str,
        ty: String,
    },

    /// Value list notation with more elements than the type has fields.
    #[error("Too many elements in value list notation for type `{ty}': {expected} was expected instead of {found}")]
    TooManyListElements {
        ty: String,
        expected: usize,
        found: usize,
    },

    /// Value list notation with fewer elements than a signature has parameters.
    #[error("Too few elements in value list notation for type `{ty}': {expected} was expected instead of {found}")]
    TooFewListElements {
        ty: String,
        expected: usize,
        found: usize,
    },

    /// Value list notation on a set type.
    #[error("Value list notation is not allowed for set type `{ty}'")]
    SetValueListNotation { ty: String },

    /// Union template with zero or several alternatives.
    #[error("A template for union type must contain exactly one selected field")]
    UnionFieldCount,

    /// `-` outside a partial template.
    #[error("Not used symbol `-' is not allowed in this context")]
    NotUsedSymbol,

    /// `-` past the end of the base template.
    #[error("Not used symbol `-' cannot be used here because there is no corresponding element in the base template")]
    NotUsedWithoutBase,

    /// Negative index in indexed list notation.
    #[error("A non-negative integer value was expected for indexing type `{ty}' instead of `{index}'")]
    NegativeIndex { ty: String, index: i64 },

    /// Same index used twice in indexed list notation.
    #[error("Duplicate index value `{index}' for components `{previous}' and `{current}'")]
    DuplicateIndex {
        index: i64,
        previous: usize,
        current: usize,
    },

    /// Array template element count differs from the dimension.
    #[error("Too {direction} elements in the array template: {expected} was expected instead of {found}")]
    ArraySize {
        direction: &'static str,
        expected: usize,
        found: usize,
    },

    /// Permutation or index notation where the array may not be sliced.
    #[error("{what} cannot be used for array type `{ty}' in this context, because the array cannot be sliced")]
    ArrayNotSliceable { what: &'static str, ty: String },

    /// Signature parameter that the signature does not declare.
    #[error("Reference to non-existent parameter `{param}' in template for signature `{ty}'")]
    UnknownParameter { param: String, ty: String },

    /// Same signature parameter named twice.
    #[error("Duplicate parameter `{param}' in template for signature `{ty}'")]
    DuplicateParameter { param: String, ty: String },

    /// Signature parameter named out of declaration order.
    #[error("Unexpected parameter `{param}' in signature template")]
    UnexpectedParameter { param: String },

    /// Parameters a complete signature template must mention.
    #[error("Signature template is incomplete, because {detail}")]
    IncompleteSignature { detail: String },

    /// Value of a type without a function signature where one was expected.
    #[error("A value of type function was expected in the argument instead of `{ty}'")]
    NotAFunction { ty: String },

    // ---- ranges and patterns ----------------------------------------------
    /// Numeric range whose lower bound exceeds the upper bound.
    #[error("The lower boundary is higher than the upper boundary")]
    RangeBounds,

    /// Character range whose lower bound has a higher code point.
    #[error("The lower boundary has higher character code than the upper boundary")]
    CharRangeBounds,

    /// Character range bound that is not a single character.
    #[error("The {which} boundary of the range must be a single character")]
    CharRangeBoundLength { which: &'static str },

    /// Excluded infinite bound on an integer range.
    #[error("invalid {which} boundary, {sign}infinity cannot be excluded from an integer template range")]
    ExcludedInfinity {
        which: &'static str,
        sign: &'static str,
    },

    /// Illegal symbol inside a fixed-alphabet or character pattern.
    #[error("{message}")]
    PatternSyntax { message: String },

    /// Encoding format on a non-universal-charstring decode match.
    #[error("The encoding format parameter is only available to universal charstring templates")]
    DecodeEncodingNotAllowed,

    /// Decode match whose target type cannot be decoded.
    #[error("Type `{ty}' cannot be the target of a decoded content match")]
    DecodeTarget { ty: String },

    // ---- compile-time folding ---------------------------------------------
    /// Concatenation switched off by configuration.
    #[error("Concatenation of templates is not supported")]
    ConcatNotSupported,

    /// Decode matching switched off by configuration.
    #[error("Decoded content match is not supported")]
    DecodeNotSupported,

    /// Concatenation under a governor that is neither string nor list.
    #[error("Templates of type `{ty}' cannot be concatenated")]
    ConcatGovernor { ty: String },

    /// Illegal concatenation operand.
    #[error("{message}")]
    ConcatOperand { message: String },

    /// `?` or `*` as the target of `all from`.
    #[error("Matching mechanism can not be used as target of 'all from'")]
    AllFromMatching,

    /// Permutation or `*` contents spliced outside a permutation.
    #[error("'all from' can not refer to permutation or AnyElementsOrNone")]
    AllFromPermutation,

    /// Target that is not a reference at all.
    #[error("The target of an 'all from' must be a specific value template, not a {what}")]
    AllFromTarget { what: &'static str },

    /// A definition whose type cannot be spliced.
    #[error("A {what} of type `{ty}' can not be used as target of 'all from'")]
    AllFromKind { what: String, ty: String },

    // ---- restrictions -----------------------------------------------------
    /// Matching mechanism that the required restriction forbids.
    #[error("Restriction on {definition} does not allow usage of {usage}")]
    RestrictionViolation { definition: String, usage: String },

    // ---- length restrictions ----------------------------------------------
    /// Length restriction on a type that has no length.
    #[error("Length restriction cannot be used in a template of type `{ty}'")]
    LengthNotAllowed { ty: String },

    /// Length restriction attached to `omit`.
    #[error("Length restriction cannot be used with omit value")]
    LengthWithOmit,

    /// Negative length bound.
    #[error("The {which} must be a non-negative integer value instead of {value}")]
    NegativeLength { which: &'static str, value: i64 },

    /// Upper length bound below the lower one.
    #[error("The upper boundary of the length restriction ({upper}) cannot be smaller than the lower boundary ({lower})")]
    LengthUpperBelowLower { lower: i64, upper: i64 },

    /// Length restriction contradicting a fixed array size.
    #[error("The number of elements allowed by the length restriction ({allowed}) contradicts the array size ({size})")]
    LengthContradictsArray { allowed: String, size: usize },

    /// Fewer elements guaranteed than the restriction's lower bound.
    #[error("There are fewer ({count}) elements in the {what} than it is allowed by the length restriction ({bound})")]
    TooFewElements {
        count: usize,
        what: &'static str,
        bound: String,
    },

    /// More elements required than the restriction's upper bound.
    #[error("There are more ({count}) elements in the {what} than it is allowed by the length restriction ({bound})")]
    TooManyElements {
        count: String,
        what: &'static str,
        bound: String,
    },

    /// Anything not covered above.
    #[error("{0}")]
    Other(String),
}

// ============================================================================
// Internal errors
// ============================================================================

/// A defect in the checker itself.
///
/// Returned through every recursive check call; the definition under check is
/// abandoned but diagnostics already reported are kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    /// A variant change outside the permitted transitions.
    #[error("internal error: illegal template transition from {from} to {to}")]
    IllegalTransition {
        from: &'static str,
        to: &'static str,
    },

    /// An arena index with no node behind it.
    #[error("internal error: no template node {0}")]
    DanglingTemplate(TemplateId),

    /// A variant/governor pairing that cannot occur.
    #[error("internal error: {message}")]
    Invariant { message: String },
}

impl InternalError {
    /// Shorthand for [`InternalError::Invariant`].
    pub fn invariant(message: impl Into<String>) -> Self {
        InternalError::Invariant {
            message: message.into(),
        }
    }
}
