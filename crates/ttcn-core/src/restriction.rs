//! The template restriction lattice.
//!
//! A template-bearing definition may declare `template(omit)`, `template(value)`
//! or `template(present)`. The values form the lattice
//! `value > omit, present > none`, where `omit` and `present` are incomparable.

use std::fmt;

/// Restriction declared on a template-bearing definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Restriction {
    /// Plain `template`: anything may be matched.
    #[default]
    None,
    /// `template(omit)`: a specific value or `omit`.
    Omit,
    /// `template(value)`: a specific value only.
    Value,
    /// `template(present)`: anything except `omit`.
    Present,
}

impl Restriction {
    /// The keyword used inside `template(...)`, empty for [`Restriction::None`].
    pub fn keyword(self) -> &'static str {
        match self {
            Restriction::None => "",
            Restriction::Omit => "omit",
            Restriction::Value => "value",
            Restriction::Present => "present",
        }
    }

    /// Whether `actual` fails to guarantee everything `self` requires.
    ///
    /// Used to decide whether a reference to a definition declared with
    /// `actual` needs a run-time restriction check when used where `self`
    /// is required.
    pub fn is_less_restrictive(self, actual: Restriction) -> bool {
        match self {
            Restriction::None => false,
            Restriction::Value => actual != Restriction::Value,
            Restriction::Omit => !matches!(actual, Restriction::Value | Restriction::Omit),
            Restriction::Present => !matches!(actual, Restriction::Value | Restriction::Present),
        }
    }

    /// The restriction that still holds for a sub-field reached through a
    /// path that contains an optional field.
    ///
    /// An optional field may be absent, so `value` weakens to `omit` and
    /// `present` weakens to `none`.
    pub fn sub_restriction(self, through_optional: bool) -> Restriction {
        if !through_optional {
            return self;
        }
        match self {
            Restriction::Value => Restriction::Omit,
            Restriction::Present => Restriction::None,
            other => other,
        }
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Restriction::None => write!(f, "template"),
            other => write!(f, "template({})", other.keyword()),
        }
    }
}

/// Free-standing form of [`Restriction::is_less_restrictive`].
#[inline]
pub fn is_less_restrictive(required: Restriction, actual: Restriction) -> bool {
    required.is_less_restrictive(actual)
}

/// Free-standing form of [`Restriction::sub_restriction`].
#[inline]
pub fn sub_restriction(declared: Restriction, through_optional: bool) -> Restriction {
    declared.sub_restriction(through_optional)
}
