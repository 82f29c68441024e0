//! Length restrictions.
//!
//! The bounds are folded to integers first. A governor that has a length
//! (strings, `record of`, `set of`, arrays) then has the number of elements
//! the template guarantees compared with the bounds; arrays compare the bounds
//! with their fixed size instead.

use ttcn_core::{
    CheckError, ConstantFolder, Folded, StringKind, TemplateId, TypeHash, TypeKind, Value,
};

use crate::context::{Checker, Result};
use crate::template::{LengthRestriction, ListShape, TemplateFlags, TemplateKind};

/// Folded bounds; `None` is unknown or infinite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    exact: bool,
    lower: Option<i64>,
    upper: Option<i64>,
}

/// Elements a template guarantees to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ElementCount {
    count: usize,
    /// Something in the template matches any number of further elements.
    unbounded: bool,
    /// `count` is the most the template can match (subset).
    at_most: bool,
    what: &'static str,
}

/// The single length a restriction allows, when it is known.
pub(crate) fn fixed_length(folder: &ConstantFolder<'_>, length: &LengthRestriction) -> Option<i64> {
    match length {
        LengthRestriction::Single(n) => folder.fold_integer(n),
        LengthRestriction::Range {
            lower,
            upper: Some(upper),
        } => {
            let lower = folder.fold_integer(lower)?;
            (folder.fold_integer(upper)? == lower).then_some(lower)
        }
        LengthRestriction::Range { upper: None, .. } => None,
    }
}

/// Minimum length of a bit, hex or octet string pattern; octets are written
/// as two digits.
fn binary_pattern_min_len(kind: StringKind, text: &str) -> usize {
    let mut count = 0;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => {}
            '?' => count += 1,
            _ => {
                count += 1;
                if kind == StringKind::Octet {
                    chars.next();
                }
            }
        }
    }
    count
}

impl<'a> Checker<'a> {
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn check_length(&mut self, id: TemplateId, governor: TypeHash) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.flags.contains(TemplateFlags::LENGTH_CHECKED) {
            return Ok(());
        }
        node.flags.insert(TemplateFlags::LENGTH_CHECKED);
        let Some(length) = node.length.clone() else {
            return Ok(());
        };
        let bounds = self.length_bounds(id, &length)?;
        tracing::trace!(template = %id, ?bounds, "checking length restriction");

        let Some(gdef) = self.type_def(governor) else {
            return Ok(());
        };
        match &gdef.kind {
            TypeKind::Error | TypeKind::Port => return Ok(()),
            TypeKind::Array { dimension, .. } => self.check_array_length(id, bounds, dimension.size)?,
            TypeKind::String(_) | TypeKind::RecordOf { .. } | TypeKind::SetOf { .. } => {}
            _ => {
                return self.error_at(
                    id,
                    CheckError::LengthNotAllowed {
                        ty: gdef.name.clone(),
                    },
                );
            }
        }

        let last = self.template_refd_last(id)?;
        let count = match (self.kind(last)?, &gdef.kind) {
            (TemplateKind::Omit | TemplateKind::SpecificValue(Value::Omit), _) => {
                return self.error_at(id, CheckError::LengthWithOmit);
            }
            (TemplateKind::SpecificValue(value), kind) => match (self.folder().fold(&value), kind) {
                (Folded::Constant(v), TypeKind::String(expected)) => v
                    .string_kind()
                    .filter(|k| expected.accepts(*k))
                    .and_then(|_| v.string_len())
                    .map(|count| ElementCount {
                        count,
                        unbounded: false,
                        at_most: false,
                        what: "string",
                    }),
                (
                    Folded::Constant(Value::List(items)),
                    TypeKind::RecordOf { .. } | TypeKind::SetOf { .. },
                ) => Some(ElementCount {
                    count: items.len(),
                    unbounded: false,
                    at_most: false,
                    what: "value",
                }),
                _ => None,
            },
            (
                TemplateKind::List {
                    shape: ListShape::Positional,
                    items,
                },
                TypeKind::RecordOf { .. } | TypeKind::SetOf { .. },
            ) => {
                let (count, unbounded) = self.count_list(&items)?;
                Some(ElementCount {
                    count,
                    unbounded,
                    at_most: false,
                    what: "template",
                })
            }
            (
                TemplateKind::List {
                    shape: shape @ (ListShape::Superset | ListShape::Subset),
                    items,
                },
                TypeKind::SetOf { .. },
            ) => {
                let (count, unbounded) = self.count_list(&items)?;
                let superset = shape == ListShape::Superset;
                Some(ElementCount {
                    count,
                    unbounded: superset || unbounded,
                    at_most: !superset,
                    what: "template",
                })
            }
            (TemplateKind::BitPattern(text), TypeKind::String(StringKind::Bit))
            | (TemplateKind::HexPattern(text), TypeKind::String(StringKind::Hex))
            | (TemplateKind::OctetPattern(text), TypeKind::String(StringKind::Octet)) => {
                let kind = gdef.string_kind().unwrap_or(StringKind::Bit);
                Some(ElementCount {
                    count: binary_pattern_min_len(kind, &text),
                    unbounded: text.contains('*'),
                    at_most: false,
                    what: "string",
                })
            }
            (
                TemplateKind::CharPattern(_) | TemplateKind::UCharPattern(_),
                TypeKind::String(StringKind::Char | StringKind::UniversalChar),
            ) => Some(ElementCount {
                count: 0,
                unbounded: true,
                at_most: false,
                what: "string",
            }),
            _ => None,
        };
        match count {
            Some(count) => self.check_element_count(id, bounds, count),
            None => Ok(()),
        }
    }

    fn length_bounds(&mut self, id: TemplateId, length: &LengthRestriction) -> Result<Bounds> {
        match length {
            LengthRestriction::Single(n) => {
                let n = self.length_bound(id, n, "length restriction")?;
                Ok(Bounds {
                    exact: true,
                    lower: n,
                    upper: n,
                })
            }
            LengthRestriction::Range { lower, upper } => {
                let lower = self.length_bound(id, lower, "lower boundary of the length restriction")?;
                let mut upper = match upper {
                    Some(upper) => {
                        self.length_bound(id, upper, "upper boundary of the length restriction")?
                    }
                    None => None,
                };
                if let (Some(l), Some(u)) = (lower, upper)
                    && u < l
                {
                    self.error_at(id, CheckError::LengthUpperBelowLower { lower: l, upper: u })?;
                    upper = None;
                }
                Ok(Bounds {
                    exact: false,
                    lower,
                    upper,
                })
            }
        }
    }

    fn length_bound(&mut self, id: TemplateId, value: &Value, which: &'static str) -> Result<Option<i64>> {
        match self.folder().fold(value) {
            Folded::Constant(Value::Integer(n)) if n < 0 => {
                self.error_at(id, CheckError::NegativeLength { which, value: n })?;
                Ok(None)
            }
            Folded::Constant(Value::Integer(n)) => Ok(Some(n)),
            Folded::Constant(Value::Error) | Folded::Unfoldable => Ok(None),
            Folded::Constant(_) => {
                self.error_at(
                    id,
                    CheckError::ValueKindMismatch {
                        expected: "integer",
                    },
                )?;
                Ok(None)
            }
            Folded::Invalid(message) => {
                self.error_at(id, CheckError::Other(message))?;
                Ok(None)
            }
        }
    }

    fn check_array_length(&mut self, id: TemplateId, bounds: Bounds, size: usize) -> Result<()> {
        let array_size = i64::try_from(size).unwrap_or(i64::MAX);
        let mut contradictions = Vec::new();
        if bounds.exact {
            if let Some(n) = bounds.lower
                && n != array_size
            {
                contradictions.push(n.to_string());
            }
        } else {
            if let Some(lower) = bounds.lower
                && lower > array_size
            {
                contradictions.push(format!("at least {lower}"));
            }
            if let Some(upper) = bounds.upper
                && upper < array_size
            {
                contradictions.push(format!("at most {upper}"));
            }
        }
        if contradictions.is_empty() {
            return self.warning_at(id, "Length restriction is useless for an array template");
        }
        for allowed in contradictions {
            self.error_at(id, CheckError::LengthContradictsArray { allowed, size })?;
        }
        Ok(())
    }

    fn check_element_count(&mut self, id: TemplateId, bounds: Bounds, found: ElementCount) -> Result<()> {
        let count = i64::try_from(found.count).unwrap_or(i64::MAX);
        let describe = |n: i64, prefix: &str| {
            if bounds.exact {
                n.to_string()
            } else {
                format!("{prefix} {n}")
            }
        };
        if !found.unbounded
            && let Some(lower) = bounds.lower
            && lower > count
        {
            self.error_at(
                id,
                CheckError::TooFewElements {
                    count: found.count,
                    what: found.what,
                    bound: describe(lower, "at least"),
                },
            )?;
        }
        if !found.at_most
            && let Some(upper) = bounds.upper
            && upper < count
        {
            let qualifier = if found.unbounded { "at least " } else { "" };
            self.error_at(
                id,
                CheckError::TooManyElements {
                    count: format!("{qualifier}{}", found.count),
                    what: found.what,
                    bound: describe(upper, "at most"),
                },
            )?;
        }
        Ok(())
    }

    /// Elements a list guarantees, and whether it may hold more. Permutation
    /// members count towards the enclosing list.
    fn count_list(&self, items: &[TemplateId]) -> Result<(usize, bool)> {
        let mut count = 0;
        let mut unbounded = false;
        for &item in items {
            match self.arena.kind(item)? {
                TemplateKind::AnyOrOmit | TemplateKind::AllFrom(_) => unbounded = true,
                TemplateKind::List {
                    shape: ListShape::Permutation,
                    items,
                } => {
                    let (n, more) = self.count_list(items)?;
                    count += n;
                    unbounded |= more;
                }
                _ => count += 1,
            }
        }
        Ok((count, unbounded))
    }
}
