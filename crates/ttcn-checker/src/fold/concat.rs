//! Template concatenation (`left & right`).
//!
//! Both operands are checked against the concatenation's governor. Under a
//! string governor the node is folded when the operands are known: two
//! constant strings give a specific value, anything else that can be expressed
//! as a pattern of the governor's family gives that pattern. `record of` and
//! `set of` concatenations are only checked.

use ttcn_core::{CheckError, Folded, StringKind, TemplateId, TypeHash, TypeKind, Value};

use crate::check::{CheckOptions, Checked};
use crate::context::{Checker, Result};
use crate::length::fixed_length;
use crate::template::{CharPattern, LengthRestriction, TemplateKind};

const PATTERN_META: [char; 13] = [
    '?', '*', '\\', '[', ']', '{', '}', '#', '+', '|', '(', ')', '^',
];

/// A concatenation operand reduced to what folding needs.
#[derive(Debug)]
enum Operand {
    /// A constant string.
    Value(Value),
    /// Text of a bit, hex or octet string pattern.
    Binary(String),
    Char(CharPattern),
    /// `?`, or `?`/`*` with a fixed length.
    Wildcard { length: Option<i64> },
    Unknown,
}

impl<'a> Checker<'a> {
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn check_concat(&mut self, id: TemplateId, governor: TypeHash) -> Result<Checked> {
        let TemplateKind::Concat { left, right } = self.kind(id)? else {
            return Ok(Checked::default());
        };
        let Some(gdef) = self.type_def(governor) else {
            return Ok(Checked::default());
        };
        let string_kind = match &gdef.kind {
            TypeKind::String(kind) => Some(*kind),
            TypeKind::RecordOf { .. } | TypeKind::SetOf { .. } => None,
            _ => {
                self.error_at(
                    id,
                    CheckError::ConcatGovernor {
                        ty: gdef.name.clone(),
                    },
                )?;
                self.set_error(id)?;
                return Ok(Checked {
                    self_ref: false,
                    erroneous: true,
                });
            }
        };

        let result = self.in_context("In template concatenation", |c| {
            let mut result = Checked::default();
            result.merge(c.in_context("In first operand", |c| {
                c.check_concat_operand(left, governor, string_kind)
            })?);
            result.merge(c.in_context("In second operand", |c| {
                c.check_concat_operand(right, governor, string_kind)
            })?);
            Ok(result)
        })?;
        if self.is_error(left)? || self.is_error(right)? {
            self.set_error(id)?;
            return Ok(result);
        }
        if let Some(kind) = string_kind {
            self.fold_concat(id, left, right, governor, kind)?;
        }
        Ok(result)
    }

    fn check_concat_operand(
        &mut self,
        op: TemplateId,
        governor: TypeHash,
        string_kind: Option<StringKind>,
    ) -> Result<Checked> {
        let checked = self.check(op, governor, CheckOptions::new(false, false, true))?;
        let last = self.template_refd_last(op)?;
        if self.is_error(op)? || self.is_error(last)? {
            return Ok(checked);
        }
        let node = self.node(last)?;
        let what = node.kind.describe();
        let character = string_kind.filter(|k| k.is_character());
        let problem = match (&node.kind, character) {
            (TemplateKind::AnyOrOmit, None) if node.length.is_none() => Some((
                format!("{what} with no length restriction is not a valid concatenation operand"),
                true,
            )),
            (TemplateKind::AnyValue | TemplateKind::AnyOrOmit, None) => {
                if self.non_fixed_range(node.length.as_ref()) {
                    Some((
                        format!(
                            "{what} with non-fixed length restriction is not a valid concatenation operand"
                        ),
                        false,
                    ))
                } else {
                    None
                }
            }
            (TemplateKind::AnyValue | TemplateKind::AnyOrOmit, Some(kind)) => Some((
                format!(
                    "{what} is not allowed in {}charstring template concatenation",
                    if kind == StringKind::UniversalChar { "universal " } else { "" }
                ),
                true,
            )),
            (
                TemplateKind::SpecificValue(_)
                | TemplateKind::BitPattern(_)
                | TemplateKind::HexPattern(_)
                | TemplateKind::OctetPattern(_)
                | TemplateKind::CharPattern(_)
                | TemplateKind::UCharPattern(_)
                | TemplateKind::Concat { .. }
                | TemplateKind::Referenced { .. }
                | TemplateKind::List {
                    shape: crate::template::ListShape::Positional,
                    ..
                }
                | TemplateKind::IndexedList(_),
                _,
            ) => None,
            _ => Some((format!("{what} is not a valid concatenation operand"), true)),
        };
        if let Some((message, fatal)) = problem {
            self.error_at(op, CheckError::ConcatOperand { message })?;
            if fatal {
                self.set_error(op)?;
            }
        }
        Ok(checked)
    }

    /// A range length restriction that is open, or whose known bounds differ.
    fn non_fixed_range(&self, length: Option<&LengthRestriction>) -> bool {
        match length {
            Some(LengthRestriction::Range { upper: None, .. }) => true,
            Some(LengthRestriction::Range {
                lower,
                upper: Some(upper),
            }) => {
                let folder = self.folder();
                matches!(
                    (folder.fold_integer(lower), folder.fold_integer(upper)),
                    (Some(l), Some(u)) if l != u
                )
            }
            _ => false,
        }
    }

    fn fold_concat(
        &mut self,
        id: TemplateId,
        left: TemplateId,
        right: TemplateId,
        governor: TypeHash,
        kind: StringKind,
    ) -> Result<()> {
        let operands = [self.concat_operand(left)?, self.concat_operand(right)?];
        let folded = match operands {
            [Operand::Value(a), Operand::Value(b)] => {
                let (Some(ta), Some(tb)) = (a.string_text(), b.string_text()) else {
                    return Ok(());
                };
                let text = format!("{ta}{tb}");
                let universal = kind == StringKind::UniversalChar
                    || matches!(a, Value::UChars(_))
                    || matches!(b, Value::UChars(_));
                let value = if universal {
                    Value::UChars(text)
                } else {
                    Value::from_string(kind, text)
                };
                TemplateKind::SpecificValue(value)
            }
            operands if kind.is_character() => match char_concat(operands) {
                Some(pattern) if kind == StringKind::UniversalChar => {
                    TemplateKind::UCharPattern(pattern)
                }
                Some(pattern) => TemplateKind::CharPattern(pattern),
                None => return Ok(()),
            },
            [
                Operand::Wildcard { length: None },
                Operand::Wildcard { length: None },
            ] => TemplateKind::AnyValue,
            operands => match binary_concat(operands) {
                Some(text) => match kind {
                    StringKind::Bit => TemplateKind::BitPattern(text),
                    StringKind::Hex => TemplateKind::HexPattern(text),
                    _ => TemplateKind::OctetPattern(text),
                },
                None => {
                    tracing::trace!(template = %id, "concatenation left for run time");
                    return Ok(());
                }
            },
        };
        tracing::debug!(template = %id, result = folded.describe(), "concatenation folded");
        let is_value = matches!(folded, TemplateKind::SpecificValue(_));
        self.arena.replace_kind(id, folded)?;
        if is_value {
            self.check_specific_value(id, governor, false)?;
        }
        Ok(())
    }

    fn concat_operand(&mut self, op: TemplateId) -> Result<Operand> {
        let last = self.template_refd_last(op)?;
        let node = self.node(last)?;
        if node.ifpresent {
            return Ok(Operand::Unknown);
        }
        let folder = self.folder();
        let length = match &node.length {
            None => None,
            Some(length) => match fixed_length(&folder, length) {
                Some(n) => Some(n),
                None => return Ok(Operand::Unknown),
            },
        };
        Ok(match (&node.kind, length) {
            (TemplateKind::SpecificValue(v), None) => match folder.fold(v) {
                Folded::Constant(c) if c.string_text().is_some() => Operand::Value(c),
                _ => Operand::Unknown,
            },
            (
                TemplateKind::BitPattern(text)
                | TemplateKind::HexPattern(text)
                | TemplateKind::OctetPattern(text),
                None,
            ) => Operand::Binary(text.clone()),
            (TemplateKind::CharPattern(p) | TemplateKind::UCharPattern(p), None) => {
                Operand::Char(p.clone())
            }
            (TemplateKind::AnyValue, length) => Operand::Wildcard { length },
            (TemplateKind::AnyOrOmit, Some(n)) => Operand::Wildcard { length: Some(n) },
            _ => Operand::Unknown,
        })
    }
}

/// Join two binary string operands into pattern text.
fn binary_concat(operands: [Operand; 2]) -> Option<String> {
    let mut text = String::new();
    for operand in operands {
        match operand {
            Operand::Value(v) => text.push_str(v.string_text()?),
            Operand::Binary(t) => text.push_str(&t),
            Operand::Wildcard { length: Some(n) } => {
                text.extend(std::iter::repeat_n('?', usize::try_from(n).ok()?));
            }
            Operand::Wildcard { length: None } => {
                if !text.ends_with('*') {
                    text.push('*');
                }
            }
            Operand::Char(_) | Operand::Unknown => return None,
        }
    }
    Some(text)
}

/// Join two character string operands into one pattern.
fn char_concat(operands: [Operand; 2]) -> Option<CharPattern> {
    let mut pattern = CharPattern::default();
    for operand in operands {
        match operand {
            Operand::Value(v) => pattern.push_literal(&escape_pattern(v.string_text()?)),
            Operand::Char(p) => pattern.extend(&p),
            _ => return None,
        }
    }
    Some(pattern)
}

fn escape_pattern(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if PATTERN_META.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
