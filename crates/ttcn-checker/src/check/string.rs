//! String templates: character ranges, patterns and decoded content matching.

use ttcn_core::{CheckError, Folded, StringKind, TemplateId, TypeDef, Value};

use super::{CheckOptions, Checked};
use crate::context::{Checker, Result};
use crate::template::{CharPattern, PatternSegment, TemplateKind};

impl<'a> Checker<'a> {
    pub(super) fn check_string(
        &mut self,
        id: TemplateId,
        kind: StringKind,
        gdef: &TypeDef,
    ) -> Result<Checked> {
        match (self.kind(id)?, kind) {
            (TemplateKind::Range(range), StringKind::Char | StringKind::UniversalChar) => {
                let lower = self.char_bound(id, range.min.as_ref(), "lower", kind)?;
                let upper = self.char_bound(id, range.max.as_ref(), "upper", kind)?;
                if let (Some(l), Some(u)) = (lower, upper)
                    && l > u
                {
                    self.error_at(id, CheckError::CharRangeBounds)?;
                }
            }
            (TemplateKind::BitPattern(text), StringKind::Bit)
            | (TemplateKind::HexPattern(text), StringKind::Hex)
            | (TemplateKind::OctetPattern(text), StringKind::Octet) => {
                if let Err(message) = validate_binary_pattern(kind, &text) {
                    self.error_at(id, CheckError::PatternSyntax { message })?;
                }
            }
            (TemplateKind::CharPattern(pattern), StringKind::Char) => {
                self.resolve_pattern(id, pattern, false)?;
            }
            (TemplateKind::CharPattern(pattern), StringKind::UniversalChar)
            | (TemplateKind::UCharPattern(pattern), StringKind::UniversalChar) => {
                self.resolve_pattern(id, pattern, true)?;
            }
            (TemplateKind::DecodeMatch { encoding, target }, _) => {
                if encoding.is_some() && kind != StringKind::UniversalChar {
                    self.error_at(id, CheckError::DecodeEncodingNotAllowed)?;
                }
                return self.in_context("In decoding target", |c| {
                    let Some(ty) = c.bind(&target, None)? else {
                        c.error(target.span, CheckError::UnknownGovernor);
                        c.set_error(target.body)?;
                        return Ok(Checked::default());
                    };
                    match c.type_def(ty) {
                        Some(def) if def.is_decodable() => {}
                        _ => {
                            c.error(
                                target.span,
                                CheckError::DecodeTarget {
                                    ty: c.type_name(ty),
                                },
                            );
                            return Ok(Checked::default());
                        }
                    }
                    c.check(
                        target.body,
                        ty,
                        CheckOptions::top_level(target.derived.is_some()),
                    )
                });
            }
            _ => self.illegal_matching(id, gdef)?,
        }
        Ok(Checked::default())
    }

    /// Code point of a single-character range bound.
    fn char_bound(
        &mut self,
        id: TemplateId,
        bound: Option<&Value>,
        which: &'static str,
        kind: StringKind,
    ) -> Result<Option<char>> {
        let Some(bound) = bound else {
            self.error_at(
                id,
                CheckError::Other(format!(
                    "The {which} boundary must be a {} value",
                    kind.type_name()
                )),
            )?;
            return Ok(None);
        };
        match self.folder().fold(bound) {
            Folded::Constant(v) => match v.string_kind() {
                Some(k) if kind.accepts(k) => {
                    let mut chars = v.string_text().unwrap_or_default().chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Ok(Some(c)),
                        _ => {
                            self.error_at(id, CheckError::CharRangeBoundLength { which })?;
                            Ok(None)
                        }
                    }
                }
                _ if matches!(v, Value::Error) => Ok(None),
                _ => {
                    self.error_at(
                        id,
                        CheckError::ValueKindMismatch {
                            expected: kind.type_name(),
                        },
                    )?;
                    Ok(None)
                }
            },
            Folded::Unfoldable => Ok(None),
            Folded::Invalid(message) => {
                self.error_at(id, CheckError::Other(message))?;
                Ok(None)
            }
        }
    }

    /// Join references to constant strings into the pattern text and check
    /// the syntax once no reference is left.
    fn resolve_pattern(
        &mut self,
        id: TemplateId,
        pattern: CharPattern,
        universal: bool,
    ) -> Result<()> {
        let mut resolved = CharPattern::default();
        for segment in &pattern.segments {
            match segment {
                PatternSegment::Literal(text) => resolved.push_literal(text),
                PatternSegment::Ref(reference) => {
                    match self.folder().fold(&Value::Ref(reference.clone())) {
                        Folded::Constant(v) => match (v.string_kind(), v.string_text()) {
                            (Some(StringKind::Char), Some(text)) => resolved.push_literal(text),
                            (Some(StringKind::UniversalChar), Some(text)) if universal => {
                                resolved.push_literal(text)
                            }
                            _ => {
                                self.error(
                                    reference.span,
                                    CheckError::ValueKindMismatch {
                                        expected: if universal {
                                            "universal charstring"
                                        } else {
                                            "charstring"
                                        },
                                    },
                                );
                                resolved.segments.push(segment.clone());
                            }
                        },
                        Folded::Unfoldable => resolved.segments.push(segment.clone()),
                        Folded::Invalid(message) => {
                            self.error(reference.span, CheckError::Other(message));
                            resolved.segments.push(segment.clone());
                        }
                    }
                }
            }
        }
        if let Some(text) = resolved.text()
            && let Err(message) = validate_char_pattern(&text)
        {
            self.error_at(id, CheckError::PatternSyntax { message })?;
        }
        let kind = if universal {
            TemplateKind::UCharPattern(resolved)
        } else {
            TemplateKind::CharPattern(resolved)
        };
        self.arena.replace_kind(id, kind)?;
        Ok(())
    }
}

/// Check the alphabet of a bit, hex or octet string pattern.
pub(crate) fn validate_binary_pattern(kind: StringKind, text: &str) -> std::result::Result<(), String> {
    let name = kind.type_name();
    let mut pending_digit = false;
    for c in text.chars() {
        let legal = match kind {
            StringKind::Bit => matches!(c, '0' | '1' | '?' | '*'),
            _ => c.is_ascii_hexdigit() || matches!(c, '?' | '*'),
        };
        if !legal {
            return Err(format!("Invalid character `{c}' in {name} pattern"));
        }
        if kind == StringKind::Octet {
            if c.is_ascii_hexdigit() {
                pending_digit = !pending_digit;
            } else if pending_digit {
                return Err(format!(
                    "Wildcard `{c}' in the middle of an octet in {name} pattern"
                ));
            }
        }
    }
    if pending_digit {
        return Err(format!("Odd number of hexadecimal digits in {name} pattern"));
    }
    Ok(())
}

/// Bracket and escape structure of a character pattern.
pub(crate) fn validate_char_pattern(text: &str) -> std::result::Result<(), String> {
    let mut chars = text.chars();
    let mut groups = 0usize;
    let mut in_set = false;
    let mut in_reference = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if chars.next().is_none() {
                    return Err("Invalid escape sequence at the end of the pattern".into());
                }
            }
            ']' if in_set => in_set = false,
            _ if in_set => {}
            '[' => in_set = true,
            '{' => {
                if in_reference {
                    return Err("Nested `{' in pattern".into());
                }
                in_reference = true;
            }
            '}' => {
                if !in_reference {
                    return Err("Unmatched `}' in pattern".into());
                }
                in_reference = false;
            }
            '(' => groups += 1,
            ')' => {
                if groups == 0 {
                    return Err("Unmatched `)' in pattern".into());
                }
                groups -= 1;
            }
            _ => {}
        }
    }
    if in_set {
        return Err("Missing `]' at the end of the pattern".into());
    }
    if in_reference {
        return Err("Missing `}' at the end of the pattern".into());
    }
    if groups > 0 {
        return Err("Missing `)' at the end of the pattern".into());
    }
    Ok(())
}
