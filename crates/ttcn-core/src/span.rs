//! Source locations attached to template nodes, definitions and diagnostics.

use std::fmt;

/// Where a construct starts in the module source. The default span is used
/// for nodes the checker synthesizes (implicit omit, spliced elements).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct Span {
    /// 1-based line.
    pub line: u32,
    /// 1-based byte column.
    pub col: u32,
    pub len: u32,
}

impl Span {
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// True for spans the checker made up rather than read from source.
    pub fn is_synthetic(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_synthetic() {
            f.write_str("<generated>")
        } else {
            write!(f, "{}:{}", self.line, self.col)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_line_and_column() {
        assert_eq!(Span::new(3, 7, 2).to_string(), "3:7");
    }

    #[test]
    fn default_span_is_generated() {
        assert!(Span::default().is_synthetic());
        assert_eq!(Span::default().to_string(), "<generated>");
    }
}
