//! Checker configuration.

/// Options that change what the checker accepts.
///
/// Passed by reference to every [`crate::Checker`]; never mutated while a
/// template is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckerConfig {
    /// Accept template concatenation (`&`) and decoded content matching.
    pub string_concat_enabled: bool,
    /// Accept `omit` as an element of value lists and complemented lists.
    pub omit_allowed_in_value_lists: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            string_concat_enabled: true,
            omit_allowed_in_value_lists: false,
        }
    }
}

impl CheckerConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable concatenation and decoded content matching.
    pub fn with_string_concat(mut self, enabled: bool) -> Self {
        self.string_concat_enabled = enabled;
        self
    }

    /// Allow or forbid `omit` inside value lists.
    pub fn with_omit_in_value_lists(mut self, allowed: bool) -> Self {
        self.omit_allowed_in_value_lists = allowed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CheckerConfig::default();
        assert!(config.string_concat_enabled);
        assert!(!config.omit_allowed_in_value_lists);
    }

    #[test]
    fn builders() {
        let config = CheckerConfig::new()
            .with_string_concat(false)
            .with_omit_in_value_lists(true);
        assert!(!config.string_concat_enabled);
        assert!(config.omit_allowed_in_value_lists);
    }
}
