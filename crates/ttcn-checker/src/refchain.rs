//! Cycle detection for reference chains.

use ttcn_core::TemplateId;

/// The referencing nodes visited while following a chain of references.
///
/// [`ReferenceChain::add`] refuses a node already on the chain, which is how a
/// circular reference is detected. Callers bracket each step with
/// [`ReferenceChain::mark_state`] / [`ReferenceChain::prev_state`] so that
/// sibling branches do not see each other's entries.
#[derive(Debug, Clone)]
pub struct ReferenceChain {
    context: &'static str,
    entries: Vec<(TemplateId, String)>,
    marks: Vec<usize>,
}

impl ReferenceChain {
    pub fn new(context: &'static str) -> Self {
        Self {
            context,
            entries: Vec::new(),
            marks: Vec::new(),
        }
    }

    /// What the chain is being followed for ("While searching for referenced template").
    pub fn context(&self) -> &'static str {
        self.context
    }

    /// Push `node` under its display `name`; `false` if it is already on the chain.
    pub fn add(&mut self, node: TemplateId, name: &str) -> bool {
        if self.contains(node) {
            return false;
        }
        self.entries.push((node, name.to_string()));
        true
    }

    pub fn contains(&self, node: TemplateId) -> bool {
        self.entries.iter().any(|(n, _)| *n == node)
    }

    /// Remember the current length.
    pub fn mark_state(&mut self) {
        self.marks.push(self.entries.len());
    }

    /// Drop every entry added since the matching [`ReferenceChain::mark_state`].
    pub fn prev_state(&mut self) {
        if let Some(mark) = self.marks.pop() {
            self.entries.truncate(mark);
        }
    }

    /// The cycle closed by revisiting `node`: "`a' -> `b' -> `a'".
    pub fn cycle_text(&self, node: TemplateId) -> String {
        let start = self
            .entries
            .iter()
            .position(|(n, _)| *n == node)
            .unwrap_or(0);
        let mut out = String::new();
        for (_, name) in &self.entries[start..] {
            out.push_str(&format!("`{name}' -> "));
        }
        match self.entries.get(start) {
            Some((_, name)) => out.push_str(&format!("`{name}'")),
            None => out.push_str("`?'"),
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
