/// Characters of test names collected per tool-tip before it is cut off.
pub const DEFAULT_BUDGET: usize = 100;

const ELLIPSIS: &str = ",...";

/// Comma-separated list of test names bounded by a character budget.
///
/// Once a name would overflow the budget, `",..."` is appended and every later
/// name is ignored. Building a tool-tip never fails.
#[derive(Debug, Clone)]
pub struct ToolTipBuilder {
    text: String,
    chars: usize,
    budget: usize,
    truncated: bool,
}

impl ToolTipBuilder {
    pub fn new(budget: usize) -> Self {
        Self {
            text: String::new(),
            chars: 0,
            budget,
            truncated: false,
        }
    }

    pub fn push(&mut self, name: &str) {
        if self.truncated {
            return;
        }
        let len = name.chars().count();
        if self.chars + len > self.budget {
            self.truncated = true;
            self.text.push_str(ELLIPSIS);
            return;
        }
        if !self.text.is_empty() {
            self.text.push_str(", ");
            self.chars += 2;
        }
        self.text.push_str(name);
        self.chars += len;
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn finish(self) -> String {
        self.text
    }
}

impl Default for ToolTipBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET)
    }
}
