// src/checker/liquid.rs
// =============================================================================
// Liquid template delimiter balance check.
//
// Liquid uses `{{ ... }}` for expressions and `{% ... %}` for tags. A broken
// merge tag in a campaign usually shows up as a missing closing delimiter, so
// we count the four delimiters in the raw HTML and flag any mismatch.
//
// This is deliberately a lexical count, not a parser: escaped or quoted
// delimiters are counted like any others.
// =============================================================================

use crate::report::{CheckOutcome, Status};

/// Occurrence counts of the four liquid delimiters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelimiterCounts {
    pub open_expr: usize,
    pub close_expr: usize,
    pub open_tag: usize,
    pub close_tag: usize,
}

impl DelimiterCounts {
    /// Counts non-overlapping occurrences, scanning left to right
    /// (so "{{{" holds one "{{").
    pub fn count(text: &str) -> Self {
        Self {
            open_expr: text.matches("{{").count(),
            close_expr: text.matches("}}").count(),
            open_tag: text.matches("{%").count(),
            close_tag: text.matches("%}").count(),
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.open_expr == self.close_expr && self.open_tag == self.close_tag
    }
}

// Runs the balance check on raw, unparsed HTML
//
// Returns PASS/FAIL with `{"unbalanced": bool}` as the only detail
pub fn check_liquid_syntax(html: &str) -> CheckOutcome {
    let balanced = DelimiterCounts::count(html).is_balanced();
    let status = if balanced { Status::Pass } else { Status::Fail };

    CheckOutcome::with_detail(status, "unbalanced", !balanced)
}
