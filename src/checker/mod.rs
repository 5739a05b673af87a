// src/checker/mod.rs
// =============================================================================
// This module contains the individual QA checks.
//
// Submodules:
// - html: Extracts anchor links from email HTML
// - http: Checks that a link answers (HEAD request)
// - utm: Checks the campaign tracking parameters of a link
// - liquid: Checks that liquid template delimiters are balanced
//
// Each check returns a CheckOutcome (status + details); the QA engine in
// qa.rs labels them and puts them in order.
// =============================================================================

pub mod html;
pub mod http;
pub mod liquid;
pub mod utm;

#[cfg(test)]
pub mod fake;

pub use html::extract_links;
pub use http::{check_link, HttpProbe, LinkProbe, ProbeResult, DEFAULT_TIMEOUT};
pub use liquid::{check_liquid_syntax, DelimiterCounts};
pub use utm::UtmRules;
