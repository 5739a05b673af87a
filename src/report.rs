// src/report.rs
// =============================================================================
// The data model shared by every check and by the HTTP layer.
//
// - QaRequest: what a caller POSTs (message id + raw email HTML)
// - Finding: one result of one check (liquid_syntax, broken_link or utm)
// - QaReport: the ordered findings plus the worst-case overall status
//
// Status derives Ord in the order PASS < WARN < FAIL, so the overall status
// of a report is simply the maximum status of its findings.
// =============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form details attached to a finding (`{"status": 200}`, `{"error": ...}`)
pub type Details = Map<String, Value>;

/// Outcome of a single check
///
/// The declaration order matters: it drives the derived Ord used for the
/// overall status (FAIL > WARN > PASS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Warn,
    Fail,
}

impl Status {
    /// Worst status over a set of statuses; PASS when there are none
    pub fn overall<I>(statuses: I) -> Status
    where
        I: IntoIterator<Item = Status>,
    {
        statuses.into_iter().max().unwrap_or(Status::Pass)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Warn => "WARN",
            Status::Fail => "FAIL",
        }
    }
}

/// Which check produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    LiquidSyntax,
    BrokenLink,
    Utm,
}

impl CheckName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::LiquidSyntax => "liquid_syntax",
            CheckName::BrokenLink => "broken_link",
            CheckName::Utm => "utm",
        }
    }
}

/// What a checker hands back before it is labelled with a check name
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub status: Status,
    pub details: Details,
}

impl CheckOutcome {
    pub fn new(status: Status, details: Details) -> Self {
        Self { status, details }
    }

    /// Shorthand for an outcome with a single detail entry
    pub fn with_detail(status: Status, key: &str, value: impl Into<Value>) -> Self {
        let mut details = Details::new();
        details.insert(key.to_string(), value.into());
        Self { status, details }
    }
}

/// One discrete check result within a QA report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub check_name: CheckName,
    pub status: Status,
    pub details: Details,
}

impl Finding {
    pub fn new(check_name: CheckName, outcome: CheckOutcome) -> Self {
        Self {
            check_name,
            status: outcome.status,
            details: outcome.details,
        }
    }

    /// Builds a per-link finding: `url` comes first, then the checker's details
    ///
    /// A checker detail named "url" would overwrite the link; none of ours
    /// produce one.
    pub fn for_link(check_name: CheckName, url: &str, outcome: CheckOutcome) -> Self {
        let mut details = Details::new();
        details.insert("url".to_string(), Value::String(url.to_string()));
        details.extend(outcome.details);

        Self {
            check_name,
            status: outcome.status,
            details,
        }
    }
}

/// The response body of POST /actions/qa_message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaReport {
    pub overall: Status,
    pub findings: Vec<Finding>,
}

impl QaReport {
    /// Derives the overall status from the findings; nothing else is stored
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        let overall = Status::overall(findings.iter().map(|f| f.status));
        Self { overall, findings }
    }

    pub fn count(&self, check_name: CheckName) -> usize {
        self.findings
            .iter()
            .filter(|f| f.check_name == check_name)
            .count()
    }
}

/// The request body of POST /actions/qa_message
///
/// `message_id` is accepted for caller bookkeeping only; it is never echoed
/// back. An explicit `null` is kept as None.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaRequest {
    #[serde(default = "default_message_id")]
    pub message_id: Option<String>,
    pub html: String,
}

fn default_message_id() -> Option<String> {
    Some("ad-hoc".to_string())
}
