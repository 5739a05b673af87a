// src/checker/http.rs
// =============================================================================
// This module checks if links are alive by making HTTP requests.
//
// Key functionality:
// - Makes HTTP HEAD requests (lightweight, no body download)
// - Follows redirects and judges the FINAL status code
// - Turns every network failure (timeout, DNS, TLS, bad URL...) into data
//   instead of an error, so one dead link never fails a whole QA run
//
// The network call sits behind the LinkProbe trait. The server uses
// HttpProbe (reqwest); tests plug in a fake with canned answers.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::error::Error as _;
use std::time::Duration;

use crate::report::{CheckOutcome, Status};

/// Default per-link timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Redirect hops followed before a link counts as a redirect loop
pub const MAX_REDIRECTS: usize = 10;

// What happened when we poked a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// Got a response; holds the final status code after redirects
    Response(u16),
    /// No response at all; holds a human-readable reason
    Failed(String),
}

impl ProbeResult {
    // Classifies the probe result
    //
    // - status < 400: PASS, {"status": code}
    // - status >= 400: FAIL, {"status": code}
    // - no response: FAIL, {"error": reason}
    pub fn into_outcome(self) -> CheckOutcome {
        match self {
            ProbeResult::Response(code) if code < 400 => {
                CheckOutcome::with_detail(Status::Pass, "status", code)
            }
            ProbeResult::Response(code) => CheckOutcome::with_detail(Status::Fail, "status", code),
            ProbeResult::Failed(reason) => CheckOutcome::with_detail(Status::Fail, "error", reason),
        }
    }
}

/// Something that can tell whether a link answers
///
/// Implementations must not panic or return errors: every failure mode is a
/// ProbeResult::Failed.
#[async_trait]
pub trait LinkProbe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeResult;
}

// The real probe: one pooled reqwest client shared by all requests
//
// Client is cheap to clone (it's an Arc internally), but we never need to:
// the probe itself lives behind an Arc in the QA engine.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl LinkProbe for HttpProbe {
    async fn probe(&self, url: &str) -> ProbeResult {
        // HEAD only: we want the status line, not the page
        match self.client.head(url).send().await {
            Ok(response) => ProbeResult::Response(response.status().as_u16()),
            Err(e) => ProbeResult::Failed(describe_error(&e)),
        }
    }
}

// Checks a single link and classifies the result
//
// Parameters:
//   probe: whichever LinkProbe the engine was built with
//   url: the href exactly as it appeared in the email
pub async fn check_link(probe: &dyn LinkProbe, url: &str) -> CheckOutcome {
    let result = probe.probe(url).await;

    if let ProbeResult::Failed(reason) = &result {
        tracing::debug!(url, reason = reason.as_str(), "link unreachable");
    }

    result.into_outcome()
}

// Turns a reqwest error into a readable one-line description
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - Too many redirects
// - DNS resolution failure / connection refused
// - SSL certificate issues
// - A URL that could not even be built into a request (relative, mailto:...)
//
// reqwest's own Display is terse ("error sending request for url (...)"),
// so we label the category and append the underlying cause chain.
fn describe_error(error: &reqwest::Error) -> String {
    let category = if error.is_timeout() {
        "timeout"
    } else if error.is_redirect() {
        "too many redirects"
    } else if error.is_builder() {
        "invalid url"
    } else if error.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };

    let mut message = format!("{}: {}", category, error);
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a trait instead of calling reqwest directly?
//    - The QA engine only needs "URL in, ProbeResult out"
//    - Tests can then check ordering and classification without internet
//    - async fn in a trait object needs #[async_trait] (it boxes the future)
//
// 2. Why Send + Sync on the trait?
//    - The probe is shared (Arc<dyn LinkProbe>) by every request handler,
//      and axum runs handlers on many threads at once
//
// 3. What about redirects?
//    - reqwest follows them for us, keeping HEAD as the method
//    - response.status() is then the status of the LAST hop
// -----------------------------------------------------------------------------
