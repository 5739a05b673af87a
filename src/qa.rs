// src/qa.rs
// =============================================================================
// The QA engine: runs every check on one email and builds the report.
//
// Order of findings (always the same for the same HTML):
// 1. liquid_syntax, on the raw HTML
// 2. for each link, in document order:
//      broken_link (reachability), then utm (tracking parameters)
//
// Nothing short-circuits: a dead first link does not stop the others.
//
// Links are checked concurrently, up to `max_concurrent_checks` at a time.
// We use .buffered(n), not .buffer_unordered(n): results come back in input
// order, so the report looks exactly like a sequential run.
// =============================================================================

use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::checker::{
    check_link, check_liquid_syntax, extract_links, HttpProbe, LinkProbe, UtmRules,
};
use crate::config::QaConfig;
use crate::report::{CheckName, Finding, QaReport};

pub struct QaEngine {
    probe: Arc<dyn LinkProbe>,
    utm_rules: UtmRules,
    max_concurrent_checks: usize,
}

impl QaEngine {
    pub fn new(
        probe: Arc<dyn LinkProbe>,
        utm_rules: UtmRules,
        max_concurrent_checks: usize,
    ) -> Self {
        Self {
            probe,
            utm_rules,
            // buffered(0) would never poll anything
            max_concurrent_checks: max_concurrent_checks.max(1),
        }
    }

    // Builds the production engine: a real HTTP probe with the configured timeout
    pub fn from_config(config: &QaConfig) -> Result<Self> {
        let probe = HttpProbe::new(config.link_timeout)?;
        Ok(Self::new(
            Arc::new(probe),
            config.utm_rules.clone(),
            config.max_concurrent_checks,
        ))
    }

    // Runs all checks on one email
    //
    // Never fails: every problem found is a finding, not an error.
    pub async fn run(&self, html: &str) -> QaReport {
        let mut findings = vec![Finding::new(
            CheckName::LiquidSyntax,
            check_liquid_syntax(html),
        )];

        let links = extract_links(html);

        // Each future owns its URL; futures borrowing the iterator's item are
        // not Send for every lifetime, which axum handlers require.
        let per_link: Vec<[Finding; 2]> = stream::iter(links.iter().cloned())
            .map(|url| async move { self.check_one_link(&url).await })
            .buffered(self.max_concurrent_checks)
            .collect()
            .await;

        findings.extend(per_link.into_iter().flatten());

        let report = QaReport::from_findings(findings);
        tracing::debug!(
            links = links.len(),
            overall = report.overall.as_str(),
            "qa run finished"
        );
        report
    }

    async fn check_one_link(&self, url: &str) -> [Finding; 2] {
        let reachability = check_link(self.probe.as_ref(), url).await;
        let utm = self.utm_rules.check(url);

        [
            Finding::for_link(CheckName::BrokenLink, url, reachability),
            Finding::for_link(CheckName::Utm, url, utm),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::fake::FakeProbe;
    use crate::checker::ProbeResult;
    use crate::report::Status;
    use serde_json::json;
    use std::time::Duration;

    const GOOD: &str = "https://example.com/?utm_source=email&utm_medium=braze-mktg";

    fn engine(probe: FakeProbe) -> QaEngine {
        QaEngine::new(Arc::new(probe), UtmRules::default(), 4)
    }

    fn summary(report: &QaReport) -> Vec<(CheckName, Status)> {
        report
            .findings
            .iter()
            .map(|f| (f.check_name, f.status))
            .collect()
    }

    #[tokio::test]
    async fn test_no_anchors_gives_single_finding() {
        let qa = engine(FakeProbe::answering(200));

        let report = qa.run("<p>Hello {{ first_name }}</p>").await;
        assert_eq!(summary(&report), vec![(CheckName::LiquidSyntax, Status::Pass)]);
        assert_eq!(report.overall, Status::Pass);

        let report = qa.run("<p>Hello {{ first_name </p>").await;
        assert_eq!(summary(&report), vec![(CheckName::LiquidSyntax, Status::Fail)]);
        assert_eq!(report.overall, Status::Fail);
    }

    #[tokio::test]
    async fn test_all_good_link() {
        let qa = engine(FakeProbe::answering(200));
        let report = qa.run(&format!("<a href='{GOOD}'>x</a>")).await;

        assert_eq!(report.overall, Status::Pass);
        assert_eq!(
            serde_json::to_value(&report.findings).unwrap(),
            json!([
                {"check_name": "liquid_syntax", "status": "PASS", "details": {"unbalanced": false}},
                {"check_name": "broken_link", "status": "PASS", "details": {"url": GOOD, "status": 200}},
                {"check_name": "utm", "status": "PASS", "details": {"url": GOOD}}
            ])
        );
    }

    #[tokio::test]
    async fn test_unreachable_link_fails_report() {
        let dead = "https://dead.example.com/?utm_source=email&utm_medium=braze-mktg";
        let qa = engine(
            FakeProbe::answering(200).with(dead, ProbeResult::Failed("connection failed".into())),
        );

        let report = qa
            .run(&format!("<a href='{GOOD}'>ok</a><a href='{dead}'>dead</a>"))
            .await;

        assert_eq!(report.overall, Status::Fail);
        let dead_finding = &report.findings[3];
        assert_eq!(dead_finding.check_name, CheckName::BrokenLink);
        assert_eq!(dead_finding.status, Status::Fail);
        assert_eq!(dead_finding.details["url"], json!(dead));
        assert_eq!(dead_finding.details["error"], json!("connection failed"));
    }

    #[tokio::test]
    async fn test_missing_utm_only_warns() {
        let qa = engine(FakeProbe::answering(200));
        let report = qa
            .run("<a href='https://x.com/p?utm_source=email'>x</a>")
            .await;

        assert_eq!(report.overall, Status::Warn);
        assert_eq!(
            report.findings[2].details["missing_or_mismatch"],
            json!(["utm_medium"])
        );
    }

    #[tokio::test]
    async fn test_every_link_gets_both_findings() {
        let probe = FakeProbe::answering(404);
        let qa = QaEngine::new(Arc::new(probe), UtmRules::default(), 2);
        let html = r#"
            <a href="https://a.com">a</a>
            <a href="https://b.com">b</a>
            <a href="https://a.com">a again</a>
            <a>no href</a>
        "#;

        let report = qa.run(html).await;
        assert_eq!(report.findings.len(), 1 + 2 * 3);
        assert_eq!(report.count(CheckName::BrokenLink), 3);
        assert_eq!(report.count(CheckName::Utm), 3);
        assert_eq!(report.overall, Status::Fail);
    }

    #[tokio::test]
    async fn test_order_kept_when_links_finish_out_of_order() {
        let probe = FakeProbe::answering(200)
            .with_delay("https://slow.com", Duration::from_millis(150))
            .with("https://fast.com", ProbeResult::Response(500));
        let qa = engine(probe);

        let report = qa
            .run("<a href='https://slow.com'>1</a><a href='https://fast.com'>2</a>")
            .await;

        let urls: Vec<_> = report.findings[1..]
            .iter()
            .map(|f| (f.check_name, f.details["url"].clone()))
            .collect();
        assert_eq!(
            urls,
            vec![
                (CheckName::BrokenLink, json!("https://slow.com")),
                (CheckName::Utm, json!("https://slow.com")),
                (CheckName::BrokenLink, json!("https://fast.com")),
                (CheckName::Utm, json!("https://fast.com")),
            ]
        );
    }

    #[tokio::test]
    async fn test_runs_are_idempotent() {
        let probe = Arc::new(
            FakeProbe::answering(301).with("https://b.com", ProbeResult::Response(410)),
        );
        let qa = QaEngine::new(probe.clone(), UtmRules::default(), 3);
        let html = "{% if x %}<a href='https://a.com?utm_source=email'>a</a><a href='https://b.com'>b</a>";

        let first = qa.run(html).await;
        let second = qa.run(html).await;

        assert_eq!(first, second);
        assert_eq!(probe.call_count(), 4);
    }

    #[tokio::test]
    async fn test_run_can_be_spawned_on_the_runtime() {
        // Server handlers run on worker threads, so the run future must be Send
        let qa = Arc::new(engine(FakeProbe::answering(200)));
        let html = format!("<a href='{GOOD}'>x</a><a href='https://b.com'>b</a>");

        let report = tokio::spawn(async move { qa.run(&html).await })
            .await
            .expect("qa task");

        assert_eq!(report.findings.len(), 5);
        assert_eq!(report.overall, Status::Warn);
    }

    #[tokio::test]
    async fn test_entity_encoded_query_passes_utm() {
        let qa = engine(FakeProbe::answering(200));
        let report = qa
            .run(r#"<a href="https://x.com/?utm_source=email&amp;utm_medium=braze-mktg">x</a>"#)
            .await;

        assert_eq!(report.overall, Status::Pass);
        assert_eq!(
            report.findings[2].details["url"],
            json!("https://x.com/?utm_source=email&utm_medium=braze-mktg")
        );
        assert_eq!(report.findings[2].status, Status::Pass);
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_runs() {
        let qa = QaEngine::new(Arc::new(FakeProbe::answering(200)), UtmRules::default(), 0);
        let report = qa.run(&format!("<a href='{GOOD}'>x</a>")).await;
        assert_eq!(report.findings.len(), 3);
    }
}
