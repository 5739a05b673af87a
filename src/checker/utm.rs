// src/checker/utm.rs
// =============================================================================
// This module verifies campaign tracking (UTM) parameters on a link.
//
// Every tracked link in a marketing email must carry a fixed set of query
// parameters with exact values, e.g.
//   utm_source=email & utm_medium=braze-mktg
//
// The rule set is loaded once at startup (see config.rs) and never changes
// while the service runs. A missing or wrong parameter is a WARN, never a
// FAIL: it hurts attribution but does not break the email.
//
// Query parsing uses the `form_urlencoded` parser re-exported by the `url`
// crate. It never fails: bad percent escapes are decoded lossily.
// =============================================================================

use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::HashMap;
use url::form_urlencoded;

use crate::report::{CheckOutcome, Details, Status};

/// The ordered set of required `name=value` query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtmRules {
    required: Vec<(String, String)>,
}

impl Default for UtmRules {
    fn default() -> Self {
        Self::new(vec![
            ("utm_source".to_string(), "email".to_string()),
            ("utm_medium".to_string(), "braze-mktg".to_string()),
        ])
    }
}

impl UtmRules {
    pub fn new(required: Vec<(String, String)>) -> Self {
        Self { required }
    }

    // Parses a comma separated rule list
    //
    // Example: "utm_source=email, utm_medium=braze-mktg"
    //
    // Entry order is kept: it is the order offending keys are reported in.
    pub fn parse(rules: &str) -> Result<Self> {
        let mut required = Vec::new();

        for entry in rules.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("Invalid UTM rule '{}': expected name=value", entry))?;
            let (key, value) = (key.trim(), value.trim());

            if key.is_empty() || value.is_empty() {
                return Err(anyhow!("Invalid UTM rule '{}': empty name or value", entry));
            }
            if required.iter().any(|(k, _)| k == key) {
                return Err(anyhow!("Duplicate UTM rule for '{}'", key));
            }

            required.push((key.to_string(), value.to_string()));
        }

        Ok(Self { required })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.required.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }

    // Returns the required keys that are missing or carry the wrong value
    //
    // Only the FIRST value of a repeated parameter is compared, so
    // "?utm_source=web&utm_source=email" is a mismatch.
    pub fn offending_keys(&self, url: &str) -> Vec<String> {
        let params = query_params(url);

        self.iter()
            .filter(|(key, expected)| {
                let first = params.get(*key).and_then(|values| values.first());
                first.map(String::as_str) != Some(*expected)
            })
            .map(|(key, _)| key.to_string())
            .collect()
    }

    // Runs the UTM check on one link
    //
    // Returns:
    //   PASS with {} when every rule matches
    //   WARN with {"missing_or_mismatch": [...]} otherwise
    pub fn check(&self, url: &str) -> CheckOutcome {
        let offending = self.offending_keys(url);

        if offending.is_empty() {
            CheckOutcome::new(Status::Pass, Details::new())
        } else {
            let keys = offending.into_iter().map(Value::String).collect::<Vec<_>>();
            CheckOutcome::with_detail(Status::Warn, "missing_or_mismatch", keys)
        }
    }
}

// Splits the query component out of a (possibly relative) URL
//
// We do not require an absolute URL here: "/p?utm_source=email" still has a
// query worth checking. The fragment is cut first, then everything after the
// first '?' is the query.
fn query_component(url: &str) -> &str {
    let without_fragment = url.split_once('#').map_or(url, |(before, _)| before);

    without_fragment
        .split_once('?')
        .map_or("", |(_, query)| query)
}

// Parses the query into name -> values, first-occurrence order per name
//
// Pairs with an empty value ("utm_source=" or a bare "utm_source") are
// dropped, so they count as missing.
fn query_params(url: &str) -> HashMap<String, Vec<String>> {
    let mut params: HashMap<String, Vec<String>> = HashMap::new();

    for (name, value) in form_urlencoded::parse(query_component(url).as_bytes()) {
        if value.is_empty() {
            continue;
        }
        params
            .entry(name.into_owned())
            .or_default()
            .push(value.into_owned());
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_parameters_present() {
        let rules = UtmRules::default();
        let outcome = rules.check("https://x.com/p?utm_source=email&utm_medium=braze-mktg");
        assert_eq!(outcome.status, Status::Pass);
        assert!(outcome.details.is_empty());
    }

    #[test]
    fn test_missing_parameter_is_warn() {
        let rules = UtmRules::default();
        let outcome = rules.check("https://x.com/p?utm_source=email");
        assert_eq!(outcome.status, Status::Warn);
        assert_eq!(
            outcome.details["missing_or_mismatch"],
            json!(["utm_medium"])
        );
    }

    #[test]
    fn test_offending_keys_follow_rule_order() {
        let rules = UtmRules::default();
        assert_eq!(
            rules.offending_keys("https://x.com/p?utm_medium=sms&utm_source=push"),
            vec!["utm_source", "utm_medium"]
        );
        assert_eq!(
            rules.offending_keys("https://x.com/p"),
            vec!["utm_source", "utm_medium"]
        );
    }

    #[test]
    fn test_only_first_value_counts() {
        let rules = UtmRules::default();
        assert_eq!(
            rules.offending_keys("https://x.com/?utm_source=web&utm_source=email&utm_medium=braze-mktg"),
            vec!["utm_source"]
        );
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let rules = UtmRules::default();
        assert_eq!(
            rules.offending_keys("https://x.com/?utm_source=&utm_source=email&utm_medium=braze-mktg"),
            Vec::<String>::new()
        );
        assert_eq!(
            rules.offending_keys("https://x.com/?utm_source&utm_medium=braze-mktg"),
            vec!["utm_source"]
        );
    }

    #[test]
    fn test_fragment_and_encoding() {
        let rules = UtmRules::new(vec![("utm_campaign".to_string(), "fall sale".to_string())]);
        assert!(rules
            .offending_keys("https://x.com/?utm_campaign=fall+sale#top")
            .is_empty());
        assert!(rules
            .offending_keys("https://x.com/?utm_campaign=fall%20sale")
            .is_empty());
        // The query-looking text after '#' is not part of the query
        assert_eq!(
            rules.offending_keys("https://x.com/#?utm_campaign=fall+sale"),
            vec!["utm_campaign"]
        );
    }

    #[test]
    fn test_relative_and_malformed_urls_do_not_fail() {
        let rules = UtmRules::default();
        assert!(rules
            .offending_keys("/p?utm_source=email&utm_medium=braze-mktg")
            .is_empty());
        let outcome = rules.check("not a url ?%zz=&&==%");
        assert_eq!(outcome.status, Status::Warn);
    }

    #[test]
    fn test_parse_rules() {
        let rules = UtmRules::parse(" utm_source=email , utm_medium=braze-mktg ").unwrap();
        assert_eq!(rules, UtmRules::default());

        assert!(UtmRules::parse("utm_source").is_err());
        assert!(UtmRules::parse("utm_source=").is_err());
        assert!(UtmRules::parse("a=1,a=2").is_err());
        assert!(UtmRules::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_empty_rule_set_always_passes() {
        let rules = UtmRules::new(Vec::new());
        assert_eq!(rules.check("https://x.com").status, Status::Pass);
    }
}
