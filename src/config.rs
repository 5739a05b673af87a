// src/config.rs
// =============================================================================
// Process-wide configuration, read once at startup.
//
// Sources, lowest to highest priority:
// 1. Built-in defaults
// 2. EMAIL_QA_* environment variables
// 3. Command-line flags (applied by main.rs via QaConfig::override_with)
//
// Nothing here changes after startup; the QA engine and the server get an
// immutable copy.
// =============================================================================

use anyhow::{anyhow, Context, Result};
use std::time::Duration;

use crate::checker::{UtmRules, DEFAULT_TIMEOUT};
use crate::server::DEFAULT_MAX_BODY_BYTES;

pub const ENV_BIND: &str = "EMAIL_QA_BIND";
pub const ENV_LINK_TIMEOUT_SECS: &str = "EMAIL_QA_LINK_TIMEOUT_SECS";
pub const ENV_MAX_CONCURRENT_CHECKS: &str = "EMAIL_QA_MAX_CONCURRENT_CHECKS";
pub const ENV_UTM_REQUIRED: &str = "EMAIL_QA_UTM_REQUIRED";
pub const ENV_LOG_JSON: &str = "EMAIL_QA_LOG_JSON";
pub const ENV_MAX_BODY_BYTES: &str = "EMAIL_QA_MAX_BODY_BYTES";

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONCURRENT_CHECKS: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct QaConfig {
    /// Address the HTTP server listens on
    pub bind_addr: String,
    /// Timeout for a single HEAD request, redirects included
    pub link_timeout: Duration,
    /// How many links of one message are checked at the same time
    pub max_concurrent_checks: usize,
    /// Required UTM parameters, in reporting order
    pub utm_rules: UtmRules,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
    /// Largest accepted POST body
    pub max_body_bytes: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            link_timeout: DEFAULT_TIMEOUT,
            max_concurrent_checks: DEFAULT_MAX_CONCURRENT_CHECKS,
            utm_rules: UtmRules::default(),
            log_json: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl QaConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    // Builds the config from any name -> value lookup
    //
    // from_env() passes std::env::var; tests pass a HashMap so they never
    // touch the real process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let link_timeout = match get(ENV_LINK_TIMEOUT_SECS) {
            Some(raw) => Duration::from_secs(parse_positive(ENV_LINK_TIMEOUT_SECS, &raw)?),
            None => defaults.link_timeout,
        };

        let max_concurrent_checks = match get(ENV_MAX_CONCURRENT_CHECKS) {
            Some(raw) => parse_positive(ENV_MAX_CONCURRENT_CHECKS, &raw)? as usize,
            None => defaults.max_concurrent_checks,
        };

        let utm_rules = match get(ENV_UTM_REQUIRED) {
            Some(raw) => UtmRules::parse(&raw)
                .with_context(|| format!("Invalid {}", ENV_UTM_REQUIRED))?,
            None => defaults.utm_rules,
        };

        let log_json = match get(ENV_LOG_JSON) {
            Some(raw) => parse_bool(ENV_LOG_JSON, &raw)?,
            None => defaults.log_json,
        };

        let max_body_bytes = match get(ENV_MAX_BODY_BYTES) {
            Some(raw) => parse_positive(ENV_MAX_BODY_BYTES, &raw)? as usize,
            None => defaults.max_body_bytes,
        };

        Ok(Self {
            bind_addr: get(ENV_BIND).unwrap_or(defaults.bind_addr),
            link_timeout,
            max_concurrent_checks,
            utm_rules,
            log_json,
            max_body_bytes,
        })
    }

    // Applies command-line overrides on top of the environment
    pub fn override_with(
        mut self,
        bind: Option<String>,
        timeout_secs: Option<u64>,
        concurrency: Option<usize>,
    ) -> Result<Self> {
        if let Some(bind) = bind {
            self.bind_addr = bind;
        }
        if let Some(secs) = timeout_secs {
            if secs == 0 {
                return Err(anyhow!("--timeout-secs must be greater than 0"));
            }
            self.link_timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = concurrency {
            if limit == 0 {
                return Err(anyhow!("--concurrency must be greater than 0"));
            }
            self.max_concurrent_checks = limit;
        }
        Ok(self)
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(anyhow!("{} must be greater than 0", name)),
        Ok(value) => Ok(value),
        Err(e) => Err(anyhow!("Invalid {} '{}': {}", name, raw, e)),
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Ok(false),
        other => Err(anyhow!("Invalid {} '{}': expected true or false", name, other)),
    }
}
