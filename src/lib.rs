// src/lib.rs
// =============================================================================
// Library root: everything except command-line parsing lives here so the
// binary (main.rs) stays a thin shell.
//
// Modules:
// - checker: the individual checks (links, reachability, UTM, liquid)
// - qa: the engine that runs the checks and builds a report
// - report: request/response data model
// - server: the axum HTTP endpoint
// - config: startup configuration
// =============================================================================

pub mod checker;
pub mod config;
pub mod qa;
pub mod report;
pub mod server;

pub use config::QaConfig;
pub use qa::QaEngine;
pub use report::{CheckName, Finding, QaReport, QaRequest, Status};
