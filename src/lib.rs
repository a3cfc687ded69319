//! mailaudit-rs: domain email security auditor
//!
//! Probes a domain's email-authentication posture (DMARC, SPF, DKIM
//! records) and mail-server transport security (SMTP banner, STARTTLS,
//! AUTH), then aggregates the findings into a scored report.
//!
//! # Architecture
//!
//! - [`probes`]: independent DNS/SMTP collaborators, each producing a
//!   fact set for one check. Probes observe, they do not judge.
//! - [`runner`]: runs the probes concurrently under per-probe deadlines
//!   and degrades failures to absent fact sets.
//! - [`evaluator`]: the core - a pure function from fact sets to a
//!   normalized [`evaluator::SecurityReport`] (per-check statuses,
//!   score, risk level, recommendations).
//! - [`report`]: text and JSON rendering of the report.
//!
//! # Example
//!
//! ```no_run
//! use mailaudit_rs::config::Config;
//! use mailaudit_rs::{evaluator, runner};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::default();
//!     let findings = runner::run_probes("example.com", &config).await;
//!     let report = evaluator::evaluate("example.com", &findings);
//!     println!("{} risk: {}", report.domain, report.risk_level);
//! }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod probes;
pub mod report;
pub mod runner;

// Re-export commonly used types
pub use config::Config;
pub use error::{AuditError, Result};
pub use evaluator::{CheckStatus, RiskLevel, SecurityReport};
pub use probes::types::ProbeFindings;
