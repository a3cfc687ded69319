//! Security posture evaluator
//!
//! The one piece of pure computation in the crate: a deterministic
//! function from probe fact sets to a normalized `SecurityReport`.
//! No I/O, no mutation, no async; given the same findings it always
//! produces the same report.
//!
//! Classification contract per check:
//!
//! | Check       | PASS                          | WARNING                                  | FAIL                              |
//! |-------------|-------------------------------|------------------------------------------|-----------------------------------|
//! | DMARC       | p=reject with rua/ruf         | p=quarantine, or p=reject without rua/ruf| no record, or p=none              |
//! | SPF         | `-all`                        | `~all`, `?all`, or no all mechanism      | no record, or `+all`              |
//! | DKIM        | key published (weak key warns)| record found, key validity indeterminate | no record, or empty (revoked) key |
//! | Mail server | reachable, STARTTLS and AUTH  | reachable, exactly one of the two        | unreachable, or neither           |
//!
//! A probe that did not complete is scored like a FAIL (critical
//! penalty, forces HIGH risk and overall FAIL) but is excluded from the
//! passed/total counters and reported with a distinct "could not be
//! completed" recommendation.

use crate::probes::types::{
    AllQualifier, DkimFacts, DmarcFacts, DmarcPolicy, MailServerFacts, ProbeFindings, SpfFacts,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Penalty subtracted from the base score per failed check
const CRITICAL_PENALTY: i32 = 20;
/// Penalty subtracted from the base score per warning check
const WARNING_PENALTY: i32 = 5;

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "PASS"),
            CheckStatus::Warning => write!(f, "WARNING"),
            CheckStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Aggregated risk level; the worst check dominates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

/// Normalized evaluation output, immutable once produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityReport {
    pub domain: String,
    /// Clamped to [0, 100]
    pub overall_score: u8,
    pub risk_level: RiskLevel,
    pub overall_status: CheckStatus,
    /// "passed/total" over the checks whose probes completed
    pub tests_passed: String,
    pub test_statuses: BTreeMap<String, CheckStatus>,
    /// One entry per non-PASS check, in check order
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Classification of one check: status plus the remediation text shown
/// when the check is not a clean PASS
#[derive(Debug, Clone, PartialEq)]
struct Classification {
    status: CheckStatus,
    recommendation: Option<String>,
}

impl Classification {
    fn pass() -> Self {
        Self {
            status: CheckStatus::Pass,
            recommendation: None,
        }
    }

    fn warning(recommendation: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Warning,
            recommendation: Some(recommendation.into()),
        }
    }

    fn fail(recommendation: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            recommendation: Some(recommendation.into()),
        }
    }
}

/// Evaluate probe findings into a security report
pub fn evaluate(domain: &str, findings: &ProbeFindings) -> SecurityReport {
    evaluate_at(domain, findings, Utc::now())
}

/// Evaluate with an explicit timestamp; `evaluate` is this with `now`
pub fn evaluate_at(
    domain: &str,
    findings: &ProbeFindings,
    generated_at: DateTime<Utc>,
) -> SecurityReport {
    // Check order fixed: DMARC, SPF, DKIM, Mail Server
    let checks: [(&str, &str, Option<Classification>); 4] = [
        (
            "dmarc",
            "DMARC",
            findings.dmarc.as_ref().map(classify_dmarc),
        ),
        ("spf", "SPF", findings.spf.as_ref().map(classify_spf)),
        ("dkim", "DKIM", findings.dkim.as_ref().map(classify_dkim)),
        (
            "mail_server",
            "Mail Server",
            findings.mail_server.as_ref().map(classify_mail_server),
        ),
    ];

    let mut total_tests = 0i32;
    let mut passed_tests = 0i32;
    let mut scoreable_tests = 0i32;
    let mut warning_count = 0i32;
    let mut fail_count = 0i32;
    let mut test_statuses = BTreeMap::new();
    let mut recommendations = Vec::new();

    for (key, label, classification) in &checks {
        match classification {
            Some(c) => {
                total_tests += 1;
                match c.status {
                    CheckStatus::Pass => {
                        passed_tests += 1;
                        scoreable_tests += 1;
                    }
                    CheckStatus::Warning => {
                        warning_count += 1;
                        scoreable_tests += 1;
                    }
                    CheckStatus::Fail => fail_count += 1,
                }
                test_statuses.insert(key.to_string(), c.status);
                if let Some(rec) = &c.recommendation {
                    recommendations.push(rec.clone());
                }
            }
            None => {
                // Incomplete probe: scored like a failure, reported distinctly
                fail_count += 1;
                test_statuses.insert(key.to_string(), CheckStatus::Fail);
                recommendations.push(format!(
                    "{} check could not be completed - probe failed or timed out",
                    label
                ));
            }
        }
    }

    let base_score = if total_tests > 0 {
        ((scoreable_tests as f64 / total_tests as f64) * 100.0).round() as i32
    } else {
        0
    };

    let overall_score = (base_score - CRITICAL_PENALTY * fail_count - WARNING_PENALTY * warning_count)
        .clamp(0, 100) as u8;

    let risk_level = if fail_count > 0 {
        RiskLevel::High
    } else if warning_count > 0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let overall_status = if total_tests > 0 && fail_count == 0 && passed_tests == total_tests {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };

    SecurityReport {
        domain: domain.to_string(),
        overall_score,
        risk_level,
        overall_status,
        tests_passed: format!("{}/{}", passed_tests, total_tests),
        test_statuses,
        recommendations,
        generated_at,
    }
}

fn classify_dmarc(facts: &DmarcFacts) -> Classification {
    if !facts.present {
        return Classification::fail(
            "No DMARC record found - implement DMARC to prevent email spoofing",
        );
    }

    match facts.policy.unwrap_or(DmarcPolicy::None) {
        DmarcPolicy::None => Classification::fail(
            "Strengthen DMARC policy to 'reject' (current: none)",
        ),
        DmarcPolicy::Quarantine => Classification::warning(
            "Strengthen DMARC policy to 'reject' (current: quarantine)",
        ),
        DmarcPolicy::Reject => {
            if facts.has_reporting_address {
                Classification::pass()
            } else {
                Classification::warning(
                    "Add a DMARC reporting address (rua) to monitor authentication failures",
                )
            }
        }
    }
}

fn classify_spf(facts: &SpfFacts) -> Classification {
    if !facts.present {
        return Classification::fail(
            "No SPF record found - implement SPF to specify authorized mail servers",
        );
    }

    match facts.all_qualifier {
        Some(AllQualifier::Fail) => Classification::pass(),
        Some(AllQualifier::Pass) => Classification::fail(
            "SPF record allows all senders (+all) - switch to the strict '-all' qualifier",
        ),
        Some(qualifier) => Classification::warning(format!(
            "Use strict SPF policy with '-all' qualifier (current: {})",
            qualifier
        )),
        None => Classification::warning(
            "Use strict SPF policy with '-all' qualifier (current: no 'all' mechanism)",
        ),
    }
}

fn classify_dkim(facts: &DkimFacts) -> Classification {
    if !facts.present {
        return Classification::fail(
            "DKIM not properly configured - implement DKIM signing for your domain",
        );
    }

    match facts.signature_valid {
        Some(true) => {
            let weak = facts
                .key_length_class
                .map(|class| class.is_weak())
                .unwrap_or(false);
            if weak {
                Classification::warning(
                    "Upgrade the DKIM key to 2048 bits or stronger (current key is 1024 bits or less)",
                )
            } else {
                Classification::pass()
            }
        }
        Some(false) => Classification::fail(
            "DKIM public key is empty or revoked - publish a valid signing key",
        ),
        None => Classification::warning(
            "DKIM record found but key validity could not be determined - verify the published key",
        ),
    }
}

fn classify_mail_server(facts: &MailServerFacts) -> Classification {
    if !facts.smtp_accessible {
        return Classification::fail(
            "Mail server is not accessible - verify MX records and firewall configuration",
        );
    }

    match (facts.supports_tls, facts.supports_auth) {
        (true, true) => Classification::pass(),
        (false, true) => Classification::warning(
            "Mail server does not support STARTTLS - enable TLS for secure email delivery",
        ),
        (true, false) => Classification::warning(
            "Mail server does not advertise AUTH - enable SMTP authentication",
        ),
        (false, false) => Classification::fail(
            "Mail server supports neither STARTTLS nor AUTH - enable transport security and authentication",
        ),
    }
}
