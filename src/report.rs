//! Report rendering
//!
//! Turns a `SecurityReport` (plus the underlying facts, for detail
//! lines) into the human-readable summary, or serializes it to JSON.

use crate::error::Result;
use crate::evaluator::{CheckStatus, SecurityReport};
use crate::probes::types::ProbeFindings;
use std::fmt::Write;

/// Serialize the report as pretty-printed JSON
pub fn render_json(report: &SecurityReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Render the human-readable summary
pub fn render_text(report: &SecurityReport, findings: &ProbeFindings) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Security audit for {}", report.domain);
    let _ = writeln!(out, "{}", "=".repeat(50));

    let _ = writeln!(
        out,
        "DMARC:       {} {}",
        status_icon(report.test_statuses.get("dmarc")),
        dmarc_detail(findings)
    );
    let _ = writeln!(
        out,
        "SPF:         {} {}",
        status_icon(report.test_statuses.get("spf")),
        spf_detail(findings)
    );
    let _ = writeln!(
        out,
        "DKIM:        {} {}",
        status_icon(report.test_statuses.get("dkim")),
        dkim_detail(findings)
    );
    let _ = writeln!(
        out,
        "Mail Server: {} {}",
        status_icon(report.test_statuses.get("mail_server")),
        mail_server_detail(findings)
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Security Score:");
    let _ = writeln!(out, "  Overall Score: {}/100", report.overall_score);
    let _ = writeln!(out, "  Risk Level: {}", report.risk_level);
    let _ = writeln!(out, "  Status: {}", report.overall_status);
    let _ = writeln!(out, "  Tests Passed: {}", report.tests_passed);

    if !report.recommendations.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Recommendations:");
        for rec in &report.recommendations {
            let _ = writeln!(out, "  - {}", rec);
        }
    }

    out
}

fn status_icon(status: Option<&CheckStatus>) -> String {
    match status {
        Some(s) => s.to_string(),
        None => "N/A".to_string(),
    }
}

fn dmarc_detail(findings: &ProbeFindings) -> String {
    match &findings.dmarc {
        Some(facts) if facts.present => {
            let policy = facts
                .policy
                .map(|p| p.to_string())
                .unwrap_or_else(|| "none".to_string());
            if facts.has_reporting_address {
                format!("(policy: {}, reporting configured)", policy)
            } else {
                format!("(policy: {}, no reporting address)", policy)
            }
        }
        Some(_) => "(no record)".to_string(),
        None => "(probe did not complete)".to_string(),
    }
}

fn spf_detail(findings: &ProbeFindings) -> String {
    match &findings.spf {
        Some(facts) if facts.present => {
            let qualifier = facts
                .all_qualifier
                .map(|q| q.to_string())
                .unwrap_or_else(|| "no 'all' mechanism".to_string());
            if facts.record_count > 1 {
                format!(
                    "(qualifier: {}, {} records published - RFC violation)",
                    qualifier, facts.record_count
                )
            } else {
                format!("(qualifier: {}, {} includes)", qualifier, facts.include_count)
            }
        }
        Some(_) => "(no record)".to_string(),
        None => "(probe did not complete)".to_string(),
    }
}

fn dkim_detail(findings: &ProbeFindings) -> String {
    match &findings.dkim {
        Some(facts) if facts.present => {
            format!("(selectors: {})", facts.selectors_found.join(", "))
        }
        Some(_) => "(no record under common selectors)".to_string(),
        None => "(probe did not complete)".to_string(),
    }
}

fn mail_server_detail(findings: &ProbeFindings) -> String {
    match &findings.mail_server {
        Some(facts) if facts.smtp_accessible => {
            format!(
                "(mx: {}, STARTTLS: {}, AUTH: {})",
                facts.primary_mx.as_deref().unwrap_or("?"),
                if facts.supports_tls { "yes" } else { "no" },
                if facts.supports_auth { "yes" } else { "no" },
            )
        }
        Some(facts) if facts.mx_record_count == 0 => "(no MX records)".to_string(),
        Some(_) => "(not accessible)".to_string(),
        None => "(probe did not complete)".to_string(),
    }
}
