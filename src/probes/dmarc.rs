//! DMARC record probe
//!
//! Queries the TXT record published at `_dmarc.{domain}` and parses it
//! into a fact set (RFC 7489 tag syntax: semicolon-separated key=value
//! pairs). A missing record is a normal finding, not an error; only
//! transport-level DNS failures are reported as errors so the runner
//! can mark the probe as incomplete.

use crate::error::{AuditError, Result};
use crate::probes::types::{DmarcFacts, DmarcPolicy};
use tracing::{debug, warn};
use trust_dns_resolver::config::*;
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::TokioAsyncResolver;

/// DMARC record probe
pub struct DmarcProbe {
    resolver: TokioAsyncResolver,
}

impl DmarcProbe {
    pub fn new() -> Self {
        let resolver =
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

        Self { resolver }
    }

    /// Look up and parse the DMARC record for a domain
    pub async fn probe(&self, domain: &str) -> Result<DmarcFacts> {
        let dmarc_domain = format!("_dmarc.{}", domain);
        debug!("Looking up DMARC record at {}", dmarc_domain);

        let lookup = match self.resolver.txt_lookup(dmarc_domain.clone()).await {
            Ok(lookup) => lookup,
            Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                debug!("No TXT records at {}", dmarc_domain);
                return Ok(DmarcFacts::absent());
            }
            Err(e) => {
                warn!("DMARC lookup failed for {}: {}", domain, e);
                return Err(AuditError::DnsLookup(format!(
                    "DMARC lookup for {}: {}",
                    dmarc_domain, e
                )));
            }
        };

        for record in lookup.iter() {
            let txt = record.to_string();
            if txt.starts_with("v=DMARC1") {
                debug!("Found DMARC record: {}", txt);
                return Ok(parse_dmarc_record(&txt));
            }
        }

        debug!("TXT records exist at {} but none is a DMARC record", dmarc_domain);
        Ok(DmarcFacts::absent())
    }
}

impl Default for DmarcProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a raw `v=DMARC1` record into facts
pub fn parse_dmarc_record(record: &str) -> DmarcFacts {
    let mut facts = DmarcFacts::absent();
    facts.present = true;
    // p= is required by the RFC; records without it behave as monitoring-only
    facts.policy = Some(DmarcPolicy::None);
    facts.record = Some(record.to_string());

    for pair in record.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }

        let parts: Vec<&str> = pair.splitn(2, '=').collect();
        if parts.len() != 2 {
            continue;
        }

        let key = parts[0].trim();
        let value = parts[1].trim();

        match key {
            "p" => facts.policy = Some(DmarcPolicy::parse(value)),
            "sp" => facts.subdomain_policy = Some(DmarcPolicy::parse(value)),
            "rua" => facts.aggregate_report_uri = Some(value.to_string()),
            "ruf" => facts.forensic_report_uri = Some(value.to_string()),
            "pct" => {
                if let Ok(pct) = value.parse::<u8>() {
                    facts.percentage = Some(pct.min(100));
                }
            }
            _ => {} // Ignore unknown tags
        }
    }

    facts.has_reporting_address =
        facts.aggregate_report_uri.is_some() || facts.forensic_report_uri.is_some();

    facts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let facts = parse_dmarc_record(
            "v=DMARC1; p=reject; sp=quarantine; rua=mailto:dmarc@example.com; pct=100",
        );

        assert!(facts.present);
        assert_eq!(facts.policy, Some(DmarcPolicy::Reject));
        assert_eq!(facts.subdomain_policy, Some(DmarcPolicy::Quarantine));
        assert!(facts.has_reporting_address);
        assert_eq!(
            facts.aggregate_report_uri,
            Some("mailto:dmarc@example.com".to_string())
        );
        assert_eq!(facts.percentage, Some(100));
    }

    #[test]
    fn test_parse_record_without_reporting() {
        let facts = parse_dmarc_record("v=DMARC1; p=reject");

        assert!(facts.present);
        assert_eq!(facts.policy, Some(DmarcPolicy::Reject));
        assert!(!facts.has_reporting_address);
    }

    #[test]
    fn test_parse_record_with_ruf_only() {
        let facts = parse_dmarc_record("v=DMARC1; p=quarantine; ruf=mailto:forensic@example.com");

        assert!(facts.has_reporting_address);
        assert_eq!(facts.aggregate_report_uri, None);
        assert_eq!(
            facts.forensic_report_uri,
            Some("mailto:forensic@example.com".to_string())
        );
    }

    #[test]
    fn test_parse_record_missing_policy_tag() {
        let facts = parse_dmarc_record("v=DMARC1; rua=mailto:a@example.com");

        assert!(facts.present);
        assert_eq!(facts.policy, Some(DmarcPolicy::None));
    }

    #[test]
    fn test_parse_pct_clamped() {
        let facts = parse_dmarc_record("v=DMARC1; p=none; pct=250");
        assert_eq!(facts.percentage, Some(100));
    }

    #[test]
    fn test_parse_ignores_malformed_pairs() {
        let facts = parse_dmarc_record("v=DMARC1; p=reject; garbage; ;; x");
        assert_eq!(facts.policy, Some(DmarcPolicy::Reject));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_probe_real_domain() {
        let probe = DmarcProbe::new();
        let facts = probe.probe("gmail.com").await.unwrap();
        assert!(facts.present);
    }
}
