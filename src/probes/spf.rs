//! SPF record probe
//!
//! Queries the domain's TXT records, collects every `v=spf1` record
//! (more than one violates RFC 7208), and parses the first into a fact
//! set: include/ip4/ip6/mx mechanisms and the qualifier on the `all`
//! mechanism.

use crate::error::{AuditError, Result};
use crate::probes::types::{AllQualifier, SpfFacts};
use tracing::{debug, warn};
use trust_dns_resolver::config::*;
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::TokioAsyncResolver;

/// SPF record probe
pub struct SpfProbe {
    resolver: TokioAsyncResolver,
}

impl SpfProbe {
    pub fn new() -> Self {
        let resolver =
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

        Self { resolver }
    }

    /// Look up and parse the SPF record(s) for a domain
    pub async fn probe(&self, domain: &str) -> Result<SpfFacts> {
        debug!("Looking up SPF records for {}", domain);

        let lookup = match self.resolver.txt_lookup(domain.to_string()).await {
            Ok(lookup) => lookup,
            Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                debug!("No TXT records for {}", domain);
                return Ok(SpfFacts::absent());
            }
            Err(e) => {
                warn!("SPF lookup failed for {}: {}", domain, e);
                return Err(AuditError::DnsLookup(format!(
                    "SPF lookup for {}: {}",
                    domain, e
                )));
            }
        };

        let spf_records: Vec<String> = lookup
            .iter()
            .map(|r| r.to_string())
            .filter(|txt| txt.starts_with("v=spf1"))
            .collect();

        if spf_records.is_empty() {
            debug!("No SPF record among TXT records for {}", domain);
            return Ok(SpfFacts::absent());
        }

        if spf_records.len() > 1 {
            warn!(
                "{} publishes {} SPF records (RFC 7208 violation); parsing the first",
                domain,
                spf_records.len()
            );
        }

        let mut facts = parse_spf_record(&spf_records[0]);
        facts.record_count = spf_records.len();
        Ok(facts)
    }
}

impl Default for SpfProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a raw `v=spf1` record into facts
///
/// `record_count` is left at 1; the probe overwrites it when multiple
/// records were published.
pub fn parse_spf_record(record: &str) -> SpfFacts {
    let mut facts = SpfFacts::absent();
    facts.present = true;
    facts.record_count = 1;
    facts.record = Some(record.to_string());

    // Skip the v=spf1 version token
    for token in record.split_whitespace().skip(1) {
        if let Some(qualifier) = AllQualifier::parse(token) {
            facts.all_qualifier = Some(qualifier);
        } else if token.starts_with("include:") {
            facts.include_count += 1;
        } else if token.starts_with("ip4:") {
            facts.ip4_count += 1;
        } else if token.starts_with("ip6:") {
            facts.ip6_count += 1;
        } else if token == "mx" || token.starts_with("mx:") {
            facts.uses_mx = true;
        }
        // a, exists, redirect and modifiers do not affect the posture facts
    }

    facts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strict_record() {
        let facts = parse_spf_record("v=spf1 mx include:_spf.example.net ip4:192.0.2.0/24 -all");

        assert!(facts.present);
        assert_eq!(facts.all_qualifier, Some(AllQualifier::Fail));
        assert_eq!(facts.include_count, 1);
        assert_eq!(facts.ip4_count, 1);
        assert!(facts.uses_mx);
        assert_eq!(facts.record_count, 1);
    }

    #[test]
    fn test_parse_softfail_record() {
        let facts = parse_spf_record("v=spf1 include:a.com include:b.com ~all");

        assert_eq!(facts.all_qualifier, Some(AllQualifier::SoftFail));
        assert_eq!(facts.include_count, 2);
    }

    #[test]
    fn test_parse_permissive_record() {
        let facts = parse_spf_record("v=spf1 +all");
        assert_eq!(facts.all_qualifier, Some(AllQualifier::Pass));
    }

    #[test]
    fn test_parse_record_without_all() {
        let facts = parse_spf_record("v=spf1 ip4:198.51.100.1 ip6:2001:db8::1");

        assert!(facts.present);
        assert_eq!(facts.all_qualifier, None);
        assert_eq!(facts.ip4_count, 1);
        assert_eq!(facts.ip6_count, 1);
    }

    #[test]
    fn test_parse_bare_all_defaults_to_pass() {
        let facts = parse_spf_record("v=spf1 mx all");
        assert_eq!(facts.all_qualifier, Some(AllQualifier::Pass));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_probe_real_domain() {
        let probe = SpfProbe::new();
        let facts = probe.probe("gmail.com").await.unwrap();
        assert!(facts.present);
    }
}
