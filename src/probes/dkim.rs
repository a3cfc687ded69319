//! DKIM selector probe
//!
//! DKIM keys are published at `{selector}._domainkey.{domain}`, but the
//! selector names are private to the sender, so the probe walks a
//! configured list of selectors in common use. Selectors that do not
//! resolve are expected; the probe only reports what it finds. A record
//! is recognized by its k= or p= tags (RFC 6376 §3.6.1).

use crate::error::Result;
use crate::probes::types::{DkimFacts, DkimKeyType, KeyLengthClass};
use tracing::{debug, warn};
use trust_dns_resolver::config::*;
use trust_dns_resolver::TokioAsyncResolver;

/// DKIM key-record probe
pub struct DkimProbe {
    resolver: TokioAsyncResolver,
    selectors: Vec<String>,
}

impl DkimProbe {
    /// Create a probe over the given candidate selector list
    pub fn new(selectors: Vec<String>) -> Self {
        let resolver =
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

        Self {
            resolver,
            selectors,
        }
    }

    /// Query every candidate selector and parse the first key record
    /// found; further matching selectors are recorded by name only
    pub async fn probe(&self, domain: &str) -> Result<DkimFacts> {
        let mut facts = DkimFacts::absent();

        for selector in &self.selectors {
            let dkim_domain = format!("{}._domainkey.{}", selector, domain);

            let lookup = match self.resolver.txt_lookup(dkim_domain.clone()).await {
                Ok(lookup) => lookup,
                Err(e) => {
                    // NXDOMAIN/NoAnswer is the normal case for unused selectors
                    debug!("No DKIM record at {}: {}", dkim_domain, e);
                    continue;
                }
            };

            for record in lookup.iter() {
                let txt = record.to_string();
                if !is_dkim_record(&txt) {
                    continue;
                }

                debug!("Found DKIM record at {}", dkim_domain);
                facts.selectors_found.push(selector.clone());

                // Key details come from the first record found
                if !facts.present {
                    facts.present = true;
                    apply_dkim_record(&mut facts, &txt);
                }
                break;
            }
        }

        if !facts.present {
            debug!("No DKIM records found for {} with candidate selectors", domain);
        } else if facts.signature_valid == Some(false) {
            warn!("DKIM key for {} is empty (revoked)", domain);
        }

        Ok(facts)
    }
}

/// A TXT record is treated as a DKIM key record when it carries k= or
/// p= tags
fn is_dkim_record(txt: &str) -> bool {
    txt.split(';')
        .map(str::trim)
        .any(|tag| tag.starts_with("k=") || tag.starts_with("p="))
}

/// Fold the tags of a key record into the fact set
fn apply_dkim_record(facts: &mut DkimFacts, record: &str) {
    for tag in record.split(';') {
        let tag = tag.trim();

        if let Some(value) = tag.strip_prefix("k=") {
            facts.key_type = Some(DkimKeyType::parse(value));
        } else if let Some(public_key) = tag.strip_prefix("p=") {
            if public_key.is_empty() {
                // An empty p= tag revokes the key (RFC 6376 §3.6.1)
                facts.signature_valid = Some(false);
                facts.key_length_class = Some(KeyLengthClass::Unknown);
            } else {
                facts.signature_valid = Some(true);
                facts.key_length_class = Some(KeyLengthClass::estimate(public_key));
            }
        }
    }
}
