//! Probe runner
//!
//! Executes the four probes for a domain concurrently, each under its
//! own deadline. The probes share no state, so failure handling is
//! per-probe: a timeout or transport error yields an absent fact set
//! and the evaluation proceeds on whatever completed. The runner never
//! returns an error.

use crate::config::Config;
use crate::error::Result;
use crate::probes::types::ProbeFindings;
use crate::probes::{DkimProbe, DmarcProbe, MailServerProbe, SpfProbe};
use std::time::Duration;
use tracing::{info, warn};

/// Run all probes for a domain and collect the findings
pub async fn run_probes(domain: &str, config: &Config) -> ProbeFindings {
    let deadline = Duration::from_secs(config.probe.timeout_secs);

    let dmarc_probe = DmarcProbe::new();
    let spf_probe = SpfProbe::new();
    let dkim_probe = DkimProbe::new(config.dkim.selectors.clone());
    let mail_server_probe = MailServerProbe::new(&config.probe);

    info!("Running security probes for {}", domain);

    let (dmarc, spf, dkim, mail_server) = tokio::join!(
        tokio::time::timeout(deadline, dmarc_probe.probe(domain)),
        tokio::time::timeout(deadline, spf_probe.probe(domain)),
        tokio::time::timeout(deadline, dkim_probe.probe(domain)),
        tokio::time::timeout(deadline, mail_server_probe.probe(domain)),
    );

    ProbeFindings {
        dmarc: settle("DMARC", domain, dmarc),
        spf: settle("SPF", domain, spf),
        dkim: settle("DKIM", domain, dkim),
        mail_server: settle("Mail server", domain, mail_server),
    }
}

/// Collapse a timed probe outcome into an optional fact set
fn settle<T>(
    probe_name: &str,
    domain: &str,
    outcome: std::result::Result<Result<T>, tokio::time::error::Elapsed>,
) -> Option<T> {
    match outcome {
        Ok(Ok(facts)) => Some(facts),
        Ok(Err(e)) => {
            warn!("{} probe failed for {}: {}", probe_name, domain, e);
            None
        }
        Err(_) => {
            warn!("{} probe timed out for {}", probe_name, domain);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuditError;

    async fn timed<T>(
        deadline: Duration,
        fut: impl std::future::Future<Output = Result<T>>,
    ) -> std::result::Result<Result<T>, tokio::time::error::Elapsed> {
        tokio::time::timeout(deadline, fut).await
    }

    #[tokio::test]
    async fn test_settle_success() {
        let outcome = timed(Duration::from_secs(1), async { Ok(42u32) }).await;
        assert_eq!(settle("test", "example.com", outcome), Some(42));
    }

    #[tokio::test]
    async fn test_settle_probe_error() {
        let outcome = timed(Duration::from_secs(1), async {
            Err::<u32, _>(AuditError::DnsLookup("boom".to_string()))
        })
        .await;
        assert_eq!(settle("test", "example.com", outcome), None);
    }

    #[tokio::test]
    async fn test_settle_timeout() {
        let outcome = timed(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(42u32)
        })
        .await;
        assert_eq!(settle("test", "example.com", outcome), None);
    }
}
