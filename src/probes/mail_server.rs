//! Mail-server transport probe
//!
//! Resolves the domain's MX records, connects to the primary MX over
//! SMTP, and records the transport capabilities the server advertises:
//! the greeting banner and whether EHLO lists STARTTLS and AUTH. The
//! probe never authenticates or sends mail; it issues EHLO and QUIT
//! only. After a successful port-25 connect it also sweeps the
//! submission ports to note which are open.

use crate::config::ProbeConfig;
use crate::error::{AuditError, Result};
use crate::probes::types::MailServerFacts;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};
use trust_dns_resolver::config::*;
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::TokioAsyncResolver;

/// SMTP transport probe
pub struct MailServerProbe {
    resolver: TokioAsyncResolver,
    smtp_port: u16,
    connect_timeout: Duration,
    submission_ports: Vec<u16>,
}

impl MailServerProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        let resolver =
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

        Self {
            resolver,
            smtp_port: config.smtp_port,
            connect_timeout: Duration::from_secs(config.smtp_connect_timeout_secs),
            submission_ports: config.submission_ports.clone(),
        }
    }

    /// Probe the domain's primary mail server
    pub async fn probe(&self, domain: &str) -> Result<MailServerFacts> {
        let mx_records = self.lookup_mx(domain).await?;

        let Some(primary_mx) = mx_records.first().cloned() else {
            info!("No MX records for {}", domain);
            return Ok(MailServerFacts::unreachable(0, None));
        };

        debug!(
            "{}: {} MX record(s), primary {}",
            domain,
            mx_records.len(),
            primary_mx
        );

        let mut facts = match self.check_smtp(&primary_mx).await {
            Ok(facts) => facts,
            Err(e) => {
                warn!("SMTP probe of {} failed: {}", primary_mx, e);
                MailServerFacts::unreachable(mx_records.len(), Some(primary_mx.clone()))
            }
        };
        facts.mx_record_count = mx_records.len();
        facts.primary_mx = Some(primary_mx.clone());

        if facts.smtp_accessible {
            facts.extra_ports_open = self.sweep_submission_ports(&primary_mx).await;
        }

        Ok(facts)
    }

    /// Resolve MX hostnames sorted by preference (lowest first)
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<String>> {
        let lookup = match self.resolver.mx_lookup(domain.to_string()).await {
            Ok(lookup) => lookup,
            Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(AuditError::DnsLookup(format!(
                    "MX lookup for {}: {}",
                    domain, e
                )));
            }
        };

        let mut mx_records: Vec<(u16, String)> = lookup
            .iter()
            .map(|mx| {
                let preference = mx.preference();
                let exchange = mx.exchange().to_string().trim_end_matches('.').to_string();
                (preference, exchange)
            })
            .collect();

        mx_records.sort_by_key(|(preference, _)| *preference);

        Ok(mx_records.into_iter().map(|(_, host)| host).collect())
    }

    /// Connect to the server, read the banner, and parse EHLO capabilities
    async fn check_smtp(&self, host: &str) -> Result<MailServerFacts> {
        let addr = format!("{}:{}", host, self.smtp_port);
        info!("Connecting to mail server {}", addr);

        let start = Instant::now();
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| AuditError::SmtpProtocol(format!("Connect to {} timed out", addr)))??;
        let response_time_ms = start.elapsed().as_millis() as u64;

        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        // Read greeting
        let banner = self.read_line(&mut reader).await?;
        if !banner.starts_with("220") {
            return Err(AuditError::SmtpProtocol(format!(
                "Unexpected greeting: {}",
                banner.trim()
            )));
        }
        debug!("Banner: {}", banner.trim());

        let mut facts = MailServerFacts {
            smtp_accessible: true,
            supports_tls: false,
            supports_auth: false,
            mx_record_count: 0,
            primary_mx: None,
            banner: Some(banner.trim().to_string()),
            response_time_ms: Some(response_time_ms),
            extra_ports_open: Vec::new(),
        };

        // EHLO and capability parse
        self.write_line(&mut writer, &format!("EHLO {}", self.get_hostname()))
            .await?;
        match self.read_response(&mut reader).await {
            Ok(response) => {
                for line in response.lines() {
                    // Capability keyword follows the "250-"/"250 " prefix
                    let capability = line.get(4..).unwrap_or("").to_uppercase();
                    if capability.starts_with("STARTTLS") {
                        facts.supports_tls = true;
                    } else if capability.starts_with("AUTH") {
                        facts.supports_auth = true;
                    }
                }
            }
            Err(e) => {
                warn!("EHLO failed against {}: {}", host, e);
            }
        }

        // Polite disconnect; the answer does not matter
        let _ = self.write_line(&mut writer, "QUIT").await;
        let _ = self.read_line(&mut reader).await;

        Ok(facts)
    }

    /// TCP-probe the submission ports, returning the ones that accept
    async fn sweep_submission_ports(&self, host: &str) -> Vec<u16> {
        let mut open = Vec::new();

        for &port in &self.submission_ports {
            let addr = format!("{}:{}", host, port);
            match tokio::time::timeout(self.connect_timeout, TcpStream::connect(&addr)).await {
                Ok(Ok(_)) => {
                    debug!("Port {} open on {}", port, host);
                    open.push(port);
                }
                _ => debug!("Port {} closed or filtered on {}", port, host),
            }
        }

        open
    }

    /// Read a single line from the stream
    async fn read_line<R>(&self, reader: &mut BufReader<R>) -> Result<String>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut line = String::new();
        let n = tokio::time::timeout(self.connect_timeout, reader.read_line(&mut line))
            .await
            .map_err(|_| AuditError::SmtpProtocol("Read timed out".to_string()))??;

        if n == 0 {
            return Err(AuditError::SmtpProtocol(
                "Connection closed by server".to_string(),
            ));
        }

        Ok(line)
    }

    /// Read a full (possibly multi-line) SMTP response
    async fn read_response<R>(&self, reader: &mut BufReader<R>) -> Result<String>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut full_response = String::new();

        loop {
            let line = self.read_line(reader).await?;
            debug!("< {}", line.trim());

            full_response.push_str(&line);

            // Last line has a space after the code instead of a dash
            if line.len() >= 4 && &line[3..4] == " " {
                break;
            }
        }

        if !full_response.starts_with("250") {
            return Err(AuditError::SmtpProtocol(format!(
                "Expected 250, got: {}",
                full_response.trim()
            )));
        }

        Ok(full_response)
    }

    /// Write a CRLF-terminated line to the stream
    async fn write_line<W>(&self, writer: &mut W, line: &str) -> Result<()>
    where
        W: tokio::io::AsyncWrite + Unpin,
    {
        debug!("> {}", line);
        writer.write_all(format!("{}\r\n", line).as_bytes()).await?;
        Ok(())
    }

    /// Local hostname used in EHLO
    fn get_hostname(&self) -> String {
        gethostname::gethostname().to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn test_probe(port: u16) -> MailServerProbe {
        let config = ProbeConfig {
            timeout_secs: 5,
            smtp_port: port,
            smtp_connect_timeout_secs: 2,
            submission_ports: vec![],
        };
        MailServerProbe::new(&config)
    }

    /// Minimal SMTP server answering one session with the given EHLO lines
    async fn fake_smtp_server(listener: TcpListener, ehlo_lines: &'static str) {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(b"220 mx.test.invalid ESMTP ready\r\n").await.unwrap();

        let mut buf = [0u8; 512];
        let _ = stream.read(&mut buf).await.unwrap(); // EHLO
        stream.write_all(ehlo_lines.as_bytes()).await.unwrap();

        let _ = stream.read(&mut buf).await.unwrap(); // QUIT
        let _ = stream.write_all(b"221 bye\r\n").await;
    }

    #[tokio::test]
    async fn test_check_smtp_full_capabilities() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(fake_smtp_server(
            listener,
            "250-mx.test.invalid\r\n250-STARTTLS\r\n250-AUTH PLAIN LOGIN\r\n250 SIZE 10485760\r\n",
        ));

        let probe = test_probe(addr.port());
        let facts = probe.check_smtp("127.0.0.1").await.unwrap();

        assert!(facts.smtp_accessible);
        assert!(facts.supports_tls);
        assert!(facts.supports_auth);
        assert!(facts.banner.unwrap().starts_with("220"));
        assert!(facts.response_time_ms.is_some());
    }

    #[tokio::test]
    async fn test_check_smtp_no_capabilities() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(fake_smtp_server(
            listener,
            "250-mx.test.invalid\r\n250 SIZE 10485760\r\n",
        ));

        let probe = test_probe(addr.port());
        let facts = probe.check_smtp("127.0.0.1").await.unwrap();

        assert!(facts.smtp_accessible);
        assert!(!facts.supports_tls);
        assert!(!facts.supports_auth);
    }

    #[tokio::test]
    async fn test_check_smtp_tls_only() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(fake_smtp_server(
            listener,
            "250-mx.test.invalid\r\n250 STARTTLS\r\n",
        ));

        let probe = test_probe(addr.port());
        let facts = probe.check_smtp("127.0.0.1").await.unwrap();

        assert!(facts.supports_tls);
        assert!(!facts.supports_auth);
    }

    #[tokio::test]
    async fn test_check_smtp_bad_greeting() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(b"554 go away\r\n").await.unwrap();
        });

        let probe = test_probe(addr.port());
        assert!(probe.check_smtp("127.0.0.1").await.is_err());
    }

    #[tokio::test]
    async fn test_check_smtp_connection_refused() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = test_probe(addr.port());
        assert!(probe.check_smtp("127.0.0.1").await.is_err());
    }
}
