use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Common DKIM selectors probed when no custom list is configured.
///
/// These cover the default selectors published by major providers
/// (Google, Microsoft, Everlytic) plus generic names seen in the wild.
pub const DEFAULT_DKIM_SELECTORS: &[&str] = &[
    "default",
    "google",
    "gmail",
    "outlook",
    "mail",
    "smtp",
    "dkim",
    "selector1",
    "selector2",
    "k1",
    "k2",
    "mx",
    "mta",
    "server1",
    "server2",
    "20220613",
    "mandatory",
    "everlytickey1",
    "everlytickey2",
    "s1",
    "s2",
    "dk1",
    "dk2",
];

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub probe: ProbeConfig,
    pub dkim: DkimConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Overall deadline for each probe (DNS queries included)
    pub timeout_secs: u64,
    /// Port used for the MX transport check
    pub smtp_port: u16,
    /// TCP connect timeout for the SMTP probe
    pub smtp_connect_timeout_secs: u64,
    /// Submission ports swept after a successful port-25 connect
    pub submission_ports: Vec<u16>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DkimConfig {
    /// Candidate selectors to query under _domainkey
    pub selectors: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::AuditError::Config(e.to_string()))?;

        toml::from_str(&content).map_err(|e| crate::error::AuditError::Config(e.to_string()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            probe: ProbeConfig::default(),
            dkim: DkimConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            smtp_port: 25,
            smtp_connect_timeout_secs: 5,
            submission_ports: vec![587, 465],
        }
    }
}

impl Default for DkimConfig {
    fn default() -> Self {
        Self {
            selectors: DEFAULT_DKIM_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.probe.timeout_secs, 30);
        assert_eq!(config.probe.smtp_port, 25);
        assert_eq!(config.probe.submission_ports, vec![587, 465]);
        assert!(config.dkim.selectors.contains(&"default".to_string()));
        assert!(config.dkim.selectors.contains(&"selector1".to_string()));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[probe]
timeout_secs = 10
smtp_port = 2525
smtp_connect_timeout_secs = 3
submission_ports = [587]

[dkim]
selectors = ["default", "custom"]

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.probe.timeout_secs, 10);
        assert_eq!(config.probe.smtp_port, 2525);
        assert_eq!(config.dkim.selectors, vec!["default", "custom"]);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[probe]\ntimeout_secs = 5").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.probe.timeout_secs, 5);
        assert_eq!(config.probe.smtp_port, 25);
        assert!(!config.dkim.selectors.is_empty());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(Config::from_file("/nonexistent/mailaudit.toml").is_err());
    }
}
