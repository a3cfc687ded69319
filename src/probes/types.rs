use serde::{Deserialize, Serialize};

/// DMARC policy actions (p= / sp= tags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DmarcPolicy {
    /// No action (monitoring mode)
    None,
    /// Mark as spam but deliver
    Quarantine,
    /// Reject the message
    Reject,
}

impl DmarcPolicy {
    /// Parse policy from a tag value
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "quarantine" => DmarcPolicy::Quarantine,
            "reject" => DmarcPolicy::Reject,
            // Unknown policies are treated as monitoring-only
            _ => DmarcPolicy::None,
        }
    }
}

impl std::fmt::Display for DmarcPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DmarcPolicy::None => write!(f, "none"),
            DmarcPolicy::Quarantine => write!(f, "quarantine"),
            DmarcPolicy::Reject => write!(f, "reject"),
        }
    }
}

/// Qualifier on the SPF `all` mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllQualifier {
    /// `-all`: fail unauthorized senders
    #[serde(rename = "-all")]
    Fail,
    /// `~all`: soft fail
    #[serde(rename = "~all")]
    SoftFail,
    /// `?all`: neutral
    #[serde(rename = "?all")]
    Neutral,
    /// `+all`: allow everyone (no protection)
    #[serde(rename = "+all")]
    Pass,
}

impl AllQualifier {
    /// Parse an `all` mechanism token from an SPF record
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "-all" => Some(AllQualifier::Fail),
            "~all" => Some(AllQualifier::SoftFail),
            "?all" => Some(AllQualifier::Neutral),
            // Bare `all` defaults to `+` per RFC 7208 §4.6.2
            "+all" | "all" => Some(AllQualifier::Pass),
            _ => None,
        }
    }
}

impl std::fmt::Display for AllQualifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllQualifier::Fail => write!(f, "-all"),
            AllQualifier::SoftFail => write!(f, "~all"),
            AllQualifier::Neutral => write!(f, "?all"),
            AllQualifier::Pass => write!(f, "+all"),
        }
    }
}

/// DKIM key algorithm (k= tag)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DkimKeyType {
    Rsa,
    Ed25519,
    Other(String),
}

impl DkimKeyType {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "rsa" => DkimKeyType::Rsa,
            "ed25519" => DkimKeyType::Ed25519,
            other => DkimKeyType::Other(other.to_string()),
        }
    }
}

/// Rough strength class of a published DKIM key, estimated from the
/// base64 length of the p= tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyLengthClass {
    #[serde(rename = "<1024")]
    Below1024,
    #[serde(rename = "1024")]
    Bits1024,
    #[serde(rename = "2048+")]
    Bits2048Plus,
    #[serde(rename = "unknown")]
    Unknown,
}

impl KeyLengthClass {
    /// Estimate the key class from the raw base64 public key
    pub fn estimate(public_key: &str) -> Self {
        if public_key.is_empty() {
            KeyLengthClass::Unknown
        } else if public_key.len() > 300 {
            KeyLengthClass::Bits2048Plus
        } else if public_key.len() > 200 {
            KeyLengthClass::Bits1024
        } else {
            KeyLengthClass::Below1024
        }
    }

    /// True when the key is 1024 bits or weaker
    pub fn is_weak(&self) -> bool {
        matches!(self, KeyLengthClass::Below1024 | KeyLengthClass::Bits1024)
    }
}

/// Observations from the DMARC record probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmarcFacts {
    /// A v=DMARC1 record was published at _dmarc.{domain}
    pub present: bool,
    /// Domain policy (p= tag); None when no record was found
    pub policy: Option<DmarcPolicy>,
    /// Subdomain policy (sp= tag)
    pub subdomain_policy: Option<DmarcPolicy>,
    /// An rua= or ruf= reporting address is configured
    pub has_reporting_address: bool,
    /// Aggregate report URI (rua= tag)
    pub aggregate_report_uri: Option<String>,
    /// Forensic report URI (ruf= tag)
    pub forensic_report_uri: Option<String>,
    /// Percentage of mail the policy applies to (pct= tag)
    pub percentage: Option<u8>,
    /// Raw record text
    pub record: Option<String>,
}

impl DmarcFacts {
    /// Facts for a domain with no DMARC record
    pub fn absent() -> Self {
        Self {
            present: false,
            policy: None,
            subdomain_policy: None,
            has_reporting_address: false,
            aggregate_report_uri: None,
            forensic_report_uri: None,
            percentage: None,
            record: None,
        }
    }
}

/// Observations from the SPF record probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpfFacts {
    /// A v=spf1 record was published on the domain
    pub present: bool,
    /// Qualifier on the `all` mechanism; None when the record has no
    /// `all` mechanism (or no record exists)
    pub all_qualifier: Option<AllQualifier>,
    /// Number of include: mechanisms
    pub include_count: usize,
    /// Number of v=spf1 TXT records found (>1 violates RFC 7208)
    pub record_count: usize,
    /// Number of ip4: mechanisms
    pub ip4_count: usize,
    /// Number of ip6: mechanisms
    pub ip6_count: usize,
    /// Record uses the mx mechanism
    pub uses_mx: bool,
    /// Raw record text (first record when multiple exist)
    pub record: Option<String>,
}

impl SpfFacts {
    /// Facts for a domain with no SPF record
    pub fn absent() -> Self {
        Self {
            present: false,
            all_qualifier: None,
            include_count: 0,
            record_count: 0,
            ip4_count: 0,
            ip6_count: 0,
            uses_mx: false,
            record: None,
        }
    }
}

/// Observations from the DKIM selector probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DkimFacts {
    /// A DKIM key record was found under at least one candidate selector
    pub present: bool,
    /// Whether a usable public key is published: Some(true) for a
    /// non-empty p= tag, Some(false) for an empty (revoked) key, None
    /// when the record carried no p= tag at all
    pub signature_valid: Option<bool>,
    /// Key algorithm (k= tag)
    pub key_type: Option<DkimKeyType>,
    /// Estimated key strength class
    pub key_length_class: Option<KeyLengthClass>,
    /// Selectors under which key records were found
    pub selectors_found: Vec<String>,
}

impl DkimFacts {
    /// Facts for a domain where no candidate selector matched
    pub fn absent() -> Self {
        Self {
            present: false,
            signature_valid: None,
            key_type: None,
            key_length_class: None,
            selectors_found: Vec::new(),
        }
    }
}

/// Observations from the mail-server transport probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailServerFacts {
    /// SMTP connection to the primary MX succeeded
    pub smtp_accessible: bool,
    /// EHLO response advertised STARTTLS
    pub supports_tls: bool,
    /// EHLO response advertised AUTH
    pub supports_auth: bool,
    /// Number of MX records published
    pub mx_record_count: usize,
    /// Lowest-preference MX hostname
    pub primary_mx: Option<String>,
    /// Server greeting banner
    pub banner: Option<String>,
    /// Time to establish the connection
    pub response_time_ms: Option<u64>,
    /// Submission ports that accepted a TCP connection
    pub extra_ports_open: Vec<u16>,
}

impl MailServerFacts {
    /// Facts for a domain whose mail server could not be reached
    pub fn unreachable(mx_record_count: usize, primary_mx: Option<String>) -> Self {
        Self {
            smtp_accessible: false,
            supports_tls: false,
            supports_auth: false,
            mx_record_count,
            primary_mx,
            banner: None,
            response_time_ms: None,
            extra_ports_open: Vec::new(),
        }
    }
}

/// Combined probe output for one domain
///
/// `None` for a field means the probe did not complete (timeout or
/// transport failure), which is distinct from a successful probe that
/// found nothing (`present: false`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeFindings {
    pub dmarc: Option<DmarcFacts>,
    pub spf: Option<SpfFacts>,
    pub dkim: Option<DkimFacts>,
    pub mail_server: Option<MailServerFacts>,
}
