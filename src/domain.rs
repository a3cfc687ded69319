use crate::error::{AuditError, Result};
use regex::Regex;

/// Shape check for domain names: label characters, at least one dot,
/// alphabetic TLD of two or more characters
const DOMAIN_PATTERN: &str = r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*\.[a-zA-Z]{2,}$";

/// Normalize and validate a domain argument
pub fn validate_domain(input: &str) -> Result<String> {
    let domain = input.trim().trim_end_matches('.').to_lowercase();

    if domain.is_empty() {
        return Err(AuditError::InvalidDomain("Domain is empty".to_string()));
    }

    let pattern = Regex::new(DOMAIN_PATTERN).expect("domain pattern is valid");
    if !pattern.is_match(&domain) {
        return Err(AuditError::InvalidDomain(format!(
            "'{}' is not a valid domain name",
            domain
        )));
    }

    Ok(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_domains() {
        assert_eq!(validate_domain("example.com").unwrap(), "example.com");
        assert_eq!(validate_domain("sub.example.co.uk").unwrap(), "sub.example.co.uk");
        assert_eq!(validate_domain("Example.COM").unwrap(), "example.com");
        assert_eq!(validate_domain(" example.com \n").unwrap(), "example.com");
        assert_eq!(validate_domain("example.com.").unwrap(), "example.com");
        assert_eq!(validate_domain("x1.de").unwrap(), "x1.de");
    }

    #[test]
    fn test_invalid_domains() {
        assert!(validate_domain("").is_err());
        assert!(validate_domain("nodot").is_err());
        assert!(validate_domain("-leading.com").is_err());
        assert!(validate_domain("trailing-.com").is_err());
        assert!(validate_domain("spaces in.com").is_err());
        assert!(validate_domain("example.c0m1").is_err());
        assert!(validate_domain("http://example.com").is_err());
    }
}
