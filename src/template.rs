//! Hostname templates with a `%DIGITS%` placeholder.
//!
//! A template such as `ipv6-%DIGITS%.dyn.example.net` is compiled once per
//! configured network. The placeholder stands for the network's host bits
//! rendered as lowercase hex, so the compiled form knows exactly how many
//! digits a matching name must carry.

use hickory_proto::rr::Name;
use hickory_proto::error::ProtoError;

use crate::error::DnsError;

/// The placeholder token substituted with the host digits.
const DIGITS_TOKEN: &str = "%DIGITS%";

/// A hostname template compiled against a network's host-digit count.
///
/// The literal text before and after the token is normalized to lowercase at
/// compile time; DNS name comparison is case-insensitive throughout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTemplate {
    text: String,
    prefix: String,
    suffix: String,
    digit_count: usize,
}

impl HostTemplate {
    /// Compile a template for a network whose host portion spans
    /// `digit_count` hex digits.
    ///
    /// Fails if the template is empty or does not contain exactly one
    /// `%DIGITS%` token.
    pub fn compile(text: &str, digit_count: usize) -> Result<Self, DnsError> {
        if text.is_empty() {
            return Err(DnsError::Config("template must not be empty".to_string()));
        }
        let Some((prefix, suffix)) = text.split_once(DIGITS_TOKEN) else {
            return Err(DnsError::Config(format!(
                "template is missing the {DIGITS_TOKEN} token: {text}"
            )));
        };
        if suffix.contains(DIGITS_TOKEN) {
            return Err(DnsError::Config(format!(
                "template must contain exactly one {DIGITS_TOKEN}: {text}"
            )));
        }

        Ok(Self {
            text: text.to_string(),
            prefix: prefix.to_ascii_lowercase(),
            suffix: suffix.to_ascii_lowercase(),
            digit_count,
        })
    }

    /// Number of hex digits a matching name must carry.
    pub fn digit_count(&self) -> usize {
        self.digit_count
    }

    /// Instantiate the template with a digit run, producing a fully
    /// qualified name.
    pub fn synthesize(&self, digits: &str) -> Result<Name, ProtoError> {
        let mut name = format!("{}{}{}", self.prefix, digits, self.suffix);
        if !name.ends_with('.') {
            name.push('.');
        }
        Name::from_ascii(&name)
    }

    /// Match a query name against this template.
    ///
    /// Strips the prefix and suffix literals case-insensitively; the residue
    /// must be exactly `digit_count` hex characters. Uppercase hex in the
    /// residue is accepted and lowercased. Returns the lowercase digit run,
    /// or `None` if the name does not fit the template.
    pub fn matches(&self, qname: &Name) -> Option<String> {
        let mut name = qname.to_ascii().to_ascii_lowercase();
        if name.ends_with('.') {
            name.pop();
        }

        let expected_len = self.prefix.len() + self.digit_count + self.suffix.len();
        if name.len() != expected_len {
            return None;
        }
        if !name.starts_with(&self.prefix) || !name.ends_with(&self.suffix) {
            return None;
        }

        let digits = &name[self.prefix.len()..self.prefix.len() + self.digit_count];
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(digits.to_string())
    }
}

impl std::fmt::Display for HostTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(text: &str, digits: usize) -> HostTemplate {
        HostTemplate::compile(text, digits).unwrap()
    }

    #[test]
    fn test_compile_rejects_missing_token() {
        let err = HostTemplate::compile("host.example.com", 16).unwrap_err();
        assert!(matches!(err, DnsError::Config(_)));
    }

    #[test]
    fn test_compile_rejects_duplicate_token() {
        let err = HostTemplate::compile("%DIGITS%-%DIGITS%.example.com", 16).unwrap_err();
        assert!(matches!(err, DnsError::Config(_)));
    }

    #[test]
    fn test_compile_rejects_empty() {
        assert!(HostTemplate::compile("", 16).is_err());
    }

    #[test]
    fn test_synthesize() {
        let t = template("test-%DIGITS%.local", 16);
        let name = t.synthesize("123456789abcdef0").unwrap();
        assert_eq!(name.to_ascii(), "test-123456789abcdef0.local.");
        assert!(name.is_fqdn());
    }

    #[test]
    fn test_synthesize_lowercases_literals() {
        let t = template("Host-%DIGITS%.Example.COM", 4);
        let name = t.synthesize("dead").unwrap();
        assert_eq!(name.to_ascii(), "host-dead.example.com.");
    }

    #[test]
    fn test_match_roundtrip() {
        let t = template("test-%DIGITS%.local", 16);
        let name = Name::from_ascii("test-0123456789abcdef.local.").unwrap();
        assert_eq!(t.matches(&name), Some("0123456789abcdef".to_string()));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let t = template("test-%DIGITS%.local", 16);
        let name = Name::from_ascii("TEST-0123456789ABCDEF.LOCAL.").unwrap();
        // Uppercase residue matches but comes back lowercased.
        assert_eq!(t.matches(&name), Some("0123456789abcdef".to_string()));
    }

    #[test]
    fn test_match_rejects_wrong_digit_count() {
        let t = template("test-%DIGITS%.local", 16);
        let name = Name::from_ascii("test-dead.local.").unwrap();
        assert_eq!(t.matches(&name), None);
    }

    #[test]
    fn test_match_rejects_non_hex_residue() {
        let t = template("test-%DIGITS%.local", 16);
        let name = Name::from_ascii("test-ghijklmnopqrstuv.local.").unwrap();
        assert_eq!(t.matches(&name), None);
    }

    #[test]
    fn test_match_rejects_wrong_suffix() {
        let t = template("test-%DIGITS%.local", 16);
        let name = Name::from_ascii("test-0123456789abcdef.example.").unwrap();
        assert_eq!(t.matches(&name), None);
    }

    #[test]
    fn test_match_rejects_wrong_prefix() {
        let t = template("test-%DIGITS%.local", 16);
        let name = Name::from_ascii("prod-0123456789abcdef.local.").unwrap();
        assert_eq!(t.matches(&name), None);
    }

    #[test]
    fn test_empty_prefix_literal() {
        let t = template("%DIGITS%.example", 4);
        let name = Name::from_ascii("beef.example.").unwrap();
        assert_eq!(t.matches(&name), Some("beef".to_string()));
        assert_eq!(t.synthesize("beef").unwrap().to_ascii(), "beef.example.");
    }

    #[test]
    fn test_multi_label_literals() {
        let t = template("ipv6-%DIGITS%.nutzer.raumzeitlabor.de", 16);
        let name = Name::from_ascii("ipv6-0216eafffecb0826.nutzer.raumzeitlabor.de.").unwrap();
        assert_eq!(t.matches(&name), Some("0216eafffecb0826".to_string()));
    }

    #[test]
    fn test_display_preserves_original_text() {
        let t = template("Host-%DIGITS%.Example.com", 4);
        assert_eq!(t.to_string(), "Host-%DIGITS%.Example.com");
    }
}
