//! Utility functions for target parsing and domain encoding.
//!
//! Turning operator input into a [`Target`] is the only place where a bad
//! domain is a hard error: it happens before any generation or network
//! activity.

use crate::error::DittoError;
use crate::types::Target;

/// Parse a domain name or URL into a [`Target`].
///
/// Bare domains get an `https://` scheme so the URL parser accepts them. The
/// host is converted back to Unicode so internationalised labels are permuted
/// in their readable form.
///
/// # Errors
///
/// Returns `DittoError::InvalidDomain` when the input is not a URL with a
/// domain host or when no registrable label precedes the public suffix.
pub fn parse_target(input: &str) -> Result<Target, DittoError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DittoError::invalid_domain(input, "Domain cannot be empty"));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = url::Url::parse(&with_scheme)
        .map_err(|e| DittoError::invalid_domain(trimmed, e.to_string()))?;

    let host = match url.host() {
        Some(url::Host::Domain(host)) => host.to_string(),
        Some(_) => {
            return Err(DittoError::invalid_domain(
                trimmed,
                "IP addresses have no registrable domain",
            ))
        }
        None => return Err(DittoError::invalid_domain(trimmed, "Missing host")),
    };

    let (unicode_host, result) = idna::domain_to_unicode(&host);
    let host = if result.is_ok() { unicode_host } else { host };
    let host = host.trim_end_matches('.').to_lowercase();

    split_host(&host).ok_or_else(|| {
        DittoError::invalid_domain(trimmed, "Could not find a label and a public suffix")
    })
}

/// Split a lowercase host into subdomain, label and public suffix.
///
/// The suffix comes from the Public Suffix List, matched against the ASCII
/// form of the host. Hosts under an unlisted TLD are split at the last dot.
pub(crate) fn split_host(host: &str) -> Option<Target> {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return None;
    }

    let suffix_len = public_suffix_labels(host);
    if labels.len() <= suffix_len {
        return None;
    }

    let label_index = labels.len() - suffix_len - 1;
    Some(Target {
        subdomain: labels[..label_index].join("."),
        label: labels[label_index].to_string(),
        suffix: labels[label_index + 1..].join("."),
    })
}

/// Number of labels in the public suffix of `host`.
///
/// IDNA conversion keeps the label count, so the count found on the ASCII
/// form applies to the Unicode host as well.
fn public_suffix_labels(host: &str) -> usize {
    let ascii = idna::domain_to_ascii(host).unwrap_or_else(|_| host.to_string());
    psl::suffix(ascii.as_bytes())
        .map(|suffix| suffix.as_bytes().split(|b| *b == b'.').count())
        .unwrap_or(1)
}

/// IDNA ASCII form of a domain, or an empty string when it cannot be encoded.
pub fn to_ascii(domain: &str) -> String {
    idna::domain_to_ascii(domain).unwrap_or_default()
}

/// Extract the last label of a domain, lowercased.
pub fn extract_tld(domain: &str) -> Result<String, DittoError> {
    let trimmed = domain.trim().trim_end_matches('.');
    match trimmed.rsplit_once('.') {
        Some((rest, tld)) if !rest.is_empty() && !tld.is_empty() => Ok(tld.to_lowercase()),
        _ => Err(DittoError::invalid_domain(
            domain,
            "Domain must contain at least one dot",
        )),
    }
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// A bare number is read as seconds. A zero duration is not a usable
/// timeout and parses as `None`.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let secs = if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    };

    secs.filter(|secs| *secs > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_domain() {
        let target = parse_target("example.com").unwrap();
        assert_eq!(target.label, "example");
        assert_eq!(target.suffix, "com");
        assert_eq!(target.subdomain, "");
        assert_eq!(target.domain(), "example.com");
    }

    #[test]
    fn test_parse_url_with_subdomain() {
        let target = parse_target("https://www.ice.gov/some/path?q=1").unwrap();
        assert_eq!(target.subdomain, "www");
        assert_eq!(target.label, "ice");
        assert_eq!(target.suffix, "gov");
    }

    #[test]
    fn test_parse_multi_label_suffix() {
        let target = parse_target("shop.bbc.co.uk").unwrap();
        assert_eq!(target.subdomain, "shop");
        assert_eq!(target.label, "bbc");
        assert_eq!(target.suffix, "co.uk");
    }

    #[test]
    fn test_parse_suffixes_from_public_list() {
        for (input, label, suffix) in [
            ("example.co.at", "example", "co.at"),
            ("example.com.es", "example", "com.es"),
            ("example.gv.at", "example", "gv.at"),
            ("www.example.com.au", "example", "com.au"),
            ("example.co.jp", "example", "co.jp"),
            ("example.nom.br", "example", "nom.br"),
        ] {
            let target = parse_target(input).unwrap();
            assert_eq!(target.label, label, "label of {}", input);
            assert_eq!(target.suffix, suffix, "suffix of {}", input);
        }
    }

    #[test]
    fn test_parse_unlisted_tld_splits_at_last_dot() {
        let target = parse_target("www.example.notarealtld").unwrap();
        assert_eq!(target.subdomain, "www");
        assert_eq!(target.label, "example");
        assert_eq!(target.suffix, "notarealtld");
    }

    #[test]
    fn test_parse_unicode_suffix() {
        let target = parse_target("shop.bücher.香港").unwrap();
        assert_eq!(target.subdomain, "shop");
        assert_eq!(target.label, "bücher");
        assert_eq!(target.suffix, "香港");
    }

    #[test]
    fn test_parse_uppercase_and_trailing_dot() {
        let target = parse_target("EXAMPLE.Com.").unwrap();
        assert_eq!(target.domain(), "example.com");
    }

    #[test]
    fn test_parse_unicode_domain_stays_unicode() {
        let target = parse_target("xn--mnchen-3ya.de").unwrap();
        assert_eq!(target.label, "münchen");
        assert_eq!(target.suffix, "de");
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_target("").is_err());
        assert!(parse_target("localhost").is_err());
        assert!(parse_target("co.uk").is_err());
        assert!(parse_target("http://192.168.1.1/").is_err());
        assert!(parse_target("https://").is_err());
    }

    #[test]
    fn test_to_ascii() {
        assert_eq!(to_ascii("example.com"), "example.com");
        assert_eq!(to_ascii("münchen.de"), "xn--mnchen-3ya.de");
        assert!(to_ascii("еxample.com").starts_with("xn--"));
    }

    #[test]
    fn test_extract_tld() {
        assert_eq!(extract_tld("example.com").unwrap(), "com");
        assert_eq!(extract_tld("sub.example.ORG").unwrap(), "org");
        assert!(extract_tld("invalid").is_err());
        assert!(extract_tld("").is_err());
    }

    #[test]
    fn test_parse_timeout_string() {
        assert_eq!(parse_timeout_string("5s"), Some(5));
        assert_eq!(parse_timeout_string("30s"), Some(30));
        assert_eq!(parse_timeout_string("2m"), Some(120));
        assert_eq!(parse_timeout_string("5"), Some(5));
        assert_eq!(parse_timeout_string("invalid"), None);
        assert_eq!(parse_timeout_string("0s"), None);
        assert_eq!(parse_timeout_string("0m"), None);
        assert_eq!(parse_timeout_string("0"), None);
    }
}
