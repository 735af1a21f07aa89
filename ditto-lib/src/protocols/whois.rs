//! WHOIS protocol implementation.
//!
//! Queries go straight to port 43 over TCP. The TLD's server comes from the
//! registry tables (or an IANA referral), and when the registry points at a
//! registrar WHOIS server, one extra hop is made to fill in fields the thin
//! registry response left out.
//!
//! WHOIS output is free text; [`parse_whois_record`] turns it into a
//! [`RegistrationRecord`] or an error when the response is empty, rate
//! limited, or reports that no such domain exists.

use super::registry::get_whois_server;
use super::RegistrationLookup;
use crate::error::DittoError;
use crate::types::RegistrationRecord;
use crate::utils::extract_tld;
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const WHOIS_PORT: u16 = 43;
const IANA_WHOIS_SERVER: &str = "whois.iana.org";

/// Phrases registries use to say the domain does not exist.
const NOT_FOUND_PATTERNS: &[&str] = &[
    "no match",
    "not found",
    "no data found",
    "no entries found",
    "domain not found",
    "status: available",
    "status: free",
    "not registered",
    "no matching record",
    "no object found",
    "object does not exist",
    "no matching entry",
    "this domain name has not been registered",
];

const RATE_LIMIT_PATTERNS: &[&str] = &[
    "rate limit exceeded",
    "too many requests",
    "quota exceeded",
    "limit exceeded",
    "throttled",
    "rate-limited",
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().filter_map(|p| Regex::new(p).ok()).collect()
}

lazy_static::lazy_static! {
    // Registrar URL first: it is the referral link, the name is a fallback.
    static ref REGISTRAR: Vec<Regex> = compile(&[
        r"(?im)^\s*Registrar URL:[ \t]*(\S.*)$",
        r"(?im)^\s*Registrar:[ \t]*(\S.*)$",
        r"(?im)^\s*Registrar Name:[ \t]*(\S.*)$",
        r"(?im)^\s*Sponsoring Registrar:[ \t]*(\S.*)$",
    ]);
    static ref CREATED: Vec<Regex> = compile(&[
        r"(?im)^\s*Creation Date:[ \t]*(\S.*)$",
        r"(?im)^\s*Created Date:[ \t]*(\S.*)$",
        r"(?im)^\s*Created(?: On)?:[ \t]*(\S.*)$",
        r"(?im)^\s*Registration Time:[ \t]*(\S.*)$",
        r"(?im)^\s*Registered on:[ \t]*(\S.*)$",
    ]);
    static ref UPDATED: Vec<Regex> = compile(&[
        r"(?im)^\s*Updated Date:[ \t]*(\S.*)$",
        r"(?im)^\s*Last Updated(?: On)?:[ \t]*(\S.*)$",
        r"(?im)^\s*Last Modified:[ \t]*(\S.*)$",
        r"(?im)^\s*Changed:[ \t]*(\S.*)$",
    ]);
    static ref EXPIRES: Vec<Regex> = compile(&[
        r"(?im)^\s*Registry Expiry Date:[ \t]*(\S.*)$",
        r"(?im)^\s*Registrar Registration Expiration Date:[ \t]*(\S.*)$",
        r"(?im)^\s*Expir(?:y|ation) Date:[ \t]*(\S.*)$",
        r"(?im)^\s*Expiration Time:[ \t]*(\S.*)$",
        r"(?im)^\s*Expiry date:[ \t]*(\S.*)$",
        r"(?im)^\s*paid-till:[ \t]*(\S.*)$",
    ]);
    static ref NAME_SERVER: Vec<Regex> = compile(&[
        r"(?im)^\s*Name Server:[ \t]*(\S+)",
        r"(?im)^\s*nserver:[ \t]*(\S+)",
        r"(?im)^\s*Nameserver:[ \t]*(\S+)",
    ]);
    static ref STATUS: Vec<Regex> = compile(&[
        r"(?im)^\s*Domain Status:[ \t]*(\S+)",
        r"(?im)^\s*Status:[ \t]*(\S+)",
        r"(?im)^\s*state:[ \t]*(\S+)",
    ]);
    static ref REFERRAL: Vec<Regex> = compile(&[
        r"(?im)^\s*Registrar WHOIS Server:[ \t]*(\S+)",
        r"(?im)^\s*Whois Server:[ \t]*(\S+)",
    ]);
}

/// Port 43 WHOIS client.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    /// Deadline for a single TCP exchange
    timeout: Duration,
    /// Follow one "Registrar WHOIS Server" hop
    follow_referral: bool,
}

impl WhoisClient {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            follow_referral: true,
        }
    }

    /// Create a new WHOIS client with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::new()
        }
    }

    /// Enable or disable the registrar referral hop.
    pub fn with_follow_referral(mut self, enabled: bool) -> Self {
        self.follow_referral = enabled;
        self
    }

    /// Send `query` to `server` on port 43 and return the full response.
    pub async fn query(&self, server: &str, query: &str) -> Result<String, DittoError> {
        self.query_at(server, WHOIS_PORT, query).await
    }

    async fn query_at(&self, server: &str, port: u16, query: &str) -> Result<String, DittoError> {
        let exchange = async {
            let mut stream = TcpStream::connect((server, port)).await?;
            stream.write_all(format!("{}\r\n", query).as_bytes()).await?;

            let mut response = Vec::new();
            stream.read_to_end(&mut response).await?;
            Ok::<_, std::io::Error>(response)
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(bytes)) => {
                tracing::trace!("{} answered '{}' with {} bytes", server, query, bytes.len());
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            Ok(Err(e)) => Err(DittoError::network_with_source(
                format!("WHOIS exchange with {} failed", server),
                e.to_string(),
            )),
            Err(_) => Err(DittoError::timeout(
                format!("WHOIS query to {}", server),
                self.timeout,
            )),
        }
    }

    /// Look up `domain` and parse the registry response, filling gaps from
    /// the registrar's own WHOIS server when one is advertised.
    pub async fn fetch(&self, domain: &str) -> Result<RegistrationRecord, DittoError> {
        let tld = extract_tld(domain)?;
        let server = get_whois_server(&tld, self.timeout)
            .await
            .ok_or_else(|| DittoError::whois(domain, format!("No WHOIS server known for .{}", tld)))?;

        let raw = self.query(&server, domain).await?;
        let mut record = parse_whois_record(domain, &raw)?;

        if !self.follow_referral {
            return Ok(record);
        }

        if let Some(referral) = parse_registrar_referral(&raw) {
            if !referral.eq_ignore_ascii_case(&server) {
                match self.query(&referral, domain).await {
                    Ok(referral_raw) => match parse_whois_record(domain, &referral_raw) {
                        Ok(extra) => fill_missing(&mut record, extra),
                        Err(e) => tracing::debug!("Ignoring referral response from {}: {}", referral, e),
                    },
                    Err(e) => tracing::debug!("Referral to {} failed: {}", referral, e),
                }
            }
        }

        Ok(record)
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistrationLookup for WhoisClient {
    async fn lookup(&self, domain: &str) -> Result<RegistrationRecord, DittoError> {
        self.fetch(domain).await
    }
}

/// Ask IANA which WHOIS server is authoritative for `tld`.
pub async fn discover_whois_server(tld: &str, timeout: Duration) -> Option<String> {
    let client = WhoisClient::with_timeout(timeout);
    match client.query(IANA_WHOIS_SERVER, tld).await {
        Ok(response) => parse_iana_refer_response(&response),
        Err(e) => {
            tracing::debug!("IANA referral lookup for .{} failed: {}", tld, e);
            None
        }
    }
}

/// Parse an IANA WHOIS response for the authoritative WHOIS server.
///
/// IANA uses `refer:` and sometimes only `whois:`; `refer:` wins when both
/// are present.
///
/// ```text
/// refer:        whois.verisign-grs.com
/// whois:        whois.verisign-grs.com
/// ```
fn parse_iana_refer_response(response: &str) -> Option<String> {
    let mut whois_server = None;

    for line in response.lines() {
        let line = line.trim();
        if let Some(server) = line.strip_prefix("refer:") {
            let server = server.trim();
            if !server.is_empty() {
                return Some(server.to_string());
            }
        } else if let Some(server) = line.strip_prefix("whois:") {
            let server = server.trim();
            if !server.is_empty() {
                whois_server = Some(server.to_string());
            }
        }
    }

    whois_server
}

/// Registrar WHOIS server advertised in a registry response, as a bare host.
fn parse_registrar_referral(raw: &str) -> Option<String> {
    let value = extract_field(raw, &REFERRAL)?;
    let host = value
        .trim_start_matches("whois://")
        .trim_start_matches("rwhois://")
        .trim_end_matches('/');
    let host = host.split(':').next().unwrap_or(host);
    (!host.is_empty()).then(|| host.to_lowercase())
}

/// Parse a raw WHOIS response.
///
/// # Errors
///
/// - `WhoisError` for an empty or unrecognisable response
/// - `RateLimited` when the server refused to answer
/// - `NoRecord` when the registry reports that the domain does not exist
pub fn parse_whois_record(domain: &str, raw: &str) -> Result<RegistrationRecord, DittoError> {
    if raw.trim().is_empty() {
        return Err(DittoError::whois(domain, "Empty WHOIS response"));
    }

    let lower = raw.to_lowercase();
    if RATE_LIMIT_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Err(DittoError::rate_limited("WHOIS", format!("Query for '{}' was refused", domain)));
    }
    if NOT_FOUND_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Err(DittoError::no_record(domain));
    }

    let record = RegistrationRecord {
        registrar: extract_field(raw, &REGISTRAR),
        created: extract_field(raw, &CREATED),
        updated: extract_field(raw, &UPDATED),
        expires: extract_field(raw, &EXPIRES),
        name_servers: extract_all(raw, &NAME_SERVER, |ns| {
            ns.trim_end_matches('.').to_lowercase()
        }),
        status: extract_all(raw, &STATUS, str::to_string),
    };

    if record == RegistrationRecord::default() {
        return Err(DittoError::ParseError {
            message: format!("Unrecognised WHOIS response for '{}'", domain),
            content: Some(raw.chars().take(200).collect()),
        });
    }

    Ok(record)
}

/// First non-empty capture across `patterns`, in pattern order.
fn extract_field(text: &str, patterns: &[Regex]) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

/// Every capture across `patterns`, normalised and deduplicated.
fn extract_all<F>(text: &str, patterns: &[Regex], normalise: F) -> Vec<String>
where
    F: Fn(&str) -> String,
{
    let mut values = Vec::new();
    for re in patterns {
        for caps in re.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                let value = normalise(m.as_str().trim());
                if !value.is_empty() && !values.contains(&value) {
                    values.push(value);
                }
            }
        }
    }
    values
}

fn fill_missing(record: &mut RegistrationRecord, extra: RegistrationRecord) {
    record.registrar = record.registrar.take().or(extra.registrar);
    record.created = record.created.take().or(extra.created);
    record.updated = record.updated.take().or(extra.updated);
    record.expires = record.expires.take().or(extra.expires);
    if record.name_servers.is_empty() {
        record.name_servers = extra.name_servers;
    }
    if record.status.is_empty() {
        record.status = extra.status;
    }
}
