//! Core data types for doppelganger scanning.
//!
//! This module defines the candidate entity that flows through the pipeline,
//! the parsed registration record, the scan configuration and the parsed
//! target domain.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::Duration;

/// Upper bound for the worker pool size.
pub const MAX_CONCURRENCY: usize = 512;

/// One generated look-alike domain and everything learned about it.
///
/// Created by the permutation generator with only `domain` set, then filled
/// in exactly once by the availability resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The Unicode form of the candidate (e.g. "еxample.com")
    pub domain: String,

    /// IDNA ASCII form of `domain` (e.g. "xn--xample-2of.com"); empty if
    /// transcoding failed
    pub ascii: String,

    /// Whether the candidate appears to be unregistered
    pub available: bool,

    /// Parsed registration record, only for registered candidates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<RegistrationRecord>,

    /// Addresses the candidate resolves to
    pub addresses: Vec<IpAddr>,

    /// Reverse DNS names of all resolved addresses, deduplicated
    pub hostnames: BTreeSet<String>,
}

impl Candidate {
    /// Create an unresolved candidate for a generated domain.
    pub fn new<D: Into<String>>(domain: D) -> Self {
        Self {
            domain: domain.into(),
            ..Default::default()
        }
    }

    /// Registered and resolving to at least one address.
    pub fn is_live(&self) -> bool {
        !self.available && !self.addresses.is_empty()
    }

    /// Status literal used in reports.
    pub fn status(&self) -> &'static str {
        if self.available {
            "available"
        } else {
            "registered"
        }
    }

    /// Addresses joined with commas.
    pub fn joined_addresses(&self) -> String {
        self.addresses
            .iter()
            .map(|addr| addr.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Hostnames joined with commas.
    pub fn joined_hostnames(&self) -> String {
        self.hostnames
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Registration details extracted from a WHOIS or RDAP response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Registrar referral URL, or the registrar name when no URL is published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,

    /// When the domain was first registered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    /// Last update of the registration record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,

    /// When the registration expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,

    /// Name servers, lowercased
    pub name_servers: Vec<String>,

    /// Domain status codes (e.g. "clientTransferProhibited")
    pub status: Vec<String>,
}

/// Protocol used to decide whether a candidate is registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupProtocol {
    /// Port 43 WHOIS with IANA referral discovery
    #[default]
    Whois,

    /// HTTPS RDAP against the built-in endpoint map
    Rdap,
}

impl std::str::FromStr for LookupProtocol {
    type Err = crate::DittoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "whois" => Ok(Self::Whois),
            "rdap" => Ok(Self::Rdap),
            other => Err(crate::DittoError::config(format!(
                "Unknown lookup protocol '{}', expected 'whois' or 'rdap'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for LookupProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupProtocol::Whois => write!(f, "WHOIS"),
            LookupProtocol::Rdap => write!(f, "RDAP"),
        }
    }
}

/// Settings for one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Number of pool workers; 0 means one per logical core
    pub concurrency: usize,

    /// Maximum number of candidates to generate; 0 means no limit
    pub limit: usize,

    /// Deadline for a single WHOIS/RDAP query
    #[serde(skip)]
    pub lookup_timeout: Duration,

    /// Deadline for a single DNS query
    #[serde(skip)]
    pub dns_timeout: Duration,

    /// Registration lookup protocol
    pub protocol: LookupProtocol,

    /// Follow one "Registrar WHOIS Server" referral hop
    pub follow_referral: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: 0,
            limit: 0,
            lookup_timeout: Duration::from_secs(10),
            dns_timeout: Duration::from_secs(5),
            protocol: LookupProtocol::Whois,
            follow_referral: true,
        }
    }
}

impl ScanConfig {
    /// Set the worker count, capped at [`MAX_CONCURRENCY`]. 0 selects the core count.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.min(MAX_CONCURRENCY);
        self
    }

    /// Cap the number of generated candidates.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the registration lookup timeout.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Set the DNS timeout.
    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    /// Select the registration lookup protocol.
    pub fn with_protocol(mut self, protocol: LookupProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Enable or disable WHOIS registrar referrals.
    pub fn with_follow_referral(mut self, enabled: bool) -> Self {
        self.follow_referral = enabled;
        self
    }

    /// Number of workers the pool will actually start.
    pub fn effective_concurrency(&self) -> usize {
        if self.concurrency == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.concurrency
        }
    }
}

/// A parsed target domain split at its public suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Labels left of the registrable name (e.g. "www"), possibly empty
    pub subdomain: String,

    /// The registrable label that gets permuted (e.g. "example")
    pub label: String,

    /// Public suffix without leading dot (e.g. "com", "co.uk")
    pub suffix: String,
}

impl Target {
    /// The registrable domain, `label.suffix`.
    pub fn domain(&self) -> String {
        format!("{}.{}", self.label, self.suffix)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.label, self.suffix)
    }
}
