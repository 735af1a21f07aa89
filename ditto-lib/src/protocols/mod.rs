//! Network collaborators used by the availability resolver.
//!
//! The resolver only sees the two traits defined here, so tests can swap in
//! scripted implementations and the CLI can choose between WHOIS and RDAP.

use crate::error::DittoError;
use crate::types::RegistrationRecord;
use async_trait::async_trait;
use std::net::IpAddr;

/// Port 43 WHOIS client and response parser
pub mod whois;

/// RDAP (Registration Data Access Protocol) client
pub mod rdap;

/// WHOIS server and RDAP endpoint tables
pub mod registry;

/// Forward and reverse DNS via hickory
pub mod dns;

pub use dns::HickoryDns;
pub use rdap::{extract_registration, RdapClient};
pub use registry::{get_rdap_endpoint, get_whois_server};
pub use whois::{parse_whois_record, WhoisClient};

/// Source of registration records.
///
/// An `Err` means "no usable record": the resolver treats every error as the
/// candidate being available.
#[async_trait]
pub trait RegistrationLookup: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<RegistrationRecord, DittoError>;
}

/// Forward and reverse name resolution.
#[async_trait]
pub trait DnsLookup: Send + Sync {
    /// Addresses (IPv4 and IPv6) a host name resolves to.
    async fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>, DittoError>;

    /// PTR names for an address.
    async fn lookup_addr(&self, addr: IpAddr) -> Result<Vec<String>, DittoError>;
}
