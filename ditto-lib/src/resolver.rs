//! Availability resolution for a single candidate.
//!
//! Fills in one [`Candidate`]: registration verdict, ASCII form, and for
//! registered names the forward and reverse DNS data. Nothing here fails:
//! a lookup error means "available", and DNS errors leave the address
//! fields empty.

use crate::protocols::{DnsLookup, RegistrationLookup};
use crate::types::{Candidate, RegistrationRecord};
use crate::utils::to_ascii;
use std::sync::Arc;

/// Resolves candidates using a registration source and a DNS resolver.
#[derive(Clone)]
pub struct AvailabilityResolver {
    registration: Arc<dyn RegistrationLookup>,
    dns: Arc<dyn DnsLookup>,
}

impl AvailabilityResolver {
    pub fn new(registration: Arc<dyn RegistrationLookup>, dns: Arc<dyn DnsLookup>) -> Self {
        Self { registration, dns }
    }

    /// Resolve `candidate` in place.
    ///
    /// An available verdict is always re-checked with the ASCII form, even
    /// when it equals the Unicode one: some registries only accept A-labels,
    /// and a second attempt can recover from a transient lookup failure. A
    /// registered verdict is already conclusive.
    pub async fn resolve(&self, candidate: &mut Candidate) {
        let (available, record) = self.check(&candidate.domain).await;
        candidate.available = available;
        candidate.registration = record;

        candidate.ascii = to_ascii(&candidate.domain);

        if candidate.available && !candidate.ascii.is_empty() {
            let (available, record) = self.check(&candidate.ascii).await;
            candidate.available = available;
            candidate.registration = record;
        }

        if candidate.available {
            return;
        }

        let host = if candidate.ascii.is_empty() {
            candidate.domain.as_str()
        } else {
            candidate.ascii.as_str()
        };

        candidate.addresses = match self.dns.lookup_host(host).await {
            Ok(addresses) => addresses,
            Err(e) => {
                tracing::debug!("{}", e);
                Vec::new()
            }
        };

        for addr in &candidate.addresses {
            match self.dns.lookup_addr(*addr).await {
                Ok(names) => candidate.hostnames.extend(names),
                Err(e) => tracing::debug!("{}", e),
            }
        }
    }

    /// One registration lookup collapsed into (available, record).
    async fn check(&self, domain: &str) -> (bool, Option<RegistrationRecord>) {
        match self.registration.lookup(domain).await {
            Ok(record) => (false, Some(record)),
            Err(e) if e.indicates_available() => {
                tracing::trace!("{} has no registration record", domain);
                (true, None)
            }
            Err(e) => {
                tracing::debug!("Lookup for {} failed, treating as available: {}", domain, e);
                (true, None)
            }
        }
    }
}
