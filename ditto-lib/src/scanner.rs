//! Scan orchestration.
//!
//! This module provides the `Scanner` that ties the pipeline together:
//! generate candidates for a target, resolve them through the worker pool,
//! and hand back a [`ScanReport`].
//!
//! # Example
//!
//! ```rust,no_run
//! use ditto_lib::{parse_target, Dictionary, ScanConfig, Scanner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let target = parse_target("example.com")?;
//!     let scanner = Scanner::new(ScanConfig::default().with_limit(20))?;
//!     let report = scanner.scan(&target, &Dictionary::homoglyphs(), None).await?;
//!
//!     for candidate in &report.candidates {
//!         println!("{} {}", candidate.domain, candidate.status());
//!     }
//!     Ok(())
//! }
//! ```

use crate::concurrent::{ProgressFn, WorkerPool};
use crate::dictionary::Dictionary;
use crate::error::DittoError;
use crate::generate::generate_candidates;
use crate::protocols::{HickoryDns, RdapClient, RegistrationLookup, WhoisClient};
use crate::report::ScanReport;
use crate::resolver::AvailabilityResolver;
use crate::types::{Candidate, LookupProtocol, ScanConfig, Target};
use std::sync::Arc;

/// Runs doppelganger scans with one configuration.
pub struct Scanner {
    config: ScanConfig,
    resolver: Arc<AvailabilityResolver>,
}

impl Scanner {
    /// Create a scanner with network-backed lookups chosen by `config.protocol`.
    pub fn new(config: ScanConfig) -> Result<Self, DittoError> {
        let registration: Arc<dyn RegistrationLookup> = match config.protocol {
            LookupProtocol::Whois => Arc::new(
                WhoisClient::with_timeout(config.lookup_timeout)
                    .with_follow_referral(config.follow_referral),
            ),
            LookupProtocol::Rdap => Arc::new(RdapClient::with_timeout(config.lookup_timeout)?),
        };
        let dns = Arc::new(HickoryDns::new(config.dns_timeout));

        Ok(Self::with_resolver(
            config,
            AvailabilityResolver::new(registration, dns),
        ))
    }

    /// Create a scanner around an existing resolver.
    pub fn with_resolver(config: ScanConfig, resolver: AvailabilityResolver) -> Self {
        Self {
            config,
            resolver: Arc::new(resolver),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Candidates for `target`, truncated to the configured limit.
    pub fn generate(&self, target: &Target, dictionary: &Dictionary) -> Vec<Candidate> {
        generate_candidates(target, dictionary, self.config.limit)
    }

    /// Resolve `candidates` through the worker pool, preserving their order.
    pub async fn resolve_all(
        &self,
        candidates: Vec<Candidate>,
        progress: Option<ProgressFn>,
    ) -> Result<Vec<Candidate>, DittoError> {
        let total = candidates.len();
        let workers = self.config.effective_concurrency().min(total.max(1));

        tracing::debug!("Resolving {} candidates with {} workers", total, workers);

        let mut pool = WorkerPool::start(workers, self.resolver.clone(), total, progress);
        for candidate in candidates {
            pool.add(candidate).await?;
        }
        pool.wait_done().await
    }

    /// Generate and resolve every candidate for `target`.
    pub async fn scan(
        &self,
        target: &Target,
        dictionary: &Dictionary,
        progress: Option<ProgressFn>,
    ) -> Result<ScanReport, DittoError> {
        let candidates = self.generate(target, dictionary);
        tracing::info!("Checking {} variations for '{}'", candidates.len(), target);

        let resolved = self.resolve_all(candidates, progress).await?;
        Ok(ScanReport::new(target.clone(), resolved))
    }
}
