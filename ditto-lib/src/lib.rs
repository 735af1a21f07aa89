//! # Ditto Library
//!
//! Finds registered look-alike domains of a target: homoglyph permutations
//! of the registrable label are generated, checked for registration over
//! WHOIS or RDAP, and the registered ones are resolved forward and in reverse.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ditto_lib::{parse_target, Dictionary, Filter, ScanConfig, Scanner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let target = parse_target("https://www.example.com/login")?;
//!     let scanner = Scanner::new(ScanConfig::default().with_concurrency(8))?;
//!     let report = scanner.scan(&target, &Dictionary::homoglyphs(), None).await?;
//!
//!     for candidate in report.filtered(Filter::LiveOnly) {
//!         println!("{} -> {}", candidate.domain, candidate.joined_addresses());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Homoglyph dictionary**: built-in table, extendable from config
//! - **WHOIS and RDAP**: raw TCP/43 with referral following, or RDAP over HTTPS
//! - **Bounded worker pool**: results come back in generation order
//! - **CSV export**: optional registration columns

pub use concurrent::{ProgressFn, WorkerPool};
pub use config::{load_env_config, ConfigManager, DefaultsConfig, EnvConfig, FileConfig, OutputConfig};
pub use dictionary::Dictionary;
pub use error::DittoError;
pub use generate::{estimate_candidate_count, generate_candidates, permute_label};
pub use protocols::{
    get_rdap_endpoint, get_whois_server, DnsLookup, HickoryDns, RdapClient, RegistrationLookup,
    WhoisClient,
};
pub use report::{
    address_fields, read_csv, registration_fields, write_csv, CsvRecord, Filter, ScanReport,
    ScanSummary,
};
pub use resolver::AvailabilityResolver;
pub use scanner::Scanner;
pub use types::{Candidate, LookupProtocol, RegistrationRecord, ScanConfig, Target, MAX_CONCURRENCY};
pub use utils::{parse_target, parse_timeout_string, to_ascii};

pub mod generate;
pub mod protocols;

mod concurrent;
mod config;
mod dictionary;
mod error;
mod report;
mod resolver;
mod scanner;
mod types;
mod utils;

pub type Result<T> = std::result::Result<T, DittoError>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
