//! Integration tests for ditto-lib exports and the scan pipeline

use async_trait::async_trait;
use ditto_lib::{
    estimate_candidate_count, generate_candidates, get_rdap_endpoint, parse_target, read_csv,
    to_ascii, AvailabilityResolver, Dictionary, DittoError, DnsLookup, Filter, LookupProtocol,
    RegistrationLookup, RegistrationRecord, ScanConfig, ScanSummary, Scanner,
};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

/// Scripted registry: listed domains are registered, broken ones fail with a
/// network error, everything else is not registered.
#[derive(Default)]
struct FakeRegistry {
    registered: HashMap<String, RegistrationRecord>,
    broken: HashSet<String>,
    queried: Mutex<Vec<String>>,
}

impl FakeRegistry {
    fn register(mut self, domain: &str, registrar: &str) -> Self {
        self.registered.insert(
            domain.to_string(),
            RegistrationRecord {
                registrar: Some(registrar.to_string()),
                created: Some("2020-02-02".to_string()),
                name_servers: vec!["ns1.parking.example".to_string()],
                ..Default::default()
            },
        );
        self
    }

    fn break_domain(mut self, domain: &str) -> Self {
        self.broken.insert(domain.to_string());
        self
    }
}

#[async_trait]
impl RegistrationLookup for FakeRegistry {
    async fn lookup(&self, domain: &str) -> Result<RegistrationRecord, DittoError> {
        self.queried.lock().unwrap().push(domain.to_string());
        if self.broken.contains(domain) {
            return Err(DittoError::network(format!("connection refused for {}", domain)));
        }
        self.registered
            .get(domain)
            .cloned()
            .ok_or_else(|| DittoError::no_record(domain))
    }
}

#[derive(Default)]
struct FakeDns {
    hosts: HashMap<String, Vec<IpAddr>>,
    ptrs: HashMap<IpAddr, Vec<String>>,
}

#[async_trait]
impl DnsLookup for FakeDns {
    async fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>, DittoError> {
        self.hosts
            .get(host)
            .cloned()
            .ok_or_else(|| DittoError::dns(host, "NXDOMAIN"))
    }

    async fn lookup_addr(&self, addr: IpAddr) -> Result<Vec<String>, DittoError> {
        self.ptrs
            .get(&addr)
            .cloned()
            .ok_or_else(|| DittoError::dns(addr.to_string(), "no PTR"))
    }
}

fn offline_scanner(config: ScanConfig, registry: Arc<FakeRegistry>, dns: FakeDns) -> Scanner {
    Scanner::with_resolver(config, AvailabilityResolver::new(registry, Arc::new(dns)))
}

#[test]
fn test_library_exports_work() {
    let target = parse_target("https://login.example.com/").unwrap();
    assert_eq!(target.to_string(), "example.com");

    let dictionary = Dictionary::homoglyphs();
    assert!(!dictionary.is_empty());
    assert_eq!(
        estimate_candidate_count(&target.label, &dictionary),
        generate_candidates(&target, &dictionary, 0).len()
    );

    assert_eq!("rdap".parse::<LookupProtocol>().unwrap(), LookupProtocol::Rdap);
    assert!(get_rdap_endpoint("com").is_ok());
    assert!(get_rdap_endpoint("invalidtld").is_err());
    assert_eq!(to_ascii("bücher.de"), "xn--bcher-kva.de");
    assert!(!ditto_lib::VERSION.is_empty());
}

#[test]
fn test_invalid_targets_rejected() {
    for input in ["", "localhost", "http://", "not a domain"] {
        let err = parse_target(input).unwrap_err();
        assert!(err.is_fatal(), "'{}' should be rejected", input);
    }
}

#[test]
fn test_candidates_are_unique_and_exclude_target() {
    let target = parse_target("paypal.com").unwrap();
    let candidates = generate_candidates(&target, &Dictionary::homoglyphs(), 0);

    let unique: HashSet<&str> = candidates.iter().map(|c| c.domain.as_str()).collect();
    assert_eq!(unique.len(), candidates.len());
    assert!(!unique.contains("paypal.com"));
    assert!(candidates.iter().all(|c| c.domain.ends_with(".com")));
    assert!(candidates.iter().all(|c| !c.available && c.ascii.is_empty()));
}

#[tokio::test]
async fn test_offline_scan_end_to_end() {
    let target = parse_target("example.com").unwrap();
    let mut dictionary = Dictionary::new();
    dictionary.insert('e', ['3', 'е']);
    dictionary.insert('l', ['1']);

    let cyrillic = to_ascii("еxample.com");
    let registry = Arc::new(
        FakeRegistry::default()
            .register("exampl3.com", "Registrar One")
            .register(&cyrillic, "Registrar Two")
            .register("examp1e.com", "Registrar Three"),
    );

    let live: IpAddr = "192.0.2.10".parse().unwrap();
    let mut dns = FakeDns::default();
    dns.hosts.insert("exampl3.com".to_string(), vec![live]);
    dns.ptrs.insert(live, vec!["parked.example.net.".to_string()]);

    let scanner = offline_scanner(ScanConfig::default().with_concurrency(3), registry.clone(), dns);

    let seen = Arc::new(Mutex::new(0usize));
    let seen_cb = seen.clone();
    let progress: ditto_lib::ProgressFn = Arc::new(move |_done: usize, _total: usize| {
        *seen_cb.lock().unwrap() += 1;
    });

    let report = scanner.scan(&target, &dictionary, Some(progress)).await.unwrap();

    let domains: Vec<&str> = report.candidates.iter().map(|c| c.domain.as_str()).collect();
    assert_eq!(
        domains,
        vec!["3xample.com", "еxample.com", "examp1e.com", "exampl3.com", "examplе.com"]
    );
    assert_eq!(*seen.lock().unwrap(), 5);

    assert_eq!(
        report.summary(),
        ScanSummary {
            total: 5,
            available: 2,
            registered: 3,
            live: 1,
        }
    );

    let unicode = &report.candidates[1];
    assert!(!unicode.available);
    assert_eq!(unicode.ascii, cyrillic);
    assert_eq!(
        unicode.registration.as_ref().and_then(|r| r.registrar.as_deref()),
        Some("Registrar Two")
    );

    let live_rows: Vec<&str> = report
        .filtered(Filter::LiveOnly)
        .map(|c| c.domain.as_str())
        .collect();
    assert_eq!(live_rows, vec!["exampl3.com"]);
    assert_eq!(report.candidates[3].joined_hostnames(), "parked.example.net.");

    // Every available verdict is retried in ASCII form, registered ones are
    // queried once.
    let queried = registry.queried.lock().unwrap().clone();
    assert!(queried.contains(&to_ascii("examplе.com")));
    assert_eq!(queried.iter().filter(|d| *d == "3xample.com").count(), 2);
    assert_eq!(queried.iter().filter(|d| *d == "examp1e.com").count(), 1);
    assert_eq!(queried.len(), 8);
}

#[tokio::test]
async fn test_scan_limit_and_csv_export() {
    let target = parse_target("example.com").unwrap();
    let registry = Arc::new(FakeRegistry::default().register("éxample.com", "Registrar, Inc."));
    let scanner = offline_scanner(
        ScanConfig::default().with_limit(4).with_concurrency(2),
        registry,
        FakeDns::default(),
    );

    let report = scanner
        .scan(&target, &Dictionary::homoglyphs(), None)
        .await
        .unwrap();
    assert_eq!(report.candidates.len(), 4);

    let mut out = Vec::new();
    report.write_csv(&mut out, true).unwrap();
    let rows = read_csv(out.as_slice()).unwrap();

    assert_eq!(rows.len(), 4);
    let registered: Vec<_> = rows.iter().filter(|r| r.status == "registered").collect();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].unicode, "éxample.com");
    assert_eq!(registered[0].ascii, to_ascii("éxample.com"));
    assert_eq!(registered[0].registrar.as_deref(), Some("Registrar, Inc."));
    assert_eq!(registered[0].ips, "");
    assert!(rows
        .iter()
        .filter(|r| r.status == "available")
        .all(|r| r.registrar.is_none()));
}

#[tokio::test]
async fn test_failed_lookup_reported_as_available() {
    let target = parse_target("example.com").unwrap();
    let mut dictionary = Dictionary::new();
    dictionary.insert('l', ['3']);

    let registry = Arc::new(FakeRegistry::default().break_domain("exampl3.com"));
    let live: IpAddr = "192.0.2.20".parse().unwrap();
    let mut dns = FakeDns::default();
    dns.hosts.insert("exampl3.com".to_string(), vec![live]);
    dns.ptrs.insert(live, vec!["parked.example.net.".to_string()]);

    let scanner = offline_scanner(ScanConfig::default(), registry.clone(), dns);
    let report = scanner.scan(&target, &dictionary, None).await.unwrap();

    assert_eq!(report.candidates.len(), 1);
    let candidate = &report.candidates[0];
    assert!(candidate.available);
    assert!(candidate.registration.is_none());
    assert!(candidate.addresses.is_empty());
    assert!(candidate.hostnames.is_empty());
    assert_eq!(report.filtered(Filter::LiveOnly).count(), 0);

    let mut out = Vec::new();
    report.write_csv(&mut out, true).unwrap();
    let rows = read_csv(out.as_slice()).unwrap();
    assert_eq!(rows[0].status, "available");
    assert_eq!(rows[0].ips, "");
    assert_eq!(rows[0].names, "");
    assert!(rows[0].registrar.is_none());
    assert_eq!(registry.queried.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_dictionary_scans_nothing() {
    let target = parse_target("example.com").unwrap();
    let registry = Arc::new(FakeRegistry::default());
    let scanner = offline_scanner(ScanConfig::default(), registry.clone(), FakeDns::default());

    let report = scanner.scan(&target, &Dictionary::new(), None).await.unwrap();
    assert!(report.candidates.is_empty());
    assert_eq!(report.summary(), ScanSummary::default());
    assert!(registry.queried.lock().unwrap().is_empty());
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_known_registered_lookalike_over_network() {
    let target = parse_target("google.com").unwrap();
    let scanner = Scanner::new(ScanConfig::default().with_protocol(LookupProtocol::Rdap)).unwrap();

    let mut dictionary = Dictionary::new();
    dictionary.insert('l', ['1']);
    let report = scanner.scan(&target, &dictionary, None).await.unwrap();

    // goog1e.com has been registered defensively for years.
    assert!(report
        .filtered(Filter::RegisteredOnly)
        .any(|c| c.domain == "goog1e.com"));
}
