//! Registry lookup tables.
//!
//! Built-in WHOIS servers and RDAP endpoints for common TLDs, plus a
//! process-wide cache of WHOIS servers discovered through IANA referrals.

use crate::error::DittoError;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Known port 43 servers, consulted before asking IANA.
const WHOIS_SERVERS: &[(&str, &str)] = &[
    ("com", "whois.verisign-grs.com"),
    ("net", "whois.verisign-grs.com"),
    ("org", "whois.pir.org"),
    ("info", "whois.nic.info"),
    ("biz", "whois.nic.biz"),
    ("io", "whois.nic.io"),
    ("ai", "whois.nic.ai"),
    ("co", "whois.nic.co"),
    ("me", "whois.nic.me"),
    ("app", "whois.nic.google"),
    ("dev", "whois.nic.google"),
    ("xyz", "whois.nic.xyz"),
    ("gov", "whois.dotgov.gov"),
    ("edu", "whois.educause.edu"),
    ("us", "whois.nic.us"),
    ("uk", "whois.nic.uk"),
    ("de", "whois.denic.de"),
    ("fr", "whois.nic.fr"),
    ("nl", "whois.domain-registry.nl"),
    ("eu", "whois.eu"),
    ("ca", "whois.cira.ca"),
    ("au", "whois.auda.org.au"),
    ("it", "whois.nic.it"),
    ("ru", "whois.tcinet.ru"),
];

/// Known RDAP base URLs, each ending in `/domain/`.
const RDAP_ENDPOINTS: &[(&str, &str)] = &[
    ("com", "https://rdap.verisign.com/com/v1/domain/"),
    ("net", "https://rdap.verisign.com/net/v1/domain/"),
    ("org", "https://rdap.publicinterestregistry.org/rdap/domain/"),
    ("info", "https://rdap.identitydigital.services/rdap/domain/"),
    ("biz", "https://rdap.nic.biz/domain/"),
    ("app", "https://pubapi.registry.google/rdap/domain/"),
    ("dev", "https://pubapi.registry.google/rdap/domain/"),
    ("page", "https://pubapi.registry.google/rdap/domain/"),
    ("xyz", "https://rdap.centralnic.com/xyz/domain/"),
    ("tech", "https://rdap.centralnic.com/tech/domain/"),
    ("online", "https://rdap.centralnic.com/online/domain/"),
    ("site", "https://rdap.centralnic.com/site/domain/"),
    ("shop", "https://rdap.gmoregistry.net/rdap/domain/"),
    ("ai", "https://rdap.identitydigital.services/rdap/domain/"),
    ("io", "https://rdap.identitydigital.services/rdap/domain/"),
    ("me", "https://rdap.identitydigital.services/rdap/domain/"),
    ("us", "https://rdap.nic.us/domain/"),
    ("uk", "https://rdap.nominet.uk/domain/"),
    ("de", "https://rdap.denic.de/domain/"),
    ("ca", "https://rdap.ca.fury.ca/rdap/domain/"),
    ("au", "https://rdap.cctld.au/rdap/domain/"),
    ("fr", "https://rdap.nic.fr/domain/"),
    ("nl", "https://rdap.sidn.nl/domain/"),
    ("br", "https://rdap.registro.br/domain/"),
    ("in", "https://rdap.nixiregistry.in/rdap/domain/"),
    ("tv", "https://rdap.nic.tv/domain/"),
    ("cc", "https://tld-rdap.verisign.com/cc/v1/domain/"),
];

lazy_static::lazy_static! {
    /// TLD -> discovered WHOIS server; an empty string records "none found".
    static ref WHOIS_CACHE: Mutex<HashMap<String, String>> = Mutex::new(HashMap::new());
}

/// Built-in WHOIS server for a TLD.
pub fn builtin_whois_server(tld: &str) -> Option<&'static str> {
    let tld = tld.to_lowercase();
    WHOIS_SERVERS
        .iter()
        .find(|(known, _)| *known == tld)
        .map(|(_, server)| *server)
}

/// RDAP base URL for a TLD.
pub fn get_rdap_endpoint(tld: &str) -> Result<&'static str, DittoError> {
    let tld = tld.to_lowercase();
    RDAP_ENDPOINTS
        .iter()
        .find(|(known, _)| *known == tld)
        .map(|(_, endpoint)| *endpoint)
        .ok_or_else(|| {
            DittoError::rdap(format!(".{}", tld), "No known RDAP endpoint for this TLD")
        })
}

/// Record a discovery result for `tld`. Pass `None` when IANA had no server.
pub fn cache_whois_server(tld: &str, server: Option<&str>) -> Result<(), DittoError> {
    let mut cache = WHOIS_CACHE
        .lock()
        .map_err(|_| DittoError::internal("Failed to acquire WHOIS cache lock"))?;
    cache.insert(tld.to_lowercase(), server.unwrap_or_default().to_string());
    Ok(())
}

/// Cached discovery result: `Some(Some(server))` on a hit, `Some(None)` when
/// the TLD is known to have no server, `None` when nothing is cached.
pub fn get_cached_whois_server(tld: &str) -> Option<Option<String>> {
    let cache = WHOIS_CACHE.lock().ok()?;
    cache
        .get(&tld.to_lowercase())
        .map(|server| (!server.is_empty()).then(|| server.clone()))
}

/// Resolve the WHOIS server for a TLD.
///
/// Order: built-in table, discovery cache, then an IANA referral query whose
/// outcome (including "no server") is cached for the rest of the process.
pub async fn get_whois_server(tld: &str, timeout: Duration) -> Option<String> {
    let tld = tld.to_lowercase();

    if let Some(server) = builtin_whois_server(&tld) {
        return Some(server.to_string());
    }

    if let Some(cached) = get_cached_whois_server(&tld) {
        return cached;
    }

    let discovered = super::whois::discover_whois_server(&tld, timeout).await;
    if let Err(e) = cache_whois_server(&tld, discovered.as_deref()) {
        tracing::debug!("{}", e);
    }
    discovered
}
