//! RDAP (Registration Data Access Protocol) implementation.
//!
//! RDAP answers with structured JSON, so there is no text scraping: a 200
//! carries the record, a 404 means the registry has none, and every other
//! status is reported as an error.

use super::registry::get_rdap_endpoint;
use super::RegistrationLookup;
use crate::error::DittoError;
use crate::types::RegistrationRecord;
use crate::utils::{extract_tld, to_ascii};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

/// RDAP client over HTTPS.
#[derive(Clone)]
pub struct RdapClient {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl RdapClient {
    /// Create a new RDAP client with default settings.
    pub fn new() -> Result<Self, DittoError> {
        Self::with_timeout(Duration::from_secs(10))
    }

    /// Create a new RDAP client with a per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, DittoError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ditto/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                DittoError::network_with_source("Failed to create RDAP HTTP client", e.to_string())
            })?;

        Ok(Self {
            http_client,
            timeout,
        })
    }

    /// Fetch the registration record for `domain`.
    ///
    /// # Errors
    ///
    /// - `RdapError` with status 404 when the registry has no such domain
    /// - `RdapError` for an unknown TLD or any other HTTP status
    /// - `NetworkError`/`Timeout` when the request does not complete
    pub async fn fetch(&self, domain: &str) -> Result<RegistrationRecord, DittoError> {
        let tld = extract_tld(domain)?;
        let endpoint = get_rdap_endpoint(&tld)?;

        // RDAP servers expect the A-label form.
        let ascii = to_ascii(domain);
        let query = if ascii.is_empty() { domain } else { ascii.as_str() };
        let url = format!("{}{}", endpoint, query);

        tracing::debug!("RDAP request: {}", url);

        let response = match tokio::time::timeout(self.timeout, self.http_client.get(&url).send()).await {
            Ok(result) => result?,
            Err(_) => return Err(DittoError::timeout("RDAP request", self.timeout)),
        };

        match response.status() {
            StatusCode::OK => {
                let json = response.json::<serde_json::Value>().await.map_err(|e| {
                    DittoError::rdap(domain, format!("Failed to parse JSON: {}", e))
                })?;
                Ok(extract_registration(&json))
            }
            StatusCode::NOT_FOUND => Err(DittoError::rdap_with_status(
                domain,
                "Domain not found",
                StatusCode::NOT_FOUND.as_u16(),
            )),
            code => Err(DittoError::rdap_with_status(
                domain,
                format!("RDAP server returned error: {}", code),
                code.as_u16(),
            )),
        }
    }
}

#[async_trait]
impl RegistrationLookup for RdapClient {
    async fn lookup(&self, domain: &str) -> Result<RegistrationRecord, DittoError> {
        self.fetch(domain).await
    }
}

/// Extract registration details from an RDAP domain object.
pub fn extract_registration(json: &serde_json::Value) -> RegistrationRecord {
    let mut record = RegistrationRecord::default();

    if let Some(entities) = json.get("entities").and_then(|e| e.as_array()) {
        record.registrar = entities
            .iter()
            .filter(|entity| has_role(entity, "registrar"))
            .find_map(|entity| {
                extract_registrar_url(entity)
                    .or_else(|| extract_vcard_name(entity))
                    .or_else(|| extract_entity_identifier(entity))
            });
    }

    if let Some(events) = json.get("events").and_then(|e| e.as_array()) {
        for event in events {
            let action = event.get("eventAction").and_then(|a| a.as_str());
            let date = event.get("eventDate").and_then(|d| d.as_str());
            if let (Some(action), Some(date)) = (action, date) {
                match action {
                    "registration" => record.created = Some(date.to_string()),
                    "expiration" => record.expires = Some(date.to_string()),
                    "last changed" => record.updated = Some(date.to_string()),
                    _ => {}
                }
            }
        }
    }

    if let Some(statuses) = json.get("status").and_then(|s| s.as_array()) {
        record.status = statuses
            .iter()
            .filter_map(|s| s.as_str())
            .map(String::from)
            .collect();
    }

    if let Some(nameservers) = json.get("nameservers").and_then(|ns| ns.as_array()) {
        for nameserver in nameservers {
            if let Some(name) = nameserver.get("ldhName").and_then(|n| n.as_str()) {
                let name = name.trim_end_matches('.').to_lowercase();
                if !record.name_servers.contains(&name) {
                    record.name_servers.push(name);
                }
            }
        }
    }

    record
}

fn has_role(entity: &serde_json::Value, role: &str) -> bool {
    entity
        .get("roles")
        .and_then(|r| r.as_array())
        .is_some_and(|roles| roles.iter().any(|r| r.as_str() == Some(role)))
}

/// Registrar home page from the entity's `links` (rel "about").
fn extract_registrar_url(entity: &serde_json::Value) -> Option<String> {
    entity
        .get("links")
        .and_then(|l| l.as_array())?
        .iter()
        .find(|link| link.get("rel").and_then(|r| r.as_str()) == Some("about"))
        .and_then(|link| link.get("href"))
        .and_then(|h| h.as_str())
        .map(String::from)
}

/// Formatted name (`fn`) from the entity's vCard.
fn extract_vcard_name(entity: &serde_json::Value) -> Option<String> {
    entity
        .get("vcardArray")
        .and_then(|v| v.as_array())
        .and_then(|a| a.get(1))
        .and_then(|a| a.as_array())?
        .iter()
        .filter_map(|item| item.as_array())
        .find(|item| item.len() >= 4 && item[0].as_str() == Some("fn"))
        .and_then(|item| item[3].as_str())
        .map(String::from)
}

/// Entity identifier from publicIds, handle or name.
fn extract_entity_identifier(entity: &serde_json::Value) -> Option<String> {
    entity
        .get("publicIds")
        .and_then(|p| p.as_array())
        .and_then(|ids| ids.first())
        .and_then(|id| id.get("identifier"))
        .or_else(|| entity.get("handle"))
        .or_else(|| entity.get("name"))
        .and_then(|v| v.as_str())
        .map(String::from)
}
