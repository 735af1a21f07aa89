//! Result aggregation and export.
//!
//! A [`ScanReport`] holds every resolved candidate in generation order. The
//! console view is filtered, the CSV export always contains every row.

use crate::error::DittoError;
use crate::types::{Candidate, Target};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

const BASE_COLUMNS: [&str; 5] = ["unicode", "ascii", "status", "ips", "names"];
const REGISTRATION_COLUMNS: [&str; 5] = [
    "registrar",
    "created_at",
    "updated_at",
    "expires_at",
    "nameservers",
];

/// Which candidates the console view shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    AvailableOnly,
    RegisteredOnly,
    /// Registered and resolving to at least one address
    LiveOnly,
}

impl Filter {
    /// Build a filter from the three mutually exclusive switches.
    pub fn from_flags(available: bool, registered: bool, live: bool) -> Result<Self, DittoError> {
        match (available, registered, live) {
            (false, false, false) => Ok(Self::All),
            (true, false, false) => Ok(Self::AvailableOnly),
            (false, true, false) => Ok(Self::RegisteredOnly),
            (false, false, true) => Ok(Self::LiveOnly),
            _ => Err(DittoError::config(
                "Only one of available, registered and live can be selected",
            )),
        }
    }

    pub fn matches(&self, candidate: &Candidate) -> bool {
        match self {
            Self::All => true,
            Self::AvailableOnly => candidate.available,
            Self::RegisteredOnly => !candidate.available,
            Self::LiveOnly => candidate.is_live(),
        }
    }
}

/// Counts over a finished scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub total: usize,
    pub available: usize,
    pub registered: usize,
    pub live: usize,
}

/// All candidates of one scan, in generation order.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub target: Target,
    pub candidates: Vec<Candidate>,
}

impl ScanReport {
    pub fn new(target: Target, candidates: Vec<Candidate>) -> Self {
        Self { target, candidates }
    }

    /// Candidates accepted by `filter`, order preserved.
    pub fn filtered(&self, filter: Filter) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(move |c| filter.matches(c))
    }

    pub fn summary(&self) -> ScanSummary {
        let mut summary = ScanSummary {
            total: self.candidates.len(),
            ..Default::default()
        };
        for candidate in &self.candidates {
            if candidate.available {
                summary.available += 1;
            } else {
                summary.registered += 1;
                if candidate.is_live() {
                    summary.live += 1;
                }
            }
        }
        summary
    }

    /// Write every candidate as CSV. See [`write_csv`].
    pub fn write_csv<W: Write>(&self, writer: W, include_registration: bool) -> Result<(), DittoError> {
        write_csv(writer, &self.candidates, include_registration)
    }
}

/// `key=value` fields shown after a registered candidate's status.
pub fn address_fields(candidate: &Candidate) -> Vec<String> {
    let mut fields = Vec::new();
    if !candidate.addresses.is_empty() {
        fields.push(format!("ips={}", candidate.joined_addresses()));
        if !candidate.hostnames.is_empty() {
            fields.push(format!("names={}", candidate.joined_hostnames()));
        }
    }
    fields
}

/// `key=value` registration fields, one per detail line.
pub fn registration_fields(candidate: &Candidate) -> Vec<String> {
    let Some(record) = &candidate.registration else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    if let Some(registrar) = &record.registrar {
        fields.push(format!("registrar={}", registrar));
    }
    fields.push(format!("created={}", record.created.as_deref().unwrap_or_default()));
    fields.push(format!("updated={}", record.updated.as_deref().unwrap_or_default()));
    fields.push(format!("expires={}", record.expires.as_deref().unwrap_or_default()));
    fields.push(format!("ns={}", record.name_servers.join(",")));
    fields
}

/// Write a header and one row per candidate.
///
/// Columns are `unicode,ascii,status,ips,names`, followed by
/// `registrar,created_at,updated_at,expires_at,nameservers` when
/// `include_registration` is set. Missing values are empty strings.
pub fn write_csv<W: Write>(
    writer: W,
    candidates: &[Candidate],
    include_registration: bool,
) -> Result<(), DittoError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = BASE_COLUMNS.to_vec();
    if include_registration {
        header.extend(REGISTRATION_COLUMNS);
    }
    csv_writer.write_record(&header)?;

    for candidate in candidates {
        let mut row = vec![
            candidate.domain.clone(),
            candidate.ascii.clone(),
            candidate.status().to_string(),
            candidate.joined_addresses(),
            candidate.joined_hostnames(),
        ];

        if include_registration {
            match &candidate.registration {
                Some(record) => row.extend([
                    record.registrar.clone().unwrap_or_default(),
                    record.created.clone().unwrap_or_default(),
                    record.updated.clone().unwrap_or_default(),
                    record.expires.clone().unwrap_or_default(),
                    record.name_servers.join(","),
                ]),
                None => row.extend(std::iter::repeat(String::new()).take(REGISTRATION_COLUMNS.len())),
            }
        }

        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// One row of an exported report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CsvRecord {
    pub unicode: String,
    pub ascii: String,
    pub status: String,
    pub ips: String,
    pub names: String,
    #[serde(default)]
    pub registrar: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub nameservers: Option<String>,
}

/// Read back a report written by [`write_csv`].
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<CsvRecord>, DittoError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for record in csv_reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}
