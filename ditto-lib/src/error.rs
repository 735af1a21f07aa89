//! Error handling for doppelganger scanning.
//!
//! Only configuration and output errors are ever surfaced to callers of the
//! scanner. Lookup and resolution errors exist so the protocol clients have a
//! precise failure to report; the availability resolver collapses every one of
//! them into a conservative default.

use std::fmt;

/// Main error type for ditto operations.
#[derive(Debug, Clone)]
pub enum DittoError {
    /// Target domain or candidate name could not be parsed
    InvalidDomain { domain: String, reason: String },

    /// Network-related errors (connection refused, reset, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// WHOIS protocol specific errors
    WhoisError { domain: String, message: String },

    /// RDAP protocol specific errors
    RdapError {
        domain: String,
        message: String,
        status_code: Option<u16>,
    },

    /// The registry answered but holds no record for the domain
    NoRecord { domain: String },

    /// DNS forward or reverse resolution failure
    DnsError { host: String, message: String },

    /// Response or file content could not be parsed
    ParseError {
        message: String,
        content: Option<String>,
    },

    /// Configuration errors (invalid settings, bad config file, etc.)
    ConfigError { message: String },

    /// File I/O errors when reading config or writing reports
    FileError { path: String, message: String },

    /// Timeout errors when a collaborator takes too long
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },

    /// The upstream service refused the query because of rate limiting
    RateLimited { service: String, message: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl DittoError {
    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new WHOIS error.
    pub fn whois<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::WhoisError {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new RDAP error.
    pub fn rdap<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::RdapError {
            domain: domain.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a new RDAP error with HTTP status code.
    pub fn rdap_with_status<D: Into<String>, M: Into<String>>(
        domain: D,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::RdapError {
            domain: domain.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new "no record" error.
    pub fn no_record<D: Into<String>>(domain: D) -> Self {
        Self::NoRecord {
            domain: domain.into(),
        }
    }

    /// Create a new DNS error.
    pub fn dns<H: Into<String>, M: Into<String>>(host: H, message: M) -> Self {
        Self::DnsError {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::ParseError {
            message: message.into(),
            content: None,
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new rate limiting error.
    pub fn rate_limited<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::RateLimited {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error means the registry positively reported no record.
    ///
    /// Every lookup error is treated as "available" by the resolver; this only
    /// separates an explicit negative answer from broken infrastructure in logs.
    pub fn indicates_available(&self) -> bool {
        match self {
            Self::NoRecord { .. } => true,
            Self::RdapError {
                status_code: Some(404),
                ..
            } => true,
            _ => false,
        }
    }

    /// Check if this error is fatal for a whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidDomain { .. } | Self::ConfigError { .. } | Self::FileError { .. }
        )
    }
}

impl fmt::Display for DittoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::WhoisError { domain, message } => {
                write!(f, "WHOIS error for '{}': {}", domain, message)
            }
            Self::RdapError {
                domain,
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "RDAP error for '{}' (HTTP {}): {}", domain, code, message)
                } else {
                    write!(f, "RDAP error for '{}': {}", domain, message)
                }
            }
            Self::NoRecord { domain } => {
                write!(f, "No registration record for '{}'", domain)
            }
            Self::DnsError { host, message } => {
                write!(f, "DNS error for '{}': {}", host, message)
            }
            Self::ParseError { message, content: _ } => {
                write!(f, "Parse error: {}", message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::RateLimited { service, message } => {
                write!(f, "Rate limited by {}: {}", service, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for DittoError {}

impl From<reqwest::Error> for DittoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("HTTP request timed out", err.to_string())
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for DittoError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: format!("JSON parsing failed: {}", err),
            content: None,
        }
    }
}

impl From<csv::Error> for DittoError {
    fn from(err: csv::Error) -> Self {
        Self::ParseError {
            message: format!("CSV error: {}", err),
            content: None,
        }
    }
}

impl From<toml::de::Error> for DittoError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}

impl From<std::io::Error> for DittoError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
