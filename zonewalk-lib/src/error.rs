//! Error handling for zone walking operations.
//!
//! This module defines a single error type that covers every way a walk can
//! fail, from an unreachable resolver to an unusable resolver feed or a
//! broken input stream.

use std::fmt;
use std::net::SocketAddr;

/// Main error type for zone walking operations.
///
/// Resolver communication failures (`NetworkError`, `Timeout`, `DnsError`)
/// are recoverable and feed the retry policy. Everything else is either a
/// startup failure or a problem with the seed input.
#[derive(Debug, Clone)]
pub enum ZoneWalkError {
    /// Invalid domain name format
    InvalidDomain { domain: String, reason: String },

    /// Network-related errors (connection refused, socket errors, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// Timeout errors when a resolver does not answer in time
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },

    /// The resolver answered, but the answer is unusable
    DnsError {
        domain: String,
        resolver: SocketAddr,
        message: String,
    },

    /// Fetching the resolver reliability feed failed
    FeedError {
        url: String,
        message: String,
        status_code: Option<u16>,
    },

    /// Resolver feed or other structured input could not be parsed
    ParseError {
        message: String,
        content: Option<String>,
    },

    /// Configuration errors (invalid settings, etc.)
    ConfigError { message: String },

    /// File I/O errors when reading configuration
    FileError { path: String, message: String },

    /// The seed input stream failed
    InputError { message: String },

    /// No resolver is left to query
    EmptyResolverPool,

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl ZoneWalkError {
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

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new DNS response error.
    pub fn dns<D: Into<String>, M: Into<String>>(domain: D, resolver: SocketAddr, message: M) -> Self {
        Self::DnsError {
            domain: domain.into(),
            resolver,
            message: message.into(),
        }
    }

    /// Create a new resolver feed error.
    pub fn feed<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::FeedError {
            url: url.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a new resolver feed error with HTTP status code.
    pub fn feed_with_status<U: Into<String>, M: Into<String>>(
        url: U,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::FeedError {
            url: url.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::ParseError {
            message: message.into(),
            content: None,
        }
    }

    /// Create a new parse error carrying the offending content.
    pub fn parse_with_content<M: Into<String>, C: Into<String>>(message: M, content: C) -> Self {
        Self::ParseError {
            message: message.into(),
            content: Some(content.into()),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
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

    /// Create a new input stream error.
    pub fn input<M: Into<String>>(message: M) -> Self {
        Self::InputError {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error suggests the query should be retried against
    /// another resolver.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::Timeout { .. } | Self::DnsError { .. }
        )
    }
}

impl fmt::Display for ZoneWalkError {
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
            Self::Timeout { operation, duration } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::DnsError {
                domain,
                resolver,
                message,
            } => {
                write!(f, "DNS error for '{}' from {}: {}", domain, resolver, message)
            }
            Self::FeedError {
                url,
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "Resolver feed error for '{}' (HTTP {}): {}", url, code, message)
                } else {
                    write!(f, "Resolver feed error for '{}': {}", url, message)
                }
            }
            Self::ParseError { message, content } => {
                if let Some(content) = content {
                    write!(f, "Parse error: {} (near '{}')", message, content)
                } else {
                    write!(f, "Parse error: {}", message)
                }
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::InputError { message } => {
                write!(f, "Input error: {}", message)
            }
            Self::EmptyResolverPool => {
                write!(f, "No usable DNS resolvers available")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ZoneWalkError {}

impl From<reqwest::Error> for ZoneWalkError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|url| url.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());

        if let Some(status) = err.status() {
            Self::feed_with_status(url, err.to_string(), status.as_u16())
        } else if err.is_timeout() {
            Self::feed(url, "request timed out")
        } else if err.is_connect() {
            Self::feed(url, format!("connection failed: {}", err))
        } else {
            Self::feed(url, format!("request failed: {}", err))
        }
    }
}

impl From<std::io::Error> for ZoneWalkError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::TimedOut {
            Self::timeout("socket I/O", std::time::Duration::ZERO)
        } else {
            Self::network_with_source("socket I/O failed", err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_resolver_failures_are_retryable() {
        let resolver: SocketAddr = "192.0.2.1:53".parse().unwrap();

        assert!(ZoneWalkError::network("refused").is_retryable());
        assert!(ZoneWalkError::timeout("NSEC query", Duration::from_secs(2)).is_retryable());
        assert!(ZoneWalkError::dns("example.com.", resolver, "SERVFAIL").is_retryable());

        assert!(!ZoneWalkError::invalid_domain("a..b", "empty label").is_retryable());
        assert!(!ZoneWalkError::EmptyResolverPool.is_retryable());
    }

    #[test]
    fn test_display_messages() {
        let err = ZoneWalkError::feed_with_status("https://feed", "not found", 404);
        assert_eq!(
            err.to_string(),
            "Resolver feed error for 'https://feed' (HTTP 404): not found"
        );

        let err = ZoneWalkError::parse_with_content("too few columns", "1.2.3.4,x");
        assert_eq!(
            err.to_string(),
            "Parse error: too few columns (near '1.2.3.4,x')"
        );
    }
}
