//! Network protocols used by a walk.
//!
//! This module contains the NSEC query transport and the HTTP client for the
//! public resolver reliability feed.

/// NSEC queries over DNS
pub mod nsec;

/// Resolver reliability feed
pub mod feed;

// Re-export commonly used functions and types
pub use feed::{fetch_resolver_feed, parse_resolver_feed};
pub use nsec::{build_nsec_query, parse_nsec_response, NsecTransport, UdpNsecTransport};
