//! # Zonewalk Library
//!
//! Enumerates the names of DNSSEC-signed zones by following NSEC chains.
//!
//! Each NSEC record names the next domain in the zone's canonical order, so
//! querying a name for NSEC and then querying the returned next name walks
//! the zone. Walks run concurrently behind a bounded worker pool, share one
//! visited set so that no name is queried or printed twice, and retry failed
//! queries against other resolvers from a pool.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use zonewalk_lib::{
//!     ingest_seeds, Dispatcher, ResolverPool, UdpNsecTransport, WalkConfig, ZoneWalker,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WalkConfig::default();
//!     let pool = ResolverPool::from_config(&config).await?;
//!
//!     let (names, mut found) = tokio::sync::mpsc::unbounded_channel();
//!     let transport = UdpNsecTransport::new(config.query_timeout);
//!     let walker = Arc::new(ZoneWalker::new(transport, pool.clone(), names, config.max_retries));
//!
//!     let dispatcher = Dispatcher::new(walker, config.concurrency);
//!     let handle = dispatcher.start();
//!     ingest_seeds("example.com\n".as_bytes(), &pool, &handle).await?;
//!     handle.finish().await?;
//!
//!     while let Ok(name) = found.try_recv() {
//!         println!("{}", name);
//!     }
//!     Ok(())
//! }
//! ```

// Re-export main public API types and functions
pub use concurrent::{DispatchHandle, Dispatcher};
pub use config::{
    load_env_config, parse_timeout_string, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
    ResolversConfig,
};
pub use error::ZoneWalkError;
pub use protocols::{
    build_nsec_query, fetch_resolver_feed, parse_nsec_response, parse_resolver_feed,
    NsecTransport, UdpNsecTransport,
};
pub use resolvers::{load_from_feed, load_static, parse_endpoint, ResolverPool, DNS_PORT};
pub use seeds::ingest_seeds;
pub use types::{
    ChainSummary, DispatchSummary, Endpoint, IngestSummary, Task, WalkConfig, WalkStatsSnapshot,
    DEFAULT_CONCURRENCY, DEFAULT_FEED_URL, DEFAULT_QUERY_TIMEOUT, DEFAULT_RETRIES,
    MAX_CONCURRENCY,
};
pub use utils::{canonicalize_domain, validate_domain};
pub use visited::VisitedSet;
pub use walker::{NameSink, WalkStats, ZoneWalker};

// Internal modules - these are not part of the public API
mod concurrent;
mod config;
mod error;
mod protocols;
mod resolvers;
mod seeds;
mod types;
mod utils;
mod visited;
mod walker;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ZoneWalkError>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
