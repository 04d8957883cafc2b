//! The pool of resolvers a walk draws from.

use crate::error::ZoneWalkError;
use crate::protocols::feed::fetch_resolver_feed;
use crate::types::{Endpoint, WalkConfig};
use rand::Rng;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Port used when a resolver is given without one.
pub const DNS_PORT: u16 = 53;

/// Built-in resolvers used when the online feed is not requested.
const STATIC_RESOLVERS: &[&str] = &["1.1.1.1", "1.0.0.1", "8.8.8.8", "8.8.4.4", "9.9.9.9"];

/// Immutable, non-empty set of resolver endpoints.
///
/// Selection is stateless: every call draws independently from a
/// thread-local RNG that is seeded from the OS, so repeated runs do not
/// converge on the same server.
#[derive(Debug, Clone)]
pub struct ResolverPool {
    endpoints: Arc<[Endpoint]>,
}

impl ResolverPool {
    /// Create a pool, refusing an empty list.
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self, ZoneWalkError> {
        if endpoints.is_empty() {
            return Err(ZoneWalkError::EmptyResolverPool);
        }
        Ok(Self {
            endpoints: endpoints.into(),
        })
    }

    /// Pool over the built-in fallback list.
    pub fn with_static() -> Self {
        Self {
            endpoints: load_static().into(),
        }
    }

    /// Build the pool a walk should use according to `config`.
    ///
    /// The online feed takes precedence, then user-configured resolvers,
    /// then the built-in list. Any failure here is fatal: no query may be
    /// sent without a usable pool.
    pub async fn from_config(config: &WalkConfig) -> Result<Self, ZoneWalkError> {
        let pool = if config.use_online_resolvers {
            let endpoints = load_from_feed(&config.feed_url, feed_timeout(config)).await?;
            Self::new(endpoints)?
        } else if let Some(servers) = &config.static_resolvers {
            Self::new(servers.clone())?
        } else {
            Self::with_static()
        };

        info!(resolvers = pool.len(), "resolver pool ready");
        Ok(pool)
    }

    /// Uniformly random endpoint.
    pub fn pick_random(&self) -> Endpoint {
        let index = rand::thread_rng().gen_range(0..self.endpoints.len());
        self.endpoints[index]
    }

    /// Uniformly random endpoint other than `previous`.
    ///
    /// With a single resolver there is nothing else to pick and the same
    /// endpoint comes back. The exclusion is by position, so a list holding
    /// the same address twice may still return it.
    pub fn pick_other(&self, previous: Endpoint) -> Endpoint {
        let len = self.endpoints.len();
        if len == 1 {
            return self.endpoints[0];
        }

        match self.endpoints.iter().position(|e| *e == previous) {
            Some(skip) => {
                let mut index = rand::thread_rng().gen_range(0..len - 1);
                if index >= skip {
                    index += 1;
                }
                self.endpoints[index]
            }
            None => self.pick_random(),
        }
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// The built-in fallback resolvers.
pub fn load_static() -> Vec<Endpoint> {
    STATIC_RESOLVERS
        .iter()
        .filter_map(|ip| ip.parse::<IpAddr>().ok())
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .collect()
}

/// Fetch the reliability feed at `url` and keep the fully reliable resolvers.
pub async fn load_from_feed(url: &str, timeout: Duration) -> Result<Vec<Endpoint>, ZoneWalkError> {
    fetch_resolver_feed(url, timeout).await
}

/// Parse a resolver given as `ip`, `ip:port` or `[ipv6]:port`.
pub fn parse_endpoint(value: &str) -> Result<Endpoint, ZoneWalkError> {
    let value = value.trim();

    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok(addr);
    }

    value
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .map_err(|_| ZoneWalkError::config(format!("Invalid resolver address '{}'", value)))
}

fn feed_timeout(config: &WalkConfig) -> Duration {
    // The feed is a few megabytes; give it far longer than a DNS query.
    (config.query_timeout * 15).max(Duration::from_secs(30))
}
