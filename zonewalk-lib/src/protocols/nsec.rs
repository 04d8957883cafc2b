//! NSEC queries against a single resolver.
//!
//! [`NsecTransport`] is the seam between the walker and the network: it sends
//! one NSEC question to one resolver and returns the next-domain names of the
//! NSEC records in the answer section. [`UdpNsecTransport`] is the real
//! implementation; tests substitute their own.

use crate::error::ZoneWalkError;
use crate::types::Endpoint;
use domain::base::iana::Rtype;
use domain::base::name::{Name, ParsedName};
use domain::base::{Message, MessageBuilder};
use domain::rdata::Nsec;
use std::future::Future;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;

/// Largest UDP payload we accept.
const MAX_DATAGRAM: usize = 65_535;

/// RCODE values that mean the resolver could not help us.
const RCODE_SERVFAIL: u8 = 2;
const RCODE_REFUSED: u8 = 5;

/// Sends NSEC queries.
///
/// Implementations must be shareable between worker tasks. A returned error
/// is handed to the retry policy, so failures worth retrying against another
/// resolver should map to a retryable [`ZoneWalkError`].
pub trait NsecTransport: Send + Sync + 'static {
    /// Query `domain` (canonical, fully qualified) for NSEC at `resolver`
    /// and return the next-domain name of every NSEC record in the answer.
    fn query_nsec(
        &self,
        domain: &str,
        resolver: Endpoint,
    ) -> impl Future<Output = Result<Vec<String>, ZoneWalkError>> + Send;
}

/// NSEC queries over plain UDP, one socket per query.
#[derive(Debug, Clone)]
pub struct UdpNsecTransport {
    timeout: Duration,
}

impl UdpNsecTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn exchange(&self, domain: &str, resolver: Endpoint) -> Result<Vec<String>, ZoneWalkError> {
        let request = build_nsec_query(domain)?;

        let local: SocketAddr = if resolver.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(resolver).await?;
        socket.send(request.as_octets().as_slice()).await?;

        let deadline = Instant::now() + self.timeout;
        let mut buf = vec![0u8; MAX_DATAGRAM];

        // Stray or mismatched datagrams are ignored until the deadline.
        loop {
            let len = match tokio::time::timeout_at(deadline, socket.recv(&mut buf)).await {
                Ok(received) => received?,
                Err(_) => return Err(ZoneWalkError::timeout("NSEC query", self.timeout)),
            };

            let response = match Message::from_octets(buf[..len].to_vec()) {
                Ok(response) => response,
                Err(_) => continue,
            };
            if !response.is_answer(&request) {
                continue;
            }

            return parse_nsec_response(&response, domain, resolver);
        }
    }
}

impl NsecTransport for UdpNsecTransport {
    async fn query_nsec(&self, domain: &str, resolver: Endpoint) -> Result<Vec<String>, ZoneWalkError> {
        self.exchange(domain, resolver).await
    }
}

/// Build a recursive NSEC query for `domain`.
pub fn build_nsec_query(domain: &str) -> Result<Message<Vec<u8>>, ZoneWalkError> {
    let qname = Name::<Vec<u8>>::vec_from_str(domain)
        .map_err(|e| ZoneWalkError::invalid_domain(domain, e.to_string()))?;

    let mut builder = MessageBuilder::new_vec();
    builder.header_mut().set_rd(true);
    builder.header_mut().set_random_id();

    let mut builder = builder.question();
    builder
        .push((qname, Rtype::NSEC))
        .map_err(|_| ZoneWalkError::invalid_domain(domain, "name does not fit in a DNS message"))?;

    Ok(builder.into_message())
}

/// Extract the next-domain names from the NSEC records of a response.
///
/// SERVFAIL and REFUSED are treated as resolver failures so that the retry
/// policy moves on to another server. Any other response code is an answer;
/// it simply may not carry NSEC records, which ends the chain.
pub fn parse_nsec_response(
    response: &Message<Vec<u8>>,
    domain: &str,
    resolver: Endpoint,
) -> Result<Vec<String>, ZoneWalkError> {
    let rcode = response.header().rcode().to_int();
    if rcode == RCODE_SERVFAIL || rcode == RCODE_REFUSED {
        return Err(ZoneWalkError::dns(
            domain,
            resolver,
            format!("resolver answered with {}", response.header().rcode()),
        ));
    }

    let answer = response
        .answer()
        .map_err(|_| ZoneWalkError::dns(domain, resolver, "malformed answer section"))?;

    let mut next_names = Vec::new();
    for record in answer.limit_to::<Nsec<_, ParsedName<_>>>() {
        let record =
            record.map_err(|_| ZoneWalkError::dns(domain, resolver, "malformed NSEC record"))?;
        next_names.push(record.data().next_name().to_string());
    }

    Ok(next_names)
}
