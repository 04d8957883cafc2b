//! Public resolver reliability feed.
//!
//! The feed is a CSV document with a header row. Column 0 holds the
//! resolver's IP address and column 9 its reliability as a decimal string.
//! Only resolvers with a reliability of exactly 1.00 are kept.

use crate::error::ZoneWalkError;
use crate::resolvers::DNS_PORT;
use crate::types::Endpoint;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::{debug, warn};

/// Column holding the resolver IP address.
const IP_COLUMN: usize = 0;

/// Column holding the reliability score.
const RELIABILITY_COLUMN: usize = 9;

/// Fetch the feed at `url` and return the fully reliable resolvers.
///
/// # Errors
///
/// Returns `ZoneWalkError::FeedError` if the feed cannot be fetched or the
/// server answers with a non-success status, and `ZoneWalkError::ParseError`
/// if the document is malformed.
pub async fn fetch_resolver_feed(url: &str, timeout: Duration) -> Result<Vec<Endpoint>, ZoneWalkError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ZoneWalkError::feed(url, format!("failed to create HTTP client: {}", e)))?;

    debug!(url, "fetching resolver feed");

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ZoneWalkError::feed_with_status(
            url,
            format!("unexpected status {}", status),
            status.as_u16(),
        ));
    }

    let body = response.text().await?;
    parse_resolver_feed(&body)
}

/// Parse a feed document into the list of fully reliable resolvers.
///
/// The first record is a header and is discarded. Quoted fields may hold
/// commas, doubled quotes and line breaks. Rows whose IP cannot be parsed
/// are skipped with a warning; a header or row with too few columns makes
/// the whole document invalid.
pub fn parse_resolver_feed(body: &str) -> Result<Vec<Endpoint>, ZoneWalkError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let columns = reader
        .headers()
        .map_err(|e| ZoneWalkError::parse(format!("invalid feed header: {}", e)))?
        .len();
    if columns == 0 {
        return Err(ZoneWalkError::parse("resolver feed is empty"));
    }
    if columns <= RELIABILITY_COLUMN {
        return Err(ZoneWalkError::parse(format!(
            "feed header has {} columns, expected at least {}",
            columns,
            RELIABILITY_COLUMN + 1
        )));
    }

    let mut endpoints = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ZoneWalkError::parse(format!("invalid feed row: {}", e)))?;
        let line_no = record.position().map(|p| p.line()).unwrap_or_default();

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let (Some(ip), Some(score)) = (record.get(IP_COLUMN), record.get(RELIABILITY_COLUMN)) else {
            return Err(ZoneWalkError::parse_with_content(
                format!(
                    "line {}: expected at least {} columns, found {}",
                    line_no,
                    RELIABILITY_COLUMN + 1,
                    record.len()
                ),
                record.iter().collect::<Vec<_>>().join(","),
            ));
        };

        if !is_fully_reliable(score) {
            continue;
        }

        match ip.trim().parse::<IpAddr>() {
            Ok(ip) => endpoints.push(SocketAddr::new(ip, DNS_PORT)),
            Err(_) => warn!(line = line_no, ip, "skipping resolver with invalid address"),
        }
    }

    Ok(endpoints)
}

/// `1.00`, written with at least one decimal and nothing but zeros after it.
fn is_fully_reliable(score: &str) -> bool {
    score
        .trim()
        .strip_prefix("1.")
        .is_some_and(|fraction| !fraction.is_empty() && fraction.bytes().all(|b| b == b'0'))
}
