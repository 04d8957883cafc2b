//! Seed ingestion.
//!
//! Reads candidate seed names line by line, drops duplicates and junk, pairs
//! each seed with a resolver and pushes it into a running dispatcher.

use crate::concurrent::DispatchHandle;
use crate::error::ZoneWalkError;
use crate::resolvers::ResolverPool;
use crate::types::{IngestSummary, Task};
use crate::utils::{canonicalize_domain, validate_domain};
use std::collections::HashSet;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

/// Stream seeds from `reader` into `handle`.
///
/// Blank lines and lines starting with `#` are ignored. Seeds are compared
/// after canonicalization, so `Example.com` and `example.com.` count as the
/// same seed. Submitting blocks while the dispatcher queue is full.
///
/// # Errors
///
/// Returns `ZoneWalkError::InputError` if reading fails. Seeds submitted
/// before the failure stay queued and are walked normally.
pub async fn ingest_seeds<R>(
    reader: R,
    pool: &ResolverPool,
    handle: &DispatchHandle,
) -> Result<IngestSummary, ZoneWalkError>
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = IngestSummary::default();
    let mut seen = HashSet::new();
    let mut lines = reader.lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| ZoneWalkError::input(format!("failed to read seed input: {}", e)))?
    {
        summary.lines += 1;

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Err(e) = validate_domain(trimmed) {
            warn!("Skipping seed: {}", e);
            summary.invalid += 1;
            continue;
        }

        let domain = canonicalize_domain(trimmed);
        if !seen.insert(domain.clone()) {
            summary.duplicates += 1;
            continue;
        }

        debug!(seed = %domain, "queueing seed");
        handle.submit(Task::new(domain, pool.pick_random())).await?;
        summary.submitted += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrent::Dispatcher;
    use crate::protocols::NsecTransport;
    use crate::types::Endpoint;
    use crate::walker::ZoneWalker;
    use std::io;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll};
    use tokio::io::{AsyncRead, BufReader, ReadBuf};
    use tokio::sync::mpsc;

    /// Records every queried seed; every name is a dead end.
    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl NsecTransport for Recorder {
        async fn query_nsec(&self, domain: &str, _resolver: Endpoint) -> Result<Vec<String>, ZoneWalkError> {
            self.0.lock().unwrap().push(domain.to_string());
            Ok(Vec::new())
        }
    }

    fn setup() -> (Dispatcher<Recorder, mpsc::UnboundedSender<String>>, ResolverPool) {
        let (tx, _rx) = mpsc::unbounded_channel();
        let pool = ResolverPool::new(vec!["192.0.2.1:53".parse().unwrap()]).unwrap();
        let walker = Arc::new(ZoneWalker::new(Recorder::default(), pool.clone(), tx, 0));
        (Dispatcher::new(walker, 2), pool)
    }

    #[tokio::test]
    async fn test_dedups_and_lowercases() {
        let (dispatcher, pool) = setup();
        let handle = dispatcher.start();

        let input = "Example.com\nexample.com\n\n# comment\nEXAMPLE.COM.\nother.org\n";
        let summary = ingest_seeds(input.as_bytes(), &pool, &handle).await.unwrap();
        handle.finish().await.unwrap();

        assert_eq!(summary.lines, 6);
        assert_eq!(summary.submitted, 2);
        assert_eq!(summary.duplicates, 2);
        assert_eq!(summary.invalid, 0);

        let mut queried = dispatcher.walker().transport().0.lock().unwrap().clone();
        queried.sort();
        assert_eq!(queried, vec!["example.com.".to_string(), "other.org.".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_seeds_are_skipped() {
        let (dispatcher, pool) = setup();
        let handle = dispatcher.start();

        let input = "bad..name\nhas space.com\nok.example\n";
        let summary = ingest_seeds(input.as_bytes(), &pool, &handle).await.unwrap();
        handle.finish().await.unwrap();

        assert_eq!(summary.invalid, 2);
        assert_eq!(summary.submitted, 1);
    }

    /// Yields some bytes, then fails.
    struct Broken {
        sent: bool,
    }

    impl AsyncRead for Broken {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.sent {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "disk on fire")));
            }
            self.sent = true;
            buf.put_slice(b"first.example\n");
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_read_error_keeps_submitted_work() {
        let (dispatcher, pool) = setup();
        let handle = dispatcher.start();

        let reader = BufReader::new(Broken { sent: false });
        let err = ingest_seeds(reader, &pool, &handle).await.unwrap_err();
        assert!(matches!(err, ZoneWalkError::InputError { .. }));

        let summary = handle.finish().await.unwrap();
        assert_eq!(summary.chains, 1);
        assert_eq!(
            *dispatcher.walker().transport().0.lock().unwrap(),
            vec!["first.example.".to_string()]
        );
    }
}
