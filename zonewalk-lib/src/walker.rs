//! The zone walker.
//!
//! A walk starts at a seed name, asks a resolver for the seed's NSEC record
//! and follows the next-domain pointer until the chain runs out, loops back
//! onto a visited name, or a resolver keeps failing past the retry budget.
//!
//! Every name is claimed in the shared [`VisitedSet`] before it is queried.
//! Discovered names are emitted at the moment they are claimed, so a name
//! reached by two chains is emitted by exactly one of them.

use crate::error::ZoneWalkError;
use crate::protocols::NsecTransport;
use crate::resolvers::ResolverPool;
use crate::types::{ChainSummary, Endpoint, Task, WalkStatsSnapshot};
use crate::utils::canonicalize_domain;
use crate::visited::VisitedSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Receives every discovered name, once.
pub trait NameSink: Send + Sync + 'static {
    fn emit(&self, name: &str);
}

impl NameSink for mpsc::UnboundedSender<String> {
    fn emit(&self, name: &str) {
        // A closed receiver means nobody is listening anymore.
        let _ = self.send(name.to_string());
    }
}

/// Counters shared by all chains of a walk.
#[derive(Debug, Default)]
pub struct WalkStats {
    queries: AtomicU64,
    failures: AtomicU64,
    discovered: AtomicU64,
    loops_detected: AtomicU64,
    abandoned: AtomicU64,
}

impl WalkStats {
    pub fn snapshot(&self) -> WalkStatsSnapshot {
        WalkStatsSnapshot {
            queries: self.queries.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            discovered: self.discovered.load(Ordering::Relaxed),
            loops_detected: self.loops_detected.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Walks NSEC chains.
///
/// One walker is shared by all workers of a dispatcher; it owns the
/// transport, the resolver pool, the visited set and the output sink.
pub struct ZoneWalker<T, S> {
    transport: T,
    pool: ResolverPool,
    visited: VisitedSet,
    sink: S,
    max_retries: u32,
    stats: WalkStats,
}

impl<T: NsecTransport, S: NameSink> ZoneWalker<T, S> {
    pub fn new(transport: T, pool: ResolverPool, sink: S, max_retries: u32) -> Self {
        Self::with_visited(transport, pool, VisitedSet::new(), sink, max_retries)
    }

    /// Create a walker over an existing visited set, e.g. to exclude names
    /// known in advance.
    pub fn with_visited(
        transport: T,
        pool: ResolverPool,
        visited: VisitedSet,
        sink: S,
        max_retries: u32,
    ) -> Self {
        Self {
            transport,
            pool,
            visited,
            sink,
            max_retries,
            stats: WalkStats::default(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn pool(&self) -> &ResolverPool {
        &self.pool
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn stats(&self) -> WalkStatsSnapshot {
        self.stats.snapshot()
    }

    /// Walk the chain starting at `task.domain`.
    ///
    /// The seed itself is never emitted; only names reached as a next-domain
    /// pointer are. The chain is followed iteratively so its length is not
    /// bounded by the stack.
    pub async fn walk(&self, task: Task) -> ChainSummary {
        let seed = canonicalize_domain(&task.domain);
        let mut summary = ChainSummary {
            seed: seed.clone(),
            ..Default::default()
        };

        if !self.visited.check_and_mark(&seed) {
            debug!(domain = %seed, "Loop detected, stopping recursion.");
            WalkStats::bump(&self.stats.loops_detected);
            summary.converged = true;
            return summary;
        }

        // Each entry is a claimed name still to be queried, with the
        // resolver pinned for its first attempt, if any.
        let mut pending: Vec<(String, Option<Endpoint>)> = vec![(seed, Some(task.resolver))];

        while let Some((name, pinned)) = pending.pop() {
            let next_names = match self.resolve(&name, pinned).await {
                Some(next_names) => next_names,
                None => {
                    summary.abandoned += 1;
                    continue;
                }
            };

            let mut claimed = Vec::new();
            for next in next_names {
                let next = canonicalize_domain(&next);
                if self.visited.check_and_mark(&next) {
                    trace!(domain = %name, next = %next, "claimed next name");
                    self.sink.emit(&next);
                    WalkStats::bump(&self.stats.discovered);
                    summary.discovered += 1;
                    claimed.push((next, None));
                } else {
                    debug!(domain = %next, "Loop detected, stopping recursion.");
                    WalkStats::bump(&self.stats.loops_detected);
                }
            }

            // Keep answer order when several NSEC records come back.
            pending.extend(claimed.into_iter().rev());
        }

        summary
    }

    /// Query `name` with the retry policy.
    ///
    /// Returns the next-domain names on success, or `None` once the retry
    /// budget is spent or the failure cannot be helped by another resolver.
    /// Every retry goes to a different resolver than the attempt before.
    async fn resolve(&self, name: &str, pinned: Option<Endpoint>) -> Option<Vec<String>> {
        let mut resolver = pinned.unwrap_or_else(|| self.pool.pick_random());
        let mut remaining = self.max_retries;

        loop {
            WalkStats::bump(&self.stats.queries);

            let err: ZoneWalkError = match self.transport.query_nsec(name, resolver).await {
                Ok(next_names) => return Some(next_names),
                Err(err) => err,
            };

            WalkStats::bump(&self.stats.failures);
            debug!(domain = %name, %resolver, error = %err, "Error querying DNS");

            if !err.is_retryable() {
                debug!(domain = %name, "Skipping, error is not retryable");
                break;
            }
            if remaining == 0 {
                debug!(domain = %name, "Max retries reached. Skipping");
                break;
            }

            remaining -= 1;
            resolver = self.pool.pick_other(resolver);
            debug!(domain = %name, %resolver, remaining, "Retrying with a different DNS server...");
        }

        WalkStats::bump(&self.stats.abandoned);
        None
    }
}
