//! Cross-chain loop detection.

use crate::utils::canonicalize_domain;
use dashmap::DashSet;
use std::sync::Arc;

/// Concurrency-safe set of canonical domain names.
///
/// Cloning is cheap and every clone shares the same underlying set. The set
/// only grows: there is no way to remove a name once it has been claimed.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    names: Arc<DashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim `name`.
    ///
    /// Returns `true` if the name was not present and is now marked, `false`
    /// if some chain already claimed it. Among any number of concurrent
    /// callers for the same name exactly one gets `true`.
    pub fn check_and_mark(&self, name: &str) -> bool {
        self.names.insert(canonicalize_domain(name))
    }

    /// Whether `name` has been claimed.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&canonicalize_domain(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_check_and_mark_once() {
        let visited = VisitedSet::new();
        assert!(visited.check_and_mark("example.com."));
        assert!(!visited.check_and_mark("example.com."));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_variants_share_one_entry() {
        let visited = VisitedSet::new();
        assert!(visited.check_and_mark("WWW.Example.com"));
        assert!(!visited.check_and_mark("www.example.com."));
        assert!(visited.contains("www.EXAMPLE.com"));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let visited = VisitedSet::new();
        let other = visited.clone();
        assert!(visited.check_and_mark("a.example."));
        assert!(!other.check_and_mark("a.example."));
        assert!(other.contains("a.example."));
    }

    #[test]
    fn test_concurrent_claims_have_single_winner() {
        let visited = VisitedSet::new();
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let visited = visited.clone();
                let winners = winners.clone();
                std::thread::spawn(move || {
                    for i in 0..1000 {
                        if visited.check_and_mark(&format!("host{}.example.", i)) {
                            winners.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::Relaxed), 1000);
        assert_eq!(visited.len(), 1000);
    }

    #[test]
    fn test_scales_to_large_zones() {
        let visited = VisitedSet::new();
        for i in 0..200_000 {
            assert!(visited.check_and_mark(&format!("n{}.zone.", i)));
        }
        assert_eq!(visited.len(), 200_000);
        assert!(!visited.check_and_mark("n199999.zone."));
    }
}
