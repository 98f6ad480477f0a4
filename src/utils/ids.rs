//! Collision-free identifiers for sandboxes and containers

use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

/// Source of raw time-ordered UUIDs
pub type UuidSource = Box<dyn Fn() -> Uuid + Send + Sync>;

/// Generates identifiers that never repeat back to back.
///
/// The raw source may have coarse time resolution and hand out the same
/// value twice in quick succession, so every draw is compared against the
/// previous result under one lock and redrawn until it differs.
pub struct IdGenerator {
    source: UuidSource,
    last: Mutex<Option<Uuid>>,
}

impl IdGenerator {
    /// Create a generator backed by UUIDv7
    pub fn new() -> Self {
        Self::with_source(Box::new(Uuid::now_v7))
    }

    /// Create a generator backed by a custom source
    pub fn with_source(source: UuidSource) -> Self {
        Self {
            source,
            last: Mutex::new(None),
        }
    }

    /// Draw the next identifier
    pub fn next_id(&self) -> String {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);

        let mut id = (self.source)();
        while *last == Some(id) {
            id = (self.source)();
        }
        *last = Some(id);

        id.to_string()
    }

    /// Unique resource name for a benchmark, e.g. `Benchmark-performance.cpu.time-<uuid>`
    pub fn benchmark_id(&self, benchmark_name: &str) -> String {
        format!("Benchmark-{}-{}", benchmark_name, self.next_id())
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdGenerator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Source that repeats every value `repeat` times, like a clock that
    /// only ticks every few reads.
    fn coarse_source(repeat: u64) -> UuidSource {
        let reads = AtomicU64::new(0);
        Box::new(move || {
            let tick = reads.fetch_add(1, Ordering::SeqCst) / repeat;
            Uuid::from_u128(tick as u128)
        })
    }

    #[test]
    fn test_successive_ids_are_distinct() {
        let generator = IdGenerator::new();
        let ids: HashSet<String> = (0..1000).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_coarse_source_never_repeats() {
        let generator = IdGenerator::with_source(coarse_source(4));
        let ids: Vec<String> = (0..50).map(|_| generator.next_id()).collect();

        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        // Order follows the underlying clock
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_concurrent_callers_get_distinct_ids() {
        let generator = Arc::new(IdGenerator::with_source(coarse_source(3)));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || (0..100).map(|_| generator.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(all.insert(id));
            }
        }
        assert_eq!(all.len(), 400);
    }

    #[test]
    fn test_benchmark_id_format() {
        let generator = IdGenerator::with_source(Box::new(|| Uuid::from_u128(7)));
        let id = generator.benchmark_id("operations.container.lifecycle");
        assert!(id.starts_with("Benchmark-operations.container.lifecycle-"));
    }
}
