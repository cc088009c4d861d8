//! Fixed-size partitioning for request-capped annotation APIs.

use std::num::NonZeroUsize;

/// Per-request annotation limit of the GitHub check-runs API.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// A non-zero batch size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(NonZeroUsize);

impl BatchSize {
    /// Returns `None` for zero.
    pub fn new(size: usize) -> Option<Self> {
        NonZeroUsize::new(size).map(Self)
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self(NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

/// Split `items` into contiguous, ordered batches of at most `size` items.
///
/// Yields `ceil(len / size)` batches; an empty input yields none.
pub fn batch<T>(items: &[T], size: BatchSize) -> Vec<&[T]> {
    items.chunks(size.get()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: usize) -> BatchSize {
        BatchSize::new(n).expect("non-zero")
    }

    #[test]
    fn test_batch_120_by_50() {
        let items: Vec<usize> = (0..120).collect();
        let batches = batch(&items, size(50));

        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![50, 50, 20]);

        let flattened: Vec<usize> = batches.concat();
        assert_eq!(flattened, items);
    }

    #[test]
    fn test_batch_empty_yields_no_batches() {
        let items: Vec<u8> = Vec::new();
        assert!(batch(&items, BatchSize::default()).is_empty());
    }

    #[test]
    fn test_batch_single_batch_when_under_limit() {
        let items = vec!['a', 'b', 'c'];
        let batches = batch(&items, size(50));
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], &['a', 'b', 'c'][..]);
    }

    #[test]
    fn test_batch_exact_multiple() {
        let items: Vec<usize> = (0..100).collect();
        let batches = batch(&items, size(50));
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 50));
    }

    #[test]
    fn test_batch_count_is_ceiling() {
        for n in 0..=23 {
            let items: Vec<usize> = (0..n).collect();
            let batches = batch(&items, size(5));
            assert_eq!(batches.len(), n.div_ceil(5), "n = {}", n);
        }
    }

    #[test]
    fn test_batch_size_rejects_zero() {
        assert!(BatchSize::new(0).is_none());
        assert_eq!(BatchSize::default().get(), DEFAULT_BATCH_SIZE);
    }
}
