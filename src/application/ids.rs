use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic id source for one table, seeded from the store's highest
/// existing id at startup so restarts never reuse ids.
pub(crate) struct IdSeq(AtomicU64);

impl IdSeq {
    pub fn starting_after(last: u64) -> Self {
        Self(AtomicU64::new(last))
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_continue_after_seed() {
        let seq = IdSeq::starting_after(41);
        assert_eq!(seq.next(), 42);
        assert_eq!(seq.next(), 43);
    }
}
