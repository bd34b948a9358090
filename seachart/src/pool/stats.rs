//! Connection pool statistics.

use std::fmt;

/// Snapshot of the Tier-2 pool.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoolStats {
    /// Open handles.
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Failed opens and queries.
    pub errors: u64,
}

impl PoolStats {
    /// Fraction of handle lookups served by an already-open handle.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} open, {} hits, {} misses ({:.1}% hit rate), {} evictions, {} errors",
            self.size,
            self.max_size,
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.evictions,
            self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        assert_eq!(PoolStats::default().hit_rate(), 0.0);
        let stats = PoolStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_display() {
        let stats = PoolStats {
            size: 2,
            max_size: 10,
            hits: 1,
            misses: 1,
            evictions: 0,
            errors: 0,
        };
        assert_eq!(
            stats.to_string(),
            "2/10 open, 1 hits, 1 misses (50.0% hit rate), 0 evictions, 0 errors"
        );
    }
}
