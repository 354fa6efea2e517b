//! Shared trait abstractions for common patterns
//!
//! Everything that goes through the content cache implements [`CacheValue`],
//! which ties serialization to the shape check applied on read and write.

use serde::{de::DeserializeOwned, Serialize};

/// A unit of generated content that can be cached.
///
/// `is_valid` is the structural shape check: an entry that fails it is never
/// written, and is discarded as corrupt when read back.
pub trait CacheValue: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn is_valid(&self) -> bool;
}

impl<T> CacheValue for Vec<T>
where
    T: CacheValue,
{
    fn is_valid(&self) -> bool {
        !self.is_empty() && self.iter().all(CacheValue::is_valid)
    }
}

impl CacheValue for String {
    fn is_valid(&self) -> bool {
        !self.trim().is_empty()
    }
}

/// Trait for cache operations statistics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_validity() {
        let empty: Vec<String> = vec![];
        assert!(!empty.is_valid());
        assert!(vec!["a".to_string()].is_valid());
        assert!(!vec!["a".to_string(), " ".to_string()].is_valid());
    }

    #[test]
    fn test_hit_rate() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            size: 2,
        };
        assert_eq!(stats.hit_rate(), 0.75);
    }
}
