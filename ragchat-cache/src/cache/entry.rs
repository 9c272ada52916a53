//! Cache entry management with TTL support

use std::time::Duration;
use tokio::time::Instant;

/// A cached value together with the instant it was stored.
///
/// Entries are never mutated in place: re-storing a key replaces the whole
/// entry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,

    /// When the entry was stored
    pub stored_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Create an entry stamped with the current instant
    pub fn new(value: V) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    /// Get the age of the entry
    pub fn age(&self) -> Duration {
        // saturating: a clock that appears to run backwards reads as age zero
        Instant::now().saturating_duration_since(self.stored_at)
    }

    /// An entry is expired once its age reaches the TTL
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_cache_entry_creation() {
        let entry = CacheEntry::new("test_value".to_string());

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.age(), Duration::ZERO);
        assert!(!entry.is_expired(Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expiration_boundary() {
        let entry = CacheEntry::new(vec![0.5_f32, 0.25]);
        let ttl = Duration::from_secs(60);

        tokio::time::advance(ttl - Duration::from_millis(1)).await;
        assert!(!entry.is_expired(ttl));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(entry.is_expired(ttl));
    }

    #[tokio::test(start_paused = true)]
    async fn test_age() {
        let entry = CacheEntry::new(1u8);

        tokio::time::advance(Duration::from_secs(42)).await;
        assert_eq!(entry.age(), Duration::from_secs(42));
    }
}
