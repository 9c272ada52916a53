//! Cache key normalization shared by every cache layer

use crate::cache::types::CacheKey;

/// Derive the canonical cache key for a free-text query.
///
/// Trims surrounding whitespace and lowercases. No other folding is
/// applied: "¿Hola?" and "hola" are different keys, as are accented and
/// unaccented spellings.
pub fn normalize_key(text: &str) -> CacheKey {
    text.trim().to_lowercase()
}
