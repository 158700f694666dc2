//! Request identity keys.

use sha2::{Digest, Sha256};

/// Compute the lookup key for a request identity.
///
/// The identity is the method plus the full URL including the query string.
/// Headers never participate. The method is upper-cased so `get` and `GET`
/// address the same entry.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", "https://example.com/app.css");
        let hash2 = compute_cache_key("GET", "https://example.com/app.css");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_method_case_insensitive() {
        assert_eq!(
            compute_cache_key("get", "https://example.com/"),
            compute_cache_key("GET", "https://example.com/")
        );
    }

    #[test]
    fn test_hash_different_method() {
        let get = compute_cache_key("GET", "https://example.com/api/x");
        let head = compute_cache_key("HEAD", "https://example.com/api/x");
        assert_ne!(get, head);
    }

    #[test]
    fn test_hash_query_is_part_of_identity() {
        let plain = compute_cache_key("GET", "https://images.unsplash.com/photo-1");
        let sized = compute_cache_key("GET", "https://images.unsplash.com/photo-1?w=400");
        assert_ne!(plain, sized);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", "https://example.com");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
