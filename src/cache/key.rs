//! Cache key generation using SHA-256 hashes

use sha2::{Digest, Sha256};

/// Deterministic key for one upstream request.
///
/// `scope` separates otherwise identical requests made against different
/// base URLs or vehicle kinds. Parameters are hashed in order: they are
/// positional path segments, not a query string.
pub fn cache_key(endpoint: &str, scope: &str, params: &[&str]) -> String {
    let mut hasher = Sha256::new();

    hasher.update(endpoint.as_bytes());
    hasher.update(b"|");
    hasher.update(scope.as_bytes());
    hasher.update(b"|");

    for param in params {
        hasher.update(param.as_bytes());
        hasher.update(b"/");
    }

    format!("{:x}", hasher.finalize())
}
