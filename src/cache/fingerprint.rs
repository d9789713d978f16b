//! Request fingerprints used as cache keys

use std::fmt::Display;

use serde_json::json;
use sha2::{Digest, Sha256};

/// Computes the cache key for an endpoint and its parameters
///
/// Parameters are sorted by name (then value) before hashing, so insertion
/// order never changes the key. Values go through `Display`, so callers must
/// use one canonical string form per logical value (see `ParamValue`).
pub fn generate_key<I, K, V>(endpoint: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Display,
{
    let mut pairs: Vec<(String, String)> = params
        .into_iter()
        .map(|(name, value)| (name.as_ref().to_string(), value.to_string()))
        .collect();
    pairs.sort();

    let canonical = json!({
        "endpoint": endpoint,
        "params": pairs,
    })
    .to_string();

    hex::encode(Sha256::digest(canonical.as_bytes()))
}
