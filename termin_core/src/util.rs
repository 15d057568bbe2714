//! Small utilities shared across the extraction core.

use sha2::{Digest, Sha256};

/// Compute a stable hex digest for a duplicate-detection lock key.
///
/// Used to derive the row-level lock key `(chat_id, hash(title), date_bucket)`
/// that guards the duplicate-or-update transaction (see `termin_store`).
#[must_use]
pub fn lock_key_hash(chat_id: &str, title: &str, date_bucket: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(chat_id.as_bytes());
    hasher.update(b":");
    hasher.update(title.to_lowercase().as_bytes());
    hasher.update(b":");
    hasher.update(date_bucket.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Jaccard overlap of two token sets, used for title-similarity scoring in
/// the duplicate-or-update rule (validator rule 7).
#[must_use]
pub fn token_jaccard(a: &str, b: &str) -> f64 {
    use std::collections::HashSet;

    let tokens = |s: &str| -> HashSet<String> {
        s.to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    };
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() && tb.is_empty() {
        return 1.0;
    }
    let intersection = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}
