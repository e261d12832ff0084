//! Anonymous token candidates.
//!
//! Tokens stand in for login-based identity: a participant reaches the
//! annotator through a link containing their token. Uniqueness is checked
//! against the store by the caller; this module only draws candidates.

use rand::Rng;

/// Number of alphanumeric characters in a token.
pub const TOKEN_LENGTH: usize = 8;

/// Upper bound on candidate draws before giving up.
pub const MAX_TOKEN_ATTEMPTS: usize = 100;

/// Longest token accepted on lookup (matches the column width).
pub const MAX_TOKEN_LEN: usize = 128;

/// Draw a random alphanumeric token candidate.
pub fn generate_candidate() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Whether `token` could have been issued by this system.
///
/// Lookups short-circuit on malformed input instead of querying the store.
pub fn is_well_formed(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_TOKEN_LEN
        && token.chars().all(|c| c.is_ascii_alphanumeric())
}
