//! Opaque session-token helpers.
//!
//! DESIGN
//! ======
//! Mock tokens look like `<prefix>_<issued_ms>_<suffix>`: the second
//! underscore-delimited segment carries the issue time in milliseconds since
//! the Unix epoch, which is all the expiry check ever reads. The format is a
//! demonstration contract only; a real backend hands out tokens the store
//! treats as fully opaque.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;

/// Mock token lifetime used when no override is configured.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

const SUFFIX_LEN: usize = 9;
const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

/// Mint a mock token stamped with `issued_at_ms`.
///
/// `prefix` must not contain `_`, otherwise the timestamp would no longer be
/// the second segment.
#[must_use]
pub fn mint_token(prefix: &str, issued_at_ms: i64) -> String {
    debug_assert!(!prefix.contains('_'), "token prefix must not contain '_'");
    format!("{prefix}_{issued_at_ms}_{}", random_suffix())
}

fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

/// Issue timestamp encoded in a mock token, if it has one.
#[must_use]
pub fn issued_at_ms(token: &str) -> Option<i64> {
    token.split('_').nth(1)?.parse().ok()
}

/// Whether `token` is older than `ttl` at `now_ms`.
///
/// Tokens without a readable timestamp count as expired.
#[must_use]
pub fn is_token_expired(token: &str, now_ms: i64, ttl: Duration) -> bool {
    let Some(issued) = issued_at_ms(token) else {
        return true;
    };
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    now_ms.saturating_sub(issued) > ttl_ms
}

/// `Authorization` header pair carrying `token` as a bearer credential.
#[must_use]
pub fn bearer_header(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}
