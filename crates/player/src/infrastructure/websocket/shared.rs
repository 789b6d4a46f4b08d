//! Shared helpers for the game socket.
//!
//! Runtime-agnostic so both the connection manager and the tokio adapter can
//! use them.

use url::Url;

// Reconnection defaults (one fixed interval, as the server expects)
pub const INITIAL_RETRY_DELAY_MS: u64 = 3_000;
pub const MAX_RETRY_DELAY_MS: u64 = 30_000;
pub const BACKOFF_MULTIPLIER: f64 = 1.0;

/// Query parameter carrying the bearer token on the connect URI.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Build the connect URI: `base` with `?token=<token>` appended.
///
/// An existing `token` parameter on `base` is replaced; other parameters are kept.
pub fn build_connect_url(base: &Url, token: &str) -> Url {
    let mut url = base.clone();
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(k, _)| k != TOKEN_QUERY_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (k, v) in &kept {
            query.append_pair(k, v);
        }
        query.append_pair(TOKEN_QUERY_PARAM, token);
    }
    url
}
