//! Input normalization for twitter handles and tweet URLs, applied at the
//! boundaries (CLI input, enemy-creation endpoint) before records are stored.

use once_cell::sync::Lazy;
use regex::Regex;

static TWEET_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:twitter\.com|x\.com)/\w+/status/(\d+)").expect("tweet url pattern")
});

/// Pull the numeric status id out of a twitter.com / x.com tweet URL.
pub fn extract_tweet_id(url: &str) -> Option<&str> {
    TWEET_URL
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Strip a single leading `@` from a handle, then trim surrounding
/// whitespace. Records always store the bare handle.
pub fn clean_twitter_handle(handle: &str) -> String {
    handle.strip_prefix('@').unwrap_or(handle).trim().to_string()
}
