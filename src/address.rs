//! Destination-address parsing.
//!
//! Outbound requests carry a free-form address string. Two shapes are
//! accepted for Discord: an explicit `channel:<id>` prefix, or a bare
//! snowflake. Anything else means the webhook path is unavailable and the
//! caller falls back to the bot API.

use std::sync::LazyLock;

use regex::Regex;

/// Matches a bare Discord snowflake (17–20 decimal digits).
static SNOWFLAKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{17,20}$").expect("snowflake pattern is valid"));

/// Extract a Discord channel ID from a destination address.
///
/// Accepts `channel:<id>` (remainder trimmed) or a bare 17–20 digit
/// snowflake. Returns `None` for any other shape; this is not an error,
/// it just means no webhook lookup is possible for the address.
pub fn resolve_channel_id(address: &str) -> Option<String> {
    if let Some(rest) = address.strip_prefix("channel:") {
        let id = rest.trim();
        if id.is_empty() {
            return None;
        }
        return Some(id.to_owned());
    }

    let trimmed = address.trim();
    if SNOWFLAKE.is_match(trimmed) {
        return Some(trimmed.to_owned());
    }

    None
}
