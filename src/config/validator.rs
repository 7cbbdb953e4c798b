//! Identifier and id validation applied before any string reaches query text.

use regex::Regex;
use std::sync::OnceLock;

/// Unquoted PostgreSQL identifier, at most 63 bytes.
fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier pattern"))
}

pub fn is_valid_identifier(name: &str) -> bool {
    identifier_re().is_match(name)
}

/// Parse a path id: ASCII digits only, must fit in i64.
pub fn parse_numeric_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
