pub mod ip;
pub mod url_validator;

/// URL-safe alphabet for short identifiers. 64 symbols, so a 6-character
/// id has 64^6 (~6.9e10) possible values.
const SHORT_ID_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Default short identifier length.
pub const SHORT_ID_LENGTH: usize = 6;

/// Generate a random URL-safe short identifier of the given length.
pub fn generate_short_id(length: usize) -> String {
    use std::iter;

    iter::repeat_with(|| SHORT_ID_CHARS[rand::random_range(0..SHORT_ID_CHARS.len())] as char)
        .take(length)
        .collect()
}

/// Check whether a path segment looks like a short identifier.
///
/// Garbage paths (favicon requests, traversal attempts, overly long
/// segments) are rejected here before any storage lookup happens.
pub fn is_valid_short_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
