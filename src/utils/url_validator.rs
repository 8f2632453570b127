//! Submitted-URL validation
//!
//! Only absolute http(s) URLs may be shortened. Script-capable schemes are
//! called out explicitly so the rejection message tells the client the URL
//! was blocked rather than merely unsupported.

use url::Url;

use crate::errors::{Result, ShortgateError};

/// Schemes that would turn a redirect into a script or local-file vector.
const BLOCKED_SCHEMES: &[&str] = &["javascript", "data", "file", "vbscript", "about", "blob"];

pub fn validate_url(raw: &str) -> Result<()> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ShortgateError::validation("url must not be empty"));
    }

    let parsed = Url::parse(raw)
        .map_err(|e| ShortgateError::validation(format!("url is not parseable: {}", e)))?;

    // `Url::parse` lowercases the scheme, so the checks below need no
    // case folding of their own.
    let scheme = parsed.scheme();
    if BLOCKED_SCHEMES.contains(&scheme) {
        return Err(ShortgateError::validation(format!(
            "{}: urls are blocked",
            scheme
        )));
    }

    match scheme {
        "http" | "https" => Ok(()),
        other => Err(ShortgateError::validation(format!(
            "unsupported scheme {}:, only http and https urls can be shortened",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_and_https_pass() {
        for url in [
            "http://example.com",
            "https://example.com",
            "https://example.com/a/b?query=1#frag",
            "http://localhost:8080",
            "HTTPS://EXAMPLE.COM/PATH",
        ] {
            assert!(validate_url(url).is_ok(), "should accept {}", url);
        }
    }

    #[test]
    fn test_blocked_schemes_name_the_scheme() {
        for (url, scheme) in [
            ("javascript:alert(1)", "javascript"),
            ("JavaScript:alert(1)", "javascript"),
            ("data:text/html,<script>alert(1)</script>", "data"),
            ("file:///etc/passwd", "file"),
        ] {
            let err = validate_url(url).expect_err("must be blocked");
            assert!(matches!(err, ShortgateError::Validation(_)));
            assert!(
                err.message().contains(scheme),
                "message should name {}: {}",
                scheme,
                err
            );
        }
    }

    #[test]
    fn test_other_schemes_are_unsupported() {
        for url in ["ftp://example.com", "mailto:a@example.com", "ssh://host"] {
            let err = validate_url(url).expect_err("must be rejected");
            assert!(err.message().contains("unsupported scheme"), "{}", err);
        }
    }

    #[test]
    fn test_empty_and_garbage_input() {
        assert!(validate_url("").is_err());
        assert!(validate_url("   ").is_err());
        assert!(validate_url("not a url").is_err());
        assert!(validate_url("example.com/no-scheme").is_err());
    }

    #[test]
    fn test_surrounding_whitespace_is_tolerated() {
        assert!(validate_url("  https://example.com  ").is_ok());
    }
}
