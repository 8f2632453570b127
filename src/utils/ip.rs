//! Client IP extraction
//!
//! The CAPTCHA provider accepts an optional `remoteip` hint; this extracts
//! a best-effort client address from the request.

use actix_web::HttpRequest;

/// Extract the client IP, honoring `Forwarded`/`X-Forwarded-For` via
/// actix's connection info, with the peer address as fallback.
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    let conn_info = req.connection_info();

    if let Some(realip) = conn_info.realip_remote_addr() {
        return Some(strip_port(realip).to_string());
    }

    req.peer_addr().map(|addr| addr.ip().to_string())
}

/// Strip a trailing `:port` from an `ip:port` string. IPv6 addresses with
/// brackets (`[::1]:8080`) lose both port and brackets.
fn strip_port(addr: &str) -> &str {
    if let Some(rest) = addr.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return &rest[..end];
        }
    }
    // Only split IPv4-style host:port; a bare IPv6 address contains
    // multiple colons and must stay intact.
    match addr.rfind(':') {
        Some(idx) if addr[..idx].parse::<std::net::Ipv4Addr>().is_ok() => &addr[..idx],
        _ => addr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_port_ipv4() {
        assert_eq!(strip_port("192.168.1.1:8080"), "192.168.1.1");
        assert_eq!(strip_port("192.168.1.1"), "192.168.1.1");
    }

    #[test]
    fn test_strip_port_ipv6() {
        assert_eq!(strip_port("[::1]:8080"), "::1");
        assert_eq!(strip_port("2001:db8::1"), "2001:db8::1");
    }
}
