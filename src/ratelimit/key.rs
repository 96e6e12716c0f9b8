//! Caller identity normalization and key generation.

/// Sentinel identity used when a request carries no client address.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolve the client address from proxy headers.
///
/// Takes the first hop of `x-forwarded-for`, falling back to `x-real-ip`
/// and finally to [`UNKNOWN_CLIENT`]. Blank values are treated as absent.
pub fn client_ip(forwarded_for: Option<&str>, real_ip: Option<&str>) -> String {
    forwarded_for
        .and_then(|header| header.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| real_ip.map(str::trim).filter(|ip| !ip.is_empty()))
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// A key that uniquely identifies a throttled caller.
///
/// The namespace lets several policies share one attempt budget (both login
/// endpoints count against `auth`) or keep separate ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThrottleKey {
    /// Namespace the attempts are counted under
    pub namespace: String,
    /// Normalized caller identity, e.g. a client IP or license key
    pub client: String,
}

impl ThrottleKey {
    pub fn new(namespace: &str, client: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            client: client.to_string(),
        }
    }
}

impl std::fmt::Display for ThrottleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.namespace, self.client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_prefers_first_forwarded_hop() {
        let ip = client_ip(Some(" 203.0.113.7 , 10.0.0.1, 10.0.0.2"), Some("10.9.9.9"));
        assert_eq!(ip, "203.0.113.7");
    }

    #[test]
    fn test_client_ip_falls_back_to_real_ip() {
        assert_eq!(client_ip(None, Some("198.51.100.4")), "198.51.100.4");
        assert_eq!(client_ip(Some("  "), Some(" 198.51.100.4 ")), "198.51.100.4");
        assert_eq!(client_ip(Some(",10.0.0.1"), Some("198.51.100.4")), "198.51.100.4");
    }

    #[test]
    fn test_client_ip_unknown_when_absent() {
        assert_eq!(client_ip(None, None), UNKNOWN_CLIENT);
        assert_eq!(client_ip(Some(""), Some("")), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_throttle_key_to_string() {
        let key = ThrottleKey::new("auth", "1.2.3.4");
        assert_eq!(key.to_string(), "auth:1.2.3.4");
    }

    #[test]
    fn test_throttle_key_equality() {
        assert_eq!(ThrottleKey::new("auth", "a"), ThrottleKey::new("auth", "a"));
        assert_ne!(ThrottleKey::new("auth", "a"), ThrottleKey::new("alerts", "a"));
    }
}
