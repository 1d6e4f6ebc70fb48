//! Per-client rate limits for sign-in and checkout.
//!
//! Both limiters key on the shopper's IP. Behind Cloudflare and Fly the peer
//! address is the proxy, so the client IP is read from proxy headers first and
//! the socket address is only used for direct connections (local development).

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Headers carrying the client IP, most trusted first.
const CLIENT_IP_HEADERS: [&str; 4] = [
    "cf-connecting-ip",
    "x-forwarded-for",
    "x-real-ip",
    "fly-client-ip",
];

/// Client IP from proxy headers.
///
/// `X-Forwarded-For` contributes its first (client-most) entry. A header that
/// is present but unparseable is skipped rather than trusted.
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    CLIENT_IP_HEADERS.iter().find_map(|name| {
        let value = headers.get(*name)?.to_str().ok()?;
        let first = value.split(',').next()?;
        first.trim().parse::<IpAddr>().ok()
    })
}

/// Keys requests by shopper IP.
#[derive(Clone, Copy, Debug)]
pub struct ShopperIpKey;

impl tower_governor::key_extractor::KeyExtractor for ShopperIpKey {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip(req.headers())
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Token bucket shape: one token back every `replenish_secs`, up to `burst`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quota {
    pub replenish_secs: u64,
    pub burst: u32,
}

impl Quota {
    /// Sustained requests per minute once the burst is spent.
    #[must_use]
    pub const fn per_minute(self) -> u64 {
        60 / self.replenish_secs
    }
}

/// Sign-in and registration: about 10 per minute. Password guessing is the
/// threat, so the burst stays small.
pub const AUTH_QUOTA: Quota = Quota {
    replenish_secs: 6,
    burst: 5,
};

/// Checkout: 60 per minute sustained with room for a burst of retries. Every
/// accepted call in stripe mode creates a `PaymentIntent`.
pub const CHECKOUT_QUOTA: Quota = Quota {
    replenish_secs: 1,
    burst: 50,
};

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ShopperIpKey, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

fn limiter(quota: Quota) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ShopperIpKey)
        .per_second(quota.replenish_secs)
        .burst_size(quota.burst)
        .finish()
        .expect("quota constants are non-zero");
    GovernorLayer::new(Arc::new(config))
}

/// Limiter for `/auth/*`.
///
/// # Panics
///
/// Never: [`AUTH_QUOTA`] has non-zero period and burst.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    limiter(AUTH_QUOTA)
}

/// Limiter for `/api/checkout/*`.
///
/// # Panics
///
/// Never: [`CHECKOUT_QUOTA`] has non-zero period and burst.
#[must_use]
pub fn checkout_rate_limiter() -> RateLimiterLayer {
    limiter(CHECKOUT_QUOTA)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::HeaderValue;
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_client_ip_prefers_cloudflare() {
        let map = headers(&[
            ("fly-client-ip", "10.0.0.4"),
            ("x-real-ip", "10.0.0.3"),
            ("x-forwarded-for", "10.0.0.2"),
            ("cf-connecting-ip", "203.0.113.7"),
        ]);
        assert_eq!(client_ip(&map), Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn test_client_ip_header_order() {
        let map = headers(&[
            ("fly-client-ip", "10.0.0.4"),
            ("x-real-ip", "10.0.0.3"),
            ("x-forwarded-for", "198.51.100.1, 10.0.0.9"),
        ]);
        assert_eq!(client_ip(&map), Some("198.51.100.1".parse().unwrap()));

        let map = headers(&[("fly-client-ip", "10.0.0.4"), ("x-real-ip", "10.0.0.3")]);
        assert_eq!(client_ip(&map), Some("10.0.0.3".parse().unwrap()));

        let map = headers(&[("fly-client-ip", "2001:db8::1")]);
        assert_eq!(client_ip(&map), Some("2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn test_client_ip_skips_garbage() {
        let map = headers(&[
            ("cf-connecting-ip", "not-an-ip"),
            ("x-forwarded-for", "unknown"),
            ("x-real-ip", "192.0.2.5"),
        ]);
        assert_eq!(client_ip(&map), Some("192.0.2.5".parse().unwrap()));
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_key_falls_back_to_peer_address() {
        let mut req = Request::new(Body::empty());
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 51_000))));
        assert_eq!(
            ShopperIpKey.extract(&req).unwrap(),
            IpAddr::from([127, 0, 0, 1])
        );

        let bare = Request::new(Body::empty());
        assert!(ShopperIpKey.extract(&bare).is_err());
    }

    #[test]
    fn test_quotas() {
        assert_eq!(AUTH_QUOTA.per_minute(), 10);
        assert_eq!(CHECKOUT_QUOTA.per_minute(), 60);
        assert!(AUTH_QUOTA.burst < CHECKOUT_QUOTA.burst);
    }
}
