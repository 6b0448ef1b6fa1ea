//! Client identification for rate limiting.
//!
//! Checks Cloudflare's `CF-Connecting-IP` header first, then the standard proxy
//! headers, then the socket peer address.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{HeaderMap, request::Parts};

/// Key used when no client address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// The rate-limit key for the requesting client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKey(pub String);

impl ClientKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for ClientKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = ip_from_headers(&parts.headers).or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        });

        Ok(Self(
            ip.map_or_else(|| UNKNOWN_CLIENT.to_string(), |ip| ip.to_string()),
        ))
    }
}

/// Client IP from proxy headers, in order of trust.
fn ip_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    // Cloudflare's real client IP
    if let Some(ip) = header("cf-connecting-ip").and_then(|s| s.trim().parse().ok()) {
        return Some(ip);
    }

    // First IP in the X-Forwarded-For chain
    if let Some(ip) = header("x-forwarded-for")
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse().ok())
    {
        return Some(ip);
    }

    if let Some(ip) = header("x-real-ip").and_then(|s| s.trim().parse().ok()) {
        return Some(ip);
    }

    // Fly.io
    header("fly-client-ip").and_then(|s| s.trim().parse().ok())
}
