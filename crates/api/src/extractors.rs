//! Request extractors.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, header::USER_AGENT, request::Parts},
};
use collexo_common::AppError;
use collexo_core::ClientInfo;

/// A society whose identity was established upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSociety {
    /// Society ID.
    pub id: String,
}

/// Authenticated society extractor.
#[derive(Debug, Clone)]
pub struct AuthSociety(pub AuthenticatedSociety);

impl<S> FromRequestParts<S> for AuthSociety
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by an authenticating layer in front of the router
        parts
            .extensions
            .get::<AuthenticatedSociety>()
            .cloned()
            .map(AuthSociety)
            .ok_or(AppError::Unauthorized)
    }
}

/// Client address and user agent of the request.
#[derive(Debug, Clone)]
pub struct ClientMeta(pub ClientInfo);

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(Self(ClientInfo {
            ip_address: forwarded_for(&parts.headers).or(peer),
            user_agent: parts
                .headers
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(String::from),
        }))
    }
}

/// First hop of `X-Forwarded-For`, if it is an IP address.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
        .map(|ip| ip.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Forwarded-For",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(forwarded_for(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_forwarded_for_missing() {
        assert_eq!(forwarded_for(&HeaderMap::new()), None);
    }

    #[test]
    fn test_forwarded_for_ignores_non_address() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Forwarded-For",
            HeaderValue::from_str(&format!("{}, 10.0.0.1", "x".repeat(64))).unwrap(),
        );
        assert_eq!(forwarded_for(&headers), None);
    }

    #[test]
    fn test_forwarded_for_accepts_ipv6() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static("2001:db8::1"));
        assert_eq!(forwarded_for(&headers).as_deref(), Some("2001:db8::1"));
    }
}
