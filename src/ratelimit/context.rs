//! Caller Context
//!
//! What the transport tells the limiter about who is calling.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderMap,
};

/// Header consulted before the peer address.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Caller metadata supplied per check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerContext {
    /// Peer address of the connection, if known
    pub client_addr: Option<IpAddr>,
    /// Raw `X-Forwarded-For` header value
    pub forwarded_for: Option<String>,
    /// Request path (for sockets, the upgrade path)
    pub path: String,
    /// HTTP method; None for socket messages
    pub method: Option<String>,
}

impl CallerContext {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_client_addr(mut self, addr: Option<IpAddr>) -> Self {
        self.client_addr = addr;
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Picks up `X-Forwarded-For` from the request headers.
    pub fn with_headers(mut self, headers: &HeaderMap) -> Self {
        self.forwarded_for = headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self
    }

    /// Builds the context for an HTTP request. The peer address is only
    /// available when the server was started with connect info.
    pub fn from_request(req: &Request) -> Self {
        let client_addr = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Self::new(req.uri().path())
            .with_method(req.method().as_str())
            .with_headers(req.headers())
            .with_client_addr(client_addr)
    }

    /// The client's host: first `X-Forwarded-For` hop, else the peer
    /// address, else `unknown`.
    pub fn client_host(&self) -> String {
        let forwarded = self
            .forwarded_for
            .as_deref()
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|host| !host.is_empty());

        match (forwarded, self.client_addr) {
            (Some(host), _) => host.to_string(),
            (None, Some(addr)) => addr.to_string(),
            (None, None) => "unknown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use std::net::Ipv4Addr;

    #[test]
    fn test_client_host_prefers_forwarded_for() {
        let ctx = CallerContext {
            client_addr: Some(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            forwarded_for: Some("203.0.113.9, 10.0.0.1".to_string()),
            path: "/".to_string(),
            method: None,
        };
        assert_eq!(ctx.client_host(), "203.0.113.9");
    }

    #[test]
    fn test_client_host_fallbacks() {
        let peer = CallerContext::new("/").with_client_addr(Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        assert_eq!(peer.client_host(), "127.0.0.1");

        let mut blank_header = peer.clone();
        blank_header.forwarded_for = Some("  ".to_string());
        assert_eq!(blank_header.client_host(), "127.0.0.1");

        assert_eq!(CallerContext::new("/").client_host(), "unknown");
    }

    #[test]
    fn test_from_request() {
        let mut req = axum::http::Request::builder()
            .method("POST")
            .uri("/api/v1/cache/k/incr?x=1")
            .header("X-Forwarded-For", "198.51.100.4")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 2], 4000))));

        let ctx = CallerContext::from_request(&req);

        assert_eq!(ctx.path, "/api/v1/cache/k/incr");
        assert_eq!(ctx.method.as_deref(), Some("POST"));
        assert_eq!(ctx.client_addr, Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 2))));
        assert_eq!(ctx.client_host(), "198.51.100.4");
    }
}
