//! Extractors for request headers the API reads directly.

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::SocketAddr;

pub const GUEST_KEY_HEADER: &str = "X-Guest-Key";
pub const REFRESH_TOKEN_HEADER: &str = "X-Refresh-Token";
pub const IDEMPOTENCY_KEY_HEADER: &str = "X-Idempotency-Key";
pub const FORWARDED_FOR_HEADER: &str = "X-Forwarded-For";

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

macro_rules! optional_header {
    ($(#[$meta:meta])* $name:ident, $header:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        pub struct $name(pub Option<String>);

        #[async_trait]
        impl<S> FromRequestParts<S> for $name
        where
            S: Send + Sync,
        {
            type Rejection = Infallible;

            async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
                Ok($name(header_value(&parts.headers, $header)))
            }
        }
    };
}

optional_header!(
    /// Anonymous respondent key for assessments.
    GuestKey,
    GUEST_KEY_HEADER
);
optional_header!(
    /// Refresh token sent by clients that cannot use cookies.
    RefreshTokenHeader,
    REFRESH_TOKEN_HEADER
);
optional_header!(IdempotencyKey, IDEMPOTENCY_KEY_HEADER);

/// Client address: the first `X-Forwarded-For` entry, otherwise the peer.
#[derive(Debug, Clone, Default)]
pub struct ClientIp(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = header_value(&parts.headers, FORWARDED_FOR_HEADER).and_then(|v| {
            v.split(',')
                .next()
                .map(str::trim)
                .filter(|first| !first.is_empty())
                .map(ToString::to_string)
        });
        let ip = forwarded.or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });
        Ok(ClientIp(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder();
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_client_ip_prefers_first_forwarded_entry() {
        let mut p = parts(&[(FORWARDED_FOR_HEADER, " 10.0.0.1 , 172.16.0.2")]);
        let ClientIp(ip) = ClientIp::from_request_parts(&mut p, &()).await.unwrap();
        assert_eq!(ip.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_client_ip_falls_back_to_peer() {
        let mut p = parts(&[]);
        p.extensions
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 0, 9], 4000))));
        let ClientIp(ip) = ClientIp::from_request_parts(&mut p, &()).await.unwrap();
        assert_eq!(ip.as_deref(), Some("192.168.0.9"));
    }

    #[tokio::test]
    async fn test_blank_header_is_absent() {
        let mut p = parts(&[(GUEST_KEY_HEADER, "   ")]);
        let GuestKey(key) = GuestKey::from_request_parts(&mut p, &()).await.unwrap();
        assert!(key.is_none());
    }
}
