use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::net::SocketAddr;

use auth_service_core::domains::auth::dto::auth_dto::RequestMeta;
use shared_error::AppError;

/// Extract client IP address from request
///
/// Tries in order: X-Forwarded-For (leftmost entry), X-Real-IP, socket addr.
pub fn extract_client_ip(
    headers: &HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> Option<String> {
    if let Some(forwarded_for) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded_for.to_str() {
            if let Some(client_ip) = value.split(',').next() {
                return Some(client_ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(value) = real_ip.to_str() {
            return Some(value.to_string());
        }
    }

    connect_info.map(|info| info.0.ip().to_string())
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .map(|s| s.to_string())
}

/// Client metadata extractor usable directly in handler parameters
pub struct ClientInfo(pub RequestMeta);

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let connect_info = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .ok();

        Ok(ClientInfo(RequestMeta {
            ip_address: extract_client_ip(&parts.headers, connect_info),
            user_agent: extract_user_agent(&parts.headers),
        }))
    }
}

/// Pull the bearer token out of the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let value = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::AuthFailure("Missing authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
        .ok_or_else(|| AppError::AuthFailure("Malformed authorization header".to_string()))
}

/// Pull the opaque admin session token out of the X-Admin-Session header
pub fn admin_session_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("x-admin-session")
        .and_then(|v| v.to_str().ok())
        .map(|token| token.to_string())
        .ok_or_else(|| AppError::AuthFailure("Missing admin session".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_extract_ip_from_x_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.1, 198.51.100.1"),
        );

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_extract_ip_priority() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.1"));

        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080);
        let ip = extract_client_ip(&headers, Some(ConnectInfo(addr)));
        assert_eq!(ip, Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_extract_ip_falls_back_to_socket() {
        let headers = HeaderMap::new();
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080);
        let ip = extract_client_ip(&headers, Some(ConnectInfo(addr)));
        assert_eq!(ip, Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc123");

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc123"));
        assert!(bearer_token(&headers).is_err());

        assert!(bearer_token(&HeaderMap::new()).is_err());
    }

    #[test]
    fn test_admin_session_token() {
        let mut headers = HeaderMap::new();
        headers.insert("x-admin-session", HeaderValue::from_static("tok"));
        assert_eq!(admin_session_token(&headers).unwrap(), "tok");

        assert!(admin_session_token(&HeaderMap::new()).is_err());
    }
}
