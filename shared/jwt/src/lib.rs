use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared_error::AppError;
use uuid::Uuid;

/// Access token claims
///
/// Access tokens are stateless JWS (HS256) signed with the owning project's
/// secret. Refresh tokens are opaque random strings and never pass through
/// this module.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,

    /// User email at issuance time
    pub email: String,

    /// Owning project (tenant) slug
    pub project_id: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create access token claims with the project's TTL
    pub fn new_access(user_id: Uuid, email: String, project_id: String, ttl_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id,
            email,
            project_id,
            iat: now,
            exp: now + ttl_seconds,
        }
    }
}

/// Encode claims into a JWT, signing with the project's raw secret bytes
pub fn encode_jwt(claims: &Claims, secret: &[u8]) -> Result<String, AppError> {
    let key = EncodingKey::from_secret(secret);
    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| AppError::Internal(format!("Failed to encode JWT: {}", e)))
}

/// Decode and validate a JWT (signature + expiry)
pub fn decode_jwt(token: &str, secret: &[u8]) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::AuthFailure("Invalid or expired token".to_string()))
}

/// Decode a token and reject it when its project claim does not match the
/// project the request was made against
pub fn decode_jwt_for_project(
    token: &str,
    secret: &[u8],
    project_id: &str,
) -> Result<Claims, AppError> {
    let claims = decode_jwt(token, secret)?;
    if claims.project_id != project_id {
        return Err(AppError::AuthFailure("Invalid or expired token".to_string()));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_encode_decode() {
        let user_id = Uuid::new_v4();
        let secret = b"test_secret_material_32_bytes!!!";

        let claims = Claims::new_access(user_id, "user@example.com".into(), "acme".into(), 3600);
        let token = encode_jwt(&claims, secret).unwrap();

        let decoded = decode_jwt(&token, secret).unwrap();
        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.email, "user@example.com");
        assert_eq!(decoded.project_id, "acme");
        assert_eq!(decoded.exp, decoded.iat + 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims =
            Claims::new_access(Uuid::new_v4(), "user@example.com".into(), "acme".into(), 3600);
        let token = encode_jwt(&claims, b"secret_a").unwrap();

        assert!(decode_jwt(&token, b"secret_b").is_err());
    }

    #[test]
    fn test_project_mismatch_rejected() {
        let secret = b"shared_secret";
        let claims =
            Claims::new_access(Uuid::new_v4(), "user@example.com".into(), "acme".into(), 3600);
        let token = encode_jwt(&claims, secret).unwrap();

        assert!(decode_jwt_for_project(&token, secret, "acme").is_ok());
        assert!(decode_jwt_for_project(&token, secret, "other").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = b"secret";
        let mut claims =
            Claims::new_access(Uuid::new_v4(), "user@example.com".into(), "acme".into(), 3600);
        claims.iat -= 7200;
        claims.exp -= 7200;
        let token = encode_jwt(&claims, secret).unwrap();

        assert!(decode_jwt(&token, secret).is_err());
    }
}
