//! bcrypt hashing helpers
//!
//! Hashing is CPU-bound (~100 ms at cost 12) and runs on the blocking pool
//! so request tasks never stall the runtime.

use shared_error::AppError;

/// Fixed cost for every stored password hash
pub const BCRYPT_COST: u32 = 12;

pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify_round_trip() {
        let hash = hash_password("SecurePass123").await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("SecurePass123", &hash).await.unwrap());
        assert!(!verify_password("WrongPass123", &hash).await.unwrap());
    }
}
