//! Password hashing and verification.
//!
//! bcrypt is deliberately slow, so both operations run on the blocking pool
//! instead of the async executor.

use crate::error::AppError;

pub async fn hash_password(plain: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(AppError::from)
}

/// Returns `Ok(false)` on a mismatch; `Err` only if the stored hash is unusable.
pub async fn verify_password(plain: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))?
        .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("correct-horse".to_string(), 4).await.unwrap();
        assert_ne!(hash, "correct-horse");
        assert!(verify_password("correct-horse".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password("wrong-horse".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn same_password_gets_distinct_salts() {
        let a = hash_password("correct-horse".to_string(), 4).await.unwrap();
        let b = hash_password("correct-horse".to_string(), 4).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn garbage_hash_is_an_error() {
        assert!(verify_password("pw".to_string(), "not-a-hash".to_string())
            .await
            .is_err());
    }
}
