//! Server-side sessions addressed by a signed cookie.
//!
//! The cookie carries `<id>.<signature>` where the signature is an
//! HMAC-SHA256 of the id under the configured session secret. The session
//! state itself lives in the `sessions` table and never leaves the server.

use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use ring::{
    hmac,
    rand::{SecureRandom, SystemRandom},
};
use sqlx::SqlitePool;
use tracing::debug;

use crate::{error::AppError, model::SessionData};

pub const SESSION_COOKIE: &str = "sid";

const SESSION_ID_BYTES: usize = 32;

/// A session that was found in the store for the request's cookie.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub data: SessionData,
}

#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
    key: hmac::Key,
    rng: SystemRandom,
    ttl_secs: u64,
}

impl SessionStore {
    pub fn new(pool: SqlitePool, secret: &str, ttl_secs: u64) -> Self {
        Self {
            pool,
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
            rng: SystemRandom::new(),
            ttl_secs,
        }
    }

    /// Looks up the session named by the request's cookie. A missing, forged,
    /// unknown or expired cookie all mean "no session".
    pub async fn load(&self, headers: &HeaderMap) -> Result<Option<Session>, AppError> {
        let Some(id) = session_cookie(headers).and_then(|value| self.unsign(&value)) else {
            return Ok(None);
        };

        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT data, expires_at FROM sessions WHERE id = ?")
                .bind(&id)
                .fetch_optional(&self.pool)
                .await?;

        let Some((data, expires_at)) = row else {
            return Ok(None);
        };

        if expires_at <= Utc::now().timestamp() {
            debug!("dropping expired session");
            self.destroy(&id).await?;
            return Ok(None);
        }

        let data: SessionData = serde_json::from_str(&data)
            .map_err(|e| AppError::Internal(format!("corrupt session record: {e}")))?;

        Ok(Some(Session { id, data }))
    }

    /// Persists a fresh session and returns its id.
    pub async fn create(&self, data: &SessionData) -> Result<String, AppError> {
        let id = self.generate_id()?;
        let data = serde_json::to_string(data)
            .map_err(|e| AppError::Internal(format!("session encoding failed: {e}")))?;

        sqlx::query("INSERT INTO sessions (id, data, expires_at) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(data)
            .bind(self.expires_at())
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    /// Removing a session that does not exist is not an error.
    pub async fn destroy(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// `Set-Cookie` value handing the signed session id to the browser.
    pub fn cookie(&self, id: &str) -> Result<HeaderValue, AppError> {
        let value = format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.sign(id),
            self.ttl_secs
        );
        HeaderValue::from_str(&value).map_err(|e| AppError::Internal(e.to_string()))
    }

    /// `Set-Cookie` value that makes the browser forget the session.
    pub fn clear_cookie() -> HeaderValue {
        HeaderValue::from_static("sid=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }

    pub fn sign(&self, id: &str) -> String {
        let tag = hmac::sign(&self.key, id.as_bytes());
        format!("{id}.{}", URL_SAFE_NO_PAD.encode(tag.as_ref()))
    }

    pub fn unsign(&self, value: &str) -> Option<String> {
        let (id, signature) = value.rsplit_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        hmac::verify(&self.key, id.as_bytes(), &signature).ok()?;
        Some(id.to_string())
    }

    fn generate_id(&self) -> Result<String, AppError> {
        let mut buffer = [0u8; SESSION_ID_BYTES];
        self.rng
            .fill(&mut buffer)
            .map_err(|_| AppError::Internal("failed to generate session id".to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(buffer))
    }

    fn expires_at(&self) -> i64 {
        let ttl = i64::try_from(self.ttl_secs).unwrap_or(i64::MAX);
        Utc::now().timestamp().saturating_add(ttl)
    }
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, model::SessionUser};

    async fn store(ttl_secs: u64) -> SessionStore {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        SessionStore::new(pool, "test-secret", ttl_secs)
    }

    fn cookie_headers(store: &SessionStore, id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let value = format!("theme=dark; {SESSION_COOKIE}={}", store.sign(id));
        headers.insert(COOKIE, HeaderValue::from_str(&value).unwrap());
        headers
    }

    fn alice() -> SessionData {
        SessionData {
            is_auth: true,
            user: Some(SessionUser {
                user_id: 1,
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn signed_ids_round_trip_and_forgeries_fail() {
        let store = store(60).await;
        let signed = store.sign("abc");
        assert_eq!(store.unsign(&signed).as_deref(), Some("abc"));
        assert_eq!(store.unsign("abc"), None);
        assert_eq!(store.unsign("abc.AAAA"), None);

        let other = SessionStore::new(store.pool.clone(), "other-secret", 60);
        assert_eq!(other.unsign(&signed), None);
    }

    #[tokio::test]
    async fn create_load_destroy() {
        let store = store(60).await;
        let id = store.create(&alice()).await.unwrap();

        let session = store.load(&cookie_headers(&store, &id)).await.unwrap().unwrap();
        assert_eq!(session.id, id);
        assert_eq!(session.data, alice());

        store.destroy(&id).await.unwrap();
        assert!(store.load(&cookie_headers(&store, &id)).await.unwrap().is_none());
        // a second destroy is harmless
        store.destroy(&id).await.unwrap();
    }

    #[tokio::test]
    async fn expired_sessions_are_absent_on_load() {
        let store = store(0).await;
        let id = store.create(&alice()).await.unwrap();
        assert!(store.load(&cookie_headers(&store, &id)).await.unwrap().is_none());
        // load already removed the row
        assert_eq!(store.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn purge_removes_only_expired_rows() {
        let expired = store(0).await;
        let live = SessionStore::new(expired.pool.clone(), "test-secret", 60);
        expired.create(&alice()).await.unwrap();
        let kept = live.create(&alice()).await.unwrap();

        assert_eq!(expired.purge_expired().await.unwrap(), 1);
        assert_eq!(expired.purge_expired().await.unwrap(), 0);
        assert!(live.load(&cookie_headers(&live, &kept)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn no_cookie_means_no_session() {
        let store = store(60).await;
        assert!(store.load(&HeaderMap::new()).await.unwrap().is_none());
    }

    #[test]
    fn session_data_uses_camel_case_json() {
        let json = serde_json::to_value(alice()).unwrap();
        assert_eq!(json["isAuth"], true);
        assert_eq!(json["user"]["userId"], 1);
        assert_eq!(serde_json::to_value(SessionData::default()).unwrap()["isAuth"], false);
    }
}
