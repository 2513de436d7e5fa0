use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Registered account; the password column only ever holds a bcrypt hash
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Data model representing a Todo item, owned by `username`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub todo: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The user a protected request runs as, inserted by the auth middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

/// Server-side session state, stored as JSON alongside the session id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub is_auth: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}

impl SessionData {
    pub fn authenticated(user: &User) -> Self {
        Self {
            is_auth: true,
            user: Some(SessionUser {
                user_id: user.id,
                username: user.username.clone(),
                email: user.email.clone(),
            }),
        }
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        match (&self.user, self.is_auth) {
            (Some(user), true) => Some(CurrentUser {
                user_id: user.user_id,
                username: user.username.clone(),
            }),
            _ => None,
        }
    }
}
