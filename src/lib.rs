//! Session-authenticated multi-user todo list service.
//!
//! Users register and log in through server-rendered pages; the dashboard's
//! client script then manages the user's todos through small JSON endpoints
//! guarded by a cookie-addressed server-side session.

pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod pages;
pub mod password;
pub mod response;
pub mod route;
pub mod schema;
pub mod session;
pub mod validation;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{config::Config, session::SessionStore};

// Struct representing the application state, shared by every handler
pub struct AppState {
    pub db: SqlitePool,
    pub sessions: SessionStore,
    pub config: Config,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Arc<Self> {
        let sessions = SessionStore::new(
            db.clone(),
            &config.session_secret,
            config.session_ttl_secs,
        );
        Arc::new(Self {
            db,
            sessions,
            config,
        })
    }

    /// Opens the configured database and builds the state around it.
    pub async fn connect(config: Config) -> Result<Arc<Self>, sqlx::Error> {
        let db = db::connect(&config.database_url).await?;
        Ok(Self::new(db, config))
    }
}
