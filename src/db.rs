//! SQLite-backed storage for users and todos.
//!
//! Query helpers take any sqlx executor. Todo mutations are single
//! owner-scoped statements, so no handler needs an explicit transaction.

use chrono::Utc;
use sqlx::{
    migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Executor, Sqlite, SqlitePool,
};
use tracing::info;

use crate::{
    model::{Todo, User},
    validation::NewUser,
};

pub const TODO_PAGE_SIZE: i64 = 2;

const USER_COLUMNS: &str = "id, name, email, username, password, created_at, updated_at";
const TODO_COLUMNS: &str = "id, todo, username, created_at, updated_at";

/// Opens the database, creating it and its tables if needed.
pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = url.contains(":memory:");

    if !in_memory && !Sqlite::database_exists(url).await.unwrap_or(false) {
        info!("Creating database {}", url);
        Sqlite::create_database(url).await?;
    }

    // every connection to an in-memory database is its own database,
    // so keep exactly one alive for the lifetime of the pool
    let options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(10)
    };

    let pool = options.connect(url).await?;
    init_schema(&pool).await?;
    Ok(pool)
}

pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    pool.execute(
        r#"CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS todos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        todo TEXT NOT NULL,
        username TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS todos_username_idx ON todos (username, id);
    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        expires_at INTEGER NOT NULL
    );"#,
    )
    .await?;

    Ok(())
}

pub async fn find_user_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
    sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(executor)
        .await
}

pub async fn find_user_by_username<'e, E>(
    executor: E,
    username: &str,
) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
    sqlx::query_as::<_, User>(&sql)
        .bind(username)
        .fetch_optional(executor)
        .await
}

/// Inserts a user whose password has already been hashed.
pub async fn insert_user<'e, E>(
    executor: E,
    user: &NewUser,
    password_hash: &str,
) -> Result<User, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO users (name, email, username, password, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
    );
    sqlx::query_as::<_, User>(&sql)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.username)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
}

pub async fn insert_todo<'e, E>(executor: E, text: &str, username: &str) -> Result<Todo, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO todos (todo, username, created_at, updated_at) \
         VALUES (?, ?, ?, ?) RETURNING {TODO_COLUMNS}"
    );
    sqlx::query_as::<_, Todo>(&sql)
        .bind(text)
        .bind(username)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
}

pub async fn find_todo<'e, E>(executor: E, id: i64) -> Result<Option<Todo>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?");
    sqlx::query_as::<_, Todo>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// One page of a user's todos in insertion order.
pub async fn todos_page<'e, E>(
    executor: E,
    username: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<Todo>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {TODO_COLUMNS} FROM todos WHERE username = ? ORDER BY id ASC LIMIT ? OFFSET ?"
    );
    sqlx::query_as::<_, Todo>(&sql)
        .bind(username)
        .bind(limit)
        .bind(skip)
        .fetch_all(executor)
        .await
}

/// Rewrites a todo's text if `username` owns it. `None` means no row
/// matched, either because the todo is gone or because it belongs to
/// someone else.
pub async fn update_owned_todo_text<'e, E>(
    executor: E,
    id: i64,
    username: &str,
    text: &str,
) -> Result<Option<Todo>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "UPDATE todos SET todo = ?, updated_at = ? WHERE id = ? AND username = ? \
         RETURNING {TODO_COLUMNS}"
    );
    sqlx::query_as::<_, Todo>(&sql)
        .bind(text)
        .bind(Utc::now())
        .bind(id)
        .bind(username)
        .fetch_optional(executor)
        .await
}

/// Deletes a todo if `username` owns it, with the same `None` contract as
/// [`update_owned_todo_text`].
pub async fn delete_owned_todo<'e, E>(
    executor: E,
    id: i64,
    username: &str,
) -> Result<Option<Todo>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("DELETE FROM todos WHERE id = ? AND username = ? RETURNING {TODO_COLUMNS}");
    sqlx::query_as::<_, Todo>(&sql)
        .bind(id)
        .bind(username)
        .fetch_optional(executor)
        .await
}
