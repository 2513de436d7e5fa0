use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{
        header::{CONTENT_TYPE, SET_COOKIE},
        HeaderMap, StatusCode,
    },
    response::{Html, IntoResponse, Redirect},
    Extension,
};
use tracing::{info, warn};

use crate::{
    db::{self, TODO_PAGE_SIZE},
    error::AppError,
    model::{CurrentUser, SessionData, Todo},
    pages,
    password::{hash_password, verify_password},
    response::Envelope,
    schema::{
        CreateTodoSchema, DeleteTodoSchema, EditTodoSchema, LoginSchema, Payload, ReadTodoQuery,
        RegisterSchema,
    },
    session::SessionStore,
    validation::{
        parse_skip, validate_login, validate_registration, validate_todo_id, validate_todo_text,
        LoginId,
    },
    AppState,
};

// Handler for the health checker route
pub async fn health_checker_handler() -> &'static str {
    "Server is running"
}

pub async fn register_page() -> Html<&'static str> {
    Html(pages::REGISTER_PAGE)
}

pub async fn login_page() -> Html<&'static str> {
    Html(pages::LOGIN_PAGE)
}

pub async fn dashboard_page(Extension(user): Extension<CurrentUser>) -> Html<String> {
    Html(pages::render_dashboard(&user.username))
}

pub async fn client_script() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "application/javascript; charset=utf-8")],
        pages::CLIENT_SCRIPT,
    )
}

// Handler for registering a new user
pub async fn register_user(
    State(data): State<Arc<AppState>>,
    Payload(body): Payload<RegisterSchema>,
) -> Result<Redirect, AppError> {
    let new_user = validate_registration(body)?;

    if db::find_user_by_email(&data.db, &new_user.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    if db::find_user_by_username(&data.db, &new_user.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Username already registered".to_string()));
    }

    let password_hash = hash_password(new_user.password.clone(), data.config.bcrypt_cost).await?;

    // the unique constraints still catch a registration racing this one
    let user = db::insert_user(&data.db, &new_user, &password_hash)
        .await
        .map_err(registration_conflict)?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(Redirect::to("/login"))
}

// Handler for logging in by email or username
pub async fn login_user(
    State(data): State<Arc<AppState>>,
    headers: HeaderMap,
    Payload(body): Payload<LoginSchema>,
) -> Result<impl IntoResponse, AppError> {
    let credentials = validate_login(body)?;

    let user = match &credentials.login_id {
        LoginId::Email(email) => db::find_user_by_email(&data.db, email).await?,
        LoginId::Username(username) => db::find_user_by_username(&data.db, username).await?,
    };

    let Some(user) = user else {
        return Err(AppError::BadRequest(
            "User not found, please register first".to_string(),
        ));
    };

    if !verify_password(credentials.password, user.password.clone()).await? {
        warn!(username = %user.username, "login rejected: wrong password");
        return Err(AppError::BadRequest("Password does not matched".to_string()));
    }

    // never reuse a session id issued before authentication
    if let Some(previous) = data.sessions.load(&headers).await? {
        data.sessions.destroy(&previous.id).await?;
    }

    let session_id = data
        .sessions
        .create(&SessionData::authenticated(&user))
        .await?;
    let cookie = data.sessions.cookie(&session_id)?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(([(SET_COOKIE, cookie)], Redirect::to("/dashboard")))
}

// Handler for logging out; safe to call without a session
pub async fn logout(
    State(data): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(session) = data.sessions.load(&headers).await? {
        data.sessions.destroy(&session.id).await?;
        if let Some(user) = session.data.user {
            info!(username = %user.username, "user logged out");
        }
    }

    Ok((
        [(SET_COOKIE, SessionStore::clear_cookie())],
        Redirect::to("/login"),
    ))
}

// Handler for creating a new Todo owned by the session user
pub async fn create_item(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Payload(body): Payload<CreateTodoSchema>,
) -> Result<Envelope<Todo>, AppError> {
    let text = validate_todo_text(body.todo, "todo")?;

    let todo = db::insert_todo(&data.db, &text, &user.username).await?;

    info!(todo_id = todo.id, user_id = user.user_id, username = %user.username, "todo created");
    Ok(Envelope::with_data(
        StatusCode::CREATED,
        "Todo created successfully",
        todo,
    ))
}

// Handler for reading one page of the session user's Todos
pub async fn read_item(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ReadTodoQuery>,
) -> Result<Envelope<Vec<Todo>>, AppError> {
    let skip = parse_skip(query.skip.as_deref())?;

    let todos = db::todos_page(&data.db, &user.username, skip, TODO_PAGE_SIZE).await?;
    if todos.is_empty() {
        return Err(AppError::NotFound("No more todos".to_string()));
    }

    Ok(Envelope::with_data(StatusCode::OK, "Read success", todos))
}

// Handler for editing a Todo's text; only its owner may do so
pub async fn edit_item(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Payload(body): Payload<EditTodoSchema>,
) -> Result<Envelope<Todo>, AppError> {
    let todo_id = validate_todo_id(body.todo_id)?;
    let text = validate_todo_text(body.updated_todo_text, "updatedTodoText")?;

    let Some(updated) =
        db::update_owned_todo_text(&data.db, todo_id, &user.username, &text).await?
    else {
        return Err(refusal(&data, todo_id, &user, "edit").await);
    };

    info!(todo_id, user_id = user.user_id, username = %user.username, "todo edited");
    Ok(Envelope::with_data(
        StatusCode::OK,
        "Todo updated successfully",
        updated,
    ))
}

// Handler for deleting a Todo; only its owner may do so
pub async fn delete_item(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Payload(body): Payload<DeleteTodoSchema>,
) -> Result<Envelope<Todo>, AppError> {
    let todo_id = validate_todo_id(body.todo_id)?;

    let Some(deleted) = db::delete_owned_todo(&data.db, todo_id, &user.username).await? else {
        return Err(refusal(&data, todo_id, &user, "delete").await);
    };

    info!(todo_id, user_id = user.user_id, username = %user.username, "todo deleted");
    Ok(Envelope::with_data(
        StatusCode::OK,
        "Todo deleted successfully",
        deleted,
    ))
}

// Explains why an owner-scoped mutation matched no row
async fn refusal(data: &AppState, todo_id: i64, user: &CurrentUser, action: &str) -> AppError {
    match db::find_todo(&data.db, todo_id).await {
        Ok(Some(_)) => {
            warn!(todo_id, username = %user.username, "{action} refused: not the owner");
            AppError::Forbidden(format!("Not allowed to {action}, authorization failed"))
        }
        Ok(None) => AppError::NotFound(format!("Todo with ID: {} not found", todo_id)),
        Err(e) => e.into(),
    }
}

// Maps a unique-constraint failure from a registration that lost a race
fn registration_conflict(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(e) if e.is_unique_violation() => {
            AppError::Conflict("Email or username already registered".to_string())
        }
        e => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::NewUser;

    #[tokio::test]
    async fn duplicate_insert_maps_to_conflict() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let user = NewUser {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            password: "unused".to_string(),
        };
        db::insert_user(&pool, &user, "hash").await.unwrap();

        let err = db::insert_user(&pool, &user, "hash").await.unwrap_err();
        let err = registration_conflict(err);
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn other_storage_errors_stay_internal() {
        let err = registration_conflict(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
