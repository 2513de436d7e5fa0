use axum::{
    async_trait,
    body::HttpBody,
    extract::FromRequest,
    http::{header::CONTENT_TYPE, Request},
    BoxError, Form, Json,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{error::AppError, validation::ValidationError};

// Request body for POST /register-user
#[derive(Debug, Deserialize)]
pub struct RegisterSchema {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

// Request body for POST /login-user
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSchema {
    pub login_id: Option<String>,
    pub password: Option<String>,
}

// Request body for POST /create-item
#[derive(Debug, Deserialize)]
pub struct CreateTodoSchema {
    pub todo: Option<String>,
}

// Request body for POST /edit-item
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTodoSchema {
    pub todo_id: Option<String>,
    pub updated_todo_text: Option<String>,
}

// Request body for POST /delete-item
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTodoSchema {
    pub todo_id: Option<String>,
}

// Query string for GET /read-item
#[derive(Debug, Deserialize)]
pub struct ReadTodoQuery {
    pub skip: Option<String>,
}

/// Request body accepted either as JSON (AJAX calls) or as an urlencoded
/// form (plain HTML form posts). Any decoding failure, including a field of
/// the wrong type, is reported as a 400 validation error.
#[derive(Debug)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, B, T> FromRequest<S, B> for Payload<T>
where
    T: DeserializeOwned,
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);

        if is_json {
            let Json(body) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| ValidationError::MalformedBody(e.body_text()))?;
            Ok(Payload(body))
        } else {
            let Form(body) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ValidationError::MalformedBody(e.body_text()))?;
            Ok(Payload(body))
        }
    }
}
