//! Input validation for registration, login and todo requests.
//!
//! Every function here is pure: it either returns a value the handlers can
//! hand straight to the store, or a [`ValidationError`] describing the first
//! problem found.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::schema::{LoginSchema, RegisterSchema};

const MAX_NAME_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 254;
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 50;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 100;
pub const MIN_TODO_LENGTH: usize = 3;
pub const MAX_TODO_LENGTH: usize = 100;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing {0}")]
    MissingField(&'static str),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid todo: {0}")]
    InvalidTodo(String),

    #[error("Invalid todo id: {0}")]
    InvalidTodoId(String),

    #[error("Invalid skip: {0}")]
    InvalidSkip(String),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// A registration request that passed validation; the password is still plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Which unique field a login identifier refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginId {
    Email(String),
    Username(String),
}

#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub login_id: LoginId,
    pub password: String,
}

fn required(value: Option<String>, field: &'static str) -> ValidationResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

pub fn is_login_identifier_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

pub fn validate_registration(input: RegisterSchema) -> ValidationResult<NewUser> {
    let name = required(input.name, "name")?.trim().to_string();
    let email = required(input.email, "email")?.trim().to_string();
    let username = required(input.username, "username")?.trim().to_string();
    let password = required(input.password, "password")?;

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::InvalidName(format!(
            "Name cannot exceed {MAX_NAME_LENGTH} characters"
        )));
    }

    if email.len() > MAX_EMAIL_LENGTH || !is_login_identifier_email(&email) {
        return Err(ValidationError::InvalidEmail(
            "Email format is incorrect".to_string(),
        ));
    }

    let username_len = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&username_len) {
        return Err(ValidationError::InvalidUsername(format!(
            "Username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"
        )));
    }

    // login classifies identifiers by shape, so a username may not look like an email
    if is_login_identifier_email(&username) {
        return Err(ValidationError::InvalidUsername(
            "Username cannot be an email".to_string(),
        ));
    }

    let password_len = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&password_len) {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(NewUser {
        name,
        email,
        username,
        password,
    })
}

pub fn validate_login(input: LoginSchema) -> ValidationResult<LoginCredentials> {
    let login_id = required(input.login_id, "loginId")?.trim().to_string();
    let password = required(input.password, "password")?;

    let login_id = if is_login_identifier_email(&login_id) {
        LoginId::Email(login_id)
    } else {
        LoginId::Username(login_id)
    };

    Ok(LoginCredentials { login_id, password })
}

/// Trims a todo text and enforces the length bounds.
pub fn validate_todo_text(text: Option<String>, field: &'static str) -> ValidationResult<String> {
    let text = text.ok_or(ValidationError::MissingField(field))?;
    let trimmed = text.trim();
    let len = trimmed.chars().count();

    if len < MIN_TODO_LENGTH || len > MAX_TODO_LENGTH {
        return Err(ValidationError::InvalidTodo(format!(
            "Todo must be between {MIN_TODO_LENGTH} and {MAX_TODO_LENGTH} characters"
        )));
    }

    Ok(trimmed.to_string())
}

pub fn validate_todo_id(id: Option<String>) -> ValidationResult<i64> {
    let id = id.ok_or(ValidationError::MissingField("todoId"))?;
    id.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidTodoId(format!("'{id}' is not a todo id")))
}

pub fn parse_skip(skip: Option<&str>) -> ValidationResult<i64> {
    match skip.map(str::trim) {
        None | Some("") => Ok(0),
        Some(raw) => match raw.parse::<u32>() {
            Ok(skip) => Ok(i64::from(skip)),
            Err(_) => Err(ValidationError::InvalidSkip(format!(
                "'{raw}' is not a non-negative integer"
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(name: &str, email: &str, username: &str, password: &str) -> RegisterSchema {
        RegisterSchema {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[test]
    fn accepts_well_formed_registration() {
        let user = validate_registration(registration(
            " Alice ",
            "alice@example.com",
            "alice",
            "correct-horse",
        ))
        .unwrap();
        assert_eq!(user.name, "Alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.username, "alice");
    }

    #[test]
    fn rejects_missing_fields() {
        let mut input = registration("Alice", "alice@example.com", "alice", "correct-horse");
        input.password = None;
        assert_eq!(
            validate_registration(input).unwrap_err(),
            ValidationError::MissingField("password")
        );

        let input = registration("  ", "alice@example.com", "alice", "correct-horse");
        assert_eq!(
            validate_registration(input).unwrap_err(),
            ValidationError::MissingField("name")
        );
    }

    #[test]
    fn rejects_bad_email_username_and_password() {
        assert!(matches!(
            validate_registration(registration("A", "not-an-email", "alice", "correct-horse")),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_registration(registration("A", "a@example.com", "al", "correct-horse")),
            Err(ValidationError::InvalidUsername(_))
        ));
        assert!(matches!(
            validate_registration(registration("A", "a@example.com", "b@example.com", "correct-horse")),
            Err(ValidationError::InvalidUsername(_))
        ));
        assert!(matches!(
            validate_registration(registration("A", "a@example.com", "alice", "short")),
            Err(ValidationError::InvalidPassword(_))
        ));
    }

    #[test]
    fn classifies_login_identifiers() {
        assert!(is_login_identifier_email("alice@example.com"));
        assert!(is_login_identifier_email("first.last+tag@mail.example.org"));
        assert!(!is_login_identifier_email("alice"));
        assert!(!is_login_identifier_email("alice@localhost"));

        let creds = validate_login(LoginSchema {
            login_id: Some("alice".to_string()),
            password: Some("pw".to_string()),
        })
        .unwrap();
        assert_eq!(creds.login_id, LoginId::Username("alice".to_string()));
    }

    #[test]
    fn todo_text_length_boundaries() {
        let text = |n: usize| Some("x".repeat(n));
        assert!(validate_todo_text(text(2), "todo").is_err());
        assert!(validate_todo_text(text(3), "todo").is_ok());
        assert!(validate_todo_text(text(100), "todo").is_ok());
        assert!(validate_todo_text(text(101), "todo").is_err());
        assert_eq!(
            validate_todo_text(Some("  buy milk  ".to_string()), "todo").unwrap(),
            "buy milk"
        );
        assert_eq!(
            validate_todo_text(None, "todo").unwrap_err(),
            ValidationError::MissingField("todo")
        );
    }

    #[test]
    fn skip_defaults_to_zero_and_rejects_negatives() {
        assert_eq!(parse_skip(None).unwrap(), 0);
        assert_eq!(parse_skip(Some("4")).unwrap(), 4);
        assert!(parse_skip(Some("-1")).is_err());
        assert!(parse_skip(Some("two")).is_err());
    }

    #[test]
    fn todo_ids_must_be_numeric() {
        assert_eq!(validate_todo_id(Some("42".to_string())).unwrap(), 42);
        assert!(validate_todo_id(Some("abc".to_string())).is_err());
        assert!(validate_todo_id(None).is_err());
    }
}
