//! User registration and profile-field validation.

use std::sync::LazyLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use regex::Regex;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::database::user_repo::{self, NewUser, UniqueField, UserPatch, UserRow};
use crate::types::errors::{ApiError, ApiResult, FieldErrors};

const REQUIRED: &str = "This field is required.";
const MAX_NAME_LEN: usize = 150;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email regex")
});
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("static username regex"));

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub serial_number: Option<String>,
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub password2: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn taken_message(field: UniqueField) -> &'static str {
    match field {
        UniqueField::Email => "This email is already in use. Please select a different email.",
        UniqueField::Username => "This username is already taken. Please choose another username.",
        UniqueField::SerialNumber => {
            "This serial number is already in use. Please select a different serial number."
        }
        UniqueField::PhoneNumber => "This phone number is already in use.",
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if !EMAIL_RE.is_match(email) {
        errors.add("email", "Enter a valid email address.");
    }
}

fn check_username(errors: &mut FieldErrors, username: &str) {
    if username.chars().count() > MAX_NAME_LEN {
        errors.add(
            "username",
            format!("Ensure this field has no more than {MAX_NAME_LEN} characters."),
        );
    } else if !USERNAME_RE.is_match(username) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

async fn check_unique(
    pool: &SqlitePool,
    errors: &mut FieldErrors,
    key: &str,
    field: UniqueField,
    value: &str,
    exclude_id: Option<i64>,
) -> ApiResult<()> {
    if user_repo::is_taken(pool, field, value, exclude_id).await? {
        errors.add(key, taken_message(field));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))
}

/// Validate a registration and create the user together with its profile.
pub async fn register_user(pool: &SqlitePool, req: &RegisterRequest) -> ApiResult<UserRow> {
    let mut errors = FieldErrors::new();

    let email = non_blank(&req.email);
    let username = non_blank(&req.username);
    let serial_number = non_blank(&req.serial_number);
    let phone_number = non_blank(&req.phone_number);
    let password = req.password.as_deref().filter(|p| !p.is_empty());
    let password2 = req.password2.as_deref().filter(|p| !p.is_empty());

    for (key, value) in [
        ("email", email),
        ("username", username),
        ("password", password),
        ("password2", password2),
    ] {
        if value.is_none() {
            errors.add(key, REQUIRED);
        }
    }

    if let Some(email) = email {
        check_email(&mut errors, email);
        check_unique(pool, &mut errors, "email", UniqueField::Email, email, None).await?;
    }
    if let Some(username) = username {
        check_username(&mut errors, username);
        check_unique(pool, &mut errors, "username", UniqueField::Username, username, None).await?;
    }
    if let Some(serial) = serial_number {
        check_unique(pool, &mut errors, "serial_number", UniqueField::SerialNumber, serial, None)
            .await?;
    }
    if let Some(phone) = phone_number {
        check_unique(pool, &mut errors, "phone_number", UniqueField::PhoneNumber, phone, None)
            .await?;
    }

    errors.into_result()?;

    // Both present once field validation passed
    let (Some(email), Some(username), Some(password), Some(password2)) =
        (email, username, password, password2)
    else {
        return Err(ApiError::Internal("registration fields missing".into()));
    };

    if password != password2 {
        return Err(ApiError::field("password", "Password fields didn't match."));
    }

    let password_hash = hash_password(password)?;
    let user = user_repo::insert_user(
        pool,
        &NewUser {
            username,
            email,
            serial_number,
            phone_number,
            password_hash: &password_hash,
        },
    )
    .await?;

    log::info!("Registered user {} (id {})", user.username, user.id);
    Ok(user)
}

/// Validate an update to `user_id`. With `full`, `username` and `email` must be present.
/// Blank optional fields are normalized to `None`.
pub async fn validate_user_update(
    pool: &SqlitePool,
    user_id: i64,
    patch: &UserPatch,
    full: bool,
) -> ApiResult<UserPatch> {
    let mut errors = FieldErrors::new();

    let cleaned = UserPatch {
        username: non_blank(&patch.username).map(str::to_string),
        email: non_blank(&patch.email).map(str::to_string),
        phone_number: non_blank(&patch.phone_number).map(str::to_string),
        serial_number: non_blank(&patch.serial_number).map(str::to_string),
    };

    if full {
        if cleaned.username.is_none() {
            errors.add("username", REQUIRED);
        }
        if cleaned.email.is_none() {
            errors.add("email", REQUIRED);
        }
    }

    let checks = [
        ("username", UniqueField::Username, &cleaned.username),
        ("email", UniqueField::Email, &cleaned.email),
        ("serial_number", UniqueField::SerialNumber, &cleaned.serial_number),
        ("phone_number", UniqueField::PhoneNumber, &cleaned.phone_number),
    ];
    for (key, field, value) in checks {
        let Some(value) = value.as_deref() else {
            continue;
        };
        match field {
            UniqueField::Username => check_username(&mut errors, value),
            UniqueField::Email => check_email(&mut errors, value),
            _ => {}
        }
        check_unique(pool, &mut errors, key, field, value, Some(user_id)).await?;
    }

    errors.into_result()?;
    Ok(cleaned)
}
