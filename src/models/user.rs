// src/models/user.rs

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::LazyLock;
use url::Url;
use validator::Validate;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap());

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Display name.
    pub name: String,

    /// Unique email, used as the login identifier.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub profile_picture: Option<String>,

    pub is_admin: bool,

    /// Spendable points balance. Never negative (enforced by a DB constraint).
    pub points_balance: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Public identity embedded in the login response.
#[derive(Debug, Serialize, FromRow)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
}

/// Aggregated profile data for the current user.
#[derive(Debug, Serialize, FromRow)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub is_admin: bool,
    pub points_balance: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub items_count: i64,
    pub pending_swaps_count: i64,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(
            min = 3,
            max = 80,
            message = "Username length must be between 3 and 80 characters."
        ),
        custom(function = validate_username)
    )]
    pub username: String,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Name length must be between 1 and 100 characters."
    ))]
    pub name: String,

    #[validate(email(message = "Invalid email address."))]
    pub email: String,

    #[validate(length(
        min = 8,
        max = 128,
        message = "Password length must be between 8 and 128 characters."
    ))]
    pub password: String,

    #[validate(custom(function = validate_optional_url))]
    pub profile_picture: Option<String>,
}

/// DTO for user login. Users sign in with their email.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 120))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Validates that a username contains only letters, digits, '_', '.' and '-'.
fn validate_username(username: &str) -> Result<(), validator::ValidationError> {
    if !USERNAME_RE.is_match(username) {
        return Err(validator::ValidationError::new("invalid_username"));
    }
    Ok(())
}

/// Validates that an optional profile picture reference is a well-formed URL.
fn validate_optional_url(url: &str) -> Result<(), validator::ValidationError> {
    if url.len() > 500 || Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_fixture() -> RegisterRequest {
        RegisterRequest {
            username: "swapper_01".to_string(),
            name: "Swapper".to_string(),
            email: "swapper@example.com".to_string(),
            password: "longenough".to_string(),
            profile_picture: None,
        }
    }

    #[test]
    fn accepts_a_well_formed_registration() {
        assert!(register_fixture().validate().is_ok());
    }

    #[test]
    fn rejects_usernames_with_forbidden_characters() {
        let mut req = register_fixture();
        req.username = "no spaces!".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_short_passwords() {
        let mut req = register_fixture();
        req.password = "short".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_malformed_profile_picture_urls() {
        let mut req = register_fixture();
        req.profile_picture = Some("not a url".to_string());
        assert!(req.validate().is_err());

        req.profile_picture = Some("https://cdn.example.com/avatar.png".to_string());
        assert!(req.validate().is_ok());
    }
}
