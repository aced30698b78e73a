use std::collections::BTreeMap;

use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::auth::services::is_valid_email;
use crate::error::ApiError;

/// Token type used to distinguish Access and Refresh JWTs.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[serde(alias = "Access")]
    Access,
    #[serde(alias = "Refresh")]
    Refresh,
}

/// JWT payload. Carries both the user id and email so write handlers can
/// resolve the acting user by either field.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,       // user ID
    pub email: String,   // user email at issuance time
    pub exp: usize,      // expiration time
    pub iat: usize,      // issued at
    pub iss: String,     // issuer
    pub aud: String,     // audience
    pub kind: TokenKind, // access or refresh
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = BTreeMap::new();
        let name_len = self.name.chars().count();
        if !(2..=50).contains(&name_len) {
            errors.insert(
                "name".to_string(),
                "Name must be between 2 and 50 characters".to_string(),
            );
        }
        let username_len = self.username.chars().count();
        if !(3..=30).contains(&username_len) {
            errors.insert(
                "username".to_string(),
                "Username must be between 3 and 30 characters".to_string(),
            );
        }
        if !is_valid_email(&self.email) {
            errors.insert(
                "email".to_string(),
                "Must be a valid email address".to_string(),
            );
        }
        if self.password.chars().count() < 6 {
            errors.insert(
                "password".to_string(),
                "Password must be at least 6 characters".to_string(),
            );
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = BTreeMap::new();
        if !is_valid_email(&self.email) {
            errors.insert(
                "email".to_string(),
                "Must be a valid email address".to_string(),
            );
        }
        if self.password.is_empty() {
            errors.insert(
                "password".to_string(),
                "Password is required".to_string(),
            );
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: PublicUser,
}

/// Response returned after login or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

/// Public part of the user returned to the client. Never carries password
/// material.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            username: u.username,
            email: u.email,
            profile_picture: u.profile_picture,
            bio: u.bio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_register() -> RegisterRequest {
        RegisterRequest {
            name: "Ada Lovelace".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            password: "secret123".into(),
        }
    }

    #[test]
    fn register_accepts_valid_input() {
        assert!(valid_register().validate().is_ok());
    }

    #[test]
    fn register_collects_all_field_errors() {
        let req = RegisterRequest {
            name: "A".into(),
            username: "ab".into(),
            email: "not-an-email".into(),
            password: "short".into(),
        };
        let err = req.validate().unwrap_err();
        match err {
            ApiError::Validation(fields) => {
                assert_eq!(fields.len(), 4);
                assert!(fields.contains_key("name"));
                assert!(fields.contains_key("username"));
                assert!(fields.contains_key("email"));
                assert!(fields.contains_key("password"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn register_rejects_overlong_name() {
        let mut req = valid_register();
        req.name = "x".repeat(51);
        let err = req.validate().unwrap_err();
        match err {
            ApiError::Validation(fields) => {
                assert!(fields.contains_key("name"));
                assert_eq!(fields.len(), 1);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn login_requires_valid_email_and_password() {
        let req = LoginRequest {
            email: "nope".into(),
            password: "".into(),
        };
        let err = req.validate().unwrap_err();
        match err {
            ApiError::Validation(fields) => {
                assert!(fields.contains_key("email"));
                assert!(fields.contains_key("password"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn public_user_serializes_camel_case_without_password() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            name: "Ada Lovelace".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            profile_picture: Some("https://example.com/ada.png".into()),
            bio: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("profilePicture").is_some());
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["username"], "ada");
    }
}
