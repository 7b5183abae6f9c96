/*
 * Responsibility
 * - signup / login / me の request/response DTO
 * - validation (形式チェック) 用の validate() を持たせる
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 128;
const MAX_FULL_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        let name = self.full_name.trim();
        if name.is_empty() {
            return Err("full_name is required");
        }
        if name.chars().count() > MAX_FULL_NAME_LEN {
            return Err("full_name must be <= 100 chars");
        }
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// Emails are compared case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

// Shape check only; deliverability is not our concern.
fn validate_email(email: &str) -> Result<(), &'static str> {
    let email = email.trim();
    if email.is_empty() {
        return Err("email is required");
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err("email must be <= 254 chars");
    }
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.') =>
        {
            Ok(())
        }
        _ => Err("email is invalid"),
    }
}

fn validate_password(password: &str) -> Result<(), &'static str> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err("password must be >= 6 chars");
    }
    if len > MAX_PASSWORD_LEN {
        return Err("password must be <= 128 chars");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub full_name: String,
    pub email: String,
    pub access_token: String,
    /// Always "Bearer"
    pub token_type: &'static str,
    /// Seconds until the access token expires.
    pub expires_in: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(full_name: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            full_name: full_name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn signup_validation() {
        assert!(signup("Ada", "ada@example.com", "secret").validate().is_ok());

        assert_eq!(
            signup("  ", "ada@example.com", "secret").validate(),
            Err("full_name is required")
        );
        assert_eq!(
            signup("Ada", "ada@example.com", "short").validate(),
            Err("password must be >= 6 chars")
        );
        assert_eq!(
            signup("Ada", "", "secret").validate(),
            Err("email is required")
        );
    }

    #[test]
    fn email_shapes() {
        for ok in ["a@b.co", " ada@example.com ", "first.last@sub.example.org"] {
            assert!(validate_email(ok).is_ok(), "{ok}");
        }
        for bad in ["ada", "@example.com", "ada@", "ada@example", "a@b@c.com", "a@.com", "a@com."] {
            assert_eq!(validate_email(bad), Err("email is invalid"), "{bad}");
        }
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_password("123456").is_ok());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LEN)).is_ok());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LEN + 1)).is_err());
    }

    #[test]
    fn emails_normalize_to_lowercase() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }
}
