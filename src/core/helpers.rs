use std::collections::HashSet;
use std::sync::OnceLock;

use ammonia::Builder;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use html_escape::decode_html_entities;
use rand::rngs::OsRng;
use regex::Regex;
use uuid::Uuid;

use crate::config::{MAX_DESCRIPTION_LENGTH, MAX_POST_LENGTH, MAX_USERNAME_LENGTH, MIN_USERNAME_LENGTH};
use crate::core::errors::ApiError;

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

/// Constant-time check of `password` against a stored PHC hash string.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub fn validate_uuid(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

fn username_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        let pattern = format!(
            "^[A-Za-z0-9_]{{{},{}}}$",
            MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
        );
        Regex::new(&pattern).expect("username regex should compile")
    })
}

pub fn is_valid_username(username: &str) -> bool {
    username_regex().is_match(username)
}

pub fn validate_username(username: &str) -> Result<(), ApiError> {
    if is_valid_username(username) {
        Ok(())
    } else {
        Err(ApiError::InvalidInput(format!(
            "Username must be {}-{} letters, digits or underscores",
            MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
        )))
    }
}

/// Trims and bounds post content. Returns the text to store.
pub fn validate_post_content(content: Option<&str>) -> Result<String, ApiError> {
    let content = content.map(str::trim).unwrap_or_default();
    if content.is_empty() {
        return Err(ApiError::InvalidInput("Content is required".to_string()));
    }
    if content.chars().count() > MAX_POST_LENGTH {
        return Err(ApiError::InvalidInput(format!(
            "Content must be at most {} characters",
            MAX_POST_LENGTH
        )));
    }
    Ok(content.to_string())
}

pub fn validate_description(description: &str) -> Result<(), ApiError> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ApiError::InvalidInput(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        )));
    }
    Ok(())
}

/// Strips all markup, leaving plain text.
///
/// ammonia escapes the text it keeps; that is undone so plain text is stored verbatim.
pub fn sanitize_text(text: &str) -> String {
    let cleaned = Builder::default().tags(HashSet::new()).clean(text).to_string();
    decode_html_entities(&cleaned).into_owned()
}
