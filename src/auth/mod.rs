//! Sessions and ownership.
//!
//! `register` and `login` issue session tokens, `authenticate` resolves a token
//! back to an [`Identity`], and `authorize` decides whether that identity may
//! mutate a stored resource.

mod extract;
pub mod token;

use actix_web::cookie::{time, Cookie, SameSite};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::{post_key, SESSION_COOKIE, SESSION_TTL_HOURS};
use crate::core::db;
use crate::core::errors::ApiError;
use crate::core::helpers::{now, validate_username, validate_uuid, verify_password};
use crate::models::{Identity, Post, User};
use crate::store::{Store, StoreExt};
use crate::AppState;

pub use token::{Claims, SessionKeys};

/// A freshly authenticated user and the token that proves it.
pub struct Session {
    pub user: User,
    pub token: String,
}

pub fn register(state: &AppState, username: &str, password: &str) -> Result<Session, ApiError> {
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::InvalidInput(
            "Username and password are required".to_string(),
        ));
    }
    validate_username(username)?;

    let user = db::create_user(state.store.as_ref(), username, password)?;
    let token = state.sessions.mint(&user.id, now())?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(Session { user, token })
}

/// Verifies credentials and issues a session token.
pub fn login(state: &AppState, username: &str, password: &str) -> Result<Session, ApiError> {
    let mut user = db::find_user_by_username(state.store.as_ref(), username)?
        .ok_or(ApiError::UnknownUser)?;

    if !verify_password(password, &user.password_hash) {
        debug!(username = %user.username, "rejected login");
        return Err(ApiError::InvalidCredentials);
    }

    let issued_at = now();
    user.last_login = Some(issued_at);
    match db::save_user(state.store.as_ref(), &user) {
        Ok(true) => {}
        Ok(false) => warn!(user_id = %user.id, "user vanished while recording login"),
        Err(err) => warn!(user_id = %user.id, error = %err, "failed to record last login"),
    }

    let token = state.sessions.mint(&user.id, issued_at)?;
    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Session { user, token })
}

/// Resolves a presented token to the identity it names, as of `now`.
pub fn authenticate(
    state: &AppState,
    token: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Identity, ApiError> {
    let token = token.ok_or_else(ApiError::unauthenticated)?;
    let claims = state.sessions.verify(token, now)?;

    let user = db::find_user_by_id(state.store.as_ref(), &claims.sub)?
        .ok_or_else(|| ApiError::Unauthenticated("User not found".to_string()))?;
    Ok(Identity::from(&user))
}

/// A stored document with a single owning user.
pub trait OwnedResource: DeserializeOwned {
    const LABEL: &'static str;

    fn storage_key(id: &str) -> String;

    fn owner_id(&self) -> &str;
}

impl OwnedResource for Post {
    const LABEL: &'static str = "Post";

    fn storage_key(id: &str) -> String {
        post_key(id)
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

/// Loads resource `id` and checks `identity` may mutate it (owner or admin).
///
/// No lock is held afterwards; callers write back with `replace`/`delete` and
/// treat a vanished document as not found.
pub fn authorize<R: OwnedResource>(
    store: &dyn Store,
    identity: &Identity,
    id: &str,
) -> Result<R, ApiError> {
    if !validate_uuid(id) {
        return Err(ApiError::not_found(R::LABEL));
    }

    let resource = store
        .get_json::<R>(&R::storage_key(id))?
        .ok_or_else(|| ApiError::not_found(R::LABEL))?;

    if resource.owner_id() != identity.id && !identity.is_admin() {
        warn!(user_id = %identity.id, resource = R::LABEL, id, "ownership check failed");
        return Err(ApiError::Forbidden);
    }
    Ok(resource)
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(time::Duration::hours(SESSION_TTL_HOURS))
        .finish()
}

pub fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = session_cookie(String::new(), secure);
    cookie.make_removal();
    cookie
}
