use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::auth::{self, cleared_session_cookie, session_cookie, Session};
use crate::core::db;
use crate::core::errors::ApiError;
use crate::core::helpers::{sanitize_text, validate_description};
use crate::models::{Identity, PublicProfile, SessionUser};
use crate::store::Store;
use crate::AppState;

/// Login/registration body. Deliberately not `Debug`: it carries a password.
#[derive(Deserialize)]
pub struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct DescriptionUpdate {
    description: Option<String>,
}

fn session_response(
    mut builder: actix_web::HttpResponseBuilder,
    state: &AppState,
    session: Session,
) -> HttpResponse {
    builder
        .cookie(session_cookie(session.token, state.settings.secure_cookies()))
        .json(SessionUser::from(&session.user))
}

pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> Result<HttpResponse, ApiError> {
    let Credentials { username, password } = body.into_inner();
    let blocking_state = state.clone();
    let session =
        web::block(move || auth::register(&blocking_state, &username, &password)).await??;
    Ok(session_response(HttpResponse::Created(), &state, session))
}

pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> Result<HttpResponse, ApiError> {
    let Credentials { username, password } = body.into_inner();
    let blocking_state = state.clone();
    let session = web::block(move || auth::login(&blocking_state, &username, &password)).await??;
    Ok(session_response(HttpResponse::Ok(), &state, session))
}

pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(cleared_session_cookie(state.settings.secure_cookies()))
        .json(json!({ "message": "Logged out successfully" }))
}

pub async fn get_profile(
    state: web::Data<AppState>,
    username: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let username = username.into_inner();
    let user = web::block(move || db::find_user_by_username(state.store.as_ref(), &username))
        .await??
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(HttpResponse::Ok().json(PublicProfile::from(&user)))
}

pub async fn update_description(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<DescriptionUpdate>,
) -> Result<HttpResponse, ApiError> {
    let description = body
        .into_inner()
        .description
        .ok_or_else(|| ApiError::InvalidInput("Description is required".to_string()))?;

    let stored = web::block(move || {
        set_description(state.store.as_ref(), &identity, &description)
    })
    .await??;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Description updated successfully",
        "description": stored,
    })))
}

/// Sanitizes and stores a new description; the limit applies to the stored text.
fn set_description(store: &dyn Store, identity: &Identity, raw: &str) -> Result<String, ApiError> {
    let description = sanitize_text(raw);
    validate_description(&description)?;

    let mut user = db::find_user_by_id(store, &identity.id)?
        .ok_or_else(|| ApiError::not_found("User"))?;
    user.description = description;

    if !db::save_user(store, &user)? {
        return Err(ApiError::not_found("User"));
    }

    info!(user_id = %user.id, "description updated");
    Ok(user.description)
}
