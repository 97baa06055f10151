use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::auth::authorize;
use crate::config::post_key;
use crate::core::db;
use crate::core::errors::ApiError;
use crate::core::helpers::{now, validate_post_content};
use crate::models::{Identity, Post};
use crate::store::{Store, StoreExt};
use crate::AppState;

#[derive(Deserialize)]
pub struct PostBody {
    content: Option<String>,
}

pub async fn list_posts(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let posts = web::block(move || db::list_posts(state.store.as_ref(), None)).await??;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn list_user_posts(
    state: web::Data<AppState>,
    username: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let username = username.into_inner();
    let posts = web::block(move || db::list_posts(state.store.as_ref(), Some(username.as_str())))
        .await??;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostBody>,
) -> Result<HttpResponse, ApiError> {
    let content = validate_post_content(body.content.as_deref())?;

    let post = Post::new(&identity, content, now());
    let post = web::block(move || db::insert_post(state.store.as_ref(), &post).map(|()| post))
        .await??;

    info!(post_id = %post.id, user_id = %identity.id, "post created");
    Ok(HttpResponse::Created().json(post))
}

pub async fn edit_post(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<String>,
    body: web::Json<PostBody>,
) -> Result<HttpResponse, ApiError> {
    let content = body.into_inner().content;
    let post_id = post_id.into_inner();
    let post = web::block(move || {
        update_post(state.store.as_ref(), &identity, &post_id, content.as_deref())
    })
    .await??;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let post_id = post_id.into_inner();
    web::block(move || remove_post(state.store.as_ref(), &identity, &post_id)).await??;
    Ok(HttpResponse::Ok().json(json!({ "message": "Post deleted successfully" })))
}

fn update_post(
    store: &dyn Store,
    identity: &Identity,
    post_id: &str,
    content: Option<&str>,
) -> Result<Post, ApiError> {
    let mut post: Post = authorize(store, identity, post_id)?;

    post.content = validate_post_content(content)?;
    post.updated_at = now();

    // the post may have been deleted since it was authorized
    if !store.replace_json(&post_key(&post.id), &post)? {
        return Err(ApiError::not_found("Post"));
    }

    info!(post_id = %post.id, user_id = %identity.id, "post updated");
    Ok(post)
}

fn remove_post(store: &dyn Store, identity: &Identity, post_id: &str) -> Result<Post, ApiError> {
    let post: Post = authorize(store, identity, post_id)?;

    if !store.delete(&post_key(&post.id))? {
        return Err(ApiError::not_found("Post"));
    }

    info!(post_id = %post.id, user_id = %identity.id, owner_id = %post.owner_id, "post deleted");
    Ok(post)
}
