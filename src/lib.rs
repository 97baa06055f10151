//! chirp: a small social posting service.
//!
//! Users register and log in with a cookie-carried session token, publish short
//! posts, and edit or delete the posts they own.

pub mod auth;
pub mod config;
pub mod core;
pub mod models;
pub mod posts;
pub mod static_server;
pub mod store;
pub mod users;

use std::net::TcpListener;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::http::{header, StatusCode};
use actix_web::middleware::{Condition, ErrorHandlers, Logger};
use actix_web::{web, App, HttpServer};

use crate::auth::SessionKeys;
use crate::config::Settings;
use crate::core::errors::{expose_internal_detail, ApiError};
use crate::store::Store;

/// Process-wide state, built once at startup and read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: Arc<SessionKeys>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, settings: Settings) -> Self {
        Self {
            store,
            sessions: Arc::new(SessionKeys::new(settings.jwt_secret.as_bytes())),
            settings: Arc::new(settings),
        }
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/users")
            .route("/register", web::post().to(users::register))
            .route("/login", web::post().to(users::login))
            .route("/logout", web::post().to(users::logout))
            .route("/description", web::put().to(users::update_description))
            .route("/{username}", web::get().to(users::get_profile)),
    )
    .service(
        web::scope("/api/posts")
            .route("", web::get().to(posts::list_posts))
            .route("", web::post().to(posts::create_post))
            .route("/user/{username}", web::get().to(posts::list_user_posts))
            .route("/{id}", web::put().to(posts::edit_post))
            .route("/{id}", web::delete().to(posts::delete_post)),
    );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::InvalidInput(format!("Invalid request body: {}", err)).into())
}

fn cors(settings: &Settings) -> Cors {
    Cors::default()
        .allowed_origin(&settings.allowed_origin)
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .supports_credentials()
        .max_age(3600)
}

/// Builds the HTTP server on an already bound listener.
pub fn run(listener: TcpListener, state: AppState) -> std::io::Result<Server> {
    let workers = state.settings.workers;
    let state = web::Data::new(state);

    let mut server = HttpServer::new(move || {
        let settings = &state.settings;
        App::new()
            .wrap(Condition::new(
                settings.environment.is_development(),
                ErrorHandlers::new()
                    .handler(StatusCode::INTERNAL_SERVER_ERROR, expose_internal_detail),
            ))
            .wrap(cors(settings))
            .wrap(Logger::new("%a \"%r\" %s %b %T"))
            .app_data(state.clone())
            .app_data(json_config())
            .configure(routes)
            .default_service(web::to(static_server::serve_static))
    });
    if let Some(workers) = workers {
        server = server.workers(workers);
    }

    Ok(server.listen(listener)?.run())
}
