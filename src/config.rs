use std::net::SocketAddr;
use std::path::PathBuf;

use actix_web::http::Uri;
use anyhow::{bail, Context};
use clap::{Args, ValueEnum};

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 20;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
pub const MAX_POST_LENGTH: usize = 280;
pub const MIN_SECRET_LENGTH: usize = 16;

/// Session tokens are valid for this long after issue, counted in whole seconds.
pub const SESSION_TTL_HOURS: i64 = 24;
pub const SESSION_COOKIE: &str = "token";

pub fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

pub fn username_key(username: &str) -> String {
    format!("username:{}", username)
}

pub fn post_key(id: &str) -> String {
    format!("post:{}", id)
}

pub const POST_PREFIX: &str = "post:";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

/// Runtime settings for `chirp serve`. Every field can come from the environment.
#[derive(Clone, Args)]
pub struct Settings {
    /// Address to listen on
    #[arg(long, env = "CHIRP_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Secret used to sign session tokens
    #[arg(long, env = "CHIRP_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// `memory://`, `file://<dir>` or a plain directory path
    #[arg(long, env = "CHIRP_STORE_URL", default_value = "memory://")]
    pub store_url: String,

    /// Origin allowed to make credentialed cross-origin requests
    #[arg(long, env = "CHIRP_ALLOWED_ORIGIN", default_value = "http://localhost:3000")]
    pub allowed_origin: String,

    #[arg(long, env = "CHIRP_ENV", value_enum, default_value = "production")]
    pub environment: Environment,

    /// Directory holding the built client; enables SPA serving
    #[arg(long, env = "CHIRP_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Seed demo users and posts (development only)
    #[arg(long, env = "CHIRP_SEED_DEMO")]
    pub seed_demo: bool,

    /// HTTP worker threads; defaults to one per core
    #[arg(long, env = "CHIRP_WORKERS")]
    pub workers: Option<usize>,
}

impl Settings {
    /// Settings suitable for tests and local runs: development mode, in-memory store.
    pub fn development(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: jwt_secret.into(),
            store_url: "memory://".to_string(),
            allowed_origin: "http://localhost:3000".to_string(),
            environment: Environment::Development,
            static_dir: None,
            seed_demo: false,
            workers: None,
        }
    }

    pub fn secure_cookies(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt_secret.len() < MIN_SECRET_LENGTH {
            bail!("CHIRP_JWT_SECRET must be at least {} bytes", MIN_SECRET_LENGTH);
        }
        if self.allowed_origin.trim() == "*" {
            bail!("CHIRP_ALLOWED_ORIGIN cannot be a wildcard with credentialed CORS");
        }

        // actix-cors fails every worker's App construction on an unparsable origin
        let origin: Uri = self
            .allowed_origin
            .parse()
            .with_context(|| format!("CHIRP_ALLOWED_ORIGIN is not a URI: {:?}", self.allowed_origin))?;
        if origin.scheme().is_none() || origin.host().is_none() {
            bail!(
                "CHIRP_ALLOWED_ORIGIN must be scheme://host[:port], got {:?}",
                self.allowed_origin
            );
        }
        if self.workers == Some(0) {
            bail!("CHIRP_WORKERS must be at least 1");
        }
        Ok(())
    }
}
