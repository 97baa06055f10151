use std::net::TcpListener;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chirp::config::Settings;
use chirp::core::db;
use chirp::models::Role;
use chirp::{store, AppState};

#[derive(Parser)]
#[command(name = "chirp", version, about = "Minimal social posting service")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "CHIRP_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve(Settings),
    /// Grant the admin role to an existing user
    Promote {
        username: String,
        #[arg(long, env = "CHIRP_STORE_URL", default_value = "memory://")]
        store_url: String,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    settings.validate()?;

    let store = store::open(&settings.store_url)
        .with_context(|| format!("failed to open store {}", settings.store_url))?;

    if settings.seed_demo {
        if settings.environment.is_development() {
            db::seed_demo_data(store.as_ref()).context("failed to seed demo data")?;
        } else {
            warn!("ignoring CHIRP_SEED_DEMO outside development");
        }
    }

    let listener = TcpListener::bind(settings.bind)
        .with_context(|| format!("failed to bind {}", settings.bind))?;
    info!(
        addr = %listener.local_addr()?,
        environment = ?settings.environment,
        store = %settings.store_url,
        "server listening"
    );

    let state = AppState::new(store, settings);
    chirp::run(listener, state)?.await?;
    Ok(())
}

fn promote(store_url: &str, username: &str) -> anyhow::Result<()> {
    if store_url == "memory://" {
        anyhow::bail!("promoting in a memory store has no lasting effect; set CHIRP_STORE_URL");
    }
    let store = store::open(store_url).with_context(|| format!("failed to open store {}", store_url))?;
    let user = db::set_role(store.as_ref(), username, Role::Admin)?;
    println!("{} is now an admin", user.username);
    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Serve(settings) => serve(settings).await,
        Command::Promote { username, store_url } => promote(&store_url, &username),
    }
}
