//! Gigadventure auth API server binary.
//!
//! Serves register / login / logout over HTTP. Uses PostgreSQL when a
//! database URL is given, otherwise an in-memory credential store.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use gig_api::config::LogoutPolicy;
use gig_core::auth::jwt::{
    DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS, TokenService, resolve_jwt_secret,
};
use gig_core::auth::memory::MemoryCredentialStore;
use gig_core::auth::password::{
    BcryptHasher, DEFAULT_BCRYPT_COST, MAX_BCRYPT_COST, MIN_BCRYPT_COST,
};
use gig_core::auth::queries::PgCredentialStore;
use gig_core::auth::revocation::DEFAULT_SWEEP_INTERVAL_SECS;
use gig_core::auth::service::AuthService;
use gig_core::auth::store::CredentialStore;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Roles provisioned in the in-memory store.
const MEMORY_ROLES: [&str; 2] = ["USER", "ADMIN"];

/// CLI arguments for the API server. Every flag but `--max-connections`
/// falls back to its environment variable (`.env` is loaded first).
#[derive(Parser, Debug)]
#[command(name = "gig_api_server", about = "Gigadventure auth API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
    bind: String,

    /// PostgreSQL connection URL. Without it users live in memory.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Access token lifetime in seconds.
    #[arg(
        long,
        env = "TOKEN_TTL_SECS",
        default_value_t = DEFAULT_TOKEN_TTL_SECS,
        value_parser = clap::value_parser!(i64).range(1..=MAX_TOKEN_TTL_SECS)
    )]
    token_ttl_secs: i64,

    /// Seconds between sweeps of expired revocation entries.
    #[arg(
        long,
        env = "REVOCATION_SWEEP_SECS",
        default_value_t = DEFAULT_SWEEP_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    sweep_interval_secs: u64,

    /// How logout treats a missing or invalid token: `lenient` or `strict`.
    #[arg(long, env = "LOGOUT_POLICY", default_value_t = LogoutPolicy::Lenient)]
    logout_policy: LogoutPolicy,

    /// bcrypt cost factor for new password hashes.
    #[arg(
        long,
        env = "BCRYPT_COST",
        default_value_t = DEFAULT_BCRYPT_COST,
        value_parser = clap::value_parser!(u32)
            .range(i64::from(MIN_BCRYPT_COST)..=i64::from(MAX_BCRYPT_COST))
    )]
    bcrypt_cost: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gig_api=debug,gig_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    info!(
        bind = %args.bind,
        persistent = args.database_url.is_some(),
        logout_policy = %args.logout_policy,
        "starting gig_api_server"
    );

    let jwt_secret = resolve_jwt_secret();

    let store: Arc<dyn CredentialStore> = match &args.database_url {
        Some(url) => {
            info!(max_connections = args.max_connections, "configuring connection pool");
            let pool = PgPoolOptions::new()
                .max_connections(args.max_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(url)
                .await?;

            info!("running database migrations");
            gig_core::migrate::migrate(&pool).await?;
            Arc::new(PgCredentialStore::new(pool))
        }
        None => {
            warn!("no DATABASE_URL set, users are kept in memory");
            Arc::new(MemoryCredentialStore::with_roles(MEMORY_ROLES))
        }
    };

    let ttl = chrono::TimeDelta::try_seconds(args.token_ttl_secs)
        .ok_or("token TTL is out of range")?;
    let tokens = TokenService::with_ttl(jwt_secret.as_bytes(), ttl);
    let auth = AuthService::new(store, Arc::new(BcryptHasher::new(args.bcrypt_cost)), tokens);

    if let Err(e) = auth.ensure_default_role().await {
        error!(error = %e, "default role is not provisioned");
        return Err(e.into());
    }

    let cancel = CancellationToken::new();
    let sweeper = auth.tokens().revocations().spawn_sweeper(
        Duration::from_secs(args.sweep_interval_secs),
        cancel.clone(),
    );

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    let local_addr = listener.local_addr()?;

    let app = gig_api::router(gig_api::AppState {
        auth: Arc::new(auth),
        logout_policy: args.logout_policy,
    });

    info!(addr = %local_addr, "REST API listening");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await;

    cancel.cancel();
    let _ = sweeper.await;

    result?;

    Ok(())
}
