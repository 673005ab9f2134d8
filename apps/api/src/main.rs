mod auth;
mod config;
mod db;
mod errors;
mod extract;
mod gateway;
mod generation;
mod json;
mod llm_client;
mod models;
mod onboarding;
mod optimization;
mod parser;
mod resumes;
mod routes;
mod schema;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::gateway::PostgresGateway;
use crate::llm_client::LlmClient;
use crate::onboarding::DocumentParserClient;
use crate::optimization::lock::{LocalLock, RedisLock, RegenerationLock};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Portfolio API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (migrations run here)
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    let gateway = PostgresGateway::new(
        db,
        s3,
        config.s3_bucket.clone(),
        config.s3_public_url.clone(),
    );

    // Initialize LLM client
    let llm = LlmClient::new(
        config.llm_api_key.clone(),
        config.llm_base_url.clone(),
        config.llm_model.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm.model());

    // Regeneration lock: Redis when configured, in-process otherwise.
    // A lease outlives a request by at most twice the upstream bound.
    let locks: Arc<dyn RegenerationLock> = match &config.redis_url {
        Some(url) => {
            let redis = redis::Client::open(url.as_str())?;
            info!("Redis regeneration lock initialized");
            Arc::new(RedisLock::new(redis, config.upstream_timeout * 2))
        }
        None => {
            info!("REDIS_URL not set; regeneration lock is process-local");
            Arc::new(LocalLock::new())
        }
    };

    let http = reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .build()?;
    let doc_parser = config
        .doc_parser_url
        .as_deref()
        .map(|url| DocumentParserClient::new(http.clone(), url));
    if doc_parser.is_some() {
        info!("External document parser enabled for onboarding");
    }

    // Build app state
    let state = AppState {
        gateway: Arc::new(gateway),
        llm: Arc::new(llm),
        locks,
        http,
        doc_parser,
        upstream_timeout: config.upstream_timeout,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the web client's domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "portfolio-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not by virtual host.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
