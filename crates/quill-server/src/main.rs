//! quill-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, builds the generation client, and serves the
//! story API over HTTP.
//!
//! Configuration can also come from `QUILL`-prefixed environment
//! variables, e.g. `QUILL_GENERATOR__API_KEY`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::{
  Json, Router,
  http::{HeaderValue, Method, header},
  routing::get,
};
use clap::Parser;
use quill_api::ApiState;
use quill_gen::{GeneratorConfig, OpenAiGenerator};
use quill_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
struct ServerConfig {
  host:        String,
  port:        u16,
  store_path:  PathBuf,
  /// Frontend origin allowed by the CORS layer.
  cors_origin: String,
  generator:   GeneratorConfig,
}

#[derive(Parser)]
#[command(author, version, about = "Quill story generation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("QUILL").separator("__"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open SQLite store.
  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| {
      format!("failed to open store at {:?}", server_cfg.store_path)
    })?;

  // Build application state.
  let state = ApiState {
    store:     Arc::new(store),
    generator: Arc::new(OpenAiGenerator::new(server_cfg.generator.clone())),
  };

  // The browser client sends credentialed requests, so the origin must be
  // listed explicitly rather than using a wildcard.
  let cors = CorsLayer::new()
    .allow_origin(
      server_cfg
        .cors_origin
        .parse::<HeaderValue>()
        .context("invalid cors_origin")?,
    )
    .allow_methods([Method::GET, Method::POST, Method::DELETE])
    .allow_headers([header::CONTENT_TYPE])
    .allow_credentials(true);

  let app = Router::new()
    .route("/", get(root))
    .merge(quill_api::api_router(state))
    .layer(TraceLayer::new_for_http())
    .layer(cors);

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// `GET /` — service banner.
async fn root() -> Json<serde_json::Value> {
  Json(serde_json::json!({
    "message": "Welcome to the AI Story Generation API"
  }))
}
