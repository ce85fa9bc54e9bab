//! Pantofola-Rest server.
//!
//! ```text
//!   Client ──▶ HttpServer (axum + tower-http layers)
//!                  │
//!                  ▼
//!               Cascade ──"/api"──────▶ api Router
//!                  │   ──"/static"───▶ files Router (static_files)
//!                  ▼
//!              main Router
//! ```
//!
//! Every router carries the decorators enabled in the config file.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pantofola_rest::config::{load_config, ServerConfig};
use pantofola_rest::http::{static_files, HttpServer};
use pantofola_rest::middleware::{Cors, NoCache, RequestLogging};
use pantofola_rest::routing::{defaults, Cascade, Params, Request, RouteError, Router, RouterBuilder};

#[derive(Parser, Debug)]
#[command(name = "pantofola-rest", version, about = "Path-based HTTP dispatch server")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.observability.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("pantofola-rest v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        config_file = ?cli.config,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let app = build_app(&config)?;
    tracing::debug!(?app, "Routes ready");

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    HttpServer::new(config, app).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Assemble the cascade served by this binary.
fn build_app(config: &ServerConfig) -> Result<Cascade, RouteError> {
    let main = decorate(Router::builder(), config)
        .get("/hello", hello)?
        .get("/hello/:name", hello)?
        .build();

    let api = decorate(Router::builder(), config)
        .get("/a", |_: Request, _: Params| async { "Api A" })?
        .get("/b", |_: Request, _: Params| async { "Api B" })?
        .get("/echo/:word", echo)?
        .post("/echo/:word", echo)?
        .build();

    let mut cascade = Cascade::builder().set("", main)?.set("/api", api)?;

    let files = &config.static_files;
    if files.enabled {
        let router = decorate(Router::builder(), config)
            .get("/:*", static_files::serve(&files.root, defaults::not_found))?
            .index(static_files::serve(&files.root, defaults::not_found))
            .build();
        tracing::info!(root = %files.root, prefix = %files.prefix, "Serving static files");
        cascade = cascade.set(&files.prefix, router)?;
    }

    Ok(cascade.build())
}

/// Apply pool sizing and the decorators enabled in `config`.
fn decorate(builder: RouterBuilder, config: &ServerConfig) -> RouterBuilder {
    let mut builder = builder.pool_size(config.pool.initial_size, config.pool.max_size);

    if config.observability.request_logging {
        builder = builder.use_middleware(RequestLogging);
    }

    let cors = &config.headers.cors;
    if cors.enabled {
        let mut layer = Cors::new();
        if cors.preflight {
            let methods: Vec<&str> = cors.allowed_methods.iter().map(String::as_str).collect();
            let headers: Vec<&str> = cors.allowed_headers.iter().map(String::as_str).collect();
            layer = layer.preflight(&methods, &headers, cors.max_age_secs);
        }
        builder = builder.use_middleware(layer);
    }

    if config.headers.no_cache {
        builder = builder.use_middleware(NoCache);
    }
    builder
}

async fn hello(_: Request, params: Params) -> String {
    match params.get("name") {
        Some(name) => format!("Hello, {name}!"),
        None => "Hello!".to_string(),
    }
}

async fn echo(req: Request, params: Params) -> String {
    format!("{} {}", req.method(), params.get("word").unwrap_or_default())
}
