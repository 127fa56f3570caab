//! Antenna field server
//! - Audio upload and decode
//! - Per-session simulation state
//! - Field frames (JSON, binary, SVG) and antenna mesh

use anyhow::{Context, Result};
use antenna_field::RenderConfig;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    routing::{get, post},
    Router,
};
use clap::{builder::RangedU64ValueParser, Parser};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

mod api;
mod error;
mod state;
mod upload;

use state::{AppState, SessionStore};

#[derive(Parser, Debug)]
#[command(name = "antenna-server")]
#[command(about = "Serve the audio-driven antenna field visualization")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Directory of static client files served for unmatched paths
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Maximum upload request size in bytes
    #[arg(long, default_value_t = 16 * 1024 * 1024)]
    max_upload_bytes: usize,

    /// Field frames rendered per upload
    #[arg(long, default_value = "30", value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    frames: usize,

    /// Sessions kept before the oldest is evicted
    #[arg(long, default_value = "256", value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    max_sessions: usize,
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(api::SESSION_HEADER),
        ])
}

fn app(state: Arc<AppState>, static_dir: Option<PathBuf>) -> Router {
    let max_upload = state.max_upload_bytes;

    let router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/upload", post(upload::upload))
        .route("/update-parameters", post(api::update_parameters))
        .route("/sessions/:id", get(api::get_session).delete(api::delete_session))
        .route("/sessions/:id/time", post(api::set_time))
        .route("/sessions/:id/field", get(api::field_binary).post(api::evaluate_field))
        .route("/sessions/:id/frame.svg", get(api::frame_svg))
        .route("/sessions/:id/antenna", get(api::antenna_mesh))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(cors_layer())
        .with_state(state);

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let state = Arc::new(AppState {
        sessions: SessionStore::new(args.max_sessions),
        render: RenderConfig {
            frames: args.frames,
            ..Default::default()
        },
        max_upload_bytes: args.max_upload_bytes,
    });

    if let Some(dir) = &args.static_dir {
        info!("Serving static files from {:?}", dir);
    }

    let app = app(state, args.static_dir.clone());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;
    info!("Server: http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
