// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::describe_image::describe_handler;
use super::edges::{diagram_handler, edges_handler};
use super::handlers::{health_handler, BackendStatus};
use super::nodes::{detect_nodes_handler, llm_nodes_handler};
use super::ocr::ocr_handler;
use super::upload_url::generate_upload_url_handler;
use crate::analysis::Dispatcher;
use crate::config::ServerConfig;
use crate::storage::UploadUrlSigner;

/// Headroom on top of the image limit for multipart framing and text fields
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Method and path of every route, for the startup log
pub const ROUTES: &[(&str, &str)] = &[
    ("GET", "/health"),
    ("POST", "/ocr"),
    ("POST", "/analyze/ocr"),
    ("POST", "/nodes"),
    ("POST", "/analyze/nodes"),
    ("POST", "/analyze/edges"),
    ("POST", "/analyze/diagram"),
    ("POST", "/analyze"),
    ("POST", "/generate-upload-url"),
];

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub upload_signer: Option<Arc<dyn UploadUrlSigner>>,
    pub backends: BackendStatus,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, upload_signer: Option<Arc<dyn UploadUrlSigner>>) -> Self {
        let backends = BackendStatus {
            ocr: true,
            detection: dispatcher.has_detector(),
            llm: dispatcher.has_vlm(),
            storage: upload_signer.is_some(),
        };
        Self {
            dispatcher: Arc::new(dispatcher),
            upload_signer,
            backends,
        }
    }
}

/// CORS for the configured origins; a `*` entry allows any origin
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        // Text blocks
        .route("/ocr", post(ocr_handler))
        .route("/analyze/ocr", post(ocr_handler))
        // Nodes: detector and vision model
        .route("/nodes", post(detect_nodes_handler))
        .route("/analyze/nodes", post(llm_nodes_handler))
        // Edges and full graph
        .route("/analyze/edges", post(edges_handler))
        .route("/analyze/diagram", post(diagram_handler))
        .route("/analyze", post(describe_handler))
        .route("/generate-upload-url", post(generate_upload_url_handler))
        .layer(DefaultBodyLimit::max(
            config.max_upload_bytes.saturating_add(BODY_LIMIT_SLACK),
        ))
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(state: AppState, config: &ServerConfig) -> anyhow::Result<()> {
    let app = create_router(state, config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("API server listening on {}", addr);
    for (method, path) in ROUTES {
        info!("  {} {}", method, path);
    }
    info!("CORS origins: {}", config.cors_allowed_origins.join(", "));

    axum::serve(listener, app).await?;

    Ok(())
}
