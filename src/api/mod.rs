// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod describe_image;
pub mod edges;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod http_server;
pub mod nodes;
pub mod ocr;
pub mod upload_url;

pub use describe_image::describe_handler;
pub use edges::{diagram_handler, edges_handler};
pub use errors::{ApiError, ErrorResponse};
pub use extract::{ImageRequest, ImageSource};
pub use handlers::{health_handler, BackendStatus, HealthResponse};
pub use http_server::{create_router, start_server, AppState};
pub use nodes::{detect_nodes_handler, llm_nodes_handler};
pub use ocr::ocr_handler;
pub use upload_url::{generate_upload_url_handler, UploadUrlRequest};
