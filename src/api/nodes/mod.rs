// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node endpoints: POST /nodes (detector) and POST /analyze/nodes (vision model)

pub mod handler;

pub use handler::{detect_nodes_handler, llm_nodes_handler};
