// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod handler;

pub use handler::{diagram_handler, edges_handler};
