// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Describe endpoint module
//!
//! Provides POST /analyze.

pub mod handler;

pub use handler::describe_handler;
