// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod analysis;
pub mod api;
pub mod cli;
pub mod config;
pub mod storage;
pub mod vision;

pub use analysis::{AnalysisError, AnalysisErrorKind, AnalysisOutcome, Dispatcher, Strategy};
pub use config::ServiceConfig;
