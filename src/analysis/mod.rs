// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multi-backend diagram analysis: error taxonomy, result shapes, dispatcher

pub mod dispatcher;
pub mod error;
pub mod normalize;

pub use dispatcher::{AnalysisRequest, Dispatcher, Stage, Strategy};
pub use error::{AnalysisError, AnalysisErrorKind};
pub use normalize::{AnalysisOutcome, Description, DiagramGraph, Edge, LlmNode};
