// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Result shapes and normalizers for structured model output
//!
//! Model text is parsed strictly: anything that is not valid JSON of the
//! expected shape becomes a `MalformedUpstreamResponse` carrying the raw
//! text. Ids are reassigned sequentially from 1 in emission order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::AnalysisError;
use crate::vision::{NodeDetection, TextBlock};

/// A node named by the vision model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmNode {
    pub id: u32,
    pub label: String,
}

/// A connection between two diagram components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: u32,
    pub source: String,
    pub target: String,
}

/// Combined single-call extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramGraph {
    pub nodes: Vec<LlmNode>,
    pub edges: Vec<Edge>,
}

/// Free-text description paired with the URL that was analyzed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub description: String,
    /// `None` for uploaded images
    pub url: Option<String>,
}

/// Result of exactly one analysis strategy
///
/// Serialized untagged so each variant keeps its own wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Ocr(Vec<TextBlock>),
    Detection(Vec<NodeDetection>),
    Nodes(Vec<LlmNode>),
    Edges(Vec<Edge>),
    Description(Description),
    Graph(DiagramGraph),
}

impl AnalysisOutcome {
    /// Variant name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ocr(_) => "ocr",
            Self::Detection(_) => "detection",
            Self::Nodes(_) => "nodes",
            Self::Edges(_) => "edges",
            Self::Description(_) => "description",
            Self::Graph(_) => "graph",
        }
    }

    /// Number of items produced, for logs
    pub fn item_count(&self) -> usize {
        match self {
            Self::Ocr(v) => v.len(),
            Self::Detection(v) => v.len(),
            Self::Nodes(v) => v.len(),
            Self::Edges(v) => v.len(),
            Self::Description(_) => 1,
            Self::Graph(g) => g.nodes.len() + g.edges.len(),
        }
    }
}

/// Parse `{id, source, target}` edges from model text
pub fn normalize_edges(raw: &str) -> Result<Vec<Edge>, AnalysisError> {
    let value = parse(raw)?;
    let items = find_list(&value, "edges").ok_or_else(|| {
        AnalysisError::malformed("expected a list of edges", raw)
    })?;
    edges_from(items, raw)
}

/// Parse `{id, label}` nodes from model text
pub fn normalize_nodes(raw: &str) -> Result<Vec<LlmNode>, AnalysisError> {
    let value = parse(raw)?;
    let items = find_list(&value, "nodes").ok_or_else(|| {
        AnalysisError::malformed("expected a list of nodes", raw)
    })?;
    nodes_from(items, raw)
}

/// Parse a `{nodes, edges}` object from model text
pub fn normalize_graph(raw: &str) -> Result<DiagramGraph, AnalysisError> {
    let value = parse(raw)?;
    let object = value
        .as_object()
        .ok_or_else(|| AnalysisError::malformed("expected an object with nodes and edges", raw))?;

    let list = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| AnalysisError::malformed(format!("missing '{}' list", key), raw))
    };

    Ok(DiagramGraph {
        nodes: nodes_from(list("nodes")?, raw)?,
        edges: edges_from(list("edges")?, raw)?,
    })
}

fn parse(raw: &str) -> Result<Value, AnalysisError> {
    serde_json::from_str(raw).map_err(|e| AnalysisError::malformed(e, raw))
}

/// A top-level array, the array under `key`, or an object's only array value
fn find_list<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => match map.get(key) {
            Some(Value::Array(items)) => Some(items),
            Some(_) => None,
            None => single_array(map),
        },
        _ => None,
    }
}

fn single_array(map: &Map<String, Value>) -> Option<&Vec<Value>> {
    let mut arrays = map.values().filter_map(Value::as_array);
    match (arrays.next(), arrays.next()) {
        (Some(items), None) => Some(items),
        _ => None,
    }
}

fn string_field(item: &Value, key: &str, index: usize, raw: &str) -> Result<String, AnalysisError> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            AnalysisError::malformed(format!("item {} has no string '{}'", index + 1, key), raw)
        })
}

fn edges_from(items: &[Value], raw: &str) -> Result<Vec<Edge>, AnalysisError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            Ok(Edge {
                id: i as u32 + 1,
                source: string_field(item, "source", i, raw)?,
                target: string_field(item, "target", i, raw)?,
            })
        })
        .collect()
}

fn nodes_from(items: &[Value], raw: &str) -> Result<Vec<LlmNode>, AnalysisError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            Ok(LlmNode {
                id: i as u32 + 1,
                label: string_field(item, "label", i, raw)?,
            })
        })
        .collect()
}
