// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tesseract TSV parsing and grouping of words into text blocks

use serde::{Deserialize, Serialize};

use super::OcrError;

/// A recognized word with its pixel box and confidence (0-100)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub conf: f32,
}

/// One entry of the engine's flat token stream
#[derive(Debug, Clone, PartialEq)]
pub struct OcrToken {
    pub block_num: u32,
    pub word: OcrWord,
}

/// Words of one layout block, in approximate reading order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub block_num: u32,
    pub text: String,
    pub words: Vec<OcrWord>,
}

const REQUIRED_COLUMNS: [&str; 7] = [
    "block_num", "left", "top", "width", "height", "conf", "text",
];

/// Parse `tesseract ... tsv` output into word tokens
///
/// Rows above word level carry `conf = -1` and empty text; they are kept
/// here and dropped by the confidence filter in [`group_into_blocks`].
pub fn parse_tsv(tsv: &str) -> Result<Vec<OcrToken>, OcrError> {
    let mut lines = tsv.lines();
    let header = lines
        .next()
        .ok_or_else(|| OcrError::InvalidOutput("empty TSV output".to_string()))?;
    let columns: Vec<&str> = header.split('\t').collect();

    let mut index = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, name) in index.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = columns
            .iter()
            .position(|c| c.trim() == name)
            .ok_or_else(|| OcrError::InvalidOutput(format!("missing TSV column '{}'", name)))?;
    }
    let [block_i, left_i, top_i, width_i, height_i, conf_i, text_i] = index;

    let mut tokens = Vec::new();
    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        // The text column is last and may itself be missing on structural rows
        let fields: Vec<&str> = line.splitn(columns.len(), '\t').collect();
        let field = |i: usize| fields.get(i).copied().unwrap_or("");
        let int = |i: usize| -> Result<i32, OcrError> {
            field(i).trim().parse::<i32>().map_err(|_| {
                OcrError::InvalidOutput(format!(
                    "row {}: bad integer '{}' in column {}",
                    line_no + 2,
                    field(i),
                    columns[i]
                ))
            })
        };

        let conf = field(conf_i).trim().parse::<f32>().map_err(|_| {
            OcrError::InvalidOutput(format!("row {}: bad confidence '{}'", line_no + 2, field(conf_i)))
        })?;

        tokens.push(OcrToken {
            block_num: int(block_i)?.max(0) as u32,
            word: OcrWord {
                text: field(text_i).trim().to_string(),
                left: int(left_i)?,
                top: int(top_i)?,
                width: int(width_i)?,
                height: int(height_i)?,
                conf,
            },
        });
    }

    Ok(tokens)
}

/// Group tokens into blocks
///
/// Blocks appear in first-seen order of their block number. Tokens with
/// empty text or confidence below `min_confidence` are dropped. Within a
/// block words are sorted by (top, left); the sort is stable so exact ties
/// keep engine order. No bidi or multi-column awareness.
pub fn group_into_blocks(tokens: Vec<OcrToken>, min_confidence: f32) -> Vec<TextBlock> {
    let mut blocks: Vec<TextBlock> = Vec::new();

    for token in tokens {
        if token.word.text.is_empty() || token.word.conf < min_confidence {
            continue;
        }
        match blocks.iter_mut().find(|b| b.block_num == token.block_num) {
            Some(block) => block.words.push(token.word),
            None => blocks.push(TextBlock {
                block_num: token.block_num,
                text: String::new(),
                words: vec![token.word],
            }),
        }
    }

    for block in &mut blocks {
        block.words.sort_by_key(|w| (w.top, w.left));
        block.text = block
            .words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
    }

    blocks
}
