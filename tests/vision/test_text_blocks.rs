// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Tesseract TSV through to text blocks

use diagram_analyzer::vision::ocr::{group_into_blocks, parse_tsv};

const HEADER: &str =
    "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

fn tsv(rows: &[&str]) -> String {
    let mut out = String::from(HEADER);
    for row in rows {
        out.push('\n');
        out.push_str(row);
    }
    out.push('\n');
    out
}

#[test]
fn test_diagram_labels_grouped_by_block() {
    let output = tsv(&[
        "1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t",
        "2\t1\t1\t0\t0\t0\t20\t30\t120\t20\t-1\t",
        "5\t1\t1\t1\t1\t1\t20\t30\t60\t20\t95.5\tBB6648",
        "5\t1\t1\t1\t1\t2\t90\t30\t50\t20\t91.0\tBaseband",
        "2\t1\t2\t0\t0\t0\t400\t200\t120\t40\t-1\t",
        "5\t1\t2\t1\t2\t1\t400\t222\t60\t18\t89.0\t6630",
        "5\t1\t2\t1\t1\t1\t400\t200\t60\t18\t93.0\tRadio",
        "5\t1\t2\t1\t1\t2\t470\t200\t20\t18\t14.0\t|",
    ]);

    let tokens = parse_tsv(&output).unwrap();
    assert_eq!(tokens.len(), 8);

    let blocks = group_into_blocks(tokens, 50.0);
    assert_eq!(blocks.len(), 2);

    assert_eq!(blocks[0].block_num, 1);
    assert_eq!(blocks[0].text, "BB6648 Baseband");

    // Second line of block 2 came first from the engine
    assert_eq!(blocks[1].text, "Radio 6630");
    assert_eq!(blocks[1].words.len(), 2);
    assert_eq!(blocks[1].words[0].top, 200);
}

#[test]
fn test_page_without_confident_words() {
    let output = tsv(&[
        "1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t",
        "5\t1\t1\t1\t1\t1\t20\t30\t60\t20\t31.0\tsmudge",
    ]);
    let blocks = group_into_blocks(parse_tsv(&output).unwrap(), 50.0);
    assert!(blocks.is_empty());
}

#[test]
fn test_threshold_is_inclusive() {
    let output = tsv(&["5\t1\t3\t1\t1\t1\t0\t0\t10\t10\t50\tedge"]);
    let blocks = group_into_blocks(parse_tsv(&output).unwrap(), 50.0);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].block_num, 3);
}

#[test]
fn test_missing_column_is_invalid_output() {
    assert!(parse_tsv("level\tleft\ttop\n1\t2\t3\n").is_err());
}
