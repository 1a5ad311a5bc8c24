// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fixed instructions sent to the vision model

pub const DESCRIBE_SYSTEM: &str = "You are a helpful assistant that describes diagrams.";

pub const DESCRIBE_USER: &str = "Describe the diagram found at this URL:";

pub const NODES_SYSTEM: &str = concat!(
    "You are an expert system analyzing telecommunication site diagrams. ",
    "Telecommunication site diagrams typically include equipment such as routers, basebands, ",
    "radio units (RUs) and antennas. ",
    "Your task is to identify every equipment item (node) shown in the diagram. ",
    "Use the printed label of each node when it is legible, otherwise describe it briefly. ",
    "Respond with a JSON object with a single key 'nodes' holding a list of objects, where each ",
    "object has an 'id' (sequential number starting from 1) and a 'label' (string). ",
    "Example Output: {\"nodes\": [{\"id\": 1, \"label\": \"Router R6630\"}, ",
    "{\"id\": 2, \"label\": \"Baseband BB6648\"}]}"
);

pub const NODES_USER: &str =
    "Identify the equipment nodes in the diagram at the following URL. Provide the output in the specified JSON format.";

pub const EDGES_SYSTEM: &str = concat!(
    "You are an expert system analyzing telecommunication site diagrams. ",
    "Telecommunication Site Diagrams will typically include equipment including Routers, basebands, ",
    "radio units (RUs) and Antennas. ",
    "Information about some of these equipment items and their ports can be found in the ",
    "reference_context document. ",
    "The reference_context document has links to port map images which can be used to identify and ",
    "locate individual ports for items of equipment. ",
    "Your task is to identify the connections (edges, lines, pipes, arrows) between the ports of the ",
    "equipment nodes shown in the diagram. ",
    "Use the provided reference material for context, examples, and conventions when identifying edges. ",
    "The reference may include text, tables, and image descriptions/links. ",
    "Describe each connection by specifying the source and target nodes it connects. ",
    "Use the labels of the nodes if identifiable, otherwise describe them. ",
    "Format the output as a JSON object with a single key 'edges' holding a list of objects, where each ",
    "object has an 'id' (sequential number starting from 1), a 'source' (description of the starting ",
    "node/point), and a 'target' (description of the ending node/point). ",
    "Example Output: {\"edges\": [{\"id\": 1, \"source\": \"Baseband BB6648\", \"target\": \"Router R6630\"}, ",
    "{\"id\": 2, \"source\": \"Baseband BB6648\", \"target\": \"Radio Unit RU6694\"}]}"
);

pub const GRAPH_SYSTEM: &str = concat!(
    "You are a telecom diagram parser. ",
    "Extract all equipment items as nodes and connections as edges. ",
    "Respond with a JSON object with two keys: 'nodes', a list of {\"id\": number, \"label\": string}, ",
    "and 'edges', a list of {\"id\": number, \"source\": string, \"target\": string} where source ",
    "and target are node labels."
);

pub const GRAPH_USER: &str =
    "Analyze the diagram at the following URL and return its nodes and edges in the specified JSON format.";

/// User instruction for edge extraction with the reference material inlined verbatim
pub fn edges_user(reference_context: &str) -> String {
    format!(
        "Identify the connections (edges) between components in the diagram at the following URL. \
         Use the reference material below for context and examples. \
         Provide the output in the specified JSON format:\n\n\
         **Reference Material:**\n```markdown\n{}\n```\n\n**Diagram URL:**",
        reference_context
    )
}

/// Cut `text` to at most `max_chars` characters, never splitting a character
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
