//! LLM-based graph extraction.
//!
//! This module turns chunk text into a [`ChunkGraph`] by prompting an LLM
//! for structured JSON and parsing the answer.
//!
//! # Architecture
//!
//! 1. Text is sent to the LLM with a structured prompt (plus schema hints)
//! 2. LLM returns JSON with nodes and edges
//! 3. Response is parsed with lenient handling for malformed output
//! 4. Missing fields are filled in (id from name, type defaults to `Concept`)

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use graphloom_core::error::LoomResult;
use graphloom_core::traits::{ExtractionSchema, Extractor, Llm, LlmConfig, ResponseFormat};
use graphloom_core::types::{ChunkGraph, Message, RawEdge, RawNode};

/// Entity type assigned when the LLM leaves it out.
pub const DEFAULT_ENTITY_TYPE: &str = "Concept";

/// Raw JSON structures for LLM response parsing.
/// These allow flexible parsing before converting to typed structs.
mod raw {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Accept strings, numbers and booleans where text is expected.
    fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        })
    }

    #[derive(Debug, Deserialize)]
    pub struct RawNode {
        #[serde(default, deserialize_with = "lenient_string")]
        pub id: Option<String>,
        #[serde(default, deserialize_with = "lenient_string")]
        pub name: Option<String>,
        #[serde(
            default,
            rename = "type",
            alias = "entity_type",
            alias = "entityType",
            alias = "label",
            deserialize_with = "lenient_string"
        )]
        pub entity_type: Option<String>,
        #[serde(default, deserialize_with = "lenient_string")]
        pub description: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct RawEdge {
        #[serde(
            default,
            alias = "source",
            alias = "source_id",
            deserialize_with = "lenient_string"
        )]
        pub source_node_id: Option<String>,
        #[serde(
            default,
            alias = "target",
            alias = "target_id",
            deserialize_with = "lenient_string"
        )]
        pub target_node_id: Option<String>,
        #[serde(
            default,
            alias = "relationship",
            alias = "relationship_type",
            alias = "label",
            alias = "type"
        )]
        pub relationship_name: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct RawGraph {
        #[serde(default, alias = "entities")]
        pub nodes: Vec<RawNode>,
        #[serde(default, alias = "relationships")]
        pub edges: Vec<RawEdge>,
    }
}

/// Extractor that asks an LLM for a chunk's nodes and edges.
pub struct LlmExtractor {
    llm: Arc<dyn Llm>,
    config: LlmConfig,
}

impl LlmExtractor {
    /// Create a new LLM extractor with default sampling settings.
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self::with_config(llm, LlmConfig::default())
    }

    /// Create a new LLM extractor with the given sampling settings.
    pub fn with_config(llm: Arc<dyn Llm>, config: LlmConfig) -> Self {
        Self { llm, config }
    }

    /// Generate the system prompt for extraction.
    fn system_prompt(schema: &ExtractionSchema) -> String {
        let mut prompt = String::from(
            r#"You are a knowledge graph extraction system. Extract entities (nodes) and the relationships between them (edges) from text.

Output JSON in this exact format:
{
  "nodes": [
    {"id": "unique entity id", "name": "entity name", "type": "entity type", "description": "brief description"}
  ],
  "edges": [
    {"source_node_id": "id of source node", "target_node_id": "id of target node", "relationship_name": "relationship"}
  ]
}

Rules:
1. Only extract explicitly mentioned entities
2. Use the entity name as its id unless the text needs disambiguation
3. Edges must reference node ids from the nodes list
4. Use snake_case relationship names (e.g. works_at)
5. Keep descriptions brief (under 50 words)
6. If nothing can be extracted, return empty arrays
"#,
        );

        if !schema.entity_types.is_empty() {
            prompt.push_str(&format!(
                "\nENTITY TYPES: {}\n",
                schema.entity_types.join(", ")
            ));
        }
        if !schema.relationship_types.is_empty() {
            prompt.push_str(&format!(
                "\nRELATIONSHIP TYPES: {}\n",
                schema.relationship_types.join(", ")
            ));
        }

        prompt.push_str("\nReturn ONLY valid JSON, no other text.");
        prompt
    }

    /// Parse the LLM response into a chunk graph.
    ///
    /// Returns `None` when the response is empty, unparseable, or holds
    /// neither nodes nor edges.
    fn parse_response(content: &str) -> Option<ChunkGraph> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }

        let json_str = Self::extract_json(content);

        let raw_graph: raw::RawGraph = match serde_json::from_str(json_str) {
            Ok(r) => r,
            Err(e) => match Self::lenient_parse(json_str) {
                Some(r) => r,
                None => {
                    tracing::warn!("Failed to parse extraction response: {}", e);
                    return None;
                }
            },
        };

        let graph = ChunkGraph {
            nodes: raw_graph
                .nodes
                .into_iter()
                .filter_map(Self::convert_node)
                .collect(),
            edges: raw_graph
                .edges
                .into_iter()
                .filter_map(Self::convert_edge)
                .collect(),
        };

        if graph.is_empty() {
            None
        } else {
            Some(graph)
        }
    }

    /// Extract JSON from response (handles markdown code blocks and prose).
    fn extract_json(content: &str) -> &str {
        static JSON_BLOCK: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").expect("valid code block regex")
        });

        if let Some(m) = JSON_BLOCK.captures(content).and_then(|caps| caps.get(1)) {
            return m.as_str().trim();
        }

        // Fall back to the outermost object
        match (content.find('{'), content.rfind('}')) {
            (Some(start), Some(end)) if start < end => &content[start..=end],
            _ => content,
        }
    }

    /// Lenient parsing for malformed JSON.
    ///
    /// Trailing commas are repaired first; single quotes are only swapped
    /// for double quotes when that is not enough, since apostrophes inside
    /// names are common.
    fn lenient_parse(json_str: &str) -> Option<raw::RawGraph> {
        static TRAILING_COMMA: Lazy<Regex> =
            Lazy::new(|| Regex::new(r",\s*([\]}])").expect("valid trailing comma regex"));

        let without_commas = TRAILING_COMMA.replace_all(json_str, "$1");
        if let Ok(graph) = serde_json::from_str(&without_commas) {
            return Some(graph);
        }

        let requoted = without_commas.replace('\'', "\"");
        serde_json::from_str(&requoted).ok()
    }

    /// Convert a raw node, dropping nodes with neither id nor name.
    fn convert_node(raw: raw::RawNode) -> Option<RawNode> {
        let id = non_blank(raw.id);
        let name = non_blank(raw.name);

        let (id, name) = match (id, name) {
            (Some(id), Some(name)) => (id, name),
            (Some(id), None) => (id.clone(), id),
            (None, Some(name)) => (name.clone(), name),
            (None, None) => return None,
        };

        Some(RawNode {
            id,
            name,
            entity_type: non_blank(raw.entity_type)
                .unwrap_or_else(|| DEFAULT_ENTITY_TYPE.to_string()),
            description: raw.description.map(|d| d.trim().to_string()).unwrap_or_default(),
        })
    }

    /// Convert a raw edge, dropping edges with a blank endpoint.
    fn convert_edge(raw: raw::RawEdge) -> Option<RawEdge> {
        let source = non_blank(raw.source_node_id)?;
        let target = non_blank(raw.target_node_id)?;
        let relationship = non_blank(raw.relationship_name)?;

        Some(RawEdge::new(source, target, relationship))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(&self, text: &str, schema: &ExtractionSchema) -> LoomResult<Option<ChunkGraph>> {
        // Handle empty input
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let messages = vec![
            Message::system(Self::system_prompt(schema)),
            Message::user(format!(
                "Extract a knowledge graph from this text:\n\n{}",
                text
            )),
        ];

        let format = if self.llm.supports_json_mode() {
            ResponseFormat::Json
        } else {
            ResponseFormat::Text
        };
        let options = self.config.generation_options(format);

        tracing::debug!(
            "Extracting graph with {} ({} chars, {:?})",
            self.llm.model_name(),
            text.len(),
            format
        );

        let response = self.llm.generate(&messages, Some(options)).await?;
        Ok(Self::parse_response(response.content_or_empty()))
    }
}
