// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt text and response parsing for the vision classifier

use regex::Regex;
use std::sync::OnceLock;

use super::classifier::ClassificationError;
use crate::marketplace::ClassificationResult;

pub const SYSTEM_PROMPT: &str = r#"You are an expert at analyzing product images for French marketplace searches.

Your task:
1. Identify the main object in the image
2. Categorize it as one of: book, clothing, electronics, furniture, tools, or general
3. Generate 1-3 descriptive search queries IN FRENCH that would help find similar items

Category guidelines:
- "book": Books, magazines, comics, textbooks
- "clothing": Clothes, shoes, accessories, bags, jewelry
- "electronics": Phones, computers, cameras, TVs, audio equipment
- "furniture": Tables, chairs, sofas, beds, storage
- "tools": Hand tools, power tools, gardening equipment
- "general": Everything else (toys, sports, home decor, etc.)

Return ONLY valid JSON matching this schema:
{
  "type": "object",
  "required": ["object_type", "description", "search_queries", "confidence"],
  "properties": {
    "object_type": {"enum": ["book", "clothing", "electronics", "furniture", "tools", "general"]},
    "description": {"type": "string", "minLength": 1},
    "search_queries": {
      "type": "array", "minItems": 1, "maxItems": 3,
      "items": {
        "type": "object",
        "required": ["query"],
        "properties": {
          "query": {"type": "string", "minLength": 1, "maxLength": 200},
          "confidence": {"type": "number", "minimum": 0, "maximum": 1, "default": 0.8}
        }
      }
    },
    "confidence": {"type": "number", "minimum": 0, "maximum": 1}
  }
}

Example response:
{"object_type": "book", "description": "Roman policier français", "search_queries": [{"query": "livre policier", "confidence": 0.9}, {"query": "roman thriller français", "confidence": 0.85}], "confidence": 0.92}

IMPORTANT: Return only the JSON object, no additional text or markdown formatting."#;

pub const USER_PROMPT: &str =
    "Analyze this image and identify the object for French marketplace search. Return JSON only.";

fn fenced_json() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid regex"))
}

fn bare_json() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"))
}

/// Pull the JSON object out of model output, tolerating markdown fences and chatter
pub fn extract_json(text: &str) -> &str {
    if let Some(m) = fenced_json().captures(text).and_then(|c| c.get(1)) {
        return m.as_str();
    }
    if let Some(m) = bare_json().find(text) {
        return m.as_str();
    }
    text.trim()
}

/// Parse and bounds-check a classification from raw model output
pub fn parse_classification(text: &str) -> Result<ClassificationResult, ClassificationError> {
    let json = extract_json(text);
    let result: ClassificationResult = serde_json::from_str(json)
        .map_err(|e| ClassificationError::MalformedJson(e.to_string()))?;
    result
        .validate()
        .map_err(ClassificationError::InvalidResult)?;
    Ok(result)
}
