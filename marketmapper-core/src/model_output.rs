//! Cleanup of raw language-model output

use crate::{Error, Result};

/// Remove Markdown code fences the model sometimes wraps its answer in
///
/// Handles a leading fence with an optional language tag (```` ```json ````),
/// on its own line or followed by the answer on the same line, and a
/// trailing fence. Text without fences is only trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix("```") {
        body = strip_info_string(rest);
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }

    body.trim()
}

/// The info string is a bare word directly after the fence, ended by
/// whitespace; anything else is already the fenced content
fn strip_info_string(rest: &str) -> &str {
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    let after_tag = &rest[tag_len..];
    if tag_len > 0 && after_tag.starts_with(char::is_whitespace) {
        after_tag
    } else {
        rest
    }
}

/// Whether the settings block before the first `;` requests JSON output
///
/// Settings are `[...]` groups in any order, e.g. `[timeout:25][out:json];`.
fn declares_json_output(query: &str) -> bool {
    let Some((settings, _)) = query.split_once(';') else {
        return false;
    };
    let compact: String = settings.chars().filter(|c| !c.is_whitespace()).collect();
    match compact.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(groups) => groups.split("][").any(|setting| setting == "out:json"),
        None => false,
    }
}

/// An Overpass query produced by the model
///
/// Only queries that ask for JSON output are accepted, since the reply is
/// decoded as JSON afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverpassQuery(String);

impl OverpassQuery {
    pub fn parse(model_text: &str) -> Result<Self> {
        let query = strip_code_fences(model_text);
        if query.is_empty() {
            return Err(Error::EmptyQuery);
        }
        if !declares_json_output(query) {
            return Err(Error::InvalidQuery(truncate(query, 80)));
        }
        Ok(Self(query.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
