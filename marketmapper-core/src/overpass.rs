//! Overpass API response types
//!
//! Only the parts of the response the scoring step looks at are modelled;
//! everything else in the payload is ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// JSON body returned by an Overpass interpreter for `[out:json]` queries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,

    /// Set by the server when a query ran out of time or memory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

impl OverpassResponse {
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// The server-side failure reported in `remark`, if the result is partial
    pub fn runtime_error(&self) -> Option<&str> {
        self.remark
            .as_deref()
            .filter(|r| r.trim_start().starts_with("runtime error"))
    }

    /// Names of the returned features, for logging and display
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| e.name())
    }
}

/// A node, way or relation from an Overpass result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Present for ways when the query used `out center`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Center>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

impl OverpassElement {
    pub fn name(&self) -> Option<&str> {
        self.tags.get("name").map(String::as_str)
    }
}
