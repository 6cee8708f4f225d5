//! Error types for MarketMapper core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// One or more submission fields failed validation.
    ///
    /// The messages are kept in field order; `Display` joins them with `,`.
    #[error("{}", .0.join(","))]
    Validation(Vec<String>),

    #[error("Model returned an empty Overpass query")]
    EmptyQuery,

    #[error("Model returned something that is not an Overpass JSON query: {0}")]
    InvalidQuery(String),

    #[error("Model reply is not valid JSON for {expected}: {source}")]
    MalformedReply {
        expected: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Field {field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("Field {0} must not be empty")]
    EmptyField(&'static str),
}

impl Error {
    /// Field messages carried by a validation error, empty otherwise
    pub fn validation_messages(&self) -> &[String] {
        match self {
            Error::Validation(messages) => messages,
            _ => &[],
        }
    }
}
