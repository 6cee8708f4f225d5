//! MarketMapper Core Library
//!
//! Domain logic for the MarketMapper viability service:
//! - Submissions are validated before any outbound call is made
//! - Prompts ask a language model for Overpass queries and for scores
//! - Model replies are cleaned up and decoded against a strict schema

pub mod error;
pub mod model_output;
pub mod overpass;
pub mod prompts;
pub mod scoring;
pub mod submission;

pub use error::Error;
pub use prompts::QueryKind;
pub use model_output::{strip_code_fences, OverpassQuery};
pub use overpass::{OverpassElement, OverpassResponse};
pub use scoring::{AreaCaps, DensityAssessment, FeatureCounts, ScoreReport, SubScores};
pub use submission::{RawSubmission, Submission};

/// Result type for marketmapper-core operations
pub type Result<T> = std::result::Result<T, Error>;
