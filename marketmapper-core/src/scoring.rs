//! Scoring payloads exchanged with the language model
//!
//! The model is asked for JSON; replies are decoded against these types with
//! unknown fields rejected and every number range-checked, so a report is
//! only ever built from a reply that has exactly the expected shape.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model_output::strip_code_fences;
use crate::{Error, Result};

/// Number of features each map query returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureCounts {
    pub competitors: usize,
    pub complements: usize,
    pub access_points: usize,
}

/// Area-specific saturation caps chosen by the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AreaCaps {
    pub competition: f64,
    pub complementary: f64,
    pub accessibility: f64,
}

/// First scoring reply: how dense the area is and what counts saturate it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DensityAssessment {
    pub density_score: f64,
    pub caps: AreaCaps,
}

impl DensityAssessment {
    pub fn from_model_reply(text: &str) -> Result<Self> {
        let assessment: Self = decode(text, "density assessment")?;
        check_score("densityScore", assessment.density_score)?;
        check_cap("caps.competition", assessment.caps.competition)?;
        check_cap("caps.complementary", assessment.caps.complementary)?;
        check_cap("caps.accessibility", assessment.caps.accessibility)?;
        Ok(assessment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubScores {
    pub competition: f64,
    pub complementary: f64,
    pub accessibility: f64,
    pub density: f64,
}

/// Final scoring reply, persisted as the report payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScoreReport {
    pub density_score: f64,
    pub scores: SubScores,
    pub verdict: String,
}

impl ScoreReport {
    pub fn from_model_reply(text: &str) -> Result<Self> {
        let mut report: Self = decode(text, "score report")?;
        check_score("densityScore", report.density_score)?;
        check_score("scores.competition", report.scores.competition)?;
        check_score("scores.complementary", report.scores.complementary)?;
        check_score("scores.accessibility", report.scores.accessibility)?;
        check_score("scores.density", report.scores.density)?;

        report.verdict = report.verdict.trim().to_string();
        if report.verdict.is_empty() {
            return Err(Error::EmptyField("verdict"));
        }
        Ok(report)
    }

    /// Mean of the four sub-scores, shown as the headline figure
    pub fn overall(&self) -> f64 {
        let s = &self.scores;
        (s.competition + s.complementary + s.accessibility + s.density) / 4.0
    }
}

fn decode<T: DeserializeOwned>(text: &str, expected: &'static str) -> Result<T> {
    serde_json::from_str(strip_code_fences(text))
        .map_err(|source| Error::MalformedReply { expected, source })
}

fn check_score(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::OutOfRange { field, value })
    }
}

fn check_cap(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::OutOfRange { field, value })
    }
}
