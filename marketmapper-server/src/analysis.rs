//! Location analysis pipeline
//!
//! One analysis is a fixed, strictly sequential chain of outbound calls:
//!
//! 1. Ask the model for a competition, a complementary and an accessibility
//!    Overpass query
//! 2. Run the three queries, each one behind the shared throttle
//! 3. Ask the model for a density assessment of the area
//! 4. Ask the model for the final scores, given the counts and caps
//!
//! Any failure aborts the chain; nothing is persisted here.

use std::sync::Arc;

use marketmapper_core::prompts::{density_prompt, scoring_prompt};
use marketmapper_core::{
    DensityAssessment, FeatureCounts, OverpassQuery, QueryKind, ScoreReport, Submission,
};
use thiserror::Error;

use crate::llm::{LanguageModel, ModelError};
use crate::overpass::{MapDataError, MapDataSource};
use crate::throttle::Throttle;

/// Pipeline step that produced a model reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Query(QueryKind),
    Density,
    Scoring,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Query(kind) => write!(f, "{} query", kind.as_str()),
            Stage::Density => f.write_str("density assessment"),
            Stage::Scoring => f.write_str("scoring"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Language model call for {stage} failed: {source}")]
    Model {
        stage: Stage,
        #[source]
        source: ModelError,
    },

    #[error("Model produced an unusable {} query: {source}", .kind.as_str())]
    Query {
        kind: QueryKind,
        #[source]
        source: marketmapper_core::Error,
    },

    #[error("Map data fetch for the {} query failed: {source}", .kind.as_str())]
    MapData {
        kind: QueryKind,
        #[source]
        source: MapDataError,
    },

    #[error("Model reply for {stage} could not be decoded: {source}")]
    Decode {
        stage: Stage,
        #[source]
        source: marketmapper_core::Error,
    },
}

/// Everything the pipeline learned about one submission
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub counts: FeatureCounts,
    pub density: DensityAssessment,
    pub score: ScoreReport,
}

/// Runs the analysis chain against a model and a map data source
pub struct MarketAnalyzer {
    model: Arc<dyn LanguageModel>,
    maps: Arc<dyn MapDataSource>,
    throttle: Arc<dyn Throttle>,
}

impl MarketAnalyzer {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        maps: Arc<dyn MapDataSource>,
        throttle: Arc<dyn Throttle>,
    ) -> Self {
        Self {
            model,
            maps,
            throttle,
        }
    }

    pub async fn analyze(&self, submission: &Submission) -> Result<Analysis, AnalysisError> {
        tracing::info!(
            business = %submission.business,
            location = %submission.location,
            "Starting analysis"
        );

        let mut queries = Vec::with_capacity(QueryKind::ALL.len());
        for kind in QueryKind::ALL {
            let reply = self.ask(Stage::Query(kind), &kind.prompt(submission)).await?;
            let query = OverpassQuery::parse(&reply)
                .map_err(|source| AnalysisError::Query { kind, source })?;
            queries.push((kind, query));
        }

        let mut counts = FeatureCounts::default();
        for (kind, query) in &queries {
            let found = self.fetch(*kind, query).await?;
            match kind {
                QueryKind::Competition => counts.competitors = found,
                QueryKind::Complementary => counts.complements = found,
                QueryKind::Accessibility => counts.access_points = found,
            }
        }
        tracing::debug!(?counts, "Map features counted");

        let reply = self.ask(Stage::Density, &density_prompt(submission)).await?;
        let density = DensityAssessment::from_model_reply(&reply).map_err(|source| {
            AnalysisError::Decode {
                stage: Stage::Density,
                source,
            }
        })?;

        let prompt = scoring_prompt(submission, &counts, &density);
        let reply = self.ask(Stage::Scoring, &prompt).await?;
        let score = ScoreReport::from_model_reply(&reply).map_err(|source| {
            AnalysisError::Decode {
                stage: Stage::Scoring,
                source,
            }
        })?;

        tracing::info!(overall = score.overall(), "Analysis complete");
        Ok(Analysis {
            counts,
            density,
            score,
        })
    }

    async fn ask(&self, stage: Stage, prompt: &str) -> Result<String, AnalysisError> {
        self.model
            .generate(prompt)
            .await
            .map_err(|source| AnalysisError::Model { stage, source })
    }

    async fn fetch(&self, kind: QueryKind, query: &OverpassQuery) -> Result<usize, AnalysisError> {
        self.throttle.acquire().await;
        let response = self
            .maps
            .run_query(query)
            .await
            .map_err(|source| AnalysisError::MapData { kind, source })?;
        Ok(response.element_count())
    }
}
