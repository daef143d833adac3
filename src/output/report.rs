//! Report structures handed to the formatters

use crate::processing::fusion::FusionWeights;
use crate::processing::{RankedBatch, ScoreResult};
use chrono::{DateTime, Local};
use serde::Serialize;

/// One resume checked against one job description
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub resume: String,
    pub job: String,
    pub result: ScoreResult,
    pub weights: FusionWeights,
    pub metadata: ReportMetadata,
}

/// Many resumes ranked against one job description
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub job: String,
    pub batch: RankedBatch,
    pub weights: FusionWeights,
    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Local>,
    pub processing_time_ms: u64,
    pub embedding_model: String,
    pub vocabulary_size: usize,
}

impl ReportMetadata {
    pub fn new(processing_time_ms: u64, embedding_model: &str, vocabulary_size: usize) -> Self {
        Self {
            generated_at: Local::now(),
            processing_time_ms,
            embedding_model: embedding_model.to_string(),
            vocabulary_size,
        }
    }

    pub fn timestamp(&self) -> String {
        self.generated_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

pub fn join_skills<'a>(skills: impl IntoIterator<Item = &'a String>) -> String {
    let joined = skills
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "none".to_string()
    } else {
        joined
    }
}
