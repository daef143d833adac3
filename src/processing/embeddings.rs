//! Sentence embeddings and semantic similarity

use crate::error::{Result, ScreenerError};
use crate::processing::lexical::round2;
use log::{debug, info};
use model2vec_rs::model::StaticModel;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Turns text into a fixed-size dense vector.
///
/// Implementations are shared across scoring workers, so encoding must only
/// need `&self`.
pub trait SentenceEncoder: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<f32>>;

    fn model_name(&self) -> &str;
}

pub type SharedEncoder = Arc<dyn SentenceEncoder>;

/// Model2Vec static embedding model loaded from a local directory
pub struct Model2VecEncoder {
    model: StaticModel,
    model_name: String,
}

impl Model2VecEncoder {
    pub fn load(model_path: &Path, model_name: &str) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading embedding model from: {}", model_path.display());

        let model = StaticModel::from_pretrained(
            model_path,
            None, // token
            None, // normalize
            None, // subfolder
        )
        .map_err(|e| {
            ScreenerError::ModelUnavailable(format!(
                "failed to load '{}': {}",
                model_path.display(),
                e
            ))
        })?;

        info!("Embedding model loaded in {:.2?}", start_time.elapsed());

        Ok(Self {
            model,
            model_name: model_name.to_string(),
        })
    }
}

impl SentenceEncoder for Model2VecEncoder {
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.model.encode_single(text);
        if embedding.is_empty() {
            return Err(ScreenerError::Embedding(format!(
                "model '{}' returned an empty embedding",
                self.model_name
            )));
        }
        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

static SHARED_MODEL: OnceLock<SharedEncoder> = OnceLock::new();

/// Process-wide handle to the embedding model.
///
/// `init` installs the model once; later calls keep the first model.
/// Scorers receive the handle explicitly, this is only the startup seam.
pub struct EmbeddingModel;

impl EmbeddingModel {
    pub fn init(encoder: SharedEncoder) -> SharedEncoder {
        SHARED_MODEL.get_or_init(|| encoder).clone()
    }

    /// Load the Model2Vec model at `model_path` unless one is installed already
    pub fn init_from_path(model_path: &Path, model_name: &str) -> Result<SharedEncoder> {
        if let Some(existing) = SHARED_MODEL.get() {
            debug!("Embedding model already initialized: {}", existing.model_name());
            return Ok(existing.clone());
        }
        let encoder: SharedEncoder = Arc::new(Model2VecEncoder::load(model_path, model_name)?);
        Ok(Self::init(encoder))
    }

    pub fn instance() -> Result<SharedEncoder> {
        SHARED_MODEL.get().cloned().ok_or_else(|| {
            ScreenerError::ModelUnavailable("embedding model has not been initialized".to_string())
        })
    }
}

/// Cosine similarity between two dense vectors, 0 when either has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(ScreenerError::Embedding(format!(
            "Embedding dimensions don't match: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let dot_product: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot_product / (norm_a * norm_b))
    }
}

/// Cosine scaled to 0-100 with two decimals; negative cosine reads as 0
pub fn to_score(cosine: f64) -> f64 {
    round2(cosine.clamp(0.0, 1.0) * 100.0)
}

/// Embedding similarity of raw (non-normalized) texts
pub struct SemanticScorer {
    encoder: SharedEncoder,
}

impl SemanticScorer {
    pub fn new(encoder: SharedEncoder) -> Self {
        Self { encoder }
    }

    pub fn encode(&self, text: &str) -> Result<Vec<f32>> {
        self.encoder.encode(text)
    }

    pub fn semantic_similarity(&self, resume_raw: &str, jd_raw: &str) -> Result<f64> {
        let resume = self.encoder.encode(resume_raw)?;
        let jd = self.encoder.encode(jd_raw)?;
        Ok(to_score(cosine_similarity(&resume, &jd)?))
    }

    /// Similarity against a job description embedding computed once per batch
    pub fn similarity_to(&self, jd_embedding: &[f32], resume_raw: &str) -> Result<f64> {
        let resume = self.encoder.encode(resume_raw)?;
        Ok(to_score(cosine_similarity(&resume, jd_embedding)?))
    }

    pub fn model_name(&self) -> &str {
        self.encoder.model_name()
    }
}
