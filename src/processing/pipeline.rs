//! The screening pipeline: one entry point for single and batch scoring

use crate::config::Config;
use crate::error::{Result, ScreenerError};
use crate::processing::embeddings::{EmbeddingModel, SemanticScorer, SharedEncoder};
use crate::processing::fusion::FusionWeights;
use crate::processing::lexical::lexical_similarity;
use crate::processing::normalizer::{redact_pii, Document};
use crate::processing::ranker::{BatchRanker, RankedBatch};
use crate::processing::skills::{match_skills, SkillMatch};
use crate::processing::vocabulary::SkillVocabulary;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

/// Why a result carries zero scores instead of real ones
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ScoreIssue {
    /// Resume or job description had no usable text after normalization
    EmptyInput(String),
    /// Scoring this item failed without affecting the rest of the batch
    ScoringFailed(String),
    /// The resume file could not be read
    Unreadable(String),
}

impl ScoreIssue {
    pub fn to_error(&self) -> ScreenerError {
        match self {
            ScoreIssue::EmptyInput(what) => ScreenerError::EmptyInput(what.clone()),
            ScoreIssue::ScoringFailed(msg) => ScreenerError::Embedding(msg.clone()),
            ScoreIssue::Unreadable(msg) => ScreenerError::InvalidInput(msg.clone()),
        }
    }
}

/// Outcome of scoring one resume against one job description.
///
/// The final score is always produced by the fusion weights from the two
/// component scores; there is no way to set it directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    lexical_score: f64,
    semantic_score: f64,
    final_score: f64,
    matched_skills: BTreeSet<String>,
    missing_skills: BTreeSet<String>,
    shortlisted: bool,
    issue: Option<ScoreIssue>,
}

impl ScoreResult {
    pub fn from_scores(lexical: f64, semantic: f64, skills: SkillMatch, weights: &FusionWeights) -> Self {
        let (final_score, shortlisted) = weights.fuse(lexical, semantic);
        Self {
            lexical_score: lexical,
            semantic_score: semantic,
            final_score,
            matched_skills: skills.matched,
            missing_skills: skills.missing,
            shortlisted,
            issue: None,
        }
    }

    fn flagged(skills: SkillMatch, weights: &FusionWeights, issue: ScoreIssue) -> Self {
        Self {
            issue: Some(issue),
            ..Self::from_scores(0.0, 0.0, skills, weights)
        }
    }

    pub fn lexical_score(&self) -> f64 {
        self.lexical_score
    }

    pub fn semantic_score(&self) -> f64 {
        self.semantic_score
    }

    pub fn final_score(&self) -> f64 {
        self.final_score
    }

    pub fn matched_skills(&self) -> &BTreeSet<String> {
        &self.matched_skills
    }

    pub fn missing_skills(&self) -> &BTreeSet<String> {
        &self.missing_skills
    }

    pub fn shortlisted(&self) -> bool {
        self.shortlisted
    }

    pub fn issue(&self) -> Option<&ScoreIssue> {
        self.issue.as_ref()
    }

    pub fn status_label(&self) -> &'static str {
        if self.shortlisted {
            "SHORTLISTED"
        } else {
            "REJECTED"
        }
    }
}

/// Job description prepared once and shared by every resume in a call
struct PreparedJob {
    document: Document,
    embedding: Option<Vec<f32>>,
}

pub struct ScreeningEngine {
    vocabulary: Arc<SkillVocabulary>,
    semantic: SemanticScorer,
    weights: FusionWeights,
    ranker: BatchRanker,
    redact_pii: bool,
}

impl ScreeningEngine {
    /// Load the vocabulary and the embedding model named in the config.
    ///
    /// Both failures are fatal: the vocabulary reports `DataLoad`, the model
    /// `ModelUnavailable`.
    pub fn initialize(config: &Config) -> Result<Self> {
        let start_time = Instant::now();
        config.validate()?;

        let vocabulary = SkillVocabulary::build(
            &config.vocabulary.ratings_path,
            &config.vocabulary.examples_path,
            &config.vocabulary_schema(),
        )?;

        let model_name = &config.models.default_embedding_model;
        let model_path = config.models_dir().join(model_name);
        if !model_path.exists() {
            return Err(ScreenerError::ModelUnavailable(format!(
                "model '{}' not found in {} (run `resume-screener models download {}`)",
                model_name,
                config.models_dir().display(),
                model_name
            )));
        }
        let encoder = EmbeddingModel::init_from_path(&model_path, model_name)?;

        let engine = Self::new(vocabulary, encoder)?
            .with_weights(config.fusion_weights()?)
            .with_workers(config.processing.workers)?
            .with_pii_redaction(config.processing.redact_pii);

        info!("Screening engine ready in {:.2?}", start_time.elapsed());
        Ok(engine)
    }

    /// Engine with default weights and one worker per core
    pub fn new(vocabulary: SkillVocabulary, encoder: SharedEncoder) -> Result<Self> {
        Ok(Self {
            vocabulary: Arc::new(vocabulary),
            semantic: SemanticScorer::new(encoder),
            weights: FusionWeights::default(),
            ranker: BatchRanker::new(0)?,
            redact_pii: false,
        })
    }

    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Result<Self> {
        self.ranker = BatchRanker::new(workers)?;
        Ok(self)
    }

    pub fn with_pii_redaction(mut self, enabled: bool) -> Self {
        self.redact_pii = enabled;
        self
    }

    pub fn vocabulary(&self) -> &SkillVocabulary {
        &self.vocabulary
    }

    pub fn weights(&self) -> &FusionWeights {
        &self.weights
    }

    pub fn model_name(&self) -> &str {
        self.semantic.model_name()
    }

    pub fn workers(&self) -> usize {
        self.ranker.workers()
    }

    pub fn score_one(&self, resume_raw: &str, jd_raw: &str) -> Result<ScoreResult> {
        let job = self.prepare_job(jd_raw)?;
        self.score_against(resume_raw, &job)
    }

    pub fn score_batch(
        &self,
        jd_raw: &str,
        resumes: &[(String, String)],
        max_count: usize,
    ) -> Result<RankedBatch> {
        self.rank_items(jd_raw, resumes, max_count, &|_| {}, |text: &String, job| {
            self.score_against(text, job)
        })
    }

    /// Rank resumes read from files, calling `on_scored` with each id once it
    /// is done.
    ///
    /// A resume whose text failed to load stays in the batch flagged
    /// `Unreadable`. `submitted` is the number of files handed in, including
    /// any the caller dropped before reading.
    pub fn score_loaded_batch(
        &self,
        jd_raw: &str,
        resumes: &[(String, Result<String>)],
        submitted: usize,
        max_count: usize,
        on_scored: &(dyn Fn(&str) + Sync),
    ) -> Result<RankedBatch> {
        if submitted > resumes.len() {
            warn!(
                "Batch capped at {} resumes; {} of {} submissions were not read",
                max_count,
                submitted - resumes.len(),
                submitted
            );
        }

        let batch = self.rank_items(jd_raw, resumes, max_count, on_scored, |text, job| {
            match text {
                Ok(text) => self.score_against(text, job),
                Err(e) => {
                    let skills = match_skills("", job.document.normalized(), &self.vocabulary);
                    let issue = ScoreIssue::Unreadable(e.to_string());
                    Ok(ScoreResult::flagged(skills, &self.weights, issue))
                }
            }
        })?;
        Ok(batch.counting_submissions(submitted))
    }

    fn rank_items<T, F>(
        &self,
        jd_raw: &str,
        resumes: &[(String, T)],
        max_count: usize,
        on_scored: &(dyn Fn(&str) + Sync),
        score: F,
    ) -> Result<RankedBatch>
    where
        T: Sync,
        F: Fn(&T, &PreparedJob) -> Result<ScoreResult> + Sync,
    {
        let start_time = Instant::now();
        let job = self.prepare_job(jd_raw)?;

        let batch = self.ranker.rank(resumes, max_count, |id, item| {
            let result = score(item, &job);
            if let Ok(scored) = &result {
                if let Some(issue) = scored.issue() {
                    warn!("Resume '{}' flagged: {}", id, issue.to_error());
                }
            }
            on_scored(id);
            result
        })?;

        info!(
            "Scored {} resumes in {:.2?}, {} shortlisted",
            batch.len(),
            start_time.elapsed(),
            batch.shortlisted().count()
        );
        Ok(batch)
    }

    fn prepare_job(&self, jd_raw: &str) -> Result<PreparedJob> {
        let document = Document::new(jd_raw);
        let embedding = if document.is_empty() {
            None
        } else {
            Some(self.semantic.encode(document.raw())?)
        };
        Ok(PreparedJob {
            document,
            embedding,
        })
    }

    fn score_against(&self, resume_raw: &str, job: &PreparedJob) -> Result<ScoreResult> {
        let resume = if self.redact_pii {
            Document::new(redact_pii(resume_raw))
        } else {
            Document::new(resume_raw)
        };

        let skills = match_skills(resume.normalized(), job.document.normalized(), &self.vocabulary);

        let jd_embedding = match (&job.embedding, resume.is_empty()) {
            (Some(embedding), false) => embedding,
            (None, _) => {
                let issue = ScoreIssue::EmptyInput("job description has no text".to_string());
                return Ok(ScoreResult::flagged(skills, &self.weights, issue));
            }
            (_, true) => {
                let issue = ScoreIssue::EmptyInput("resume has no text".to_string());
                return Ok(ScoreResult::flagged(skills, &self.weights, issue));
            }
        };

        let lexical = lexical_similarity(resume.normalized(), job.document.normalized());
        let semantic = match self.semantic.similarity_to(jd_embedding, resume.raw()) {
            Ok(score) => score,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                let issue = ScoreIssue::ScoringFailed(e.to_string());
                return Ok(ScoreResult::flagged(skills, &self.weights, issue));
            }
        };
        if !semantic.is_finite() || !lexical.is_finite() {
            let issue = ScoreIssue::ScoringFailed(format!(
                "similarity is not a finite number (lexical {}, semantic {})",
                lexical, semantic
            ));
            return Ok(ScoreResult::flagged(skills, &self.weights, issue));
        }

        debug!(
            "lexical {:.2}, semantic {:.2}, {} matched skills",
            lexical,
            semantic,
            skills.matched.len()
        );
        Ok(ScoreResult::from_scores(lexical, semantic, skills, &self.weights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::embeddings::SentenceEncoder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct WordEncoder {
        calls: AtomicUsize,
    }

    impl SentenceEncoder for WordEncoder {
        fn encode(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut v = vec![0.0f32; 32];
            for word in text.split_whitespace() {
                let bucket = word.to_lowercase().bytes().map(|b| b as usize).sum::<usize>() % 32;
                v[bucket] += 1.0;
            }
            Ok(v)
        }

        fn model_name(&self) -> &str {
            "words"
        }
    }

    struct FailingEncoder;

    impl SentenceEncoder for FailingEncoder {
        fn encode(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("corrupt") {
                Err(ScreenerError::Embedding("tokenizer rejected input".into()))
            } else {
                Ok(vec![1.0, 0.0])
            }
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    /// Produces a NaN component for texts mentioning "glitch"
    struct GlitchEncoder;

    impl SentenceEncoder for GlitchEncoder {
        fn encode(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("glitch") {
                Ok(vec![f32::NAN, 1.0])
            } else {
                Ok(vec![1.0, 0.0])
            }
        }

        fn model_name(&self) -> &str {
            "glitch"
        }
    }

    fn engine() -> ScreeningEngine {
        ScreeningEngine::new(
            SkillVocabulary::from_terms(["python", "java", "sql", "kubernetes"]),
            Arc::new(WordEncoder {
                calls: AtomicUsize::new(0),
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_final_score_is_weighted_sum() {
        let result = engine()
            .score_one("Python and SQL developer", "Looking for Python and SQL developer")
            .unwrap();
        let expected = 0.4 * result.lexical_score() + 0.6 * result.semantic_score();
        assert!((result.final_score() - expected).abs() <= 0.005 + 1e-9);
        assert!(result.issue().is_none());
    }

    #[test]
    fn test_empty_resume_is_flagged_not_error() {
        let result = engine().score_one("  ---  ", "Python developer").unwrap();
        assert_eq!(result.lexical_score(), 0.0);
        assert_eq!(result.semantic_score(), 0.0);
        assert_eq!(result.final_score(), 0.0);
        assert!(!result.shortlisted());
        assert!(matches!(result.issue(), Some(ScoreIssue::EmptyInput(_))));
        assert!(result.missing_skills().contains("python"));
    }

    #[test]
    fn test_empty_job_description_is_flagged() {
        let result = engine().score_one("Python developer", "").unwrap();
        assert!(matches!(result.issue(), Some(ScoreIssue::EmptyInput(_))));
        assert!(result.matched_skills().contains("python"));
    }

    #[test]
    fn test_job_encoded_once_per_batch() {
        let encoder = Arc::new(WordEncoder {
            calls: AtomicUsize::new(0),
        });
        let engine = ScreeningEngine::new(SkillVocabulary::default(), encoder.clone()).unwrap();
        let resumes: Vec<(String, String)> =
            (0..5).map(|i| (format!("r{}", i), format!("resume {}", i))).collect();

        engine.score_batch("rust engineer", &resumes, 20).unwrap();
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_non_fatal_failure_isolated_to_item() {
        let engine = ScreeningEngine::new(SkillVocabulary::default(), Arc::new(FailingEncoder)).unwrap();
        let resumes = vec![
            ("good".to_string(), "rust engineer".to_string()),
            ("bad".to_string(), "corrupt upload".to_string()),
        ];
        let batch = engine.score_batch("rust engineer", &resumes, 20).unwrap();
        assert_eq!(batch.len(), 2);

        let bad = batch.entries.iter().find(|e| e.id == "bad").unwrap();
        assert!(matches!(bad.result.issue(), Some(ScoreIssue::ScoringFailed(_))));
        assert_eq!(bad.result.final_score(), 0.0);
        assert_eq!(batch.entries[0].id, "good");
    }

    #[test]
    fn test_pii_redaction_applied_to_resume() {
        let vocabulary = SkillVocabulary::from_terms(["python", "jane", "doe"]);
        let encoder = Arc::new(WordEncoder {
            calls: AtomicUsize::new(0),
        });
        let plain = ScreeningEngine::new(vocabulary.clone(), encoder.clone()).unwrap();
        let redacting = ScreeningEngine::new(vocabulary, encoder)
            .unwrap()
            .with_pii_redaction(true);

        let resume = "Jane Doe jane@mail.com Python";
        let before = plain.score_one(resume, "Python developer").unwrap();
        assert!(before.matched_skills().contains("jane"));

        let after = redacting.score_one(resume, "Python developer").unwrap();
        assert!(after.matched_skills().contains("python"));
        assert!(!after.matched_skills().contains("jane"));
        assert!(!after.matched_skills().contains("doe"));
    }

    #[test]
    fn test_custom_weights_flow_through() {
        let weights = FusionWeights::new(1.0, 0.0, 50.0).unwrap();
        let engine = engine().with_weights(weights);
        let result = engine.score_one("python sql", "python sql").unwrap();
        assert_eq!(result.final_score(), result.lexical_score());
        assert_eq!(result.final_score(), 100.0);
    }

    #[test]
    fn test_non_finite_similarity_flagged_and_ranked_last() {
        let engine = ScreeningEngine::new(SkillVocabulary::default(), Arc::new(GlitchEncoder)).unwrap();
        let resumes = vec![
            ("nan".to_string(), "glitch rust engineer".to_string()),
            ("plain".to_string(), "rust engineer".to_string()),
        ];
        let batch = engine.score_batch("rust engineer", &resumes, 20).unwrap();

        assert_eq!(batch.entries[0].id, "plain");
        let nan = &batch.entries[1];
        assert_eq!(nan.id, "nan");
        assert!(matches!(nan.result.issue(), Some(ScoreIssue::ScoringFailed(_))));
        assert_eq!(nan.result.final_score(), 0.0);
        assert!(!nan.result.shortlisted());
        assert!(batch.entries.iter().all(|e| e.result.final_score().is_finite()));
    }

    #[test]
    fn test_unreadable_resume_kept_in_loaded_batch() {
        let resumes = vec![
            ("a.txt".to_string(), Ok("Python developer".to_string())),
            (
                "b.pdf".to_string(),
                Err(ScreenerError::PdfExtraction("broken xref table".into())),
            ),
            ("c.txt".to_string(), Ok("Python SQL developer".to_string())),
        ];
        let batch = engine()
            .score_loaded_batch("Python SQL developer", &resumes, 5, 20, &|_| {})
            .unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.submitted, 5);
        assert_eq!(batch.excluded, 2);

        let unreadable = batch.entries.last().unwrap();
        assert_eq!(unreadable.id, "b.pdf");
        assert!(matches!(unreadable.result.issue(), Some(ScoreIssue::Unreadable(_))));
        assert_eq!(unreadable.result.final_score(), 0.0);
        assert!(unreadable.result.missing_skills().contains("python"));
        assert!(unreadable.result.missing_skills().contains("sql"));
    }
}
