//! Scoring pipeline: normalization, lexical and semantic similarity, skill
//! matching, fusion and batch ranking

pub mod normalizer;
pub mod stop_words;
pub mod vocabulary;
pub mod lexical;
pub mod embeddings;
pub mod embedding_manager;
pub mod skills;
pub mod fusion;
pub mod ranker;
pub mod pipeline;

pub use pipeline::{ScoreIssue, ScoreResult, ScreeningEngine};
pub use ranker::{RankedBatch, RankedEntry, DEFAULT_MAX_BATCH};
pub use vocabulary::SkillVocabulary;
