//! Configuration management for the resume screener

use crate::error::{Result, ScreenerError};
use crate::processing::fusion::{
    FusionWeights, DEFAULT_LEXICAL_WEIGHT, DEFAULT_SEMANTIC_WEIGHT, SHORTLIST_THRESHOLD,
};
use crate::processing::ranker::DEFAULT_MAX_BATCH;
use crate::processing::vocabulary::VocabularySchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub vocabulary: VocabularyConfig,
    pub scoring: ScoringConfig,
    pub processing: ProcessingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub default_embedding_model: String,
    pub available_models: Vec<AvailableModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableModel {
    pub name: String,
    pub repo_id: String,
    pub size_mb: u64,
    pub dimensions: u32,
    pub description: String,
}

/// Where the two skill tables live and which columns carry what
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyConfig {
    pub ratings_path: PathBuf,
    pub ratings_term_column: String,
    pub ratings_scale_column: String,
    pub ratings_value_column: String,
    pub scale_filter: String,
    pub min_importance: f64,
    pub examples_path: PathBuf,
    pub examples_term_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub lexical_weight: f64,
    pub semantic_weight: f64,
    pub shortlist_threshold: f64,
    pub max_batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Worker threads for batch scoring, 0 means one per available core
    pub workers: usize,
    pub redact_pii: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
    Html,
}

impl Default for Config {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".resume-screener")
            .join("models");

        Self {
            models: ModelConfig {
                models_dir,
                default_embedding_model: "potion-base-8M".to_string(),
                available_models: vec![
                    AvailableModel {
                        name: "potion-base-8M".to_string(),
                        repo_id: "minishlab/potion-base-8M".to_string(),
                        size_mb: 33,
                        dimensions: 256,
                        description: "Compact static sentence embeddings, good default".to_string(),
                    },
                    AvailableModel {
                        name: "potion-retrieval-32M".to_string(),
                        repo_id: "minishlab/potion-retrieval-32M".to_string(),
                        size_mb: 130,
                        dimensions: 512,
                        description: "Larger static embeddings tuned for retrieval".to_string(),
                    },
                    AvailableModel {
                        name: "m2v-base".to_string(),
                        repo_id: "minishlab/M2V_base_output".to_string(),
                        size_mb: 90,
                        dimensions: 256,
                        description: "Legacy Model2Vec base embeddings".to_string(),
                    },
                ],
            },
            vocabulary: VocabularyConfig {
                ratings_path: PathBuf::from("data/Skills.txt"),
                ratings_term_column: "Element Name".to_string(),
                ratings_scale_column: "Scale Name".to_string(),
                ratings_value_column: "Data Value".to_string(),
                scale_filter: "Importance".to_string(),
                min_importance: 3.0,
                examples_path: PathBuf::from("data/Technology Skills.txt"),
                examples_term_column: "Example".to_string(),
            },
            scoring: ScoringConfig {
                lexical_weight: DEFAULT_LEXICAL_WEIGHT,
                semantic_weight: DEFAULT_SEMANTIC_WEIGHT,
                shortlist_threshold: SHORTLIST_THRESHOLD,
                max_batch_size: DEFAULT_MAX_BATCH,
            },
            processing: ProcessingConfig {
                workers: 0,
                redact_pii: false,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
        }
    }
}

impl Config {
    /// Load from an explicit path, or from the default location (created on first use)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let config_path = Self::config_path();
                if config_path.exists() {
                    Self::load_from(&config_path)
                } else {
                    let config = Self::default();
                    config.save_to(&config_path)?;
                    Ok(config)
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            ScreenerError::Configuration(format!("Failed to parse config: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            ScreenerError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-screener")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        self.fusion_weights()?;

        if self.scoring.max_batch_size == 0 {
            return Err(ScreenerError::Configuration(
                "scoring.max_batch_size must be at least 1".to_string(),
            ));
        }

        if !self.vocabulary.min_importance.is_finite() {
            return Err(ScreenerError::Configuration(
                "vocabulary.min_importance must be a finite number".to_string(),
            ));
        }

        Ok(())
    }

    /// Fusion weights and threshold as configured, validated
    pub fn fusion_weights(&self) -> Result<FusionWeights> {
        FusionWeights::new(
            self.scoring.lexical_weight,
            self.scoring.semantic_weight,
            self.scoring.shortlist_threshold,
        )
    }

    pub fn vocabulary_schema(&self) -> VocabularySchema {
        let v = &self.vocabulary;
        VocabularySchema {
            ratings_term_column: v.ratings_term_column.clone(),
            ratings_scale_column: v.ratings_scale_column.clone(),
            ratings_value_column: v.ratings_value_column.clone(),
            scale_filter: v.scale_filter.clone(),
            min_importance: v.min_importance,
            examples_term_column: v.examples_term_column.clone(),
        }
    }

    pub fn models_dir(&self) -> &PathBuf {
        &self.models.models_dir
    }

    pub fn get_model_by_name(&self, name: &str) -> Option<&AvailableModel> {
        self.models
            .available_models
            .iter()
            .find(|m| m.name == name || m.repo_id == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scoring.lexical_weight, 0.4);
        assert_eq!(config.scoring.semantic_weight, 0.6);
        assert_eq!(config.scoring.shortlist_threshold, 50.0);
        assert_eq!(config.scoring.max_batch_size, 20);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.processing.redact_pii = true;
        config.scoring.max_batch_size = 5;
        config.save_to(&path).unwrap();

        let loaded = Config::load(Some(path.as_path())).unwrap();
        assert!(loaded.processing.redact_pii);
        assert_eq!(loaded.scoring.max_batch_size, 5);
        assert_eq!(loaded.output.format, OutputFormat::Console);
    }

    #[test]
    fn test_rejects_weights_not_summing_to_one() {
        let mut config = Config::default();
        config.scoring.lexical_weight = 0.7;
        assert!(matches!(
            config.validate(),
            Err(ScreenerError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let mut config = Config::default();
        config.scoring.max_batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_model_lookup_by_name_or_repo() {
        let config = Config::default();
        assert!(config.get_model_by_name("potion-base-8M").is_some());
        assert!(config.get_model_by_name("minishlab/M2V_base_output").is_some());
        assert!(config.get_model_by_name("nope").is_none());
    }
}
