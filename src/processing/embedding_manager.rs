//! Download and bookkeeping of Model2Vec embedding models

use crate::config::AvailableModel;
use crate::error::{Result, ScreenerError};
use hf_hub::api::tokio::Api;
use log::{info, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;

const REQUIRED_FILES: [&str; 2] = ["model.safetensors", "tokenizer.json"];
const OPTIONAL_FILES: [&str; 2] = ["config.json", "README.md"];

/// Tracks which configured models exist under the models directory
pub struct EmbeddingModelManager {
    models_dir: PathBuf,
    available_models: Vec<AvailableModel>,
    downloaded_models: BTreeSet<String>,
}

impl EmbeddingModelManager {
    pub async fn new(models_dir: PathBuf, available_models: Vec<AvailableModel>) -> Result<Self> {
        fs::create_dir_all(&models_dir).await.map_err(|e| {
            ScreenerError::ModelUnavailable(format!(
                "Failed to create models directory {}: {}",
                models_dir.display(),
                e
            ))
        })?;

        let mut manager = Self {
            models_dir,
            available_models,
            downloaded_models: BTreeSet::new(),
        };
        manager.scan_downloaded_models().await?;
        Ok(manager)
    }

    async fn scan_downloaded_models(&mut self) -> Result<()> {
        let mut entries = fs::read_dir(&self.models_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() && is_model_directory(&entry.path()).await {
                self.downloaded_models
                    .insert(entry.file_name().to_string_lossy().to_string());
            }
        }
        Ok(())
    }

    /// Find a configured model by short name or Hugging Face repo id
    pub fn resolve(&self, name_or_repo: &str) -> Option<&AvailableModel> {
        let lowered = name_or_repo.to_lowercase();
        self.available_models.iter().find(|m| {
            m.name == name_or_repo || m.repo_id == name_or_repo || m.name.to_lowercase() == lowered
        })
    }

    pub fn is_model_downloaded(&self, name: &str) -> bool {
        self.downloaded_models.contains(name)
    }

    pub fn model_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name)
    }

    pub fn list_available_models(&self) -> &[AvailableModel] {
        &self.available_models
    }

    pub fn list_downloaded_models(&self) -> Vec<String> {
        self.downloaded_models.iter().cloned().collect()
    }

    /// Fetch the model files from the hub into `<models_dir>/<name>`
    pub async fn download_model(&mut self, name_or_repo: &str, force: bool) -> Result<PathBuf> {
        let model = self
            .resolve(name_or_repo)
            .cloned()
            .ok_or_else(|| {
                ScreenerError::InvalidInput(format!("Unknown embedding model: {}", name_or_repo))
            })?;
        let model_dir = self.model_path(&model.name);

        if !force && self.is_model_downloaded(&model.name) {
            return Ok(model_dir);
        }

        info!(
            "Downloading embedding model {} from {} ({} MB)",
            model.name, model.repo_id, model.size_mb
        );
        fs::create_dir_all(&model_dir).await?;

        let api = Api::new()
            .map_err(|e| ScreenerError::Network(format!("Failed to initialize HF API: {}", e)))?;
        let repo = api.model(model.repo_id.clone());

        for file in REQUIRED_FILES {
            let cached = repo.get(file).await.map_err(|e| {
                ScreenerError::Network(format!("Failed to download required file {}: {}", file, e))
            })?;
            fs::copy(&cached, model_dir.join(file)).await?;
            info!("  downloaded {}", file);
        }

        for file in OPTIONAL_FILES {
            match repo.get(file).await {
                Ok(cached) => {
                    fs::copy(&cached, model_dir.join(file)).await?;
                    info!("  downloaded {}", file);
                }
                Err(e) => warn!("  optional file {} not available: {}", file, e),
            }
        }

        self.downloaded_models.insert(model.name.clone());
        Ok(model_dir)
    }

    /// Path of a usable model, downloading it first when missing
    pub async fn ensure_model_available(&mut self, name: &str) -> Result<PathBuf> {
        if self.is_model_downloaded(name) {
            return Ok(self.model_path(name));
        }
        self.download_model(name, false).await
    }

    pub async fn remove_model(&mut self, name: &str) -> Result<bool> {
        if !self.downloaded_models.remove(name) {
            return Ok(false);
        }
        fs::remove_dir_all(self.model_path(name)).await?;
        Ok(true)
    }
}

async fn is_model_directory(path: &Path) -> bool {
    for file in REQUIRED_FILES {
        if fs::metadata(path.join(file)).await.is_err() {
            return false;
        }
    }
    true
}
