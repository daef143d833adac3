//! Input manager for reading resumes and job descriptions

use crate::error::{Result, ScreenerError};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{
    MarkdownExtractor, PdfExtractor, PlainTextExtractor, TextExtractor,
};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct InputManager {
    cache: HashMap<PathBuf, String>,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    pub async fn extract_text(&mut self, path: &Path) -> Result<String> {
        if let Some(cached) = self.cache.get(path) {
            debug!("Using cached text for: {}", path.display());
            return Ok(cached.clone());
        }

        if !path.exists() {
            return Err(ScreenerError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let text = match FileType::from_path(path) {
            FileType::Pdf => PdfExtractor.extract(path).await?,
            FileType::Text => PlainTextExtractor.extract(path).await?,
            FileType::Markdown => MarkdownExtractor.extract(path).await?,
            other => {
                return Err(ScreenerError::UnsupportedFormat(format!(
                    "{:?} files are not supported: {}",
                    other,
                    path.display()
                )));
            }
        };
        info!("Read {} characters from {}", text.len(), path.display());

        self.cache.insert(path.to_path_buf(), text.clone());
        Ok(text)
    }

    /// Read the first `max_count` resumes as `(file name, text)`, in the order
    /// given. Files past the cap are never opened. A file that fails to read
    /// keeps its slot with the error in place of its text.
    pub async fn load_resumes(
        &mut self,
        paths: &[PathBuf],
        max_count: usize,
    ) -> Vec<(String, Result<String>)> {
        let kept = &paths[..paths.len().min(max_count)];
        if kept.len() < paths.len() {
            info!(
                "Reading {} of {} resume files, the rest are past the batch cap",
                kept.len(),
                paths.len()
            );
        }

        let mut resumes = Vec::with_capacity(kept.len());
        for path in kept {
            let id = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            let text = self.extract_text(path).await;
            if let Err(e) = &text {
                debug!("Could not read {}: {}", path.display(), e);
            }
            resumes.push((id, text));
        }
        resumes
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

/// Expand directories into their supported files, sorted by name; plain file
/// arguments are kept as given.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file())
                .collect();
            entries.sort();

            for entry in entries {
                if FileType::from_path(&entry).is_supported() {
                    files.push(entry);
                } else {
                    warn!("Skipping unsupported file: {}", entry.display());
                }
            }
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}
