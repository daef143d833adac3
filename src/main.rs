//! Resume screener: score and shortlist resumes against a job description

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use resume_screener::cli::{self, Cli, Commands, ConfigAction, ModelAction};
use resume_screener::config::{Config, OutputFormat};
use resume_screener::error::{Result, ScreenerError};
use resume_screener::input::manager::{collect_inputs, InputManager};
use resume_screener::output::{
    save_report_to_file, BatchReport, ReportGenerator, ReportMetadata, ScoreReport,
};
use resume_screener::processing::embedding_manager::EmbeddingModelManager;
use resume_screener::processing::{ScreeningEngine, SkillVocabulary};
use std::path::Path;
use std::process;
use std::time::Instant;

const INPUT_EXTENSIONS: [&str; 4] = ["pdf", "txt", "md", "markdown"];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Score {
            resume,
            job,
            output,
            save,
            detailed,
        } => {
            cli::validate_file_extension(&resume, &INPUT_EXTENSIONS)
                .map_err(|e| ScreenerError::InvalidInput(format!("Resume file: {}", e)))?;
            cli::validate_file_extension(&job, &INPUT_EXTENSIONS)
                .map_err(|e| ScreenerError::InvalidInput(format!("Job description file: {}", e)))?;
            let format = output_format(output.as_deref(), &config)?;

            let engine = start_engine(&config).await?;
            let mut input_manager = InputManager::new();
            let resume_text = input_manager.extract_text(&resume).await?;
            let job_text = input_manager.extract_text(&job).await?;

            let start_time = Instant::now();
            let result = engine.score_one(&resume_text, &job_text)?;

            let report = ScoreReport {
                resume: display_name(&resume),
                job: display_name(&job),
                result,
                weights: *engine.weights(),
                metadata: metadata(&engine, start_time),
            };
            let generator = ReportGenerator::new(
                config.output.color_output && save.is_none(),
                detailed || config.output.detailed,
            );
            emit(&generator.score_report(&report, format)?, save.as_deref())?;
        }

        Commands::Rank {
            job,
            resumes,
            max,
            output,
            save,
            detailed,
        } => {
            cli::validate_file_extension(&job, &INPUT_EXTENSIONS)
                .map_err(|e| ScreenerError::InvalidInput(format!("Job description file: {}", e)))?;
            let format = output_format(output.as_deref(), &config)?;
            let max_count = max.unwrap_or(config.scoring.max_batch_size);

            let files = collect_inputs(&resumes)?;
            if files.is_empty() {
                return Err(ScreenerError::InvalidInput(
                    "No supported resume files found".to_string(),
                ));
            }

            let engine = start_engine(&config).await?;
            let mut input_manager = InputManager::new();
            let job_text = input_manager.extract_text(&job).await?;
            let loaded = input_manager.load_resumes(&files, max_count).await;
            info!("Loaded {} of {} resumes", loaded.len(), files.len());

            let progress = ProgressBar::new(loaded.len() as u64);
            progress.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .map_err(|e| ScreenerError::OutputFormatting(e.to_string()))?
                    .progress_chars("#>-"),
            );

            let start_time = Instant::now();
            let batch =
                engine.score_loaded_batch(&job_text, &loaded, files.len(), max_count, &|id| {
                    progress.set_message(id.to_string());
                    progress.inc(1);
                });
            progress.finish_and_clear();
            let batch = batch?;

            let report = BatchReport {
                job: display_name(&job),
                batch,
                weights: *engine.weights(),
                metadata: metadata(&engine, start_time),
            };
            let generator = ReportGenerator::new(
                config.output.color_output && save.is_none(),
                detailed || config.output.detailed,
            );
            emit(&generator.batch_report(&report, format)?, save.as_deref())?;
        }

        Commands::Models { action } => run_models(action, &config).await?,

        Commands::Vocabulary { terms } => {
            let vocabulary = SkillVocabulary::build(
                &config.vocabulary.ratings_path,
                &config.vocabulary.examples_path,
                &config.vocabulary_schema(),
            )?;
            println!("Skill vocabulary: {} terms", vocabulary.len());
            println!("  ratings:  {}", config.vocabulary.ratings_path.display());
            println!("  examples: {}", config.vocabulary.examples_path.display());

            for term in &terms {
                let status = if vocabulary.contains(term) {
                    "recognized"
                } else {
                    "not in vocabulary"
                };
                println!("  {} -> {}", term, status);
            }
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                println!("Current Configuration\n");
                println!("Models Directory: {}", config.models_dir().display());
                println!("Embedding Model: {}", config.models.default_embedding_model);
                println!("\nVocabulary:");
                println!("  Ratings: {}", config.vocabulary.ratings_path.display());
                println!("  Examples: {}", config.vocabulary.examples_path.display());
                println!(
                    "  Filter: {} >= {:.1}",
                    config.vocabulary.scale_filter, config.vocabulary.min_importance
                );
                println!("\nScoring:");
                println!("  Lexical weight: {:.2}", config.scoring.lexical_weight);
                println!("  Semantic weight: {:.2}", config.scoring.semantic_weight);
                println!("  Shortlist threshold: {:.2}", config.scoring.shortlist_threshold);
                println!("  Max batch size: {}", config.scoring.max_batch_size);
                println!("\nProcessing:");
                println!("  Workers: {}", config.processing.workers);
                println!("  PII redaction: {}", config.processing.redact_pii);
            }

            Some(ConfigAction::Reset) => {
                Config::default().save()?;
                println!("Configuration reset to defaults: {}", Config::config_path().display());
            }

            Some(ConfigAction::Path) => {
                println!("{}", Config::config_path().display());
            }
        },
    }

    Ok(())
}

async fn run_models(action: ModelAction, config: &Config) -> Result<()> {
    let mut manager = EmbeddingModelManager::new(
        config.models_dir().clone(),
        config.models.available_models.clone(),
    )
    .await?;

    match action {
        ModelAction::List => {
            println!("Embedding Models:\n");
            for model in manager.list_available_models() {
                let status = if manager.is_model_downloaded(&model.name) {
                    "downloaded"
                } else {
                    "available"
                };
                let default = if model.name == config.models.default_embedding_model {
                    " (default)"
                } else {
                    ""
                };
                println!(
                    "  {}{} ({}) - {} MB [{}]",
                    model.name, default, model.repo_id, model.size_mb, status
                );
                println!("    {}", model.description);
            }

            if manager.list_downloaded_models().is_empty() {
                println!("\nNo models downloaded yet. Get started with:");
                println!("   resume-screener models download {}", config.models.default_embedding_model);
            }
        }

        ModelAction::Download { model, force } => {
            let model_path = manager.download_model(&model, force).await?;
            println!("Model '{}' ready at {}", model, model_path.display());
        }

        ModelAction::Remove { model } => {
            if manager.remove_model(&model).await? {
                println!("Model '{}' removed", model);
            } else {
                println!("Model '{}' is not downloaded", model);
            }
        }

        ModelAction::Info { model } => {
            let info = manager
                .resolve(&model)
                .cloned()
                .ok_or_else(|| ScreenerError::InvalidInput(format!("Unknown embedding model: {}", model)))?;

            println!("Name: {}", info.name);
            println!("Repository: {}", info.repo_id);
            println!("Size: {} MB", info.size_mb);
            println!("Dimensions: {}", info.dimensions);
            println!("Description: {}", info.description);

            if manager.is_model_downloaded(&info.name) {
                println!("Status: downloaded");
                println!("Location: {}", manager.model_path(&info.name).display());
            } else {
                println!("Status: not downloaded");
                println!("\nTo download this model, run:");
                println!("   resume-screener models download {}", info.name);
            }
        }
    }

    Ok(())
}

/// Make sure the configured model is on disk, then load vocabulary and model
async fn start_engine(config: &Config) -> Result<ScreeningEngine> {
    let mut manager = EmbeddingModelManager::new(
        config.models_dir().clone(),
        config.models.available_models.clone(),
    )
    .await?;
    manager
        .ensure_model_available(&config.models.default_embedding_model)
        .await?;

    ScreeningEngine::initialize(config)
}

fn output_format(requested: Option<&str>, config: &Config) -> Result<OutputFormat> {
    match requested {
        Some(format) => cli::parse_output_format(format).map_err(ScreenerError::InvalidInput),
        None => Ok(config.output.format),
    }
}

fn metadata(engine: &ScreeningEngine, start_time: Instant) -> ReportMetadata {
    ReportMetadata::new(
        start_time.elapsed().as_millis() as u64,
        engine.model_name(),
        engine.vocabulary().len(),
    )
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn emit(content: &str, save: Option<&Path>) -> Result<()> {
    match save {
        Some(path) => {
            save_report_to_file(content, path)?;
            println!("Report saved to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
