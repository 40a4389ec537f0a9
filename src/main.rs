//! Smeform - Bilingual SME Marketing-Profile Processing Pipeline
//!
//! Command-line entry point for processing raw marketing-profile form
//! records: language detection, Sinhala translation, structural conversion,
//! and submission to the forms backend.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use indicatif::ProgressBar;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use walkdir::WalkDir;

use smeform::api::TrendReport;
use smeform::backend::to_backend_payload;
use smeform::cli::{Args, BackendAction, Commands};
use smeform::config::Config;
use smeform::convert::remove_empty_fields;
use smeform::error::ProcessorError;
use smeform::processor::{FormProcessor, ProcessingOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    // Load configuration, then apply provider-selection env overrides once
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };
    config.apply_env_overrides();

    let processor = FormProcessor::new(&config);
    let mut options = ProcessingOptions::from(&config.processing);

    match args.command {
        Commands::Process { input, output, submit, no_translate, show_prompt } => {
            info!("Processing form record: {}", input.display());

            if no_translate {
                options.enable_translation = false;
            }

            let record = read_record(&input).await?;

            if submit {
                let outcome = processor.process_and_submit(&record, &options).await;
                if let Some(error) = &outcome.backend_error {
                    warn!("Backend submission failed: {}", error);
                }
                if show_prompt {
                    if let Some(prompt) = &outcome.ai_prompt {
                        println!("{}\n", prompt);
                    }
                }
                write_rendered(&outcome, options.remove_empty_fields, output.as_deref()).await?;
            } else {
                let result = processor.process_form_data(&record, &options).await;
                if show_prompt {
                    if let Some(data) = &result.data {
                        println!("{}\n", processor.generate_ai_prompt(data));
                    }
                }
                write_rendered(&result, options.remove_empty_fields, output.as_deref()).await?;
            }
        }
        Commands::Validate { input } => {
            let record = read_record(&input).await?;
            let report = processor.validate_form_data(&record);

            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_valid {
                warn!(
                    "Record is incomplete: {} required fields missing",
                    report.missing_fields.len()
                );
                std::process::exit(1);
            }
        }
        Commands::Prompt { input } => {
            let record = read_record(&input).await?;
            let result = processor.process_form_data(&record, &options).await;

            match result.data {
                Some(data) => println!("{}", processor.generate_ai_prompt(&data)),
                None => {
                    return Err(ProcessorError::Conversion(result.errors.join(", ")).into());
                }
            }
        }
        Commands::Export { input, output_dir, filename } => {
            let record = read_record(&input).await?;
            let result = processor.process_form_data(&record, &options).await;

            let Some(data) = result.data else {
                return Err(ProcessorError::Conversion(result.errors.join(", ")).into());
            };

            let export = processor.export_as_json(&data, filename.as_deref())?;
            let dir = match output_dir {
                Some(dir) => dir,
                None => input.parent().unwrap_or(Path::new(".")).to_path_buf(),
            };
            tokio::fs::create_dir_all(&dir).await?;

            let path = dir.join(&export.filename);
            tokio::fs::write(&path, &export.json).await?;
            println!("Exported: {}", path.display());
        }
        Commands::Batch { input_dir, output_dir, submit } => {
            info!("Processing directory: {}", input_dir.display());
            process_directory(&processor, &options, &input_dir, output_dir, submit).await?;
        }
        Commands::Backend { action } => {
            let api = processor.api();
            match action {
                BackendAction::Health => {
                    let health = api.health().await?;
                    println!("{}", serde_json::to_string_pretty(&health)?);
                }
                BackendAction::List { page, limit } => {
                    let list = api.get_submissions(page, limit).await?;
                    println!(
                        "Showing page {} ({} of {} submissions)",
                        list.page,
                        list.submissions.len(),
                        list.total
                    );
                    println!("{}", serde_json::to_string_pretty(&list.submissions)?);
                }
                BackendAction::Get { id } => {
                    let submission = api.get_submission(&id).await?;
                    println!("{}", serde_json::to_string_pretty(&submission)?);
                }
                BackendAction::Stats => {
                    let stats = api.get_stats().await?;
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                }
                BackendAction::SetStatus { id, status } => {
                    let updated = api.update_submission_status(&id, &status).await?;
                    println!("{}", serde_json::to_string_pretty(&updated)?);
                }
                BackendAction::Delete { id } => {
                    let deleted = api.delete_submission(&id).await?;
                    println!("{}", serde_json::to_string_pretty(&deleted)?);
                }
            }
        }
        Commands::Strategy { input } => {
            let record = read_record(&input).await?;
            let result = processor.process_form_data(&record, &options).await;

            let Some(data) = result.data else {
                return Err(ProcessorError::Conversion(result.errors.join(", ")).into());
            };

            // Trend failures degrade to empty signals; strategy generation
            // is still worth attempting without them
            let trends = match processor.api().get_trends().await {
                Ok(report) => report,
                Err(e) => {
                    warn!("Trend service unavailable: {}", e);
                    TrendReport::empty()
                }
            };

            let sme_profile = serde_json::to_value(to_backend_payload(&data))?;
            let strategy = processor.api().generate_strategy(&sme_profile, &trends).await?;

            if strategy.success {
                println!("{}", serde_json::to_string_pretty(&strategy)?);
            } else {
                warn!(
                    "Strategy generation reported failure: {}",
                    strategy.error.as_deref().unwrap_or("unknown error")
                );
                println!("{}", serde_json::to_string_pretty(&strategy)?);
            }
        }
    }

    Ok(())
}

/// Process every .json record under a directory, one result file each.
/// Individual failures are logged and skipped.
async fn process_directory(
    processor: &FormProcessor,
    options: &ProcessingOptions,
    input_dir: &Path,
    output_dir: Option<PathBuf>,
    submit: bool,
) -> Result<()> {
    if !input_dir.is_dir() {
        return Err(ProcessorError::Config("Input path is not a directory".to_string()).into());
    }

    let output_dir = output_dir.unwrap_or_else(|| input_dir.to_path_buf());
    tokio::fs::create_dir_all(&output_dir).await?;

    let mut record_files = Vec::new();
    for entry in WalkDir::new(input_dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("json")
            && !path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .is_some_and(|stem| stem.ends_with(".result"))
        {
            record_files.push(path.to_path_buf());
        }
    }

    info!("Found {} form records to process", record_files.len());
    let progress = ProgressBar::new(record_files.len() as u64);

    for record_path in record_files {
        match process_one(processor, options, &record_path, &output_dir, submit).await {
            Ok(_) => info!("Successfully processed: {}", record_path.display()),
            Err(e) => warn!("Failed to process {}: {}", record_path.display(), e),
        }
        progress.inc(1);
    }

    progress.finish();
    Ok(())
}

async fn process_one(
    processor: &FormProcessor,
    options: &ProcessingOptions,
    record_path: &Path,
    output_dir: &Path,
    submit: bool,
) -> Result<()> {
    let record = read_record(record_path).await?;

    let stem = record_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "record".to_string());
    let output_path = output_dir.join(format!("{}.result.json", stem));

    if submit {
        let outcome = processor.process_and_submit(&record, options).await;
        write_rendered(&outcome, options.remove_empty_fields, Some(&output_path)).await?;
    } else {
        let result = processor.process_form_data(&record, options).await;
        write_rendered(&result, options.remove_empty_fields, Some(&output_path)).await?;
    }

    Ok(())
}

async fn read_record(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(ProcessorError::FileNotFound(path.display().to_string()).into());
    }
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Serialize a result for output, pruning the processed data section when
/// configured, and write it to the given path or stdout.
async fn write_rendered<T: Serialize>(
    result: &T,
    remove_empty: bool,
    output: Option<&Path>,
) -> Result<()> {
    let mut value = serde_json::to_value(result)?;
    if remove_empty {
        if let Some(data) = value.get("data") {
            let pruned = remove_empty_fields(data);
            value["data"] = pruned;
        }
    }

    let rendered = serde_json::to_string_pretty(&value)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, &rendered).await?;
            println!("Result written to: {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let app_dir = std::env::current_dir()?.join(".smeform");
    let log_dir = app_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "smeform.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
