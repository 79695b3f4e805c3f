//! quill CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use quill::app::build_repository;
use quill::cli::{Cli, Commands, OutputFormat};
use quill::config::{Config, ConfigError, StoreBackend};
use quill::output::{format_output, pretty};
use quill::DocumentRepository;
use quill_core::document::UploadMetadata;
use quill_core::storage::{repository_error_to_exit_code, RepositoryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status for configuration errors (sysexits `EX_CONFIG`).
const EXIT_CONFIG: u8 = 78;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    if let Some(repo_err) = err.downcast_ref::<RepositoryError>() {
        repository_error_to_exit_code(repo_err)
    } else if err.downcast_ref::<ConfigError>().is_some() {
        EXIT_CONFIG
    } else {
        1
    }
}

fn load_config(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = Config::from_env()?;
    if cli.store.is_some() || cli.sqlite_path.is_some() {
        let path = cli
            .sqlite_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("quill.db"));
        config.store = StoreBackend::parse(cli.store.as_deref().unwrap_or("sqlite"), path)?;
    }
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let repo = build_repository(&config).await?;

    let result = execute(&cli, &repo).await;
    repo.connection().disconnect().await?;
    result
}

async fn execute(cli: &Cli, repo: &DocumentRepository) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Put {
            path,
            name,
            content_type,
            info,
        } => {
            let content = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let name = match name {
                Some(name) => name.clone(),
                None => path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
            };
            let metadata = UploadMetadata::new(content.len() as u64, content_type.clone());
            let saved = repo.save(&name, &content, metadata, info.clone()).await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_output(&saved, cli.format)),
                OutputFormat::Pretty => println!("Saved:\n{}", pretty::format_summary(&saved)),
            }
        }
        Commands::Get { id, output } => {
            let document = repo.get(id).await?;
            if let Some(output) = output {
                tokio::fs::write(output, &document.content)
                    .await
                    .with_context(|| format!("failed to write {}", output.display()))?;
                if !cli.quiet {
                    eprintln!("Wrote {} bytes to {}", document.content.len(), output.display());
                }
            }
            match cli.format {
                OutputFormat::Json => println!("{}", format_output(&document, cli.format)),
                OutputFormat::Pretty => println!("{}", pretty::format_document(&document)),
            }
        }
        Commands::List => {
            let documents = repo.list().await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_output(&documents, cli.format)),
                OutputFormat::Pretty => println!("{}", pretty::format_summaries(&documents)),
            }
        }
        Commands::Delete { id } => {
            repo.delete(id).await?;
            if !cli.quiet {
                println!("Deleted document {}", id);
            }
        }
        Commands::Info { id } => {
            let view = repo.get_extracted_info(id).await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_output(&view, cli.format)),
                OutputFormat::Pretty => println!("{}", pretty::format_extracted_info(&view)),
            }
        }
        Commands::UpdateInfo { id, info, source } => {
            repo.update_extracted_info(id, info.clone(), source).await?;
            if !cli.quiet {
                println!("Updated extracted info for {} ({})", id, source);
            }
        }
        Commands::Search { query } => {
            let documents = repo.search_by_extracted_info(query).await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_output(&documents, cli.format)),
                OutputFormat::Pretty => println!("{}", pretty::format_summaries(&documents)),
            }
        }
        Commands::Summary => {
            let summary = repo.get_information_summary().await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_output(&summary, cli.format)),
                OutputFormat::Pretty => {
                    println!("{}", pretty::format_information_summary(&summary))
                }
            }
        }
    }

    Ok(())
}
