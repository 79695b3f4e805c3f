//! CLI command definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use quill_core::document::{parse_extracted_info, ExtractedInfo, FieldQuery, MANUAL_UPDATE_SOURCE};

/// Operator CLI for the quill encrypted document store.
#[derive(Debug, Parser)]
#[command(name = "quill")]
#[command(version, about = "Operator CLI for the quill encrypted document store", long_about = None)]
pub struct Cli {
    /// Storage backend: `sqlite` or `memory`.
    #[arg(long, env = "QUILL_STORE")]
    pub store: Option<String>,

    /// SQLite database path.
    #[arg(long, env = "QUILL_SQLITE_PATH")]
    pub sqlite_path: Option<PathBuf>,

    /// Output format.
    #[arg(long, default_value = "pretty")]
    pub format: OutputFormat,

    /// Suppress non-essential output.
    #[arg(long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Raw JSON output.
    Json,
    /// Human-readable output.
    #[default]
    Pretty,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Encrypt and store a file.
    Put {
        /// File to upload.
        path: PathBuf,
        /// Stored name (defaults to the file name).
        #[arg(long)]
        name: Option<String>,
        /// MIME type of the content.
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
        /// Extracted info as a JSON object.
        #[arg(long, value_parser = parse_info)]
        info: Option<ExtractedInfo>,
    },
    /// Decrypt a document.
    Get {
        /// Document ID.
        id: String,
        /// Write the plaintext to this file.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// List all documents.
    List,
    /// Delete a document.
    Delete {
        /// Document ID.
        id: String,
    },
    /// Show a document's extracted info and its ledger.
    Info {
        /// Document ID.
        id: String,
    },
    /// Replace a document's extracted info.
    UpdateInfo {
        /// Document ID.
        id: String,
        /// New extracted info as a JSON object.
        #[arg(long, value_parser = parse_info)]
        info: ExtractedInfo,
        /// Ledger source recorded for the change.
        #[arg(long, default_value = MANUAL_UPDATE_SOURCE)]
        source: String,
    },
    /// Find documents whose extracted info matches every given field.
    Search {
        /// Query as a JSON object; keys may be dot paths such as `address.city`.
        #[arg(value_parser = parse_query)]
        query: FieldQuery,
    },
    /// Summarize every extracted field across all documents.
    Summary,
}

/// Parse a JSON object into validated extracted info.
pub fn parse_info(raw: &str) -> Result<ExtractedInfo, String> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    parse_extracted_info(&value).map_err(|e| e.to_string())
}

/// Parse a JSON object into a search query.
pub fn parse_query(raw: &str) -> Result<FieldQuery, String> {
    serde_json::from_str(raw)
        .map_err(|e| format!("query must be a JSON object of strings, numbers or objects: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use quill_core::document::ExtractedValue;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_put_with_info() {
        let cli = Cli::try_parse_from([
            "quill",
            "--format",
            "json",
            "put",
            "w2.pdf",
            "--content-type",
            "application/pdf",
            "--info",
            r#"{"year": 2023}"#,
        ])
        .unwrap();

        assert!(matches!(cli.format, OutputFormat::Json));
        match cli.command {
            Commands::Put {
                path,
                content_type,
                info,
                name,
            } => {
                assert_eq!(path, PathBuf::from("w2.pdf"));
                assert_eq!(content_type, "application/pdf");
                assert!(name.is_none());
                let info = info.unwrap();
                assert_eq!(info.get("year").and_then(ExtractedValue::as_f64), Some(2023.0));
            }
            other => panic!("Expected Put, got {other:?}"),
        }
    }

    #[test]
    fn test_update_info_defaults_to_manual_source() {
        let cli =
            Cli::try_parse_from(["quill", "update-info", "some-id", "--info", r#"{"a": "b"}"#])
                .unwrap();
        match cli.command {
            Commands::UpdateInfo { source, .. } => assert_eq!(source, "manual_update"),
            other => panic!("Expected UpdateInfo, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_info_values_are_rejected() {
        assert!(parse_info(r#"{"flag": true}"#).is_err());
        assert!(parse_info(r#"[1, 2]"#).is_err());
        assert!(parse_info("not json").is_err());
    }

    #[test]
    fn test_parse_query_accepts_dot_paths() {
        let query = parse_query(r#"{"address.city": "London"}"#).unwrap();
        assert_eq!(query["address.city"], ExtractedValue::from("London"));
    }
}
