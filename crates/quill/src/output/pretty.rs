//! Pretty output formatting.

use quill_core::document::{
    Document, DocumentMetadata, DocumentSummary, ExtractedInfo, ExtractedInfoView,
    ExtractedValue, InformationSummary,
};

fn format_value(value: &ExtractedValue) -> String {
    match value {
        ExtractedValue::Text(text) => text.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn format_metadata(metadata: &DocumentMetadata) -> String {
    format!(
        "  Type: {}\n  Size: {} bytes\n  Created: {}\n  Modified: {}",
        metadata.content_type,
        metadata.size,
        metadata.created_at.to_rfc3339(),
        metadata.last_modified.to_rfc3339()
    )
}

fn format_fields(info: &ExtractedInfo) -> String {
    let mut output = String::new();
    for (key, value) in info {
        output.push_str(&format!("\n    {}: {}", key, format_value(value)));
    }
    output
}

/// Format a document summary for display.
pub fn format_summary(summary: &DocumentSummary) -> String {
    let mut output = format!(
        "{}\n  ID: {}\n{}",
        summary.name,
        summary.id,
        format_metadata(&summary.metadata)
    );
    if !summary.extracted_info.is_empty() {
        output.push_str("\n  Extracted:");
        output.push_str(&format_fields(&summary.extracted_info));
    }
    output
}

/// Format document summaries for display.
pub fn format_summaries(summaries: &[DocumentSummary]) -> String {
    if summaries.is_empty() {
        return "No documents found.".to_string();
    }
    let mut output = format!("DOCUMENTS ({})\n", summaries.len());
    output.push_str(&"-".repeat(40));
    for summary in summaries {
        output.push_str(&format!("\n{}", format_summary(summary)));
        output.push('\n');
    }
    output
}

/// Format a decrypted document for display, without its content.
pub fn format_document(document: &Document) -> String {
    format!(
        "{}\n  ID: {}\n{}\n  Decrypted: {} bytes",
        document.name,
        document.id,
        format_metadata(&document.metadata),
        document.content.len()
    )
}

/// Format extracted info and its ledger for display.
pub fn format_extracted_info(view: &ExtractedInfoView) -> String {
    let mut output = "EXTRACTED INFO".to_string();
    if view.extracted_info.is_empty() {
        output.push_str("\n    (none)");
    } else {
        output.push_str(&format_fields(&view.extracted_info));
    }
    output.push_str(&format!("\nHISTORY ({})", view.extraction_history.len()));
    for entry in &view.extraction_history {
        let fields: Vec<&str> = entry.fields.iter().map(String::as_str).collect();
        output.push_str(&format!(
            "\n  {} [{}] {}",
            entry.timestamp.to_rfc3339(),
            entry.source,
            fields.join(", ")
        ));
    }
    output
}

/// Format the corpus-wide information summary for display.
pub fn format_information_summary(summary: &InformationSummary) -> String {
    if summary.is_empty() {
        return "No extracted information found.".to_string();
    }
    let mut output = format!("FIELDS ({})\n", summary.len());
    output.push_str(&"-".repeat(40));
    for (field, entry) in summary {
        output.push_str(&format!("\n{}: {}", field, format_value(&entry.value)));
        for source in &entry.sources {
            output.push_str(&format!(
                "\n  from {} ({}) at {}",
                source.document_name,
                source.document_id,
                source.date.to_rfc3339()
            ));
        }
    }
    output
}
