//! Corpus-wide reduction of extracted info into a per-field summary.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{DocumentId, DocumentSummary, ExtractedValue};

/// A document that contributed a value to a summarized field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarySource {
    pub document_id: DocumentId,
    pub document_name: String,
    /// Creation time of the contributing document.
    pub date: DateTime<Utc>,
}

/// Summary of one field across every document that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub value: ExtractedValue,
    pub sources: Vec<SummarySource>,
}

/// Field name to its summary.
pub type InformationSummary = BTreeMap<String, FieldSummary>;

/// Folds every document's top-level extracted fields into a summary.
///
/// Documents are visited in the order given; for each field the value from
/// the last document visited wins while sources accumulate in visit order.
pub fn summarize<'a, I>(documents: I) -> InformationSummary
where
    I: IntoIterator<Item = &'a DocumentSummary>,
{
    documents
        .into_iter()
        .fold(InformationSummary::new(), |mut summary, document| {
            for (field, value) in &document.extracted_info {
                let source = SummarySource {
                    document_id: document.id,
                    document_name: document.name.clone(),
                    date: document.metadata.created_at,
                };
                summary
                    .entry(field.clone())
                    .and_modify(|existing| {
                        existing.value = value.clone();
                        existing.sources.push(source.clone());
                    })
                    .or_insert_with(|| FieldSummary {
                        value: value.clone(),
                        sources: vec![source],
                    });
            }
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentMetadata, ExtractedInfo, UploadMetadata};
    use chrono::Duration;
    use serde_json::json;

    fn doc(name: &str, info: serde_json::Value, created_at: DateTime<Utc>) -> DocumentSummary {
        DocumentSummary {
            id: DocumentId::generate(),
            name: name.to_string(),
            metadata: DocumentMetadata::stamped(
                UploadMetadata::new(1, "application/pdf"),
                created_at,
            ),
            extracted_info: serde_json::from_value::<ExtractedInfo>(info).unwrap(),
        }
    }

    #[test]
    fn test_empty_corpus_yields_empty_summary() {
        let documents: Vec<DocumentSummary> = Vec::new();
        assert!(summarize(&documents).is_empty());
    }

    #[test]
    fn test_single_document_summary() {
        let now = Utc::now();
        let w2 = doc("w2.pdf", json!({ "ssn": "000-11-2222" }), now);

        let summary = summarize([&w2]);

        let ssn = &summary["ssn"];
        assert_eq!(ssn.value, ExtractedValue::from("000-11-2222"));
        assert_eq!(ssn.sources.len(), 1);
        assert_eq!(ssn.sources[0].document_id, w2.id);
        assert_eq!(ssn.sources[0].document_name, "w2.pdf");
        assert_eq!(ssn.sources[0].date, now);
    }

    #[test]
    fn test_last_enumerated_value_wins_and_sources_accumulate() {
        let now = Utc::now();
        let w2 = doc("w2.pdf", json!({ "ssn": "000-11-2222", "employer": "Acme" }), now);
        let lease = doc(
            "lease.pdf",
            json!({ "ssn": "111-22-3333", "address": { "city": "London" } }),
            now + Duration::minutes(1),
        );

        let summary = summarize(&[w2.clone(), lease.clone()]);

        assert_eq!(summary.len(), 3);
        let ssn = &summary["ssn"];
        assert_eq!(ssn.value, ExtractedValue::from("111-22-3333"));
        let names: Vec<&str> = ssn
            .sources
            .iter()
            .map(|s| s.document_name.as_str())
            .collect();
        assert_eq!(names, vec!["w2.pdf", "lease.pdf"]);
        assert_eq!(summary["employer"].sources.len(), 1);
        assert!(summary["address"].value.as_object().is_some());
    }

    #[test]
    fn test_summary_serializes_camel_case_sources() {
        let w2 = doc("w2.pdf", json!({ "ssn": "000-11-2222" }), Utc::now());
        let value = serde_json::to_value(summarize([&w2])).unwrap();

        assert_eq!(value["ssn"]["value"], "000-11-2222");
        assert_eq!(value["ssn"]["sources"][0]["documentName"], "w2.pdf");
        assert!(value["ssn"]["sources"][0].get("documentId").is_some());
    }
}
