//! Boundary validation for caller-supplied document input.

use super::error::ValidationError;
use super::types::{ExtractedInfo, ExtractedValue, UploadMetadata};

/// Maximum nesting depth of the extracted-info bag, counting the top level.
pub const MAX_EXTRACTED_DEPTH: usize = 8;

/// Validates the name and metadata of a document about to be saved.
pub fn validate_upload(name: &str, metadata: &UploadMetadata) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if metadata.content_type.trim().is_empty() {
        return Err(ValidationError::EmptyContentType);
    }
    Ok(())
}

/// Validates a ledger source label.
pub fn validate_source(source: &str) -> Result<(), ValidationError> {
    if source.trim().is_empty() {
        return Err(ValidationError::EmptySource);
    }
    Ok(())
}

/// Validates the shape of an extracted-info bag.
///
/// Field names must be non-empty and free of `.` (dots are reserved for
/// query paths), and nesting may not exceed [`MAX_EXTRACTED_DEPTH`].
pub fn validate_extracted_info(info: &ExtractedInfo) -> Result<(), ValidationError> {
    validate_level(info, "", 1)
}

fn validate_level(info: &ExtractedInfo, prefix: &str, depth: usize) -> Result<(), ValidationError> {
    for (key, value) in info {
        if key.is_empty() {
            return Err(ValidationError::EmptyFieldName);
        }
        if key.contains('.') {
            return Err(ValidationError::DottedFieldName(key.clone()));
        }
        let path = join_path(prefix, key);
        if let ExtractedValue::Object(nested) = value {
            if depth >= MAX_EXTRACTED_DEPTH {
                return Err(ValidationError::TooDeep {
                    path,
                    max: MAX_EXTRACTED_DEPTH,
                });
            }
            validate_level(nested, &path, depth + 1)?;
        }
    }
    Ok(())
}

/// Converts arbitrary JSON into a validated extracted-info bag.
///
/// This is the entry point for untrusted input such as request bodies or
/// CLI arguments.
pub fn parse_extracted_info(value: &serde_json::Value) -> Result<ExtractedInfo, ValidationError> {
    let info = match value {
        serde_json::Value::Object(map) => convert_object(map, "")?,
        other => {
            return Err(ValidationError::UnsupportedValue {
                path: String::new(),
                reason: format!("expected an object, found {}", json_kind(other)),
            })
        }
    };
    validate_extracted_info(&info)?;
    Ok(info)
}

fn convert_object(
    map: &serde_json::Map<String, serde_json::Value>,
    prefix: &str,
) -> Result<ExtractedInfo, ValidationError> {
    let mut info = ExtractedInfo::new();
    for (key, value) in map {
        let path = join_path(prefix, key);
        let converted = match value {
            serde_json::Value::String(s) => ExtractedValue::Text(s.clone()),
            serde_json::Value::Number(n) => ExtractedValue::Number(n.clone()),
            serde_json::Value::Object(nested) => {
                ExtractedValue::Object(convert_object(nested, &path)?)
            }
            other => {
                return Err(ValidationError::UnsupportedValue {
                    path,
                    reason: format!("{} values are not supported", json_kind(other)),
                })
            }
        };
        info.insert(key.clone(), converted);
    }
    Ok(info)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}
