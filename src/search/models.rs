//! Search result and response envelope types

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize, Serializer};

/// Payload returned when the provider reports no hits
pub const NO_RESULTS: &str = "No results found";

/// A retrieved file, content base64-encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedFile {
    pub name: String,
    pub mime_type: String,
    pub content: String,
}

impl FetchedFile {
    /// Build from raw bytes
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content: STANDARD.encode(bytes),
        }
    }
}

/// A per-item failure, reported only when partial results are enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub message: String,
}

/// The `{ "openaiFileResponse": [...] }` body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResponse {
    #[serde(rename = "openaiFileResponse")]
    pub files: Vec<FetchedFile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ItemError>,
}

impl FileResponse {
    pub fn new(files: Vec<FetchedFile>) -> Self {
        Self {
            files,
            errors: Vec::new(),
        }
    }
}

/// What a successful request returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEnvelope {
    /// Serialized as the bare string [`NO_RESULTS`]
    NoResults,
    Files(FileResponse),
}

impl Serialize for ResponseEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResponseEnvelope::NoResults => serializer.serialize_str(NO_RESULTS),
            ResponseEnvelope::Files(response) => response.serialize(serializer),
        }
    }
}

/// How a failed per-item fetch affects the request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The first failure fails the request and cancels the other fetches
    #[default]
    FailFast,
    /// Every fetch completes; failures are listed next to the files
    Partial,
}

impl FailurePolicy {
    pub fn from_partial_results(partial_results: bool) -> Self {
        if partial_results {
            FailurePolicy::Partial
        } else {
            FailurePolicy::FailFast
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_results_serializes_as_string() {
        let value = serde_json::to_value(ResponseEnvelope::NoResults).unwrap();
        assert_eq!(value, json!("No results found"));
    }

    #[test]
    fn test_files_envelope_shape() {
        let envelope = ResponseEnvelope::Files(FileResponse::new(vec![FetchedFile::from_bytes(
            "a.txt",
            "text/plain",
            b"hi",
        )]));
        assert_eq!(
            serde_json::to_value(envelope).unwrap(),
            json!({
                "openaiFileResponse": [
                    {"name": "a.txt", "mime_type": "text/plain", "content": "aGk="}
                ]
            })
        );
    }

    #[test]
    fn test_errors_listed_when_present() {
        let envelope = ResponseEnvelope::Files(FileResponse {
            files: vec![],
            errors: vec![ItemError {
                name: "b.pdf".to_string(),
                id: Some("2".to_string()),
                message: "Failed to fetch content for b.pdf: drive returned 404: itemNotFound".to_string(),
            }],
        });
        let value = serde_json::to_value(envelope).unwrap();
        assert_eq!(value["openaiFileResponse"], json!([]));
        assert_eq!(value["errors"][0]["id"], json!("2"));
    }

    #[test]
    fn test_empty_content_encodes_to_empty_string() {
        assert_eq!(FetchedFile::from_bytes("e", "text/plain", b"").content, "");
    }

    #[test]
    fn test_policy_from_flag() {
        assert_eq!(FailurePolicy::from_partial_results(false), FailurePolicy::FailFast);
        assert_eq!(FailurePolicy::from_partial_results(true), FailurePolicy::Partial);
    }
}
