//! Analysis Service Protocol — wire contract and session data model
//!
//! This crate defines the canonical types exchanged with the thesis analysis
//! service. The transport is HTTP; bodies are JSON except for the upload
//! (multipart) and the spreadsheet download (binary).
//!
//! | Operation | Method/Path                     | Request                         | Response                                   |
//! |-----------|---------------------------------|---------------------------------|--------------------------------------------|
//! | Upload    | `POST /upload`                  | multipart, field `file`         | `{results, observations, pdf_name}`        |
//! | Query     | `POST /query`                   | `{pdf_name, pregunta}`          | `{respuesta}`                              |
//! | Export    | `GET /download_excel/{pdf_name}`| —                               | binary spreadsheet                         |
//!
//! Failures come back as non-2xx with `{"error": "<message>"}`.
//!
//! The field names (`pdf_name`, `pregunta`, `respuesta`) are part of the
//! service contract and must not be renamed. `tests/wire_golden.rs` pins them.

use std::fmt;
use std::path::Path;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

// =============================================================================
// Contract constants
// =============================================================================

/// Upload endpoint path.
pub const UPLOAD_PATH: &str = "/upload";

/// Query endpoint path.
pub const QUERY_PATH: &str = "/query";

/// Prefix of the server-side spreadsheet download; the handle is appended.
pub const DOWNLOAD_EXCEL_PATH: &str = "/download_excel";

/// Multipart form field carrying the document bytes.
pub const UPLOAD_FILE_FIELD: &str = "file";

/// File name suffix the service accepts. The service compares it
/// case-sensitively, so `TESIS.PDF` is rejected.
pub const DOCUMENT_SUFFIX: &str = ".pdf";

/// Header of the trailing observations column in exported spreadsheets.
pub const OBSERVATIONS_COLUMN: &str = "Observaciones";

/// Separator used when observations are flattened into one cell.
pub const OBSERVATIONS_SEPARATOR: &str = "; ";

// =============================================================================
// Session data model
// =============================================================================

/// A document chosen by the user, held only until it has been submitted.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    /// File name as selected (e.g., "tesis.pdf")
    pub name: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }

    /// Read a document from disk. The file name (not the full path) becomes `name`.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self { name, bytes })
    }

    /// True if the name ends in the exact suffix the service accepts.
    pub fn has_accepted_extension(&self) -> bool {
        self.name.ends_with(DOCUMENT_SUFFIX)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Payload bytes are noise in logs and test failures.
impl fmt::Debug for UploadedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedDocument")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Server-issued identifier scoping query and export calls to one upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentHandle(String);

impl DocumentHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracted fields, in the order the service returned them.
///
/// Keys are service-defined; nothing here assumes a schema. Non-string JSON
/// values are kept as their JSON text, `null` becomes an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    fields: Vec<(String, String)>,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field. Replacing keeps the original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AnalysisResult {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut result = AnalysisResult::new();
        for (k, v) in iter {
            result.insert(k, v);
        }
        result
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AnalysisResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResultVisitor;

        impl<'de> Visitor<'de> for ResultVisitor {
            type Value = AnalysisResult;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping field names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut result = AnalysisResult::new();
                while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
                    result.insert(key, value_to_text(value));
                }
                Ok(result)
            }
        }

        deserializer.deserialize_map(ResultVisitor)
    }
}

fn value_to_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Free-text caveats about an analysis. Always paired with an `AnalysisResult`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationList(Vec<String>);

impl ObservationList {
    pub fn new(items: Vec<String>) -> Self {
        Self(items)
    }

    /// All observations in one string, separated by `"; "`. Empty list → "".
    pub fn joined(&self) -> String {
        self.0.join(OBSERVATIONS_SEPARATOR)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for ObservationList {
    fn from(items: Vec<String>) -> Self {
        Self(items)
    }
}

/// The most recent question and its answer. Not accumulated into history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryExchange {
    pub question: String,
    pub answer: String,
}

// =============================================================================
// Wire bodies
// =============================================================================

/// Response of `POST /upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub results: AnalysisResult,
    #[serde(default)]
    pub observations: ObservationList,
    pub pdf_name: DocumentHandle,
}

/// Body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub pdf_name: String,
    pub pregunta: String,
}

/// Response of `POST /query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub respuesta: String,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    /// Extract the service message from a failure body.
    /// Falls back to the trimmed raw text when the body isn't `{"error": ...}`.
    pub fn message_from(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed.error,
            Err(_) => body.trim().to_string(),
        }
    }
}
