//! Analysis service HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). Every call blocks
//! until the service answers or the transport gives up, so callers that own
//! a UI run these on a worker thread.

use std::time::Duration;

use tesisview_protocol::{
    DocumentHandle, ErrorBody, QueryRequest, QueryResponse, UploadResponse, UploadedDocument,
    DOWNLOAD_EXCEL_PATH, QUERY_PATH, UPLOAD_FILE_FIELD, UPLOAD_PATH,
};

/// Default service address (the analysis backend listens on port 5000).
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

const USER_AGENT: &str = concat!("tesisview/", env!("CARGO_PKG_VERSION"));

/// Error type for service calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Client could not be constructed (bad base URL, TLS init)
    Config(String),
    /// Network unreachable, connection refused, timeout
    Transport(String),
    /// Service answered with a non-2xx status
    Service { status: u16, message: String },
    /// Service answered 2xx but the body didn't match the contract
    Decode(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Config(msg) => write!(f, "Client configuration error: {}", msg),
            ClientError::Transport(msg) => write!(f, "Network error: {}", msg),
            ClientError::Service { status, message } => write!(f, "HTTP {}: {}", status, message),
            ClientError::Decode(msg) => write!(f, "Unexpected response: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl ClientError {
    /// True for failures where the service was never reached.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// True when the service reports that the document handle is unknown
    /// (expired or never uploaded). Only meaningful for query/export calls.
    pub fn is_document_not_found(&self) -> bool {
        match self {
            ClientError::Service { status: 404, .. } => true,
            ClientError::Service { message, .. } => {
                let m = message.to_lowercase();
                m.contains("not found") || m.contains("no encontrado") || m.contains("no existe")
            }
            _ => false,
        }
    }
}

/// Connection options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Service base URL; a path prefix (e.g. "https://host/api") is kept
    pub base_url: String,
    /// Whole-request deadline. `None` leaves it to the transport.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
        }
    }
}

/// The three calls the session layer needs from the service.
///
/// `AnalysisClient` is the HTTP implementation; tests substitute fakes.
pub trait AnalysisService {
    /// `POST /upload` with the document as multipart field `file`.
    fn upload(&self, doc: &UploadedDocument) -> Result<UploadResponse, ClientError>;

    /// `POST /query` scoped to a previously uploaded document.
    fn query(&self, handle: &DocumentHandle, question: &str) -> Result<QueryResponse, ClientError>;

    /// Address of the server-side spreadsheet for `handle`. No network call.
    fn export_url(&self, handle: &DocumentHandle) -> String;
}

/// Analysis service client (blocking).
#[derive(Clone)]
pub struct AnalysisClient {
    http: reqwest::blocking::Client,
    base: url::Url,
}

impl AnalysisClient {
    pub fn new(opts: ClientOptions) -> Result<Self, ClientError> {
        let base = url::Url::parse(opts.base_url.trim())
            .map_err(|e| ClientError::Config(format!("invalid base URL '{}': {}", opts.base_url, e)))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "base URL must be http(s): '{}'",
                opts.base_url
            )));
        }

        let mut builder = reqwest::blocking::Client::builder().user_agent(USER_AGENT);
        // reqwest's blocking client defaults to a 30s deadline; None means "no
        // deadline beyond the transport's own".
        builder = builder.timeout(opts.request_timeout);

        let http = builder
            .build()
            .map_err(|e| ClientError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { http, base })
    }

    /// Client for `base_url` with no explicit deadline.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::new(ClientOptions {
            base_url: base_url.into(),
            ..ClientOptions::default()
        })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    // ── Internal helpers ────────────────────────────────────────────

    /// Append path segments to the base, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> url::Url {
        let mut url = self.base.clone();
        // Checked in new(): the base can always carry segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        url
    }

    fn path_segments(path: &str) -> Vec<&str> {
        path.split('/').filter(|s| !s.is_empty()).collect()
    }

    fn send(
        &self,
        req: reqwest::blocking::RequestBuilder,
    ) -> Result<reqwest::blocking::Response, ClientError> {
        let response = req.send().map_err(transport_error)?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            let mut message = ErrorBody::message_from(&body);
            if message.is_empty() {
                message = response_reason(status);
            }
            return Err(ClientError::Service { status, message });
        }

        Ok(response)
    }
}

impl AnalysisService for AnalysisClient {
    fn upload(&self, doc: &UploadedDocument) -> Result<UploadResponse, ClientError> {
        let url = self.endpoint(&Self::path_segments(UPLOAD_PATH));
        log::debug!("POST {} ({}, {} bytes)", url, doc.name, doc.len());

        let part = reqwest::blocking::multipart::Part::bytes(doc.bytes.clone())
            .file_name(doc.name.clone())
            .mime_str("application/pdf")
            .map_err(|e| ClientError::Config(e.to_string()))?;
        let form = reqwest::blocking::multipart::Form::new().part(UPLOAD_FILE_FIELD, part);

        let response = self.send(self.http.post(url).multipart(form))?;
        response.json::<UploadResponse>().map_err(body_error)
    }

    fn query(&self, handle: &DocumentHandle, question: &str) -> Result<QueryResponse, ClientError> {
        let url = self.endpoint(&Self::path_segments(QUERY_PATH));
        log::debug!("POST {} (document {})", url, handle);

        let body = QueryRequest {
            pdf_name: handle.as_str().to_string(),
            pregunta: question.to_string(),
        };
        let response = self.send(self.http.post(url).json(&body))?;
        response.json::<QueryResponse>().map_err(body_error)
    }

    fn export_url(&self, handle: &DocumentHandle) -> String {
        let mut segments = Self::path_segments(DOWNLOAD_EXCEL_PATH);
        segments.push(handle.as_str());
        self.endpoint(&segments).to_string()
    }
}

fn transport_error(e: reqwest::Error) -> ClientError {
    let kind = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "connection failed"
    } else if e.is_body() {
        "response body interrupted"
    } else {
        "request failed"
    };
    ClientError::Transport(format!("{}: {}", kind, e))
}

/// Reading a 2xx body can fail in transit too. reqwest reports both cases
/// as decode errors, so only a JSON parse failure in the source chain
/// counts as `Decode`.
fn body_error(e: reqwest::Error) -> ClientError {
    let mut source = std::error::Error::source(&e);
    while let Some(cause) = source {
        if cause.is::<serde_json::Error>() {
            return ClientError::Decode(e.to_string());
        }
        source = cause.source();
    }
    transport_error(e)
}

fn response_reason(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("unknown status")
        .to_string()
}
