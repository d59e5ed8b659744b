use std::fmt;

use tesisview_client::ClientError;

use crate::state::Operation;

// User-facing texts. One banner per failure class.
pub const MSG_NO_FILE: &str = "Por favor, selecciona un archivo PDF.";
pub const MSG_NOT_PDF: &str = "El archivo debe ser un PDF.";
pub const MSG_EMPTY_FILE: &str = "El archivo está vacío.";
pub const MSG_EMPTY_QUESTION: &str = "Por favor, escribe una pregunta.";
pub const MSG_NO_DOCUMENT: &str = "Primero sube un PDF.";
pub const MSG_BUSY: &str = "Espera a que termine la operación en curso.";
pub const MSG_UPLOAD_FAILED: &str = "Error al procesar el PDF. Verifica que el servidor esté corriendo.";
pub const MSG_QUERY_TRANSPORT: &str = "Error al procesar la pregunta. Verifica que el servidor esté corriendo.";
pub const MSG_QUERY_FAILED: &str =
    "Error al procesar la pregunta. Verifica que el servidor esté corriendo y el PDF exista.";
pub const MSG_DOCUMENT_GONE: &str = "El documento ya no está disponible en el servidor. Vuelve a subir el PDF.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// Bad or missing local input; never reaches the network.
    Validation(String),
    /// Rejected because this operation is already in flight.
    Busy(Operation),
    /// Service unreachable (refused, DNS, timeout).
    Transport(String),
    /// Service reached but answered with a failure.
    Service { message: String, not_found: bool },
}

impl WorkflowError {
    /// Classify a client failure. Undecodable 2xx bodies count as service failures.
    pub fn from_client(err: ClientError) -> Self {
        let not_found = err.is_document_not_found();
        match err {
            ClientError::Transport(msg) | ClientError::Config(msg) => Self::Transport(msg),
            ClientError::Service { message, .. } => Self::Service { message, not_found },
            ClientError::Decode(msg) => Self::Service { message: msg, not_found: false },
        }
    }

    /// Short machine-readable class name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Busy(_) => "busy",
            Self::Transport(_) => "transport",
            Self::Service { .. } => "service",
        }
    }

    /// The banner text for a failure of `operation`.
    pub fn user_message(&self, operation: Operation) -> String {
        match (self, operation) {
            (Self::Validation(msg), _) => msg.clone(),
            (Self::Busy(_), _) => MSG_BUSY.to_string(),
            (Self::Transport(_), Operation::Upload) => MSG_UPLOAD_FAILED.to_string(),
            (Self::Transport(_), Operation::Query) => MSG_QUERY_TRANSPORT.to_string(),
            (Self::Service { message, .. }, Operation::Upload) => {
                if message.is_empty() {
                    MSG_UPLOAD_FAILED.to_string()
                } else {
                    format!("El servidor rechazó el PDF: {}", message)
                }
            }
            (Self::Service { not_found: true, .. }, Operation::Query) => MSG_DOCUMENT_GONE.to_string(),
            (Self::Service { message, .. }, Operation::Query) => {
                if message.is_empty() {
                    MSG_QUERY_FAILED.to_string()
                } else {
                    format!("{} ({})", MSG_QUERY_FAILED, message)
                }
            }
        }
    }
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
            Self::Busy(op) => write!(f, "busy: {} already in flight", op.label()),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Service { message, not_found: true } => write!(f, "document not found: {message}"),
            Self::Service { message, .. } => write!(f, "service error: {message}"),
        }
    }
}

impl std::error::Error for WorkflowError {}
