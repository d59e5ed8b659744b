//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                                   |
//! |---------|------------------|-----------------------------------------------|
//! | 0       | Universal        | Success                                       |
//! | 1       | Universal        | General error (unspecified)                   |
//! | 2       | Universal        | CLI usage error (bad args, unreadable file)   |
//! | 3-9     | local            | Input validation, export I/O                  |
//! | 40-49   | service          | Analysis service transport/service failures   |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use tesisview_core::{Operation, WorkflowError};

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing or unreadable input file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Local (3-9)
// =============================================================================

/// Input rejected before any network call (not a PDF, empty file, blank question).
pub const EXIT_VALIDATION: u8 = 3;

/// Spreadsheet could not be written.
pub const EXIT_EXPORT_IO: u8 = 4;

// =============================================================================
// Service (40-49)
// =============================================================================

/// Service unreachable (connection refused, DNS, timeout).
pub const EXIT_TRANSPORT: u8 = 40;

/// Service answered with a failure.
pub const EXIT_SERVICE: u8 = 41;

/// Service no longer knows the uploaded document.
pub const EXIT_DOCUMENT_NOT_FOUND: u8 = 42;

// =============================================================================
// Workflow Error Types
// =============================================================================

/// Map a WorkflowError to its exit code.
pub fn workflow_exit_code(err: &WorkflowError) -> u8 {
    match err {
        WorkflowError::Validation(_) => EXIT_VALIDATION,
        WorkflowError::Busy(_) => EXIT_ERROR, // Cannot happen in a blocking run
        WorkflowError::Transport(_) => EXIT_TRANSPORT,
        WorkflowError::Service { not_found: true, .. } => EXIT_DOCUMENT_NOT_FOUND,
        WorkflowError::Service { .. } => EXIT_SERVICE,
    }
}

/// Structured error output for `analyze --json`.
#[derive(Debug, serde::Serialize)]
pub struct WorkflowErrorOutput {
    pub error: &'static str,
    pub operation: &'static str,
    pub message: String,
    pub detail: String,
    pub exit_code: u8,
}

impl WorkflowErrorOutput {
    pub fn from_workflow_error(err: &WorkflowError, operation: Operation) -> Self {
        Self {
            error: err.kind(),
            operation: operation.label(),
            message: err.user_message(operation),
            detail: err.to_string(),
            exit_code: workflow_exit_code(err),
        }
    }

    /// Print error to stderr (human-readable by default).
    pub fn print(&self, json: bool) {
        if json {
            if let Ok(output) = serde_json::to_string(self) {
                eprintln!("{}", output);
            }
        } else {
            eprintln!("error: {}", self.message);
        }
    }
}
