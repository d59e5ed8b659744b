//! The single source of truth the views render from.

use tesisview_protocol::{AnalysisResult, DocumentHandle, ObservationList, QueryExchange};

use crate::error::WorkflowError;

/// Lifecycle stage of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No document analysed yet
    #[default]
    Idle,
    /// Upload request in flight
    Uploading,
    /// Results held, ready for questions or a re-upload
    Ready,
    /// Query request in flight
    Querying,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Uploading => "uploading",
            Phase::Ready => "ready",
            Phase::Querying => "querying",
        }
    }

    /// True while a request is in flight; submission controls are disabled.
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Uploading | Phase::Querying)
    }

    /// Loading indicator text, if any.
    pub fn activity_label(&self) -> Option<&'static str> {
        match self {
            Phase::Uploading => Some("Subiendo..."),
            Phase::Querying => Some("Consultando..."),
            Phase::Idle | Phase::Ready => None,
        }
    }

    /// The operation in flight in this phase.
    pub fn in_flight(&self) -> Option<Operation> {
        match self {
            Phase::Uploading => Some(Operation::Upload),
            Phase::Querying => Some(Operation::Query),
            Phase::Idle | Phase::Ready => None,
        }
    }
}

/// The two asynchronous operations a session performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Upload,
    Query,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Upload => "upload",
            Operation::Query => "query",
        }
    }
}

/// A recorded failure and the operation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub operation: Operation,
    pub error: WorkflowError,
}

impl Failure {
    /// Banner text.
    pub fn message(&self) -> String {
        self.error.user_message(self.operation)
    }
}

/// Everything the views may show. Mutated only by [`crate::Workflow`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowState {
    pub phase: Phase,
    pub document: Option<DocumentHandle>,
    pub results: Option<AnalysisResult>,
    pub observations: ObservationList,
    pub last_query: Option<QueryExchange>,
    pub error: Option<Failure>,
}

impl WorkflowState {
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(Failure::message)
    }

    pub fn can_submit_document(&self) -> bool {
        !self.phase.is_busy()
    }

    pub fn can_submit_question(&self) -> bool {
        self.phase == Phase::Ready && self.document.is_some()
    }

    /// The answer to show, hidden while a query failure is on screen so a
    /// stale answer and its error banner never render together.
    pub fn visible_answer(&self) -> Option<&QueryExchange> {
        match &self.error {
            Some(Failure { operation: Operation::Query, .. }) => None,
            _ => self.last_query.as_ref(),
        }
    }
}
