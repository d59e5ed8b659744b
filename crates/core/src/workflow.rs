//! Session state machine.
//!
//! ```text
//!   Idle ──begin_upload──▶ Uploading ──finish_upload──▶ Ready ◀──▶ Querying
//!    ▲                        │ (failed, no prior doc)    │
//!    └────────────────────────┘                           │
//!    └──────────────────── reset() ───────────────────────┘
//! ```
//!
//! Each operation is split in two so the network call can run elsewhere:
//! `begin_*` validates, applies the busy guard, transitions and hands out a
//! [`Ticket`]; `finish_*` applies the outcome only if that ticket is still
//! the one in flight. Sequence numbers only grow, and `reset()` forgets the
//! in-flight tickets, so a response issued before a reset is dropped.
//!
//! `submit_document` / `submit_question` run begin, call and finish in one go
//! for callers that can block.

use tesisview_client::{AnalysisService, ClientError};
use tesisview_protocol::{
    AnalysisResult, DocumentHandle, ObservationList, QueryExchange, QueryResponse, UploadResponse,
    UploadedDocument,
};

use crate::error::{
    WorkflowError, MSG_EMPTY_FILE, MSG_EMPTY_QUESTION, MSG_NOT_PDF, MSG_NO_DOCUMENT, MSG_NO_FILE,
};
use crate::state::{Failure, Operation, Phase, WorkflowState};

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    operation: Operation,
    seq: u64,
}

impl Ticket {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// An accepted upload, ready to be sent.
#[derive(Debug)]
pub struct PendingUpload {
    pub ticket: Ticket,
    pub document: UploadedDocument,
}

/// An accepted question, ready to be sent. `question` is already trimmed.
#[derive(Debug, Clone)]
pub struct PendingQuery {
    pub ticket: Ticket,
    pub handle: DocumentHandle,
    pub question: String,
}

/// What `finish_*` did with a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Success stored in state
    Applied,
    /// Failure recorded in state
    Failed(WorkflowError),
    /// Response belonged to a request no longer in flight; state untouched
    Stale,
}

#[derive(Debug)]
struct InFlightQuery {
    seq: u64,
    question: String,
}

/// A successful session set aside while a re-upload is in flight.
#[derive(Debug)]
struct HeldSession {
    document: DocumentHandle,
    results: AnalysisResult,
    observations: ObservationList,
    last_query: Option<QueryExchange>,
}

/// Owner and only writer of [`WorkflowState`].
#[derive(Debug, Default)]
pub struct Workflow {
    state: WorkflowState,
    next_seq: u64,
    upload_in_flight: Option<u64>,
    query_in_flight: Option<InFlightQuery>,
    // Restored when the in-flight upload fails.
    held: Option<HeldSession>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Accept a document for upload.
    ///
    /// Rejected with `Busy` while any request is in flight and with
    /// `Validation` when no file was chosen, the name lacks a `.pdf`
    /// suffix, or the payload is empty. Rejections are recorded in
    /// `state().error`; held results are left alone.
    ///
    /// Once accepted, any previous session leaves the state until the upload
    /// completes, so `results` is `None` while `Uploading`.
    pub fn begin_upload(
        &mut self,
        document: Option<UploadedDocument>,
    ) -> Result<PendingUpload, WorkflowError> {
        if let Some(op) = self.state.phase.in_flight() {
            return Err(self.reject(Operation::Upload, WorkflowError::Busy(op)));
        }
        let document = match document {
            Some(doc) => doc,
            None => return Err(self.reject(Operation::Upload, validation(MSG_NO_FILE))),
        };
        if !document.has_accepted_extension() {
            return Err(self.reject(Operation::Upload, validation(MSG_NOT_PDF)));
        }
        if document.is_empty() {
            return Err(self.reject(Operation::Upload, validation(MSG_EMPTY_FILE)));
        }

        let ticket = self.issue(Operation::Upload);
        self.upload_in_flight = Some(ticket.seq);
        self.held = self.take_session();
        self.state.error = None;
        self.transition(Phase::Uploading);
        log::debug!("upload #{} issued for {} ({} bytes)", ticket.seq, document.name, document.len());

        Ok(PendingUpload { ticket, document })
    }

    /// Apply the outcome of an upload.
    ///
    /// On success the results, observations and handle are replaced
    /// wholesale and the previous answer is dropped. On failure the prior
    /// session (if any) is kept and the phase falls back to `Ready` or `Idle`.
    pub fn finish_upload(
        &mut self,
        ticket: Ticket,
        outcome: Result<UploadResponse, ClientError>,
    ) -> Completion {
        if ticket.operation != Operation::Upload || self.upload_in_flight != Some(ticket.seq) {
            log::info!("discarding stale upload response #{}", ticket.seq);
            return Completion::Stale;
        }
        self.upload_in_flight = None;

        match outcome {
            Ok(resp) => {
                log::debug!(
                    "upload #{} ok: {} fields, {} observations, handle {}",
                    ticket.seq,
                    resp.results.len(),
                    resp.observations.len(),
                    resp.pdf_name
                );
                self.held = None;
                self.state.results = Some(resp.results);
                self.state.observations = resp.observations;
                self.state.document = Some(resp.pdf_name);
                self.state.last_query = None;
                self.state.error = None;
                self.transition(Phase::Ready);
                Completion::Applied
            }
            Err(e) => {
                log::warn!("upload #{} failed: {}", ticket.seq, e);
                let err = WorkflowError::from_client(e);
                self.state.error = Some(Failure { operation: Operation::Upload, error: err.clone() });
                let fallback = match self.held.take() {
                    Some(session) => {
                        log::debug!("restoring session for {}", session.document);
                        self.state.document = Some(session.document);
                        self.state.results = Some(session.results);
                        self.state.observations = session.observations;
                        self.state.last_query = session.last_query;
                        Phase::Ready
                    }
                    None => Phase::Idle,
                };
                self.transition(fallback);
                Completion::Failed(err)
            }
        }
    }

    /// Accept a question about the current document.
    ///
    /// Rejected with `Busy` while any request is in flight and with
    /// `Validation` when no document is held or the text is blank.
    pub fn begin_query(&mut self, text: &str) -> Result<PendingQuery, WorkflowError> {
        if let Some(op) = self.state.phase.in_flight() {
            return Err(self.reject(Operation::Query, WorkflowError::Busy(op)));
        }
        let handle = match (&self.state.document, self.state.phase) {
            (Some(handle), Phase::Ready) => handle.clone(),
            _ => return Err(self.reject(Operation::Query, validation(MSG_NO_DOCUMENT))),
        };
        let question = text.trim();
        if question.is_empty() {
            return Err(self.reject(Operation::Query, validation(MSG_EMPTY_QUESTION)));
        }

        let ticket = self.issue(Operation::Query);
        self.query_in_flight = Some(InFlightQuery { seq: ticket.seq, question: question.to_string() });
        self.state.error = None;
        self.transition(Phase::Querying);
        log::debug!("query #{} issued against {}", ticket.seq, handle);

        Ok(PendingQuery { ticket, handle, question: question.to_string() })
    }

    /// Apply the outcome of a query. Only `last_query` and `error` change;
    /// results and observations are never touched. Always returns to `Ready`.
    pub fn finish_query(
        &mut self,
        ticket: Ticket,
        outcome: Result<QueryResponse, ClientError>,
    ) -> Completion {
        let matches = ticket.operation == Operation::Query
            && self.query_in_flight.as_ref().map(|q| q.seq) == Some(ticket.seq);
        if !matches {
            log::info!("discarding stale query response #{}", ticket.seq);
            return Completion::Stale;
        }
        let question = match self.query_in_flight.take() {
            Some(q) => q.question,
            None => return Completion::Stale,
        };

        let completion = match outcome {
            Ok(resp) => {
                log::debug!("query #{} answered ({} chars)", ticket.seq, resp.respuesta.len());
                self.state.last_query = Some(QueryExchange { question, answer: resp.respuesta });
                self.state.error = None;
                Completion::Applied
            }
            Err(e) => {
                log::warn!("query #{} failed: {}", ticket.seq, e);
                let err = WorkflowError::from_client(e);
                self.state.error = Some(Failure { operation: Operation::Query, error: err.clone() });
                Completion::Failed(err)
            }
        };
        self.transition(Phase::Ready);
        completion
    }

    /// Back to `Idle` with nothing held. Responses to requests issued before
    /// this call are discarded when they arrive.
    pub fn reset(&mut self) {
        if self.upload_in_flight.is_some() || self.query_in_flight.is_some() {
            log::info!("reset with a request in flight; its response will be ignored");
        }
        self.upload_in_flight = None;
        self.query_in_flight = None;
        self.held = None;
        self.state = WorkflowState::default();
        log::debug!("session reset");
    }

    /// Clear the error banner.
    pub fn dismiss_error(&mut self) {
        self.state.error = None;
    }

    /// Upload and apply in one blocking step.
    pub fn submit_document<S: AnalysisService + ?Sized>(
        &mut self,
        service: &S,
        document: Option<UploadedDocument>,
    ) -> Result<(), WorkflowError> {
        let pending = self.begin_upload(document)?;
        let outcome = service.upload(&pending.document);
        completion_result(self.finish_upload(pending.ticket, outcome))
    }

    /// Ask and apply in one blocking step.
    pub fn submit_question<S: AnalysisService + ?Sized>(
        &mut self,
        service: &S,
        text: &str,
    ) -> Result<(), WorkflowError> {
        let pending = self.begin_query(text)?;
        let outcome = service.query(&pending.handle, &pending.question);
        completion_result(self.finish_query(pending.ticket, outcome))
    }

    /// Server-side spreadsheet address for the held document.
    pub fn export_url<S: AnalysisService + ?Sized>(&self, service: &S) -> Option<String> {
        self.state.document.as_ref().map(|handle| service.export_url(handle))
    }

    /// Results and observations to export, once an upload has succeeded.
    pub fn exportable(&self) -> Option<(&AnalysisResult, &ObservationList)> {
        self.state.results.as_ref().map(|r| (r, &self.state.observations))
    }

    fn take_session(&mut self) -> Option<HeldSession> {
        let document = self.state.document.take();
        let results = self.state.results.take();
        let observations = std::mem::take(&mut self.state.observations);
        let last_query = self.state.last_query.take();
        match (document, results) {
            (Some(document), Some(results)) => {
                Some(HeldSession { document, results, observations, last_query })
            }
            _ => None,
        }
    }

        fn issue(&mut self, operation: Operation) -> Ticket {
        self.next_seq += 1;
        Ticket { operation, seq: self.next_seq }
    }

    fn reject(&mut self, operation: Operation, error: WorkflowError) -> WorkflowError {
        log::debug!("{} rejected: {}", operation.label(), error);
        self.state.error = Some(Failure { operation, error: error.clone() });
        error
    }

    fn transition(&mut self, to: Phase) {
        if self.state.phase != to {
            log::debug!("phase {} -> {}", self.state.phase.label(), to.label());
        }
        self.state.phase = to;
    }
}

fn validation(msg: &str) -> WorkflowError {
    WorkflowError::Validation(msg.to_string())
}

fn completion_result(completion: Completion) -> Result<(), WorkflowError> {
    match completion {
        Completion::Failed(err) => Err(err),
        Completion::Applied | Completion::Stale => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    #[derive(Default)]
    struct FakeService {
        uploads: Cell<usize>,
        queries: Cell<usize>,
        upload_replies: RefCell<VecDeque<Result<UploadResponse, ClientError>>>,
        query_replies: RefCell<VecDeque<Result<QueryResponse, ClientError>>>,
        last_question: RefCell<Option<(String, String)>>,
    }

    impl FakeService {
        fn reply_upload(self, r: Result<UploadResponse, ClientError>) -> Self {
            self.upload_replies.borrow_mut().push_back(r);
            self
        }

        fn reply_query(self, r: Result<QueryResponse, ClientError>) -> Self {
            self.query_replies.borrow_mut().push_back(r);
            self
        }
    }

    impl AnalysisService for FakeService {
        fn upload(&self, _doc: &UploadedDocument) -> Result<UploadResponse, ClientError> {
            self.uploads.set(self.uploads.get() + 1);
            self.upload_replies
                .borrow_mut()
                .pop_front()
                .expect("unexpected upload call")
        }

        fn query(&self, handle: &DocumentHandle, question: &str) -> Result<QueryResponse, ClientError> {
            self.queries.set(self.queries.get() + 1);
            *self.last_question.borrow_mut() = Some((handle.to_string(), question.to_string()));
            self.query_replies
                .borrow_mut()
                .pop_front()
                .expect("unexpected query call")
        }

        fn export_url(&self, handle: &DocumentHandle) -> String {
            format!("http://svc/download_excel/{}", handle)
        }
    }

    fn pdf(name: &str) -> Option<UploadedDocument> {
        Some(UploadedDocument::new(name, b"%PDF-1.4\n".to_vec()))
    }

    fn analysis(handle: &str) -> UploadResponse {
        let results: AnalysisResult =
            [("Autor", "Ana Pérez"), ("Año", "2023")].into_iter().collect();
        UploadResponse {
            results,
            observations: ObservationList::new(vec!["Falta firma del jurado".into()]),
            pdf_name: DocumentHandle::new(handle),
        }
    }

    fn answer(text: &str) -> QueryResponse {
        QueryResponse { respuesta: text.into() }
    }

    fn refused() -> ClientError {
        ClientError::Transport("connection failed".into())
    }

    #[test]
    fn test_upload_then_query_scenario() {
        let svc = FakeService::default()
            .reply_upload(Ok(analysis("tesis.pdf")))
            .reply_query(Ok(answer("Ana Pérez")));
        let mut wf = Workflow::new();

        wf.submit_document(&svc, pdf("tesis.pdf")).unwrap();
        assert_eq!(wf.state().phase, Phase::Ready);
        assert_eq!(wf.state().document, Some(DocumentHandle::new("tesis.pdf")));
        assert_eq!(wf.state().results.as_ref().unwrap().get("Autor"), Some("Ana Pérez"));

        wf.submit_question(&svc, "¿Quién es el autor?").unwrap();
        assert_eq!(wf.state().phase, Phase::Ready);
        assert_eq!(
            wf.state().last_query,
            Some(QueryExchange {
                question: "¿Quién es el autor?".into(),
                answer: "Ana Pérez".into(),
            })
        );
        assert!(wf.state().error.is_none());
    }

    #[test]
    fn test_missing_file_makes_no_call() {
        let svc = FakeService::default();
        let mut wf = Workflow::new();

        let err = wf.submit_document(&svc, None).unwrap_err();
        assert_eq!(err, WorkflowError::Validation(MSG_NO_FILE.into()));
        assert_eq!(svc.uploads.get(), 0);
        assert_eq!(wf.state().phase, Phase::Idle);
        assert_eq!(wf.state().error_message().as_deref(), Some(MSG_NO_FILE));
        assert!(wf.state().results.is_none());
    }

    #[test]
    fn test_non_pdf_and_empty_files_rejected_locally() {
        let svc = FakeService::default();
        let mut wf = Workflow::new();

        let err = wf.submit_document(&svc, pdf("notas.docx")).unwrap_err();
        assert_eq!(err, WorkflowError::Validation(MSG_NOT_PDF.into()));

        // The service rejects an uppercase suffix, so it is caught here
        let err = wf.submit_document(&svc, pdf("TESIS.PDF")).unwrap_err();
        assert_eq!(err, WorkflowError::Validation(MSG_NOT_PDF.into()));

        let empty = Some(UploadedDocument::new("vacio.pdf", Vec::new()));
        let err = wf.submit_document(&svc, empty).unwrap_err();
        assert_eq!(err, WorkflowError::Validation(MSG_EMPTY_FILE.into()));

        assert_eq!(svc.uploads.get(), 0);
    }

    #[test]
    fn test_upload_transport_failure_returns_to_idle() {
        let svc = FakeService::default().reply_upload(Err(refused()));
        let mut wf = Workflow::new();

        let err = wf.submit_document(&svc, pdf("tesis.pdf")).unwrap_err();
        assert_eq!(err.kind(), "transport");
        assert_eq!(wf.state().phase, Phase::Idle);
        assert!(wf.state().results.is_none());
        assert_eq!(
            wf.state().error_message().as_deref(),
            Some(crate::error::MSG_UPLOAD_FAILED)
        );
    }

    #[test]
    fn test_failed_reupload_keeps_previous_session() {
        let svc = FakeService::default()
            .reply_upload(Ok(analysis("tesis.pdf")))
            .reply_query(Ok(answer("Ana Pérez")))
            .reply_upload(Err(ClientError::Service { status: 400, message: "Invalid file".into() }));
        let mut wf = Workflow::new();
        wf.submit_document(&svc, pdf("tesis.pdf")).unwrap();
        wf.submit_question(&svc, "¿Autor?").unwrap();

        let err = wf.submit_document(&svc, pdf("otra.pdf")).unwrap_err();
        assert_eq!(err.kind(), "service");
        assert_eq!(wf.state().phase, Phase::Ready);
        assert_eq!(wf.state().document, Some(DocumentHandle::new("tesis.pdf")));
        assert_eq!(wf.state().results.as_ref().unwrap().len(), 2);
        assert_eq!(wf.state().observations.len(), 1);
        assert_eq!(wf.state().last_query.as_ref().unwrap().answer, "Ana Pérez");
        assert_eq!(
            wf.state().error_message().as_deref(),
            Some("El servidor rechazó el PDF: Invalid file")
        );
    }

    #[test]
    fn test_results_withheld_while_reuploading() {
        let svc = FakeService::default().reply_upload(Ok(analysis("tesis.pdf")));
        let mut wf = Workflow::new();
        wf.submit_document(&svc, pdf("tesis.pdf")).unwrap();

        let pending = wf.begin_upload(pdf("otra.pdf")).unwrap();
        assert_eq!(wf.state().phase, Phase::Uploading);
        assert!(wf.state().results.is_none());
        assert!(wf.state().document.is_none());
        assert!(wf.state().observations.is_empty());
        assert!(wf.exportable().is_none());

        // A reset drops the set-aside session too
        wf.reset();
        assert_eq!(wf.finish_upload(pending.ticket, Err(refused())), Completion::Stale);
        assert_eq!(*wf.state(), WorkflowState::default());
        let retry = wf.begin_upload(pdf("otra.pdf")).unwrap();
        wf.finish_upload(retry.ticket, Err(refused()));
        assert_eq!(wf.state().phase, Phase::Idle);
        assert!(wf.state().results.is_none());
    }

    #[test]
    fn test_successful_reupload_replaces_everything() {
        let mut second = analysis("otra.pdf");
        second.results = [("Título", "Redes")].into_iter().collect();
        second.observations = ObservationList::default();
        let svc = FakeService::default()
            .reply_upload(Ok(analysis("tesis.pdf")))
            .reply_query(Ok(answer("Ana Pérez")))
            .reply_upload(Ok(second));
        let mut wf = Workflow::new();
        wf.submit_document(&svc, pdf("tesis.pdf")).unwrap();
        wf.submit_question(&svc, "¿Autor?").unwrap();

        wf.submit_document(&svc, pdf("otra.pdf")).unwrap();
        let results = wf.state().results.as_ref().unwrap();
        assert_eq!(results.get("Autor"), None);
        assert_eq!(results.get("Título"), Some("Redes"));
        assert!(wf.state().observations.is_empty());
        assert!(wf.state().last_query.is_none());
    }

    #[test]
    fn test_question_while_uploading_is_busy() {
        let svc = FakeService::default();
        let mut wf = Workflow::new();
        let _pending = wf.begin_upload(pdf("tesis.pdf")).unwrap();
        assert_eq!(wf.state().phase, Phase::Uploading);

        let err = wf.submit_question(&svc, "¿Autor?").unwrap_err();
        assert_eq!(err, WorkflowError::Busy(Operation::Upload));
        assert_eq!(svc.queries.get(), 0);
        assert_eq!(wf.state().phase, Phase::Uploading);
    }

    #[test]
    fn test_second_upload_while_uploading_is_busy() {
        let mut wf = Workflow::new();
        let first = wf.begin_upload(pdf("a.pdf")).unwrap();
        let err = wf.begin_upload(pdf("b.pdf")).unwrap_err();
        assert_eq!(err, WorkflowError::Busy(Operation::Upload));

        // The first request still completes normally.
        assert_eq!(wf.finish_upload(first.ticket, Ok(analysis("a.pdf"))), Completion::Applied);
        assert!(wf.state().error.is_none());
    }

    #[test]
    fn test_question_without_document() {
        let svc = FakeService::default();
        let mut wf = Workflow::new();
        let err = wf.submit_question(&svc, "¿Autor?").unwrap_err();
        assert_eq!(err, WorkflowError::Validation(MSG_NO_DOCUMENT.into()));
        assert_eq!(svc.queries.get(), 0);
    }

    #[test]
    fn test_blank_question_rejected_and_question_trimmed() {
        let svc = FakeService::default()
            .reply_upload(Ok(analysis("tesis.pdf")))
            .reply_query(Ok(answer("2023")));
        let mut wf = Workflow::new();
        wf.submit_document(&svc, pdf("tesis.pdf")).unwrap();

        let err = wf.submit_question(&svc, "   \n").unwrap_err();
        assert_eq!(err, WorkflowError::Validation(MSG_EMPTY_QUESTION.into()));
        assert_eq!(svc.queries.get(), 0);

        wf.submit_question(&svc, "  ¿Año?  ").unwrap();
        assert_eq!(
            svc.last_question.borrow().clone(),
            Some(("tesis.pdf".to_string(), "¿Año?".to_string()))
        );
        assert_eq!(wf.state().last_query.as_ref().unwrap().question, "¿Año?");
    }

    #[test]
    fn test_failed_query_keeps_previous_exchange_and_results() {
        let svc = FakeService::default()
            .reply_upload(Ok(analysis("tesis.pdf")))
            .reply_query(Ok(answer("Ana Pérez")))
            .reply_query(Err(ClientError::Service { status: 404, message: "PDF not found".into() }));
        let mut wf = Workflow::new();
        wf.submit_document(&svc, pdf("tesis.pdf")).unwrap();
        wf.submit_question(&svc, "¿Autor?").unwrap();
        let before = wf.state().results.clone();

        let err = wf.submit_question(&svc, "¿Año?").unwrap_err();
        assert_eq!(err, WorkflowError::Service { message: "PDF not found".into(), not_found: true });
        assert_eq!(wf.state().phase, Phase::Ready);
        assert_eq!(wf.state().results, before);
        assert_eq!(wf.state().last_query.as_ref().unwrap().answer, "Ana Pérez");
        assert!(wf.state().visible_answer().is_none());
        assert_eq!(
            wf.state().error_message().as_deref(),
            Some(crate::error::MSG_DOCUMENT_GONE)
        );
    }

    #[test]
    fn test_stale_upload_after_reset_is_discarded() {
        let mut wf = Workflow::new();
        let pending = wf.begin_upload(pdf("tesis.pdf")).unwrap();
        wf.reset();
        assert_eq!(wf.state().phase, Phase::Idle);

        let completion = wf.finish_upload(pending.ticket, Ok(analysis("tesis.pdf")));
        assert_eq!(completion, Completion::Stale);
        assert!(wf.state().results.is_none());
        assert!(wf.state().document.is_none());
        assert_eq!(wf.state().phase, Phase::Idle);
    }

    #[test]
    fn test_stale_upload_does_not_clobber_newer_one() {
        let mut wf = Workflow::new();
        let old = wf.begin_upload(pdf("vieja.pdf")).unwrap();
        wf.reset();
        let new = wf.begin_upload(pdf("nueva.pdf")).unwrap();
        assert!(new.ticket.seq() > old.ticket.seq());

        assert_eq!(wf.finish_upload(old.ticket, Ok(analysis("vieja.pdf"))), Completion::Stale);
        assert_eq!(wf.state().phase, Phase::Uploading);

        assert_eq!(wf.finish_upload(new.ticket, Ok(analysis("nueva.pdf"))), Completion::Applied);
        assert_eq!(wf.state().document, Some(DocumentHandle::new("nueva.pdf")));
    }

    #[test]
    fn test_stale_query_after_reset_is_discarded() {
        let svc = FakeService::default().reply_upload(Ok(analysis("tesis.pdf")));
        let mut wf = Workflow::new();
        wf.submit_document(&svc, pdf("tesis.pdf")).unwrap();
        let pending = wf.begin_query("¿Autor?").unwrap();
        wf.reset();

        assert_eq!(wf.finish_query(pending.ticket, Ok(answer("Ana"))), Completion::Stale);
        assert!(wf.state().last_query.is_none());
        assert_eq!(wf.state().phase, Phase::Idle);
    }

    #[test]
    fn test_ticket_for_wrong_operation_is_stale() {
        let mut wf = Workflow::new();
        let pending = wf.begin_upload(pdf("tesis.pdf")).unwrap();
        let bogus = Ticket { operation: Operation::Query, seq: pending.ticket.seq() };
        assert_eq!(wf.finish_query(bogus, Ok(answer("x"))), Completion::Stale);
        assert_eq!(wf.state().phase, Phase::Uploading);
    }

    #[test]
    fn test_reset_clears_state_and_dismiss_clears_banner() {
        let svc = FakeService::default().reply_upload(Ok(analysis("tesis.pdf")));
        let mut wf = Workflow::new();
        wf.submit_document(&svc, pdf("tesis.pdf")).unwrap();
        let _ = wf.submit_question(&svc, "");
        assert!(wf.state().error.is_some());

        wf.dismiss_error();
        assert!(wf.state().error.is_none());
        assert!(wf.state().results.is_some());

        wf.reset();
        assert_eq!(*wf.state(), WorkflowState::default());
        assert!(wf.exportable().is_none());
        assert!(wf.export_url(&svc).is_none());
    }

    #[test]
    fn test_export_accessors() {
        let svc = FakeService::default().reply_upload(Ok(analysis("tesis.pdf")));
        let mut wf = Workflow::new();
        wf.submit_document(&svc, pdf("tesis.pdf")).unwrap();

        let (results, observations) = wf.exportable().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(observations.joined(), "Falta firma del jurado");
        assert_eq!(
            wf.export_url(&svc).as_deref(),
            Some("http://svc/download_excel/tesis.pdf")
        );
    }
}
