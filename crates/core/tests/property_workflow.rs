// Property-based tests for the session state machine.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;
use tesisview_client::ClientError;
use tesisview_core::*;
use tesisview_protocol::{
    AnalysisResult, DocumentHandle, ObservationList, QueryResponse, UploadResponse, UploadedDocument,
};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Step {
    Upload { fields: Vec<(String, String)>, observations: Vec<String>, ok: bool },
    Query { question: String, answer: String, ok: bool },
    /// Issue a request, reset, then deliver the response late.
    LateAfterReset { upload: bool },
    Reset,
}

fn arb_fields() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec((r"[A-Za-zñ]{1,8}", r"[a-zA-Z0-9 ;\n]{0,12}"), 0..5)
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (arb_fields(), proptest::collection::vec(r"[a-z ]{1,10}", 0..3), any::<bool>())
            .prop_map(|(fields, observations, ok)| Step::Upload { fields, observations, ok }),
        4 => (r"[ ]{0,2}[a-z?¿ ]{0,10}", r"[a-z ]{0,10}", any::<bool>())
            .prop_map(|(question, answer, ok)| Step::Query { question, answer, ok }),
        1 => any::<bool>().prop_map(|upload| Step::LateAfterReset { upload }),
        1 => Just(Step::Reset),
    ]
}

fn upload_response(fields: &[(String, String)], observations: &[String]) -> UploadResponse {
    UploadResponse {
        results: fields.iter().cloned().collect::<AnalysisResult>(),
        observations: ObservationList::new(observations.to_vec()),
        pdf_name: DocumentHandle::new("tesis.pdf"),
    }
}

fn doc() -> Option<UploadedDocument> {
    Some(UploadedDocument::new("tesis.pdf", b"%PDF".to_vec()))
}

fn refused() -> ClientError {
    ClientError::Transport("connection failed".into())
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    /// Query completions only ever touch `last_query`, `error` and `phase`.
    #[test]
    fn queries_never_mutate_results(steps in proptest::collection::vec(arb_step(), 1..25)) {
        let mut wf = Workflow::new();
        for step in steps {
            match step {
                Step::Upload { fields, observations, ok } => {
                    if let Ok(p) = wf.begin_upload(doc()) {
                        prop_assert!(wf.state().results.is_none());
                        let outcome = if ok { Ok(upload_response(&fields, &observations)) } else { Err(refused()) };
                        wf.finish_upload(p.ticket, outcome);
                    }
                }
                Step::Query { question, answer, ok } => {
                    let results = wf.state().results.clone();
                    let observations = wf.state().observations.clone();
                    let document = wf.state().document.clone();
                    if let Ok(p) = wf.begin_query(&question) {
                        prop_assert_eq!(&p.question, question.trim());
                        let outcome = if ok { Ok(QueryResponse { respuesta: answer }) } else { Err(refused()) };
                        wf.finish_query(p.ticket, outcome);
                    }
                    prop_assert_eq!(&wf.state().results, &results);
                    prop_assert_eq!(&wf.state().observations, &observations);
                    prop_assert_eq!(&wf.state().document, &document);
                }
                Step::LateAfterReset { upload } => {
                    let ticket = if upload {
                        wf.begin_upload(doc()).ok().map(|p| p.ticket)
                    } else {
                        wf.begin_query("¿autor?").ok().map(|p| p.ticket)
                    };
                    wf.reset();
                    if let Some(t) = ticket {
                        let completion = match t.operation() {
                            Operation::Upload => wf.finish_upload(t, Ok(upload_response(&[("Autor".into(), "x".into())], &[]))),
                            Operation::Query => wf.finish_query(t, Ok(QueryResponse { respuesta: "x".into() })),
                        };
                        prop_assert_eq!(completion, Completion::Stale);
                    }
                    prop_assert_eq!(wf.state(), &WorkflowState::default());
                }
                Step::Reset => wf.reset(),
            }
            // Never left mid-flight after a synchronous step.
            prop_assert!(!wf.state().phase.is_busy());
            // Results are held exactly when a document is ready.
            prop_assert_eq!(
                wf.state().results.is_some(),
                matches!(wf.state().phase, Phase::Ready | Phase::Querying)
            );
            prop_assert_eq!(wf.state().results.is_some(), wf.state().document.is_some());
        }
    }

    /// Ticket sequence numbers strictly increase, across resets too.
    #[test]
    fn tickets_are_monotonic(resets in proptest::collection::vec(any::<bool>(), 1..20)) {
        let mut wf = Workflow::new();
        let mut last = 0u64;
        for reset in resets {
            let p = wf.begin_upload(doc()).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert!(p.ticket.seq() > last);
            last = p.ticket.seq();
            if reset {
                wf.reset();
            } else {
                wf.finish_upload(p.ticket, Err(refused()));
            }
        }
    }
}
