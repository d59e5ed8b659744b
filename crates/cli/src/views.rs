//! View models derived from `WorkflowState`.
//!
//! Nothing here holds state of its own. The terminal UI and the headless
//! `analyze` command both render from these, so what a user sees is the same
//! either way.

use std::io::{self, Write};

use tesisview_core::{Phase, WorkflowState};
use tesisview_protocol::{QueryExchange, OBSERVATIONS_COLUMN};

use crate::util;

pub const FIELD_HEADER: &str = "Campo";
pub const VALUE_HEADER: &str = "Valor";
pub const NO_OBSERVATIONS: &str = "No se encontraron observaciones.";

/// One row of the results table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub field: String,
    pub value: String,
}

/// The results table plus the server-side download address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub document: String,
    pub rows: Vec<ResultRow>,
    pub export_url: Option<String>,
}

impl ResultsView {
    /// `None` until an upload has succeeded.
    pub fn from_state(state: &WorkflowState, export_url: Option<String>) -> Option<Self> {
        let results = state.results.as_ref()?;

        let mut rows: Vec<ResultRow> = results
            .iter()
            .map(|(field, value)| ResultRow { field: field.to_string(), value: value.to_string() })
            .collect();

        let observations = if state.observations.is_empty() {
            NO_OBSERVATIONS.to_string()
        } else {
            state
                .observations
                .iter()
                .map(|o| format!("- {}", o))
                .collect::<Vec<_>>()
                .join("\n")
        };
        rows.push(ResultRow { field: OBSERVATIONS_COLUMN.to_string(), value: observations });

        Some(Self {
            document: state.document.as_ref().map(|d| d.to_string()).unwrap_or_default(),
            rows,
            export_url,
        })
    }

    /// Width of the field column: the widest field name or header.
    pub fn field_width(&self) -> usize {
        self.rows
            .iter()
            .map(|r| util::display_width(&r.field))
            .chain(std::iter::once(util::display_width(FIELD_HEADER)))
            .max()
            .unwrap_or(0)
    }
}

/// Question box state plus the answer to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryView<'a> {
    pub enabled: bool,
    pub activity: Option<&'static str>,
    pub answer: Option<&'a QueryExchange>,
}

impl<'a> QueryView<'a> {
    /// `None` until there is a document to ask about.
    pub fn from_state(state: &'a WorkflowState) -> Option<Self> {
        state.document.as_ref()?;
        Some(Self {
            enabled: state.can_submit_question(),
            activity: match state.phase {
                Phase::Querying => state.phase.activity_label(),
                _ => None,
            },
            answer: state.visible_answer(),
        })
    }
}

/// Whether the upload control accepts input, and what to show while busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadControl {
    pub enabled: bool,
    pub activity: Option<&'static str>,
}

impl UploadControl {
    pub fn from_state(state: &WorkflowState) -> Self {
        Self {
            enabled: state.can_submit_document(),
            activity: match state.phase {
                Phase::Uploading => state.phase.activity_label(),
                _ => None,
            },
        }
    }
}

/// Print the results as a two-column plain text table.
pub fn write_results_table(w: &mut impl Write, view: &ResultsView, max_width: usize) -> io::Result<()> {
    let field_width = view.field_width();
    let value_width = max_width.saturating_sub(field_width + 3).max(20);

    writeln!(w, "{} | {}", util::pad_right(FIELD_HEADER, field_width), VALUE_HEADER)?;
    writeln!(w, "{}-+-{}", "-".repeat(field_width), "-".repeat(value_width))?;

    for row in &view.rows {
        let lines = util::wrap_display(&row.value, value_width);
        for (i, line) in lines.iter().enumerate() {
            let field = if i == 0 { row.field.as_str() } else { "" };
            writeln!(w, "{} | {}", util::pad_right(field, field_width), line)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tesisview_core::{Failure, Operation, WorkflowError};
    use tesisview_protocol::{AnalysisResult, DocumentHandle, ObservationList};

    fn ready_state(observations: Vec<String>) -> WorkflowState {
        WorkflowState {
            phase: Phase::Ready,
            document: Some(DocumentHandle::new("tesis.pdf")),
            results: Some([("Autor", "Ana Pérez"), ("Año", "2023")].into_iter().collect::<AnalysisResult>()),
            observations: ObservationList::new(observations),
            ..WorkflowState::default()
        }
    }

    #[test]
    fn test_nothing_rendered_before_results() {
        let state = WorkflowState::default();
        assert!(ResultsView::from_state(&state, None).is_none());
        assert!(QueryView::from_state(&state).is_none());
        assert!(UploadControl::from_state(&state).enabled);
    }

    #[test]
    fn test_results_rows_in_service_order_with_observations_last() {
        let state = ready_state(vec!["Falta firma del jurado".into(), "Sin índice".into()]);
        let view = ResultsView::from_state(&state, Some("http://x/download_excel/tesis.pdf".into())).unwrap();

        let fields: Vec<&str> = view.rows.iter().map(|r| r.field.as_str()).collect();
        assert_eq!(fields, vec!["Autor", "Año", "Observaciones"]);
        assert_eq!(view.rows[2].value, "- Falta firma del jurado\n- Sin índice");
        assert_eq!(view.document, "tesis.pdf");
        assert_eq!(view.field_width(), "Observaciones".len());
    }

    #[test]
    fn test_empty_observations_message() {
        let view = ResultsView::from_state(&ready_state(vec![]), None).unwrap();
        assert_eq!(view.rows.last().unwrap().value, NO_OBSERVATIONS);
    }

    #[test]
    fn test_controls_disabled_while_busy() {
        let mut state = ready_state(vec![]);
        state.phase = Phase::Uploading;
        let upload = UploadControl::from_state(&state);
        assert!(!upload.enabled);
        assert_eq!(upload.activity, Some("Subiendo..."));
        assert!(!QueryView::from_state(&state).unwrap().enabled);

        state.phase = Phase::Querying;
        let query = QueryView::from_state(&state).unwrap();
        assert!(!query.enabled);
        assert_eq!(query.activity, Some("Consultando..."));
        assert_eq!(UploadControl::from_state(&state).activity, None);
    }

    #[test]
    fn test_answer_hidden_under_query_error() {
        let mut state = ready_state(vec![]);
        state.last_query = Some(QueryExchange { question: "¿Autor?".into(), answer: "Ana".into() });
        assert!(QueryView::from_state(&state).unwrap().answer.is_some());

        state.error = Some(Failure {
            operation: Operation::Query,
            error: WorkflowError::Transport("refused".into()),
        });
        assert!(QueryView::from_state(&state).unwrap().answer.is_none());
    }

    #[test]
    fn test_plain_table() {
        let view = ResultsView::from_state(&ready_state(vec!["Falta firma".into()]), None).unwrap();
        let mut out = Vec::new();
        write_results_table(&mut out, &view, 40).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Campo         | Valor");
        assert!(lines[1].starts_with("--------------+-"));
        assert_eq!(lines[2], "Autor         | Ana Pérez");
        assert_eq!(lines[3], "Año           | 2023");
        assert_eq!(lines[4], "Observaciones | - Falta firma");
    }
}
