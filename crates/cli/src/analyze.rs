// tesisview analyze: upload, print, ask, export, without the terminal UI.

use std::io::{self, Write};
use std::path::PathBuf;

use serde_json::json;
use tesisview_client::AnalysisService;
use tesisview_core::{Operation, Workflow, WorkflowError};
use tesisview_io::ExportFormat;
use tesisview_protocol::{QueryExchange, UploadedDocument};

use crate::exit_codes::{workflow_exit_code, WorkflowErrorOutput};
use crate::views::{self, ResultsView};
use crate::CliError;

const TABLE_WIDTH: usize = 100;

pub struct AnalyzeArgs {
    pub file: PathBuf,
    pub questions: Vec<String>,
    pub export: Option<PathBuf>,
    pub format: ExportFormat,
    pub json: bool,
}

pub fn cmd_analyze<S: AnalysisService + ?Sized>(service: &S, args: AnalyzeArgs) -> Result<(), CliError> {
    let document = UploadedDocument::from_path(&args.file).map_err(|e| {
        CliError::args(format!("cannot read {}: {}", args.file.display(), e))
    })?;

    let mut workflow = Workflow::new();
    workflow
        .submit_document(service, Some(document))
        .map_err(|e| workflow_failure(&e, Operation::Upload, args.json))?;

    let view = ResultsView::from_state(workflow.state(), workflow.export_url(service))
        .ok_or_else(|| CliError::general("upload produced no results"))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if !args.json {
        writeln!(out, "Documento: {}\n", view.document).map_err(|e| CliError::general(e.to_string()))?;
        views::write_results_table(&mut out, &view, TABLE_WIDTH).map_err(|e| CliError::general(e.to_string()))?;
        if let Some(url) = &view.export_url {
            writeln!(out, "\nDescarga del servidor: {}", url).map_err(|e| CliError::general(e.to_string()))?;
        }
    }

    let mut answers: Vec<QueryExchange> = Vec::new();
    for question in &args.questions {
        workflow
            .submit_question(service, question)
            .map_err(|e| workflow_failure(&e, Operation::Query, args.json))?;

        if let Some(exchange) = workflow.state().last_query.clone() {
            if !args.json {
                writeln!(out, "\n? {}\n{}", exchange.question, exchange.answer)
                    .map_err(|e| CliError::general(e.to_string()))?;
            }
            answers.push(exchange);
        }
    }

    if let Some(path) = &args.export {
        if let Some((results, observations)) = workflow.exportable() {
            tesisview_io::write_export(results, observations, args.format, path)
                .map_err(CliError::export)?;
            log::info!("exported {} to {}", args.format.extension(), path.display());
            if !args.json {
                eprintln!("Exportado a {}", path.display());
            }
        }
    }

    if args.json {
        let state = workflow.state();
        let report = json!({
            "document": view.document,
            "results": state.results,
            "observations": state.observations,
            "answers": answers,
            "export_url": view.export_url,
            "export": args.export.as_ref().map(|p| p.display().to_string()),
        });
        let text = serde_json::to_string_pretty(&report).map_err(|e| CliError::general(e.to_string()))?;
        writeln!(out, "{}", text).map_err(|e| CliError::general(e.to_string()))?;
    }

    Ok(())
}

fn workflow_failure(err: &WorkflowError, operation: Operation, json: bool) -> CliError {
    if json {
        WorkflowErrorOutput::from_workflow_error(err, operation).print(true);
        return CliError { code: workflow_exit_code(err), message: String::new(), hint: None };
    }
    CliError::workflow(err, operation)
}
