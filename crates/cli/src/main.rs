// tesisview - thesis analysis client (terminal UI and headless)

mod analyze;
mod exit_codes;
mod logging;
mod tui;
mod util;
mod views;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tesisview_client::{AnalysisClient, ClientOptions};
use tesisview_config::Settings;
use tesisview_core::{Operation, WorkflowError};
use tesisview_io::ExportFormat;

use exit_codes::{workflow_exit_code, EXIT_EXPORT_IO, EXIT_SUCCESS, EXIT_USAGE, EXIT_ERROR};

#[derive(Parser)]
#[command(name = "tesisview")]
#[command(about = "Upload a thesis PDF to the analysis service, review the results, ask questions")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Analysis service base URL (overrides server.baseUrl)
    #[arg(long, global = true, value_name = "URL")]
    server: Option<String>,

    /// Whole-request deadline in milliseconds (overrides server.requestTimeoutMs)
    #[arg(long, global = true, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Settings file (default: <config dir>/tesisview/settings.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "tesisview_core=debug" (overrides log.level)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Append logs to this file (the interactive UI logs nowhere else)
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive terminal UI
    #[command(after_help = "\
Examples:
  tesisview ui
  tesisview ui tesis.pdf
  tesisview ui --server http://10.0.0.5:5000")]
    Ui {
        /// PDF to pre-fill in the file field
        file: Option<PathBuf>,

        /// Where Ctrl+E writes the spreadsheet (default: export.fileName)
        #[arg(long, short = 'o')]
        export: Option<PathBuf>,

        /// Spreadsheet format (default: export.format)
        #[arg(long, short = 'f')]
        format: Option<FormatArg>,
    },

    /// Upload a PDF, print the analysis, optionally ask questions and export
    #[command(after_help = "\
Examples:
  tesisview analyze tesis.pdf
  tesisview analyze tesis.pdf --ask '¿Quién es el autor?' --ask '¿En qué año?'
  tesisview analyze tesis.pdf --export resultados_tesis.xlsx
  tesisview analyze tesis.pdf --export resultados.csv --json")]
    Analyze {
        /// PDF file to analyse
        file: PathBuf,

        /// Question to ask after the upload. Repeatable; asked in order.
        #[arg(long, short = 'q', value_name = "QUESTION")]
        ask: Vec<String>,

        /// Write the results spreadsheet to this path
        #[arg(long, short = 'o', value_name = "PATH")]
        export: Option<PathBuf>,

        /// Spreadsheet format (default: from --export extension, then export.format)
        #[arg(long, short = 'f')]
        format: Option<FormatArg>,

        /// Print a JSON report instead of the table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Xlsx,
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Xlsx => ExportFormat::Xlsx,
            FormatArg::Csv => ExportFormat::Csv,
        }
    }
}

/// `--format`, else the export path's extension, else `export.format`.
fn resolve_format(flag: Option<FormatArg>, export: Option<&Path>, settings: &Settings) -> ExportFormat {
    if let Some(f) = flag {
        return f.into();
    }
    export.and_then(ExportFormat::from_path).unwrap_or(settings.export_format)
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nservice: /upload /query /download_excel",
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nservice: /upload /query /download_excel",
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let command = match cli.command {
        Some(command) => command,
        None => {
            // No subcommand = show usage
            eprintln!("Usage: tesisview <command> [options]");
            eprintln!("       tesisview --help for more information");
            return Ok(());
        }
    };

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| settings.log_level.as_str().to_string());

    let interactive = matches!(command, Commands::Ui { .. });
    let target = match (&cli.log_file, interactive) {
        (Some(path), _) => logging::LogTarget::File(path),
        (None, true) => logging::LogTarget::Off,
        (None, false) => logging::LogTarget::Stderr,
    };
    logging::init(&level, target).map_err(CliError::args)?;

    let options = ClientOptions {
        base_url: cli.server.clone().unwrap_or_else(|| settings.server_base_url.clone()),
        request_timeout: cli
            .timeout_ms
            .or(settings.request_timeout_ms)
            .map(Duration::from_millis),
    };
    let client = AnalysisClient::new(options.clone()).map_err(|e| {
        CliError::args(e.to_string()).with_hint("set --server or server.baseUrl to an http(s) URL")
    })?;
    log::debug!("service at {}", client.base_url());

    match command {
        Commands::Ui { file, export, format } => {
            let export_format = resolve_format(format, export.as_deref(), &settings);
            let export_path = export.unwrap_or_else(|| PathBuf::from(settings.export_file_name()));
            tui::run(
                client,
                tui::UiOptions {
                    initial_file: file,
                    server_label: options.base_url,
                    export_format,
                    export_path,
                },
            )
            .map_err(CliError::general)
        }
        Commands::Analyze { file, ask, export, format, json } => {
            let format = resolve_format(format, export.as_deref(), &settings);
            analyze::cmd_analyze(
                &client,
                analyze::AnalyzeArgs { file, questions: ask, export, format, json },
            )
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self { code: EXIT_EXPORT_IO, message: msg.into(), hint: None }
    }

    /// Create error from a workflow failure with proper exit code.
    pub fn workflow(err: &WorkflowError, operation: Operation) -> Self {
        let hint = match err {
            WorkflowError::Transport(detail) => Some(format!(
                "is the analysis service running? ({}); see --server / server.baseUrl",
                detail
            )),
            WorkflowError::Service { not_found: true, .. } => {
                Some("the service no longer has this document; upload it again".to_string())
            }
            _ => None,
        };
        Self { code: workflow_exit_code(err), message: err.user_message(operation), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
