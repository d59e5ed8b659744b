pub mod worker;

use std::cell::Cell;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tesisview_client::AnalysisService;
use tesisview_core::{Completion, Workflow};
use tesisview_io::ExportFormat;
use tesisview_protocol::UploadedDocument;

use crate::util;
use crate::views::{QueryView, ResultsView, UploadControl, FIELD_HEADER, VALUE_HEADER};
use worker::{Job, Outcome, Worker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    File,
    Question,
}

/// Options for an interactive session.
pub struct UiOptions {
    pub initial_file: Option<PathBuf>,
    pub server_label: String,
    pub export_format: ExportFormat,
    pub export_path: PathBuf,
}

struct TuiApp<S> {
    workflow: Workflow,
    service: S,
    worker: Worker,
    /// Path typed by the user; not part of the session state until submitted
    file_input: String,
    /// Question typed by the user; cleared when the answer to it arrives
    question_input: String,
    focus: Focus,
    results_scroll: u16,
    /// Furthest the results table can scroll, as of the last draw
    results_max_scroll: Cell<u16>,
    /// One-line local message (export done, file unreadable)
    notice: Option<String>,
    server_label: String,
    export_format: ExportFormat,
    export_path: PathBuf,
    should_quit: bool,
    show_help: bool,
}

impl<S> TuiApp<S>
where
    S: AnalysisService + Clone + Send + 'static,
{
    fn new(service: S, options: UiOptions) -> Result<Self, String> {
        let worker = Worker::spawn(service.clone())?;
        Ok(Self {
            workflow: Workflow::new(),
            service,
            worker,
            file_input: options
                .initial_file
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            question_input: String::new(),
            focus: Focus::File,
            results_scroll: 0,
            results_max_scroll: Cell::new(0),
            notice: None,
            server_label: options.server_label,
            export_format: options.export_format,
            export_path: options.export_path,
            should_quit: false,
            show_help: false,
        })
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.show_help {
            // Any key dismisses help
            self.show_help = false;
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => self.should_quit = true,
            KeyCode::Char('n') if ctrl => self.new_session(),
            KeyCode::Char('e') if ctrl => self.export(),
            KeyCode::F(1) => self.show_help = true,
            KeyCode::Esc => {
                self.workflow.dismiss_error();
                self.notice = None;
            }
            KeyCode::Tab | KeyCode::BackTab => self.toggle_focus(),
            KeyCode::Enter => match self.focus {
                Focus::File => self.submit_document(),
                Focus::Question => self.submit_question(),
            },
            KeyCode::Backspace => {
                self.focused_input().pop();
            }
            KeyCode::Up => self.scroll_results(-1),
            KeyCode::Down => self.scroll_results(1),
            KeyCode::PageUp => self.scroll_results(-10),
            KeyCode::PageDown => self.scroll_results(10),
            KeyCode::Char(c) if !ctrl => self.focused_input().push(c),
            _ => {}
        }
    }

    fn scroll_results(&mut self, delta: i32) {
        let max = i32::from(self.results_max_scroll.get());
        let next = (i32::from(self.results_scroll) + delta).clamp(0, max);
        self.results_scroll = u16::try_from(next).unwrap_or(0);
    }

    fn focused_input(&mut self) -> &mut String {
        match self.focus {
            Focus::File => &mut self.file_input,
            Focus::Question => &mut self.question_input,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::File if self.workflow.state().document.is_some() => Focus::Question,
            _ => Focus::File,
        };
    }

    fn submit_document(&mut self) {
        self.notice = None;
        let path = self.file_input.trim().to_string();
        let document = if path.is_empty() {
            None
        } else {
            match UploadedDocument::from_path(Path::new(&path)) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    self.notice = Some(format!("No se pudo leer {}: {}", path, e));
                    return;
                }
            }
        };

        if let Ok(pending) = self.workflow.begin_upload(document) {
            self.dispatch(Job::Upload(pending));
        }
    }

    fn submit_question(&mut self) {
        self.notice = None;
        let text = self.question_input.clone();
        if let Ok(pending) = self.workflow.begin_query(&text) {
            self.dispatch(Job::Query(pending));
        }
    }

    fn dispatch(&mut self, job: Job) {
        if let Err(e) = self.worker.submit(job) {
            log::error!("{}", e);
            self.notice = Some(e);
        }
    }

    /// Apply every outcome the worker has finished.
    fn drain_outcomes(&mut self) {
        while let Some(outcome) = self.worker.try_recv() {
            self.apply(outcome);
        }
    }

    fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Upload(ticket, result) => {
                if self.workflow.finish_upload(ticket, result) == Completion::Applied {
                    self.results_scroll = 0;
                    self.focus = Focus::Question;
                }
            }
            Outcome::Query(ticket, result) => {
                if self.workflow.finish_query(ticket, result) == Completion::Applied {
                    // Keep anything typed while the answer was on its way
                    let asked = self.workflow.state().last_query.as_ref().map(|q| q.question.as_str());
                    if asked == Some(self.question_input.trim()) {
                        self.question_input.clear();
                    }
                }
            }
        }
    }

    /// SALIR: drop the session and start over.
    fn new_session(&mut self) {
        self.workflow.reset();
        self.file_input.clear();
        self.question_input.clear();
        self.focus = Focus::File;
        self.results_scroll = 0;
        self.notice = None;
    }

    fn export(&mut self) {
        let outcome = match self.workflow.exportable() {
            Some((results, observations)) => tesisview_io::write_export(
                results,
                observations,
                self.export_format,
                &self.export_path,
            ),
            None => {
                self.notice = Some(tesisview_core::error::MSG_NO_DOCUMENT.to_string());
                return;
            }
        };
        self.notice = Some(match outcome {
            Ok(()) => format!("Exportado a {}", self.export_path.display()),
            Err(e) => {
                log::warn!("export failed: {}", e);
                format!("Error al exportar: {}", e)
            }
        });
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let state = self.workflow.state();
        let banner = state.error_message();
        let banner_height = if banner.is_some() { 3 } else { 0 };

        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(banner_height),
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(area);

        self.draw_title(frame, chunks[0]);
        if let Some(message) = banner {
            self.draw_banner(frame, chunks[1], &message);
        }
        self.draw_file_input(frame, chunks[2]);
        self.draw_results(frame, chunks[3]);
        self.draw_question_input(frame, chunks[4]);
        self.draw_answer(frame, chunks[5]);
        self.draw_status(frame, chunks[6]);

        if self.show_help {
            self.draw_help(frame, area);
        }
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let state = self.workflow.state();
        let doc = state
            .document
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "(sin documento)".to_string());
        let title = format!(
            " tesisview: {} | {} | {} ",
            util::truncate_display(&doc, 40),
            self.server_label,
            state.phase.label()
        );
        let para = Paragraph::new(Line::from(vec![Span::styled(
            title,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]))
        .style(Style::default().bg(Color::Cyan));
        frame.render_widget(para, area);
    }

    fn draw_banner(&self, frame: &mut Frame, area: Rect, message: &str) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Error (Esc para cerrar) ");
        let para = Paragraph::new(message.to_string())
            .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(para, area);
    }

    fn input_block(&self, title: String, focused: bool, enabled: bool) -> Block<'static> {
        let color = if !enabled {
            Color::DarkGray
        } else if focused {
            Color::Yellow
        } else {
            Color::Gray
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(title)
    }

    fn draw_file_input(&self, frame: &mut Frame, area: Rect) {
        let control = UploadControl::from_state(self.workflow.state());
        let title = match control.activity {
            Some(activity) => format!(" Archivo PDF: {} ", activity),
            None => " Archivo PDF (Enter para subir) ".to_string(),
        };
        let focused = self.focus == Focus::File;
        let text = input_line(&self.file_input, focused && control.enabled);
        let para = Paragraph::new(text).block(self.input_block(title, focused, control.enabled));
        frame.render_widget(para, area);
    }

    fn draw_results(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Resultados del análisis ");

        let export_url = self.workflow.export_url(&self.service);
        let view = match ResultsView::from_state(self.workflow.state(), export_url) {
            Some(view) => view,
            None => {
                let para = Paragraph::new("Sube un PDF para ver los resultados.")
                    .style(Style::default().fg(Color::DarkGray))
                    .block(block);
                frame.render_widget(para, area);
                self.results_max_scroll.set(0);
                return;
            }
        };

        let field_width = view.field_width();
        let value_width = (area.width as usize).saturating_sub(field_width + 5).max(10);
        let header_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

        let mut lines = vec![Line::from(vec![
            Span::styled(util::pad_right(FIELD_HEADER, field_width), header_style),
            Span::raw(" │ "),
            Span::styled(VALUE_HEADER, header_style),
        ])];

        for row in &view.rows {
            for (i, chunk) in util::wrap_display(&row.value, value_width).into_iter().enumerate() {
                let field = if i == 0 { row.field.as_str() } else { "" };
                lines.push(Line::from(vec![
                    Span::styled(
                        util::pad_right(field, field_width),
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(" │ "),
                    Span::styled(chunk, Style::default().fg(Color::Gray)),
                ]));
            }
        }

        if let Some(url) = &view.export_url {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("Descarga del servidor: ", Style::default().fg(Color::DarkGray)),
                Span::styled(url.clone(), Style::default().fg(Color::Blue)),
            ]));
        }

        let visible = usize::from(area.height.saturating_sub(2));
        let max_scroll = u16::try_from(lines.len().saturating_sub(visible)).unwrap_or(u16::MAX);
        self.results_max_scroll.set(max_scroll);

        let scroll = self.results_scroll.min(max_scroll);
        let para = Paragraph::new(lines).block(block).scroll((scroll, 0));
        frame.render_widget(para, area);
    }

    fn draw_question_input(&self, frame: &mut Frame, area: Rect) {
        let state = self.workflow.state();
        let query = QueryView::from_state(state);
        let enabled = query.as_ref().map(|q| q.enabled).unwrap_or(false);
        let title = match query.as_ref().and_then(|q| q.activity) {
            Some(activity) => format!(" Pregunta: {} ", activity),
            None => " Pregunta sobre el documento (Enter para enviar) ".to_string(),
        };
        let focused = self.focus == Focus::Question;
        let text = input_line(&self.question_input, focused && enabled);
        let para = Paragraph::new(text).block(self.input_block(title, focused, enabled));
        frame.render_widget(para, area);
    }

    fn draw_answer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Respuesta ");

        let lines = match QueryView::from_state(self.workflow.state()).and_then(|q| q.answer) {
            Some(exchange) => vec![
                Line::from(Span::styled(
                    exchange.question.clone(),
                    Style::default().fg(Color::Yellow),
                )),
                Line::from(exchange.answer.clone()),
            ],
            None => Vec::new(),
        };
        let para = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
        frame.render_widget(para, area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let left = match &self.notice {
            Some(notice) => format!(" {}", notice),
            None => match self.workflow.state().phase.activity_label() {
                Some(activity) => format!(" {}", activity),
                None => String::new(),
            },
        };
        let right = "Tab: campo  Ctrl+E: exportar  Ctrl+N: salir  F1: ayuda ";

        let padding = (area.width as usize)
            .saturating_sub(util::display_width(&left) + util::display_width(right));
        let status = format!("{}{:pad$}{}", left, "", right, pad = padding);

        let para = Paragraph::new(Line::from(vec![Span::styled(
            status,
            Style::default().fg(Color::Black).bg(Color::DarkGray),
        )]))
        .style(Style::default().bg(Color::DarkGray));
        frame.render_widget(para, area);
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let help_lines = [
            "",
            "  Sesión",
            "  ------",
            "  Enter             Subir PDF / enviar pregunta",
            "  Tab               Cambiar de campo",
            "  Ctrl+E            Exportar resultados",
            "  Ctrl+N            Salir (nueva sesión)",
            "  Esc               Cerrar el aviso de error",
            "",
            "  Resultados",
            "  ----------",
            "  Up / Down         Desplazar",
            "  PgUp / PgDn       Desplazar una página",
            "",
            "  General",
            "  -------",
            "  Ctrl+C / Ctrl+Q   Cerrar",
            "  F1                Esta ayuda",
            "",
        ];
        let help_width: u16 = 52;
        let help_height: u16 = help_lines.len() as u16 + 2;

        let x = area.width.saturating_sub(help_width) / 2;
        let y = area.height.saturating_sub(help_height) / 2;
        let popup = Rect::new(
            area.x + x,
            area.y + y,
            help_width.min(area.width),
            help_height.min(area.height),
        );

        let lines: Vec<Line> = help_lines
            .iter()
            .map(|s| Line::from(Span::styled(*s, Style::default().fg(Color::White))))
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Teclas ")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(Color::Black));

        frame.render_widget(Clear, popup);
        let para = Paragraph::new(lines).block(block);
        frame.render_widget(para, popup);
    }
}

fn input_line(value: &str, show_cursor: bool) -> Line<'static> {
    let mut spans = vec![Span::raw(value.to_string())];
    if show_cursor {
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    }
    Line::from(spans)
}

/// Run the interactive terminal UI until the user quits.
pub fn run<S>(service: S, options: UiOptions) -> Result<(), String>
where
    S: AnalysisService + Clone + Send + 'static,
{
    let app = TuiApp::new(service, options)?;
    run_app(app)
}

fn run_app<S>(mut app: TuiApp<S>) -> Result<(), String>
where
    S: AnalysisService + Clone + Send + 'static,
{
    terminal::enable_raw_mode()
        .map_err(|e| format!("failed to enable raw mode: {}", e))?;
    stdout()
        .execute(EnterAlternateScreen)
        .map_err(|e| format!("failed to enter alternate screen: {}", e))?;

    struct Cleanup;
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = stdout().execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
    let _cleanup = Cleanup;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| format!("failed to create terminal: {}", e))?;

    loop {
        app.drain_outcomes();

        terminal
            .draw(|frame| app.draw(frame))
            .map_err(|e| format!("draw error: {}", e))?;

        if event::poll(Duration::from_millis(100))
            .map_err(|e| format!("event poll error: {}", e))?
        {
            if let Event::Key(key) =
                event::read().map_err(|e| format!("event read error: {}", e))?
            {
                if key.kind != KeyEventKind::Release {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
