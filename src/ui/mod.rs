//! Full-screen terminal UI. Renders the task list and forwards every user
//! intent to the store; after each successful mutation the active query is
//! re-issued and the whole list re-rendered.

mod form;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Terminal,
};
use sqlx::SqlitePool;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{Task, UpdateTask};
use form::{FormField, TaskForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    List,
    Search,
    Form,
    ConfirmDelete,
}

struct App {
    db: SqlitePool,
    tasks: Vec<Task>,
    table_state: TableState,
    detail: Option<Task>,
    search: String,
    mode: Mode,
    form: Option<TaskForm>,
    status_line: String,
}

/// ratatui-based task tracker UI.
pub struct TaskUi {
    db: SqlitePool,
}

impl TaskUi {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Start the interactive TUI loop.
    pub async fn run(self) -> Result<()> {
        enable_raw_mode().context("enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("create terminal")?;

        let result = self.event_loop(&mut terminal).await;

        // Restore terminal regardless of result.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(
        &self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let mut app = App::new(self.db.clone());
        app.refresh().await?;

        loop {
            terminal.draw(|f| draw_ui(f, &mut app))?;

            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if !app.handle_key(key).await? {
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

impl App {
    fn new(db: SqlitePool) -> Self {
        Self {
            db,
            tasks: Vec::new(),
            table_state: TableState::default(),
            detail: None,
            search: String::new(),
            mode: Mode::List,
            form: None,
            status_line: String::new(),
        }
    }

    fn selected_task(&self) -> Option<&Task> {
        self.table_state.selected().and_then(|i| self.tasks.get(i))
    }

    /// Re-issues the active query (search or full list) and re-renders the
    /// selection and detail panel from the fresh rows.
    async fn refresh(&mut self) -> Result<(), AppError> {
        self.tasks = repository::search_tasks(&self.db, &self.search).await?;

        if self.tasks.is_empty() {
            self.table_state.select(None);
            self.detail = None;
        } else {
            let idx = self
                .table_state
                .selected()
                .unwrap_or(0)
                .min(self.tasks.len() - 1);
            self.table_state.select(Some(idx));
            self.load_detail().await?;
        }

        Ok(())
    }

    /// Row selection goes back to the store for the full record.
    async fn load_detail(&mut self) -> Result<(), AppError> {
        self.detail = match self.selected_task() {
            Some(task) => repository::find_task_by_id(&self.db, task.id).await?,
            None => None,
        };
        Ok(())
    }

    async fn select_delta(&mut self, delta: i64) -> Result<(), AppError> {
        if self.tasks.is_empty() {
            return Ok(());
        }
        let len = self.tasks.len() as i64;
        let current = self.table_state.selected().unwrap_or(0) as i64;
        let next = (current + delta).clamp(0, len - 1) as usize;
        self.table_state.select(Some(next));
        self.load_detail().await
    }

    /// Returns false when the UI should exit.
    async fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(false);
        }

        match self.mode {
            Mode::List => self.handle_list_key(key).await,
            Mode::Search => self.handle_search_key(key).await,
            Mode::Form => self.handle_form_key(key).await,
            Mode::ConfirmDelete => self.handle_confirm_key(key).await,
        }
    }

    async fn handle_list_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
            KeyCode::Up | KeyCode::Char('k') => self.select_delta(-1).await?,
            KeyCode::Down | KeyCode::Char('j') => self.select_delta(1).await?,
            KeyCode::Char('/') => {
                self.mode = Mode::Search;
            }
            KeyCode::Char('r') => {
                self.refresh().await?;
                self.status_line.clear();
            }
            KeyCode::Char('a') => {
                self.form = Some(TaskForm::add());
                self.mode = Mode::Form;
            }
            KeyCode::Char('e') => {
                let task = self
                    .detail
                    .clone()
                    .or_else(|| self.selected_task().cloned());
                if let Some(task) = task {
                    self.form = Some(TaskForm::edit(&task));
                    self.mode = Mode::Form;
                } else {
                    self.status_line = "select a task to edit".to_string();
                }
            }
            KeyCode::Char('d') => {
                if self.selected_task().is_some() {
                    self.mode = Mode::ConfirmDelete;
                } else {
                    self.status_line = "select a task to delete".to_string();
                }
            }
            KeyCode::Char(' ') => self.cycle_status().await?,
            _ => {}
        }
        Ok(true)
    }

    async fn handle_search_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.mode = Mode::List;
            }
            KeyCode::Backspace => {
                self.search.pop();
                self.refresh().await?;
            }
            KeyCode::Char(c) => {
                self.search.push(c);
                self.refresh().await?;
            }
            _ => {}
        }
        Ok(true)
    }

    async fn handle_form_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Esc => {
                self.form = None;
                self.mode = Mode::List;
                return Ok(true);
            }
            KeyCode::Enter => {
                self.submit_form().await?;
                return Ok(true);
            }
            _ => {}
        }

        let Some(form) = self.form.as_mut() else {
            self.mode = Mode::List;
            return Ok(true);
        };

        match key.code {
            KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
            KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.prev(),
            KeyCode::Left | KeyCode::Right if form.focus == FormField::Priority => {
                form.cycle_priority();
            }
            KeyCode::Backspace => form.pop_char(),
            KeyCode::Char(c) => form.push_char(c),
            _ => {}
        }
        Ok(true)
    }

    async fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Some(id) = self.selected_task().map(|t| t.id) {
                    repository::delete_task(&self.db, id).await?;
                    self.detail = None;
                    self.status_line = "task deleted".to_string();
                    self.refresh().await?;
                }
                self.mode = Mode::List;
            }
            _ => {
                self.mode = Mode::List;
            }
        }
        Ok(true)
    }

    /// The dedicated status control: cycles the selected task's status via a
    /// full update that preserves every other field.
    async fn cycle_status(&mut self) -> Result<()> {
        let Some(task) = self.selected_task().cloned() else {
            return Ok(());
        };

        let req = UpdateTask {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            status: task.status.cycled(),
            due_at: task
                .due_at
                .map(|d| d.format(repository::DUE_DATE_FORMAT).to_string()),
        };

        match repository::update_task(&self.db, task.id, req).await {
            Ok(updated) => {
                self.status_line = format!("status: {}", updated.status);
                self.refresh().await?;
            }
            Err(e) if e.is_recoverable() => self.status_line = e.to_string(),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    async fn submit_form(&mut self) -> Result<()> {
        let Some(form) = self.form.as_mut() else {
            return Ok(());
        };

        // Validate in the dialog first so the error shows in place; the
        // store re-checks either way.
        if let Err(msg) = form.validate() {
            form.error = Some(msg);
            return Ok(());
        }

        let result = match form.task_id {
            None => repository::add_task(&self.db, form.to_new_task()).await,
            Some(id) => repository::update_task(&self.db, id, form.to_update_task()).await,
        };

        match result {
            Ok(_) => {
                self.status_line = if form.is_edit() {
                    "task updated".to_string()
                } else {
                    "task added".to_string()
                };
                self.form = None;
                self.mode = Mode::List;
                self.refresh().await?;
            }
            Err(e) if e.is_recoverable() => form.error = Some(e.to_string()),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}

// ─── UI rendering ─────────────────────────────────────────────────────────────

fn draw_ui(f: &mut ratatui::Frame, app: &mut App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(3), // search box
            Constraint::Min(5),    // task table
            Constraint::Length(9), // detail panel
            Constraint::Length(1), // help line
        ])
        .split(area);

    render_header(f, chunks[0], app);
    render_search(f, chunks[1], app);
    render_table(f, chunks[2], app);
    render_detail(f, chunks[3], app);
    render_help(f, chunks[4], app.mode);

    if app.mode == Mode::Form {
        if let Some(form) = app.form.as_ref() {
            render_form(f, area, form);
        }
    }
    if app.mode == Mode::ConfirmDelete {
        render_confirm(f, area);
    }
}

fn render_header(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let header = Paragraph::new(format!(
        " Task Tracker  |  {} task(s)  {}",
        app.tasks.len(),
        app.status_line
    ))
    .style(Style::default().bg(Color::Rgb(28, 28, 40)).fg(Color::White));
    f.render_widget(header, area);
}

fn render_search(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let (text, style) = if app.search.is_empty() && app.mode != Mode::Search {
        (
            "press / to search".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (app.search.clone(), Style::default().fg(Color::White))
    };

    let border_style = if app.mode == Mode::Search {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let search = Paragraph::new(text).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title("Search"),
    );
    f.render_widget(search, area);
}

fn render_table(f: &mut ratatui::Frame, area: Rect, app: &mut App) {
    let header = Row::new(["ID", "Title", "Priority", "Status", "Created", "Due"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .tasks
        .iter()
        .map(|t| {
            let priority_style = match t.priority {
                crate::models::Priority::High => Style::default().fg(Color::Red),
                crate::models::Priority::Medium => Style::default().fg(Color::Yellow),
                crate::models::Priority::Low => Style::default().fg(Color::Green),
            };
            Row::new([
                Cell::from(t.id.to_string()),
                Cell::from(t.title.clone()),
                Cell::from(t.priority.to_string()).style(priority_style),
                Cell::from(t.status.to_string()),
                Cell::from(t.created_at.format("%Y-%m-%d %H:%M").to_string()),
                Cell::from(
                    t.due_at
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                ),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Min(20),
        Constraint::Length(9),
        Constraint::Length(12),
        Constraint::Length(17),
        Constraint::Length(11),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Tasks"))
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(48, 48, 72))
                .add_modifier(Modifier::BOLD),
        );

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_detail(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = match app.detail.as_ref() {
        Some(task) => {
            let mut lines = vec![
                detail_line("Title", &task.title),
                detail_line("Description", &task.description),
                detail_line("Priority", task.priority.as_str()),
                detail_line("Status", task.status.as_str()),
                detail_line(
                    "Created",
                    &task.created_at.format("%Y-%m-%d %H:%M").to_string(),
                ),
                detail_line(
                    "Due",
                    &task
                        .due_at
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "not set".to_string()),
                ),
            ];
            if let Some(done) = task.completed_at {
                lines.push(detail_line(
                    "Completed",
                    &done.format("%Y-%m-%d %H:%M").to_string(),
                ));
            }
            lines
        }
        None => vec![Line::from(Span::styled(
            "no task selected",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Details"));
    f.render_widget(detail, area);
}

fn detail_line<'a>(label: &'a str, value: &str) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            format!("{label}: "),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(value.to_string()),
    ])
}

fn render_help(f: &mut ratatui::Frame, area: Rect, mode: Mode) {
    let text = match mode {
        Mode::List => {
            " a: add  |  e: edit  |  d: delete  |  space: cycle status  |  /: search  |  r: refresh  |  q: quit"
        }
        Mode::Search => " type to filter  |  Enter/Esc: back to list",
        Mode::Form => " Tab: next field  |  ←/→: priority  |  Enter: save  |  Esc: cancel",
        Mode::ConfirmDelete => " delete selected task?  y: yes  |  any other key: no",
    };
    let help = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, area);
}

fn render_form(f: &mut ratatui::Frame, area: Rect, form: &TaskForm) {
    let popup = centered_rect(60, 18, area);
    f.render_widget(Clear, popup);

    let title = if form.is_edit() { "Edit task" } else { "Add task" };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().bg(Color::Rgb(20, 20, 30)));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(3), // description
            Constraint::Length(3), // priority
            Constraint::Length(3), // due date
            Constraint::Length(1), // error line
        ])
        .split(inner);

    render_form_field(f, rows[0], "Title", &form.title, form.focus == FormField::Title);
    render_form_field(
        f,
        rows[1],
        "Description",
        &form.description,
        form.focus == FormField::Description,
    );
    render_form_field(
        f,
        rows[2],
        "Priority (←/→)",
        form.priority.as_str(),
        form.focus == FormField::Priority,
    );
    render_form_field(
        f,
        rows[3],
        "Due date (YYYY-MM-DD)",
        &form.due_at,
        form.focus == FormField::DueDate,
    );

    if let Some(err) = form.error.as_ref() {
        let error = Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red));
        f.render_widget(error, rows[4]);
    }
}

fn render_form_field(f: &mut ratatui::Frame, area: Rect, label: &str, value: &str, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let cursor = if focused { "▌" } else { "" };

    let field = Paragraph::new(format!("{value}{cursor}")).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(label),
    );
    f.render_widget(field, area);
}

fn render_confirm(f: &mut ratatui::Frame, area: Rect) {
    let popup = centered_rect(44, 3, area);
    f.render_widget(Clear, popup);

    let confirm = Paragraph::new("Delete the selected task? (y/n)")
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm")
                .style(Style::default().bg(Color::Rgb(40, 20, 20))),
        );
    f.render_widget(confirm, popup);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}
