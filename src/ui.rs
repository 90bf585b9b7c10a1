use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use toolnest::app::ToolNest;
use toolnest::controller::{next_ordering, ListView, LoadPhase, TaskListController};
use toolnest::error::ApiError;
use toolnest::form::{TaskForm, WEEKDAYS};
use toolnest::models::{Priority, TaskCategory, TaskRecord, Tool};

const APP_NAME: &str = "ToolNest";
const TOOL_NAME: &str = "Task Manager";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Tasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupMode {
    None,
    TaskPriority,
    TaskDetails,
    CreateTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Category,
    Title,
    Description,
    Priority,
    DueDate,
    Weekdays,
    DailyTask,
    Date,
}

impl FormField {
    fn label(&self) -> &'static str {
        match self {
            FormField::Category => "Type",
            FormField::Title => "Title",
            FormField::Description => "Description",
            FormField::Priority => "Priority",
            FormField::DueDate => "Due date",
            FormField::Weekdays => "Weekdays",
            FormField::DailyTask => "Daily Task ID",
            FormField::Date => "Date (YYYY-MM-DD)",
        }
    }
}

fn form_fields(category: TaskCategory) -> &'static [FormField] {
    match category {
        TaskCategory::Single => &[
            FormField::Category,
            FormField::Title,
            FormField::Description,
            FormField::Priority,
            FormField::DueDate,
        ],
        TaskCategory::Daily => &[
            FormField::Category,
            FormField::Title,
            FormField::Description,
            FormField::Priority,
            FormField::Weekdays,
        ],
        TaskCategory::Instance => &[
            FormField::Category,
            FormField::Title,
            FormField::Description,
            FormField::Priority,
            FormField::DailyTask,
            FormField::Date,
        ],
    }
}

fn cycle<T: Copy + PartialEq>(items: &[T], current: T, forward: bool) -> T {
    let pos = items.iter().position(|item| *item == current).unwrap_or(0);
    let next = if forward {
        (pos + 1) % items.len()
    } else {
        (pos + items.len() - 1) % items.len()
    };
    items[next]
}

/// Result of a backend call made off the UI thread, picked up on the next tick.
enum Outcome {
    Tools(Result<Vec<Tool>, ApiError>),
    Priority(Priority, Result<bool, ApiError>),
    Toggled(i64, Result<(), ApiError>),
    Deleted(i64, Result<(), ApiError>),
    Created(Result<TaskRecord, ApiError>),
}

pub struct App<'a> {
    ctx: &'a ToolNest,
    runtime: Handle,
    tasks: Arc<TaskListController>,
    outcomes_tx: mpsc::UnboundedSender<Outcome>,
    outcomes_rx: mpsc::UnboundedReceiver<Outcome>,
    submitting: bool,
    form: TaskForm,
    form_field: usize,
    daily_task_input: String,
    date_input: String,
    pub current_tab: Tab,
    pub tools: Vec<Tool>,
    pub tools_loading: bool,
    pub tool_list_state: ListState,
    pub task_list_state: ListState,
    pub view: ListView,
    pub popup_mode: PopupMode,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl<'a> App<'a> {
    pub fn new(ctx: &'a ToolNest, runtime: Handle, tab: Tab) -> Self {
        let tasks = Arc::new(TaskListController::with_handle(
            ctx.tasks.clone(),
            TaskCategory::Single,
            ctx.config.debounce,
            runtime.clone(),
        ));
        tasks.load();
        let view = tasks.snapshot();
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();

        let mut app = App {
            ctx,
            runtime,
            tasks,
            outcomes_tx,
            outcomes_rx,
            submitting: false,
            form: TaskForm::new(TaskCategory::Single),
            form_field: 0,
            daily_task_input: String::new(),
            date_input: String::new(),
            current_tab: tab,
            tools: Vec::new(),
            tools_loading: false,
            tool_list_state: ListState::default(),
            task_list_state: ListState::default(),
            view,
            popup_mode: PopupMode::None,
            status: None,
            should_quit: false,
        };
        app.load_tools();
        app
    }

    fn spawn<F>(&self, call: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let tx = self.outcomes_tx.clone();
        self.runtime.spawn(async move {
            // receiver is gone once the TUI has exited
            let _ = tx.send(call.await);
        });
    }

    pub fn load_tools(&mut self) {
        self.tools_loading = true;
        let tools = self.ctx.tools.clone();
        self.spawn(async move { Outcome::Tools(tools.list_tools().await) });
    }

    /// Applies finished backend calls. Returns true when anything changed.
    pub fn drain_outcomes(&mut self) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            changed = true;
            self.apply(outcome);
        }
        changed
    }

    fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Tools(Ok(tools)) => {
                self.tools_loading = false;
                self.tools = tools;
                if !self.tools.is_empty() && self.tool_list_state.selected().is_none() {
                    self.tool_list_state.select(Some(0));
                }
            }
            Outcome::Tools(Err(e)) => {
                self.tools_loading = false;
                log::error!("Failed to fetch tools: {}", e);
                self.status = Some("Failed to fetch tools".to_string());
            }
            Outcome::Priority(priority, Ok(true)) => {
                self.status = Some(format!("Priority set to {}", priority));
            }
            Outcome::Priority(_, Ok(false)) => {}
            Outcome::Priority(_, Err(_)) => {
                self.status = Some("Failed to update priority".to_string());
            }
            Outcome::Toggled(_, Ok(())) => {}
            Outcome::Toggled(id, Err(e)) => {
                log::error!("Failed to toggle task {}: {}", id, e);
                self.status = Some("Failed to update task".to_string());
            }
            Outcome::Deleted(id, Ok(())) => {
                self.status = Some(format!("Task #{} deleted", id));
            }
            Outcome::Deleted(id, Err(e)) => {
                log::error!("Failed to delete task {}: {}", id, e);
                self.status = Some("Failed to delete task".to_string());
            }
            Outcome::Created(Ok(created)) => {
                self.submitting = false;
                log::info!("Created {} task {}", created.category(), created.id());
                self.form.reset();
                self.daily_task_input.clear();
                self.date_input.clear();
                if self.popup_mode == PopupMode::CreateTask {
                    self.close_popup();
                }
                self.status = Some("Task created successfully!".to_string());
                if created.category() == self.view.category {
                    self.tasks.refresh();
                }
            }
            Outcome::Created(Err(e)) => {
                self.submitting = false;
                log::error!("Failed to create task: {}", e);
                self.status = Some(format!("Failed to create task: {}", e.user_message()));
            }
        }
    }

    /// Pulls the latest list state from the controller.
    pub fn sync(&mut self) {
        self.view = self.tasks.snapshot();
        let len = self.view.tasks.len();
        match self.task_list_state.selected() {
            _ if len == 0 => self.task_list_state.select(None),
            Some(i) if i >= len => self.task_list_state.select(Some(len - 1)),
            None => self.task_list_state.select(Some(0)),
            _ => {}
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.ctx.session.is_logged_in()
    }

    pub fn next_tab(&mut self) {
        self.current_tab = match self.current_tab {
            Tab::Dashboard => Tab::Tasks,
            Tab::Tasks => Tab::Dashboard,
        };
    }

    fn list_len(&self) -> usize {
        match self.current_tab {
            Tab::Dashboard => self.tools.len(),
            Tab::Tasks => self.view.tasks.len(),
        }
    }

    fn list_state(&mut self) -> &mut ListState {
        match self.current_tab {
            Tab::Dashboard => &mut self.tool_list_state,
            Tab::Tasks => &mut self.task_list_state,
        }
    }

    pub fn next_item(&mut self) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let state = self.list_state();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    pub fn previous_item(&mut self) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let state = self.list_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    pub fn selected_task(&self) -> Option<&TaskRecord> {
        self.task_list_state.selected().and_then(|i| self.view.tasks.get(i))
    }

    /// Category switches go back to page 1.
    pub fn switch_category(&mut self, category: TaskCategory) {
        self.tasks.switch_category(category);
        self.task_list_state.select(None);
    }

    pub fn refresh(&mut self) {
        match self.current_tab {
            Tab::Dashboard => self.load_tools(),
            Tab::Tasks => self.tasks.refresh(),
        }
    }

    pub fn cycle_ordering(&mut self) {
        let next = next_ordering(self.view.ordering.as_ref(), &self.view.order_fields);
        self.tasks.set_ordering(next);
    }

    pub fn next_page(&mut self) {
        if self.tasks.next_page() {
            self.task_list_state.select(None);
        }
    }

    pub fn previous_page(&mut self) {
        if self.tasks.previous_page() {
            self.task_list_state.select(None);
        }
    }

    pub fn show_priority_popup(&mut self) {
        if self.selected_task().is_some() {
            self.popup_mode = PopupMode::TaskPriority;
        }
    }

    pub fn show_details(&mut self) {
        if self.selected_task().is_some() {
            self.popup_mode = PopupMode::TaskDetails;
        }
    }

    pub fn close_popup(&mut self) {
        self.popup_mode = PopupMode::None;
    }

    pub fn change_priority(&mut self, c: char) {
        let Some(priority) = c.to_digit(10).and_then(|d| Priority::from_digit(d as u8)) else {
            return;
        };
        if let Some(id) = self.selected_task().map(|task| task.id()) {
            let tasks = self.tasks.clone();
            self.spawn(async move { Outcome::Priority(priority, tasks.update_priority(id, priority).await) });
        }
        self.close_popup();
    }

    pub fn toggle_selected(&mut self) {
        if let Some(id) = self.selected_task().map(|task| task.id()) {
            let tasks = self.tasks.clone();
            self.spawn(async move { Outcome::Toggled(id, tasks.toggle_complete(id).await) });
        }
    }

    pub fn delete_selected(&mut self) {
        if let Some(id) = self.selected_task().map(|task| task.id()) {
            let tasks = self.tasks.clone();
            self.spawn(async move { Outcome::Deleted(id, tasks.remove(id).await) });
        }
    }

    pub fn logout(&mut self) {
        self.ctx.session.clear_session();
        self.status = Some("Logged out".to_string());
    }

    pub fn open_create_form(&mut self) {
        if self.form.category() != self.view.category {
            self.set_form_category(self.view.category);
        }
        self.form_field = 1;
        self.popup_mode = PopupMode::CreateTask;
    }

    fn set_form_category(&mut self, category: TaskCategory) {
        self.form.set_category(category);
        self.daily_task_input.clear();
        self.date_input.clear();
        self.form_field = 0;
    }

    fn current_field(&self) -> FormField {
        let fields = form_fields(self.form.category());
        fields[self.form_field.min(fields.len() - 1)]
    }

    pub fn handle_form_key(&mut self, key: KeyCode) {
        let field_count = form_fields(self.form.category()).len();
        match key {
            KeyCode::Esc => self.close_popup(),
            KeyCode::Enter => self.submit_form(),
            KeyCode::Down | KeyCode::Tab => self.form_field = (self.form_field + 1) % field_count,
            KeyCode::Up | KeyCode::BackTab => self.form_field = (self.form_field + field_count - 1) % field_count,
            KeyCode::Left | KeyCode::Right => {
                let forward = key == KeyCode::Right;
                match self.current_field() {
                    FormField::Category => {
                        let category = cycle(&TaskCategory::ALL, self.form.category(), forward);
                        self.set_form_category(category);
                    }
                    FormField::Priority => {
                        let draft = self.form.draft_mut();
                        draft.priority = cycle(&Priority::ALL, draft.priority, !forward);
                    }
                    _ => {}
                }
            }
            KeyCode::Backspace => match self.current_field() {
                FormField::Title => {
                    self.form.draft_mut().title.pop();
                }
                FormField::Description => {
                    self.form.draft_mut().description.pop();
                }
                FormField::DueDate => {
                    self.form.draft_mut().due_date.pop();
                }
                FormField::DailyTask => {
                    self.daily_task_input.pop();
                    self.form.draft_mut().set_daily_task(&self.daily_task_input);
                }
                FormField::Date => {
                    self.date_input.pop();
                    self.form.draft_mut().set_date(&self.date_input);
                }
                _ => {}
            },
            KeyCode::Char(c) => match self.current_field() {
                FormField::Title => self.form.draft_mut().title.push(c),
                FormField::Description => self.form.draft_mut().description.push(c),
                FormField::DueDate => self.form.draft_mut().due_date.push(c),
                FormField::Weekdays => {
                    if let Some(day) = c
                        .to_digit(10)
                        .and_then(|d| (d as usize).checked_sub(1))
                        .and_then(|i| WEEKDAYS.get(i))
                    {
                        self.form.draft_mut().toggle_weekday(day);
                    }
                }
                FormField::DailyTask => {
                    if c.is_ascii_digit() {
                        self.daily_task_input.push(c);
                        self.form.draft_mut().set_daily_task(&self.daily_task_input);
                    }
                }
                FormField::Date => {
                    self.date_input.push(c);
                    self.form.draft_mut().set_date(&self.date_input);
                }
                FormField::Category | FormField::Priority => {}
            },
            _ => {}
        }
    }

    /// Validates now, creates in the background. The draft stays until the
    /// backend accepts it.
    pub fn submit_form(&mut self) {
        if self.submitting {
            return;
        }
        match self.form.build_payload(Utc::now()) {
            Ok(payload) => {
                self.submitting = true;
                self.status = Some("Creating task...".to_string());
                let gateway = self.ctx.tasks.clone();
                self.spawn(async move { Outcome::Created(gateway.create(&payload).await) });
            }
            Err(e) => {
                self.status = Some(format!("Failed to create task: {}", e));
            }
        }
    }
}

pub fn run_tui(ctx: &ToolNest, runtime: Handle, tab: Tab) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(ctx, runtime, tab);
    let res = run_app(&mut terminal, &mut app);
    app.tasks.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let mut revisions = app.tasks.subscribe();
    let mut session = app.ctx.session.subscribe();
    let mut dirty = true;

    loop {
        if revisions.has_changed().unwrap_or(false) {
            revisions.borrow_and_update();
            dirty = true;
        }
        if session.has_changed().unwrap_or(false) {
            session.borrow_and_update();
            dirty = true;
        }
        dirty |= app.drain_outcomes();

        if dirty {
            app.sync();
            terminal.draw(|f| ui(f, app))?;
            dirty = false;
        }

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            dirty = true;
            match app.popup_mode {
                PopupMode::CreateTask => app.handle_form_key(key.code),
                PopupMode::TaskPriority => match key.code {
                    KeyCode::Esc => app.close_popup(),
                    KeyCode::Char(c) => app.change_priority(c),
                    _ => {}
                },
                PopupMode::TaskDetails => {
                    if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                        app.close_popup();
                    }
                }
                PopupMode::None => {
                    app.status = None;
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Tab | KeyCode::BackTab => app.next_tab(),
                        KeyCode::Down => app.next_item(),
                        KeyCode::Up => app.previous_item(),
                        KeyCode::Char('r') => app.refresh(),
                        KeyCode::Char('x') => app.logout(),
                        _ if app.current_tab == Tab::Tasks => match key.code {
                            KeyCode::Enter => app.show_details(),
                            KeyCode::Char('1') => app.switch_category(TaskCategory::Single),
                            KeyCode::Char('2') => app.switch_category(TaskCategory::Daily),
                            KeyCode::Char('3') => app.switch_category(TaskCategory::Instance),
                            KeyCode::Char('[') => app.previous_page(),
                            KeyCode::Char(']') => app.next_page(),
                            KeyCode::Char('o') => app.cycle_ordering(),
                            KeyCode::Char('p') => app.show_priority_popup(),
                            KeyCode::Char('n') => app.open_create_form(),
                            KeyCode::Char('t') => app.toggle_selected(),
                            KeyCode::Char('d') => app.delete_selected(),
                            _ => {}
                        },
                        KeyCode::Enter if app.current_tab == Tab::Dashboard => {
                            if let Some(tool) = app.tool_list_state.selected().and_then(|i| app.tools.get(i)) {
                                if tool.base_route.trim_matches('/') == "tasks_manager" {
                                    app.current_tab = Tab::Tasks;
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::VeryHigh => Color::Red,
        Priority::High => Color::LightRed,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Blue,
        Priority::VeryLow => Color::Gray,
    }
}

fn priority_badge(priority: Priority) -> Span<'static> {
    Span::styled(
        format!("[{}]", priority),
        Style::default().fg(priority_color(priority)).add_modifier(Modifier::BOLD),
    )
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);

    let titles: Vec<Line> = ["Dashboard", "Tasks"].iter().cloned().map(Line::from).collect();
    let selected = match app.current_tab {
        Tab::Dashboard => 0,
        Tab::Tasks => 1,
    };
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(APP_NAME))
        .select(selected)
        .style(Style::default().fg(Color::Cyan))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::Black));
    f.render_widget(tabs, chunks[1]);

    match app.current_tab {
        Tab::Dashboard => render_dashboard(f, app, chunks[2]),
        Tab::Tasks => render_tasks(f, app, chunks[2]),
    }

    let status = Paragraph::new(app.status.clone().unwrap_or_default()).style(Style::default().fg(Color::Yellow));
    f.render_widget(status, chunks[3]);

    match app.popup_mode {
        PopupMode::TaskPriority => render_priority_popup(f),
        PopupMode::TaskDetails => {
            if let Some(task) = app.selected_task() {
                render_details(f, task);
            }
        }
        PopupMode::CreateTask => render_create_form(f, app),
        PopupMode::None => {}
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let heading = match app.current_tab {
        Tab::Dashboard => APP_NAME,
        Tab::Tasks => TOOL_NAME,
    };
    let session = if app.is_logged_in() {
        Span::styled("● Logged in (x: logout)", Style::default().fg(Color::Green))
    } else {
        Span::styled("○ Logged out (toolnest login)", Style::default().fg(Color::DarkGray))
    };
    let line = Line::from(vec![
        Span::styled(format!("{}  ", heading), Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
        session,
    ]);
    f.render_widget(Paragraph::new(line), area);
}

// Helper function to create centered rectangles for popups
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn render_dashboard(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let tools: Vec<ListItem> = app
        .tools
        .iter()
        .map(|tool| {
            let initial = tool.title.chars().next().unwrap_or('?');
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {} ", initial), Style::default().bg(Color::Magenta).fg(Color::White)),
                Span::raw(" "),
                Span::styled(tool.title.clone(), Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    let tools_list = List::new(tools)
        .block(Block::default().borders(Borders::ALL).title("Installed Tools"))
        .highlight_style(Style::default().bg(Color::LightGreen).add_modifier(Modifier::BOLD))
        .highlight_symbol(">> ");
    f.render_stateful_widget(tools_list, chunks[0], &mut app.tool_list_state);

    let selected = app.tool_list_state.selected().and_then(|i| app.tools.get(i));
    let info_text = match selected {
        Some(tool) => {
            let mut text = format!("{}\n\nFeatures\n", tool.title);
            for feature in &tool.description {
                text.push_str(&format!("• {}\n", feature));
            }
            text.push_str(&format!(
                "\nExplore: toolnest explore \"{}\"\n\nControls:\n• Enter: Open\n• r: Refresh\n• Tab: Switch tab\n• q: Quit",
                tool.title
            ));
            text
        }
        None if app.tools_loading => "Loading tools...".to_string(),
        None => "Welcome to ToolNest\n\nYour centralized hub for productivity tools.\n\nControls:\n• ↑/↓: Navigate\n• r: Refresh\n• q: Quit".to_string(),
    };

    let info = Paragraph::new(info_text)
        .block(Block::default().borders(Borders::ALL).title("Tool"))
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::White));
    f.render_widget(info, chunks[1]);
}

fn render_tasks(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let view = &app.view;
    let title = format!("{} Tasks  (1 Single | 2 Daily | 3 Instance)", view.category.label());
    let block = Block::default().borders(Borders::ALL).title(title);

    if view.phase == LoadPhase::Loading {
        let loading = Paragraph::new("Loading...")
            .block(block)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Cyan));
        f.render_widget(loading, chunks[0]);
    } else if view.tasks.is_empty() {
        let empty = Paragraph::new("No Task Available")
            .block(block)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(empty, chunks[0]);
    } else {
        let items: Vec<ListItem> = view
            .tasks
            .iter()
            .map(|task| {
                let common = task.common();
                let check = if common.is_completed { "[x] " } else { "[ ] " };
                ListItem::new(Line::from(vec![
                    Span::raw(check),
                    Span::styled(format!("{} ", common.title), Style::default().fg(Color::White)),
                    priority_badge(common.priority),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::LightGreen).add_modifier(Modifier::BOLD))
            .highlight_symbol(">> ");
        f.render_stateful_widget(list, chunks[0], &mut app.task_list_state);
    }

    let ordering = view
        .ordering
        .as_ref()
        .map(|order| order.to_string())
        .unwrap_or_else(|| "Order by".to_string());
    let prev = if view.has_previous { "[: Prev" } else { "(no previous page)" };
    let next = if view.has_next { "]: Next" } else { "(no next page)" };
    let mut info_text = format!("Page: {}\nOrdering: {}\n{}  {}\n", view.page, ordering, prev, next);
    if view.phase == LoadPhase::Error {
        info_text.push_str("\nCould not refresh tasks; showing last loaded list.\n");
    }
    info_text.push_str(
        "\nControls:\n• Enter: Details\n• p: Change priority\n• n: New task\n• t: Toggle complete\n• d: Delete\n• o: Cycle ordering\n• [ / ]: Previous / next page\n• r: Refresh\n• q: Quit",
    );

    let info = Paragraph::new(info_text)
        .block(Block::default().borders(Borders::ALL).title("Task Info"))
        .style(Style::default().fg(Color::White));
    f.render_widget(info, chunks[1]);
}

fn render_priority_popup(f: &mut Frame) {
    let popup_area = centered_rect(50, 40, f.area());
    let block = Block::default()
        .title("Change Task Priority")
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::DarkGray));

    let mut lines = vec![Line::from("Select new priority:"), Line::from("")];
    for (i, priority) in Priority::ALL.iter().enumerate() {
        lines.push(Line::from(vec![Span::raw(format!("{} = ", i + 1)), priority_badge(*priority)]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Press ESC to cancel"));

    let content = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White));
    f.render_widget(Clear, popup_area);
    f.render_widget(content, popup_area);
}

fn render_details(f: &mut Frame, task: &TaskRecord) {
    let common = task.common();
    let popup_area = centered_rect(60, 60, f.area());
    let (status, status_color) = if common.is_completed {
        ("Completed", Color::Green)
    } else {
        ("Pending", Color::LightRed)
    };

    let field = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<16}", label), Style::default().fg(Color::Gray)),
            Span::raw(value),
        ])
    };

    let mut lines = vec![
        field("Title", common.title.clone()),
        field(
            "Description",
            if common.description.is_empty() {
                "—".to_string()
            } else {
                common.description.clone()
            },
        ),
        Line::from(vec![
            Span::styled(format!("{:<16}", "Priority"), Style::default().fg(Color::Gray)),
            priority_badge(common.priority),
        ]),
        field(
            "Smart Priority",
            if common.smart_priority { "Enabled" } else { "Disabled" }.to_string(),
        ),
        Line::from(vec![
            Span::styled(format!("{:<16}", "Status"), Style::default().fg(Color::Gray)),
            Span::styled(status, Style::default().fg(status_color)),
        ]),
        field("Postponed", format!("{} time(s)", common.postponed_count)),
    ];

    match task {
        TaskRecord::Single(t) => lines.push(field("Due", t.due_date.clone().unwrap_or_else(|| "—".to_string()))),
        TaskRecord::Daily(t) => {
            lines.push(field("Weekdays", t.weekdays.join(", ")));
            lines.push(field("Active", if t.is_active { "yes" } else { "no" }.to_string()));
        }
        TaskRecord::Instance(t) => {
            lines.push(field("Daily task", format!("#{}", t.daily_task)));
            lines.push(field("Date", t.date.to_string()));
        }
    }
    if let Some(created) = &common.created_at {
        lines.push(field("Created", created.clone()));
    }
    if let Some(updated) = &common.updated_at {
        lines.push(field("Updated", updated.clone()));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Press ESC to close"));

    let content = Paragraph::new(lines)
        .block(
            Block::default()
                .title("Task Details")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(status_color))
                .style(Style::default().bg(Color::Black)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(content, popup_area);
}

fn render_create_form(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(60, 60, f.area());
    let draft = app.form.draft();
    let category = app.form.category();
    let current = app.current_field();

    let mut lines = Vec::new();
    for field in form_fields(category) {
        let value = match field {
            FormField::Category => format!("< {} >", category.as_str()),
            FormField::Title => draft.title.clone(),
            FormField::Description => draft.description.clone(),
            FormField::Priority => format!("< {} >", draft.priority),
            FormField::DueDate => {
                if draft.due_date.is_empty() {
                    "(now)".to_string()
                } else {
                    draft.due_date.clone()
                }
            }
            FormField::Weekdays => WEEKDAYS
                .iter()
                .enumerate()
                .map(|(i, day)| {
                    let on = draft.weekdays.iter().any(|d| d == day);
                    format!("{}{}{}", i + 1, if on { "*" } else { " " }, day)
                })
                .collect::<Vec<_>>()
                .join(" "),
            FormField::DailyTask => app.daily_task_input.clone(),
            FormField::Date => app.date_input.clone(),
        };
        let style = if *field == current {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<20}", field.label()), Style::default().fg(Color::Gray)),
            Span::styled(value, style),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("↑/↓: Field  ←/→: Change  1-7: Toggle weekday  Enter: Submit  Esc: Cancel"));

    let content = Paragraph::new(lines)
        .block(
            Block::default()
                .title(format!("Create {} Task", category.as_str()))
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::DarkGray)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(content, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolnest::config::Config;
    use toolnest::storage::MemoryStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn slow_backend() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tools/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"title": "Task Manager", "base_route": "tasks_manager"}]))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        server
    }

    fn context(server: &MockServer) -> ToolNest {
        ToolNest::with_store(Config::with_base_url(server.uri()), Arc::new(MemoryStore::new())).unwrap()
    }

    #[tokio::test]
    async fn tools_load_in_the_background() {
        let server = slow_backend().await;
        let ctx = context(&server);
        let mut app = App::new(&ctx, Handle::current(), Tab::Dashboard);

        assert!(app.tools_loading);
        assert!(!app.drain_outcomes());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(app.drain_outcomes());
        assert!(!app.tools_loading);
        assert_eq!(app.tools.len(), 1);
        assert_eq!(app.tool_list_state.selected(), Some(0));
    }

    #[tokio::test]
    async fn invalid_form_is_rejected_without_a_request() {
        let server = slow_backend().await;
        let ctx = context(&server);
        let mut app = App::new(&ctx, Handle::current(), Tab::Tasks);

        app.open_create_form();
        app.submit_form();
        assert!(!app.submitting);
        assert_eq!(app.popup_mode, PopupMode::CreateTask);
        assert!(app.status.as_deref().unwrap_or_default().contains("title"));
    }

    #[test]
    fn cycle_wraps_both_ways() {
        assert_eq!(cycle(&TaskCategory::ALL, TaskCategory::Instance, true), TaskCategory::Single);
        assert_eq!(cycle(&TaskCategory::ALL, TaskCategory::Single, false), TaskCategory::Instance);
        assert_eq!(cycle(&Priority::ALL, Priority::Medium, true), Priority::Low);
    }

    #[test]
    fn instance_form_has_required_fields() {
        let fields = form_fields(TaskCategory::Instance);
        assert!(fields.contains(&FormField::DailyTask));
        assert!(fields.contains(&FormField::Date));
        assert!(!fields.contains(&FormField::Weekdays));
    }
}
