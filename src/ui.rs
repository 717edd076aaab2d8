use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::editor::InputField;
use crate::models::{Focus, PersistEvent, TaskList};
use crate::store::{append, remove_at, Persister, TaskStore};

pub const EMPTY_MESSAGE: &str = "Great Job! No tasks Due";
const PLACEHOLDER: &str = "Write a task";
const ADD_LABEL: &str = "[+]";
const TICK: Duration = Duration::from_millis(250);

pub struct App {
    pub tasks: TaskList,
    pub input: InputField,
    pub focus: Focus,
    pub list_state: ListState,
    pub status: Option<String>,
    pub should_quit: bool,
    persister: Persister,
    events: UnboundedReceiver<PersistEvent>,
    // Last drawn regions, used to map mouse clicks.
    list_area: Rect,
    add_area: Rect,
}

impl App {
    /// Loads the stored list and starts the background writer. Must be called
    /// inside a tokio runtime context.
    pub fn new(store: TaskStore) -> Self {
        let tasks = store.load();
        let (persister, events) = Persister::spawn(store);
        App {
            tasks,
            input: InputField::new(),
            focus: Focus::Input,
            list_state: ListState::default(),
            status: None,
            should_quit: false,
            persister,
            events,
            list_area: Rect::default(),
            add_area: Rect::default(),
        }
    }

    pub fn add_task(&mut self) {
        if self.input.is_empty() {
            return;
        }
        let text = self.input.take();
        self.tasks = append(&self.tasks, Some(&text));
        log::debug!("event=task_add status=ok count={}", self.tasks.len());
        self.persister.submit(self.tasks.clone());
    }

    pub fn complete_task(&mut self, index: usize) {
        match remove_at(&self.tasks, index) {
            Ok(next) => {
                self.tasks = next;
                log::debug!(
                    "event=task_complete status=ok index={} count={}",
                    index,
                    self.tasks.len()
                );
                self.clamp_selection();
                self.persister.submit(self.tasks.clone());
            }
            Err(err) => log::warn!("event=task_complete status=rejected error={err}"),
        }
    }

    pub fn complete_selected(&mut self) {
        if let Some(index) = self.list_state.selected() {
            self.complete_task(index);
        }
    }

    fn clamp_selection(&mut self) {
        if self.tasks.is_empty() {
            self.list_state.select(None);
            self.focus = Focus::Input;
        } else if let Some(i) = self.list_state.selected() {
            if i >= self.tasks.len() {
                self.list_state.select(Some(self.tasks.len() - 1));
            }
        }
    }

    pub fn next_item(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.tasks.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous_item(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.tasks.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input if !self.tasks.is_empty() => {
                if self.list_state.selected().is_none() {
                    self.list_state.select(Some(0));
                }
                Focus::List
            }
            _ => Focus::Input,
        };
    }

    /// Applies any write outcomes reported since the last call.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                PersistEvent::Saved { .. } => self.status = None,
                PersistEvent::Failed { message } => {
                    self.status = Some(format!("Not saved: {message}"));
                }
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match (self.focus, key.code) {
            (_, KeyCode::Esc) => self.should_quit = true,
            (_, KeyCode::Tab) | (_, KeyCode::BackTab) => self.toggle_focus(),
            (Focus::Input, KeyCode::Enter) => self.add_task(),
            (Focus::Input, KeyCode::Char(c)) => self.input.insert_char(c),
            (Focus::Input, KeyCode::Backspace) => self.input.delete_char(),
            (Focus::Input, KeyCode::Delete) => self.input.delete_forward(),
            (Focus::Input, KeyCode::Left) => self.input.move_cursor_left(),
            (Focus::Input, KeyCode::Right) => self.input.move_cursor_right(),
            (Focus::Input, KeyCode::Home) => self.input.move_to_start_of_line(),
            (Focus::Input, KeyCode::End) => self.input.move_to_end_of_line(),
            (Focus::Input, KeyCode::Up) | (Focus::Input, KeyCode::Down) => self.toggle_focus(),
            (Focus::List, KeyCode::Down) => self.next_item(),
            (Focus::List, KeyCode::Up) => self.previous_item(),
            (Focus::List, KeyCode::Enter) | (Focus::List, KeyCode::Delete) => {
                self.complete_selected()
            }
            (Focus::List, KeyCode::Char(c)) => {
                self.focus = Focus::Input;
                self.input.insert_char(c);
            }
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        if contains(self.add_area, mouse.column, mouse.row) {
            self.add_task();
        } else if let Some(index) = self.row_at(mouse.column, mouse.row) {
            self.complete_task(index);
        }
    }

    /// Maps a screen position to the task row drawn there.
    fn row_at(&self, column: u16, row: u16) -> Option<usize> {
        let inner = inner_rect(self.list_area);
        if self.tasks.is_empty() || !contains(inner, column, row) {
            return None;
        }
        let index = self.list_state.offset() + usize::from(row - inner.y);
        (index < self.tasks.len()).then_some(index)
    }

    /// Waits until every submitted write has been applied.
    pub async fn flush(&self) {
        self.persister.flush().await;
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height
}

fn inner_rect(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

pub fn format_header_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Runs the TUI until the user quits. `runtime` must be the runtime whose
/// context is entered by the caller.
pub fn run_tui(store: TaskStore, runtime: &Handle) -> Result<()> {
    let mut app = App::new(store);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = run_app(&mut terminal, &mut app);
    finish_session(&mut terminal, &mut app, runtime, outcome, restore_terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()
}

/// Settles pending writes, then restores the terminal. Both steps run even
/// when the session or the restore failed; the first error is returned.
fn finish_session<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runtime: &Handle,
    outcome: io::Result<()>,
    restore: impl FnOnce(&mut Terminal<B>) -> io::Result<()>,
) -> Result<()> {
    runtime.block_on(app.flush());
    app.drain_events();

    let restored = restore(terminal);

    if let Some(status) = &app.status {
        eprintln!("{status}");
    }
    if let Err(err) = &outcome {
        log::error!("event=tui_exit status=error error={err}");
    }
    if let Err(err) = &restored {
        log::error!("event=terminal_restore status=error error={err}");
    }

    outcome?;
    restored?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(TICK)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }
        app.drain_events();

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(f.area());

    let today = chrono::Local::now().date_naive();
    let header = Paragraph::new(Line::from(Span::styled(
        format!("Tasks for {}", format_header_date(today)),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, chunks[0]);

    render_tasks(f, app, chunks[1]);

    let status = app.status.as_deref().unwrap_or("");
    f.render_widget(
        Paragraph::new(status).style(Style::default().fg(Color::Red)),
        chunks[2],
    );

    render_input(f, app, chunks[3]);
}

fn render_tasks(f: &mut Frame, app: &mut App, area: Rect) {
    app.list_area = area;

    if app.tasks.is_empty() {
        let empty = Paragraph::new(EMPTY_MESSAGE)
            .block(Block::default().borders(Borders::ALL))
            .style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(empty, area);
        return;
    }

    let tasks: Vec<ListItem> = app
        .tasks
        .iter()
        .map(|task| ListItem::new(Line::from(vec![Span::raw("[ ] "), Span::raw(task.as_str())])))
        .collect();

    let border_style = if app.focus == Focus::List {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let tasks_list = List::new(tasks)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title("Click or Enter to complete"),
        )
        .highlight_style(
            Style::default()
                .bg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    f.render_stateful_widget(tasks_list, area, &mut app.list_state);
}

fn render_input(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(7)])
        .split(area);
    app.add_area = chunks[1];

    let border_style = if app.focus == Focus::Input {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let input = if app.input.is_empty() {
        Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        Paragraph::new(app.input.value())
    };
    f.render_widget(
        input.block(Block::default().borders(Borders::ALL).border_style(border_style)),
        chunks[0],
    );

    let add = Paragraph::new(ADD_LABEL)
        .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(add, chunks[1]);

    if app.focus == Focus::Input {
        let inner = inner_rect(chunks[0]);
        let max_x = inner.x + inner.width.saturating_sub(1);
        let cursor = u16::try_from(app.input.cursor()).unwrap_or(u16::MAX);
        f.set_cursor_position((inner.x.saturating_add(cursor).min(max_x), inner.y));
    }
}
