use crate::editor::{EntryEditor, EntryState, ExpenseForm, IncomeForm};
use crate::ledger::Ledger;
use crate::records::{format_money, Category, RecordKind};
use crate::storage::KeyValueStore;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::collections::HashMap;
use std::io;
use tracing::debug;

/// Which input receives keystrokes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    ExpenseName,
    ExpenseCategory,
    ExpenseAmount,
    IncomeName,
    IncomeAmount,
    Records,
}

impl Focus {
    pub fn next(&self) -> Self {
        match self {
            Focus::ExpenseName => Focus::ExpenseCategory,
            Focus::ExpenseCategory => Focus::ExpenseAmount,
            Focus::ExpenseAmount => Focus::IncomeName,
            Focus::IncomeName => Focus::IncomeAmount,
            Focus::IncomeAmount => Focus::Records,
            Focus::Records => Focus::ExpenseName,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Focus::ExpenseName => Focus::Records,
            Focus::ExpenseCategory => Focus::ExpenseName,
            Focus::ExpenseAmount => Focus::ExpenseCategory,
            Focus::IncomeName => Focus::ExpenseAmount,
            Focus::IncomeAmount => Focus::IncomeName,
            Focus::Records => Focus::IncomeAmount,
        }
    }

    fn is_expense_form(&self) -> bool {
        matches!(
            self,
            Focus::ExpenseName | Focus::ExpenseCategory | Focus::ExpenseAmount
        )
    }

    fn is_income_form(&self) -> bool {
        matches!(self, Focus::IncomeName | Focus::IncomeAmount)
    }
}

/// Field of the draft under the cursor while an entry is being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Name,
    Category,
    Amount,
}

impl EditField {
    fn next(&self, kind: RecordKind) -> Self {
        match (self, kind) {
            (EditField::Name, RecordKind::Expense) => EditField::Category,
            (EditField::Name, RecordKind::Income) => EditField::Amount,
            (EditField::Category, _) => EditField::Amount,
            (EditField::Amount, _) => EditField::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    All,
    Expenses,
    Incomes,
}

impl ListFilter {
    pub fn title(&self) -> &str {
        match self {
            ListFilter::All => "All",
            ListFilter::Expenses => "Expenses",
            ListFilter::Incomes => "Incomes",
        }
    }
}

type EntryKey = (RecordKind, i64);

pub struct App<S: KeyValueStore> {
    pub ledger: Ledger<S>,
    pub expense_form: ExpenseForm,
    pub income_form: IncomeForm,
    pub entries: HashMap<EntryKey, EntryEditor>,
    pub focus: Focus,
    pub edit_field: EditField,
    pub filter: ListFilter,
    pub state: TableState,
    /// Blocking message; any key dismisses it
    pub notice: Option<String>,
    pub currency: String,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(ledger: Ledger<S>, currency: String) -> Self {
        let mut app = Self {
            ledger,
            expense_form: ExpenseForm::default(),
            income_form: IncomeForm::default(),
            entries: HashMap::new(),
            focus: Focus::ExpenseName,
            edit_field: EditField::Name,
            filter: ListFilter::All,
            state: TableState::default(),
            notice: None,
            currency,
        };
        app.clamp_selection();
        app
    }

    /// Visible rows: all expenses, then all incomes
    pub fn rows(&self) -> Vec<EntryKey> {
        let expenses = self
            .ledger
            .expenses()
            .iter()
            .map(|e| (RecordKind::Expense, e.id));
        let incomes = self
            .ledger
            .incomes()
            .iter()
            .map(|i| (RecordKind::Income, i.id));

        match self.filter {
            ListFilter::All => expenses.chain(incomes).collect(),
            ListFilter::Expenses => expenses.collect(),
            ListFilter::Incomes => incomes.collect(),
        }
    }

    pub fn selected_key(&self) -> Option<EntryKey> {
        let rows = self.rows();
        self.state.selected().and_then(|i| rows.get(i).copied())
    }

    pub fn entry_state(&self, key: EntryKey) -> &EntryState {
        static VIEWING: EntryState = EntryState::Viewing;
        self.entries.get(&key).map(|e| &e.state).unwrap_or(&VIEWING)
    }

    fn selected_entry_mut(&mut self) -> Option<&mut EntryEditor> {
        let (kind, id) = self.selected_key()?;
        Some(
            self.entries
                .entry((kind, id))
                .or_insert_with(|| EntryEditor::new(id, kind)),
        )
    }

    fn selected_is_editing(&self) -> bool {
        self.selected_key()
            .map(|key| matches!(self.entry_state(key), EntryState::Editing(_)))
            .unwrap_or(false)
    }

    pub fn apply_filter(&mut self, filter: ListFilter) {
        self.filter = filter;
        self.state.select(if self.rows().is_empty() { None } else { Some(0) });
    }

    fn clamp_selection(&mut self) {
        let len = self.rows().len();
        let selected = match self.state.selected() {
            _ if len == 0 => None,
            Some(i) if i >= len => Some(len - 1),
            Some(i) => Some(i),
            None => Some(0),
        };
        self.state.select(selected);
    }

    /// Forget view state for records that left the ledger
    fn prune_entries(&mut self) {
        let ledger = &self.ledger;
        self.entries
            .retain(|(kind, id), _| ledger.contains(*id, *kind));
        self.clamp_selection();
    }

    pub fn next(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    // ========================================================================
    // INTENTS
    // ========================================================================

    pub fn submit_expense(&mut self) {
        match self.expense_form.submit(&mut self.ledger) {
            Ok(_) => {
                self.focus = Focus::ExpenseName;
                self.clamp_selection();
            }
            Err(err) => self.notice = Some(format!("Please enter a valid expense: {}.", err)),
        }
    }

    pub fn submit_income(&mut self) {
        match self.income_form.submit(&mut self.ledger) {
            Ok(_) => {
                self.focus = Focus::IncomeName;
                self.clamp_selection();
            }
            Err(err) => self.notice = Some(format!("Please enter a valid income: {}.", err)),
        }
    }

    pub fn edit_selected(&mut self) {
        let Some((kind, id)) = self.selected_key() else {
            return;
        };
        let editor = self
            .entries
            .entry((kind, id))
            .or_insert_with(|| EntryEditor::new(id, kind));
        if editor.begin_edit(&self.ledger) {
            self.edit_field = EditField::Name;
        }
    }

    pub fn save_selected(&mut self) {
        let Some(key) = self.selected_key() else {
            return;
        };
        let Some(mut editor) = self.entries.remove(&key) else {
            return;
        };
        let result = editor.save(&mut self.ledger);
        self.entries.insert(key, editor);

        if let Err(err) = result {
            self.notice = Some(format!("Please enter a valid {}: {}.", key.0.as_str(), err));
        }
        self.prune_entries();
    }

    pub fn cancel_selected(&mut self) {
        if let Some(editor) = self.selected_entry_mut() {
            editor.cancel();
        }
    }

    pub fn remove_selected(&mut self) {
        let Some((kind, id)) = self.selected_key() else {
            return;
        };
        EntryEditor::new(id, kind).remove(&mut self.ledger);
        self.prune_entries();
    }

    // ========================================================================
    // KEY HANDLING
    // ========================================================================

    /// Apply one key press. Returns true when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.notice.take().is_some() {
            return false;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        if self.focus == Focus::Records && self.selected_is_editing() {
            self.handle_edit_key(key);
            return false;
        }

        match key.code {
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return false;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.previous();
                return false;
            }
            _ => {}
        }

        match self.focus {
            Focus::Records => return self.handle_list_key(key),
            Focus::ExpenseCategory => match key.code {
                KeyCode::Right | KeyCode::Char(' ') => {
                    self.expense_form.category = Category::cycle_next(self.expense_form.category)
                }
                KeyCode::Left => {
                    self.expense_form.category =
                        Category::cycle_previous(self.expense_form.category)
                }
                KeyCode::Backspace => self.expense_form.category = None,
                KeyCode::Enter => self.submit_expense(),
                KeyCode::Esc => self.focus = Focus::Records,
                _ => {}
            },
            focus => match key.code {
                KeyCode::Enter if focus.is_expense_form() => self.submit_expense(),
                KeyCode::Enter => self.submit_income(),
                KeyCode::Esc => self.focus = Focus::Records,
                code => {
                    let field = match focus {
                        Focus::ExpenseName => &mut self.expense_form.name,
                        Focus::ExpenseAmount => &mut self.expense_form.amount,
                        Focus::IncomeName => &mut self.income_form.name,
                        _ => &mut self.income_form.amount,
                    };
                    match code {
                        KeyCode::Char(c) => field.push(c),
                        KeyCode::Backspace => {
                            field.pop();
                        }
                        _ => {}
                    }
                }
            },
        }
        false
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Home => self.clamp_home(),
            KeyCode::End => {
                let len = self.rows().len();
                if len > 0 {
                    self.state.select(Some(len - 1));
                }
            }
            KeyCode::Char('e') | KeyCode::Enter => self.edit_selected(),
            KeyCode::Char('d') | KeyCode::Delete => self.remove_selected(),
            KeyCode::Char('1') => self.apply_filter(ListFilter::All),
            KeyCode::Char('2') => self.apply_filter(ListFilter::Expenses),
            KeyCode::Char('3') => self.apply_filter(ListFilter::Incomes),
            _ => {}
        }
        false
    }

    fn clamp_home(&mut self) {
        if !self.rows().is_empty() {
            self.state.select(Some(0));
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        let field = self.edit_field;
        match key.code {
            KeyCode::Enter => return self.save_selected(),
            KeyCode::Esc => return self.cancel_selected(),
            KeyCode::Up => return self.previous(),
            KeyCode::Down => return self.next(),
            KeyCode::Tab => {
                if let Some((kind, _)) = self.selected_key() {
                    self.edit_field = field.next(kind);
                }
                return;
            }
            _ => {}
        }

        let Some(draft) = self.selected_entry_mut().and_then(|e| e.draft_mut()) else {
            return;
        };
        match (field, key.code) {
            (EditField::Category, KeyCode::Right) | (EditField::Category, KeyCode::Char(' ')) => {
                draft.category = Category::cycle_next(draft.category)
            }
            (EditField::Category, KeyCode::Left) => {
                draft.category = Category::cycle_previous(draft.category)
            }
            (EditField::Category, KeyCode::Backspace) => draft.category = None,
            (EditField::Name, KeyCode::Char(c)) => draft.name.push(c),
            (EditField::Name, KeyCode::Backspace) => {
                draft.name.pop();
            }
            (EditField::Amount, KeyCode::Char(c)) => draft.amount.push(c),
            (EditField::Amount, KeyCode::Backspace) => {
                draft.amount.pop();
            }
            _ => {}
        }
    }
}

pub fn run_ui<S: KeyValueStore>(app: &mut App<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            debug!(code = ?key.code, focus = ?app.focus, "key");
            if app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

pub fn ui<S: KeyValueStore>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Forms + ledger
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
        .split(chunks[1]);

    let forms = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(5),
            Constraint::Min(0),
        ])
        .split(body[0]);

    render_expense_form(f, forms[0], app);
    render_income_form(f, forms[1], app);

    let ledger_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(body[1]);

    render_summary(f, ledger_area[0], app);
    render_records(f, ledger_area[1], app);

    render_status_bar(f, chunks[2], app);

    if let Some(notice) = &app.notice {
        let area = f.size();
        render_notice(f, area, notice);
    }
}

fn render_header<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let spans = vec![
        Span::styled(
            "Budget Tracker",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("↓ {} expenses", app.ledger.expenses().len()),
            Style::default().fg(Color::Red),
        ),
        Span::raw("  "),
        Span::styled(
            format!("↑ {} incomes", app.ledger.incomes().len()),
            Style::default().fg(Color::Green),
        ),
    ];
    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(header, area);
}

fn field_line<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let value_style = if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let marker = if focused { "▏" } else { "" };
    Line::from(vec![
        Span::styled(format!(" {:<10}", label), Style::default().fg(Color::Cyan)),
        Span::styled(value, value_style),
        Span::styled(marker, Style::default().fg(Color::Yellow)),
    ])
}

fn category_text(category: Option<Category>) -> String {
    match category {
        Some(c) => format!("◀ {} ▶", c.as_str()),
        None => "◀ Select Category ▶".to_string(),
    }
}

fn form_block(title: &str, active: bool) -> Block<'_> {
    let color = if active { Color::Yellow } else { Color::White };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
}

fn render_expense_form<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let form = &app.expense_form;
    let lines = vec![
        field_line("Name", form.name.clone(), app.focus == Focus::ExpenseName),
        field_line(
            "Category",
            category_text(form.category),
            app.focus == Focus::ExpenseCategory,
        ),
        field_line("Amount", form.amount.clone(), app.focus == Focus::ExpenseAmount),
        Line::from(Span::styled(
            " Enter: Add Expense",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];
    let paragraph =
        Paragraph::new(lines).block(form_block(" Expenses ", app.focus.is_expense_form()));
    f.render_widget(paragraph, area);
}

fn render_income_form<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let form = &app.income_form;
    let lines = vec![
        field_line("Name", form.name.clone(), app.focus == Focus::IncomeName),
        field_line("Amount", form.amount.clone(), app.focus == Focus::IncomeAmount),
        Line::from(Span::styled(
            " Enter: Add Income",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];
    let paragraph =
        Paragraph::new(lines).block(form_block(" Incomes ", app.focus.is_income_form()));
    f.render_widget(paragraph, area);
}

fn render_summary<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let totals = app.ledger.totals();
    let net_color = if totals.net < 0.0 { Color::Red } else { Color::Green };
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let content = vec![
        Line::from(vec![
            Span::styled(" Total Expense: ", label),
            Span::styled(
                format_money(&app.currency, totals.expense),
                Style::default().fg(Color::Red),
            ),
        ]),
        Line::from(vec![
            Span::styled(" Total Income:  ", label),
            Span::styled(
                format_money(&app.currency, totals.income),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(vec![
            Span::styled(" Net Balance:   ", label),
            Span::styled(
                format_money(&app.currency, totals.net),
                Style::default().fg(net_color).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];
    let summary = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Summary "),
    );
    f.render_widget(summary, area);
}

fn render_records<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let header_cells = ["Type", "Name", "Category", "Amount"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let view: &App<S> = app;
    let selected = view.selected_key();
    let rows: Vec<Row> = view
        .rows()
        .into_iter()
        .filter_map(|key| record_row(view, key, selected == Some(key)))
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Min(16),
            Constraint::Length(22),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if app.focus == Focus::Records {
                Color::Yellow
            } else {
                Color::White
            }))
            .title(format!(" Ledger ({}) ", app.filter.title())),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn record_row<S: KeyValueStore>(
    app: &App<S>,
    key: EntryKey,
    selected: bool,
) -> Option<Row<'static>> {
    let (kind, id) = key;
    let (kind_cell, color) = match kind {
        RecordKind::Expense => ("Expense", Color::Red),
        RecordKind::Income => ("Income", Color::Green),
    };

    if let EntryState::Editing(draft) = app.entry_state(key) {
        let cursor = |field: EditField| selected && app.edit_field == field;
        let edit = |text: String, active: bool| {
            let style = if active {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default().fg(Color::Yellow)
            };
            Cell::from(format!("[{}]", text)).style(style)
        };
        let category = match kind {
            RecordKind::Expense => edit(category_text(draft.category), cursor(EditField::Category)),
            RecordKind::Income => Cell::from(""),
        };
        return Some(Row::new(vec![
            Cell::from(kind_cell).style(Style::default().fg(color)),
            edit(draft.name.clone(), cursor(EditField::Name)),
            category,
            edit(draft.amount.clone(), cursor(EditField::Amount)),
        ]));
    }

    let (name, category, amount) = match kind {
        RecordKind::Expense => {
            let e = app.ledger.expenses().iter().find(|e| e.id == id)?;
            (
                e.name.clone(),
                e.category.map(|c| c.as_str()).unwrap_or("").to_string(),
                e.amount,
            )
        }
        RecordKind::Income => {
            let i = app.ledger.incomes().iter().find(|i| i.id == id)?;
            (i.name.clone(), String::new(), i.amount)
        }
    };

    Some(Row::new(vec![
        Cell::from(kind_cell).style(Style::default().fg(color)),
        Cell::from(truncate(&name, 40)),
        Cell::from(category),
        Cell::from(format_money(&app.currency, amount)).style(Style::default().fg(color)),
    ]))
}

fn render_status_bar<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let key = Style::default().fg(Color::Yellow);
    let hints: &[(&str, &str)] = if app.focus == Focus::Records && app.selected_is_editing() {
        &[
            ("Tab", " Field | "),
            ("←/→", " Category | "),
            ("Enter", " Save | "),
            ("Esc", " Cancel"),
        ]
    } else if app.focus == Focus::Records {
        &[
            ("↑/↓", " Nav | "),
            ("e", " Edit | "),
            ("d", " Remove | "),
            ("1-3", " Filter | "),
            ("Tab", " Forms | "),
            ("q", " Quit"),
        ]
    } else {
        &[
            ("Tab", " Next field | "),
            ("←/→", " Category | "),
            ("Enter", " Add | "),
            ("Esc", " Ledger | "),
            ("Ctrl-C", " Quit"),
        ]
    };

    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let mut spans = vec![
        Span::styled(
            format!(" Row: {}/{} ", selected, app.rows().len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
    ];
    for (k, label) in hints {
        spans.push(Span::styled(*k, key));
        spans.push(Span::raw(*label));
    }

    let status_bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(status_bar, area);
}

fn render_notice(f: &mut Frame, area: Rect, message: &str) {
    let chars = u16::try_from(message.chars().count()).unwrap_or(u16::MAX);
    let width = chars.saturating_add(4).max(30).min(area.width);
    let height = 5u16.min(area.height);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };

    let content = vec![
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::White))),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];
    let paragraph = Paragraph::new(content).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Invalid entry "),
    );
    f.render_widget(Clear, popup);
    f.render_widget(paragraph, popup);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use ratatui::backend::TestBackend;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text<S: KeyValueStore>(app: &mut App<S>, text: &str) {
        for c in text.chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
    }

    fn new_app() -> App<MemoryStore> {
        App::new(Ledger::load(MemoryStore::new()), "$".to_string())
    }

    fn screen(app: &mut App<MemoryStore>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer.get(x, y).symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_focus_cycle() {
        let mut focus = Focus::ExpenseName;
        for _ in 0..6 {
            focus = focus.next();
        }
        assert_eq!(focus, Focus::ExpenseName);
        assert_eq!(Focus::ExpenseName.previous(), Focus::Records);
    }

    #[test]
    fn test_add_expense_through_keys() {
        let mut app = new_app();
        type_text(&mut app, "Coffee");
        app.handle_key(press(KeyCode::Tab));
        app.handle_key(press(KeyCode::Right));
        app.handle_key(press(KeyCode::Tab));
        type_text(&mut app, "4.50");
        app.handle_key(press(KeyCode::Enter));

        assert_eq!(app.notice, None);
        assert_eq!(app.ledger.expenses().len(), 1);
        assert_eq!(app.ledger.expenses()[0].category, Some(Category::Food));
        assert_eq!(app.expense_form, ExpenseForm::default());
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_invalid_expense_shows_notice_and_keeps_fields() {
        let mut app = new_app();
        type_text(&mut app, "Coffee");
        app.handle_key(press(KeyCode::Enter));

        assert!(app.notice.as_deref().unwrap().contains("valid expense"));
        assert_eq!(app.expense_form.name, "Coffee");
        assert!(app.ledger.expenses().is_empty());

        // Any key dismisses without being typed
        app.handle_key(press(KeyCode::Char('x')));
        assert_eq!(app.notice, None);
        assert_eq!(app.expense_form.name, "Coffee");
    }

    #[test]
    fn test_add_income_through_keys() {
        let mut app = new_app();
        app.focus = Focus::IncomeName;
        type_text(&mut app, "Salary");
        app.handle_key(press(KeyCode::Tab));
        type_text(&mut app, "2000");
        app.handle_key(press(KeyCode::Enter));

        assert_eq!(app.ledger.incomes().len(), 1);
        assert!(app.ledger.expenses().is_empty());
        assert_eq!(app.income_form, IncomeForm::default());
    }

    #[test]
    fn test_edit_and_save_selected() {
        let mut ledger = Ledger::load(MemoryStore::new());
        let id = ledger.add_expense("Coffee", Some(Category::Food), "4.50").unwrap();
        let mut app = App::new(ledger, "$".to_string());
        app.focus = Focus::Records;

        app.handle_key(press(KeyCode::Char('e')));
        assert!(app.selected_is_editing());

        app.handle_key(press(KeyCode::Tab)); // category
        app.handle_key(press(KeyCode::Tab)); // amount
        for _ in 0..3 {
            app.handle_key(press(KeyCode::Backspace));
        }
        type_text(&mut app, "9.99");
        app.handle_key(press(KeyCode::Enter));

        assert!(!app.selected_is_editing());
        assert_eq!(app.ledger.expenses()[0].id, id);
        assert_eq!(app.ledger.expenses()[0].amount, 9.99);
    }

    #[test]
    fn test_invalid_save_keeps_editing() {
        let mut ledger = Ledger::load(MemoryStore::new());
        ledger.add_income("Salary", "2000").unwrap();
        let mut app = App::new(ledger, "$".to_string());
        app.focus = Focus::Records;

        app.handle_key(press(KeyCode::Enter));
        app.handle_key(press(KeyCode::Tab)); // income skips category
        assert_eq!(app.edit_field, EditField::Amount);
        type_text(&mut app, "x");
        app.handle_key(press(KeyCode::Enter));

        assert!(app.notice.is_some());
        assert!(app.selected_is_editing());
        assert_eq!(app.ledger.incomes()[0].amount, 2000.0);

        app.handle_key(press(KeyCode::Char(' '))); // dismiss
        app.handle_key(press(KeyCode::Esc));
        assert!(!app.selected_is_editing());
    }

    #[test]
    fn test_remove_selected_prunes_state() {
        let mut ledger = Ledger::load(MemoryStore::new());
        ledger.add_expense("Coffee", Some(Category::Food), "4.50").unwrap();
        ledger.add_income("Salary", "2000").unwrap();
        let mut app = App::new(ledger, "$".to_string());
        app.focus = Focus::Records;
        app.handle_key(press(KeyCode::Char('e')));
        app.handle_key(press(KeyCode::Esc));
        assert_eq!(app.entries.len(), 1);

        app.handle_key(press(KeyCode::Char('d')));

        assert!(app.ledger.expenses().is_empty());
        assert_eq!(app.ledger.incomes().len(), 1);
        assert!(app.entries.is_empty());
        assert_eq!(app.selected_key().map(|k| k.0), Some(RecordKind::Income));
    }

    #[test]
    fn test_filter_rows() {
        let mut ledger = Ledger::load(MemoryStore::new());
        ledger.add_income("Salary", "2000").unwrap();
        ledger.add_expense("Coffee", Some(Category::Food), "4.50").unwrap();
        let mut app = App::new(ledger, "$".to_string());

        let all = app.rows();
        assert_eq!(all[0].0, RecordKind::Expense);
        assert_eq!(all[1].0, RecordKind::Income);

        app.apply_filter(ListFilter::Incomes);
        assert_eq!(app.rows().len(), 1);
        assert_eq!(app.rows()[0].0, RecordKind::Income);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = new_app();
        // 'q' is just text inside a form
        assert!(!app.handle_key(press(KeyCode::Char('q'))));
        assert_eq!(app.expense_form.name, "q");

        assert!(app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));

        app.focus = Focus::Records;
        assert!(app.handle_key(press(KeyCode::Char('q'))));
    }

    #[test]
    fn test_render_summary_and_rows() {
        let mut ledger = Ledger::load(MemoryStore::new());
        ledger.add_expense("Coffee", Some(Category::Food), "4.50").unwrap();
        ledger.add_income("Salary", "2000").unwrap();
        let mut app = App::new(ledger, "$".to_string());

        let text = screen(&mut app);

        assert!(text.contains("Total Expense: $4.50"));
        assert!(text.contains("Total Income:  $2000.00"));
        assert!(text.contains("Net Balance:   $1995.50"));
        assert!(text.contains("Coffee"));
        assert!(text.contains("Salary"));
    }

    #[test]
    fn test_render_notice() {
        let mut app = new_app();
        app.handle_key(press(KeyCode::Enter));
        let text = screen(&mut app);
        assert!(text.contains("Invalid entry"));
    }

    #[test]
    fn test_render_notice_with_huge_message() {
        let mut app = new_app();
        app.notice = Some(format!("Please enter a valid expense: {}", "9".repeat(70_000)));
        let text = screen(&mut app);
        assert!(text.contains("Invalid entry"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long expense name", 10), "a long ...");
    }
}
