use anyhow::Result;
use customer_statement::{Statement, StatementRow};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use rust_decimal::Decimal;
use std::io;

const PAGE_SIZE: usize = 20;

pub struct App {
    pub statement: Statement,
    pub state: TableState,
    pub show_aging: bool,
}

impl App {
    pub fn new(statement: Statement) -> Self {
        let mut state = TableState::default();
        if !statement.rows.is_empty() {
            state.select(Some(0));
        }

        App {
            statement,
            state,
            show_aging: true,
        }
    }

    pub fn toggle_aging(&mut self) {
        self.show_aging = !self.show_aging;
    }

    pub fn selected_row(&self) -> Option<&StatementRow> {
        self.state.selected().and_then(|i| self.statement.rows.get(i))
    }

    pub fn next(&mut self) {
        let len = self.statement.rows.len();
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
        let len = self.statement.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.statement.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + PAGE_SIZE).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = match self.state.selected() {
            Some(i) => i.saturating_sub(PAGE_SIZE),
            None => 0,
        };
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
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

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('a') => app.toggle_aging(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.state.select(Some(0)),
                KeyCode::End => {
                    let len = app.statement.rows.len();
                    if len > 0 {
                        app.state.select(Some(len - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Customer + range
            Constraint::Min(0),    // Rows
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_aging {
        let content = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(chunks[1]);

        render_table(f, content[0], app);
        render_aging(f, content[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let statement = &app.statement;

    let title = Line::from(vec![
        Span::styled(
            statement.customer.display_name.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(statement.date_range.to_string(), Style::default().fg(Color::White)),
        Span::raw("  |  "),
        Span::styled(
            format!("Statement #{}", statement.statement_id),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let address = statement
        .customer
        .address
        .as_ref()
        .map(|a| a.lines().join(", "))
        .unwrap_or_else(|| "No address on file".to_string());

    let header = Paragraph::new(vec![title, Line::from(Span::raw(address))])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn amount_color(amount: Decimal) -> Color {
    if amount > Decimal::ZERO {
        Color::Red
    } else if amount < Decimal::ZERO {
        Color::Green
    } else {
        Color::White
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Date", "Description", "Amount", "Balance"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });

    let header = Row::new(header_cells).style(Style::default().bg(Color::DarkGray)).height(1);

    let rows = app.statement.rows.iter().map(|row| {
        let style = if row.is_balance_forward() {
            Style::default().add_modifier(Modifier::ITALIC)
        } else {
            Style::default()
        };

        let cells = vec![
            Cell::from(row.date.to_string()),
            Cell::from(truncate(&row.description, 40)),
            Cell::from(format!("{:.2}", row.amount)).style(Style::default().fg(amount_color(row.amount))),
            Cell::from(format!("{:.2}", row.running_balance)),
        ];

        Row::new(cells).style(style).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(42),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Statement "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_aging(f: &mut Frame, area: Rect, app: &App) {
    let aging = &app.statement.aging;
    let line = |label: &str, amount: Decimal| {
        Line::from(vec![
            Span::styled(format!("{:<10}", label), Style::default().fg(Color::Cyan)),
            Span::raw(format!("{:>14.2}", amount)),
        ])
    };

    let text = vec![
        line("Current", aging.current),
        line("1-30", aging.days_1_30),
        line("31-60", aging.days_31_60),
        line("61-90", aging.days_61_90),
        line("90+", aging.over_90),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{:<10}", "Total Due"), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("{:>14.2}", aging.total_due),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{:<10}", "Opening"), Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{:>14.2}", app.statement.opening_balance)),
        ]),
        Line::from(vec![
            Span::styled(format!("{:<10}", "Ending"), Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{:>14.2}", app.statement.ending_balance)),
        ]),
    ];

    let panel = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" Aging as of {} ", app.statement.date_range.end)),
    );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.statement.rows.len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(row) = app.selected_row() {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::raw(truncate(&row.description, 30)));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("a", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Aging | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Fast | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
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
    use chrono::NaiveDate;
    use customer_statement::{AgingBuckets, CustomerInfo, DateRange, RowKind};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_app(movements: usize) -> App {
        let mut rows = vec![StatementRow::balance_forward(date(2025, 1, 1), "Balance Forward", dec!(0))];
        for i in 0..movements {
            rows.push(StatementRow {
                date: date(2025, 1, 2),
                description: format!("Invoice #INV-{}", i),
                amount: dec!(10),
                running_balance: Decimal::from(10 * (i as i64 + 1)),
                kind: RowKind::Movement,
            });
        }

        App::new(Statement {
            customer: CustomerInfo {
                identifier: "ACME".to_string(),
                display_name: "Acme Corporation".to_string(),
                address: None,
            },
            rows,
            opening_balance: dec!(0),
            ending_balance: Decimal::from(10 * movements as i64),
            aging: AgingBuckets::default(),
            statement_id: "abc123".to_string(),
            statement_date: date(2025, 2, 1),
            date_range: DateRange { start: date(2025, 1, 1), end: date(2025, 1, 31) },
        })
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = create_test_app(2);
        assert_eq!(app.state.selected(), Some(0));

        app.previous();
        assert_eq!(app.state.selected(), Some(2));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
        assert!(app.selected_row().unwrap().is_balance_forward());
    }

    #[test]
    fn test_paging_clamps() {
        let mut app = create_test_app(30);

        app.page_down();
        assert_eq!(app.state.selected(), Some(20));
        app.page_down();
        assert_eq!(app.state.selected(), Some(30));
        app.page_up();
        app.page_up();
        assert_eq!(app.state.selected(), Some(0));

        println!("✅ Statement viewer navigation test passed");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Payment #PAY-000001", 10), "Payment...");
    }
}
