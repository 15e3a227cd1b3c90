use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use hunt_analyzer::export::{format_rate, group_thousands};
use hunt_analyzer::{
    aggregate_by_zone, find_pending, load_library, sort_zones, AggregatedZone, FilterOptions,
    HuntRecord, LibraryStats, Mode, PendingRow, Vocation, ZoneColumn, ZoneFilter,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Zones,
    Pending,
    Stats,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Zones => Page::Pending,
            Page::Pending => Page::Stats,
            Page::Stats => Page::Zones,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Zones => Page::Stats,
            Page::Pending => Page::Zones,
            Page::Stats => Page::Pending,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Zones => "Zones",
            Page::Pending => "Pending",
            Page::Stats => "Stats",
        }
    }
}

/// Next value in `None → choices[0] → … → choices[n-1] → None`
fn cycle(current: Option<&str>, choices: &[String]) -> Option<String> {
    match current.and_then(|c| choices.iter().position(|x| x == c)) {
        None if current.is_none() => choices.first().cloned(),
        None => None,
        Some(i) => choices.get(i + 1).cloned(),
    }
}

pub struct App {
    pub records: Vec<HuntRecord>,
    pub library: PathBuf,
    pub filter: ZoneFilter,
    pub options: FilterOptions,
    pub zones: Vec<AggregatedZone>,
    pub pending: Vec<PendingRow>,
    pub stats: LibraryStats,
    pub state: TableState,
    pub pending_state: TableState,
    pub current_page: Page,
    pub sort_column: ZoneColumn,
    pub descending: bool,
    pub hilo: bool,
    pub show_detail: bool,
}

impl App {
    pub fn new(records: Vec<HuntRecord>, library: PathBuf, filter: ZoneFilter) -> Self {
        let mut app = Self {
            records,
            library,
            filter,
            options: FilterOptions::default(),
            zones: Vec::new(),
            pending: Vec::new(),
            stats: LibraryStats::default(),
            state: TableState::default(),
            pending_state: TableState::default(),
            current_page: Page::Zones,
            sort_column: ZoneColumn::BalancePerHour,
            descending: true,
            hilo: false,
            show_detail: false,
        };
        app.refresh();
        app
    }

    /// Recompute every derived view from `records`
    pub fn refresh(&mut self) {
        self.options = FilterOptions::from_records(&self.records);
        self.pending = find_pending(&self.records);
        self.stats = LibraryStats::from_records(&self.records);
        self.recompute_zones();
        reset_selection(&mut self.pending_state, self.pending.len());
    }

    /// Re-read the library from disk
    pub fn reload(&mut self) {
        self.records = load_library(&self.library);
        self.refresh();
    }

    fn recompute_zones(&mut self) {
        self.zones = aggregate_by_zone(&self.records, &self.filter);
        sort_zones(&mut self.zones, self.sort_column, self.descending);
        reset_selection(&mut self.state, self.zones.len());
    }

    pub fn cycle_vocation(&mut self) {
        let choices: Vec<String> = Vocation::ALL.iter().map(|v| v.as_str().to_string()).collect();
        self.filter.vocation = cycle(self.filter.vocation(), &choices);
        self.recompute_zones();
    }

    pub fn cycle_mode(&mut self) {
        let choices: Vec<String> = Mode::ALL.iter().map(|m| m.as_str().to_string()).collect();
        self.filter.mode = cycle(self.filter.mode(), &choices);
        self.recompute_zones();
    }

    pub fn cycle_level(&mut self) {
        self.filter.level = cycle(self.filter.level(), &self.options.levels);
        self.recompute_zones();
    }

    pub fn clear_filters(&mut self) {
        self.filter = ZoneFilter::default();
        self.recompute_zones();
    }

    pub fn next_sort_column(&mut self) {
        self.sort_column = self.sort_column.next();
        self.recompute_zones();
    }

    pub fn toggle_sort_order(&mut self) {
        self.descending = !self.descending;
        self.recompute_zones();
    }

    pub fn toggle_hilo(&mut self) {
        self.hilo = !self.hilo;
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn selected_zone(&self) -> Option<&AggregatedZone> {
        self.state.selected().and_then(|i| self.zones.get(i))
    }

    pub fn selected_pending(&self) -> Option<&PendingRow> {
        self.pending_state.selected().and_then(|i| self.pending.get(i))
    }

    /// Table state and row count of the page being shown
    fn active_table(&mut self) -> Option<(&mut TableState, usize)> {
        match self.current_page {
            Page::Zones => Some((&mut self.state, self.zones.len())),
            Page::Pending => Some((&mut self.pending_state, self.pending.len())),
            Page::Stats => None,
        }
    }

    pub fn next(&mut self) {
        self.move_selection(|i, len| if i >= len - 1 { 0 } else { i + 1 });
    }

    pub fn previous(&mut self) {
        self.move_selection(|i, len| if i == 0 { len - 1 } else { i - 1 });
    }

    pub fn page_down(&mut self) {
        self.move_selection(|i, len| (i + 20).min(len - 1));
    }

    pub fn page_up(&mut self) {
        self.move_selection(|i, _| i.saturating_sub(20));
    }

    pub fn first(&mut self) {
        self.move_selection(|_, _| 0);
    }

    pub fn last(&mut self) {
        self.move_selection(|_, len| len - 1);
    }

    fn move_selection(&mut self, step: impl Fn(usize, usize) -> usize) {
        let Some((state, len)) = self.active_table() else {
            return;
        };
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) => step(i, len),
            None => 0,
        };
        state.select(Some(i));
    }
}

fn reset_selection(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else {
        state.select(Some(0));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
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

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => app.next_page(),
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('v') => app.cycle_vocation(),
                KeyCode::Char('m') => app.cycle_mode(),
                KeyCode::Char('l') => app.cycle_level(),
                KeyCode::Char('c') => app.clear_filters(),
                KeyCode::Char('s') => app.next_sort_column(),
                KeyCode::Char('o') => app.toggle_sort_order(),
                KeyCode::Char('h') => app.toggle_hilo(),
                KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    app.reload()
                }
                KeyCode::Char('R') => app.reload(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.first(),
                KeyCode::End => app.last(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail && app.current_page != Page::Stats {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_page(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_page(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_page(f: &mut Frame, area: Rect, app: &mut App) {
    match app.current_page {
        Page::Zones => render_zones_table(f, area, app),
        Page::Pending => render_pending_table(f, area, app),
        Page::Stats => render_stats(f, area, app),
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Zones, Page::Pending, Page::Stats];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Hunts: {}", app.stats.total),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("✓ {}", app.stats.complete),
        Style::default().fg(Color::Green),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("⚠ {}", app.pending.len()),
        Style::default().fg(Color::Red),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn header_row<'a>(titles: impl IntoIterator<Item = String>) -> Row<'a> {
    let cells = titles.into_iter().map(|h| {
        Cell::from(h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn render_zones_table(f: &mut Frame, area: Rect, app: &mut App) {
    let arrow = if app.descending { "▼" } else { "▲" };
    let header = header_row(ZoneColumn::ALL.iter().map(|col| {
        if *col == app.sort_column {
            format!("{} {}", col.title(), arrow)
        } else {
            col.title().to_string()
        }
    }));

    let hilo = app.hilo;
    let rows = app.zones.iter().map(|z| {
        let balance_color = if z.balance_per_h.mean < 0.0 {
            Color::Red
        } else {
            Color::Green
        };

        let cells = vec![
            Cell::from(truncate(&z.zone, 28)),
            Cell::from(z.hunt_count.to_string()),
            Cell::from(format!("{:.2}", z.total_hours)),
            Cell::from(format_rate(&z.xp_gain_per_h, hilo)),
            Cell::from(format_rate(&z.raw_xp_gain_per_h, hilo)),
            Cell::from(format_rate(&z.supplies_per_h, hilo)),
            Cell::from(format_rate(&z.loot_per_h, hilo)),
            Cell::from(format_rate(&z.balance_per_h, hilo))
                .style(Style::default().fg(balance_color)),
        ];

        Row::new(cells).height(1)
    });

    let rate_width = if hilo { 30 } else { 12 };
    let table = Table::new(
        rows,
        [
            Constraint::Length(30),
            Constraint::Length(8),
            Constraint::Length(9),
            Constraint::Length(rate_width),
            Constraint::Length(rate_width),
            Constraint::Length(rate_width),
            Constraint::Length(rate_width),
            Constraint::Length(rate_width),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Zones ({}) ", app.zones.len())),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_pending_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(
        ["File", "Vocation", "Mode", "Duo", "Zone", "Level", "Issues"]
            .iter()
            .map(|h| h.to_string()),
    );

    let rows = app.pending.iter().map(|row| {
        let file = std::path::Path::new(&row.source_id)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| row.source_id.clone());

        let cells = vec![
            Cell::from(truncate(&file, 30)),
            Cell::from(row.vocation.clone()),
            Cell::from(row.mode.clone()),
            Cell::from(row.vocation_duo.clone()),
            Cell::from(truncate(&row.zone, 20)),
            Cell::from(row.level.clone()),
            Cell::from(row.issues.len().to_string()).style(Style::default().fg(Color::Red)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(22),
            Constraint::Length(9),
            Constraint::Length(7),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Pending ({}) ", app.pending.len())),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.pending_state);
}

fn render_stats(f: &mut Frame, area: Rect, app: &App) {
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let section = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Library: ", label),
            Span::raw(app.stats.summary()),
        ]),
        Line::from(""),
        Line::from(Span::styled("  BY VOCATION", section)),
    ];
    for (vocation, count) in &app.stats.by_vocation {
        content.push(Line::from(format!("    {:<12} {:>6}", vocation, count)));
    }
    content.push(Line::from(""));
    content.push(Line::from(Span::styled("  BY MODE", section)));
    for (mode, count) in &app.stats.by_mode {
        content.push(Line::from(format!("    {:<12} {:>6}", mode, count)));
    }
    content.push(Line::from(""));
    content.push(Line::from(Span::styled("  BY LEVEL", section)));
    for (level, count) in app.stats.by_level.iter().filter(|(_, c)| **c > 0) {
        content.push(Line::from(format!("    {:<12} {:>6}", level, count)));
    }

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Library Stats "),
    );

    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let (selected, total) = match app.current_page {
        Page::Zones => (app.state.selected(), app.zones.len()),
        Page::Pending => (app.pending_state.selected(), app.pending.len()),
        Page::Stats => (None, 0),
    };
    let selected = selected.map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled(
        format!(
            "{} · {} · {}",
            app.filter.vocation().unwrap_or("any vocation"),
            app.filter.mode().unwrap_or("any mode"),
            app.filter.level().unwrap_or("All levels"),
        ),
        Style::default().fg(Color::Green),
    ));

    let keys = [
        ("v/m/l", " Filter | "),
        ("c", " Clear | "),
        ("s/o", " Sort | "),
        ("h", " Hi-Lo | "),
        ("R", " Reload | "),
        ("Tab", " Page | "),
        ("Enter", " Details | "),
    ];
    status_spans.push(Span::raw(" | "));
    for (key, label) in keys {
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let (title, content) = match app.current_page {
        Page::Zones => (" Zone Details ", zone_detail_lines(app.selected_zone())),
        _ => (" Pending Issues ", pending_detail_lines(app.selected_pending())),
    };

    let detail_panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title),
    );

    f.render_widget(detail_panel, area);
}

fn zone_detail_lines(zone: Option<&AggregatedZone>) -> Vec<Line<'static>> {
    let Some(z) = zone else {
        return vec![Line::from("No zone selected")];
    };
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Zone: ", label),
            Span::raw(z.zone.clone()),
        ]),
        Line::from(vec![
            Span::styled("  Hunts: ", label),
            Span::raw(z.hunt_count.to_string()),
            Span::styled("   Hours: ", label),
            Span::raw(format!("{:.2}", z.total_hours)),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(Span::styled(
            "  PER HOUR          mean      min      max",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
    ];

    let metrics = [
        ("XP", &z.xp_gain_per_h),
        ("Raw XP", &z.raw_xp_gain_per_h),
        ("Supplies", &z.supplies_per_h),
        ("Loot", &z.loot_per_h),
        ("Balance", &z.balance_per_h),
    ];
    for (name, stats) in metrics {
        lines.push(Line::from(format!(
            "  {:<10} {:>12} {:>12} {:>12}",
            name,
            group_thousands(stats.mean.round() as i64),
            group_thousands(stats.min.round() as i64),
            group_thousands(stats.max.round() as i64),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Press Enter to close",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));
    lines
}

fn pending_detail_lines(row: Option<&PendingRow>) -> Vec<Line<'static>> {
    let Some(row) = row else {
        return vec![Line::from("No hunt selected")];
    };
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  File: ", label),
            Span::raw(row.source_id.clone()),
        ]),
        Line::from(vec![
            Span::styled("  Balance Real: ", label),
            Span::raw(
                row.balance_real
                    .map(group_thousands)
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]),
        Line::from(""),
    ];

    for issue in &row.issues {
        lines.push(Line::from(vec![
            Span::styled("  ⚠ ", Style::default().fg(Color::Red)),
            Span::raw(wrap_text(issue.message(), 35)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Fix with: hunt-analyzer set-meta <file> ...",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));
    lines
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn wrap_text(text: &str, width: usize) -> String {
    if text.len() <= width {
        return text.to_string();
    }

    let mut result = String::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.len() + word.len() < width {
            if !current_line.is_empty() {
                current_line.push(' ');
            }
            current_line.push_str(word);
        } else {
            if !result.is_empty() {
                result.push_str("\n    ");
            }
            result.push_str(&current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        if !result.is_empty() {
            result.push_str("\n    ");
        }
        result.push_str(&current_line);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use hunt_analyzer::normalize;
    use serde_json::json;

    fn record(zone: &str, vocation: &str, mode: &str, duo: &str) -> HuntRecord {
        let raw = json!({
            "Vocation": vocation, "Mode": mode, "Vocation duo": duo,
            "Zona": zone, "Level": "301-350", "Session length": "1:00h",
            "Balance Real": "1,000"
        });
        normalize(&format!("{}.json", zone), raw.as_object().unwrap())
    }

    fn app() -> App {
        App::new(
            vec![
                record("Issavi", "Knight", "Solo", "none"),
                record("Roshamuul", "Druid", "Duo", "Knight"),
                record("Broken", "Knight", "Solo", "Druid"),
            ],
            PathBuf::from("/tmp/unused"),
            ZoneFilter::default(),
        )
    }

    #[test]
    fn test_cycle_choices() {
        let choices = vec!["a".to_string(), "b".to_string()];
        assert_eq!(cycle(None, &choices), Some("a".to_string()));
        assert_eq!(cycle(Some("a"), &choices), Some("b".to_string()));
        assert_eq!(cycle(Some("b"), &choices), None);
        assert_eq!(cycle(Some("zzz"), &choices), None);
    }

    #[test]
    fn test_app_views() {
        let mut app = app();
        assert_eq!(app.zones.len(), 2);
        assert_eq!(app.pending.len(), 1);
        assert_eq!(app.stats.total, 3);

        app.cycle_vocation(); // Knight
        assert_eq!(app.filter.vocation.as_deref(), Some("Knight"));
        assert_eq!(app.zones.len(), 1);

        app.cycle_mode(); // Solo
        app.cycle_mode(); // Duo
        assert!(app.zones.is_empty());
        assert_eq!(app.state.selected(), None);

        app.clear_filters();
        assert_eq!(app.zones.len(), 2);
    }

    #[test]
    fn test_navigation_wraps_per_page() {
        let mut app = app();
        assert_eq!(app.state.selected(), Some(0));
        app.next();
        app.next();
        assert_eq!(app.state.selected(), Some(0));
        app.previous();
        assert_eq!(app.state.selected(), Some(1));

        app.next_page();
        assert_eq!(app.current_page, Page::Pending);
        app.last();
        assert_eq!(app.pending_state.selected(), Some(0));
        assert_eq!(app.state.selected(), Some(1));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("Ankrahmun Tombs", 40), "Ankrahmun Tombs");
        assert_eq!(truncate("Zaoan Dragonlair", 8), "Zaoan...");
        assert_eq!(truncate("Çaverna Ñoña", 6), "Çav...");
    }
}
