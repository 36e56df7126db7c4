use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use erpdesk_core::models::dashboard::{employee_performance, recent_activity, stat_cards, upcoming_tasks};

use crate::ui::styles;

pub fn render(frame: &mut Frame, area: Rect) {
    // 1. Stat cards (four across)
    // 2. Recent Activity | Upcoming Tasks (50/50)
    // 3. Employee Performance
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(12),
            Constraint::Length(10),
        ])
        .split(area);

    render_stat_cards(frame, rows[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    render_recent_activity(frame, middle[0]);
    render_upcoming_tasks(frame, middle[1]);
    render_performance(frame, rows[2]);
}

fn section_block(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
}

fn render_stat_cards(frame: &mut Frame, area: Rect) {
    let cards = stat_cards();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (card, column) in cards.iter().zip(columns.iter()) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_style(false));
        let lines = vec![
            Line::from(Span::styled(card.title, styles::muted_style())),
            Line::from(Span::styled(card.value.to_string(), styles::title_style())),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), *column);
    }
}

fn render_recent_activity(frame: &mut Frame, area: Rect) {
    let mut lines = vec![];
    for activity in recent_activity() {
        lines.push(Line::from(Span::styled(activity.summary, styles::list_item_style())));
        lines.push(Line::from(Span::styled(format!("  {}", activity.when), styles::muted_style())));
    }

    frame.render_widget(Paragraph::new(lines).block(section_block("Recent Activity")), area);
}

fn render_upcoming_tasks(frame: &mut Frame, area: Rect) {
    let mut lines = vec![];
    for task in upcoming_tasks() {
        lines.push(Line::from(vec![
            Span::styled("● ", styles::priority_style(task.priority)),
            Span::styled(task.title(), styles::list_item_style()),
        ]));
        lines.push(Line::from(Span::styled(format!("  {}", task.due_label()), styles::muted_style())));
    }

    frame.render_widget(Paragraph::new(lines).block(section_block("Upcoming Tasks")), area);
}

fn render_performance(frame: &mut Frame, area: Rect) {
    let block = section_block("Employee Performance");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let entries = employee_performance();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2); 4])
        .split(inner);

    for (entry, row) in entries.iter().zip(rows.iter()) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(28), Constraint::Min(10)])
            .split(*row);

        let label = Line::from(vec![
            Span::styled(entry.name, styles::list_item_style()),
            Span::styled(format!(" ({})", entry.role), styles::muted_style()),
        ]);
        frame.render_widget(Paragraph::new(label), columns[0]);

        let gauge = Gauge::default()
            .gauge_style(styles::band_style(entry.band()))
            .percent(u16::from(entry.progress))
            .label(format!("{}%", entry.progress));
        frame.render_widget(gauge, columns[1]);
    }
}
