use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use erpdesk_core::models::{FormSection, ProfileField, UserRecord};
use erpdesk_core::utils::{format_date, format_phone};

use crate::app::App;
use crate::ui::styles;

/// Shown for empty values outside edit mode
const PLACEHOLDER: &str = "-";

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let directory = app.directory();

    if directory.is_loading() && directory.is_empty() {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_style(false));
        let text = Paragraph::new(Line::from(Span::styled("  Loading user data...", styles::highlight_style())))
            .block(block);
        frame.render_widget(text, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Header card
            Constraint::Length(2), // Section tabs
            Constraint::Min(8),    // Fields
        ])
        .split(area);

    // Edit mode shows the draft; otherwise the draft mirrors the record
    let record = directory.draft();
    render_header(frame, app, record, chunks[0]);
    render_section_tabs(frame, app, chunks[1]);
    render_fields(frame, app, record, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, record: &UserRecord, area: Rect) {
    let directory = app.directory();

    let mut title_spans = vec![
        Span::styled(format!("({}) ", record.initials()), styles::title_style()),
        Span::styled(record.full_name(), styles::title_style()),
    ];
    if directory.is_editing() {
        title_spans.push(Span::styled("  [editing]", styles::highlight_style()));
    }
    if directory.is_loading() {
        title_spans.push(Span::styled("  refreshing...", styles::muted_style()));
    }

    let dob = if record.date_of_birth.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        format_date(&record.date_of_birth)
    };
    let blood = match record.blood_group_display() {
        "" => PLACEHOLDER,
        value => value,
    };

    let lines = vec![
        Line::from(title_spans),
        Line::from(vec![
            Span::styled(format!("@{}", record.username), styles::muted_style()),
            Span::raw("  "),
            Span::raw(record.email.clone()),
        ]),
        Line::from(vec![
            Span::styled("DOB: ", styles::muted_style()),
            Span::raw(dob),
            Span::styled("   Blood: ", styles::muted_style()),
            Span::raw(blood.to_string()),
            Span::styled("   Phone: ", styles::muted_style()),
            Span::raw(format_phone(&record.phone)),
        ]),
        Line::from(vec![
            Span::styled("Joined: ", styles::muted_style()),
            Span::raw(format_date(&record.account_created)),
        ]),
    ];

    let block = Block::default()
        .title(format!(" {} ", directory.position_label()))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(directory.is_editing()));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_section_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, section) in [FormSection::Personal, FormSection::Address, FormSection::Account]
        .iter()
        .enumerate()
    {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let selected = *section == app.form_section;
        let style = if selected {
            styles::tab_style(true)
        } else {
            styles::muted_style()
        };
        spans.push(Span::styled(section.title(), style));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_fields(frame: &mut Frame, app: &App, record: &UserRecord, area: Rect) {
    let editing = app.directory().is_editing();
    let focused = if editing { app.focused_field() } else { None };

    let lines: Vec<Line> = app
        .form_section
        .fields()
        .iter()
        .map(|field| field_line(*field, record, focused == Some(*field), editing))
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(editing));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn field_line(field: ProfileField, record: &UserRecord, focused: bool, editing: bool) -> Line<'static> {
    let raw = field.get(record);
    let value = match field {
        ProfileField::AccountCreated | ProfileField::LastLogin => format_date(raw),
        _ if raw.is_empty() && !editing => PLACEHOLDER.to_string(),
        _ => raw.to_string(),
    };

    let (value_style, cursor) = if focused {
        (styles::selected_style(), "▌")
    } else {
        (styles::list_item_style(), "")
    };

    Line::from(vec![
        Span::styled(format!(" {:<16}", field.label()), styles::muted_style()),
        Span::styled(format!("{}{}", value, cursor), value_style),
    ])
}
