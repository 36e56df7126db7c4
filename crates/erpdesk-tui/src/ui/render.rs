use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use erpdesk_core::models::ProfileField;
use erpdesk_core::utils::{mask_secret, truncate_string};

use crate::app::{App, AppState, LoginFocus, Tab};

use super::styles;
use super::tabs::{dashboard, profile};

/// Width of the sidebar column
const SIDEBAR_WIDTH: u16 = 30;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Sidebar + main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(40)])
        .split(chunks[1]);

    render_title_bar(frame, app, chunks[0]);
    render_sidebar(frame, app, body[0]);
    render_main_content(frame, app, body[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    if app.directory().is_add_form_open() {
        render_add_user_overlay(frame, app);
    }

    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn | AppState::Authenticating => render_login_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  ERP Admin";
    let right = match app.session.user() {
        Some(user) => format!("[{}] {}  [?] Help", user.initials(), user.username),
        None => "[?] Help".to_string(),
    };

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + right.chars().count() + 2),
        )),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let inner_width = SIDEBAR_WIDTH.saturating_sub(4) as usize;
    let mut lines = vec![];

    match app.session.user() {
        Some(user) => {
            lines.push(Line::from(Span::styled(format!(" ({})", user.initials()), styles::title_style())));
            lines.push(Line::from(Span::styled(
                format!(" {}", truncate_string(&user.full_name(), inner_width)),
                styles::list_item_style(),
            )));
            lines.push(Line::from(Span::styled(
                format!(" {}", truncate_string(&user.email, inner_width)),
                styles::muted_style(),
            )));
        }
        None => lines.push(Line::from(Span::styled(" Not signed in", styles::muted_style()))),
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" Navigation", styles::highlight_style())));

    for (key, tab) in [("1", Tab::Dashboard), ("2", Tab::UserInfo)] {
        let selected = app.current_tab == tab;
        let marker = if selected { "▶" } else { " " };
        lines.push(Line::from(vec![
            Span::styled(format!(" {} [{}] ", marker, key), styles::muted_style()),
            Span::styled(tab.title(), styles::tab_style(selected)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" [L] ", styles::help_key_style()),
        Span::styled("Sign out", styles::muted_style()),
    ]));

    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Dashboard => dashboard::render(frame, area),
        Tab::UserInfo => profile::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.current_tab {
        Tab::UserInfo if app.directory().is_editing() => "[Enter] save | [Esc] cancel",
        Tab::UserInfo => "[e]dit | [n]ew | [d]ownload | [u]pdate list | [q]uit",
        Tab::Dashboard => "[Tab] switch | [q]uit",
    };

    let (left_text, left_style) = match app.status_text() {
        Some((msg, true)) => (format!(" {} ", msg), styles::error_style()),
        Some((msg, false)) => (format!(" {} ", msg), styles::success_style()),
        None => (String::from(" Ready "), styles::muted_style()),
    };
    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_row(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 24, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  ERP Admin", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_row("1/2", "Dashboard / User Info"),
        help_row("Tab", "Next screen"),
        help_row("←/→", "Previous/next user"),
        help_row("[/]", "Previous/next section"),
        Line::from(""),
        Line::from(Span::styled(" User Info", styles::highlight_style())),
        help_row("e", "Edit current user"),
        help_row("Enter", "Save changes"),
        help_row("Esc", "Cancel editing"),
        help_row("n", "Add a new user"),
        help_row("d", "Download users as spreadsheet"),
        help_row("u", "Reload users from server"),
        Line::from(""),
        Line::from(Span::styled(" Session", styles::highlight_style())),
        help_row("L", "Sign out"),
        help_row("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 15 } else { 13 };
    let area = centered_rect_fixed(46, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled("        Sign in to ERP Admin", styles::title_style())),
        Line::from(""),
    ];

    let username_focused = app.login_focus == LoginFocus::Username;
    let username_style = if username_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let username_display = format!("{:<16}", truncate_string(&app.login_username, 16));
    let cursor = if username_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("      "),
        Span::styled("Username: [", styles::muted_style()),
        Span::styled(format!("{}{}", username_display, cursor), username_style),
        Span::styled("]", styles::muted_style()),
    ]));

    let password_focused = app.login_focus == LoginFocus::Password;
    let password_style = if password_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let password_masked: String = "*".repeat(app.login_password.chars().count().min(16));
    let password_display = format!("{:<16}", password_masked);
    let cursor = if password_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("      "),
        Span::styled("Password: [", styles::muted_style()),
        Span::styled(format!("{}{}", password_display, cursor), password_style),
        Span::styled("]", styles::muted_style()),
    ]));

    lines.push(Line::from(""));
    if app.state == AppState::Authenticating {
        lines.push(Line::from(Span::styled("            Signing in...", styles::highlight_style())));
    } else {
        let button_focused = app.login_focus == LoginFocus::Button;
        let (label, style) = if button_focused {
            (" ▶ Login ◀ ", styles::selected_style())
        } else {
            ("   Login   ", styles::list_item_style())
        };
        lines.push(Line::from(vec![
            Span::raw("            ["),
            Span::styled(label, style),
            Span::raw("]"),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("   Demo: johndoe / asqw123", styles::muted_style())));
    lines.push(Line::from(Span::styled("   Any username and password work", styles::muted_style())));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_add_user_overlay(frame: &mut Frame, app: &App) {
    let fields = ProfileField::ADD_FORM;
    let area = centered_rect_fixed(60, fields.len() as u16 + 6, frame.area());
    frame.render_widget(Clear, area);

    let candidate = app.directory().candidate();
    let focused = app.focused_add_field();

    let mut lines = vec![Line::from("")];
    for field in fields {
        let is_focused = field == focused;
        let raw = field.get(candidate);
        let value = if field.is_secret() { mask_secret(raw) } else { raw.to_string() };
        let cursor = if is_focused { "▌" } else { "" };
        let style = if is_focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };

        lines.push(Line::from(vec![
            Span::styled(format!("  {:<15}", field.label()), styles::muted_style()),
            Span::styled(format!("{}{}", truncate_string(&value, 36), cursor), style),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  [Enter]", styles::help_key_style()),
        Span::styled(" add user  ", styles::muted_style()),
        Span::styled("[↑/↓]", styles::help_key_style()),
        Span::styled(" field  ", styles::muted_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" cancel", styles::muted_style()),
    ]));

    let block = Block::default()
        .title(" Add New User ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed() {
        let outer = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect_fixed(46, 10, outer), Rect::new(27, 15, 46, 10));

        let small = Rect::new(0, 0, 20, 5);
        assert_eq!(centered_rect_fixed(46, 10, small), Rect::new(0, 0, 20, 5));
    }
}
