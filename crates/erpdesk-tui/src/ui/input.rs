//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use crossterm::event::{KeyCode, KeyEvent};

use erpdesk_core::store::Direction;

use crate::app::{can_add_password_char, can_add_username_char, App, AppState, LoginFocus, Tab};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    match app.state {
        AppState::LoggingIn => return handle_login_input(app, key),
        // Ignore keys while the sign-in round-trip is running
        AppState::Authenticating => return false,
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return false;
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return true;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return false;
        }
        AppState::Quitting => return true,
        AppState::Normal => {}
    }

    // Modal and edit mode capture all typing
    if app.directory().is_add_form_open() {
        handle_add_form_input(app, key);
        return false;
    }
    if app.current_tab == Tab::UserInfo && app.directory().is_editing() {
        handle_edit_input(app, key);
        return false;
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('1') => app.current_tab = Tab::Dashboard,
        KeyCode::Char('2') => app.current_tab = Tab::UserInfo,
        KeyCode::Tab => app.current_tab = app.current_tab.next(),
        KeyCode::BackTab => app.current_tab = app.current_tab.prev(),
        KeyCode::Char('L') => app.logout(),
        _ => {
            if app.current_tab == Tab::UserInfo {
                handle_user_info_input(app, key);
            }
        }
    }

    false
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return true;
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => app.attempt_login(),
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.chars().count(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    false
}

fn handle_user_info_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => app.navigate(Direction::Previous),
        KeyCode::Right | KeyCode::Char('l') => app.navigate(Direction::Next),
        KeyCode::Char(']') => app.next_section(),
        KeyCode::Char('[') => app.prev_section(),
        KeyCode::Char('e') => app.begin_edit(),
        KeyCode::Char('n') => app.open_add_form(),
        KeyCode::Char('d') => app.export(),
        KeyCode::Char('u') => app.load_directory(),
        _ => {}
    }
}

fn handle_edit_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_edit(),
        KeyCode::Enter => app.save_edit(),
        KeyCode::Down => app.move_field_focus(true),
        KeyCode::Up => app.move_field_focus(false),
        KeyCode::Tab => app.next_section(),
        KeyCode::BackTab => app.prev_section(),
        KeyCode::Backspace => app.backspace_draft(),
        KeyCode::Char(c) => app.type_into_draft(c),
        _ => {}
    }
}

fn handle_add_form_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_add_form(),
        KeyCode::Enter => app.submit_add_form(),
        KeyCode::Down | KeyCode::Tab => app.move_add_focus(true),
        KeyCode::Up | KeyCode::BackTab => app.move_add_focus(false),
        KeyCode::Backspace => app.backspace_candidate(),
        KeyCode::Char(c) => app.type_into_candidate(c),
        _ => {}
    }
}
