//! Application state management for erpdesk.
//!
//! This module contains the core `App` struct that manages all application
//! state: the session, the directory store, UI state, and coordination of
//! the background tasks that talk to the profile service.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use erpdesk_core::api::{ApiError, ProfileGateway, RawProfile};
use erpdesk_core::auth::SessionStore;
use erpdesk_core::config::Config;
use erpdesk_core::export::export_roster;
use erpdesk_core::models::{FormSection, ProfileField, UserRecord};
use erpdesk_core::store::{AddTicket, Direction, Directory, DirectoryStore, LoadTicket, Notification, SaveTicket};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for any profile form field.
const MAX_FIELD_LENGTH: usize = 100;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    UserInfo,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::UserInfo => "User Info",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::UserInfo,
            Tab::UserInfo => Tab::Dashboard,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        self.next()
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    LoggingIn,
    /// Credentials accepted, waiting out the sign-in round-trip
    Authenticating,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned tasks over the MPSC channel. Each carries
/// the ticket it was started with so the directory can discard stale ones.
enum TaskResult {
    Loaded(LoadTicket, Result<Vec<UserRecord>, ApiError>),
    Saved(SaveTicket, Result<UserRecord, ApiError>),
    Added(AddTicket, Result<RawProfile, ApiError>),
    /// The simulated sign-in delay for this username has elapsed
    SignedIn(String),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    /// Where config changes are written; None keeps them in memory
    config_path: Option<PathBuf>,
    pub session: SessionStore,
    pub store: DirectoryStore,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub form_section: FormSection,
    /// Focused row within the current section while editing
    pub field_selection: usize,
    /// Focused row within the add-user form
    pub add_field_selection: usize,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Background task channel
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,

    pub status_message: Option<String>,
}

impl App {
    pub fn new(config: Config, session: SessionStore, gateway: Arc<dyn ProfileGateway>) -> Self {
        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let store = DirectoryStore::new(gateway, config.write_policy);
        let login_username = config.last_username.clone().unwrap_or_default();

        Self {
            config,
            config_path: None,
            session,
            store,

            state: AppState::Normal,
            current_tab: Tab::Dashboard,
            form_section: FormSection::Personal,
            field_selection: 0,
            add_field_selection: 0,

            login_username,
            login_password: String::new(),
            login_focus: LoginFocus::Username,
            login_error: None,

            task_rx,
            task_tx,

            status_message: None,
        }
    }

    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    pub fn directory(&self) -> &Directory {
        self.store.directory()
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Validate the login form and start the sign-in round-trip
    pub fn attempt_login(&mut self) {
        if let Err(e) = SessionStore::validate(&self.login_username, &self.login_password) {
            self.login_error = Some(e.to_string());
            return;
        }

        self.login_error = None;
        self.state = AppState::Authenticating;

        let delay = self.session.login_delay();
        let username = self.login_username.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            Self::send_result(&tx, TaskResult::SignedIn(username)).await;
        });
    }

    fn finish_login(&mut self, username: String) {
        match self.session.complete_login(&username) {
            Ok(_) => {
                self.config.last_username = Some(username);
                if let Some(ref path) = self.config_path {
                    if let Err(e) = self.config.save_to(path) {
                        warn!(error = %e, "Failed to save config");
                    }
                }

                self.login_password.clear();
                self.state = AppState::Normal;
                self.current_tab = Tab::Dashboard;
                info!("Login successful");
                self.load_directory();
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.login_error = Some(e.to_string());
                self.state = AppState::LoggingIn;
            }
        }
    }

    /// Sign out and return to the login screen
    pub fn logout(&mut self) {
        if let Err(e) = self.session.logout() {
            warn!(error = %e, "Failed to clear session");
        }
        self.store.directory_mut().cancel_edit();
        self.store.directory_mut().reset_add_form();
        self.login_password.clear();
        self.current_tab = Tab::Dashboard;
        self.start_login();
    }

    // =========================================================================
    // Directory round-trips
    // =========================================================================

    /// Helper to send task results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<TaskResult>, result: TaskResult) {
        if tx.send(result).await.is_err() {
            error!("Failed to send task result - channel closed");
        }
    }

    /// Fetch the roster in the background. Also used for refresh; any
    /// earlier outstanding load is superseded.
    pub fn load_directory(&mut self) {
        let ticket = self.store.directory_mut().begin_load();
        let gateway = self.store.gateway();
        let tx = self.task_tx.clone();

        tokio::spawn(async move {
            let result = gateway.list_all().await;
            Self::send_result(&tx, TaskResult::Loaded(ticket, result)).await;
        });
    }

    pub fn begin_edit(&mut self) {
        self.store.directory_mut().begin_edit();
        self.field_selection = 0;
    }

    pub fn cancel_edit(&mut self) {
        self.store.directory_mut().cancel_edit();
    }

    /// Commit the draft locally and push it to the server
    pub fn save_edit(&mut self) {
        let Some(ticket) = self.store.directory_mut().stage_save() else {
            return;
        };
        let gateway = self.store.gateway();
        let tx = self.task_tx.clone();

        tokio::spawn(async move {
            let result = gateway.update_one(&ticket.id, &ticket.committed).await;
            Self::send_result(&tx, TaskResult::Saved(ticket, result)).await;
        });
    }

    pub fn open_add_form(&mut self) {
        self.store.directory_mut().open_add_form();
        self.add_field_selection = 0;
    }

    pub fn close_add_form(&mut self) {
        self.store.directory_mut().close_add_form();
    }

    /// Append the add-form candidate locally and submit it
    pub fn submit_add_form(&mut self) {
        let ticket = self.store.directory_mut().submit_add_form();
        let gateway = self.store.gateway();
        let tx = self.task_tx.clone();

        tokio::spawn(async move {
            let result = gateway.create_one(&ticket.submitted).await;
            Self::send_result(&tx, TaskResult::Added(ticket, result)).await;
        });
    }

    pub fn navigate(&mut self, direction: Direction) {
        self.store.directory_mut().navigate(direction);
    }

    /// Write the roster to the export directory
    pub fn export(&mut self) {
        let dir = self.config.export_dir();
        let outcome = export_roster(self.store.directory().roster(), &dir);

        let directory = self.store.directory_mut();
        match outcome {
            Ok(path) => {
                info!(path = %path.display(), "Export written");
                directory.notify(Notification::success("Users data downloaded successfully!"));
            }
            Err(e) => {
                error!(error = %e, "Export failed");
                directory.notify(Notification::error(format!("Failed to download users data: {}", e)));
            }
        }
    }

    // =========================================================================
    // Field editing
    // =========================================================================

    /// Fields of the current section that can be typed into
    pub fn editable_fields(&self) -> Vec<ProfileField> {
        self.form_section
            .fields()
            .iter()
            .copied()
            .filter(|f| is_editable(*f))
            .collect()
    }

    pub fn focused_field(&self) -> Option<ProfileField> {
        self.editable_fields().get(self.field_selection).copied()
    }

    pub fn focused_add_field(&self) -> ProfileField {
        ProfileField::ADD_FORM[self.add_field_selection % ProfileField::ADD_FORM.len()]
    }

    pub fn next_section(&mut self) {
        self.form_section = self.form_section.next();
        self.field_selection = 0;
    }

    pub fn prev_section(&mut self) {
        self.form_section = self.form_section.prev();
        self.field_selection = 0;
    }

    pub fn move_field_focus(&mut self, forward: bool) {
        let count = self.editable_fields().len();
        if count == 0 {
            return;
        }
        self.field_selection = step(self.field_selection, count, forward);
    }

    pub fn move_add_focus(&mut self, forward: bool) {
        self.add_field_selection = step(self.add_field_selection, ProfileField::ADD_FORM.len(), forward);
    }

    pub fn type_into_draft(&mut self, c: char) {
        let Some(field) = self.focused_field() else {
            return;
        };
        if let Some(draft) = self.store.directory_mut().draft_mut() {
            if can_add_field_char(field.get(draft).chars().count(), c) {
                field.push_char(draft, c);
            }
        }
    }

    pub fn backspace_draft(&mut self) {
        let Some(field) = self.focused_field() else {
            return;
        };
        if let Some(draft) = self.store.directory_mut().draft_mut() {
            field.pop_char(draft);
        }
    }

    pub fn type_into_candidate(&mut self, c: char) {
        let field = self.focused_add_field();
        let candidate = self.store.directory_mut().candidate_mut();
        if can_add_field_char(field.get(candidate).chars().count(), c) {
            field.push_char(candidate, c);
        }
    }

    pub fn backspace_candidate(&mut self) {
        let field = self.focused_add_field();
        field.pop_char(self.store.directory_mut().candidate_mut());
    }

    // =========================================================================
    // Background results
    // =========================================================================

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            self.process_task_result(result);
        }
        self.store.directory_mut().expire_notifications();
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Loaded(ticket, result) => {
                if self.store.directory_mut().complete_load(ticket, result) {
                    debug!("Directory refreshed");
                }
            }
            TaskResult::Saved(ticket, result) => self.store.directory_mut().complete_save(ticket, result),
            TaskResult::Added(ticket, result) => self.store.directory_mut().complete_add(ticket, result),
            TaskResult::SignedIn(username) => self.finish_login(username),
        }
    }

    /// Text for the status bar: the newest live notification, else any
    /// status message.
    pub fn status_text(&self) -> Option<(String, bool)> {
        self.directory()
            .latest_notification()
            .map(|n| (n.message.clone(), n.is_error()))
            .or_else(|| self.status_message.clone().map(|m| (m, false)))
    }
}

fn step(current: usize, count: usize, forward: bool) -> usize {
    if forward {
        (current + 1) % count
    } else {
        (current + count - 1) % count
    }
}

/// Timestamps are shown but not typed into
pub fn is_editable(field: ProfileField) -> bool {
    !matches!(field, ProfileField::AccountCreated | ProfileField::LastLogin)
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

/// Check if a profile field character should be accepted
pub fn can_add_field_char(current_len: usize, c: char) -> bool {
    current_len < MAX_FIELD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
