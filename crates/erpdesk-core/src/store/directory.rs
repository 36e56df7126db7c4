//! The user directory: the roster of profiles, the cursor over it and the
//! edit draft, plus the lifecycle of load, save and add round-trips.
//!
//! Remote calls are split into a synchronous *stage* step and a synchronous
//! *complete* step. Staging updates the roster immediately and hands back a
//! ticket. The ticket travels with the gateway call and is handed back to the
//! matching complete step, which checks it is still current before touching
//! anything. [`DirectoryStore`] wires the two halves together for callers
//! that simply want to await the round-trip.

use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::api::wire::merge_created;
use crate::api::{ApiError, ProfileGateway, RawProfile};
use crate::models::{seed_profiles, UserRecord};

use super::notification::Notification;

// ============================================================================
// Policy and tickets
// ============================================================================

/// What happens to the local roster when a save or add is rejected remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Keep the local change and report the failure.
    #[default]
    LocalAlwaysWins,
    /// Undo the local change, provided nothing has touched the record since.
    RollbackOnFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Issued by [`Directory::begin_load`]. Only the most recent ticket may
/// replace the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    serial: u64,
}

/// Issued by [`Directory::stage_save`].
#[derive(Debug, Clone)]
pub struct SaveTicket {
    pub id: String,
    /// The record as committed locally; this is what gets sent.
    pub committed: UserRecord,
    previous: UserRecord,
    index: usize,
    epoch: u64,
}

/// Issued by [`Directory::stage_add`].
#[derive(Debug, Clone)]
pub struct AddTicket {
    pub placeholder_id: String,
    /// The candidate as appended locally, placeholder id included.
    pub submitted: UserRecord,
    index: usize,
    epoch: u64,
}

/// Random six-digit id used until the server assigns a real one
pub fn placeholder_id() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

// ============================================================================
// Directory
// ============================================================================

#[derive(Debug)]
pub struct Directory {
    roster: Vec<UserRecord>,
    cursor: usize,
    draft: UserRecord,
    editing: bool,
    loading: bool,
    add_form_open: bool,
    candidate: UserRecord,
    notifications: VecDeque<Notification>,
    policy: WritePolicy,
    /// Serial of the newest load ticket handed out
    load_serial: u64,
    /// Bumped whenever the roster is replaced wholesale; write tickets from an
    /// older epoch no longer point into this roster.
    epoch: u64,
}

impl Default for Directory {
    fn default() -> Self {
        Self::new(WritePolicy::default())
    }
}

impl Directory {
    /// An empty directory, not yet loaded.
    pub fn new(policy: WritePolicy) -> Self {
        Self {
            roster: Vec::new(),
            cursor: 0,
            draft: UserRecord::default(),
            editing: false,
            loading: false,
            add_form_open: false,
            candidate: UserRecord::blank_template(),
            notifications: VecDeque::new(),
            policy,
            load_serial: 0,
            epoch: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn roster(&self) -> &[UserRecord] {
        &self.roster
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&UserRecord> {
        self.roster.get(self.cursor)
    }

    pub fn draft(&self) -> &UserRecord {
        &self.draft
    }

    /// The draft, but only while editing
    pub fn draft_mut(&mut self) -> Option<&mut UserRecord> {
        if self.editing {
            Some(&mut self.draft)
        } else {
            None
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// "User 2 of 5"
    pub fn position_label(&self) -> String {
        if self.roster.is_empty() {
            "No users".to_string()
        } else {
            format!("User {} of {}", self.cursor + 1, self.roster.len())
        }
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    /// Mark a load as in flight. Any earlier outstanding load becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_serial += 1;
        self.loading = true;
        debug!(serial = self.load_serial, "Roster load started");
        LoadTicket { serial: self.load_serial }
    }

    /// Apply a finished load. Returns false if the ticket was stale and the
    /// result was dropped.
    pub fn complete_load(&mut self, ticket: LoadTicket, result: Result<Vec<UserRecord>, ApiError>) -> bool {
        if ticket.serial != self.load_serial {
            warn!(serial = ticket.serial, latest = self.load_serial, "Dropping stale roster load");
            return false;
        }
        self.loading = false;

        let roster = match result {
            Ok(records) if !records.is_empty() => {
                info!(count = records.len(), "Roster loaded");
                records
            }
            Ok(_) => {
                info!("Profile service returned no users, using sample data");
                self.notify(Notification::info("No users found on the server. Showing sample data."));
                seed_profiles()
            }
            Err(e) => {
                error!(error = %e, "Failed to load users, using sample data");
                self.notify(Notification::error(format!("Failed to load users: {}", e)));
                seed_profiles()
            }
        };

        self.replace_roster(roster);
        true
    }

    fn replace_roster(&mut self, roster: Vec<UserRecord>) {
        self.roster = roster;
        self.epoch += 1;
        self.cursor = 0;
        self.editing = false;
        self.draft = self.roster.first().cloned().unwrap_or_default();
    }

    // ------------------------------------------------------------------------
    // Navigation and editing
    // ------------------------------------------------------------------------

    /// Move the cursor one step with wraparound. Leaves edit mode and
    /// discards unsaved draft changes.
    pub fn navigate(&mut self, direction: Direction) {
        let len = self.roster.len();
        if len == 0 {
            return;
        }

        self.cursor = match direction {
            Direction::Next => (self.cursor + 1) % len,
            Direction::Previous => (self.cursor + len - 1) % len,
        };
        self.editing = false;
        self.sync_draft();
    }

    pub fn begin_edit(&mut self) {
        if self.roster.is_empty() {
            return;
        }
        self.editing = true;
    }

    pub fn cancel_edit(&mut self) {
        self.editing = false;
        self.sync_draft();
    }

    fn sync_draft(&mut self) {
        self.draft = self.current().cloned().unwrap_or_default();
    }

    // ------------------------------------------------------------------------
    // Save
    // ------------------------------------------------------------------------

    /// Commit the draft into the roster at the cursor and leave edit mode.
    /// Returns the ticket for the remote update, or None when there was
    /// nothing to save.
    pub fn stage_save(&mut self) -> Option<SaveTicket> {
        if !self.editing {
            return None;
        }
        self.editing = false;

        let index = self.cursor;
        let committed = self.draft.clone();
        let slot = self.roster.get_mut(index)?;
        let previous = mem::replace(slot, committed.clone());

        debug!(id = %committed.id, index, "Profile committed locally");
        Some(SaveTicket {
            id: committed.id.clone(),
            committed,
            previous,
            index,
            epoch: self.epoch,
        })
    }

    /// Report the outcome of a remote update. The server's response body
    /// is not merged back.
    pub fn complete_save(&mut self, ticket: SaveTicket, result: Result<UserRecord, ApiError>) {
        match result {
            Ok(_) => {
                info!(id = %ticket.id, "Profile saved");
                self.notify(Notification::success("Profile updated successfully!"));
            }
            Err(e) => {
                error!(id = %ticket.id, error = %e, "Failed to update user");
                self.notify(Notification::error(format!("Failed to update user: {}", e)));

                if self.policy == WritePolicy::RollbackOnFailure {
                    match self.locate(ticket.epoch, ticket.index, &ticket.id) {
                        Some(i) if self.roster[i] == ticket.committed => {
                            self.roster[i] = ticket.previous;
                            if i == self.cursor && !self.editing {
                                self.sync_draft();
                            }
                        }
                        _ => warn!(id = %ticket.id, "Record changed since save; not rolling back"),
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Add
    // ------------------------------------------------------------------------

    pub fn is_add_form_open(&self) -> bool {
        self.add_form_open
    }

    pub fn open_add_form(&mut self) {
        self.add_form_open = true;
    }

    /// Hide the add form. What was typed stays for the next open.
    pub fn close_add_form(&mut self) {
        self.add_form_open = false;
    }

    /// Hide the add form and reset the candidate to a blank template
    pub fn reset_add_form(&mut self) {
        self.add_form_open = false;
        self.candidate = UserRecord::blank_template();
    }

    pub fn candidate(&self) -> &UserRecord {
        &self.candidate
    }

    pub fn candidate_mut(&mut self) -> &mut UserRecord {
        &mut self.candidate
    }

    /// Stage the add form's candidate
    pub fn submit_add_form(&mut self) -> AddTicket {
        let candidate = mem::replace(&mut self.candidate, UserRecord::blank_template());
        self.stage_add(candidate)
    }

    /// Append `candidate` under a placeholder id and point the cursor at it.
    /// The add form is closed and reset.
    pub fn stage_add(&mut self, mut candidate: UserRecord) -> AddTicket {
        let placeholder = placeholder_id();
        candidate.id = placeholder.clone();

        self.roster.push(candidate.clone());
        self.cursor = self.roster.len() - 1;
        self.editing = false;
        self.draft = candidate.clone();
        self.reset_add_form();

        debug!(placeholder_id = %placeholder, "New profile appended locally");
        AddTicket {
            placeholder_id: placeholder,
            submitted: candidate,
            index: self.cursor,
            epoch: self.epoch,
        }
    }

    /// Report the outcome of a remote create. On success the placeholder
    /// entry is replaced by the submitted record overlaid with the server's
    /// fields.
    pub fn complete_add(&mut self, ticket: AddTicket, result: Result<RawProfile, ApiError>) {
        let merged = result.and_then(|server| merge_created(&ticket.submitted, server));

        match merged {
            Ok(record) => {
                info!(placeholder_id = %ticket.placeholder_id, id = %record.id, "User added");
                match self.locate(ticket.epoch, ticket.index, &ticket.placeholder_id) {
                    Some(i) => {
                        self.roster[i] = record;
                        if i == self.cursor && !self.editing {
                            self.sync_draft();
                        }
                    }
                    None => warn!(placeholder_id = %ticket.placeholder_id, "Added record no longer in roster"),
                }
                self.notify(Notification::success("User added successfully!"));
            }
            Err(e) => {
                error!(placeholder_id = %ticket.placeholder_id, error = %e, "Failed to submit user");
                self.notify(Notification::error(format!("Failed to submit user: {}", e)));

                if self.policy == WritePolicy::RollbackOnFailure {
                    match self.locate(ticket.epoch, ticket.index, &ticket.placeholder_id) {
                        Some(i) if self.roster[i] == ticket.submitted => self.remove_at(i),
                        _ => warn!(placeholder_id = %ticket.placeholder_id, "Added record changed; keeping it"),
                    }
                }
            }
        }
    }

    fn remove_at(&mut self, index: usize) {
        self.roster.remove(index);
        if self.cursor > index || self.cursor >= self.roster.len() {
            self.cursor = self.cursor.saturating_sub(1);
        }
        if !self.editing {
            self.sync_draft();
        }
    }

    /// Find the record a ticket refers to. Indices shift when a rollback
    /// removes an entry, so fall back to a search by id.
    fn locate(&self, epoch: u64, index: usize, id: &str) -> Option<usize> {
        if epoch != self.epoch {
            return None;
        }
        match self.roster.get(index) {
            Some(record) if record.id == id => Some(index),
            _ => self.roster.iter().position(|r| r.id == id),
        }
    }

    // ------------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------------

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push_back(notification);
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    pub fn latest_notification(&self) -> Option<&Notification> {
        self.notifications.back()
    }

    /// Drop notifications whose display time has passed
    pub fn expire_notifications(&mut self) {
        let now = Utc::now();
        self.notifications.retain(|n| !n.is_expired_at(now));
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }
}

// ============================================================================
// Async wrapper
// ============================================================================

/// A [`Directory`] bound to a gateway, for callers that await each
/// round-trip in place.
pub struct DirectoryStore {
    gateway: Arc<dyn ProfileGateway>,
    directory: Directory,
}

impl DirectoryStore {
    pub fn new(gateway: Arc<dyn ProfileGateway>, policy: WritePolicy) -> Self {
        Self {
            gateway,
            directory: Directory::new(policy),
        }
    }

    pub fn gateway(&self) -> Arc<dyn ProfileGateway> {
        Arc::clone(&self.gateway)
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut Directory {
        &mut self.directory
    }

    /// Load the roster, falling back to the sample profiles
    pub async fn initialize(&mut self) {
        let ticket = self.directory.begin_load();
        let result = self.gateway.list_all().await;
        self.directory.complete_load(ticket, result);
    }

    pub async fn save_edit(&mut self) {
        if let Some(ticket) = self.directory.stage_save() {
            let result = self.gateway.update_one(&ticket.id, &ticket.committed).await;
            self.directory.complete_save(ticket, result);
        }
    }

    pub async fn add_record(&mut self, candidate: UserRecord) {
        let ticket = self.directory.stage_add(candidate);
        let result = self.gateway.create_one(&ticket.submitted).await;
        self.directory.complete_add(ticket, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PersonName, ProfileField};
    use crate::store::NotificationLevel;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory gateway with scripted outcomes
    #[derive(Default)]
    struct FakeGateway {
        /// None means the list call fails
        roster: Option<Vec<UserRecord>>,
        fail_writes: bool,
        /// Raw JSON object returned from a create
        created: Option<&'static str>,
        updates: Mutex<Vec<(String, UserRecord)>>,
        creates: Mutex<Vec<UserRecord>>,
    }

    fn failure() -> ApiError {
        ApiError::Status {
            status: 500,
            body: "boom".to_string(),
        }
    }

    #[async_trait]
    impl ProfileGateway for FakeGateway {
        async fn list_all(&self) -> Result<Vec<UserRecord>, ApiError> {
            self.roster.clone().ok_or_else(failure)
        }

        async fn update_one(&self, id: &str, record: &UserRecord) -> Result<UserRecord, ApiError> {
            self.updates.lock().unwrap().push((id.to_string(), record.clone()));
            if self.fail_writes {
                Err(failure())
            } else {
                Ok(record.clone())
            }
        }

        async fn create_one(&self, record: &UserRecord) -> Result<RawProfile, ApiError> {
            self.creates.lock().unwrap().push(record.clone());
            if self.fail_writes {
                return Err(failure());
            }
            let body = self.created.unwrap_or("{}");
            Ok(serde_json::from_str(body).unwrap())
        }
    }

    fn person(id: &str, first: &str) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            name: PersonName {
                first: first.to_string(),
                last: "Test".to_string(),
            },
            ..Default::default()
        }
    }

    fn three() -> Vec<UserRecord> {
        vec![person("1", "A"), person("2", "B"), person("3", "C")]
    }

    async fn store_with(gateway: FakeGateway, policy: WritePolicy) -> (DirectoryStore, Arc<FakeGateway>) {
        let gateway = Arc::new(gateway);
        let mut store = DirectoryStore::new(gateway.clone(), policy);
        store.initialize().await;
        (store, gateway)
    }

    #[tokio::test]
    async fn test_initialize_uses_remote_roster() {
        let (store, _) = store_with(FakeGateway { roster: Some(three()), ..Default::default() }, WritePolicy::default()).await;
        let dir = store.directory();

        assert_eq!(dir.len(), 3);
        assert_eq!(dir.cursor(), 0);
        assert_eq!(dir.draft(), &dir.roster()[0]);
        assert!(!dir.is_loading());
        assert!(!dir.is_editing());
        assert_eq!(dir.notifications().count(), 0);
    }

    #[tokio::test]
    async fn test_initialize_failure_falls_back_to_seed() {
        let (store, _) = store_with(FakeGateway::default(), WritePolicy::default()).await;
        let dir = store.directory();

        assert_eq!(dir.roster(), seed_profiles().as_slice());
        assert_eq!(dir.draft().full_name(), "John Doe");
        assert!(!dir.is_loading());

        let note = dir.latest_notification().unwrap();
        assert!(note.is_error());
        assert!(note.message.starts_with("Failed to load users:"));
    }

    #[tokio::test]
    async fn test_initialize_empty_falls_back_to_seed() {
        let (store, _) = store_with(FakeGateway { roster: Some(Vec::new()), ..Default::default() }, WritePolicy::default()).await;
        let dir = store.directory();

        assert_eq!(dir.len(), 2);
        assert_eq!(dir.latest_notification().unwrap().level, NotificationLevel::Info);
    }

    #[tokio::test]
    async fn test_navigate_wraps() {
        let (mut store, _) = store_with(FakeGateway { roster: Some(three()), ..Default::default() }, WritePolicy::default()).await;
        let dir = store.directory_mut();

        dir.navigate(Direction::Previous);
        assert_eq!(dir.cursor(), 2);
        assert_eq!(dir.draft().id, "3");

        dir.navigate(Direction::Next);
        assert_eq!(dir.cursor(), 0);
        assert_eq!(dir.position_label(), "User 1 of 3");
    }

    #[tokio::test]
    async fn test_navigate_discards_draft_and_exits_edit() {
        let (mut store, _) = store_with(FakeGateway { roster: Some(three()), ..Default::default() }, WritePolicy::default()).await;
        let dir = store.directory_mut();

        dir.begin_edit();
        ProfileField::FirstName.set(dir.draft_mut().unwrap(), "Changed".to_string());
        dir.navigate(Direction::Next);
        dir.navigate(Direction::Previous);

        assert!(!dir.is_editing());
        assert_eq!(dir.draft().name.first, "A");
        assert_eq!(dir.roster()[0].name.first, "A");
    }

    fn loaded(roster: Vec<UserRecord>) -> Directory {
        let mut dir = Directory::default();
        let ticket = dir.begin_load();
        assert!(dir.complete_load(ticket, Ok(roster)));
        dir
    }

    #[test]
    fn test_navigate_single_record_wraps_to_itself() {
        let mut dir = loaded(vec![person("1", "Solo")]);

        dir.navigate(Direction::Next);
        assert_eq!(dir.cursor(), 0);
        dir.navigate(Direction::Previous);
        assert_eq!(dir.cursor(), 0);
        assert_eq!(dir.draft().id, "1");
        assert_eq!(dir.position_label(), "User 1 of 1");
    }

    #[test]
    fn test_navigate_round_trip_from_every_cursor() {
        let mut roster = three();
        roster.push(person("4", "D"));
        roster.push(person("5", "E"));
        let mut dir = loaded(roster);

        for start in 0..dir.len() {
            while dir.cursor() != start {
                dir.navigate(Direction::Next);
            }
            dir.navigate(Direction::Next);
            dir.navigate(Direction::Previous);
            assert_eq!(dir.cursor(), start);

            dir.navigate(Direction::Previous);
            dir.navigate(Direction::Next);
            assert_eq!(dir.cursor(), start);
            assert_eq!(dir.draft(), &dir.roster()[start]);
        }
    }

    #[test]
    fn test_navigate_empty_is_noop() {
        let mut dir = Directory::default();
        dir.navigate(Direction::Next);
        assert_eq!(dir.cursor(), 0);
        assert_eq!(dir.position_label(), "No users");
    }

    #[tokio::test]
    async fn test_cancel_edit_restores_draft() {
        let (mut store, _) = store_with(FakeGateway { roster: Some(three()), ..Default::default() }, WritePolicy::default()).await;
        let dir = store.directory_mut();

        assert!(dir.draft_mut().is_none());
        dir.begin_edit();
        ProfileField::City.set(dir.draft_mut().unwrap(), "Paris".to_string());
        dir.cancel_edit();

        assert!(!dir.is_editing());
        assert_eq!(dir.draft(), &dir.roster()[0]);
    }

    #[tokio::test]
    async fn test_save_commits_and_sends_update() {
        let (mut store, gateway) = store_with(FakeGateway { roster: Some(three()), ..Default::default() }, WritePolicy::default()).await;

        store.directory_mut().navigate(Direction::Next);
        store.directory_mut().begin_edit();
        ProfileField::BloodGroup.set(store.directory_mut().draft_mut().unwrap(), "AB+".to_string());
        store.save_edit().await;

        let dir = store.directory();
        assert_eq!(dir.roster()[1].blood_group.as_deref(), Some("AB+"));
        assert!(!dir.is_editing());
        assert_eq!(dir.latest_notification().unwrap().message, "Profile updated successfully!");

        let updates = gateway.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "2");
        assert_eq!(updates[0].1.blood_group.as_deref(), Some("AB+"));
    }

    #[tokio::test]
    async fn test_save_failure_keeps_local_change() {
        let gateway = FakeGateway { roster: Some(three()), fail_writes: true, ..Default::default() };
        let (mut store, _) = store_with(gateway, WritePolicy::LocalAlwaysWins).await;

        store.directory_mut().begin_edit();
        ProfileField::FirstName.set(store.directory_mut().draft_mut().unwrap(), "Z".to_string());
        store.save_edit().await;

        let dir = store.directory();
        assert_eq!(dir.roster()[0].name.first, "Z");
        assert!(!dir.is_editing());
        let note = dir.latest_notification().unwrap();
        assert!(note.is_error());
        assert!(note.message.starts_with("Failed to update user:"));
    }

    #[tokio::test]
    async fn test_save_failure_rolls_back_under_policy() {
        let gateway = FakeGateway { roster: Some(three()), fail_writes: true, ..Default::default() };
        let (mut store, _) = store_with(gateway, WritePolicy::RollbackOnFailure).await;

        store.directory_mut().begin_edit();
        ProfileField::FirstName.set(store.directory_mut().draft_mut().unwrap(), "Z".to_string());
        store.save_edit().await;

        let dir = store.directory();
        assert_eq!(dir.roster()[0].name.first, "A");
        assert_eq!(dir.draft().name.first, "A");
    }

    #[test]
    fn test_rollback_skipped_when_record_changed() {
        let mut dir = Directory::new(WritePolicy::RollbackOnFailure);
        let ticket = dir.begin_load();
        dir.complete_load(ticket, Ok(three()));

        dir.begin_edit();
        ProfileField::FirstName.set(dir.draft_mut().unwrap(), "First".to_string());
        let first = dir.stage_save().unwrap();

        dir.begin_edit();
        ProfileField::FirstName.set(dir.draft_mut().unwrap(), "Second".to_string());
        let second = dir.stage_save().unwrap();

        dir.complete_save(first, Err(failure()));
        assert_eq!(dir.roster()[0].name.first, "Second");

        dir.complete_save(second, Ok(person("1", "Second")));
        assert_eq!(dir.roster()[0].name.first, "Second");
    }

    #[test]
    fn test_save_without_edit_is_noop() {
        let mut dir = Directory::default();
        let ticket = dir.begin_load();
        dir.complete_load(ticket, Ok(three()));
        assert!(dir.stage_save().is_none());
    }

    #[tokio::test]
    async fn test_add_merges_server_response() {
        let gateway = FakeGateway {
            roster: Some(three()),
            created: Some(r#"{"id": "999", "blood_group": "A-"}"#),
            ..Default::default()
        };
        let (mut store, gateway) = store_with(gateway, WritePolicy::default()).await;

        let mut candidate = UserRecord::blank_template();
        ProfileField::FirstName.set(&mut candidate, "New".to_string());
        ProfileField::BloodGroup.set(&mut candidate, "O+".to_string());
        store.add_record(candidate).await;

        let dir = store.directory();
        assert_eq!(dir.len(), 4);
        assert_eq!(dir.cursor(), 3);
        let added = &dir.roster()[3];
        assert_eq!(added.id, "999");
        assert_eq!(added.name.first, "New");
        assert_eq!(added.blood_group.as_deref(), Some("A-"));
        assert_eq!(dir.draft(), added);
        assert_eq!(dir.latest_notification().unwrap().message, "User added successfully!");

        let creates = gateway.creates.lock().unwrap();
        assert_eq!(creates[0].id.len(), 6);
    }

    #[tokio::test]
    async fn test_add_keeps_submitted_blood_group_when_server_omits_it() {
        let gateway = FakeGateway {
            roster: Some(three()),
            created: Some(r#"{"id": "999"}"#),
            ..Default::default()
        };
        let (mut store, _) = store_with(gateway, WritePolicy::default()).await;

        let mut candidate = UserRecord::blank_template();
        ProfileField::BloodGroup.set(&mut candidate, "B+".to_string());
        store.add_record(candidate).await;

        assert_eq!(store.directory().roster()[3].blood_group.as_deref(), Some("B+"));
    }

    #[tokio::test]
    async fn test_add_failure_keeps_placeholder() {
        let gateway = FakeGateway { roster: Some(three()), fail_writes: true, ..Default::default() };
        let (mut store, _) = store_with(gateway, WritePolicy::LocalAlwaysWins).await;

        store.add_record(person("", "Offline")).await;

        let dir = store.directory();
        assert_eq!(dir.len(), 4);
        assert_eq!(dir.cursor(), 3);
        let id: u32 = dir.roster()[3].id.parse().unwrap();
        assert!((100_000..1_000_000).contains(&id));
        assert!(dir.latest_notification().unwrap().message.starts_with("Failed to submit user:"));
    }

    #[tokio::test]
    async fn test_add_failure_removes_under_rollback() {
        let gateway = FakeGateway { roster: Some(three()), fail_writes: true, ..Default::default() };
        let (mut store, _) = store_with(gateway, WritePolicy::RollbackOnFailure).await;

        store.add_record(person("", "Offline")).await;

        let dir = store.directory();
        assert_eq!(dir.len(), 3);
        assert_eq!(dir.cursor(), 2);
        assert_eq!(dir.draft(), &dir.roster()[2]);
    }

    #[test]
    fn test_add_form_resets_after_submit() {
        let mut dir = Directory::default();
        dir.open_add_form();
        ProfileField::Username.set(dir.candidate_mut(), "newbie".to_string());

        let ticket = dir.submit_add_form();
        assert_eq!(ticket.submitted.username, "newbie");
        assert!(!dir.is_add_form_open());
        assert!(dir.candidate().username.is_empty());
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_close_add_form_keeps_candidate() {
        let mut dir = Directory::default();
        dir.open_add_form();
        ProfileField::Email.set(dir.candidate_mut(), "x@y.z".to_string());
        dir.close_add_form();
        assert!(!dir.is_add_form_open());

        dir.open_add_form();
        assert_eq!(dir.candidate().email, "x@y.z");
        assert!(dir.is_empty());

        dir.reset_add_form();
        assert!(!dir.is_add_form_open());
        assert!(dir.candidate().email.is_empty());
    }

    #[test]
    fn test_stale_load_is_dropped() {
        let mut dir = Directory::default();
        let old = dir.begin_load();
        let new = dir.begin_load();

        assert!(dir.complete_load(new, Ok(three())));
        assert!(!dir.complete_load(old, Ok(vec![person("9", "Old")])));
        assert_eq!(dir.len(), 3);
        assert!(!dir.is_loading());
    }

    #[test]
    fn test_refresh_invalidates_pending_add() {
        let mut dir = Directory::default();
        let ticket = dir.begin_load();
        dir.complete_load(ticket, Ok(three()));

        let add = dir.stage_add(person("", "Pending"));
        let reload = dir.begin_load();
        dir.complete_load(reload, Ok(three()));

        let mut server = RawProfile::new();
        server.insert("id".to_string(), serde_json::json!("42"));
        dir.complete_add(add, Ok(server));

        assert_eq!(dir.len(), 3);
        assert!(dir.roster().iter().all(|r| r.id != "42"));
    }

    #[test]
    fn test_write_policy_serde() {
        let policy: WritePolicy = serde_json::from_str("\"rollback_on_failure\"").unwrap();
        assert_eq!(policy, WritePolicy::RollbackOnFailure);
        assert_eq!(serde_json::to_string(&WritePolicy::default()).unwrap(), "\"local_always_wins\"");
    }
}
