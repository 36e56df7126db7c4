//! Directory Store.
//!
//! Owns the in-memory roster and everything the profile screens display:
//! the cursor, the edit draft, the add-user candidate and the queue of
//! transient notifications.

pub mod directory;
pub mod notification;

pub use directory::{placeholder_id, AddTicket, Direction, Directory, DirectoryStore, LoadTicket, SaveTicket, WritePolicy};
pub use notification::{Notification, NotificationLevel};
