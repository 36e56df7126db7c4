//! Data models for the admin console.
//!
//! - `UserRecord`, `PersonName`, `Address`: a user profile in canonical form
//! - `ProfileField`, `FormSection`: addressing and grouping of editable fields
//! - Dashboard types: the static overview figures

pub mod dashboard;
pub mod profile;

pub use dashboard::{Activity, PerformanceBand, PerformanceEntry, Priority, StatCard, Task};
pub use profile::{seed_profiles, Address, FormSection, PersonName, ProfileField, UserRecord};
