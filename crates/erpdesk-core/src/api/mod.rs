//! Profile Sync Gateway.
//!
//! This module provides the `ProfileGateway` trait that the directory store
//! talks to, and `ProfileClient`, its REST implementation for the
//! `/api/user-profiles` service.
//!
//! All inbound data passes through `wire`, which resolves the service's
//! inconsistent field naming into canonical `UserRecord`s.

pub mod client;
pub mod error;
pub mod wire;

use async_trait::async_trait;

use crate::models::UserRecord;

pub use client::{ProfileClient, DEFAULT_BASE_URL};
pub use error::ApiError;

/// A created profile as returned by the server, before it is merged over the
/// submitted record.
pub type RawProfile = serde_json::Map<String, serde_json::Value>;

/// Remote operations on the profile roster. One request per call, no retry.
#[async_trait]
pub trait ProfileGateway: Send + Sync {
    /// Fetch the whole roster
    async fn list_all(&self) -> Result<Vec<UserRecord>, ApiError>;

    /// Replace the profile with `id`
    async fn update_one(&self, id: &str, record: &UserRecord) -> Result<UserRecord, ApiError>;

    /// Submit a new profile. The server may assign its own id.
    async fn create_one(&self, record: &UserRecord) -> Result<RawProfile, ApiError>;
}
