//! Core library for the ERP admin console.
//!
//! Everything below the presentation layer lives here: the profile service
//! client, the directory store, the local session, configuration and the
//! spreadsheet export.

pub mod api;
pub mod auth;
pub mod config;
pub mod export;
pub mod models;
pub mod storage;
pub mod store;
pub mod utils;
