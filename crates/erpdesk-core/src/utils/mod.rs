//! Display formatting helpers.

pub mod format;

pub use format::{format_date, format_phone, mask_secret, truncate_string};
