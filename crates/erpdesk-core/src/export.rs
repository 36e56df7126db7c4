//! Spreadsheet export of the roster.
//!
//! The workbook is encoded entirely in memory; the file is only written once
//! encoding has succeeded.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;
use tracing::info;

use crate::models::UserRecord;

pub const EXPORT_FILE_NAME: &str = "users_data.xlsx";

const SHEET_NAME: &str = "Users";

pub const EXPORT_HEADERS: [&str; 15] = [
    "User ID",
    "First Name",
    "Last Name",
    "Username",
    "Email",
    "Phone",
    "Date of Birth",
    "Blood Group",
    "Street Address",
    "City",
    "State",
    "Postal Code",
    "Country",
    "Account Created",
    "Last Login",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to build spreadsheet: {0}")]
    Serialization(#[from] XlsxError),

    #[error("Failed to write export file: {0}")]
    Io(#[from] std::io::Error),
}

/// One row per record, columns in [`EXPORT_HEADERS`] order
pub fn export_rows(roster: &[UserRecord]) -> Vec<[String; 15]> {
    roster
        .iter()
        .map(|r| {
            [
                r.id.clone(),
                r.name.first.clone(),
                r.name.last.clone(),
                r.username.clone(),
                r.email.clone(),
                r.phone.clone(),
                r.date_of_birth.clone(),
                r.blood_group_display().to_string(),
                r.address.street.clone(),
                r.address.city.clone(),
                r.address.state.clone(),
                r.address.postal_code.clone(),
                r.address.country.clone(),
                r.account_created.clone(),
                r.last_login.clone(),
            ]
        })
        .collect()
}

/// Encode the roster as an xlsx workbook
pub fn encode_workbook(roster: &[UserRecord]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, title) in EXPORT_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header_format)?;
    }
    for (row, cells) in export_rows(roster).iter().enumerate() {
        for (col, value) in cells.iter().enumerate() {
            sheet.write_string(row as u32 + 1, col as u16, value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Write `users_data.xlsx` into `dir`, creating it if needed.
pub fn export_roster(roster: &[UserRecord], dir: &Path) -> Result<PathBuf, ExportError> {
    let bytes = encode_workbook(roster)?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(EXPORT_FILE_NAME);
    std::fs::write(&path, bytes)?;

    info!(path = %path.display(), rows = roster.len(), "Roster exported");
    Ok(path)
}
