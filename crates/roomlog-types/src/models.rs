use serde::{Deserialize, Serialize};

/// A stored record: person, room, free text, attached image references.
///
/// `images` holds the stored file names assigned by the image store, in
/// insertion order. The bytes themselves live on disk, not in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub room_number: Option<i64>,
    pub additional_text: Option<String>,
    pub images: Vec<String>,
    pub created_at: String,
}

/// One sign-in/sign-out record belonging to an entry.
///
/// `timesheet_row` is the row's position within its entry; every entry
/// always has at least a row 0 (created and refilled by the database).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetRow {
    pub id: i64,
    pub entry_id: i64,
    pub timesheet_row: i64,
    pub room_number: Option<i64>,
    pub sign_in: Option<String>,
    pub sign_out: Option<String>,
}
