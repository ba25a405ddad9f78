use serde::{Deserialize, Serialize};

// -- Entries --

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Body for POST /update-data. `id` is optional so the handler can reject
/// its absence with a 400 instead of a deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    pub id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub room_number: Option<i64>,
    pub additional_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEntryRequest {
    pub id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImageRequest {
    pub entry_id: Option<i64>,
    pub image_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageListResponse {
    pub images: Vec<String>,
}

// -- Timesheets --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewRowRequest {
    pub entry_id: i64,
    pub timesheet_row: i64,
}

#[derive(Debug, Serialize)]
pub struct NewRowResponse {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignInRequest {
    pub entry_id: i64,
    pub timesheet_row: i64,
    pub room_number: Option<i64>,
    pub sign_in: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignOutRequest {
    pub entry_id: i64,
    pub timesheet_row: i64,
    pub sign_out: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateRowRequest {
    pub entry_id: i64,
    pub timesheet_row: i64,
    pub room_number: Option<i64>,
    pub sign_in: Option<String>,
    pub sign_out: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeleteRowRequest {
    pub entry_id: i64,
    pub timesheet_row: i64,
}
