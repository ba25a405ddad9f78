use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::warn;

use roomlog_types::api::{
    DeleteRowRequest, NewRowRequest, NewRowResponse, SignInRequest, SignOutRequest,
    UpdateRowRequest,
};
use roomlog_types::models::TimesheetRow;

use crate::AppState;
use crate::error::{ApiError, ApiResult};

/// GET /timesheets/{entryId} — rows ordered by index ascending.
pub async fn list(
    State(state): State<AppState>,
    Path(entry_id): Path<i64>,
) -> ApiResult<Json<Vec<TimesheetRow>>> {
    let rows = state.db.list_timesheet_rows(entry_id)?;
    Ok(Json(rows))
}

/// GET /timesheets/get-current-row/{entryId} — the highest-index row, the
/// slot the next sign-in/out targets.
pub async fn get_current_row(
    State(state): State<AppState>,
    Path(entry_id): Path<i64>,
) -> ApiResult<Json<TimesheetRow>> {
    let row = state
        .db
        .latest_timesheet_row(entry_id)?
        .ok_or_else(|| ApiError::NotFound(format!("no rows for entry {entry_id}")))?;
    Ok(Json(row))
}

/// POST /timesheets/newRow — the caller picks the index; a clash with an
/// existing index surfaces as a storage error.
pub async fn new_row(
    State(state): State<AppState>,
    Json(req): Json<NewRowRequest>,
) -> ApiResult<Json<NewRowResponse>> {
    let id = state
        .db
        .insert_timesheet_row(req.entry_id, req.timesheet_row)?;
    Ok(Json(NewRowResponse { id }))
}

/// POST /timesheets/signIn — sets room + sign-in time on the targeted row.
/// A miss is not an error: the update silently changes zero rows.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> ApiResult<StatusCode> {
    let changed = state.db.sign_in_row(
        req.entry_id,
        req.timesheet_row,
        req.room_number,
        req.sign_in.as_deref(),
    )?;
    if changed == 0 {
        warn!(
            "signIn matched no row (entry {}, row {})",
            req.entry_id, req.timesheet_row
        );
    }
    Ok(StatusCode::OK)
}

/// POST /timesheets/signOut — unlike signIn, a miss reports 404.
pub async fn sign_out(
    State(state): State<AppState>,
    Json(req): Json<SignOutRequest>,
) -> ApiResult<StatusCode> {
    let changed =
        state
            .db
            .sign_out_row(req.entry_id, req.timesheet_row, req.sign_out.as_deref())?;
    if changed == 0 {
        return Err(ApiError::NotFound(format!(
            "no row {} for entry {}",
            req.timesheet_row, req.entry_id
        )));
    }
    Ok(StatusCode::OK)
}

/// POST /timesheets/updateRow — full update of the three mutable fields;
/// no existence check, same as signIn.
pub async fn update_row(
    State(state): State<AppState>,
    Json(req): Json<UpdateRowRequest>,
) -> ApiResult<StatusCode> {
    let changed = state.db.update_timesheet_row(
        req.entry_id,
        req.timesheet_row,
        req.room_number,
        req.sign_in.as_deref(),
        req.sign_out.as_deref(),
    )?;
    if changed == 0 {
        warn!(
            "updateRow matched no row (entry {}, row {})",
            req.entry_id, req.timesheet_row
        );
    }
    Ok(StatusCode::OK)
}

/// DELETE /timesheets/deleteRow — if this was the entry's last row, the
/// database refills a blank row 0 in the same statement.
pub async fn delete_row(
    State(state): State<AppState>,
    Json(req): Json<DeleteRowRequest>,
) -> ApiResult<StatusCode> {
    state
        .db
        .delete_timesheet_row(req.entry_id, req.timesheet_row)?;
    Ok(StatusCode::OK)
}
