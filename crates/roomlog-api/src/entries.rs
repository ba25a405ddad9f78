use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::StatusCode,
};
use bytes::Bytes;
use tracing::info;

use roomlog_types::api::{
    DeleteEntryRequest, DeleteImageRequest, ImageListResponse, SearchQuery, SubmitResponse,
    UpdateEntryRequest,
};
use roomlog_types::models::Entry;

use crate::AppState;
use crate::error::{ApiError, ApiResult};

/// Upload boundary: at most 10 images per request (submit and add-image).
const MAX_IMAGES_PER_REQUEST: usize = 10;

/// Text fields plus uploaded files, pulled out of one multipart body.
#[derive(Default)]
struct EntryForm {
    first_name: Option<String>,
    last_name: Option<String>,
    room_number: Option<i64>,
    additional_text: Option<String>,
    entry_id: Option<i64>,
    files: Vec<(String, Bytes)>,
}

async fn read_form(mut multipart: Multipart) -> ApiResult<EntryForm> {
    let mut form = EntryForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.file_name().is_some() {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await.map_err(bad_multipart)?;
            // Browsers send an empty file part when no file was picked
            if !data.is_empty() {
                form.files.push((file_name, data));
            }
            continue;
        }

        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.map_err(bad_multipart)?;
        match name.as_str() {
            "firstName" => form.first_name = non_empty(value),
            "lastName" => form.last_name = non_empty(value),
            "additionalText" => form.additional_text = non_empty(value),
            "roomNumber" => form.room_number = parse_room(&value)?,
            "entryId" => form.entry_id = Some(parse_id(&value)?),
            _ => {}
        }
    }

    if form.files.len() > MAX_IMAGES_PER_REQUEST {
        return Err(ApiError::Validation(format!(
            "at most {MAX_IMAGES_PER_REQUEST} images per request"
        )));
    }

    Ok(form)
}

/// POST /submit-data — multipart: text fields + 0..10 image files.
/// Files are written to the image store first; if the entry insert then
/// fails they stay on disk (no cross-system rollback).
pub async fn submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<SubmitResponse>> {
    let form = read_form(multipart).await?;

    let mut images = Vec::with_capacity(form.files.len());
    for (file_name, data) in &form.files {
        images.push(state.storage.save(file_name, data).await?);
    }

    let id = state.db.create_entry(
        form.first_name.as_deref(),
        form.last_name.as_deref(),
        form.room_number,
        form.additional_text.as_deref(),
        &images,
    )?;

    info!("Created entry {} with {} images", id, images.len());
    Ok(Json(SubmitResponse { id }))
}

/// GET /get-data?q= — all entries, or a case-insensitive substring search
/// across name, room number and free text.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Entry>>> {
    let entries = state.db.search_entries(query.q.as_deref())?;
    Ok(Json(entries))
}

/// POST /update-data — text fields only; the image list is untouched.
pub async fn update(
    State(state): State<AppState>,
    Json(req): Json<UpdateEntryRequest>,
) -> ApiResult<StatusCode> {
    let id = req.id.ok_or_else(missing_id)?;

    let changed = state.db.update_entry(
        id,
        req.first_name.as_deref(),
        req.last_name.as_deref(),
        req.room_number,
        req.additional_text.as_deref(),
    )?;
    if changed == 0 {
        return Err(ApiError::NotFound(format!("no entry with id {id}")));
    }

    Ok(StatusCode::OK)
}

/// POST /delete-data — deletes the entry and (in-database) all its
/// timesheet rows. Image files stay in the store; only delete-image
/// removes files.
pub async fn delete(
    State(state): State<AppState>,
    Json(req): Json<DeleteEntryRequest>,
) -> ApiResult<StatusCode> {
    let id = req.id.ok_or_else(missing_id)?;

    let changed = state.db.delete_entry(id)?;
    if changed == 0 {
        return Err(ApiError::NotFound(format!("no entry with id {id}")));
    }

    info!("Deleted entry {}", id);
    Ok(StatusCode::OK)
}

/// POST /add-image — multipart: entryId + 1..10 image files. Appends the
/// new references to the entry's list, preserving insertion order.
pub async fn add_images(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<ImageListResponse>> {
    let form = read_form(multipart).await?;
    let id = form.entry_id.ok_or_else(|| missing_field("entryId"))?;
    if form.files.is_empty() {
        return Err(ApiError::Validation("no image files supplied".into()));
    }

    let entry = state
        .db
        .get_entry(id)?
        .ok_or_else(|| ApiError::NotFound(format!("no entry with id {id}")))?;

    let mut images = entry.images;
    for (file_name, data) in &form.files {
        images.push(state.storage.save(file_name, data).await?);
    }

    let changed = state.db.update_entry_images(id, &images)?;
    if changed == 0 {
        // Entry vanished between the read and the write
        return Err(ApiError::NotFound(format!("no entry with id {id}")));
    }

    info!("Added {} images to entry {}", form.files.len(), id);
    Ok(Json(ImageListResponse { images }))
}

/// POST /delete-image — removes the file from the store first; only a
/// successful file deletion touches the entry's image list.
pub async fn delete_image(
    State(state): State<AppState>,
    Json(req): Json<DeleteImageRequest>,
) -> ApiResult<Json<ImageListResponse>> {
    let id = req.entry_id.ok_or_else(|| missing_field("entryId"))?;
    let image_name = req
        .image_name
        .ok_or_else(|| missing_field("imageName"))?;

    state.storage.delete(&image_name).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            ApiError::NotFound(format!("no image named {image_name}"))
        }
        std::io::ErrorKind::InvalidInput => ApiError::Validation(e.to_string()),
        _ => ApiError::Storage(e.into()),
    })?;

    let entry = state
        .db
        .get_entry(id)?
        .ok_or_else(|| ApiError::NotFound(format!("no entry with id {id}")))?;

    let images: Vec<String> = entry
        .images
        .into_iter()
        .filter(|name| *name != image_name)
        .collect();

    state.db.update_entry_images(id, &images)?;

    info!("Deleted image {} from entry {}", image_name, id);
    Ok(Json(ImageListResponse { images }))
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::Validation(format!("malformed multipart body: {err}"))
}

fn missing_id() -> ApiError {
    missing_field("id")
}

fn missing_field(field: &str) -> ApiError {
    ApiError::Validation(format!("missing {field}"))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn parse_room(value: &str) -> ApiResult<Option<i64>> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ApiError::Validation("roomNumber must be an integer".into()))
}

fn parse_id(value: &str) -> ApiResult<i64> {
    value
        .parse()
        .map_err(|_| ApiError::Validation("entryId must be an integer".into()))
}
