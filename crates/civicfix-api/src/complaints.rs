use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, State, multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use tracing::{debug, error, info, warn};

use civicfix_db::models::NewComplaint;
use civicfix_types::api::{
    ComplaintResponse, SubmitComplaintResponse, UpdateStatusRequest, UpdateStatusResponse,
};
use civicfix_types::models::{ANONYMOUS_USERNAME, AttachmentKind, TIMESTAMP_FORMAT};

use crate::auth::AppState;
use crate::blocking;

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("Invalid coordinate: {0:?}")]
pub struct InvalidCoordinate(String);

/// Parses an optional form coordinate. Missing or blank input is `None`;
/// anything else must be a finite number.
pub fn parse_coordinate(raw: Option<&str>) -> Result<Option<f64>, InvalidCoordinate> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(InvalidCoordinate(s.to_string())),
        },
    }
}

#[derive(Debug, Default)]
struct ComplaintForm {
    title: String,
    description: String,
    category: String,
    priority: String,
    lat: Option<String>,
    lng: Option<String>,
    location_text: String,
    image: Option<Bytes>,
    voice: Option<Bytes>,
}

impl ComplaintForm {
    async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "title" => form.title = field.text().await?,
                "description" => form.description = field.text().await?,
                "category" => form.category = field.text().await?,
                "priority" => form.priority = field.text().await?,
                "lat" => form.lat = Some(field.text().await?),
                "lng" => form.lng = Some(field.text().await?),
                "location_text" => form.location_text = field.text().await?,
                "image" => form.image = non_empty(field.bytes().await?),
                "voice" => form.voice = non_empty(field.bytes().await?),
                other => debug!("Ignoring unexpected form field {:?}", other),
            }
        }

        Ok(form)
    }
}

/// An empty file input still sends a part; treat it as no attachment.
fn non_empty(data: Bytes) -> Option<Bytes> {
    (!data.is_empty()).then_some(data)
}

async fn store_attachment(
    state: &AppState,
    kind: AttachmentKind,
    data: Option<&Bytes>,
) -> Result<Option<String>, StatusCode> {
    let Some(data) = data else {
        return Ok(None);
    };

    let name = state.storage.save(kind, data).await.map_err(|e| {
        error!("Failed to store {:?} attachment: {}", kind, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Some(name))
}

async fn discard_attachments(state: &AppState, names: &[&Option<String>]) {
    for name in names.iter().filter_map(|n| n.as_deref()) {
        if let Err(e) = state.storage.delete_file(name).await {
            warn!("Failed to remove orphaned attachment {}: {}", name, e);
        }
    }
}

fn rejected(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(SubmitComplaintResponse {
            success: false,
            message,
        }),
    )
        .into_response()
}

/// POST /submit-complaint: multipart form with optional `image` and `voice`
/// files. Open to anonymous callers.
pub async fn submit_complaint(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Response, StatusCode> {
    let form = ComplaintForm::read(multipart).await.map_err(|e| {
        warn!("Malformed complaint form: {}", e);
        e.status()
    })?;

    let (latitude, longitude) = match (
        parse_coordinate(form.lat.as_deref()),
        parse_coordinate(form.lng.as_deref()),
    ) {
        (Ok(lat), Ok(lng)) => (lat, lng),
        (Err(e), _) | (_, Err(e)) => return Ok(rejected(e.to_string())),
    };

    let username = state
        .session
        .claims(&jar)
        .map(|claims| claims.username)
        .unwrap_or_else(|| ANONYMOUS_USERNAME.to_string());

    let image = store_attachment(&state, AttachmentKind::Image, form.image.as_ref()).await?;
    let voice = match store_attachment(&state, AttachmentKind::Voice, form.voice.as_ref()).await {
        Ok(voice) => voice,
        Err(status) => {
            discard_attachments(&state, &[&image]).await;
            return Err(status);
        }
    };

    let complaint = NewComplaint {
        username,
        title: form.title,
        description: form.description,
        category: form.category,
        priority: form.priority,
        latitude,
        longitude,
        location_text: form.location_text,
        image: image.clone(),
        voice: voice.clone(),
        created_at: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
    };

    let db = state.db.clone();
    let inserted = blocking(move || db.insert_complaint(&complaint)).await;

    let id = match inserted {
        Ok(id) => id,
        Err(status) => {
            discard_attachments(&state, &[&image, &voice]).await;
            return Err(status);
        }
    };

    info!("Complaint {} submitted", id);

    Ok(Json(SubmitComplaintResponse {
        success: true,
        message: "Complaint submitted successfully".to_string(),
    })
    .into_response())
}

/// GET /get-complaints: every complaint, newest first.
pub async fn get_complaints(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let rows = blocking(move || db.list_complaints()).await?;

    let complaints: Vec<ComplaintResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(complaints))
}

/// POST /update-status/{id}: overwrites the status with any non-blank
/// string, stored as sent. An unknown id is not an error.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Response, StatusCode> {
    let status = match body {
        Ok(Json(req)) => req.status.filter(|s| !s.trim().is_empty()),
        Err(rejection) => {
            warn!("Malformed status update for complaint {}: {}", id, rejection.body_text());
            None
        }
    };

    let Some(status) = status else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(UpdateStatusResponse { success: false }),
        )
            .into_response());
    };

    let db = state.db.clone();
    let new_status = status.clone();
    let changed = blocking(move || db.update_complaint_status(id, &new_status)).await?;

    if changed == 0 {
        debug!("Status update for unknown complaint {}", id);
    } else {
        info!("Complaint {} status set to {:?}", id, status);
    }

    Ok(Json(UpdateStatusResponse { success: true }).into_response())
}
