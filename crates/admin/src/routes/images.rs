//! Shared crop-and-upload handling for the artwork and blog forms.
//!
//! The crop widget posts a multipart form: the original `file`, the crop
//! rectangle in displayed pixels, the displayed image size, `zoom`,
//! `aspect`, and an optional `upload_id` used for progress polling.

use axum::extract::Multipart;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use micrart_core::crop::{AspectRatio, CropRect, CropRequest};

use crate::error::{AppError, Result};
use crate::models::AdminSession;
use crate::services::media::JPEG_CONTENT_TYPE;
use crate::services::{CroppedImage, MediaError, crop_to_jpeg};
use crate::state::AppState;

const MAX_STEM_LEN: usize = 60;

/// A decoded multipart upload from the crop widget.
#[derive(Debug)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub crop: CropRequest,
    pub upload_id: Option<Uuid>,
}

/// Where a cropped image is stored.
#[derive(Debug, Clone)]
pub struct ImageTarget<'a> {
    pub bucket: &'a str,
    pub object_name: String,
    pub upsert: bool,
}

/// Response for a stored image.
#[derive(Debug, Clone, Serialize)]
pub struct StoredImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Default)]
struct CropFields {
    x: Option<f64>,
    y: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    displayed_width: Option<f64>,
    displayed_height: Option<f64>,
    zoom: Option<f64>,
    aspect: Option<AspectRatio>,
}

fn required(value: Option<f64>, name: &str) -> Result<f64> {
    value.ok_or_else(|| AppError::BadRequest(format!("missing field `{name}`")))
}

fn parse_number(name: &str, text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| AppError::BadRequest(format!("field `{name}` must be a number")))
}

/// Read the crop widget's multipart form.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for malformed multipart data or a missing
/// or non-numeric crop field, and `MediaError::MissingFile` if no file was
/// sent.
pub async fn read_image_upload(mut multipart: Multipart) -> Result<ImageUpload> {
    let mut bytes = None;
    let mut file_name = None;
    let mut upload_id = None;
    let mut fields = CropFields::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid upload: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "file" {
            file_name = field.file_name().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("invalid upload: {e}")))?;
            bytes = Some(data.to_vec());
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("invalid upload: {e}")))?;
        match name.as_str() {
            "x" => fields.x = Some(parse_number(&name, &text)?),
            "y" => fields.y = Some(parse_number(&name, &text)?),
            "width" => fields.width = Some(parse_number(&name, &text)?),
            "height" => fields.height = Some(parse_number(&name, &text)?),
            "displayed_width" => fields.displayed_width = Some(parse_number(&name, &text)?),
            "displayed_height" => fields.displayed_height = Some(parse_number(&name, &text)?),
            "zoom" => fields.zoom = Some(parse_number(&name, &text)?),
            "aspect" => {
                fields.aspect = Some(text.parse().map_err(MediaError::from)?);
            }
            "upload_id" if !text.trim().is_empty() => {
                upload_id = Some(
                    Uuid::parse_str(text.trim())
                        .map_err(|_| AppError::BadRequest("invalid upload id".to_string()))?,
                );
            }
            _ => {}
        }
    }

    let bytes = bytes
        .filter(|b| !b.is_empty())
        .ok_or(MediaError::MissingFile)?;

    Ok(ImageUpload {
        bytes,
        file_name,
        crop: CropRequest {
            rect: CropRect {
                x: required(fields.x, "x")?,
                y: required(fields.y, "y")?,
                width: required(fields.width, "width")?,
                height: required(fields.height, "height")?,
            },
            displayed_width: required(fields.displayed_width, "displayed_width")?,
            displayed_height: required(fields.displayed_height, "displayed_height")?,
            zoom: fields.zoom.unwrap_or(1.0),
            aspect: fields.aspect,
        },
        upload_id,
    })
}

/// Crop the upload off the async runtime and store it as the signed-in
/// admin, ticking simulated progress while the work is in flight.
///
/// # Errors
///
/// Returns `AppError` if cropping or the storage upload fails. Nothing is
/// stored on failure.
pub async fn store(
    state: &AppState,
    admin: &AdminSession,
    upload: ImageUpload,
    target: ImageTarget<'_>,
) -> Result<StoredImage> {
    let ImageUpload {
        bytes,
        crop,
        upload_id,
        ..
    } = upload;
    let storage = &state.backend().storage;

    state
        .uploads()
        .run(upload_id, async {
            let cropped: CroppedImage =
                tokio::task::spawn_blocking(move || crop_to_jpeg(&bytes, &crop))
                    .await
                    .map_err(|e| AppError::Internal(format!("crop task failed: {e}")))??;

            let path = storage
                .upload(
                    target.bucket,
                    &target.object_name,
                    cropped.bytes,
                    JPEG_CONTENT_TYPE,
                    target.upsert,
                    &admin.auth.access_token,
                )
                .await?;

            tracing::info!(
                bucket = target.bucket,
                path = %path,
                width = cropped.width,
                height = cropped.height,
                "Stored cropped image"
            );

            Ok::<_, AppError>(StoredImage {
                url: storage.public_url(target.bucket, &path),
                width: cropped.width,
                height: cropped.height,
            })
        })
        .await
}

/// `artwork-{unix_millis}.jpg`
#[must_use]
pub fn artwork_object_name(millis: i64) -> String {
    format!("artwork-{millis}.jpg")
}

/// `blog-{unix_millis}-{stem}.jpg`, where `stem` is the original file name
/// reduced to lowercase ASCII letters, digits, `-` and `_`.
#[must_use]
pub fn blog_object_name(millis: i64, file_name: Option<&str>) -> String {
    let stem = file_name
        .map(|name| name.rsplit_once('.').map_or(name, |(stem, _)| stem))
        .unwrap_or_default()
        .chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '_' => Some(c),
            'A'..='Z' => Some(c.to_ascii_lowercase()),
            ' ' => Some('-'),
            _ => None,
        })
        .take(MAX_STEM_LEN)
        .collect::<String>();
    let stem = if stem.trim_matches('-').is_empty() {
        "cover".to_string()
    } else {
        stem
    };
    format!("blog-{millis}-{stem}.jpg")
}

/// One aspect preset in the crop widget.
#[derive(Debug, Clone)]
pub struct AspectOption {
    pub label: &'static str,
    pub selected: bool,
}

/// The crop widget's presets, with the default preselected.
#[must_use]
pub fn aspect_options() -> Vec<AspectOption> {
    AspectRatio::ALL
        .into_iter()
        .map(|aspect| AspectOption {
            label: aspect.label(),
            selected: aspect == AspectRatio::default(),
        })
        .collect()
}

/// Current time for object names.
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
