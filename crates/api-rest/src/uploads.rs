//! Image upload endpoint used by the editor's image block.

use api_shared::{UploadForm, UploadRes};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};

use crate::AppState;

/// Multipart field carrying the image bytes.
pub(crate) const IMAGE_FIELD: &str = "image";

#[utoipa::path(
    post,
    path = "/api/upload/image",
    request_body(content = UploadForm, content_type = "multipart/form-data", description = "Form with an `image` file field"),
    responses(
        (status = 200, description = "Image stored", body = UploadRes),
        (status = 400, description = "Missing, empty, oversized or non-image upload", body = UploadRes),
        (status = 500, description = "Image could not be written", body = UploadRes)
    )
)]
/// Store an uploaded image
///
/// Reads the `image` field of a multipart form and stores its bytes content-addressed under the
/// uploads directory.
///
/// # Returns
/// * `{success: 1, file: {url}}` where `url` is served by `GET /uploads/...`
///
/// # Errors
/// Returns `{success: 0, message}` with `400 Bad Request` when the upload is missing, empty,
/// over the size cap or not an image, and `500` when writing fails.
#[axum::debug_handler]
pub(crate) async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<UploadRes>) {
    let bytes = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(IMAGE_FIELD) => match field.bytes().await {
                Ok(bytes) => break bytes,
                Err(e) => return failed(StatusCode::BAD_REQUEST, e.body_text()),
            },
            Ok(Some(_)) => continue,
            Ok(None) => return failed(StatusCode::BAD_REQUEST, "No file uploaded".into()),
            Err(e) => return failed(StatusCode::BAD_REQUEST, e.body_text()),
        }
    };

    match state.images.store(&bytes) {
        Ok(stored) => (StatusCode::OK, Json(UploadRes::stored(stored.url))),
        Err(e) if e.is_client_error() => failed(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            tracing::error!("Upload image error: {:?}", e);
            failed(StatusCode::INTERNAL_SERVER_ERROR, "Upload failed".into())
        }
    }
}

fn failed(status: StatusCode, message: String) -> (StatusCode, Json<UploadRes>) {
    (status, Json(UploadRes::failed(message)))
}
