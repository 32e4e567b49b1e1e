//! Tag endpoints.

use api_shared::{CreateTagReq, ErrorRes, TagRes, UpdateTagReq};
use axum::{
    extract::{rejection::JsonRejection, Path as AxumPath, State},
    http::StatusCode,
    response::Json,
};
use guidebook_core::{NewTag, Tag, TagPatch};
use guidebook_types::{HexColour, NonEmptyText};

use crate::error::{guide_error, json_body, validation, ApiError};
use crate::AppState;

pub(crate) fn tag_res(tag: Tag) -> TagRes {
    TagRes {
        id: tag.id,
        name: tag.name,
        slug: tag.slug,
        color: tag.color.to_string(),
    }
}

/// Validates the optional name and colour of a tag request, collecting every problem.
fn tag_fields(
    name: Option<&str>,
    color: Option<&str>,
) -> Result<(Option<NonEmptyText>, Option<HexColour>), ApiError> {
    let mut errors = Vec::new();

    let name = match name.map(NonEmptyText::new) {
        Some(Ok(name)) => Some(name),
        Some(Err(_)) => {
            errors.push("name must not be empty".to_string());
            None
        }
        None => None,
    };
    let color = match color.map(HexColour::parse) {
        Some(Ok(color)) => Some(color),
        Some(Err(e)) => {
            errors.push(e.to_string());
            None
        }
        None => None,
    };

    if errors.is_empty() {
        Ok((name, color))
    } else {
        Err(validation(errors))
    }
}

#[utoipa::path(
    get,
    path = "/api/tags",
    responses(
        (status = 200, description = "All tags ordered by name", body = [TagRes])
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_tags(State(state): State<AppState>) -> Json<Vec<TagRes>> {
    Json(state.store.tags().list().into_iter().map(tag_res).collect())
}

#[utoipa::path(
    post,
    path = "/api/tags",
    request_body = CreateTagReq,
    responses(
        (status = 201, description = "Tag created", body = TagRes),
        (status = 400, description = "Validation error", body = ErrorRes),
        (status = 409, description = "Name or slug already in use", body = ErrorRes)
    )
)]
/// Create a tag
///
/// # Errors
/// Returns `400 Bad Request` for an empty name or malformed colour and `409 Conflict` if another
/// tag has the same name or slug.
#[axum::debug_handler]
pub(crate) async fn create_tag(
    State(state): State<AppState>,
    payload: Result<Json<CreateTagReq>, JsonRejection>,
) -> Result<(StatusCode, Json<TagRes>), ApiError> {
    let req = json_body(payload)?;
    let (name, color) = tag_fields(Some(&req.name), req.color.as_deref())?;
    let Some(name) = name else {
        return Err(validation(vec!["name must not be empty".into()]));
    };

    match state.store.tags().create(NewTag { name, color }) {
        Ok(tag) => Ok((StatusCode::CREATED, Json(tag_res(tag)))),
        Err(e) => Err(guide_error(e)),
    }
}

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    params(("id" = String, Path, description = "Tag id")),
    responses(
        (status = 200, description = "Tag", body = TagRes),
        (status = 404, description = "Tag not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_tag(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<TagRes>, ApiError> {
    state
        .store
        .tags()
        .get(&id)
        .map(|tag| Json(tag_res(tag)))
        .map_err(guide_error)
}

#[utoipa::path(
    put,
    path = "/api/tags/{id}",
    params(("id" = String, Path, description = "Tag id")),
    request_body = UpdateTagReq,
    responses(
        (status = 200, description = "Tag updated", body = TagRes),
        (status = 400, description = "Validation error", body = ErrorRes),
        (status = 404, description = "Tag not found", body = ErrorRes),
        (status = 409, description = "Name or slug already in use", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_tag(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    payload: Result<Json<UpdateTagReq>, JsonRejection>,
) -> Result<Json<TagRes>, ApiError> {
    let req = json_body(payload)?;
    let (name, color) = tag_fields(req.name.as_deref(), req.color.as_deref())?;
    state
        .store
        .tags()
        .update(&id, TagPatch { name, color })
        .map(|tag| Json(tag_res(tag)))
        .map_err(guide_error)
}

#[utoipa::path(
    delete,
    path = "/api/tags/{id}",
    params(("id" = String, Path, description = "Tag id")),
    responses(
        (status = 204, description = "Tag deleted and removed from every guide"),
        (status = 404, description = "Tag not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_tag(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .tags()
        .delete(&id)
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(guide_error)
}
