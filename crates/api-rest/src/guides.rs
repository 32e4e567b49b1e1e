//! Guide endpoints: CRUD, search, and the three renderings of a guide's content.

use api_shared::{
    CreateGuideReq, DocumentRes, DocumentStatsRes, ErrorRes, GuideRes, ListGuidesQuery,
    TocEntryRes, UpdateGuideReq,
};
use axum::{
    extract::{rejection::JsonRejection, Path as AxumPath, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
};
use chrono::{SecondsFormat, Utc};
use guidebook_content::{derive_toc, render_export, render_view, ExportOptions, TocStats};
use guidebook_core::{GuideFilter, GuidePatch, GuideWithTags, NewGuide};
use guidebook_types::NonEmptyText;

use crate::error::{guide_error, json_body, internal, validation, ApiError};
use crate::tags::tag_res;
use crate::AppState;

pub(crate) fn guide_res(guide: GuideWithTags) -> GuideRes {
    GuideRes {
        id: guide.id,
        title: guide.title,
        slug: guide.slug,
        description: guide.description,
        content: guide.content,
        tags: guide.tags.into_iter().map(tag_res).collect(),
        created_at: guide.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        updated_at: guide.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

fn required_title(title: &str) -> Result<NonEmptyText, ApiError> {
    NonEmptyText::new(title).map_err(|_| validation(vec!["title must not be empty".into()]))
}

#[utoipa::path(
    get,
    path = "/api/guides",
    params(ListGuidesQuery),
    responses(
        (status = 200, description = "Guides, newest first", body = [GuideRes])
    )
)]
/// List guides, optionally filtered by title search and tag.
#[axum::debug_handler]
pub(crate) async fn list_guides(
    State(state): State<AppState>,
    Query(query): Query<ListGuidesQuery>,
) -> Json<Vec<GuideRes>> {
    let filter = GuideFilter {
        search: query.search,
        tag: query.tag,
    };
    let guides = state.store.guides().list(&filter);
    Json(guides.into_iter().map(guide_res).collect())
}

#[utoipa::path(
    post,
    path = "/api/guides",
    request_body = CreateGuideReq,
    responses(
        (status = 201, description = "Guide created", body = GuideRes),
        (status = 400, description = "Validation error", body = ErrorRes),
        (status = 409, description = "Slug already in use", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Create a guide
///
/// # Arguments
/// * `req` - Title, optional slug/description/content and the tags to associate
///
/// # Returns
/// * `201` with the created guide and its tags
///
/// # Errors
/// Returns `400 Bad Request` for an empty title or an unknown tag id, and `409 Conflict` if the
/// slug is taken.
#[axum::debug_handler]
pub(crate) async fn create_guide(
    State(state): State<AppState>,
    payload: Result<Json<CreateGuideReq>, JsonRejection>,
) -> Result<(StatusCode, Json<GuideRes>), ApiError> {
    let req = json_body(payload)?;
    let new = NewGuide {
        title: required_title(&req.title)?,
        slug: req.slug,
        description: req.description,
        content: req.content,
    };
    match state.store.guides().create(new, req.tag_ids) {
        Ok(guide) => Ok((StatusCode::CREATED, Json(guide_res(guide)))),
        Err(e) => Err(guide_error(e)),
    }
}

#[utoipa::path(
    get,
    path = "/api/guides/{id}",
    params(("id" = String, Path, description = "Guide id")),
    responses(
        (status = 200, description = "Guide with tags", body = GuideRes),
        (status = 404, description = "Guide not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_guide(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<GuideRes>, ApiError> {
    state
        .store
        .guides()
        .get(&id)
        .map(|guide| Json(guide_res(guide)))
        .map_err(guide_error)
}

#[utoipa::path(
    get,
    path = "/api/guides/slug/{slug}",
    params(("slug" = String, Path, description = "Guide slug")),
    responses(
        (status = 200, description = "Guide with tags", body = GuideRes),
        (status = 404, description = "Guide not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_guide_by_slug(
    State(state): State<AppState>,
    AxumPath(slug): AxumPath<String>,
) -> Result<Json<GuideRes>, ApiError> {
    state
        .store
        .guides()
        .get_by_slug(&slug)
        .map(|guide| Json(guide_res(guide)))
        .map_err(guide_error)
}

#[utoipa::path(
    put,
    path = "/api/guides/{id}",
    params(("id" = String, Path, description = "Guide id")),
    request_body = UpdateGuideReq,
    responses(
        (status = 200, description = "Guide updated", body = GuideRes),
        (status = 400, description = "Validation error", body = ErrorRes),
        (status = 404, description = "Guide not found", body = ErrorRes),
        (status = 409, description = "Slug already in use", body = ErrorRes)
    )
)]
/// Update a guide
///
/// Omitted fields are left unchanged. `tag_ids` absent keeps the current tags, `[]` clears
/// them, and any other list replaces them.
#[axum::debug_handler]
pub(crate) async fn update_guide(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    payload: Result<Json<UpdateGuideReq>, JsonRejection>,
) -> Result<Json<GuideRes>, ApiError> {
    let req = json_body(payload)?;
    let title = match req.title.as_deref() {
        Some(title) => Some(required_title(title)?),
        None => None,
    };
    let patch = GuidePatch {
        title,
        slug: req.slug,
        description: req.description,
        content: req.content,
    };
    state
        .store
        .guides()
        .update(&id, patch, req.tag_ids)
        .map(|guide| Json(guide_res(guide)))
        .map_err(guide_error)
}

#[utoipa::path(
    delete,
    path = "/api/guides/{id}",
    params(("id" = String, Path, description = "Guide id")),
    responses(
        (status = 204, description = "Guide deleted"),
        (status = 404, description = "Guide not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_guide(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .guides()
        .delete(&id)
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(guide_error)
}

#[utoipa::path(
    get,
    path = "/api/guides/{id}/document",
    params(("id" = String, Path, description = "Guide id")),
    responses(
        (status = 200, description = "Normalised document with its table of contents", body = DocumentRes),
        (status = 404, description = "Guide not found", body = ErrorRes)
    )
)]
/// Normalised content, TOC and section counts of a guide.
#[axum::debug_handler]
pub(crate) async fn get_document(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<DocumentRes>, ApiError> {
    let guide = state.store.guides().get(&id).map_err(guide_error)?;
    let document = guide.document();

    let toc = derive_toc(&document.blocks)
        .into_iter()
        .map(|entry| TocEntryRes {
            anchor_id: entry.anchor_id,
            text: entry.text,
            level: entry.level,
            source_index: entry.source_index,
        })
        .collect();
    let stats = TocStats::of(&document.blocks);
    let document = serde_json::to_value(&document).map_err(|e| internal("document", e))?;

    Ok(Json(DocumentRes {
        document,
        toc,
        stats: DocumentStatsRes {
            sections: stats.sections,
            blocks: stats.blocks,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/api/guides/{id}/view",
    params(("id" = String, Path, description = "Guide id")),
    responses(
        (status = 200, description = "Page view HTML fragment", content_type = "text/html", body = String),
        (status = 404, description = "Guide not found", body = ErrorRes)
    )
)]
/// Page view of a guide: TOC sidebar plus rendered blocks.
#[axum::debug_handler]
pub(crate) async fn view_guide(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Html<String>, ApiError> {
    let guide = state.store.guides().get(&id).map_err(guide_error)?;
    Ok(Html(render_view(&guide.document().blocks).to_html()))
}

#[utoipa::path(
    get,
    path = "/api/guides/{id}/export",
    params(("id" = String, Path, description = "Guide id")),
    responses(
        (status = 200, description = "Standalone HTML document as an attachment", content_type = "text/html", body = String),
        (status = 404, description = "Guide not found", body = ErrorRes)
    )
)]
/// Export a guide as a self-contained HTML file
///
/// # Returns
/// * `200` with `Content-Disposition: attachment; filename="<slug>.html"` (the id is used when
///   the slug is empty)
///
/// # Errors
/// Returns `404 Not Found` if the guide does not exist.
#[axum::debug_handler]
pub(crate) async fn export_guide(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let guide = state.store.guides().get(&id).map_err(guide_error)?;
    let options = ExportOptions {
        exported_at: Utc::now(),
        highlight: state.store.config().export_highlight(),
    };
    let html = render_export(&guide.export_guide(), &options);
    let disposition = format!("attachment; filename=\"{}\"", guide.export_filename());

    tracing::info!("exported guide {}", guide.id);
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        html,
    ))
}
