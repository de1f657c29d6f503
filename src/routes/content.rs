use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::content_dto::{
        ContentListQuery, ContentListResponse, CreateContentPayload, UpdateContentPayload,
    },
    error::{Error, Result},
    middleware::auth::AuthContext,
    models::content::ContentKind,
    models::user_group::Action,
    AppState,
};

fn kind_from_segment(segment: &str) -> Result<ContentKind> {
    ContentKind::ALL
        .into_iter()
        .find(|kind| kind.route_segment() == segment)
        .ok_or_else(|| Error::NotFound(format!("no such collection: {}", segment)))
}

#[axum::debug_handler]
pub async fn create_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(segment): Path<String>,
    Json(payload): Json<CreateContentPayload>,
) -> Result<impl IntoResponse> {
    let kind = kind_from_segment(&segment)?;
    ctx.require(kind.module(), Action::New)?;
    payload.validate()?;
    let item = state.content_service.create(kind, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[axum::debug_handler]
pub async fn update_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path((segment, id)): Path<(String, i64)>,
    Json(payload): Json<UpdateContentPayload>,
) -> Result<impl IntoResponse> {
    let kind = kind_from_segment(&segment)?;
    ctx.require(kind.module(), Action::Edit)?;
    payload.validate()?;
    let item = state.content_service.update(kind, id, payload).await?;
    Ok(Json(item))
}

#[axum::debug_handler]
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path((segment, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse> {
    let kind = kind_from_segment(&segment)?;
    ctx.require(kind.module(), Action::Delete)?;
    state.content_service.delete(kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn get_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path((segment, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse> {
    let kind = kind_from_segment(&segment)?;
    ctx.require(kind.module(), Action::View)?;
    let item = state.content_service.get(kind, id).await?;
    Ok(Json(item))
}

#[axum::debug_handler]
pub async fn list_items(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(segment): Path<String>,
    Query(query): Query<ContentListQuery>,
) -> Result<impl IntoResponse> {
    let kind = kind_from_segment(&segment)?;
    ctx.require(kind.module(), Action::View)?;
    let result = state.content_service.list(kind, query).await?;
    Ok(Json(ContentListResponse {
        items: result.items,
        total: result.total,
        page: result.page,
        per_page: result.per_page,
        total_pages: result.total_pages,
    }))
}

/// Website-facing listing: published items only, no auth.
#[axum::debug_handler]
pub async fn list_public_items(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(mut query): Query<ContentListQuery>,
) -> Result<impl IntoResponse> {
    let kind = kind_from_segment(&segment)?;
    query.published = Some(true);
    let result = state.content_service.list(kind, query).await?;
    Ok(Json(ContentListResponse {
        items: result.items,
        total: result.total,
        page: result.page,
        per_page: result.per_page,
        total_pages: result.total_pages,
    }))
}

#[axum::debug_handler]
pub async fn get_public_item(
    State(state): State<AppState>,
    Path((segment, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse> {
    let kind = kind_from_segment(&segment)?;
    let item = state.content_service.get(kind, id).await?;
    if !item.published {
        return Err(Error::NotFound(format!("{} {} not found", kind.as_str(), id)));
    }
    Ok(Json(item))
}

/// Image/file upload for content editors. The category is a collection
/// segment, so editing rights on that collection gate the upload; the
/// stored URL is then referenced from a content item's image_url.
#[axum::debug_handler]
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(category): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let kind = kind_from_segment(&category)?;
    ctx.require(kind.module(), Action::Edit)?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload.bin").to_string();
        let bytes = field.bytes().await?;
        let stored = state.upload_service.store(&category, &name, bytes).await?;
        return Ok((
            StatusCode::CREATED,
            Json(serde_json::json!({ "url": stored.url })),
        ));
    }
    Err(Error::BadRequest("missing file part".to_string()))
}
