use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    database::TagInsert,
    dto::tag_dto::{CreateTagRequest, DuplicateTagResponse, TagListResponse, TagResponse},
    error::Result,
    models::tag::DEFAULT_TAGS,
    AppState,
};

/// Lists tags by name; an empty catalogue is seeded with the defaults first.
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<TagListResponse>> {
    let mut tags = state.store.list_tags().await?;
    if tags.is_empty() {
        tracing::info!("seeding default tags");
        state.store.seed_tags(DEFAULT_TAGS).await?;
        tags = state.store.list_tags().await?;
    }
    Ok(Json(TagListResponse { tags }))
}

pub async fn create_tag(
    State(state): State<AppState>,
    Json(payload): Json<CreateTagRequest>,
) -> Result<Response> {
    let name = payload.trimmed_name()?;
    let response = match state.store.create_tag(&name).await? {
        TagInsert::Created(tag) => (StatusCode::CREATED, Json(TagResponse { tag })).into_response(),
        TagInsert::Existing(tag) => (
            StatusCode::CONFLICT,
            Json(DuplicateTagResponse {
                error: "Tag already exists".to_string(),
                tag,
            }),
        )
            .into_response(),
    };
    Ok(response)
}
