//! Lookups against the external movie databases.

use super::responses::{error_response, forbidden};
use super::session::Session;
use super::state::{GuardedMetadataService, ServerState};
use crate::metadata::{MetadataError, MetadataSource};
use crate::user::Permission;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::warn;

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct MediaSearchParams {
    title: String,
}

#[derive(Deserialize, Debug)]
struct MediaDetailsParams {
    source: String,
    id: String,
}

/// GET /search/media?title= - Results of every configured provider
async fn search_media(
    session: Session,
    State(metadata): State<GuardedMetadataService>,
    Query(params): Query<MediaSearchParams>,
) -> Response {
    if !session.has_permission(Permission::AccessCatalog) {
        return forbidden();
    }
    Json(metadata.search(&params.title).await).into_response()
}

/// GET /media/details?source=&id=
async fn media_details(
    session: Session,
    State(metadata): State<GuardedMetadataService>,
    Query(params): Query<MediaDetailsParams>,
) -> Response {
    if !session.has_permission(Permission::AccessCatalog) {
        return forbidden();
    }

    let Some(source) = MetadataSource::parse(&params.source) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Unknown source {}", params.source),
        );
    };

    match metadata.details(source, &params.id).await {
        Ok(Some(details)) => Json(details).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            format!("{} is not configured", source.as_str()),
        ),
        Err(MetadataError::NotFound(_)) => error_response(
            StatusCode::NOT_FOUND,
            format!("{} has no movie {}", source.as_str(), params.id),
        ),
        Err(err) => {
            warn!("{} details for {} failed: {}", source.as_str(), params.id, err);
            error_response(
                StatusCode::BAD_GATEWAY,
                format!("{} lookup failed", source.as_str()),
            )
        }
    }
}

pub fn metadata_routes() -> Router<ServerState> {
    Router::new()
        .route("/search/media", get(search_media))
        .route("/media/details", get(media_details))
}
