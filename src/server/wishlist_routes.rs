use super::responses::{error_response, forbidden, internal_error, not_found};
use super::session::Session;
use super::state::{GuardedWishlistStore, ServerState};
use crate::audit::AuditAction;
use crate::user::Permission;
use crate::wishlist::NewWishlistItem;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;

#[derive(Serialize, Debug)]
struct CreatedItemResponse {
    id: i64,
}

/// GET /wishlist - Items by priority, then title
async fn list_items(session: Session, State(wishlist): State<GuardedWishlistStore>) -> Response {
    if !session.has_permission(Permission::AccessCatalog) {
        return forbidden();
    }
    match wishlist.list_items() {
        Ok(items) => Json(items).into_response(),
        Err(err) => internal_error("Failed to list wishlist", err),
    }
}

/// POST /wishlist
async fn add_item(
    session: Session,
    State(wishlist): State<GuardedWishlistStore>,
    Json(mut item): Json<NewWishlistItem>,
) -> Response {
    if !session.has_permission(Permission::EditCatalog) {
        return forbidden();
    }

    item.title = item
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if item.title.is_none() {
        return error_response(StatusCode::BAD_REQUEST, "Title is required");
    }

    match wishlist.add_item(&item) {
        Ok(id) => (StatusCode::CREATED, Json(CreatedItemResponse { id })).into_response(),
        Err(err) => internal_error("Failed to add wishlist item", err),
    }
}

/// DELETE /wishlist/{id}
async fn remove_item(
    session: Session,
    State(wishlist): State<GuardedWishlistStore>,
    Path(id): Path<i64>,
) -> Response {
    if !session.has_permission(Permission::EditCatalog) {
        return forbidden();
    }
    match wishlist.remove_item(id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found("Wishlist item"),
        Err(err) => internal_error("Failed to remove wishlist item", err),
    }
}

/// POST /wishlist/{id}/move - Promote an item into the collection
async fn move_item(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Response {
    if !session.has_permission(Permission::EditCatalog) {
        return forbidden();
    }

    let moved = match state.wishlist_store.move_to_collection(id) {
        Ok(Some(moved)) => moved,
        Ok(None) => return not_found("Wishlist item"),
        Err(err) => return internal_error("Failed to move wishlist item", err),
    };

    let title = moved.item.title.as_deref().unwrap_or("Unknown");
    info!(
        "{} moved wishlist item {} into the collection as movie {}",
        session.username, id, moved.movie_id
    );
    state.record_audit(
        &session.username,
        AuditAction::AddedFromWishlist,
        title,
        "Moved from Wishlist",
    );

    (StatusCode::CREATED, Json(moved)).into_response()
}

pub fn wishlist_routes() -> Router<ServerState> {
    Router::new()
        .route("/wishlist", get(list_items).post(add_item))
        .route("/wishlist/{id}", delete(remove_item))
        .route("/wishlist/{id}/move", post(move_item))
}
