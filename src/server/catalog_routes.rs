//! Movie collection endpoints.

use super::responses::{error_response, forbidden, internal_error, not_found};
use super::session::Session;
use super::state::{GuardedCatalogStore, ServerState};
use crate::audit::{compute_diff, AuditAction};
use crate::catalog::{LocalSearchHit, Movie, MovieFields, MovieQuery, SortKey};
use crate::user::Permission;
use crate::wishlist::{NewWishlistItem, Priority};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const WISHLIST_TARGET: &str = "wishlist";
const COLLECTION_TARGET: &str = "collection";
const DEFAULT_ADD_METHOD: &str = "Manual Entry";
const DEFAULT_EDIT_METHOD: &str = "Manual Edit";

/// Listing filters. `genre` may be repeated.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct MovieListParams {
    search: Option<String>,
    genre: Vec<String>,
    decade: Option<String>,
    sort: Option<String>,
}

impl MovieListParams {
    fn into_query(self) -> MovieQuery {
        MovieQuery {
            search: self.search,
            genres: self.genre,
            // Unparseable decades are ignored rather than rejected.
            decade: self.decade.and_then(|d| d.trim().parse().ok()),
            sort: self.sort.as_deref().map(SortKey::parse).unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Debug)]
struct MovieListResponse {
    movies: Vec<Movie>,
    genres: Vec<String>,
}

/// Body of the add and edit requests.
#[derive(Deserialize, Debug, Default)]
struct MovieForm {
    #[serde(flatten)]
    fields: MovieFields,
    /// `wishlist` to file a new movie on the wishlist instead.
    save_target: Option<String>,
    /// How the data was obtained, e.g. "TMDB Search". Only ends up in the
    /// audit log.
    update_method: Option<String>,
    priority: Option<Priority>,
}

fn method_or<'a>(method: &'a Option<String>, default: &'a str) -> &'a str {
    method
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(default)
}

#[derive(Serialize, Debug)]
struct CreatedResponse {
    id: i64,
    target: &'static str,
}

#[derive(Serialize, Debug)]
struct MovieDetailResponse {
    #[serde(flatten)]
    movie: Movie,
    edit_mode_enabled: bool,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct LocalSearchParams {
    q: String,
}

/// GET /movies - Filtered collection listing with the genre facets
async fn list_movies(
    session: Session,
    State(catalog): State<GuardedCatalogStore>,
    axum_extra::extract::Query(params): axum_extra::extract::Query<MovieListParams>,
) -> Response {
    if !session.has_permission(Permission::AccessCatalog) {
        return forbidden();
    }

    let query = params.into_query();
    debug!("Listing movies with {:?}", query);
    let movies = match catalog.search_movies(&query) {
        Ok(movies) => movies,
        Err(err) => return internal_error("Failed to list movies", err),
    };
    let genres = match catalog.list_genres() {
        Ok(genres) => genres,
        Err(err) => return internal_error("Failed to list genres", err),
    };

    Json(MovieListResponse { movies, genres }).into_response()
}

/// POST /movies - Add a movie to the collection, or to the wishlist
async fn add_movie(
    session: Session,
    State(state): State<ServerState>,
    Json(form): Json<MovieForm>,
) -> Response {
    if !session.has_permission(Permission::EditCatalog) {
        return forbidden();
    }

    let fields = form.fields.normalized();
    if fields.title.is_none() {
        return error_response(StatusCode::BAD_REQUEST, "Title is required");
    }

    if form.save_target.as_deref() == Some(WISHLIST_TARGET) {
        let item = NewWishlistItem {
            title: fields.title,
            year: fields.year,
            genre: fields.genre,
            poster: fields.poster,
            priority: form.priority.unwrap_or_default(),
        };
        return match state.wishlist_store.add_item(&item) {
            Ok(id) => (
                StatusCode::CREATED,
                Json(CreatedResponse {
                    id,
                    target: WISHLIST_TARGET,
                }),
            )
                .into_response(),
            Err(err) => internal_error("Failed to add wishlist item", err),
        };
    }

    let id = match state.catalog_store.add_movie(&fields) {
        Ok(id) => id,
        Err(err) => return internal_error("Failed to add movie", err),
    };
    info!("{} added movie {} ({:?})", session.username, id, fields.title);

    state.record_audit(
        &session.username,
        AuditAction::Added,
        fields.display_title(),
        &format!(
            "Method: {}",
            method_or(&form.update_method, DEFAULT_ADD_METHOD)
        ),
    );

    (
        StatusCode::CREATED,
        Json(CreatedResponse {
            id,
            target: COLLECTION_TARGET,
        }),
    )
        .into_response()
}

/// GET /movies/{id} - A movie along with the edit mode flag
async fn get_movie(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Response {
    if !session.has_permission(Permission::AccessCatalog) {
        return forbidden();
    }

    let movie = match state.catalog_store.get_movie(id) {
        Ok(Some(movie)) => movie,
        Ok(None) => return not_found("Movie"),
        Err(err) => return internal_error("Failed to load movie", err),
    };
    let edit_mode_enabled = match state.settings_store.is_edit_mode_enabled() {
        Ok(enabled) => enabled,
        Err(err) => return internal_error("Failed to read settings", err),
    };

    Json(MovieDetailResponse {
        movie,
        edit_mode_enabled,
    })
    .into_response()
}

/// PUT /movies/{id} - Overwrite a movie, auditing what changed
async fn update_movie(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(form): Json<MovieForm>,
) -> Response {
    if !session.has_permission(Permission::EditCatalog) {
        return forbidden();
    }

    let old = match state.catalog_store.get_movie(id) {
        Ok(Some(movie)) => movie,
        Ok(None) => return not_found("Movie"),
        Err(err) => return internal_error("Failed to load movie", err),
    };

    let fields = form.fields.normalized();
    let changes = compute_diff(&old.fields, &fields);

    match state.catalog_store.update_movie(id, &fields) {
        Ok(true) => {}
        Ok(false) => return not_found("Movie"),
        Err(err) => return internal_error("Failed to update movie", err),
    }

    if changes.is_empty() {
        debug!("Movie {} saved without changes", id);
    } else {
        state.record_audit(
            &session.username,
            AuditAction::Updated,
            old.fields.display_title(),
            &format!(
                "Method: {} | Changes: [{}]",
                method_or(&form.update_method, DEFAULT_EDIT_METHOD),
                changes
            ),
        );
    }

    Json(Movie { id, fields }).into_response()
}

/// DELETE /movies/{id} - Only allowed while edit mode is on
async fn delete_movie(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Response {
    if !session.has_permission(Permission::EditCatalog) {
        return forbidden();
    }

    match state.settings_store.is_edit_mode_enabled() {
        Ok(true) => {}
        Ok(false) => return error_response(StatusCode::FORBIDDEN, "Edit mode is disabled"),
        Err(err) => return internal_error("Failed to read settings", err),
    }

    let title = match state.catalog_store.get_movie(id) {
        Ok(movie) => movie
            .map(|m| m.fields.display_title().to_string())
            .unwrap_or_else(|| "Unknown".to_string()),
        Err(err) => return internal_error("Failed to load movie", err),
    };

    let deleted = match state.catalog_store.delete_movie(id) {
        Ok(deleted) => deleted,
        Err(err) => return internal_error("Failed to delete movie", err),
    };

    // Every delete request is audited, even one for a movie that is already gone.
    state.record_audit(
        &session.username,
        AuditAction::Deleted,
        &title,
        "Permanent Delete",
    );

    if deleted {
        info!("{} deleted movie {} ({})", session.username, id, title);
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found("Movie")
    }
}

/// GET /search/local?q= - Quick title, director and cast lookup
async fn local_search(
    session: Session,
    State(catalog): State<GuardedCatalogStore>,
    Query(params): Query<LocalSearchParams>,
) -> Response {
    if !session.has_permission(Permission::AccessCatalog) {
        return forbidden();
    }

    match catalog.quick_search(&params.q) {
        Ok(hits) => Json::<Vec<LocalSearchHit>>(hits).into_response(),
        Err(err) => internal_error("Local search failed", err),
    }
}

pub fn catalog_routes() -> Router<ServerState> {
    Router::new()
        .route("/movies", get(list_movies).post(add_movie))
        .route(
            "/movies/{id}",
            get(get_movie).put(update_movie).delete(delete_movie),
        )
        .route("/search/local", get(local_search))
}
