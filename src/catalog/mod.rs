mod models;
mod query;
mod store;

pub use models::{
    split_genres, CollectionStats, FormatCount, LocalSearchHit, Movie, MovieFields,
    MOVIE_COLUMNS,
};
pub use query::{MovieQuery, SortKey};
pub use store::{
    insert_movie, BackfillUpdate, CatalogStore, SqliteCatalogStore, MAX_QUICK_SEARCH_RESULTS,
    MIN_QUICK_SEARCH_LENGTH,
};
