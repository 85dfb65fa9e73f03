use super::models::{
    split_genres, CollectionStats, FormatCount, LocalSearchHit, Movie, MovieFields, MOVIE_COLUMNS,
};
use super::query::MovieQuery;
use crate::sqlite_persistence::{like_pattern, Database};
use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::BTreeSet;

pub const MIN_QUICK_SEARCH_LENGTH: usize = 2;
pub const MAX_QUICK_SEARCH_RESULTS: usize = 5;

/// Values found by the poster backfill. Absent values leave the stored ones alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackfillUpdate {
    pub plot: Option<String>,
    pub poster: Option<String>,
    pub rating: Option<f64>,
    pub year: Option<i64>,
}

pub trait CatalogStore: Send + Sync {
    fn add_movie(&self, fields: &MovieFields) -> Result<i64>;

    fn get_movie(&self, id: i64) -> Result<Option<Movie>>;

    /// Overwrites every editable field. Returns false if the movie does not exist.
    fn update_movie(&self, id: i64, fields: &MovieFields) -> Result<bool>;

    /// Returns false if the movie does not exist.
    fn delete_movie(&self, id: i64) -> Result<bool>;

    fn search_movies(&self, query: &MovieQuery) -> Result<Vec<Movie>>;

    /// Distinct genre names across the collection, sorted.
    fn list_genres(&self) -> Result<Vec<String>>;

    /// Quick lookup on title, director and cast. Short terms return nothing.
    fn quick_search(&self, term: &str) -> Result<Vec<LocalSearchHit>>;

    fn collection_stats(&self) -> Result<CollectionStats>;

    fn movies_missing_poster(&self) -> Result<Vec<Movie>>;

    fn apply_backfill(&self, id: i64, update: &BackfillUpdate) -> Result<()>;
}

/// Inserts a movie on an open connection (or transaction) and returns its id.
pub fn insert_movie(conn: &Connection, fields: &MovieFields) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO movies_v2 (title, year, genre, director, \"cast\", runtime, plot, poster, \
         rating, media_format, is_ripped, is_locked, placement) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            fields.title,
            fields.year,
            fields.genre,
            fields.director,
            fields.cast,
            fields.runtime,
            fields.plot,
            fields.poster,
            fields.rating,
            fields.media_format,
            fields.is_ripped as i64,
            fields.is_locked as i64,
            fields.placement,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

#[derive(Clone)]
pub struct SqliteCatalogStore {
    database: Database,
}

impl SqliteCatalogStore {
    pub fn new(database: Database) -> Self {
        SqliteCatalogStore { database }
    }

    fn connect(&self) -> Result<Connection> {
        self.database
            .connect()
            .context("Failed to open catalog database")
    }

    fn count(conn: &Connection, condition: &str) -> Result<i64> {
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM movies_v2 WHERE {}", condition),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn add_movie(&self, fields: &MovieFields) -> Result<i64> {
        let conn = self.connect()?;
        insert_movie(&conn, fields)
            .with_context(|| format!("Failed to add movie {:?}", fields.title))
    }

    fn get_movie(&self, id: i64) -> Result<Option<Movie>> {
        let conn = self.connect()?;
        let movie = conn
            .query_row(
                &format!("SELECT {} FROM movies_v2 WHERE id = ?1", MOVIE_COLUMNS),
                params![id],
                Movie::from_row,
            )
            .optional()?;
        Ok(movie)
    }

    fn update_movie(&self, id: i64, fields: &MovieFields) -> Result<bool> {
        let conn = self.connect()?;
        let updated = conn
            .execute(
                "UPDATE movies_v2 SET title = ?1, year = ?2, genre = ?3, director = ?4, \
                 \"cast\" = ?5, runtime = ?6, plot = ?7, poster = ?8, rating = ?9, \
                 media_format = ?10, is_ripped = ?11, is_locked = ?12, placement = ?13 \
                 WHERE id = ?14",
                params![
                    fields.title,
                    fields.year,
                    fields.genre,
                    fields.director,
                    fields.cast,
                    fields.runtime,
                    fields.plot,
                    fields.poster,
                    fields.rating,
                    fields.media_format,
                    fields.is_ripped as i64,
                    fields.is_locked as i64,
                    fields.placement,
                    id,
                ],
            )
            .with_context(|| format!("Failed to update movie {}", id))?;
        Ok(updated > 0)
    }

    fn delete_movie(&self, id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let deleted = conn.execute("DELETE FROM movies_v2 WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn search_movies(&self, query: &MovieQuery) -> Result<Vec<Movie>> {
        let conn = self.connect()?;
        let (sql, values) = query.to_sql();
        let mut stmt = conn.prepare(&sql)?;
        let movies = stmt
            .query_map(params_from_iter(values), Movie::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(movies)
    }

    fn list_genres(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT DISTINCT genre FROM movies_v2 WHERE genre IS NOT NULL")?;
        let raw_genres = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let genres: BTreeSet<String> = raw_genres.iter().flat_map(|g| split_genres(g)).collect();
        Ok(genres.into_iter().collect())
    }

    fn quick_search(&self, term: &str) -> Result<Vec<LocalSearchHit>> {
        let term = term.trim();
        if term.chars().count() < MIN_QUICK_SEARCH_LENGTH {
            return Ok(vec![]);
        }
        let conn = self.connect()?;
        let pattern = like_pattern(term);
        let mut stmt = conn.prepare(
            "SELECT id, title, year, poster, media_format FROM movies_v2 \
             WHERE title LIKE ?1 ESCAPE '\\' OR director LIKE ?1 ESCAPE '\\' \
             OR \"cast\" LIKE ?1 ESCAPE '\\' \
             ORDER BY title ASC LIMIT ?2",
        )?;
        let hits = stmt
            .query_map(
                params![pattern, MAX_QUICK_SEARCH_RESULTS as i64],
                LocalSearchHit::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(hits)
    }

    fn collection_stats(&self) -> Result<CollectionStats> {
        let conn = self.connect()?;
        let total = Self::count(&conn, "1=1")?;
        let ripped = Self::count(&conn, "is_ripped = 1")?;
        let locked = Self::count(&conn, "is_locked = 1")?;

        let mut stmt = conn.prepare(
            "SELECT IFNULL(media_format, 'Unset') AS format, COUNT(*) AS count FROM movies_v2 \
             GROUP BY media_format ORDER BY count DESC, format ASC",
        )?;
        let formats = stmt
            .query_map([], |row| {
                Ok(FormatCount {
                    format: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM movies_v2 \
             WHERE (year IS NULL OR year = 0) OR (genre IS NULL OR genre = '') \
             OR (poster IS NULL OR poster = '') ORDER BY title ASC",
            MOVIE_COLUMNS
        ))?;
        let incomplete = stmt
            .query_map([], Movie::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(CollectionStats {
            total,
            ripped,
            locked,
            formats,
            incomplete,
        })
    }

    fn movies_missing_poster(&self) -> Result<Vec<Movie>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM movies_v2 WHERE poster IS NULL ORDER BY id ASC",
            MOVIE_COLUMNS
        ))?;
        let movies = stmt
            .query_map([], Movie::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(movies)
    }

    fn apply_backfill(&self, id: i64, update: &BackfillUpdate) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE movies_v2 SET plot = COALESCE(?1, plot), poster = COALESCE(?2, poster), \
             rating = COALESCE(?3, rating), year = COALESCE(?4, year) WHERE id = ?5",
            params![update.plot, update.poster, update.rating, update.year, id],
        )
        .with_context(|| format!("Failed to backfill movie {}", id))?;
        Ok(())
    }
}
