use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Columns selected whenever a full movie row is read, in `Movie::from_row` order.
pub const MOVIE_COLUMNS: &str = "id, title, year, genre, director, \"cast\", runtime, plot, \
     poster, rating, media_format, is_ripped, is_locked, placement";

/// The editable part of a movie record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieFields {
    pub title: Option<String>,
    pub year: Option<i64>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub cast: Option<String>,
    pub runtime: Option<i64>,
    pub plot: Option<String>,
    pub poster: Option<String>,
    pub rating: Option<f64>,
    pub media_format: Option<String>,
    pub is_ripped: bool,
    pub is_locked: bool,
    pub placement: Option<String>,
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl MovieFields {
    /// Trims every text field and turns blank values into `None`, so that
    /// "no value" has a single representation in the database.
    pub fn normalized(self) -> Self {
        MovieFields {
            title: normalize_text(self.title),
            genre: normalize_text(self.genre),
            director: normalize_text(self.director),
            cast: normalize_text(self.cast),
            plot: normalize_text(self.plot),
            poster: normalize_text(self.poster),
            media_format: normalize_text(self.media_format),
            placement: normalize_text(self.placement),
            ..self
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movie {
    pub id: i64,
    #[serde(flatten)]
    pub fields: MovieFields,
}

impl Movie {
    /// Maps a row selected with [`MOVIE_COLUMNS`].
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Movie {
            id: row.get(0)?,
            fields: MovieFields {
                title: row.get(1)?,
                year: row.get(2)?,
                genre: row.get(3)?,
                director: row.get(4)?,
                cast: row.get(5)?,
                runtime: row.get(6)?,
                plot: row.get(7)?,
                poster: row.get(8)?,
                rating: row.get(9)?,
                media_format: row.get(10)?,
                is_ripped: row.get::<_, Option<i64>>(11)?.unwrap_or(0) == 1,
                is_locked: row.get::<_, Option<i64>>(12)?.unwrap_or(0) == 1,
                placement: row.get(13)?,
            },
        })
    }

    /// Genres are stored as a single slash-separated string.
    pub fn genres(&self) -> Vec<String> {
        split_genres(self.fields.genre.as_deref().unwrap_or_default())
    }
}

pub fn split_genres(genre: &str) -> Vec<String> {
    genre
        .split('/')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

/// A compact match returned by the quick local search.
#[derive(Debug, Clone, Serialize)]
pub struct LocalSearchHit {
    pub id: i64,
    pub title: Option<String>,
    pub year: Option<i64>,
    pub poster: Option<String>,
    pub media_format: Option<String>,
}

impl LocalSearchHit {
    /// Expects `id, title, year, poster, media_format`.
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(LocalSearchHit {
            id: row.get(0)?,
            title: row.get(1)?,
            year: row.get(2)?,
            poster: row.get(3)?,
            media_format: row.get(4)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FormatCount {
    pub format: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    pub total: i64,
    pub ripped: i64,
    pub locked: i64,
    pub formats: Vec<FormatCount>,
    /// Movies missing a year, a genre or a poster.
    pub incomplete: Vec<Movie>,
}
