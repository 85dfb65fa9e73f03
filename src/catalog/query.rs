use super::models::MOVIE_COLUMNS;
use crate::schema::MOVIES_TABLE;
use crate::sqlite_persistence::like_pattern;
use rusqlite::types::Value;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    TitleAsc,
    TitleDesc,
    GenreAsc,
    YearDesc,
    RatingDesc,
}

impl SortKey {
    /// Unknown keys fall back to the default ordering.
    pub fn parse(s: &str) -> Self {
        match s {
            "title_desc" => SortKey::TitleDesc,
            "genre_asc" => SortKey::GenreAsc,
            "year_desc" => SortKey::YearDesc,
            "rating_desc" => SortKey::RatingDesc,
            _ => SortKey::TitleAsc,
        }
    }

    fn order_by(&self) -> &'static str {
        match self {
            SortKey::TitleAsc => "title ASC",
            SortKey::TitleDesc => "title DESC",
            SortKey::GenreAsc => "genre ASC",
            SortKey::YearDesc => "year DESC",
            SortKey::RatingDesc => "rating DESC",
        }
    }
}

/// Filters for the collection listing. Every value ends up as a bound
/// parameter; only the fixed fragments below are ever spliced into the SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieQuery {
    /// Substring matched against title, cast and director.
    pub search: Option<String>,
    /// Every genre listed here must be contained in the movie's genre.
    pub genres: Vec<String>,
    /// First year of a decade; matches `[decade, decade + 9]`.
    pub decade: Option<i64>,
    pub sort: SortKey,
}

impl MovieQuery {
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT {} FROM {} WHERE 1=1", MOVIE_COLUMNS, MOVIES_TABLE.name);
        let mut params: Vec<Value> = Vec::new();

        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = like_pattern(search);
            sql.push_str(
                " AND (title LIKE ? ESCAPE '\\' OR \"cast\" LIKE ? ESCAPE '\\' \
                 OR director LIKE ? ESCAPE '\\')",
            );
            for _ in 0..3 {
                params.push(Value::Text(pattern.clone()));
            }
        }

        for genre in self.genres.iter().map(|g| g.trim()).filter(|g| !g.is_empty()) {
            sql.push_str(" AND genre LIKE ? ESCAPE '\\'");
            params.push(Value::Text(like_pattern(genre)));
        }

        // Decades whose last year overflows are dropped.
        if let Some((first, last)) = self.decade.and_then(|d| Some((d, d.checked_add(9)?))) {
            sql.push_str(" AND year BETWEEN ? AND ?");
            params.push(Value::Integer(first));
            params.push(Value::Integer(last));
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(self.sort.order_by());

        (sql, params)
    }
}
