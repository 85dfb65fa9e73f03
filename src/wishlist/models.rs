use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "High" => Some(Priority::High),
            "Medium" => Some(Priority::Medium),
            "Low" => Some(Priority::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WishlistItem {
    pub id: i64,
    pub title: Option<String>,
    pub year: Option<i64>,
    pub genre: Option<String>,
    pub poster: Option<String>,
    pub priority: Priority,
}

impl WishlistItem {
    /// Expects `id, title, year, genre, poster, priority`. Unknown priorities
    /// read as the default.
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let priority: Option<String> = row.get(5)?;
        Ok(WishlistItem {
            id: row.get(0)?,
            title: row.get(1)?,
            year: row.get(2)?,
            genre: row.get(3)?,
            poster: row.get(4)?,
            priority: priority
                .as_deref()
                .and_then(Priority::parse)
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NewWishlistItem {
    pub title: Option<String>,
    pub year: Option<i64>,
    pub genre: Option<String>,
    pub poster: Option<String>,
    pub priority: Priority,
}

/// Result of promoting a wishlist item into the collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovedItem {
    pub movie_id: i64,
    pub item: WishlistItem,
}
