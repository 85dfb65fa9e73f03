//! Third-party movie metadata lookups (TMDB and OMDB).
//!
//! Providers implement [`MetadataProvider`]; [`MetadataService`] queries all
//! configured providers and isolates their failures.

mod omdb;
mod service;
mod tmdb;

pub use omdb::OmdbProvider;
pub use service::{MetadataService, MAX_RESULTS_PER_PROVIDER};
pub use tmdb::{TmdbMovie, TmdbProvider};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for MetadataError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MetadataError::Timeout
        } else if e.is_decode() {
            MetadataError::InvalidResponse(e.to_string())
        } else {
            MetadataError::Connection(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataSource {
    #[serde(rename = "TMDB")]
    Tmdb,
    #[serde(rename = "OMDB")]
    Omdb,
}

impl MetadataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataSource::Tmdb => "TMDB",
            MetadataSource::Omdb => "OMDB",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "TMDB" => Some(MetadataSource::Tmdb),
            "OMDB" => Some(MetadataSource::Omdb),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaSearchResult {
    pub source: MetadataSource,
    pub id: String,
    pub title: Option<String>,
    /// Four-digit release year as reported by the provider.
    pub year: Option<String>,
    pub poster: Option<String>,
}

/// Details used to prefill a movie form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaDetails {
    pub title: Option<String>,
    pub year: Option<i64>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub cast: Option<String>,
    pub runtime: Option<i64>,
    pub plot: Option<String>,
    pub rating: Option<f64>,
    pub poster: Option<String>,
}

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    fn source(&self) -> MetadataSource;

    async fn search(&self, title: &str) -> Result<Vec<MediaSearchResult>, MetadataError>;

    async fn details(&self, id: &str) -> Result<MediaDetails, MetadataError>;
}

/// First four characters of a date or year string, if they exist.
pub(crate) fn year_prefix(raw: &str) -> Option<&str> {
    raw.get(..4).filter(|y| y.chars().all(|c| c.is_ascii_digit()))
}
