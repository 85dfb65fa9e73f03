//! TMDB provider. Authenticates with a v4 read access token.

use super::{year_prefix, MediaDetails, MediaSearchResult, MetadataError, MetadataProvider, MetadataSource};
use crate::catalog::BackfillUpdate;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const TMDB_API_BASE: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
const MAX_CAST_NAMES: usize = 5;

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

/// A movie as listed by the TMDB search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: i64,
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f64>,
}

impl TmdbMovie {
    fn year(&self) -> Option<&str> {
        self.release_date.as_deref().and_then(year_prefix)
    }

    fn to_search_result(&self) -> MediaSearchResult {
        MediaSearchResult {
            source: MetadataSource::Tmdb,
            id: self.id.to_string(),
            title: self.title.clone(),
            year: self.year().map(str::to_string),
            poster: poster_url("w200", self.poster_path.as_deref()),
        }
    }

    /// Values the poster backfill writes for this search hit.
    pub fn to_backfill_update(&self) -> BackfillUpdate {
        BackfillUpdate {
            plot: self.overview.clone().filter(|p| !p.is_empty()),
            poster: poster_url("w500", self.poster_path.as_deref()),
            rating: self.vote_average,
            year: self.year().and_then(|y| y.parse().ok()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    title: Option<String>,
    release_date: Option<String>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    runtime: Option<i64>,
    overview: Option<String>,
    vote_average: Option<f64>,
    poster_path: Option<String>,
    #[serde(default)]
    credits: TmdbCredits,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    cast: Vec<TmdbCastMember>,
    #[serde(default)]
    crew: Vec<TmdbCrewMember>,
}

#[derive(Debug, Deserialize)]
struct TmdbCastMember {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbCrewMember {
    name: String,
    job: Option<String>,
}

fn poster_url(size: &str, path: Option<&str>) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{}/{}{}", TMDB_IMAGE_BASE, size, p))
}

fn to_details(m: TmdbMovieDetails) -> MediaDetails {
    let cast: Vec<String> = m
        .credits
        .cast
        .into_iter()
        .take(MAX_CAST_NAMES)
        .map(|c| c.name)
        .collect();
    let director = m
        .credits
        .crew
        .into_iter()
        .find(|c| c.job.as_deref() == Some("Director"))
        .map(|c| c.name)
        .unwrap_or_else(|| "Unknown".to_string());
    let genre = m
        .genres
        .into_iter()
        .map(|g| g.name)
        .collect::<Vec<_>>()
        .join("/");

    MediaDetails {
        title: m.title,
        year: m
            .release_date
            .as_deref()
            .and_then(year_prefix)
            .and_then(|y| y.parse().ok()),
        genre: Some(genre).filter(|g| !g.is_empty()),
        director: Some(director),
        cast: Some(cast.join(", ")).filter(|c| !c.is_empty()),
        runtime: m.runtime,
        plot: m.overview,
        // 0.0 means "no votes yet"
        rating: m
            .vote_average
            .filter(|r| *r != 0.0)
            .map(|r| (r * 10.0).round() / 10.0),
        poster: poster_url("w500", m.poster_path.as_deref()),
    }
}

pub struct TmdbProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, MetadataError> {
        Self::with_base_url(TMDB_API_BASE, api_key, timeout)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MetadataError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetadataError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MetadataError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(MetadataError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| MetadataError::InvalidResponse(format!("TMDB: {}", e)))
    }

    /// Raw search hits, in TMDB relevance order.
    pub async fn search_movies(&self, title: &str) -> Result<Vec<TmdbMovie>, MetadataError> {
        debug!("TMDB search for {:?}", title);
        let response: TmdbSearchResponse = self
            .get("/search/movie", &[("query", title), ("language", "en-US")])
            .await?;
        Ok(response.results)
    }
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    fn source(&self) -> MetadataSource {
        MetadataSource::Tmdb
    }

    async fn search(&self, title: &str) -> Result<Vec<MediaSearchResult>, MetadataError> {
        let movies = self.search_movies(title).await?;
        Ok(movies.iter().map(TmdbMovie::to_search_result).collect())
    }

    async fn details(&self, id: &str) -> Result<MediaDetails, MetadataError> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(MetadataError::NotFound(id.to_string()));
        }
        let details: TmdbMovieDetails = self
            .get(
                &format!("/movie/{}", id),
                &[("append_to_response", "credits"), ("language", "en-US")],
            )
            .await?;
        Ok(to_details(details))
    }
}
