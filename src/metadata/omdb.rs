use super::{year_prefix, MediaDetails, MediaSearchResult, MetadataError, MetadataProvider, MetadataSource};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const OMDB_API_BASE: &str = "http://www.omdbapi.com/";
const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Deserialize)]
struct OmdbSearchResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Search", default)]
    search: Vec<OmdbSearchItem>,
}

#[derive(Debug, Deserialize)]
struct OmdbSearchItem {
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "Poster")]
    poster: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmdbDetails {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "Genre")]
    genre: Option<String>,
    #[serde(rename = "Director")]
    director: Option<String>,
    #[serde(rename = "Actors")]
    actors: Option<String>,
    #[serde(rename = "Runtime")]
    runtime: Option<String>,
    #[serde(rename = "Plot")]
    plot: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "Poster")]
    poster: Option<String>,
}

fn available(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != NOT_AVAILABLE)
}

fn to_search_results(response: OmdbSearchResponse) -> Vec<MediaSearchResult> {
    if response.response != "True" {
        return Vec::new();
    }
    response
        .search
        .into_iter()
        .map(|m| MediaSearchResult {
            source: MetadataSource::Omdb,
            id: m.imdb_id,
            title: m.title,
            year: m.year.as_deref().and_then(year_prefix).map(str::to_string),
            poster: available(m.poster),
        })
        .collect()
}

fn to_details(m: OmdbDetails) -> Result<MediaDetails, MetadataError> {
    if m.response != "True" {
        return Err(MetadataError::NotFound(
            m.error.unwrap_or_else(|| "Unknown OMDB error".to_string()),
        ));
    }
    Ok(MediaDetails {
        title: available(m.title),
        year: m
            .year
            .as_deref()
            .and_then(year_prefix)
            .and_then(|y| y.parse().ok()),
        genre: available(m.genre),
        director: available(m.director),
        cast: available(m.actors),
        // "136 min"
        runtime: m
            .runtime
            .as_deref()
            .and_then(|r| r.split(' ').next())
            .and_then(|r| r.parse().ok()),
        plot: available(m.plot),
        rating: m.imdb_rating.as_deref().and_then(|r| r.parse().ok()),
        poster: available(m.poster),
    })
}

pub struct OmdbProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OmdbProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, MetadataError> {
        Self::with_base_url(OMDB_API_BASE, api_key, timeout)
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
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        query: &[(&str, &str)],
    ) -> Result<T, MetadataError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
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
            .map_err(|e| MetadataError::InvalidResponse(format!("OMDB: {}", e)))
    }
}

#[async_trait]
impl MetadataProvider for OmdbProvider {
    fn source(&self) -> MetadataSource {
        MetadataSource::Omdb
    }

    async fn search(&self, title: &str) -> Result<Vec<MediaSearchResult>, MetadataError> {
        let response: OmdbSearchResponse = self.get(&[("s", title), ("type", "movie")]).await?;
        Ok(to_search_results(response))
    }

    async fn details(&self, id: &str) -> Result<MediaDetails, MetadataError> {
        let details: OmdbDetails = self.get(&[("i", id), ("plot", "full")]).await?;
        to_details(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_search_results() {
        let response: OmdbSearchResponse = serde_json::from_str(
            r#"{
                "Search": [
                    {"Title": "Alien", "Year": "1979", "imdbID": "tt0078748", "Type": "movie",
                     "Poster": "https://m.media-amazon.com/images/alien.jpg"},
                    {"Title": "Alien Nation", "Year": "1988", "imdbID": "tt0094631", "Type": "movie",
                     "Poster": "N/A"}
                ],
                "totalResults": "2",
                "Response": "True"
            }"#,
        )
        .unwrap();

        let results = to_search_results(response);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, MetadataSource::Omdb);
        assert_eq!(results[0].id, "tt0078748");
        assert_eq!(results[0].year.as_deref(), Some("1979"));
        assert!(results[0].poster.is_some());
        assert_eq!(results[1].poster, None);
    }

    #[test]
    fn failed_search_yields_nothing() {
        let response: OmdbSearchResponse =
            serde_json::from_str(r#"{"Response": "False", "Error": "Movie not found!"}"#).unwrap();
        assert!(to_search_results(response).is_empty());
    }

    #[test]
    fn maps_details() {
        let details: OmdbDetails = serde_json::from_str(
            r#"{
                "Title": "Alien", "Year": "1979", "Runtime": "117 min",
                "Genre": "Horror, Sci-Fi", "Director": "Ridley Scott",
                "Actors": "Sigourney Weaver, Tom Skerritt, John Hurt",
                "Plot": "The crew of a commercial spacecraft...",
                "Poster": "N/A", "imdbRating": "8.5", "Response": "True"
            }"#,
        )
        .unwrap();

        let details = to_details(details).unwrap();

        assert_eq!(details.year, Some(1979));
        assert_eq!(details.runtime, Some(117));
        assert_eq!(details.genre.as_deref(), Some("Horror, Sci-Fi"));
        assert_eq!(details.director.as_deref(), Some("Ridley Scott"));
        assert_eq!(details.rating, Some(8.5));
        assert_eq!(details.poster, None);
    }

    #[test]
    fn unparseable_rating_is_absent() {
        let details: OmdbDetails = serde_json::from_str(
            r#"{"Title": "Unrated", "Year": "2021", "Runtime": "N/A", "imdbRating": "N/A", "Response": "True"}"#,
        )
        .unwrap();

        let details = to_details(details).unwrap();
        assert_eq!(details.rating, None);
        assert_eq!(details.runtime, None);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let details: OmdbDetails =
            serde_json::from_str(r#"{"Response": "False", "Error": "Incorrect IMDb ID."}"#).unwrap();
        assert!(matches!(to_details(details), Err(MetadataError::NotFound(_))));
    }
}
