use super::{
    MediaDetails, MediaSearchResult, MetadataError, MetadataProvider, MetadataSource, OmdbProvider,
    TmdbProvider,
};
use crate::config::MetadataSettings;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const MAX_RESULTS_PER_PROVIDER: usize = 4;

/// Queries every configured provider. A failing provider only loses its own
/// contribution.
#[derive(Clone, Default)]
pub struct MetadataService {
    providers: Vec<Arc<dyn MetadataProvider>>,
}

impl MetadataService {
    pub fn new(providers: Vec<Arc<dyn MetadataProvider>>) -> Self {
        Self { providers }
    }

    /// Builds providers for every configured API key, TMDB first.
    pub fn from_settings(settings: &MetadataSettings) -> Self {
        let timeout = Duration::from_millis(settings.timeout_ms);
        let mut providers: Vec<Arc<dyn MetadataProvider>> = Vec::new();
        if let Some(key) = &settings.tmdb_api_key {
            match TmdbProvider::new(key.clone(), timeout) {
                Ok(p) => providers.push(Arc::new(p)),
                Err(e) => warn!("TMDB provider disabled: {}", e),
            }
        }
        if let Some(key) = &settings.omdb_api_key {
            match OmdbProvider::new(key.clone(), timeout) {
                Ok(p) => providers.push(Arc::new(p)),
                Err(e) => warn!("OMDB provider disabled: {}", e),
            }
        }
        Self { providers }
    }

    pub fn is_configured(&self, source: MetadataSource) -> bool {
        self.provider(source).is_some()
    }

    fn provider(&self, source: MetadataSource) -> Option<&Arc<dyn MetadataProvider>> {
        self.providers.iter().find(|p| p.source() == source)
    }

    /// Results of all providers, in provider order.
    pub async fn search(&self, title: &str) -> Vec<MediaSearchResult> {
        let title = title.trim();
        if title.is_empty() {
            return Vec::new();
        }
        let lookups = self.providers.iter().map(|p| p.search(title));
        let outcomes = join_all(lookups).await;

        let mut results = Vec::new();
        for (provider, outcome) in self.providers.iter().zip(outcomes) {
            match outcome {
                Ok(found) => results.extend(found.into_iter().take(MAX_RESULTS_PER_PROVIDER)),
                Err(e) => warn!(
                    "{} search for {:?} failed: {}",
                    provider.source().as_str(),
                    title,
                    e
                ),
            }
        }
        results
    }

    /// Ok(None) when the source has no configured provider.
    pub async fn details(
        &self,
        source: MetadataSource,
        id: &str,
    ) -> Result<Option<MediaDetails>, MetadataError> {
        match self.provider(source) {
            Some(provider) => provider.details(id).await.map(Some),
            None => Ok(None),
        }
    }
}
