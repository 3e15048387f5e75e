//! Offline poster resolver
//!
//! Used when no metadata API credential is configured. Nothing leaves the
//! process: each movie gets a placeholder image labelled with its title.
use std::{collections::HashMap, sync::Arc};

use reqwest::Url;

use crate::{models::MovieId, services::posters::PosterResolver, store::MovieStore};

const TITLE_PLACEHOLDER_BASE: &str = "https://via.placeholder.com/500x750";

/// Placeholder image URL showing `title`
pub fn title_placeholder(title: &str) -> Option<String> {
    Url::parse_with_params(
        TITLE_PLACEHOLDER_BASE,
        &[("text", title), ("bgcolor", "444"), ("txtcolor", "fff")],
    )
    .ok()
    .map(String::from)
}

#[derive(Clone)]
pub struct OfflinePosterResolver {
    titles: Arc<HashMap<MovieId, String>>,
    placeholder_url: String,
}

impl OfflinePosterResolver {
    pub fn new(store: &MovieStore, placeholder_url: String) -> Self {
        let mut titles = HashMap::with_capacity(store.len());
        for entry in store.entries() {
            titles
                .entry(entry.id)
                .or_insert_with(|| entry.title.clone());
        }

        Self {
            titles: Arc::new(titles),
            placeholder_url,
        }
    }

    /// Resolver that knows no titles and always answers with the generic image
    pub fn generic(placeholder_url: String) -> Self {
        Self {
            titles: Arc::new(HashMap::new()),
            placeholder_url,
        }
    }
}

#[async_trait::async_trait]
impl PosterResolver for OfflinePosterResolver {
    async fn resolve_poster(&self, id: MovieId) -> String {
        self.titles
            .get(&id)
            .and_then(|title| title_placeholder(title))
            .unwrap_or_else(|| self.placeholder_url.clone())
    }

    fn placeholder(&self) -> &str {
        &self.placeholder_url
    }

    fn clone_for_task(&self) -> Box<dyn PosterResolver> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::CatalogEntry, store::SimilarityMatrix};

    const GENERIC: &str = "https://placeholder.test/generic";

    fn store() -> MovieStore {
        MovieStore::new(
            vec![
                CatalogEntry::new(10, "The Dark Knight"),
                CatalogEntry::new(20, "Up & Away"),
            ],
            SimilarityMatrix::from_rows(vec![vec![1.0, 0.3], vec![0.3, 1.0]]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_title_placeholder_encodes_title() {
        let url = title_placeholder("The Dark Knight").unwrap();
        assert_eq!(
            url,
            "https://via.placeholder.com/500x750?text=The+Dark+Knight&bgcolor=444&txtcolor=fff"
        );

        let url = title_placeholder("Up & Away").unwrap();
        assert!(url.contains("text=Up+%26+Away&"));
    }

    #[tokio::test]
    async fn test_known_id_gets_title_placeholder() {
        let resolver = OfflinePosterResolver::new(&store(), GENERIC.to_string());
        let url = resolver.resolve_poster(MovieId(10)).await;
        assert!(url.contains("text=The+Dark+Knight"));
    }

    #[tokio::test]
    async fn test_unknown_id_gets_generic_placeholder() {
        let resolver = OfflinePosterResolver::new(&store(), GENERIC.to_string());
        assert_eq!(resolver.resolve_poster(MovieId(99)).await, GENERIC);

        let generic = OfflinePosterResolver::generic(GENERIC.to_string());
        assert_eq!(generic.resolve_poster(MovieId(10)).await, GENERIC);
    }

    #[tokio::test]
    async fn test_batch_keeps_order() {
        let resolver = OfflinePosterResolver::new(&store(), GENERIC.to_string());
        let results = resolver
            .resolve_batch(vec![MovieId(20), MovieId(99), MovieId(10)], 3)
            .await;

        assert!(results[0].poster_url.contains("Up+%26+Away"));
        assert_eq!(results[1].poster_url, GENERIC);
        assert!(results[2].poster_url.contains("Dark+Knight"));
    }
}
