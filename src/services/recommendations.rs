use std::{cmp::Ordering, sync::Arc};

use crate::{
    models::{Recommendation, RecommendedTitles},
    services::posters::PosterResolver,
    store::MovieStore,
};

/// Number of neighbours returned per query
pub const TOP_K: usize = 5;

/// Finds the movies most similar to `title`
///
/// Ranks every catalog position by its score in the queried movie's matrix row,
/// highest first. The sort is stable, so equal scores keep catalog order. The
/// first ranked entry is the query itself (self-similarity is maximal) and is
/// skipped; the next [`TOP_K`] entries are returned.
///
/// Unknown titles yield empty sequences rather than an error.
pub fn recommend(title: &str, store: &MovieStore) -> RecommendedTitles {
    let Some(position) = store.position(title) else {
        tracing::debug!(title = %title, "Title not in catalog");
        return RecommendedTitles::default();
    };

    let mut ranked: Vec<(usize, f32)> = store
        .similarity()
        .row(position)
        .iter()
        .copied()
        .enumerate()
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let entries = store.entries();
    let mut result = RecommendedTitles::default();
    for (neighbour, _) in ranked.into_iter().skip(1).take(TOP_K) {
        let entry = &entries[neighbour];
        result.names.push(entry.title.clone());
        result.ids.push(entry.id);
    }

    tracing::debug!(title = %title, results = result.len(), "Recommendations ranked");

    result
}

/// Recommends movies for `title` and resolves a poster for each
///
/// Poster lookups run on the resolver's bounded pool; the output keeps the
/// ranked order.
pub async fn recommend_with_posters(
    title: &str,
    store: &MovieStore,
    resolver: Arc<dyn PosterResolver>,
    workers: usize,
) -> Vec<Recommendation> {
    let RecommendedTitles { names, ids } = recommend(title, store);
    if names.is_empty() {
        return Vec::new();
    }

    let posters = resolver.resolve_batch(ids.clone(), workers).await;

    tracing::info!(
        title = %title,
        results = names.len(),
        resolver = resolver.name(),
        "Recommendations ready"
    );

    names
        .into_iter()
        .zip(ids)
        .zip(posters)
        .map(|((title, external_id), poster)| Recommendation {
            title,
            external_id,
            poster_url: poster.poster_url,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{CatalogEntry, MovieId},
        services::posters::offline::OfflinePosterResolver,
        store::SimilarityMatrix,
    };

    fn store_from(titles: &[&str], rows: Vec<Vec<f32>>) -> MovieStore {
        let entries = titles
            .iter()
            .enumerate()
            .map(|(i, t)| CatalogEntry::new(i as i64 + 1, *t))
            .collect();
        MovieStore::new(entries, SimilarityMatrix::from_rows(rows).unwrap()).unwrap()
    }

    /// Diagonal of 1.0, off-diagonal scores strictly below it
    fn banded_store(n: usize) -> MovieStore {
        let titles: Vec<String> = (0..n).map(|i| format!("Movie {}", i)).collect();
        let rows = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| {
                        if i == j {
                            1.0
                        } else {
                            1.0 / (1.0 + (i as f32 - j as f32).abs())
                        }
                    })
                    .collect()
            })
            .collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        store_from(&refs, rows)
    }

    #[test]
    fn test_three_movie_scenario() {
        let store = store_from(
            &["A", "B", "C"],
            vec![
                vec![1.0, 0.9, 0.2],
                vec![0.9, 1.0, 0.4],
                vec![0.2, 0.4, 1.0],
            ],
        );

        let result = recommend("A", &store);
        assert_eq!(result.names, vec!["B", "C"]);
        assert_eq!(result.ids, vec![MovieId(2), MovieId(3)]);
    }

    #[test]
    fn test_unknown_title_returns_empty() {
        let store = banded_store(4);
        assert_eq!(recommend("Nope", &store), RecommendedTitles::default());
        assert!(recommend("movie 1", &store).is_empty());
    }

    #[test]
    fn test_returns_top_five_in_score_order() {
        let store = store_from(
            &["Q", "a", "b", "c", "d", "e", "f", "g"],
            vec![
                vec![1.0, 0.1, 0.7, 0.3, 0.9, 0.5, 0.2, 0.8],
                vec![0.1, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                vec![0.7, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                vec![0.3, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
                vec![0.9, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
                vec![0.5, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
                vec![0.2, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                vec![0.8, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            ],
        );

        let result = recommend("Q", &store);
        assert_eq!(result.names, vec!["d", "g", "b", "e", "c"]);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let store = store_from(
            &["Q", "z", "y", "x", "w"],
            vec![
                vec![1.0, 0.5, 0.5, 0.7, 0.5],
                vec![0.5, 1.0, 0.0, 0.0, 0.0],
                vec![0.5, 0.0, 1.0, 0.0, 0.0],
                vec![0.7, 0.0, 0.0, 1.0, 0.0],
                vec![0.5, 0.0, 0.0, 0.0, 1.0],
            ],
        );

        let result = recommend("Q", &store);
        assert_eq!(result.names, vec!["x", "z", "y", "w"]);
    }

    #[test]
    fn test_tie_with_self_follows_stable_order() {
        // "Twin" at position 0 scores as high as the query itself, so it ranks
        // first and the query is the entry that gets dropped from the head
        let store = store_from(
            &["Twin", "Q", "Other"],
            vec![
                vec![1.0, 1.0, 0.1],
                vec![1.0, 1.0, 0.3],
                vec![0.1, 0.3, 1.0],
            ],
        );

        let result = recommend("Q", &store);
        assert_eq!(result.names, vec!["Q", "Other"]);
    }

    #[test]
    fn test_small_catalogs_return_n_minus_one() {
        for n in 1..7 {
            let store = banded_store(n);
            let result = recommend("Movie 0", &store);
            assert_eq!(result.len(), n - 1, "catalog of {}", n);
            assert_eq!(result.ids.len(), result.names.len());
        }
    }

    #[test]
    fn test_every_entry_excludes_itself() {
        let store = banded_store(12);
        for entry in store.entries() {
            let result = recommend(&entry.title, &store);
            assert_eq!(result.len(), TOP_K);
            assert!(!result.names.contains(&entry.title));
            assert!(!result.ids.contains(&entry.id));
            for name in &result.names {
                assert!(store.find(name).is_some());
            }
        }
    }

    #[tokio::test]
    async fn test_recommend_with_posters_pairs_in_order() {
        let store = Arc::new(store_from(
            &["A", "B", "C"],
            vec![
                vec![1.0, 0.2, 0.9],
                vec![0.2, 1.0, 0.4],
                vec![0.9, 0.4, 1.0],
            ],
        ));
        let resolver = Arc::new(OfflinePosterResolver::new(
            &store,
            "https://placeholder.test/generic".to_string(),
        ));

        let result = recommend_with_posters("A", &store, resolver, 3).await;

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].title, "C");
        assert_eq!(result[0].external_id, MovieId(3));
        assert!(result[0].poster_url.contains("text=C"));
        assert_eq!(result[1].title, "B");
        assert!(result[1].poster_url.contains("text=B"));
    }

    #[tokio::test]
    async fn test_recommend_with_posters_unknown_title() {
        let store = banded_store(3);
        let resolver = Arc::new(OfflinePosterResolver::new(
            &store,
            "https://placeholder.test/generic".to_string(),
        ));

        let result = recommend_with_posters("Missing", &store, resolver, 3).await;
        assert!(result.is_empty());
    }
}
