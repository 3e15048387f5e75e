//! Poster resolution
//!
//! A resolver turns a movie id into a displayable image URL. Resolution never
//! fails: anything that goes wrong ends in a placeholder image.
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::models::{MovieId, PosterResult};

pub mod credentials;
pub mod offline;
pub mod tmdb;

pub use credentials::{CredentialChain, CredentialProvider, EnvCredential, StaticCredential};
pub use offline::{title_placeholder, OfflinePosterResolver};
pub use tmdb::{TmdbPosterResolver, TmdbSettings};

/// Trait for poster sources
#[async_trait::async_trait]
pub trait PosterResolver: Send + Sync {
    /// Resolve the poster URL for one movie
    ///
    /// Always returns a usable URL, falling back to [`placeholder`](Self::placeholder).
    async fn resolve_poster(&self, id: MovieId) -> String;

    /// Resolve posters for several movies on a bounded pool
    ///
    /// At most `workers` lookups run at once. Results come back in the order of
    /// `ids`, regardless of which lookup finishes first.
    async fn resolve_batch(&self, ids: Vec<MovieId>, workers: usize) -> Vec<PosterResult> {
        let permits = Arc::new(Semaphore::new(workers.max(1)));
        let mut tasks = Vec::with_capacity(ids.len());

        for id in ids {
            let resolver = self.clone_for_task();
            let permits = permits.clone();
            let task = tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                resolver.resolve_poster(id).await
            });
            tasks.push((id, task));
        }

        let mut results = Vec::with_capacity(tasks.len());
        for (id, task) in tasks {
            let poster_url = match task.await {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!(movie_id = %id, error = %e, "Poster task join error");
                    self.placeholder().to_string()
                }
            };
            results.push(PosterResult { id, poster_url });
        }

        results
    }

    /// Generic image used when no poster is available
    fn placeholder(&self) -> &str;

    /// Clone resolver for parallel task execution
    fn clone_for_task(&self) -> Box<dyn PosterResolver>;

    /// Resolver name for logging and debugging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    /// Resolver whose lookups finish in reverse id order
    #[derive(Clone)]
    struct SlowFirstResolver {
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl SlowFirstResolver {
        fn new() -> Self {
            Self {
                in_flight: Arc::new(AtomicUsize::new(0)),
                peak: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait::async_trait]
    impl PosterResolver for SlowFirstResolver {
        async fn resolve_poster(&self, id: MovieId) -> String {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let delay = 60u64.saturating_sub(id.0 as u64 * 10);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            format!("https://img.test/{}.jpg", id)
        }

        fn placeholder(&self) -> &str {
            "https://img.test/placeholder.jpg"
        }

        fn clone_for_task(&self) -> Box<dyn PosterResolver> {
            Box::new(self.clone())
        }

        fn name(&self) -> &'static str {
            "slow_first"
        }
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order() {
        let resolver = SlowFirstResolver::new();
        let ids = vec![MovieId(1), MovieId(2), MovieId(3)];

        let results = resolver.resolve_batch(ids, 3).await;

        let urls: Vec<&str> = results.iter().map(|r| r.poster_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://img.test/1.jpg",
                "https://img.test/2.jpg",
                "https://img.test/3.jpg",
            ]
        );
        assert_eq!(results[2].id, MovieId(3));
    }

    #[tokio::test]
    async fn test_batch_is_bounded_by_workers() {
        let resolver = SlowFirstResolver::new();
        let ids = (1..=5).map(MovieId).collect();

        let results = resolver.resolve_batch(ids, 3).await;

        assert_eq!(results.len(), 5);
        assert!(resolver.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_batch_with_zero_workers_still_runs() {
        let resolver = SlowFirstResolver::new();
        let results = resolver.resolve_batch(vec![MovieId(4)], 0).await;

        assert_eq!(results.len(), 1);
        assert_eq!(resolver.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let resolver = SlowFirstResolver::new();
        assert!(resolver.resolve_batch(Vec::new(), 3).await.is_empty());
    }
}
