//! TMDB poster resolver
//!
//! Looks up `GET {api_url}/movie/{id}?api_key=...&language=...` and joins the
//! returned `poster_path` onto the image CDN prefix. Keys are tried in order:
//!
//! 1. Non-success HTTP status or a `status_code` other than 200 in the body:
//!    try the next key.
//! 2. Transport error (timeout, connection refused, bad body): try the next key.
//! 3. Body without a usable `poster_path`: the movie has no poster, answer with
//!    the placeholder without trying further keys.
//!
//! Transient statuses, timeouts and connection failures are retried per key
//! before steps 1 and 2 apply.
use std::{ops::ControlFlow, time::Duration};

use reqwest::Client as HttpClient;

use crate::{
    config::Config,
    db::Cache,
    error::{AppError, AppResult},
    models::{MovieId, TmdbMovieDetails},
    services::{
        posters::{credentials::Credential, CredentialChain, PosterResolver},
        retry::{send_with_retry, RetryPolicy},
    },
};

/// Connection settings for the TMDB API
#[derive(Debug, Clone)]
pub struct TmdbSettings {
    pub api_url: String,
    pub language: String,
    pub image_base_url: String,
    pub placeholder_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl TmdbSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_url: config.tmdb_api_url.trim_end_matches('/').to_string(),
            language: config.tmdb_language.clone(),
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
            placeholder_url: config.placeholder_url.clone(),
            timeout: config.request_timeout(),
            retry: RetryPolicy::new(config.retry_attempts, config.retry_backoff()),
        }
    }
}

/// Cache value recorded for a movie known to have no poster
const NO_POSTER: &str = "";

/// What a key-level lookup established about a movie's poster
#[derive(Debug, Clone, PartialEq)]
enum PosterOutcome {
    Found(String),
    NoPoster,
}

impl PosterOutcome {
    fn from_cache_value(value: String) -> Self {
        if value == NO_POSTER {
            PosterOutcome::NoPoster
        } else {
            PosterOutcome::Found(value)
        }
    }

    fn cache_value(&self) -> &str {
        match self {
            PosterOutcome::Found(url) => url,
            PosterOutcome::NoPoster => NO_POSTER,
        }
    }
}

#[derive(Clone)]
pub struct TmdbPosterResolver {
    http_client: HttpClient,
    settings: TmdbSettings,
    credentials: CredentialChain,
    cache: Option<Cache>,
}

impl TmdbPosterResolver {
    pub fn new(
        settings: TmdbSettings,
        credentials: CredentialChain,
        cache: Option<Cache>,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            http_client,
            settings,
            credentials,
            cache,
        })
    }

    /// Full image URL for a poster path
    fn image_url(&self, poster_path: &str) -> String {
        if poster_path.starts_with('/') {
            format!("{}{}", self.settings.image_base_url, poster_path)
        } else {
            format!("{}/{}", self.settings.image_base_url, poster_path)
        }
    }

    /// Fetches movie details with one key
    async fn fetch_details(&self, api_key: &str, id: MovieId) -> AppResult<TmdbMovieDetails> {
        let url = format!("{}/movie/{}", self.settings.api_url, id);
        let request = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", api_key),
                ("language", self.settings.language.as_str()),
            ])
            .build()
            .map_err(reqwest::Error::without_url)?;

        let response = send_with_retry(&self.http_client, &self.settings.retry, request)
            .await
            .map_err(reqwest::Error::without_url)?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {}",
                response.status()
            )));
        }

        let details = response
            .json::<TmdbMovieDetails>()
            .await
            .map_err(reqwest::Error::without_url)?;
        Ok(details)
    }

    /// One attempt with one key
    async fn attempt(&self, credential: Credential, id: MovieId) -> ControlFlow<PosterOutcome> {
        match self.fetch_details(&credential.api_key, id).await {
            Ok(details) if details.is_rejected() => {
                tracing::warn!(
                    movie_id = %id,
                    credential = %credential.label,
                    status_code = ?details.status_code,
                    status_message = ?details.status_message,
                    "TMDB rejected request, trying next credential"
                );
                ControlFlow::Continue(())
            }
            Ok(details) => match details.poster_path() {
                Some(path) => ControlFlow::Break(PosterOutcome::Found(self.image_url(path))),
                None => {
                    tracing::debug!(movie_id = %id, "Movie has no poster");
                    ControlFlow::Break(PosterOutcome::NoPoster)
                }
            },
            Err(e) => {
                tracing::warn!(
                    movie_id = %id,
                    credential = %credential.label,
                    error = %e,
                    "Poster lookup failed, trying next credential"
                );
                ControlFlow::Continue(())
            }
        }
    }

    /// Display URL for a definitive outcome
    fn outcome_url(&self, outcome: PosterOutcome) -> String {
        match outcome {
            PosterOutcome::Found(url) => url,
            PosterOutcome::NoPoster => self.settings.placeholder_url.clone(),
        }
    }

    async fn cached_poster(&self, id: MovieId) -> Option<PosterOutcome> {
        let cache = self.cache.as_ref()?;
        match cache.poster(id).await {
            Ok(hit) => hit.map(PosterOutcome::from_cache_value),
            Err(e) => {
                tracing::warn!(error = %e, "Poster cache read failed");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl PosterResolver for TmdbPosterResolver {
    async fn resolve_poster(&self, id: MovieId) -> String {
        if let Some(outcome) = self.cached_poster(id).await {
            tracing::debug!(movie_id = %id, "Poster cache hit");
            return self.outcome_url(outcome);
        }

        let outcome = self
            .credentials
            .first_success(|credential| self.attempt(credential, id))
            .await;

        let Some(outcome) = outcome else {
            tracing::warn!(
                movie_id = %id,
                credentials = self.credentials.len(),
                "All credentials exhausted, using placeholder"
            );
            return self.settings.placeholder_url.clone();
        };

        if let Some(cache) = &self.cache {
            cache.store_poster(id, outcome.cache_value());
        }

        self.outcome_url(outcome)
    }

    fn placeholder(&self) -> &str {
        &self.settings.placeholder_url
    }

    fn clone_for_task(&self) -> Box<dyn PosterResolver> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
