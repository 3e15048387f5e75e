use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod movie;

pub use movie::CatalogEntry;

/// External (TMDB) identifier of a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub i64);

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MovieId {
    fn from(id: i64) -> Self {
        MovieId(id)
    }
}

/// Ranked neighbours of a queried title, as parallel sequences
///
/// Both vectors are empty when the title is not in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecommendedTitles {
    pub names: Vec<String>,
    pub ids: Vec<MovieId>,
}

impl RecommendedTitles {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// A recommended movie with its resolved poster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub external_id: MovieId,
    pub poster_url: String,
}

/// Poster URL resolved for one movie id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosterResult {
    pub id: MovieId,
    pub poster_url: String,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Subset of the TMDB `GET /movie/{id}` response we care about
///
/// Error bodies carry `status_code`/`status_message` instead of movie fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbMovieDetails {
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub status_message: Option<String>,
}

impl TmdbMovieDetails {
    /// True when the body reports an application-level failure
    pub fn is_rejected(&self) -> bool {
        matches!(self.status_code, Some(code) if code != 200)
    }

    /// Poster path, treating blank values as absent
    pub fn poster_path(&self) -> Option<&str> {
        self.poster_path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_id_display() {
        assert_eq!(format!("{}", MovieId(19995)), "19995");
    }

    #[test]
    fn test_movie_id_serde_transparent() {
        let json = serde_json::to_string(&MovieId(42)).unwrap();
        assert_eq!(json, "42");
        let id: MovieId = serde_json::from_str("42").unwrap();
        assert_eq!(id, MovieId(42));
    }

    #[test]
    fn test_details_with_poster() {
        let details: TmdbMovieDetails =
            serde_json::from_str(r#"{"id": 2, "title": "B", "poster_path": "/x.jpg"}"#).unwrap();
        assert!(!details.is_rejected());
        assert_eq!(details.poster_path(), Some("/x.jpg"));
    }

    #[test]
    fn test_details_null_or_empty_poster() {
        let null: TmdbMovieDetails = serde_json::from_str(r#"{"poster_path": null}"#).unwrap();
        assert_eq!(null.poster_path(), None);

        let empty: TmdbMovieDetails = serde_json::from_str(r#"{"poster_path": ""}"#).unwrap();
        assert_eq!(empty.poster_path(), None);

        let missing: TmdbMovieDetails = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.poster_path(), None);
    }

    #[test]
    fn test_details_rejected_status() {
        let details: TmdbMovieDetails = serde_json::from_str(
            r#"{"status_code": 7, "status_message": "Invalid API key", "success": false}"#,
        )
        .unwrap();
        assert!(details.is_rejected());

        let ok: TmdbMovieDetails = serde_json::from_str(r#"{"status_code": 200}"#).unwrap();
        assert!(!ok.is_rejected());
    }
}
