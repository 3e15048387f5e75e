//! Catalog & similarity store
//!
//! Holds the movie catalog and its precomputed similarity matrix. Both are loaded
//! once at startup and never mutated; position `i` in the catalog is row and
//! column `i` of the matrix.
use std::{path::Path, sync::Arc};

use ndarray::{Array2, ArrayView1};

use crate::{
    error::{AppError, AppResult},
    models::CatalogEntry,
};

pub mod artifacts;

/// Square matrix of pairwise similarity scores
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    scores: Array2<f32>,
}

impl SimilarityMatrix {
    /// Wraps a score array, rejecting non-square or non-finite input
    pub fn new(scores: Array2<f32>) -> AppResult<Self> {
        let (rows, cols) = scores.dim();
        if rows != cols {
            return Err(AppError::Artifact(format!(
                "similarity matrix must be square, got {}x{}",
                rows, cols
            )));
        }

        if let Some(((i, j), score)) = scores.indexed_iter().find(|(_, s)| !s.is_finite()) {
            return Err(AppError::Artifact(format!(
                "similarity matrix has non-finite score {} at ({}, {})",
                score, i, j
            )));
        }

        Ok(Self { scores })
    }

    /// Builds a matrix from nested rows
    pub fn from_rows(rows: Vec<Vec<f32>>) -> AppResult<Self> {
        let n = rows.len();
        if let Some(bad) = rows.iter().position(|row| row.len() != n) {
            return Err(AppError::Artifact(format!(
                "similarity matrix row {} has {} columns, expected {}",
                bad,
                rows[bad].len(),
                n
            )));
        }

        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let scores = Array2::from_shape_vec((n, n), flat)
            .map_err(|e| AppError::Artifact(format!("similarity matrix shape: {}", e)))?;
        Self::new(scores)
    }

    /// Number of rows (and columns)
    pub fn dim(&self) -> usize {
        self.scores.nrows()
    }

    /// Scores of position `p` against every position
    pub fn row(&self, p: usize) -> ArrayView1<'_, f32> {
        self.scores.row(p)
    }

    #[cfg(test)]
    fn scores(&self) -> &Array2<f32> {
        &self.scores
    }
}

/// The loaded catalog and its similarity matrix
#[derive(Debug, Clone)]
pub struct MovieStore {
    entries: Vec<CatalogEntry>,
    similarity: SimilarityMatrix,
}

impl MovieStore {
    /// Pairs a catalog with its matrix, checking that positions line up
    pub fn new(entries: Vec<CatalogEntry>, similarity: SimilarityMatrix) -> AppResult<Self> {
        if entries.len() != similarity.dim() {
            return Err(AppError::Artifact(format!(
                "catalog has {} entries but similarity matrix is {}x{}",
                entries.len(),
                similarity.dim(),
                similarity.dim()
            )));
        }

        Ok(Self {
            entries,
            similarity,
        })
    }

    /// Loads both artifacts from disk
    pub fn load(catalog_path: &Path, similarity_path: &Path) -> AppResult<Self> {
        let entries = artifacts::read_catalog(catalog_path)?;
        let similarity = SimilarityMatrix::new(artifacts::read_similarity(similarity_path)?)?;
        let store = Self::new(entries, similarity)?;

        let duplicates = store.duplicate_title_count();
        if duplicates > 0 {
            tracing::warn!(
                duplicates,
                "Catalog contains duplicate titles, lookups resolve to the first match"
            );
        }

        Ok(store)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Catalog titles in catalog order
    pub fn titles(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.title.as_str()).collect()
    }

    /// Catalog position of the first entry titled exactly `title`
    pub fn position(&self, title: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.title == title)
    }

    /// First entry titled exactly `title`
    pub fn find(&self, title: &str) -> Option<&CatalogEntry> {
        self.position(title).map(|p| &self.entries[p])
    }

    fn duplicate_title_count(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        self.entries
            .iter()
            .filter(|e| !seen.insert(e.title.as_str()))
            .count()
    }
}

/// Outcome of loading the store at startup
///
/// Load failures never abort the process; the recommendation path is disabled
/// and callers report the reason instead.
#[derive(Debug, Clone)]
pub enum DataState {
    Ready(Arc<MovieStore>),
    Unavailable { reason: String },
}

impl DataState {
    /// Loads the store, degrading to `Unavailable` on any failure
    pub fn load(catalog_path: &Path, similarity_path: &Path) -> Self {
        match MovieStore::load(catalog_path, similarity_path) {
            Ok(store) => {
                tracing::info!(
                    movies = store.len(),
                    catalog = %catalog_path.display(),
                    "Movie data loaded"
                );
                DataState::Ready(Arc::new(store))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load movie data");
                DataState::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// The store, or `DataUnavailable` when loading failed
    pub fn store(&self) -> AppResult<Arc<MovieStore>> {
        match self {
            DataState::Ready(store) => Ok(store.clone()),
            DataState::Unavailable { reason } => Err(AppError::DataUnavailable(reason.clone())),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, DataState::Ready(_))
    }
}
