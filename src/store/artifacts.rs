//! On-disk artifact formats
//!
//! The catalog is a JSON array of entries in matrix order. The similarity matrix
//! is a bincode-encoded `ndarray` array wrapped in a gzip stream.
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use ndarray::Array2;

use crate::{
    error::{AppError, AppResult},
    models::CatalogEntry,
};

/// Reads the JSON catalog
pub fn read_catalog(path: &Path) -> AppResult<Vec<CatalogEntry>> {
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|e| {
        AppError::Artifact(format!("catalog {}: {}", path.display(), e))
    })
}

/// Reads the compressed similarity matrix
pub fn read_similarity(path: &Path) -> AppResult<Array2<f32>> {
    let decoder = GzDecoder::new(BufReader::new(File::open(path)?));
    bincode::deserialize_from(decoder).map_err(|e| {
        AppError::Artifact(format!("similarity matrix {}: {}", path.display(), e))
    })
}

/// Writes the JSON catalog
pub fn write_catalog(path: &Path, entries: &[CatalogEntry]) -> AppResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, entries)
        .map_err(|e| AppError::Internal(format!("Catalog serialization error: {}", e)))?;
    writer.flush()?;
    Ok(())
}

/// Writes the compressed similarity matrix
pub fn write_similarity(path: &Path, scores: &Array2<f32>) -> AppResult<()> {
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(path)?), Compression::default());
    bincode::serialize_into(&mut encoder, scores)
        .map_err(|e| AppError::Internal(format!("Matrix serialization error: {}", e)))?;
    encoder.finish()?.flush()?;
    Ok(())
}
