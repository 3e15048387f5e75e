use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::MovieId;

/// One movie in the catalog
///
/// The entry's position in the catalog is its row in the similarity matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// External identifier used for poster lookups
    #[serde(alias = "movie_id")]
    pub id: MovieId,
    /// Display title, used as the lookup key
    pub title: String,
    /// Any further columns carried by the catalog artifact
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl CatalogEntry {
    /// Creates an entry without extra metadata
    pub fn new(id: impl Into<MovieId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            metadata: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry() {
        let entry = CatalogEntry::new(19995, "Avatar");
        assert_eq!(entry.id, MovieId(19995));
        assert_eq!(entry.title, "Avatar");
        assert!(entry.metadata.is_empty());
    }

    #[test]
    fn test_extra_columns_are_kept() {
        let entry: CatalogEntry =
            serde_json::from_str(r#"{"id": 285, "title": "Pirates", "tags": "sea ship"}"#).unwrap();
        assert_eq!(entry.id, MovieId(285));
        assert_eq!(entry.metadata.get("tags"), Some(&Value::from("sea ship")));
    }

    #[test]
    fn test_movie_id_column_alias() {
        let entry: CatalogEntry =
            serde_json::from_str(r#"{"movie_id": 7, "title": "Movie 7"}"#).unwrap();
        assert_eq!(entry.id, MovieId(7));
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let result = serde_json::from_str::<CatalogEntry>(r#"{"id": 1}"#);
        assert!(result.is_err());
    }
}
