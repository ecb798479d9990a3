//! CSV manifest reading.
//!
//! A manifest has a header row of column names and one row per example. Rows
//! are kept schema-less: a row is just its values in header order, and label
//! columns are picked out by a name predicate rather than a fixed struct.

use std::path::Path;
use std::sync::Arc;

use crate::config::LabelsConfig;
use crate::error::PipelineError;

/// One manifest row: column name → string value, in header order.
#[derive(Debug, Clone)]
pub struct ManifestRow {
    columns: Arc<[String]>,
    values: Vec<String>,
}

impl ManifestRow {
    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let (columns, values): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    /// Value of a column, if the column exists.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    /// Iterate `(column, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .zip(self.values.iter())
            .map(|(c, v)| (c.as_str(), v.as_str()))
    }
}

/// Decides which columns hold label tokens and which holds the identifier.
#[derive(Debug, Clone)]
pub struct LabelColumns {
    id_column: String,
    prefix: String,
}

impl LabelColumns {
    pub fn new(id_column: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            id_column: id_column.into(),
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &LabelsConfig) -> Self {
        Self::new(&config.id_column, &config.column_prefix)
    }

    /// Whether a column name denotes a label column.
    pub fn is_label_column(&self, column: &str) -> bool {
        column.starts_with(&self.prefix)
    }

    /// Name of the identifier column.
    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Non-empty label tokens of a row, in column order.
    pub fn tokens<'a>(&'a self, row: &'a ManifestRow) -> impl Iterator<Item = &'a str> + 'a {
        row.iter()
            .filter(|(column, _)| self.is_label_column(column))
            .map(|(_, value)| value)
            .filter(|value| !value.is_empty())
    }

    /// The row's identifier, or `None` when the column is missing or empty.
    pub fn identifier<'a>(&self, row: &'a ManifestRow) -> Option<&'a str> {
        row.get(&self.id_column).filter(|id| !id.is_empty())
    }
}

impl Default for LabelColumns {
    fn default() -> Self {
        Self::from_config(&LabelsConfig::default())
    }
}

/// A fully read manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    rows: Vec<ManifestRow>,
}

impl Manifest {
    /// Read every row of a CSV manifest.
    ///
    /// A missing file, unreadable record, or row with the wrong number of
    /// fields is a [`PipelineError::ManifestRead`].
    pub fn read(path: &Path) -> Result<Self, PipelineError> {
        let read_err = |message: String| PipelineError::ManifestRead {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| read_err(e.to_string()))?;

        let columns: Arc<[String]> = reader
            .headers()
            .map_err(|e| read_err(format!("Cannot read header row: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>()
            .into();

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| read_err(format!("Row {}: {}", i + 1, e)))?;
            rows.push(ManifestRow {
                columns: columns.clone(),
                values: record.iter().map(str::to_string).collect(),
            });
        }

        tracing::debug!("Read {} rows from {:?}", rows.len(), path);
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ManifestRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<ManifestRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_manifest(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images.csv");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_read_rows_in_order() {
        let (_dir, path) = write_manifest("Name,Type1,Type2\nbulbasaur,Grass,Poison\ncharmander,Fire,\n");
        let manifest = Manifest::read(&path).unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.rows()[0].get("Name"), Some("bulbasaur"));
        assert_eq!(manifest.rows()[1].get("Name"), Some("charmander"));
        assert_eq!(manifest.rows()[1].get("Type2"), Some(""));
        assert_eq!(manifest.rows()[1].get("Evolution"), None);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::read(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::ManifestRead { .. }));
        assert!(err.to_string().contains("nope.csv"));
    }

    #[test]
    fn test_read_ragged_row_is_error() {
        let (_dir, path) = write_manifest("Name,Type1\npikachu,Electric,extra\n");
        let err = Manifest::read(&path).unwrap_err();
        assert!(matches!(err, PipelineError::ManifestRead { .. }));
    }

    #[test]
    fn test_header_only_manifest_is_empty() {
        let (_dir, path) = write_manifest("Name,Type1,Type2\n");
        let manifest = Manifest::read(&path).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_label_tokens_skip_empty_and_non_label_columns() {
        let row = ManifestRow::from_pairs([
            ("Name", "charmander"),
            ("Type1", "Fire"),
            ("Type2", ""),
            ("Generation", "1"),
        ]);
        let columns = LabelColumns::default();
        let tokens: Vec<&str> = columns.tokens(&row).collect();
        assert_eq!(tokens, vec!["Fire"]);
    }

    #[test]
    fn test_identifier_requires_non_empty_value() {
        let columns = LabelColumns::default();
        let row = ManifestRow::from_pairs([("Name", ""), ("Type1", "Fire")]);
        assert_eq!(columns.identifier(&row), None);

        let row = ManifestRow::from_pairs([("Type1", "Fire")]);
        assert_eq!(columns.identifier(&row), None);

        let row = ManifestRow::from_pairs([("Name", "vulpix")]);
        assert_eq!(columns.identifier(&row), Some("vulpix"));
    }

    #[test]
    fn test_custom_prefix() {
        let columns = LabelColumns::new("id", "tag_");
        assert!(columns.is_label_column("tag_a"));
        assert!(!columns.is_label_column("Type1"));
        assert_eq!(columns.id_column(), "id");
    }
}
