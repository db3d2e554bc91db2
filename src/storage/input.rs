//! Extracted-table input files
//!
//! The upstream extraction step hands over one JSON document per run:
//! `{ "table_name": [ {record}, ... ], ... }`. The document is parsed as
//! JSON5 so that `NaN` literals written by dataframe exports are accepted.

use crate::etl::Extractor;
use crate::record::{Record, Table};
use eyre::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Read per-table records from a JSON/JSON5 file
pub struct TableFileReader {
    path: PathBuf,
}

impl TableFileReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all tables from the file, sorted by table name
    pub fn read(&self) -> Result<Vec<Table>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read input file: {}", self.path.display()))?;
        parse_tables(&content)
            .with_context(|| format!("Failed to parse input file: {}", self.path.display()))
    }
}

/// Parse a `{ table: [records] }` document
pub fn parse_tables(content: &str) -> Result<Vec<Table>> {
    let tables: BTreeMap<String, Vec<Record>> = json5::from_str(content)?;
    Ok(tables
        .into_iter()
        .map(|(name, records)| Table::new(name, records))
        .collect())
}

impl Extractor for TableFileReader {
    type Item = Table;

    async fn extract(&self) -> Result<Vec<Self::Item>> {
        let tables = self.read()?;
        log::info!(
            "Read {} record(s) across {} table(s) from {}",
            tables.iter().map(Table::len).sum::<usize>(),
            tables.len(),
            self.path.display()
        );
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Scalar;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_tables() {
        let tables = parse_tables(
            r#"{"t1": [{"unique_key": "a", "v": 1}, {"unique_key": "b", "v": 2}], "t0": []}"#,
        )
        .unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "t0");
        assert!(tables[0].is_empty());
        assert_eq!(tables[1].records[1]["v"], Scalar::Int(2));
    }

    #[test]
    fn test_parse_nan_literal() {
        let tables = parse_tables(r#"{"t1": [{"unique_key": "a", "peso": NaN}]}"#).unwrap();
        assert!(tables[0].records[0]["peso"].is_missing());
    }

    #[test]
    fn test_rejects_nested_values() {
        assert!(parse_tables(r#"{"t1": [{"unique_key": {"nested": true}}]}"#).is_err());
    }

    #[tokio::test]
    async fn test_extract_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"fato_trato": [{{"unique_key": "k1"}}]}}"#).unwrap();

        let reader = TableFileReader::new(file.path());
        let tables = reader.extract().await.unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "fato_trato");
    }

    #[test]
    fn test_missing_file() {
        let reader = TableFileReader::new("/nonexistent/input.json");
        assert!(reader.read().is_err());
    }
}
