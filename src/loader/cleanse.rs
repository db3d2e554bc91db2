//! Record cleansing ahead of upload
//!
//! Normalizes a table's records into the shape the target store accepts.
//! [`Cleanser::cleanse`] is a pure function of its input.

use crate::etl::Transformer;
use crate::record::{DATE_FORMAT, Record, Scalar, Table, integral_text};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use eyre::Result;
use std::collections::BTreeSet;

/// Text values that mean "no value"
const TEXT_SENTINELS: [&str; 4] = ["None", "NaT", "nan", "NaN"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: [&str; 2] = [DATE_FORMAT, "%Y/%m/%d"];

/// Cleanses records column by column.
///
/// Steps, in order:
/// 1. drop columns that are null in every record
/// 2. normalize column names (lowercase, trimmed, spaces to underscores)
/// 3. drop rows with no value at all
/// 4. drop server-managed columns (`created_at`)
/// 5. render date columns as `YYYY-MM-DD`
/// 6. turn NaN / NaT sentinels into nulls
/// 7. render foreign-key columns as strings
/// 8. stringify values of mixed or textual columns
///
/// # Example
/// ```
/// use tenant_loader::loader::Cleanser;
/// use tenant_loader::record::Scalar;
/// use tenant_loader::record;
///
/// let cleanser = Cleanser::default();
/// let out = cleanser.cleanse(vec![
///     record! { "Data Entrada" => "2024-03-05 00:00:00", "id_curral" => 7.0, "unique_key" => "k1" },
/// ]);
/// assert_eq!(out[0]["data_entrada"], Scalar::from("2024-03-05"));
/// assert_eq!(out[0]["id_curral"], Scalar::from("7"));
/// ```
#[derive(Debug, Clone)]
pub struct Cleanser {
    date_marker: String,
    server_managed: Vec<String>,
    foreign_keys: Vec<String>,
}

impl Default for Cleanser {
    fn default() -> Self {
        Self {
            date_marker: "data".to_string(),
            server_managed: vec!["created_at".to_string()],
            foreign_keys: [
                "id_curral",
                "id_carregamento",
                "id_trato",
                "vagao",
                "confinamento_id",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Cleanser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Substring that marks a column as holding dates
    pub fn with_date_marker(mut self, marker: impl Into<String>) -> Self {
        self.date_marker = marker.into();
        self
    }

    /// Columns populated by the store itself
    pub fn with_server_managed(mut self, columns: Vec<&str>) -> Self {
        self.server_managed = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Columns rendered as string keys
    pub fn with_foreign_keys(mut self, columns: Vec<&str>) -> Self {
        self.foreign_keys = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add one more foreign-key column (no-op if already present)
    pub fn add_foreign_key(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        if !self.foreign_keys.contains(&column) {
            self.foreign_keys.push(column);
        }
        self
    }

    pub fn cleanse(&self, records: Vec<Record>) -> Vec<Record> {
        let populated: BTreeSet<String> = records
            .iter()
            .flat_map(|r| r.iter())
            .filter(|(_, v)| !v.is_missing())
            .map(|(k, _)| k.clone())
            .collect();

        let mut rows: Vec<Record> = records
            .into_iter()
            .map(|record| {
                let mut out = Record::new();
                for (column, value) in record {
                    if !populated.contains(&column) {
                        continue;
                    }
                    let name = normalize_column(&column);
                    // On a name collision the first populated value wins
                    let keep_existing = out.get(&name).is_some_and(|v| !v.is_missing());
                    if !keep_existing {
                        out.insert(name, value);
                    }
                }
                out
            })
            .filter(|r| r.values().any(|v| !v.is_missing()))
            .collect();

        for row in rows.iter_mut() {
            for column in &self.server_managed {
                row.remove(column);
            }
        }

        let columns: BTreeSet<String> = rows.iter().flat_map(|r| r.keys().cloned()).collect();

        for column in &columns {
            let is_date = column.contains(&self.date_marker)
                || rows
                    .iter()
                    .any(|r| r.get(column).is_some_and(Scalar::is_temporal));
            if is_date {
                convert_date_column(&mut rows, column);
            }
        }

        for row in rows.iter_mut() {
            for value in row.values_mut() {
                if is_sentinel(value) {
                    *value = Scalar::Null;
                }
            }
        }

        for column in &self.foreign_keys {
            for row in rows.iter_mut() {
                if let Some(value) = row.get_mut(column) {
                    *value = foreign_key_form(value);
                }
            }
        }

        for column in columns.iter().filter(|c| !self.foreign_keys.contains(*c)) {
            if is_object_column(&rows, column) {
                stringify_column(&mut rows, column);
            }
        }

        rows
    }
}

impl Transformer for Cleanser {
    type Input = Table;
    type Output = Table;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        let name = input.name;
        let records = self.cleanse(input.records);
        Ok(Table::new(name, records))
    }
}

/// Lowercase, trim, and replace spaces with underscores
pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

fn is_sentinel(value: &Scalar) -> bool {
    match value {
        Scalar::Float(f) => f.is_nan(),
        Scalar::Text(s) => s == "NaT" || s == "NaN",
        _ => false,
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
        })
}

/// `Ok(None)` means "no value", `Err(())` means the value is not a date.
fn to_date(value: &Scalar) -> std::result::Result<Option<NaiveDate>, ()> {
    match value {
        v if v.is_missing() => Ok(None),
        Scalar::Date(d) => Ok(Some(*d)),
        Scalar::Timestamp(ts) => Ok(Some(ts.date())),
        Scalar::Text(s) if s.trim().is_empty() || TEXT_SENTINELS.contains(&s.as_str()) => Ok(None),
        Scalar::Text(s) => parse_date(s).map(Some).ok_or(()),
        _ => Err(()),
    }
}

/// Convert every value of `column`, or leave the column untouched if any
/// value does not convert.
fn convert_date_column(rows: &mut [Record], column: &str) {
    let mut converted = Vec::with_capacity(rows.len());
    for row in rows.iter() {
        match row.get(column).map(to_date) {
            Some(Ok(date)) => converted.push(Some(date)),
            Some(Err(())) => {
                log::debug!("Column '{}' is not entirely dates, leaving as is", column);
                return;
            }
            None => converted.push(None),
        }
    }

    for (row, date) in rows.iter_mut().zip(converted) {
        if let Some(date) = date {
            let value = match date {
                Some(d) => Scalar::Text(d.format(DATE_FORMAT).to_string()),
                None => Scalar::Null,
            };
            row.insert(column.to_string(), value);
        }
    }
}

fn foreign_key_form(value: &Scalar) -> Scalar {
    match value {
        v if v.is_missing() => Scalar::Null,
        Scalar::Float(f) if f.is_finite() && f.fract() == 0.0 => {
            Scalar::Text(integral_text(*f))
        }
        Scalar::Float(f) => Scalar::Text(f.to_string()),
        other => other.render().map(Scalar::Text).unwrap_or(Scalar::Null),
    }
}

/// A column is "object" typed unless all its values are numeric or all
/// are booleans.
fn is_object_column(rows: &[Record], column: &str) -> bool {
    let mut values = rows
        .iter()
        .filter_map(|r| r.get(column))
        .filter(|v| !v.is_missing())
        .peekable();
    if values.peek().is_none() {
        return false;
    }
    let values: Vec<&Scalar> = values.collect();
    let numeric = values.iter().all(|v| v.is_numeric());
    let boolean = values.iter().all(|v| matches!(v, Scalar::Bool(_)));
    !(numeric || boolean)
}

fn stringify_column(rows: &mut [Record], column: &str) {
    for row in rows.iter_mut() {
        if let Some(value) = row.get_mut(column) {
            *value = match value.render() {
                Some(text) if TEXT_SENTINELS.contains(&text.as_str()) => Scalar::Null,
                Some(text) => Scalar::Text(text),
                None => Scalar::Null,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_drops_all_null_columns() {
        let out = Cleanser::default().cleanse(vec![
            record! { "unique_key" => "a", "empty" => Scalar::Null },
            record! { "unique_key" => "b", "empty" => f64::NAN },
        ]);
        assert!(out.iter().all(|r| !r.contains_key("empty")));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_normalizes_column_names() {
        let out = Cleanser::default().cleanse(vec![record! { "  Peso Entrada KG " => 450i64 }]);
        assert_eq!(out[0]["peso_entrada_kg"], Scalar::Int(450));
    }

    #[test]
    fn test_drops_empty_rows() {
        let out = Cleanser::default().cleanse(vec![
            record! { "unique_key" => "a", "v" => 1i64 },
            record! { "unique_key" => Scalar::Null, "v" => Scalar::Null },
            Record::new(),
        ]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_drops_created_at() {
        let out = Cleanser::default().cleanse(vec![
            record! { "unique_key" => "a", "created_at" => "2024-01-01T10:00:00Z" },
        ]);
        assert!(!out[0].contains_key("created_at"));
    }

    #[test]
    fn test_date_marker_columns() {
        let out = Cleanser::default().cleanse(vec![
            record! { "data" => "2024-01-05T13:45:00", "data_entrada" => "2023-12-01" },
            record! { "data" => "NaT", "data_entrada" => "2023/12/02" },
        ]);
        assert_eq!(out[0]["data"], Scalar::from("2024-01-05"));
        assert_eq!(out[1]["data"], Scalar::Null);
        assert_eq!(out[0]["data_entrada"], Scalar::from("2023-12-01"));
        assert_eq!(out[1]["data_entrada"], Scalar::from("2023-12-02"));
    }

    #[test]
    fn test_date_typed_values() {
        let ts = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(6, 30, 0)
            .unwrap();
        let out = Cleanser::default().cleanse(vec![record! { "pesagem" => ts }]);
        assert_eq!(out[0]["pesagem"], Scalar::from("2024-02-29"));
    }

    #[test]
    fn test_date_failure_leaves_column() {
        let out = Cleanser::default().cleanse(vec![
            record! { "data" => "2024-01-05" },
            record! { "data" => "not a date" },
        ]);
        assert_eq!(out[0]["data"], Scalar::from("2024-01-05"));
        assert_eq!(out[1]["data"], Scalar::from("not a date"));
    }

    #[test]
    fn test_nan_becomes_null() {
        let out = Cleanser::default().cleanse(vec![
            record! { "unique_key" => "a", "peso" => f64::NAN },
            record! { "unique_key" => "b", "peso" => 1.5 },
        ]);
        assert_eq!(out[0]["peso"], Scalar::Null);
        assert_eq!(out[1]["peso"], Scalar::Float(1.5));
    }

    #[test]
    fn test_foreign_keys_as_strings() {
        let out = Cleanser::default().cleanse(vec![
            record! { "id_curral" => 5.0, "vagao" => 12i64, "id_trato" => 2.5 },
            record! { "id_curral" => Scalar::Null, "vagao" => "V-3", "id_trato" => 1.0 },
        ]);
        assert_eq!(out[0]["id_curral"], Scalar::from("5"));
        assert_eq!(out[1]["id_curral"], Scalar::Null);
        assert_eq!(out[0]["vagao"], Scalar::from("12"));
        assert_eq!(out[1]["vagao"], Scalar::from("V-3"));
        assert_eq!(out[0]["id_trato"], Scalar::from("2.5"));
        assert_eq!(out[1]["id_trato"], Scalar::from("1"));
    }

    #[test]
    fn test_large_foreign_keys_render_exactly() {
        let out = Cleanser::default().cleanse(vec![
            record! { "id_curral" => 1e20, "unique_key" => "a" },
            record! { "id_curral" => -3.0e19, "unique_key" => "b" },
        ]);
        assert_eq!(out[0]["id_curral"], Scalar::from("100000000000000000000"));
        assert_eq!(out[1]["id_curral"], Scalar::from("-30000000000000000000"));
    }

    #[test]
    fn test_object_columns_stringified_without_sentinels() {
        let out = Cleanser::default().cleanse(vec![
            record! { "lote" => "L1", "status" => "None" },
            record! { "lote" => 7i64, "status" => "ok" },
        ]);
        assert_eq!(out[1]["lote"], Scalar::from("7"));
        assert_eq!(out[0]["status"], Scalar::Null);
        assert_eq!(out[1]["status"], Scalar::from("ok"));
    }

    #[test]
    fn test_numeric_columns_untouched() {
        let out = Cleanser::default().cleanse(vec![
            record! { "peso" => 450i64 },
            record! { "peso" => 452.5 },
        ]);
        assert_eq!(out[0]["peso"], Scalar::Int(450));
        assert_eq!(out[1]["peso"], Scalar::Float(452.5));
    }

    #[test]
    fn test_cleanse_is_deterministic() {
        let input = vec![
            record! { "Unique Key" => "a", "Data" => "2024-01-01", "id_curral" => 3.0, "x" => f64::NAN },
            record! { "Unique Key" => "b", "Data" => "2024-01-02", "id_curral" => Scalar::Null, "x" => "y" },
        ];
        let cleanser = Cleanser::default();
        let first = cleanser.cleanse(input.clone());
        let second = cleanser.cleanse(input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_transform_keeps_table_name() {
        let table = Table::new("fato_trato", vec![record! { "unique_key" => "a" }]);
        let out = Cleanser::default().transform(table).unwrap();
        assert_eq!(out.name, "fato_trato");
        assert_eq!(out.len(), 1);
    }
}
