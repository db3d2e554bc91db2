//! Record and scalar types flowing through the loader
//!
//! A [`Record`] is a flat mapping of column name to [`Scalar`]. Records are
//! grouped per destination table in a [`Table`].

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical date rendering expected by the target store
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

/// Column name -> value
pub type Record = BTreeMap<String, Scalar>;

/// Exact decimal text of an integral float, without a decimal point
pub(crate) fn integral_text(f: f64) -> String {
    if f == 0.0 {
        // -0.0 renders as "0"
        return "0".to_string();
    }
    format!("{:.0}", f)
}

impl Scalar {
    /// True for explicit nulls and not-a-number floats
    pub fn is_missing(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// True for numeric variants (ints and floats)
    pub fn is_numeric(&self) -> bool {
        matches!(self, Scalar::Int(_) | Scalar::Float(_))
    }

    /// True for date and timestamp variants
    pub fn is_temporal(&self) -> bool {
        matches!(self, Scalar::Date(_) | Scalar::Timestamp(_))
    }

    /// Render the value as a deduplication key.
    ///
    /// Text is used verbatim, integers and integral floats are rendered
    /// without a decimal point. Anything else has no key form.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Scalar::Text(s) if !s.trim().is_empty() => Some(s.clone()),
            Scalar::Int(i) => Some(i.to_string()),
            Scalar::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(integral_text(*f)),
            _ => None,
        }
    }

    /// Render a non-null value as text.
    ///
    /// Floats keep a trailing `.0` when integral so the rendering matches
    /// what a spreadsheet export would show for a float column.
    pub fn render(&self) -> Option<String> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
            Scalar::Int(i) => Some(i.to_string()),
            Scalar::Float(f) if f.is_nan() => None,
            Scalar::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(format!("{:.1}", f)),
            Scalar::Float(f) => Some(f.to_string()),
            Scalar::Text(s) => Some(s.clone()),
            Scalar::Date(d) => Some(d.format(DATE_FORMAT).to_string()),
            Scalar::Timestamp(ts) => Some(ts.format("%Y-%m-%dT%H:%M:%S").to_string()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<NaiveDate> for Scalar {
    fn from(value: NaiveDate) -> Self {
        Scalar::Date(value)
    }
}

impl From<NaiveDateTime> for Scalar {
    fn from(value: NaiveDateTime) -> Self {
        Scalar::Timestamp(value)
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_none(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Int(i) => serializer.serialize_i64(*i),
            Scalar::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Scalar::Float(_) => serializer.serialize_none(),
            Scalar::Text(s) => serializer.serialize_str(s),
            Scalar::Date(d) => serializer.collect_str(&d.format(DATE_FORMAT)),
            Scalar::Timestamp(ts) => serializer.collect_str(&ts.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Scalar;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a scalar value (null, boolean, number or string)")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Scalar, E> {
        Ok(Scalar::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Scalar, E> {
        Ok(Scalar::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Scalar, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Scalar, E> {
        Ok(Scalar::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scalar, E> {
        Ok(Scalar::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scalar, E> {
        Ok(i64::try_from(v)
            .map(Scalar::Int)
            .unwrap_or(Scalar::Float(v as f64)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Scalar, E> {
        Ok(Scalar::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Scalar, E> {
        Ok(Scalar::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Scalar, E> {
        Ok(Scalar::Text(v))
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScalarVisitor)
    }
}

/// Records bound for one destination table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Build a [`Record`] from `(column, value)` pairs
///
/// ```
/// use tenant_loader::record;
///
/// let r = record! { "unique_key" => "a", "v" => 1i64 };
/// assert_eq!(r.len(), 2);
/// ```
#[macro_export]
macro_rules! record {
    ($($col:expr => $val:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut r = $crate::record::Record::new();
        $( r.insert($col.to_string(), $crate::record::Scalar::from($val)); )*
        r
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_rendering() {
        assert_eq!(Scalar::from("abc").as_key().as_deref(), Some("abc"));
        assert_eq!(Scalar::Int(42).as_key().as_deref(), Some("42"));
        assert_eq!(Scalar::Float(5.0).as_key().as_deref(), Some("5"));
        assert_eq!(Scalar::Float(5.5).as_key(), None);
        assert_eq!(Scalar::from("  ").as_key(), None);
        assert_eq!(Scalar::Null.as_key(), None);
    }

    #[test]
    fn test_large_integral_float_keys_stay_distinct() {
        assert_eq!(
            Scalar::Float(1e19).as_key().as_deref(),
            Some("10000000000000000000")
        );
        assert_eq!(
            Scalar::Float(2e19).as_key().as_deref(),
            Some("20000000000000000000")
        );
        assert_eq!(
            Scalar::Float(-1e19).as_key().as_deref(),
            Some("-10000000000000000000")
        );
        assert_eq!(Scalar::Float(-0.0).as_key().as_deref(), Some("0"));
    }

    #[test]
    fn test_missing() {
        assert!(Scalar::Null.is_missing());
        assert!(Scalar::Float(f64::NAN).is_missing());
        assert!(!Scalar::Float(0.0).is_missing());
        assert!(!Scalar::from("").is_missing());
    }

    #[test]
    fn test_deserialize_json() {
        let r: Record =
            serde_json::from_str(r#"{"a": null, "b": true, "c": 3, "d": 1.5, "e": "x"}"#).unwrap();
        assert_eq!(r["a"], Scalar::Null);
        assert_eq!(r["b"], Scalar::Bool(true));
        assert_eq!(r["c"], Scalar::Int(3));
        assert_eq!(r["d"], Scalar::Float(1.5));
        assert_eq!(r["e"], Scalar::from("x"));
    }

    #[test]
    fn test_serialize_dates_and_nan() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let r = record! { "d" => date, "n" => f64::NAN };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["d"], "2024-01-02");
        assert!(json["n"].is_null());
    }

    #[test]
    fn test_render_float() {
        assert_eq!(Scalar::Float(3.0).render().as_deref(), Some("3.0"));
        assert_eq!(Scalar::Float(0.25).render().as_deref(), Some("0.25"));
        assert_eq!(Scalar::Float(f64::NAN).render(), None);
    }
}
