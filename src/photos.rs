//! Photos
//!
//! Product photos arrive from the catalogue in whatever shape the backend
//! happened to store them: a single URL, a comma-joined list, a JSON array
//! encoded as a string, or an actual array. Everything here collapses those
//! shapes into an ordered list of URLs and never fails.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Photo field as received from the catalogue.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PhotoField {
    /// Missing, `null`, or any shape that cannot hold a URL.
    #[default]
    Absent,

    /// A single string, which may itself encode several URLs.
    Text(String),

    /// An already-parsed list. Entries may be of any JSON type.
    List(Vec<Value>),
}

impl From<Value> for PhotoField {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => PhotoField::Text(text),
            Value::Array(values) => PhotoField::List(values),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::Object(_) => {
                PhotoField::Absent
            }
        }
    }
}

impl From<&str> for PhotoField {
    fn from(text: &str) -> Self {
        PhotoField::Text(text.to_string())
    }
}

impl From<String> for PhotoField {
    fn from(text: String) -> Self {
        PhotoField::Text(text)
    }
}

impl<S: Into<String>> From<Vec<S>> for PhotoField {
    fn from(urls: Vec<S>) -> Self {
        PhotoField::List(urls.into_iter().map(|url| Value::String(url.into())).collect())
    }
}

impl<'de> Deserialize<'de> for PhotoField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Value>::deserialize(deserializer)
            .map(|value| value.map_or(PhotoField::Absent, PhotoField::from))
    }
}

impl PhotoField {
    /// Normalised photo URLs, see [`normalize`].
    pub fn urls(&self) -> Vec<String> {
        normalize(self)
    }

    /// First photo URL, see [`first`].
    pub fn first(&self) -> Option<String> {
        first(self)
    }
}

/// Normalises a photo field into an ordered list of non-empty, trimmed URLs.
///
/// Order is preserved and duplicates are kept. A string that looks like a
/// JSON array but does not parse as one falls through to the comma and
/// single-URL rules.
pub fn normalize(photo: &PhotoField) -> Vec<String> {
    match photo {
        PhotoField::Absent => Vec::new(),
        PhotoField::List(values) => urls_from_values(values),
        PhotoField::Text(text) => urls_from_text(text),
    }
}

/// First normalised photo URL, if there is one.
pub fn first(photo: &PhotoField) -> Option<String> {
    normalize(photo).into_iter().next()
}

/// Whether the field yields at least one URL.
pub fn has_valid_photos(photo: &PhotoField) -> bool {
    !normalize(photo).is_empty()
}

fn urls_from_values(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

fn urls_from_text(text: &str) -> Vec<String> {
    if text.starts_with('[') && text.ends_with(']') {
        match serde_json::from_str::<Vec<Value>>(text) {
            Ok(values) => return urls_from_values(&values),
            Err(err) => {
                tracing::debug!(error = %err, "photo field is not a JSON array, falling back");
            }
        }
    }

    if text.contains(',') {
        return text
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect();
    }

    let url = text.trim();

    if url.is_empty() {
        Vec::new()
    } else {
        vec![url.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn absent_and_empty_inputs_yield_nothing() {
        assert!(normalize(&PhotoField::Absent).is_empty());
        assert!(normalize(&PhotoField::List(Vec::new())).is_empty());
        assert!(normalize(&PhotoField::from("")).is_empty());
        assert!(normalize(&PhotoField::from("   ")).is_empty());
    }

    #[test]
    fn comma_joined_string_is_split_and_trimmed() {
        assert_eq!(
            normalize(&PhotoField::from("a.jpg,b.jpg")),
            vec!["a.jpg", "b.jpg"]
        );
        assert_eq!(
            normalize(&PhotoField::from(" a.jpg ,  b.jpg ,, ")),
            vec!["a.jpg", "b.jpg"]
        );
    }

    #[test]
    fn json_array_string_is_parsed() {
        assert_eq!(
            normalize(&PhotoField::from(r#"["a.jpg","b.jpg"]"#)),
            vec!["a.jpg", "b.jpg"]
        );
    }

    #[test]
    fn json_array_string_drops_non_strings() {
        assert_eq!(
            normalize(&PhotoField::from(r#"["a.jpg", 4, null, "", "b.jpg"]"#)),
            vec!["a.jpg", "b.jpg"]
        );
    }

    #[test]
    fn malformed_json_array_falls_through_to_comma_rule() {
        assert_eq!(
            normalize(&PhotoField::from("[a.jpg,b.jpg]")),
            vec!["[a.jpg", "b.jpg]"]
        );
    }

    #[test]
    fn malformed_json_array_without_comma_is_a_single_url() {
        assert_eq!(normalize(&PhotoField::from("[a.jpg]")), vec!["[a.jpg]"]);
    }

    #[test]
    fn list_filters_blank_and_non_string_entries() {
        let field = PhotoField::List(vec![
            json!("a.jpg"),
            json!(""),
            Value::Null,
            json!(12),
            json!("b.jpg"),
        ]);

        assert_eq!(normalize(&field), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn single_url_is_trimmed() {
        assert_eq!(normalize(&PhotoField::from("  a.jpg ")), vec!["a.jpg"]);
    }

    #[test]
    fn duplicates_are_kept_in_order() {
        assert_eq!(
            normalize(&PhotoField::from("b.jpg,a.jpg,b.jpg")),
            vec!["b.jpg", "a.jpg", "b.jpg"]
        );
    }

    #[test]
    fn first_returns_none_for_empty_inputs() {
        assert_eq!(first(&PhotoField::Absent), None);
        assert_eq!(first(&PhotoField::from(",,")), None);
        assert_eq!(first(&PhotoField::from("[]")), None);
    }

    #[test]
    fn first_returns_leading_url() {
        assert_eq!(
            first(&PhotoField::from("a.jpg,b.jpg")),
            Some("a.jpg".to_string())
        );
        assert!(has_valid_photos(&PhotoField::from(vec!["x.png"])));
        assert!(!has_valid_photos(&PhotoField::from(vec![" "])));
    }

    #[test]
    fn deserialises_every_upstream_shape() -> TestResult {
        let text: PhotoField = serde_json::from_str(r#""a.jpg,b.jpg""#)?;
        let list: PhotoField = serde_json::from_str(r#"["a.jpg"]"#)?;
        let null: PhotoField = serde_json::from_str("null")?;
        let number: PhotoField = serde_json::from_str("42")?;

        assert_eq!(text, PhotoField::from("a.jpg,b.jpg"));
        assert_eq!(list, PhotoField::List(vec![json!("a.jpg")]));
        assert_eq!(null, PhotoField::Absent);
        assert_eq!(number, PhotoField::Absent);

        Ok(())
    }
}
