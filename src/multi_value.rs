//! Multi-value column encoding.
//!
//! Columns such as `artists` or `genres` pack an ordered list of values into a
//! single text cell. Every item is wrapped on both sides by [`TRIM_DELIMITER`],
//! so two adjacent items meet at [`VALUE_DELIMITER`]:
//!
//! ```text
//! ["Metallica", "Lou Reed"]  <=>  "¤Metallica¤¤Lou Reed¤"
//! ```
//!
//! The delimiter characters are part of the persisted format and must not
//! change. Text that itself contains `¤` does not decode reliably.

use std::fmt;

/// Character wrapping each individual item.
pub const TRIM_DELIMITER: char = '\u{00A4}';

/// Separator between two wrapped items.
pub const VALUE_DELIMITER: &str = "\u{00A4}\u{00A4}";

/// Delimiter to pass to LIKE-based searches that must match whole items.
pub const LIKE_TERM_DELIMITER: &str = "\u{00A4}";

/// Splits a stored value into raw segments, each still carrying its outer
/// trim delimiters. The empty string yields a single empty segment.
pub fn split(column_multi_value: &str) -> Vec<&str> {
    column_multi_value.split(VALUE_DELIMITER).collect()
}

/// Strips every leading and trailing trim delimiter from one segment.
pub fn trim(column_value: &str) -> &str {
    column_value.trim_matches(TRIM_DELIMITER)
}

/// Decodes a stored value into its items.
pub fn split_and_trim(column_multi_value: &str) -> Vec<&str> {
    column_multi_value.split(VALUE_DELIMITER).map(trim).collect()
}

/// Human-readable form of a stored value: items joined by `", "`.
///
/// Output never contains delimiter characters at its edges, so feeding it back
/// in returns it unchanged.
pub fn to_display_string(column_multi_value: &str) -> String {
    if column_multi_value.contains(VALUE_DELIMITER) {
        return split_and_trim(column_multi_value).join(", ");
    }
    trim(column_multi_value).to_string()
}

/// Ordered list of values stored in one multi-value column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct MultiValue(Vec<String>);

impl MultiValue {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Decodes a stored column value. An empty column holds no items.
    pub fn decode(column_multi_value: &str) -> Self {
        if column_multi_value.is_empty() {
            return Self::new();
        }
        split_and_trim(column_multi_value)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Encodes the items for storage. Empty items are dropped since they
    /// cannot be told apart from the separator once wrapped.
    pub fn encode(&self) -> String {
        let mut encoded = String::new();
        for item in self.0.iter().filter(|item| !item.is_empty()) {
            encoded.push(TRIM_DELIMITER);
            encoded.push_str(item);
            encoded.push(TRIM_DELIMITER);
        }
        encoded
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_display_string(&self) -> String {
        self.0.join(", ")
    }
}

impl fmt::Display for MultiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl<S: Into<String>> FromIterator<S> for MultiValue {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
