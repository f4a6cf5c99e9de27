//! Per-cell field normalization.
//!
//! Every cell passes through the same pipeline: quote and whitespace
//! stripping, stray-delimiter removal for dirty columns, missing-value
//! detection, and decimal-comma conversion for numeric fields. Which
//! fields count as numeric is decided by the configured
//! [`NumericDetection`] strategy.

use crate::config::{NumericDetection, ProcessorConfig};
use crate::error::{InmetError, Result};
use crate::models::Cell;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Remove every double quote and trim surrounding whitespace
pub fn strip_quotes_and_whitespace(raw: &str) -> String {
    raw.replace('"', "").trim().to_string()
}

/// Remove delimiter characters embedded in a descriptive value
pub fn remove_embedded_delimiter(value: &str, delimiter: char) -> String {
    value.replace(delimiter, "").trim().to_string()
}

/// Replace decimal commas with periods
pub fn convert_decimal_comma(field: &str) -> String {
    field.replace(',', ".")
}

/// Pattern for numeric-shaped values: only digits, whitespace, comma,
/// period and hyphen, or digits followed by the unit token
pub fn numeric_shape_regex(unit_suffix: &str) -> Result<Regex> {
    let pattern = format!(
        r"^[\d\s,.\-]+$|^[\d\s]+{}$",
        regex::escape(unit_suffix)
    );
    Regex::new(&pattern)
        .map_err(|e| InmetError::configuration(format!("Invalid numeric shape pattern: {}", e)))
}

/// Normalizes raw cells according to column allowlists and detection strategy
#[derive(Debug, Clone)]
pub struct FieldNormalizer {
    detection: NumericDetection,
    numeric_columns: HashSet<String>,
    dirty_columns: HashSet<String>,
    missing_values: HashSet<String>,
    delimiter: char,
    shape: Regex,
}

impl FieldNormalizer {
    pub fn from_config(config: &ProcessorConfig) -> Result<Self> {
        Ok(Self {
            detection: config.numeric_detection,
            numeric_columns: config.numeric_columns.iter().cloned().collect(),
            dirty_columns: config.dirty_columns.iter().cloned().collect(),
            missing_values: config.missing_values.iter().cloned().collect(),
            delimiter: config.input_delimiter,
            shape: numeric_shape_regex(&config.numeric_unit_suffix)?,
        })
    }

    /// Empty values count as numeric-shaped
    pub fn is_numeric_shaped(&self, field: &str) -> bool {
        let field = field.trim();
        field.is_empty() || self.shape.is_match(field)
    }

    pub fn is_numeric_column(&self, column: &str) -> bool {
        self.numeric_columns.contains(column)
    }

    pub fn is_dirty_column(&self, column: &str) -> bool {
        self.dirty_columns.contains(column)
    }

    /// Normalize one raw cell belonging to `column`
    pub fn normalize(&self, column: &str, raw: &str) -> Cell {
        self.normalize_tracked(column, raw).0
    }

    /// Normalize one cell; the flag is set when a non-empty value of a
    /// numeric column could not be parsed and was coerced to missing
    pub(crate) fn normalize_tracked(&self, column: &str, raw: &str) -> (Cell, bool) {
        let mut value = strip_quotes_and_whitespace(raw);

        if self.dirty_columns.contains(column) {
            value = remove_embedded_delimiter(&value, self.delimiter);
        }

        if self.missing_values.contains(&value) {
            return (Cell::Missing, false);
        }

        if self.numeric_columns.contains(column) {
            if value.is_empty() {
                return (Cell::Missing, false);
            }
            let text = convert_decimal_comma(&value);
            return match text.parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => (
                    Cell::Number {
                        text,
                        value: parsed,
                    },
                    false,
                ),
                _ => {
                    debug!("Coercing unparseable '{}' in {} to missing", value, column);
                    (Cell::Missing, true)
                }
            };
        }

        if self.detection == NumericDetection::ShapePredicate && self.is_numeric_shaped(&value) {
            if value.is_empty() {
                return (Cell::Missing, false);
            }
            let text = convert_decimal_comma(&value);
            return match text.parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => (
                    Cell::Number {
                        text,
                        value: parsed,
                    },
                    false,
                ),
                _ => (Cell::Text(text), false),
            };
        }

        (Cell::Text(value), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_set() -> FieldNormalizer {
        FieldNormalizer::from_config(&ProcessorConfig::default()).unwrap()
    }

    fn shape() -> FieldNormalizer {
        let config =
            ProcessorConfig::default().with_numeric_detection(NumericDetection::ShapePredicate);
        FieldNormalizer::from_config(&config).unwrap()
    }

    fn number(text: &str, value: f64) -> Cell {
        Cell::Number {
            text: text.to_string(),
            value,
        }
    }

    #[test]
    fn test_decimal_comma_conversion() {
        let normalizer = column_set();
        assert_eq!(
            normalizer.normalize("TEMP_BULBO_SECO", "23,5"),
            number("23.5", 23.5)
        );
        assert_eq!(
            normalizer.normalize("LATITUDE", " -8,91 "),
            number("-8.91", -8.91)
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for normalizer in [column_set(), shape()] {
            let once = normalizer.normalize("TEMP_BULBO_SECO", "23,5");
            let again = normalizer.normalize("TEMP_BULBO_SECO", once.as_text("NA"));
            assert_eq!(once, again);
            assert_eq!(again.as_text("NA"), "23.5");
        }
    }

    #[test]
    fn test_empty_numeric_is_missing() {
        let normalizer = column_set();
        assert_eq!(normalizer.normalize("UMIDADE_REL", ""), Cell::Missing);
        assert_eq!(normalizer.normalize("UMIDADE_REL", " \"\" "), Cell::Missing);
        assert_ne!(normalizer.normalize("UMIDADE_REL", ""), number("0", 0.0));
    }

    #[test]
    fn test_unparseable_numeric_is_coerced() {
        let normalizer = column_set();
        let (cell, coerced) = normalizer.normalize_tracked("PR_ATM_EST", "1.013,2");
        assert_eq!(cell, Cell::Missing);
        assert!(coerced);

        let (_, coerced) = normalizer.normalize_tracked("PR_ATM_EST", "");
        assert!(!coerced);
    }

    #[test]
    fn test_text_passes_through_stripped() {
        let normalizer = column_set();
        assert_eq!(
            normalizer.normalize("Hora", " \"0000 UTC\" "),
            Cell::Text("0000 UTC".to_string())
        );
        // Non-numeric columns keep commas under the column-set strategy
        assert_eq!(
            normalizer.normalize("OBS", "chuva, forte"),
            Cell::Text("chuva, forte".to_string())
        );
    }

    #[test]
    fn test_dirty_column_delimiters_removed() {
        let normalizer = column_set();
        assert_eq!(normalizer.normalize("UF", ";PE"), Cell::Text("PE".to_string()));
        assert_eq!(
            normalizer.normalize("CODIGO (WMO)", "\";A322;\""),
            Cell::Text("A322".to_string())
        );
        assert_eq!(normalizer.normalize("ALTITUDE", ";827,8"), number("827.8", 827.8));
        // Non-dirty columns keep the delimiter
        assert_eq!(
            normalizer.normalize("OBS", "a;b"),
            Cell::Text("a;b".to_string())
        );
    }

    #[test]
    fn test_missing_sentinels() {
        let config = ProcessorConfig::default().with_missing_values(["-9999"]);
        let normalizer = FieldNormalizer::from_config(&config).unwrap();
        assert_eq!(normalizer.normalize("TEMP_MAX_1H", "-9999"), Cell::Missing);
        assert_eq!(normalizer.normalize("Hora", "-9999"), Cell::Missing);
    }

    #[test]
    fn test_numeric_shape_predicate() {
        let normalizer = shape();
        assert!(normalizer.is_numeric_shaped(""));
        assert!(normalizer.is_numeric_shaped("23,5"));
        assert!(normalizer.is_numeric_shaped("-8,91"));
        assert!(normalizer.is_numeric_shaped("2023-01-01"));
        assert!(normalizer.is_numeric_shaped("0000 UTC"));
        assert!(!normalizer.is_numeric_shaped("01/01/2023"));
        assert!(!normalizer.is_numeric_shaped("GARANHUNS"));
        assert!(!normalizer.is_numeric_shaped("12 GMT"));
    }

    #[test]
    fn test_shape_strategy_conversion() {
        let normalizer = shape();
        assert_eq!(normalizer.normalize("RADIACAO (KJ/m2)", "1234,5"), number("1234.5", 1234.5));
        assert_eq!(
            normalizer.normalize("Hora UTC", "0000 UTC"),
            Cell::Text("0000 UTC".to_string())
        );
        assert_eq!(
            normalizer.normalize("Data", "2023-01-01"),
            Cell::Text("2023-01-01".to_string())
        );
        assert_eq!(
            normalizer.normalize("Data", "01/01/2023"),
            Cell::Text("01/01/2023".to_string())
        );
        assert_eq!(normalizer.normalize("VENTO (m/s)", ""), Cell::Missing);
    }

    #[test]
    fn test_column_set_ignores_shape() {
        let normalizer = column_set();
        assert_eq!(
            normalizer.normalize("RADIACAO (KJ/m2)", "1234,5"),
            Cell::Text("1234,5".to_string())
        );
    }

    #[test]
    fn test_custom_unit_suffix() {
        let config = ProcessorConfig {
            numeric_unit_suffix: "GMT".to_string(),
            numeric_detection: NumericDetection::ShapePredicate,
            ..Default::default()
        };
        let normalizer = FieldNormalizer::from_config(&config).unwrap();
        assert!(normalizer.is_numeric_shaped("1200 GMT"));
        assert!(!normalizer.is_numeric_shaped("1200 UTC"));
    }
}
