use serde::{Deserialize, Serialize};

use crate::registry::RegistryError;

/// Trusted data-source table file (TOML).
///
/// Example `config/data_sources.toml`:
/// ```toml
/// fallback = [12245]
///
/// [[source]]
/// id = 12245
/// name = "S&P 500 ETF Trust SPDR"
/// ticker = "SPY"
/// price = "695.16"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataSourceFile {
    #[serde(rename = "source")]
    pub sources: Vec<DataSource>,
    /// Ids used for placeholder references. Each must also be a `source`.
    pub fallback: Vec<i64>,
}

/// One trusted oracle feed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DataSource {
    pub id: i64,
    /// Human-readable name shown in the dashboard.
    pub name: String,
    pub ticker: String,
    /// Last known price as a decimal string, e.g. `"695.16"`.
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl DataSource {
    /// The last known price, or `0.0` when the string does not parse.
    pub fn price_value(&self) -> f64 {
        parse_price(&self.price)
    }
}

/// Parse a decimal price string. Anything unparseable or non-finite is `0.0`.
pub fn parse_price(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

impl DataSourceFile {
    pub fn from_toml_str(content: &str) -> Result<Self, RegistryError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file on disk.
    pub fn load(path: &str) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_price_falls_back_to_zero() {
        assert_eq!(parse_price("695.16"), 695.16);
        assert_eq!(parse_price(" 4.38 "), 4.38);
        assert_eq!(parse_price(""), 0.0);
        assert_eq!(parse_price("n/a"), 0.0);
        assert_eq!(parse_price("NaN"), 0.0);
        assert_eq!(parse_price("inf"), 0.0);
    }

    #[test]
    fn parses_file_with_optional_icon() {
        let file = DataSourceFile::from_toml_str(
            r#"
            fallback = [1]

            [[source]]
            id = 1
            name = "One"
            ticker = "ONE"
            price = "1.00"
            icon = "https://example.invalid/one.png"
            "#,
        )
        .unwrap();
        assert_eq!(file.sources.len(), 1);
        assert_eq!(file.fallback, vec![1]);
        assert!(file.sources[0].icon.is_some());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = DataSourceFile::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, RegistryError::Read { .. }));
    }
}
