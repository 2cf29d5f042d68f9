// src/sheets/column_data_type.rs
use serde::{
    de::{self, Deserializer},
    Deserialize, Serialize,
};
use std::fmt;

/// Declared type of a column. Cell storage is always text; the declared type
/// only decides how values are compared and generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColumnDataType {
    #[default]
    Text,
    Number,
}

impl ColumnDataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnDataType::Text => "text",
            ColumnDataType::Number => "number",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnDataType::Number)
    }
}

impl fmt::Display for ColumnDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Custom Deserialize so request payloads may use the looser spellings
// ("string", "numeric", ...) the presentation layer sends.
impl<'de> Deserialize<'de> for ColumnDataType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_column_data_type(&raw)
            .ok_or_else(|| de::Error::custom(format!("Unknown ColumnDataType '{}'", raw)))
    }
}

/// `deserialize_with` for advisory type hints: unknown spellings and
/// non-string values become `None` instead of failing the payload.
pub fn deserialize_type_hint<'de, D>(deserializer: D) -> Result<Option<ColumnDataType>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Hint {
        Name(String),
        Other(de::IgnoredAny),
    }

    Ok(match Option::<Hint>::deserialize(deserializer)? {
        Some(Hint::Name(raw)) => parse_column_data_type(&raw),
        Some(Hint::Other(_)) | None => None,
    })
}

pub fn parse_column_data_type(s: &str) -> Option<ColumnDataType> {
    match s.trim().to_ascii_lowercase().as_str() {
        "text" | "string" | "str" => Some(ColumnDataType::Text),
        // Legacy numeric spellings all map to Number
        "number" | "numeric" | "int" | "integer" | "i64" | "float" | "f64" | "real" => {
            Some(ColumnDataType::Number)
        }
        _ => None,
    }
}
