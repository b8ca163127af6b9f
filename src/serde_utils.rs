/// Serde utility functions for common patterns
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::db::Field;

/// Deserialize a `Field<T>` from an optional JSON string, keeping the three
/// states apart.
///
/// - Missing field → `Field::Absent` (requires `#[serde(default)]`)
/// - Field is `null` or `""` → `Field::Cleared`
/// - Field has a value → `Field::Value(value.parse()?)`
///
/// Usage:
/// ```ignore
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Example {
///     #[serde(default, deserialize_with = "crate::serde_utils::tri_state")]
///     group: Field<String>,
/// }
/// ```
pub fn tri_state<'de, T, D>(de: D) -> Result<Field<T>, D::Error>
where
    T: FromStr,
    T::Err: Display,
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(de)? {
        None => Ok(Field::Cleared),
        Some(raw) if raw.is_empty() => Ok(Field::Cleared),
        Some(raw) => raw
            .parse()
            .map(Field::Value)
            .map_err(serde::de::Error::custom),
    }
}
