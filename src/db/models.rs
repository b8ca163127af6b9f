//! Domain models for the song catalog.
//!
//! These models are storage-agnostic. A catalog entry is the denormalized
//! view over the three catalog tables (groups, songs, song_details).

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Surrogate key of a song row.
pub type SongId = i64;

/// Textual form of release dates at every boundary (`DD.MM.YYYY`).
pub const RELEASE_DATE_FORMAT: &str = "%d.%m.%Y";

// =============================================================================
// Release date
// =============================================================================

/// Calendar date of a song release.
///
/// Stored as a calendar date, exchanged as `DD.MM.YYYY` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseDate(NaiveDate);

impl ReleaseDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for ReleaseDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for ReleaseDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(RELEASE_DATE_FORMAT))
    }
}

impl FromStr for ReleaseDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), RELEASE_DATE_FORMAT)
            .map(Self)
            .map_err(|e| format!("Invalid release date '{}' (expected DD.MM.YYYY): {}", s, e))
    }
}

impl Serialize for ReleaseDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReleaseDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tri-state fields
// =============================================================================

/// Per-field optionality for sparse records.
///
/// `Absent` means the caller did not mention the field, `Cleared` means the
/// caller supplied it empty (empty string or null), `Value` carries real data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Absent,
    Cleared,
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl<T> Field<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    pub fn is_cleared(&self) -> bool {
        matches!(self, Field::Cleared)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            Field::Absent | Field::Cleared => None,
        }
    }
}

impl Field<String> {
    /// Wrap supplied text, treating the empty string as cleared.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Field::Cleared
        } else {
            Field::Value(value)
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Value(v),
            None => Field::Absent,
        }
    }
}

// =============================================================================
// Catalog records
// =============================================================================

/// Enriched metadata of a song, as delivered by the enrichment API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDetails {
    pub release_date: ReleaseDate,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub link: String,
}

/// A complete record to be written by `create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    #[serde(rename = "group")]
    pub group_name: String,
    #[serde(rename = "song")]
    pub song_name: String,
    #[serde(flatten)]
    pub details: SongDetails,
}

/// Denormalized read model: one song joined with its group and details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: SongId,
    #[serde(rename = "group")]
    pub group_name: String,
    #[serde(rename = "song")]
    pub song_name: String,
    pub release_date: ReleaseDate,
    pub text: String,
    pub link: String,
}

/// Sparse catalog entry used both as a read filter and as a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialEntry {
    pub group: Field<String>,
    pub song: Field<String>,
    pub release_date: Field<ReleaseDate>,
    pub text: Field<String>,
    pub link: Field<String>,
}

impl PartialEntry {
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Field::text(group);
        self
    }

    pub fn with_song(mut self, song: impl Into<String>) -> Self {
        self.song = Field::text(song);
        self
    }

    pub fn with_release_date(mut self, date: ReleaseDate) -> Self {
        self.release_date = Field::Value(date);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Field::text(text);
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Field::text(link);
        self
    }
}
