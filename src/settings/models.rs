// LibriSync - Audible Library Sync for Mobile
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Preference and library models
//!
//! Field names serialize in camelCase so the stored JSON matches what the
//! mobile app writes (`marketId`, `fontSize`, ...).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const DEFAULT_VOLUME: u32 = 80;
pub const DEFAULT_VOICE: &str = "Female Voice";
pub const DEFAULT_FONT_SIZE: f64 = 16.0;
pub const DEFAULT_SPEED: f64 = 1.0;
pub const DEFAULT_BACKGROUND_NAME: &str = "White";
pub const DEFAULT_BACKGROUND_COLOR: &str = "#FFFFFF";
pub const DEFAULT_LISTENING_MODE: &str = "Once";

/// Reader background theme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Background {
    /// Display name (e.g., "White", "Sepia")
    pub name: String,
    /// CSS-style color string (e.g., "#FFFFFF")
    pub color: String,
}

impl Background {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::new(DEFAULT_BACKGROUND_NAME, DEFAULT_BACKGROUND_COLOR)
    }
}

/// Every user preference, as read back from storage
///
/// Each field is stored under its own key. There is no atomicity across
/// fields: an interrupted sequence of saves can leave a mix of old and new
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSet {
    /// Playback volume, nominally 0-100 (not enforced)
    pub volume: u32,
    /// Narration voice name
    pub voice: String,
    /// Reader font size in points
    pub font_size: f64,
    /// Playback speed multiplier
    pub speed: f64,
    pub background: Background,
    /// Listening mode (e.g., "Once", "Loop")
    pub listening_mode: String,
    /// Accumulated reading time, in seconds
    pub reading_time_seconds: u64,
}

impl Default for PreferenceSet {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            voice: DEFAULT_VOICE.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            speed: DEFAULT_SPEED,
            background: Background::default(),
            listening_mode: DEFAULT_LISTENING_MODE.to_string(),
            reading_time_seconds: 0,
        }
    }
}

/// JSON key holding a book's identifier
pub const MARKET_ID_FIELD: &str = "marketId";

/// Identifier of a saved book
///
/// Other clients store ids either as strings or as numbers. Both are kept as
/// written and compared exactly: `123` and `"123"` are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarketId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketId::Text(text) => f.write_str(text),
            MarketId::Number(number) => write!(f, "{}", number),
        }
    }
}

impl From<String> for MarketId {
    fn from(text: String) -> Self {
        MarketId::Text(text)
    }
}

impl From<&str> for MarketId {
    fn from(text: &str) -> Self {
        MarketId::Text(text.to_string())
    }
}

impl From<&String> for MarketId {
    fn from(text: &String) -> Self {
        MarketId::Text(text.clone())
    }
}

impl From<&MarketId> for MarketId {
    fn from(id: &MarketId) -> Self {
        id.clone()
    }
}

impl From<u64> for MarketId {
    fn from(number: u64) -> Self {
        MarketId::Number(number.into())
    }
}

impl From<i64> for MarketId {
    fn from(number: i64) -> Self {
        MarketId::Number(number.into())
    }
}

impl PartialEq<str> for MarketId {
    fn eq(&self, other: &str) -> bool {
        matches!(self, MarketId::Text(text) if text == other)
    }
}

impl PartialEq<&str> for MarketId {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// A book saved to the user's library
///
/// Only `market_id` has meaning to the store; every other field is carried
/// through verbatim. At most one entry per `market_id` is persisted.
///
/// The extra fields never contain a `marketId` key, so the serialized id is
/// always `market_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryBook {
    #[serde(rename = "marketId")]
    pub market_id: MarketId,

    /// Additional caller-defined fields (title, cover, progress, ...)
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl LibraryBook {
    pub fn new(market_id: impl Into<MarketId>) -> Self {
        Self {
            market_id: market_id.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style helper to attach an extra field
    ///
    /// A `marketId` key is ignored; the id is only set through [`LibraryBook::new`]
    /// or by assigning `market_id`.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key == MARKET_ID_FIELD {
            log::warn!("Ignoring '{}' extra field on book {}", MARKET_ID_FIELD, self.market_id);
            return self;
        }
        self.fields.insert(key, value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Every extra field, in insertion order of the stored JSON
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Convenience accessor for the common `title` field
    pub fn title(&self) -> Option<&str> {
        self.field("title").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preference_defaults() {
        let prefs = PreferenceSet::default();
        assert_eq!(prefs.volume, 80);
        assert_eq!(prefs.voice, "Female Voice");
        assert_eq!(prefs.font_size, 16.0);
        assert_eq!(prefs.speed, 1.0);
        assert_eq!(prefs.background, Background::new("White", "#FFFFFF"));
        assert_eq!(prefs.listening_mode, "Once");
        assert_eq!(prefs.reading_time_seconds, 0);
    }

    #[test]
    fn test_preference_set_camel_case() {
        let json = serde_json::to_value(PreferenceSet::default()).unwrap();
        assert_eq!(json["fontSize"], json!(16.0));
        assert_eq!(json["listeningMode"], json!("Once"));
        assert_eq!(json["readingTimeSeconds"], json!(0));
        assert!(json.get("font_size").is_none());
    }

    #[test]
    fn test_library_book_flattens_fields() {
        let book = LibraryBook::new("B07NP9L44Y")
            .with_field("title", "A Mind of Her Own")
            .with_field("progress", 0.25);

        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(
            json,
            json!({"marketId": "B07NP9L44Y", "title": "A Mind of Her Own", "progress": 0.25})
        );
    }

    #[test]
    fn test_library_book_keeps_unknown_fields() {
        let raw = json!({"marketId": "A", "cover": {"url": "https://example.com/a.jpg"}});
        let book: LibraryBook = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(book.market_id, "A");
        assert_eq!(book.field("cover"), Some(&json!({"url": "https://example.com/a.jpg"})));
        assert!(book.title().is_none());
        assert_eq!(serde_json::to_value(&book).unwrap(), raw);
    }

    #[test]
    fn test_market_id_field_cannot_override_id() {
        let book = LibraryBook::new("A")
            .with_field("marketId", "B")
            .with_field("title", "X");

        assert_eq!(book.market_id, "A");
        assert!(book.field("marketId").is_none());
        assert_eq!(
            serde_json::to_value(&book).unwrap(),
            json!({"marketId": "A", "title": "X"})
        );
    }

    #[test]
    fn test_numeric_market_id_kept_as_number() {
        let book: LibraryBook =
            serde_json::from_value(json!({"marketId": 123, "title": "X"})).unwrap();

        assert_eq!(book.market_id, MarketId::from(123u64));
        assert_ne!(book.market_id, MarketId::from("123"));
        assert_eq!(book.market_id.to_string(), "123");
        assert_eq!(serde_json::to_value(&book).unwrap()["marketId"], json!(123));
    }

    #[test]
    fn test_library_book_requires_market_id() {
        let result: Result<LibraryBook, _> = serde_json::from_value(json!({"title": "X"}));
        assert!(result.is_err());
    }
}
