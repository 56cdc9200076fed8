use std::fmt;

use chrono::{DateTime, Utc};
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

/// A community event as listed by `GET /events`.
///
/// Only `title`, `date` and `location` are rendered; the remaining fields are
/// filled in by the server and carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "createdAt",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(
        title: impl Into<String>,
        date: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            location: location.into(),
            ..Self::default()
        }
    }
}

impl Event {
    /// Reads one entry of a list response without rejecting it.
    ///
    /// Displayed fields render the way a template literal would: a missing
    /// field as `undefined`, `null` as `null`, other scalars as their JSON
    /// text. Metadata that does not fit its type is left empty.
    pub fn from_listing(entry: &serde_json::Map<String, serde_json::Value>) -> Self {
        let id = match entry.get("id") {
            Some(serde_json::Value::String(id)) => Some(id.clone()),
            Some(serde_json::Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };
        Self {
            id,
            title: listed_text(entry.get("title")),
            date: listed_text(entry.get("date")),
            location: listed_text(entry.get("location")),
            description: entry
                .get("description")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned),
            created_at: entry
                .get("createdAt")
                .and_then(serde_json::Value::as_str)
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|at| at.with_timezone(&Utc)),
        }
    }
}

fn listed_text(value: Option<&serde_json::Value>) -> String {
    match value {
        None => "undefined".to_owned(),
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} @ {}", self.title, self.date, self.location)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct EventList {
    #[serde(default)]
    pub events: Vec<Event>,
}

impl EventList {
    /// Decodes a list response body.
    ///
    /// The body itself must be JSON. A missing or non-array `events` field
    /// yields an empty list, and array entries that are not objects are
    /// dropped. Every object entry is kept, whatever shape its fields take.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        Ok(Self::from_json_value(value))
    }

    pub fn from_json_value(value: serde_json::Value) -> Self {
        let events = match value {
            serde_json::Value::Object(mut map) => match map.remove("events") {
                Some(serde_json::Value::Array(items)) => items
                    .iter()
                    .filter_map(serde_json::Value::as_object)
                    .map(Event::from_listing)
                    .collect(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Self { events }
    }

    pub fn render_lines(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }
}

impl From<serde_json::Value> for EventList {
    fn from(value: serde_json::Value) -> Self {
        Self::from_json_value(value)
    }
}

/// Flat form submission: field name to string value, in form order.
///
/// A repeated field name keeps its first position and takes the last value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormPayload {
    fields: Vec<(String, String)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for FormPayload
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Self::new();
        for (name, value) in iter {
            payload.insert(name, value);
        }
        payload
    }
}

impl Serialize for FormPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
