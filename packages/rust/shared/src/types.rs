//! Core domain types for the notebook library.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::slug::slugify_title;

// ---------------------------------------------------------------------------
// DiscoveredNotebook
// ---------------------------------------------------------------------------

/// One row of a discovery snapshot.
///
/// `url` is `None` when the row could not be located again or its click
/// never reached a notebook detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredNotebook {
    pub title: String,
    pub url: Option<String>,
    #[serde(default)]
    pub sources: String,
    #[serde(default)]
    pub date: String,
}

// ---------------------------------------------------------------------------
// NotebookRecord
// ---------------------------------------------------------------------------

/// A notebook stored in the library, keyed by its slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotebookRecord {
    /// Stable slug; equals the record's key in [`Library::notebooks`].
    pub id: String,
    /// Resolved notebook URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Display title as observed in the list view.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub content_types: Vec<String>,
    #[serde(default)]
    pub use_cases: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub use_count: u64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub last_used: Option<Timestamp>,
    /// Keys written by other tools; carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NotebookRecord {
    /// Build a fresh, unenriched record under `slug`.
    pub fn new(slug: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: slug.into(),
            url: Some(url.into()),
            name: name.into(),
            description: String::new(),
            topics: Vec::new(),
            content_types: Vec::new(),
            use_cases: Vec::new(),
            tags: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
            use_count: 0,
            last_used: None,
            extra: Map::new(),
        }
    }

    /// A record needs enrichment when it has a URL but no description yet.
    pub fn needs_enrichment(&self) -> bool {
        self.description.is_empty() && self.url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Library
// ---------------------------------------------------------------------------

/// The persisted library document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub notebooks: BTreeMap<String, NotebookRecord>,
    #[serde(default)]
    pub active_notebook_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Library {
    /// Whether any record already carries `url`.
    pub fn contains_url(&self, url: &str) -> bool {
        self.notebooks
            .values()
            .any(|nb| nb.url.as_deref() == Some(url))
    }

    /// Slugs of records with a URL and an empty description, in key order.
    pub fn unenriched_slugs(&self) -> Vec<String> {
        self.notebooks
            .iter()
            .filter(|(_, nb)| nb.needs_enrichment())
            .map(|(slug, _)| slug.clone())
            .collect()
    }

    /// Derive a slug for `title` that is not yet taken.
    ///
    /// Collisions get the first free numeric suffix: `foo`, `foo-2`, `foo-3`, ...
    pub fn unused_slug(&self, title: &str) -> String {
        let base = slugify_title(title);
        if !self.notebooks.contains_key(&base) {
            return base;
        }
        let mut n = 2u32;
        loop {
            let candidate = format!("{base}-{n}");
            if !self.notebooks.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Refresh the library-level timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Some(Timestamp::now());
    }
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// A point in time as stored in the library.
///
/// New stamps are written as RFC 3339. Older libraries carry naive ISO-8601
/// stamps in local time; those are read as `Local` and written back exactly
/// as they were read, so a save never shifts or reformats an untouched stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    instant: DateTime<Utc>,
    raw: Option<String>,
}

impl Timestamp {
    pub fn now() -> Self {
        Utc::now().into()
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// Parse either form; `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let instant = match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(_) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()?
                .and_local_timezone(Local)
                .earliest()?
                .with_timezone(&Utc),
        };
        Some(Self {
            instant,
            raw: Some(raw.to_string()),
        })
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self { instant, raw: None }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match &self.raw {
            Some(raw) => s.serialize_str(raw),
            None => s.serialize_str(&self.instant.to_rfc3339()),
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

/// `null` and `""` both mean "never".
fn empty_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
    match Option::<String>::deserialize(d)? {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => Timestamp::parse(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
    }
}
