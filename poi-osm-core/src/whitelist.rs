//! Tag whitelists used to narrow Overpass results.
//!
//! A whitelist is a set of OSM tag filters joined with logical OR. An entry
//! with an empty value accepts any value for its key. An empty whitelist
//! accepts every POI.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Tags;

/// One acceptable OSM tag or `tag=value` pair.
///
/// # Examples
/// ```
/// use poi_osm_core::WhitelistEntry;
///
/// let entry: WhitelistEntry = " amenity = restaurant ".parse()?;
/// assert_eq!(entry.key, "amenity");
/// assert_eq!(entry.value, "restaurant");
///
/// let any: WhitelistEntry = "tourism".parse()?;
/// assert!(any.matches_any_value());
/// # Ok::<(), poi_osm_core::WhitelistEntryError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WhitelistEntry {
    /// Tag key, e.g. `amenity`.
    pub key: String,
    /// Tag value; empty means "any value".
    #[serde(default)]
    pub value: String,
}

/// Errors returned when parsing a [`WhitelistEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WhitelistEntryError {
    /// Nothing but whitespace preceded the first `=`.
    #[error("whitelist entry {raw:?} has an empty key")]
    EmptyKey {
        /// The text that failed to parse.
        raw: String,
    },
}

impl WhitelistEntry {
    /// An entry that accepts any value for `key`.
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: String::new(),
        }
    }

    /// An entry that accepts only `key=value`.
    #[must_use]
    pub fn key_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Whether the entry ignores the tag value.
    #[must_use]
    pub const fn matches_any_value(&self) -> bool {
        self.value.is_empty()
    }

    /// Whether `tags` carries this entry's key with an acceptable value.
    #[must_use]
    pub fn matches(&self, tags: &Tags) -> bool {
        tags.get(&self.key)
            .is_some_and(|value| self.matches_any_value() || *value == self.value)
    }
}

impl FromStr for WhitelistEntry {
    type Err = WhitelistEntryError;

    /// Parse `key` or `key=value`, splitting on the first `=` and trimming
    /// whitespace around both halves.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (raw_key, raw_value) = raw.split_once('=').unwrap_or((raw, ""));
        let key = raw_key.trim();
        if key.is_empty() {
            return Err(WhitelistEntryError::EmptyKey {
                raw: raw.to_owned(),
            });
        }
        Ok(Self::key_value(key, raw_value.trim()))
    }
}

/// An ordered collection of [`WhitelistEntry`] values with OR semantics.
///
/// # Examples
/// ```
/// use poi_osm_core::{Tags, Whitelist, WhitelistEntry};
///
/// let whitelist = Whitelist::from(vec![
///     WhitelistEntry::key_value("amenity", "cafe"),
///     WhitelistEntry::key("tourism"),
/// ]);
/// let tags = Tags::from([("tourism".to_owned(), "museum".to_owned())]);
/// assert!(whitelist.accepts(&tags));
/// assert!(Whitelist::default().accepts(&Tags::new()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Whitelist(Vec<WhitelistEntry>);

impl Whitelist {
    /// Create an empty whitelist, which accepts everything.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Whether the whitelist has no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Entries in insertion order.
    #[must_use]
    pub const fn entries(&self) -> &[WhitelistEntry] {
        self.0.as_slice()
    }

    /// Iterate over the entries in insertion order.
    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, WhitelistEntry> {
        self.0.iter()
    }

    /// Append an entry.
    pub fn push(&mut self, entry: WhitelistEntry) {
        self.0.push(entry);
    }

    /// Client-side acceptance predicate.
    ///
    /// True when the whitelist is empty or any entry matches `tags`.
    #[must_use]
    pub fn accepts(&self, tags: &Tags) -> bool {
        self.is_empty() || self.0.iter().any(|entry| entry.matches(tags))
    }
}

impl From<Vec<WhitelistEntry>> for Whitelist {
    fn from(entries: Vec<WhitelistEntry>) -> Self {
        Self(entries)
    }
}

impl FromIterator<WhitelistEntry> for Whitelist {
    fn from_iter<I: IntoIterator<Item = WhitelistEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Whitelist {
    type Item = &'a WhitelistEntry;
    type IntoIter = std::slice::Iter<'a, WhitelistEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
