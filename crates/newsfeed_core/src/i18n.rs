//! User-facing message lookup.
//!
//! Core never formats locale-specific text itself; messages are keyed by
//! their English source string and resolved through a [`MessageCatalog`].

use std::collections::HashMap;

pub trait MessageCatalog {
    /// Returns the localized form of `msgid`, or `msgid` itself when unknown.
    fn translate(&self, msgid: &str) -> String;
}

/// Returns every message untranslated.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCatalog;

impl MessageCatalog for PassthroughCatalog {
    fn translate(&self, msgid: &str) -> String {
        msgid.to_string()
    }
}

/// In-memory catalog for one locale.
#[derive(Debug, Clone, Default)]
pub struct MapCatalog {
    entries: HashMap<String, String>,
}

impl MapCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, msgid: impl Into<String>, translated: impl Into<String>) {
        self.entries.insert(msgid.into(), translated.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapCatalog {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(msgid, translated)| (msgid.into(), translated.into()))
                .collect(),
        }
    }
}

impl MessageCatalog for MapCatalog {
    fn translate(&self, msgid: &str) -> String {
        self.entries
            .get(msgid)
            .cloned()
            .unwrap_or_else(|| msgid.to_string())
    }
}

impl<C: MessageCatalog + ?Sized> MessageCatalog for &C {
    fn translate(&self, msgid: &str) -> String {
        (**self).translate(msgid)
    }
}
