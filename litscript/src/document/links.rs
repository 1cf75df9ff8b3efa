use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::Deserialize;

/// Target of a Markdown reference-style link: `[key]: url "title"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDefinition {
    pub url: String,
    pub title: Option<String>,
}

/// Which definition survives when two documentation comments define the same key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkMergePolicy {
    /// A later comment's definition replaces an earlier one.
    #[default]
    LastWins,
    /// The first definition in the file is kept.
    FirstWins,
}

/// Link key → definition. Keys are stored normalized, so lookups match
/// labels the way CommonMark does: case-insensitively, with inner whitespace collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    entries: BTreeMap<String, LinkDefinition>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition, replacing any existing one for `key`.
    pub fn insert(&mut self, key: &str, definition: LinkDefinition) {
        self.entries.insert(normalize_key(key), definition);
    }

    pub fn get(&self, key: &str) -> Option<&LinkDefinition> {
        self.entries.get(&normalize_key(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LinkDefinition)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge tables given in the order they were produced.
    pub fn merge<I>(tables: I, policy: LinkMergePolicy) -> LinkTable
    where
        I: IntoIterator<Item = LinkTable>,
    {
        let mut merged = LinkTable::new();
        for table in tables {
            for (key, definition) in table.entries {
                match (merged.entries.entry(key), policy) {
                    (Entry::Vacant(slot), _) => {
                        slot.insert(definition);
                    }
                    (Entry::Occupied(mut slot), LinkMergePolicy::LastWins) => {
                        log::debug!("link [{}] redefined, keeping the later definition", slot.key());
                        slot.insert(definition);
                    }
                    (Entry::Occupied(slot), LinkMergePolicy::FirstWins) => {
                        log::debug!("link [{}] redefined, keeping the first definition", slot.key());
                    }
                }
            }
        }
        merged
    }
}

impl FromIterator<(String, LinkDefinition)> for LinkTable {
    fn from_iter<T: IntoIterator<Item = (String, LinkDefinition)>>(iter: T) -> Self {
        let mut table = LinkTable::new();
        for (key, definition) in iter {
            table.insert(&key, definition);
        }
        table
    }
}

/// Normalize a link label: whitespace runs collapse to one space, case folds to lower.
pub fn normalize_key(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(url: &str) -> LinkDefinition {
        LinkDefinition {
            url: url.to_string(),
            title: None,
        }
    }

    #[test]
    fn keys_match_case_and_whitespace_insensitively() {
        let mut table = LinkTable::new();
        table.insert("Foo  Bar", def("http://a"));
        assert_eq!(table.get("foo bar").map(|d| d.url.as_str()), Some("http://a"));
        assert!(table.contains("FOO\tBAR"));
        assert_eq!(table.iter().next().map(|(k, _)| k), Some("foo bar"));
    }

    #[test]
    fn differently_cased_labels_go_through_the_merge_policy() {
        let first: LinkTable = [("Docs".to_string(), def("http://a"))].into_iter().collect();
        let second: LinkTable = [("docs".to_string(), def("http://b"))].into_iter().collect();

        let last = LinkTable::merge([first.clone(), second.clone()], LinkMergePolicy::LastWins);
        assert_eq!(last.len(), 1);
        assert_eq!(last.get("DOCS").map(|d| d.url.as_str()), Some("http://b"));

        let kept = LinkTable::merge([first, second], LinkMergePolicy::FirstWins);
        assert_eq!(kept.get("docs").map(|d| d.url.as_str()), Some("http://a"));
    }
}
