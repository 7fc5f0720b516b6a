use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::btree_map::{self, BTreeMap};
use std::collections::BTreeSet;

use super::table::TableRecord;

/// Every named table, keyed by case-sensitive name.
///
/// This is the unit exchanged with local storage and with the server.
/// Entries are decoded one by one; an entry that is not a readable record
/// is skipped with a warning and the rest still load.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TableCollection(BTreeMap<String, TableRecord>);

impl<'de> Deserialize<'de> for TableCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Map::<String, Value>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .filter_map(|(name, value)| match serde_json::from_value(value) {
                Ok(record) => Some((name, record)),
                Err(e) => {
                    tracing::warn!("Skipping unreadable table {:?}: {}", name, e);
                    None
                }
            })
            .collect())
    }
}

impl TableCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&TableRecord> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TableRecord> {
        self.0.get_mut(name)
    }

    /// Inserts or overwrites a table, returning the previous record.
    pub fn insert(&mut self, name: impl Into<String>, record: TableRecord) -> Option<TableRecord> {
        self.0.insert(name.into(), record)
    }

    pub fn remove(&mut self, name: &str) -> Option<TableRecord> {
        self.0.remove(name)
    }

    /// Names of tables carrying at least one of `tags`; all names when
    /// `tags` is empty.
    pub fn names_with_any_tag(&self, tags: &[String]) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, record)| record.has_any_tag(tags))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Every distinct tag used by any table, sorted.
    pub fn all_tags(&self) -> BTreeSet<&str> {
        self.0
            .values()
            .flat_map(|record| record.tags.iter().map(String::as_str))
            .collect()
    }

    /// Drops blank rows from every table, returning how many were removed.
    pub fn prune_blank_rows(&mut self) -> usize {
        self.0.values_mut().map(TableRecord::prune_blank_rows).sum()
    }
}

impl FromIterator<(String, TableRecord)> for TableCollection {
    fn from_iter<I: IntoIterator<Item = (String, TableRecord)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for TableCollection {
    type Item = (String, TableRecord);
    type IntoIter = btree_map::IntoIter<String, TableRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TableCollection {
    type Item = (&'a String, &'a TableRecord);
    type IntoIter = btree_map::Iter<'a, String, TableRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Row;

    fn tagged(tags: &[&str]) -> TableRecord {
        TableRecord::new().with_tags(tags.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn test_mixed_formats_upgrade() {
        let json = r#"{
            "Old": [{"dialogue":"Hi","story":"","isFavorite":false}],
            "New": {"rows":[],"tags":["x"]}
        }"#;
        let tables: TableCollection = serde_json::from_str(json).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(
            tables.get("Old"),
            Some(&TableRecord::new().with_rows(vec![Row::new("Hi", "")]))
        );
        assert_eq!(tables.get("New"), Some(&tagged(&["x"])));
    }

    #[test]
    fn test_unreadable_entries_are_skipped() {
        let json = r#"{
            "Good": {"rows":[{"dialogue":"Hi","story":"","isFavorite":false}],"tags":[]},
            "Odd": {"rows":[{"dialogue":null,"story":"S","isFavorite":false}]},
            "Junk": 5,
            "Text": "nope",
            "BadTags": {"rows":[],"tags":7}
        }"#;
        let tables: TableCollection = serde_json::from_str(json).unwrap();
        assert_eq!(tables.len(), 2);
        assert!(tables.contains("Good"));
        assert_eq!(
            tables.get("Odd"),
            Some(&TableRecord::new().with_rows(vec![Row::new("", "S")]))
        );
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(serde_json::from_str::<TableCollection>("[]").is_err());
        assert!(serde_json::from_str::<TableCollection>("null").is_err());
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut tables = TableCollection::new();
        tables.insert("hero", TableRecord::new());
        tables.insert("Hero", TableRecord::new());
        assert_eq!(tables.len(), 2);
        assert!(!tables.contains("HERO"));
    }

    #[test]
    fn test_names_with_any_tag() {
        let tables: TableCollection = [
            ("A".to_string(), tagged(&["hero"])),
            ("B".to_string(), tagged(&["villain"])),
            ("C".to_string(), tagged(&[])),
        ]
        .into_iter()
        .collect();

        assert_eq!(tables.names_with_any_tag(&[]), vec!["A", "B", "C"]);
        assert_eq!(
            tables.names_with_any_tag(&["hero".to_string(), "villain".to_string()]),
            vec!["A", "B"]
        );
        assert!(tables.names_with_any_tag(&["nobody".to_string()]).is_empty());
    }

    #[test]
    fn test_all_tags() {
        let tables: TableCollection = [
            ("A".to_string(), tagged(&["b", "a"])),
            ("B".to_string(), tagged(&["a", "c"])),
        ]
        .into_iter()
        .collect();
        let tags: Vec<&str> = tables.all_tags().into_iter().collect();
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_prune_blank_rows_across_tables() {
        let mut tables = TableCollection::new();
        tables.insert(
            "A",
            TableRecord::new().with_rows(vec![Row::new("", ""), Row::new("x", "")]),
        );
        tables.insert("B", TableRecord::new().with_rows(vec![Row::new(" ", "")]));
        assert_eq!(tables.prune_blank_rows(), 2);
        assert_eq!(tables.get("B").unwrap().rows.len(), 0);
    }
}
