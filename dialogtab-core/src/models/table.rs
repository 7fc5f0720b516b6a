use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use super::error::ModelError;
use super::row::Row;

/// One table: its rows plus free-form labels.
///
/// Deserializes from the current `{rows, tags}` object, from objects that
/// still carry rows under `data`, and from a bare array of rows. The last
/// two are upgraded to the current shape with no tags; written output
/// always uses `{rows, tags}`. Rows that cannot be read are dropped with a
/// warning instead of failing the whole record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "StoredRecord")]
pub struct TableRecord {
    pub rows: Vec<Row>,
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRecord {
    Legacy(Vec<Value>),
    Current {
        #[serde(default, alias = "data")]
        rows: Vec<Value>,
        #[serde(default)]
        tags: Vec<String>,
    },
}

impl From<StoredRecord> for TableRecord {
    fn from(stored: StoredRecord) -> Self {
        match stored {
            StoredRecord::Legacy(rows) => Self {
                rows: decode_rows(rows),
                tags: Vec::new(),
            },
            StoredRecord::Current { rows, tags } => Self {
                rows: decode_rows(rows),
                tags,
            },
        }
    }
}

fn decode_rows(values: Vec<Value>) -> Vec<Row> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(row) => Some(row),
            Err(e) => {
                tracing::warn!("Skipping unreadable row: {}", e);
                None
            }
        })
        .collect()
}

/// Row query used by `TableRecord::filter_rows`.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    pub search: Option<String>,
    pub favorites_only: bool,
}

impl TableRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = dedup_tags(tags);
        self
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    /// Appends a row and returns its index.
    pub fn push_row(&mut self, row: Row) -> usize {
        self.rows.push(row);
        self.rows.len() - 1
    }

    pub fn row_mut(&mut self, index: usize) -> Result<&mut Row, ModelError> {
        let len = self.rows.len();
        self.rows
            .get_mut(index)
            .ok_or(ModelError::RowOutOfRange { index, len })
    }

    /// Flips the favorite flag and returns the new value.
    pub fn toggle_favorite(&mut self, index: usize) -> Result<bool, ModelError> {
        let row = self.row_mut(index)?;
        row.is_favorite = !row.is_favorite;
        Ok(row.is_favorite)
    }

    /// Removes every row whose index is in `indices`.
    ///
    /// All indices are checked before anything is removed, so a bad index
    /// leaves the table untouched.
    pub fn remove_rows(&mut self, indices: &BTreeSet<usize>) -> Result<usize, ModelError> {
        let len = self.rows.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(ModelError::RowOutOfRange { index, len });
        }

        let mut position = 0;
        self.rows.retain(|_| {
            let keep = !indices.contains(&position);
            position += 1;
            keep
        });
        Ok(len - self.rows.len())
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = dedup_tags(tags);
    }

    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.is_empty() || tags.iter().any(|t| self.tags.contains(t))
    }

    /// Trims row text and drops blank rows, returning how many were
    /// removed.
    pub fn prune_blank_rows(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.iter_mut().for_each(Row::trim);
        self.rows.retain(|row| !row.is_blank());
        before - self.rows.len()
    }

    /// Rows matching the filter, paired with their position in the table.
    pub fn filter_rows(&self, filter: &RowFilter) -> Vec<(usize, &Row)> {
        let needle = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();

        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !filter.favorites_only || row.is_favorite)
            .filter(|(_, row)| row.matches_lowercase(&needle))
            .collect()
    }
}

/// Splits a comma separated tag list, trimming each part and dropping
/// empties and repeats.
pub fn parse_tags(input: &str) -> Vec<String> {
    dedup_tags(
        input
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
    )
}

/// Parses table creation input of the form `name, tag, tag`.
pub fn parse_table_input(input: &str) -> Result<(String, Vec<String>), ModelError> {
    let (name, rest) = match input.split_once(',') {
        Some((name, rest)) => (name.trim(), rest),
        None => (input.trim(), ""),
    };

    if name.is_empty() {
        return Err(ModelError::EmptyTableName);
    }

    Ok((name.to_string(), parse_tags(rest)))
}

fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tags.into_iter()
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TableRecord {
        TableRecord::new().with_rows(vec![
            Row::new("Hello", "Intro"),
            Row::new("Farewell", "Ending").favorite(true),
            Row::new("Who goes there?", "Night watch"),
        ])
    }

    #[test]
    fn test_serializes_current_shape() {
        let record = TableRecord::new()
            .with_rows(vec![Row::new("Hello", "Intro")])
            .with_tags(vec!["protagonist".to_string()]);
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"rows":[{"dialogue":"Hello","story":"Intro","isFavorite":false}],"tags":["protagonist"]}"#
        );
    }

    #[test]
    fn test_bare_array_is_upgraded() {
        let json = r#"[{"dialogue":"Hi","story":"","isFavorite":true}]"#;
        let record: TableRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record,
            TableRecord {
                rows: vec![Row::new("Hi", "").favorite(true)],
                tags: vec![],
            }
        );
    }

    #[test]
    fn test_upgrade_is_idempotent() {
        let json = r#"[{"dialogue":"Hi","story":"S","isFavorite":false}]"#;
        let once: TableRecord = serde_json::from_str(json).unwrap();
        let again: TableRecord =
            serde_json::from_str(&serde_json::to_string(&once).unwrap()).unwrap();
        assert_eq!(once, again);
    }

    #[test]
    fn test_data_key_is_read_as_rows() {
        let json = r#"{"data":[{"dialogue":"Hi","story":"S","isFavorite":false}],"tags":["a"]}"#;
        let record: TableRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.rows, vec![Row::new("Hi", "S")]);
        assert_eq!(record.tags, vec!["a".to_string()]);

        let out = serde_json::to_value(&record).unwrap();
        assert!(out.get("rows").is_some());
        assert!(out.get("data").is_none());
    }

    #[test]
    fn test_empty_object_is_empty_record() {
        let record: TableRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record, TableRecord::new());
    }

    #[test]
    fn test_unreadable_rows_are_skipped() {
        let json = r#"{"rows":[
            {"dialogue":"Hi","story":"S","isFavorite":false},
            {"dialogue":null,"story":"Kept","isFavorite":true},
            {"dialogue":7,"story":"Gone"},
            "not a row"
        ],"tags":["a"]}"#;
        let record: TableRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.rows,
            vec![Row::new("Hi", "S"), Row::new("", "Kept").favorite(true)]
        );
        assert_eq!(record.tags, vec!["a".to_string()]);

        let legacy: TableRecord = serde_json::from_str(r#"[5, {"dialogue":"Hi"}]"#).unwrap();
        assert_eq!(legacy.rows, vec![Row::new("Hi", "")]);
    }

    #[test]
    fn test_scalar_is_rejected() {
        assert!(serde_json::from_str::<TableRecord>("42").is_err());
    }

    #[test]
    fn test_toggle_favorite() {
        let mut record = sample();
        assert!(record.toggle_favorite(0).unwrap());
        assert!(!record.toggle_favorite(0).unwrap());
        assert!(matches!(
            record.toggle_favorite(9),
            Err(ModelError::RowOutOfRange { index: 9, len: 3 })
        ));
    }

    #[test]
    fn test_remove_rows() {
        let mut record = sample();
        let removed = record.remove_rows(&BTreeSet::from([0, 2])).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(record.rows, vec![Row::new("Farewell", "Ending").favorite(true)]);
    }

    #[test]
    fn test_remove_rows_bad_index_changes_nothing() {
        let mut record = sample();
        let result = record.remove_rows(&BTreeSet::from([1, 5]));
        assert!(result.is_err());
        assert_eq!(record.rows.len(), 3);
    }

    #[test]
    fn test_prune_blank_rows_keeps_favorite_flag() {
        let mut record = TableRecord::new().with_rows(vec![
            Row::new("", ""),
            Row::new("", "Intro").favorite(true),
            Row::new("Hello", ""),
        ]);
        assert_eq!(record.prune_blank_rows(), 1);
        assert_eq!(
            record.rows,
            vec![Row::new("", "Intro").favorite(true), Row::new("Hello", "")]
        );
    }

    #[test]
    fn test_prune_blank_rows_trims_text() {
        let mut record = TableRecord::new().with_rows(vec![
            Row::new(" Hello ", "\tIntro "),
            Row::new("   ", "\n"),
        ]);
        assert_eq!(record.prune_blank_rows(), 1);
        assert_eq!(record.rows, vec![Row::new("Hello", "Intro")]);
    }

    #[test]
    fn test_filter_rows() {
        let record = sample();

        let all = record.filter_rows(&RowFilter::default());
        assert_eq!(all.len(), 3);

        let search = record.filter_rows(&RowFilter {
            search: Some("  NIGHT ".to_string()),
            favorites_only: false,
        });
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].0, 2);

        let favorites = record.filter_rows(&RowFilter {
            search: None,
            favorites_only: true,
        });
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].0, 1);

        let both = record.filter_rows(&RowFilter {
            search: Some("hello".to_string()),
            favorites_only: true,
        });
        assert!(both.is_empty());
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(
            parse_tags(" hero, villain ,, hero,side "),
            vec!["hero", "villain", "side"]
        );
        assert!(parse_tags("").is_empty());
        assert!(parse_tags(" , ,").is_empty());
    }

    #[test]
    fn test_parse_table_input() {
        let (name, tags) = parse_table_input(" Hero , protagonist, lead").unwrap();
        assert_eq!(name, "Hero");
        assert_eq!(tags, vec!["protagonist", "lead"]);

        let (name, tags) = parse_table_input("Villain").unwrap();
        assert_eq!(name, "Villain");
        assert!(tags.is_empty());

        assert!(matches!(
            parse_table_input(" , tag"),
            Err(ModelError::EmptyTableName)
        ));
    }

    #[test]
    fn test_has_any_tag() {
        let record = TableRecord::new().with_tags(vec!["a".into(), "b".into()]);
        assert!(record.has_any_tag(&[]));
        assert!(record.has_any_tag(&["b".to_string(), "z".to_string()]));
        assert!(!record.has_any_tag(&["z".to_string()]));
    }
}
