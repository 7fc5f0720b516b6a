use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One line of dialogue and the story it belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    #[serde(default, deserialize_with = "null_as_default")]
    pub dialogue: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub story: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_favorite: bool,
}

/// Reads an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Row {
    pub fn new(dialogue: impl Into<String>, story: impl Into<String>) -> Self {
        Self {
            dialogue: dialogue.into(),
            story: story.into(),
            is_favorite: false,
        }
    }

    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }

    /// Trims surrounding whitespace from both text fields.
    pub fn trim(&mut self) {
        self.dialogue = self.dialogue.trim().to_string();
        self.story = self.story.trim().to_string();
    }

    /// A row is blank when both text fields are empty after trimming.
    /// Blank rows are never persisted.
    pub fn is_blank(&self) -> bool {
        self.dialogue.trim().is_empty() && self.story.trim().is_empty()
    }

    /// Case-insensitive substring match against dialogue or story.
    ///
    /// `needle` must already be lowercased.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.dialogue.to_lowercase().contains(needle)
            || self.story.to_lowercase().contains(needle)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heart = if self.is_favorite { "♥" } else { " " };
        write!(f, "{} {}", heart, self.dialogue)?;
        if !self.story.is_empty() {
            write!(f, "  ({})", self.story)?;
        }
        Ok(())
    }
}
