//! Note record types
//!
//! Tags are persisted as a single comma-joined string and split back on
//! read. The round trip is lossless as long as individual tags contain no
//! commas.

use serde::{Deserialize, Serialize};

/// A note as stored in the database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub due_date: Option<String>,
    pub create_date: String,
}

/// Fields for a note about to be created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Join tags into the stored comma-separated form
pub fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}

/// Split the stored comma-separated form back into tags
///
/// An empty column yields an empty list, not a list with one empty tag.
pub fn split_tags(stored: &str) -> Vec<String> {
    if stored.is_empty() {
        return Vec::new();
    }
    stored.split(',').map(|t| t.to_string()).collect()
}
