//! MCP resource definitions and handlers
//!
//! Exposes the note collection under the `notes://` scheme.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::error::Result;
use crate::mcp::types::{ReadResourceResult, Resource, ResourceContents};
use crate::notes::store::NoteStore;
use crate::notes::types::Note;

/// URI of the full-collection resource
pub const ALL_NOTES_URI: &str = "notes://get_all";

/// URI scheme prefix for single-note lookups
const NOTES_SCHEME: &str = "notes://";

/// A note as rendered in resource payloads
///
/// `create_date` is internal bookkeeping and stays out of the payload.
#[derive(Serialize)]
struct NoteView<'a> {
    title: &'a str,
    content: &'a str,
    tags: &'a [String],
    due_date: Option<&'a str>,
}

impl<'a> From<&'a Note> for NoteView<'a> {
    fn from(note: &'a Note) -> Self {
        Self {
            title: &note.title,
            content: &note.content,
            tags: &note.tags,
            due_date: note.due_date.as_deref(),
        }
    }
}

/// Resource handler
pub struct ResourceHandler {
    store: Arc<NoteStore>,
}

impl ResourceHandler {
    /// Create a new resource handler
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self { store }
    }

    /// List all available resources
    pub fn list_resources(&self) -> Vec<Resource> {
        vec![Resource {
            uri: ALL_NOTES_URI.to_string(),
            name: "All notes".to_string(),
            description: Some("Retrieve all notes from the database as JSON".to_string()),
            mime_type: Some("application/json".to_string()),
        }]
    }

    /// Read a resource by URI
    ///
    /// `notes://get_all` yields the whole collection; any other
    /// `notes://{title}` URI yields the matching note or a not-found
    /// payload. URIs outside the scheme are rejected by the caller.
    pub fn read_resource(&self, uri: &str) -> Result<ReadResourceResult> {
        let text = if uri == ALL_NOTES_URI {
            let notes = self.store.list()?;
            let views: Vec<NoteView<'_>> = notes.iter().map(NoteView::from).collect();
            serde_json::to_string(&views)?
        } else {
            let title = uri.strip_prefix(NOTES_SCHEME).unwrap_or(uri);
            match self.store.fetch_by_title(title)? {
                Some(note) => serde_json::to_string(&NoteView::from(&note))?,
                None => json!({"error": "Note not found"}).to_string(),
            }
        };

        Ok(ReadResourceResult {
            contents: vec![ResourceContents {
                uri: uri.to_string(),
                mime_type: Some("application/json".to_string()),
                text,
            }],
        })
    }

    /// Whether a URI belongs to this handler's scheme
    pub fn handles(&self, uri: &str) -> bool {
        uri.starts_with(NOTES_SCHEME)
    }
}
