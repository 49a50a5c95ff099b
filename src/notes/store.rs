//! SQLite-backed note store
//!
//! Plain parameterized SQL against a single `notes` table. The connection
//! sits behind a `Mutex` because `rusqlite::Connection` is not `Sync` and
//! the store is shared via `Arc` with the async protocol layer.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use crate::error::{NotesMcpError, Result, StoreError};
use crate::notes::types::{join_tags, split_tags, NewNote, Note};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '',
    due_date TEXT,
    create_date TEXT NOT NULL
)";

/// Note store over a single SQLite database
pub struct NoteStore {
    conn: Mutex<Connection>,
}

impl NoteStore {
    /// Open (or create) the database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            NotesMcpError::Store(StoreError::OpenFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database, used by tests
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::from)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(SCHEMA, []).map_err(StoreError::from)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert a new note, stamping `create_date` with the current time
    pub fn insert(&self, note: &NewNote) -> Result<()> {
        let create_date = chrono::Local::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO notes (title, content, tags, due_date, create_date) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                note.title,
                note.content,
                join_tags(&note.tags),
                note.due_date,
                create_date,
            ],
        )
        .map_err(StoreError::from)?;
        Ok(())
    }

    /// All notes, in insertion order
    pub fn list(&self) -> Result<Vec<Note>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT title, content, tags, due_date, create_date FROM notes ORDER BY id")
            .map_err(StoreError::from)?;
        let rows = stmt
            .query_map([], row_to_note)
            .map_err(StoreError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)?;
        Ok(rows)
    }

    /// The first note with an exactly matching title, if any
    pub fn fetch_by_title(&self, title: &str) -> Result<Option<Note>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT title, content, tags, due_date, create_date FROM notes \
                 WHERE title = ?1 ORDER BY id LIMIT 1",
            )
            .map_err(StoreError::from)?;
        let mut rows = stmt
            .query_map([title], row_to_note)
            .map_err(StoreError::from)?;
        match rows.next() {
            Some(row) => Ok(Some(row.map_err(StoreError::from)?)),
            None => Ok(None),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| NotesMcpError::Store(StoreError::LockPoisoned))
    }
}

fn row_to_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
    let tags: String = row.get(2)?;
    Ok(Note {
        title: row.get(0)?,
        content: row.get(1)?,
        tags: split_tags(&tags),
        due_date: row.get(3)?,
        create_date: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_note() -> NewNote {
        NewNote {
            title: "Buy miter saw".to_string(),
            content: "miter saw to make angle cuts".to_string(),
            tags: vec![
                "wood_work".to_string(),
                "learning".to_string(),
                "hobby".to_string(),
            ],
            due_date: Some("2025-09-09".to_string()),
        }
    }

    #[test]
    fn test_insert_and_fetch_by_title() {
        let store = NoteStore::in_memory().unwrap();
        store.insert(&sample_note()).unwrap();

        let note = store.fetch_by_title("Buy miter saw").unwrap().unwrap();
        assert_eq!(note.title, "Buy miter saw");
        assert_eq!(note.tags, vec!["wood_work", "learning", "hobby"]);
        assert_eq!(note.due_date.as_deref(), Some("2025-09-09"));
        assert!(!note.create_date.is_empty());
    }

    #[test]
    fn test_fetch_missing_title() {
        let store = NoteStore::in_memory().unwrap();
        assert!(store.fetch_by_title("nope").unwrap().is_none());
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let store = NoteStore::in_memory().unwrap();
        for title in ["first", "second", "third"] {
            store
                .insert(&NewNote {
                    title: title.to_string(),
                    content: String::new(),
                    tags: Vec::new(),
                    due_date: None,
                })
                .unwrap();
        }

        let notes = store.list().unwrap();
        let titles: Vec<_> = notes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_tags_round_trip() {
        let store = NoteStore::in_memory().unwrap();
        store
            .insert(&NewNote {
                title: "untagged".to_string(),
                content: "c".to_string(),
                tags: Vec::new(),
                due_date: None,
            })
            .unwrap();

        let note = store.fetch_by_title("untagged").unwrap().unwrap();
        assert!(note.tags.is_empty());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");
        {
            let store = NoteStore::open(&path).unwrap();
            store.insert(&sample_note()).unwrap();
        }
        // Reopen and verify persistence
        let store = NoteStore::open(&path).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
