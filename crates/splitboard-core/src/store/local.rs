use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use crate::constants::{SNAPSHOT_PROJECTS_DATA_KEY, SNAPSHOT_PROJECTS_KEY};
use crate::models::{Project, ProjectState};

/// Key-value persistence for the offline path and for settings.
///
/// The whole project list and project-state map are written as two JSON
/// snapshots on every local state change; settings scalars each live
/// under their own key.
pub struct LocalStore {
    conn: Arc<Mutex<Connection>>,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Whole-snapshot write; no delta persistence.
    pub fn save_snapshot(
        &self,
        projects: &[Project],
        data: &HashMap<String, ProjectState>,
    ) -> Result<()> {
        self.set(SNAPSHOT_PROJECTS_KEY, &serde_json::to_string(projects)?)?;
        self.set(SNAPSHOT_PROJECTS_DATA_KEY, &serde_json::to_string(data)?)?;
        Ok(())
    }

    /// Deserialized once at startup. Returns None when nothing was ever
    /// saved.
    pub fn load_snapshot(&self) -> Result<Option<(Vec<Project>, HashMap<String, ProjectState>)>> {
        let Some(projects_json) = self.get(SNAPSHOT_PROJECTS_KEY)? else {
            return Ok(None);
        };
        let projects: Vec<Project> = serde_json::from_str(&projects_json)?;
        let data: HashMap<String, ProjectState> = match self.get(SNAPSHOT_PROJECTS_DATA_KEY)? {
            Some(json) => serde_json::from_str(&json)?,
            None => HashMap::new(),
        };
        Ok(Some((projects, data)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Message, Sender};

    #[test]
    fn test_kv_set_get_overwrite() {
        let store = LocalStore::in_memory().unwrap();
        assert!(store.get("k").unwrap().is_none());
        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn test_snapshot_round_trip_preserves_messages() {
        let store = LocalStore::in_memory().unwrap();
        let projects = vec![Project {
            id: "p1".to_string(),
            name: "One".to_string(),
            color: "#fff".to_string(),
        }];
        let mut state = ProjectState::default();
        state.messages.push(Message {
            id: "1".to_string(),
            sender: Sender::Partner,
            text: "hello".to_string(),
            timestamp: "10:30".to_string(),
            reply_to: Some("0".to_string()),
            reactions: [("🔥".to_string(), 3)].into_iter().collect(),
            node_id: Some("n1".to_string()),
        });
        let mut data = HashMap::new();
        data.insert("p1".to_string(), state.clone());

        store.save_snapshot(&projects, &data).unwrap();
        let (loaded_projects, loaded_data) = store.load_snapshot().unwrap().unwrap();
        assert_eq!(loaded_projects, projects);
        assert_eq!(loaded_data.get("p1"), Some(&state));
    }

    #[test]
    fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.db");
        {
            let store = LocalStore::new(&path).unwrap();
            store.save_snapshot(&[], &HashMap::new()).unwrap();
            store.set("gemini_language", "jp").unwrap();
        }
        let store = LocalStore::new(&path).unwrap();
        assert!(store.load_snapshot().unwrap().is_some());
        assert_eq!(store.get("gemini_language").unwrap().as_deref(), Some("jp"));
    }
}
