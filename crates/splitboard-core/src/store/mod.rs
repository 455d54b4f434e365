//! Hybrid state controller - single source of truth for app-level state.
//!
//! Routes every state-changing operation to exactly one backend (remote
//! worker or local snapshot store) and presents a backend-agnostic view
//! of the current project state. Remote writes are not applied
//! optimistically; the cache is updated when the realtime echo arrives.

pub mod local;

pub use local::LocalStore;

use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;

use anyhow::Result;

use crate::config::CoreConfig;
use crate::constants::{DEFAULT_PROJECT_COLOR, DEFAULT_PROJECT_ID, DEFAULT_PROJECT_NAME};
use crate::models::{
    timestamp_id, AIState, ChatMessage, Message, Project, ProjectRow, ProjectState,
};
use crate::remote::{ChangeEvent, RemoteCommand, RemoteHandle, RemoteWorker};

pub struct HybridStore {
    connected: bool,
    remote: Option<RemoteHandle>,
    change_rx: Option<Receiver<ChangeEvent>>,
    worker_handle: Option<JoinHandle<()>>,
    local: LocalStore,

    projects: Vec<Project>,
    data: HashMap<String, ProjectState>,
    active_project_id: String,
    empty_state: ProjectState,
}

impl HybridStore {
    pub fn new(config: CoreConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let local = LocalStore::new(config.data_dir.join("splitboard.db"))?;

        let mut store = Self {
            connected: false,
            remote: None,
            change_rx: None,
            worker_handle: None,
            local,
            projects: Vec::new(),
            data: HashMap::new(),
            active_project_id: DEFAULT_PROJECT_ID.to_string(),
            empty_state: ProjectState::default(),
        };

        // Connected means the worker constructed, nothing more; an
        // unreachable backend fails per-operation instead of falling back.
        if let Some(remote_config) = &config.remote {
            match RemoteWorker::spawn(remote_config) {
                Ok((handle, change_rx, worker_handle)) => {
                    store.connected = true;
                    store.remote = Some(handle);
                    store.change_rx = Some(change_rx);
                    store.worker_handle = Some(worker_handle);
                }
                Err(err) => {
                    tracing::warn!(%err, "remote backend unavailable, using local fallback");
                }
            }
        }

        if store.connected {
            store.send(RemoteCommand::FetchProjects);
        } else {
            store.load_local();
        }

        Ok(store)
    }

    fn load_local(&mut self) {
        match self.local.load_snapshot() {
            Ok(Some((projects, data))) => {
                self.projects = projects;
                self.data = data;
            }
            Ok(None) => {
                let project = Project {
                    id: DEFAULT_PROJECT_ID.to_string(),
                    name: DEFAULT_PROJECT_NAME.to_string(),
                    color: DEFAULT_PROJECT_COLOR.to_string(),
                };
                self.projects = vec![project];
                self.data
                    .insert(DEFAULT_PROJECT_ID.to_string(), ProjectState::new_now());
            }
            Err(err) => {
                tracing::warn!(%err, "local snapshot unreadable, starting empty");
                self.projects = Vec::new();
            }
        }
        if let Some(first) = self.projects.first() {
            self.active_project_id = first.id.clone();
        }
    }

    fn send(&self, command: RemoteCommand) {
        if let Some(remote) = &self.remote {
            if remote.send(command).is_err() {
                tracing::warn!("remote worker is gone");
            }
        }
    }

    fn persist(&self) {
        // Local path only; the remote backend is its own persistence.
        if self.connected {
            return;
        }
        if let Err(err) = self.local.save_snapshot(&self.projects, &self.data) {
            tracing::warn!(%err, "snapshot write failed");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn active_project_id(&self) -> &str {
        &self.active_project_id
    }

    pub fn current_state(&self) -> &ProjectState {
        self.data
            .get(&self.active_project_id)
            .unwrap_or(&self.empty_state)
    }

    pub fn state_of(&self, project_id: &str) -> Option<&ProjectState> {
        self.data.get(project_id)
    }

    /// Switch the active project, lazily fetching its state on the remote
    /// path the first time it is selected.
    pub fn select_project(&mut self, project_id: &str) {
        self.active_project_id = project_id.to_string();
        if self.connected {
            if !self.data.contains_key(project_id) {
                self.send(RemoteCommand::FetchProjectState {
                    project_id: project_id.to_string(),
                });
            }
        } else if let Some(state) = self.data.get_mut(project_id) {
            state.last_active_at = chrono::Utc::now().timestamp_millis();
            self.persist();
        }
    }

    /// Mint a timestamp id and create the project on the active backend.
    /// Remote: the insert round-trips through the realtime echo before the
    /// project shows up in the cache. Local: synchronous.
    pub fn create_project(&mut self, name: &str, color: &str) -> String {
        let id = timestamp_id();
        if self.connected {
            self.send(RemoteCommand::InsertProject {
                row: ProjectRow {
                    id: id.clone(),
                    name: name.to_string(),
                    color: color.to_string(),
                    ai_state: Some(AIState::default()),
                },
            });
        } else {
            self.projects.push(Project {
                id: id.clone(),
                name: name.to_string(),
                color: color.to_string(),
            });
            self.data.insert(id.clone(), ProjectState::new_now());
            self.persist();
        }
        self.active_project_id = id.clone();
        id
    }

    pub fn rename_project(&mut self, project_id: &str, new_name: &str) {
        if self.connected {
            self.send(RemoteCommand::RenameProject {
                project_id: project_id.to_string(),
                name: new_name.to_string(),
            });
        } else {
            if let Some(project) = self.projects.iter_mut().find(|p| p.id == project_id) {
                project.name = new_name.to_string();
            }
            self.persist();
        }
    }

    /// Remote path inserts only - the sender sees their own message when
    /// the echo arrives. Local path appends synchronously.
    pub fn append_message(&mut self, project_id: &str, message: Message) {
        if self.connected {
            self.send(RemoteCommand::InsertMessage {
                project_id: project_id.to_string(),
                message,
            });
        } else {
            self.data
                .entry(project_id.to_string())
                .or_default()
                .messages
                .push(message);
            self.persist();
        }
    }

    /// Increment one emoji's count on a message in the active project,
    /// writing back the full reactions map. There is no decrement path.
    pub fn react_to_message(&mut self, message_id: &str, emoji: &str) -> bool {
        if self.connected {
            let Some(message) = self
                .data
                .get(&self.active_project_id)
                .and_then(|s| s.messages.iter().find(|m| m.id == message_id))
            else {
                return false;
            };
            let mut reactions = message.reactions.clone();
            *reactions.entry(emoji.to_string()).or_insert(0) += 1;
            self.send(RemoteCommand::UpdateReactions {
                message_id: message_id.to_string(),
                reactions,
            });
            true
        } else {
            let Some(message) = self
                .data
                .get_mut(&self.active_project_id)
                .and_then(|s| s.messages.iter_mut().find(|m| m.id == message_id))
            else {
                return false;
            };
            *message.reactions.entry(emoji.to_string()).or_insert(0) += 1;
            self.persist();
            true
        }
    }

    pub fn delete_message(&mut self, message_id: &str) {
        if self.connected {
            self.send(RemoteCommand::DeleteMessage {
                message_id: message_id.to_string(),
            });
        } else {
            if let Some(state) = self.data.get_mut(&self.active_project_id) {
                state.messages.retain(|m| m.id != message_id);
            }
            self.persist();
        }
    }

    pub fn append_chat_message(&mut self, project_id: &str, message: ChatMessage) {
        if self.connected {
            self.send(RemoteCommand::InsertChatMessage {
                project_id: project_id.to_string(),
                message,
            });
        } else {
            self.data
                .entry(project_id.to_string())
                .or_default()
                .chat_messages
                .push(message);
            self.persist();
        }
    }

    /// Whole-object overwrite; last writer wins across clients.
    pub fn set_ai_state(&mut self, project_id: &str, state: AIState) {
        if self.connected {
            self.send(RemoteCommand::UpdateAiState {
                project_id: project_id.to_string(),
                state,
            });
        } else {
            self.data.entry(project_id.to_string()).or_default().ai_state = state;
            self.persist();
        }
    }

    /// Drain pending change events from the worker and merge each into
    /// the cache. Returns how many were applied.
    pub fn poll_changes(&mut self) -> usize {
        let Some(change_rx) = self.change_rx.take() else {
            return 0;
        };
        let mut applied = 0;
        while let Ok(event) = change_rx.try_recv() {
            self.handle_change(event);
            applied += 1;
        }
        self.change_rx = Some(change_rx);
        applied
    }

    /// Merge one remote change event into the per-project cache.
    pub fn handle_change(&mut self, event: ChangeEvent) {
        match event {
            ChangeEvent::ProjectInserted(project) => {
                if !self.projects.iter().any(|p| p.id == project.id) {
                    self.projects.push(project);
                }
            }
            ChangeEvent::ProjectUpdated { project, ai_state } => {
                if let Some(existing) = self.projects.iter_mut().find(|p| p.id == project.id) {
                    existing.name = project.name.clone();
                    existing.color = project.color.clone();
                }
                if let Some(state) = ai_state {
                    self.data.entry(project.id).or_default().ai_state = state;
                }
            }
            ChangeEvent::MessageInserted { project_id, message } => {
                self.data.entry(project_id).or_default().messages.push(message);
            }
            ChangeEvent::ReactionsUpdated {
                project_id,
                message_id,
                reactions,
            } => {
                if let Some(message) = self
                    .data
                    .get_mut(&project_id)
                    .and_then(|s| s.messages.iter_mut().find(|m| m.id == message_id))
                {
                    message.reactions = reactions;
                }
            }
            ChangeEvent::MessageDeleted { message_id } => {
                // The delete event does not say which project the row
                // belonged to, so every cached list gets scanned.
                tracing::info!(%message_id, "applying delete across cached projects");
                for state in self.data.values_mut() {
                    state.messages.retain(|m| m.id != message_id);
                }
            }
            ChangeEvent::ChatMessageInserted { project_id, message } => {
                self.data
                    .entry(project_id)
                    .or_default()
                    .chat_messages
                    .push(message);
            }
            ChangeEvent::ProjectsLoaded { projects } => {
                self.projects = projects.iter().map(ProjectRow::project).collect();
                for row in projects {
                    if let Some(state) = row.ai_state {
                        self.data.entry(row.id).or_default().ai_state = state;
                    }
                }
                let active_known = self.projects.iter().any(|p| p.id == self.active_project_id);
                if !active_known {
                    if let Some(first_id) = self.projects.first().map(|p| p.id.clone()) {
                        self.select_project(&first_id);
                    }
                }
            }
            ChangeEvent::ProjectStateLoaded {
                project_id,
                messages,
                chat_messages,
            } => {
                let state = self.data.entry(project_id).or_default();
                state.messages = messages;
                state.chat_messages = chat_messages;
            }
        }
    }

    pub fn shutdown(&mut self) {
        self.send(RemoteCommand::Shutdown);
        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for HybridStore {
    fn drop(&mut self) {
        if let Some(remote) = &self.remote {
            let _ = remote.send(RemoteCommand::Shutdown);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteConfig;
    use crate::models::{ChatSender, Sender};

    fn message(id: &str, text: &str) -> Message {
        Message {
            id: id.to_string(),
            sender: Sender::Me,
            text: text.to_string(),
            timestamp: "10:00".to_string(),
            reply_to: None,
            reactions: Default::default(),
            node_id: None,
        }
    }

    fn local_store() -> (HybridStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = HybridStore::new(CoreConfig::local_only(dir.path())).unwrap();
        (store, dir)
    }

    /// Connected store whose backend is unreachable: commands fail on the
    /// worker side, so only echo events (fed by hand) touch the cache.
    fn connected_store() -> (HybridStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig {
            data_dir: dir.path().to_path_buf(),
            remote: Some(RemoteConfig {
                base_url: "http://127.0.0.1:1".to_string(),
                api_key: "test".to_string(),
            }),
        };
        let store = HybridStore::new(config).unwrap();
        assert!(store.is_connected());
        (store, dir)
    }

    #[test]
    fn test_local_seeds_default_project() {
        let (store, _dir) = local_store();
        assert!(!store.is_connected());
        assert_eq!(store.projects().len(), 1);
        assert_eq!(store.projects()[0].id, DEFAULT_PROJECT_ID);
        assert_eq!(store.active_project_id(), DEFAULT_PROJECT_ID);
    }

    #[test]
    fn test_local_create_project_is_immediately_queryable() {
        let (mut store, _dir) = local_store();
        let id = store.create_project("Project 2", "#ef4444");
        assert_eq!(store.active_project_id(), id);
        assert!(store.projects().iter().any(|p| p.id == id));
        assert!(store.state_of(&id).is_some());
    }

    #[test]
    fn test_local_append_react_delete_are_synchronous() {
        let (mut store, _dir) = local_store();
        let project_id = store.active_project_id().to_string();

        store.append_message(&project_id, message("m1", "hello"));
        assert_eq!(store.current_state().messages.len(), 1);

        assert!(store.react_to_message("m1", "👍"));
        assert!(store.react_to_message("m1", "👍"));
        assert_eq!(store.current_state().messages[0].reactions.get("👍"), Some(&2));

        store.delete_message("m1");
        assert!(store.current_state().messages.is_empty());
    }

    #[test]
    fn test_local_rename_project() {
        let (mut store, _dir) = local_store();
        let project_id = store.active_project_id().to_string();
        store.rename_project(&project_id, "Renamed");
        assert_eq!(store.projects()[0].name, "Renamed");
    }

    #[test]
    fn test_local_snapshot_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let project_id;
        {
            let mut store = HybridStore::new(CoreConfig::local_only(dir.path())).unwrap();
            project_id = store.create_project("Persisted", "#10b981");
            store.append_message(&project_id, message("m1", "saved"));
        }
        let store = HybridStore::new(CoreConfig::local_only(dir.path())).unwrap();
        assert!(store.projects().iter().any(|p| p.id == project_id));
        assert_eq!(store.state_of(&project_id).unwrap().messages[0].text, "saved");
    }

    #[test]
    fn test_remote_append_waits_for_echo() {
        let (mut store, _dir) = connected_store();
        store.select_project("p1");
        store.append_message("p1", message("m1", "sent"));
        // No optimistic append on the remote path
        assert!(store.current_state().messages.is_empty());

        store.handle_change(ChangeEvent::MessageInserted {
            project_id: "p1".to_string(),
            message: message("m1", "sent"),
        });
        assert_eq!(store.current_state().messages.len(), 1);
        store.shutdown();
    }

    #[test]
    fn test_remote_reaction_reads_cache_and_waits_for_echo() {
        let (mut store, _dir) = connected_store();
        store.select_project("p1");
        store.handle_change(ChangeEvent::MessageInserted {
            project_id: "p1".to_string(),
            message: message("m1", "sent"),
        });

        assert!(store.react_to_message("m1", "🔥"));
        // Cache untouched until the UPDATE echo lands
        assert!(store.current_state().messages[0].reactions.is_empty());

        store.handle_change(ChangeEvent::ReactionsUpdated {
            project_id: "p1".to_string(),
            message_id: "m1".to_string(),
            reactions: [("🔥".to_string(), 1)].into_iter().collect(),
        });
        assert_eq!(store.current_state().messages[0].reactions.get("🔥"), Some(&1));

        // Unknown message ids are refused
        assert!(!store.react_to_message("nope", "🔥"));
        store.shutdown();
    }

    #[test]
    fn test_delete_echo_scans_all_cached_projects() {
        let (mut store, _dir) = connected_store();
        for pid in ["p1", "p2", "p3"] {
            store.handle_change(ChangeEvent::MessageInserted {
                project_id: pid.to_string(),
                message: message(&format!("m-{pid}"), "text"),
            });
        }

        store.handle_change(ChangeEvent::MessageDeleted {
            message_id: "m-p2".to_string(),
        });
        assert_eq!(store.state_of("p1").unwrap().messages.len(), 1);
        assert!(store.state_of("p2").unwrap().messages.is_empty());
        assert_eq!(store.state_of("p3").unwrap().messages.len(), 1);
        store.shutdown();
    }

    #[test]
    fn test_project_insert_echo_deduplicates() {
        let (mut store, _dir) = connected_store();
        let project = Project {
            id: "p1".to_string(),
            name: "One".to_string(),
            color: "#fff".to_string(),
        };
        store.handle_change(ChangeEvent::ProjectInserted(project.clone()));
        store.handle_change(ChangeEvent::ProjectInserted(project));
        assert_eq!(store.projects().iter().filter(|p| p.id == "p1").count(), 1);
        store.shutdown();
    }

    #[test]
    fn test_project_update_echo_replaces_only_that_ai_state() {
        let (mut store, _dir) = connected_store();
        let mut other = AIState::default();
        other.suggestions = "untouched".to_string();
        store.handle_change(ChangeEvent::ProjectUpdated {
            project: Project {
                id: "p2".to_string(),
                name: "Two".to_string(),
                color: "#000".to_string(),
            },
            ai_state: Some(other),
        });

        let mut updated = AIState::default();
        updated.summary = vec!["fresh".to_string()];
        store.handle_change(ChangeEvent::ProjectUpdated {
            project: Project {
                id: "p1".to_string(),
                name: "One".to_string(),
                color: "#fff".to_string(),
            },
            ai_state: Some(updated),
        });

        assert_eq!(store.state_of("p1").unwrap().ai_state.summary, vec!["fresh"]);
        assert_eq!(store.state_of("p2").unwrap().ai_state.suggestions, "untouched");
        store.shutdown();
    }

    #[test]
    fn test_projects_loaded_selects_first_and_carries_ai_states() {
        let (mut store, _dir) = connected_store();
        let mut state = AIState::default();
        state.summary = vec!["loaded".to_string()];
        store.handle_change(ChangeEvent::ProjectsLoaded {
            projects: vec![ProjectRow {
                id: "p1".to_string(),
                name: "One".to_string(),
                color: "#fff".to_string(),
                ai_state: Some(state),
            }],
        });
        assert_eq!(store.active_project_id(), "p1");
        assert_eq!(store.current_state().ai_state.summary, vec!["loaded"]);
        store.shutdown();
    }

    #[test]
    fn test_project_state_loaded_replaces_wholesale() {
        let (mut store, _dir) = connected_store();
        store.handle_change(ChangeEvent::MessageInserted {
            project_id: "p1".to_string(),
            message: message("stale", "old"),
        });
        store.handle_change(ChangeEvent::ProjectStateLoaded {
            project_id: "p1".to_string(),
            messages: vec![message("m1", "fresh")],
            chat_messages: vec![ChatMessage {
                id: "c1".to_string(),
                sender: ChatSender::User,
                text: "hi".to_string(),
            }],
        });
        let state = store.state_of("p1").unwrap();
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].text, "fresh");
        assert_eq!(state.chat_messages.len(), 1);
        store.shutdown();
    }
}
