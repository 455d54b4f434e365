//! Change-data-capture events from the hosted backend.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::constants::tables;
use crate::models::{ChatMessage, ChatMessageRow, Message, MessageRow, Project, ProjectRow, AIState};

/// Raw shape of one `data:` line on the change feed.
#[derive(Debug, Clone, Deserialize)]
pub struct WireChange {
    pub table: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub record: Option<Value>,
    #[serde(default)]
    pub old: Option<Value>,
}

/// Parsed change events plus fetch results, all delivered to the
/// controller over the same channel.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    ProjectInserted(Project),
    ProjectUpdated {
        project: Project,
        ai_state: Option<AIState>,
    },
    MessageInserted {
        project_id: String,
        message: Message,
    },
    ReactionsUpdated {
        project_id: String,
        message_id: String,
        reactions: BTreeMap<String, u32>,
    },
    /// Delete events carry only the row id, not the project id.
    MessageDeleted { message_id: String },
    ChatMessageInserted {
        project_id: String,
        message: ChatMessage,
    },
    ProjectsLoaded {
        projects: Vec<ProjectRow>,
    },
    ProjectStateLoaded {
        project_id: String,
        messages: Vec<Message>,
        chat_messages: Vec<ChatMessage>,
    },
}

/// Decode one change-feed payload. Unknown tables and event kinds are
/// dropped, not errors.
pub fn parse_change(payload: &str) -> Option<ChangeEvent> {
    let wire: WireChange = match serde_json::from_str(payload) {
        Ok(wire) => wire,
        Err(err) => {
            tracing::warn!(%err, "undecodable change payload");
            return None;
        }
    };

    match (wire.table.as_str(), wire.kind.as_str()) {
        (tables::PROJECTS, "INSERT") => {
            let row: ProjectRow = serde_json::from_value(wire.record?).ok()?;
            Some(ChangeEvent::ProjectInserted(row.project()))
        }
        (tables::PROJECTS, "UPDATE") => {
            let row: ProjectRow = serde_json::from_value(wire.record?).ok()?;
            Some(ChangeEvent::ProjectUpdated {
                project: row.project(),
                ai_state: row.ai_state,
            })
        }
        (tables::MESSAGES, "INSERT") => {
            let row: MessageRow = serde_json::from_value(wire.record?).ok()?;
            Some(ChangeEvent::MessageInserted {
                project_id: row.project_id.clone(),
                message: row.into_message(),
            })
        }
        (tables::MESSAGES, "UPDATE") => {
            let row: MessageRow = serde_json::from_value(wire.record?).ok()?;
            Some(ChangeEvent::ReactionsUpdated {
                project_id: row.project_id.clone(),
                message_id: row.id.clone(),
                reactions: row.reactions.unwrap_or_default(),
            })
        }
        (tables::MESSAGES, "DELETE") => {
            let message_id = wire.old?.get("id")?.as_str()?.to_string();
            Some(ChangeEvent::MessageDeleted { message_id })
        }
        (tables::CHAT_MESSAGES, "INSERT") => {
            let row: ChatMessageRow = serde_json::from_value(wire.record?).ok()?;
            Some(ChangeEvent::ChatMessageInserted {
                project_id: row.project_id.clone(),
                message: row.into_chat_message(),
            })
        }
        _ => None,
    }
}
