pub mod ai_state;
pub mod chat_message;
pub mod message;
pub mod node;
pub mod project;

pub use ai_state::{AIState, ToDo, TodoStatus};
pub use chat_message::{ChatMessage, ChatMessageRow, ChatSender};
pub use message::{Message, MessageRow, Sender};
pub use node::{ChatNode, NodeType, Position};
pub use project::{Project, ProjectRow};

use serde::{Deserialize, Serialize};

/// Millisecond-timestamp id, the id scheme used for projects and messages.
pub fn timestamp_id() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

/// Everything cached for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub ai_state: AIState,
    #[serde(default)]
    pub chat_messages: Vec<ChatMessage>,
    #[serde(default)]
    pub last_active_at: i64,
}

impl Default for ProjectState {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            ai_state: AIState::default(),
            chat_messages: Vec::new(),
            last_active_at: 0,
        }
    }
}

impl ProjectState {
    pub fn new_now() -> Self {
        Self {
            last_active_at: chrono::Utc::now().timestamp_millis(),
            ..Self::default()
        }
    }
}
