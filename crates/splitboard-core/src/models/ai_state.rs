use serde::{Deserialize, Serialize};

use crate::constants::INITIAL_SUGGESTIONS;
use crate::models::ChatNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToDo {
    pub id: i64,
    pub task: String,
    pub status: TodoStatus,
}

/// AI-derived artifacts for one project. Fields are overwritten
/// independently by separate task runs; the struct itself is written
/// wholesale at the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AIState {
    #[serde(default)]
    pub summary: Vec<String>,
    #[serde(default)]
    pub todos: Vec<ToDo>,
    #[serde(default)]
    pub suggestions: String,
    #[serde(default)]
    pub mindmap: Option<String>,
    #[serde(default)]
    pub structure: Vec<ChatNode>,
}

impl Default for AIState {
    fn default() -> Self {
        Self {
            summary: Vec::new(),
            todos: Vec::new(),
            suggestions: INITIAL_SUGGESTIONS.to_string(),
            mindmap: None,
            structure: Vec::new(),
        }
    }
}
