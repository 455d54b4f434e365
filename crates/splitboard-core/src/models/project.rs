use serde::{Deserialize, Serialize};

use crate::constants::PROJECT_COLORS;
use crate::models::AIState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl Project {
    /// Pseudo-random pick from the fixed palette.
    pub fn random_color() -> String {
        let nanos = chrono::Utc::now().timestamp_subsec_nanos() as usize;
        PROJECT_COLORS[nanos % PROJECT_COLORS.len()].to_string()
    }
}

/// Row shape of the `projects` table. `ai_state` rides along on the same
/// record and is overwritten wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_state: Option<AIState>,
}

impl ProjectRow {
    pub fn project(&self) -> Project {
        Project {
            id: self.id.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_color_is_from_palette() {
        let color = Project::random_color();
        assert!(PROJECT_COLORS.contains(&color.as_str()));
    }

    #[test]
    fn test_row_without_ai_state() {
        let row: ProjectRow =
            serde_json::from_str(r##"{"id":"1","name":"P","color":"#fff"}"##).unwrap();
        assert!(row.ai_state.is_none());
        assert_eq!(row.project().name, "P");
    }
}
