use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Me,
    Partner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: String,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub reactions: BTreeMap<String, u32>,
    #[serde(default)]
    pub node_id: Option<String>,
}

/// Row shape of the `messages` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: String,
    pub project_id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: String,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub reactions: Option<BTreeMap<String, u32>>,
    #[serde(default)]
    pub node_id: Option<String>,
}

impl MessageRow {
    pub fn from_message(project_id: &str, message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            project_id: project_id.to_string(),
            sender: message.sender,
            text: message.text.clone(),
            timestamp: message.timestamp.clone(),
            reply_to: message.reply_to.clone(),
            reactions: if message.reactions.is_empty() {
                None
            } else {
                Some(message.reactions.clone())
            },
            node_id: message.node_id.clone(),
        }
    }

    pub fn into_message(self) -> Message {
        Message {
            id: self.id,
            sender: self.sender,
            text: self.text,
            timestamp: self.timestamp,
            reply_to: self.reply_to,
            reactions: self.reactions.unwrap_or_default(),
            node_id: self.node_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Message {
        let mut reactions = BTreeMap::new();
        reactions.insert("👍".to_string(), 2);
        Message {
            id: "1700000000000".to_string(),
            sender: Sender::Me,
            text: "hello".to_string(),
            timestamp: "10:30".to_string(),
            reply_to: Some("1699999999999".to_string()),
            reactions,
            node_id: Some("n1".to_string()),
        }
    }

    #[test]
    fn test_row_round_trip_preserves_all_fields() {
        let message = sample();
        let row = MessageRow::from_message("p1", &message);
        assert_eq!(row.project_id, "p1");
        let json = serde_json::to_string(&row).unwrap();
        let back: MessageRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back.into_message(), message);
    }

    #[test]
    fn test_null_reactions_become_empty_map() {
        let row: MessageRow = serde_json::from_str(
            r#"{"id":"1","project_id":"p","sender":"partner","text":"hi","timestamp":"09:00","reply_to":null,"reactions":null,"node_id":null}"#,
        )
        .unwrap();
        let message = row.into_message();
        assert!(message.reactions.is_empty());
        assert!(message.reply_to.is_none());
        assert!(message.node_id.is_none());
    }
}
