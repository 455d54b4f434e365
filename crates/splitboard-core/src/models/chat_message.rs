use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    User,
    Ai,
}

/// One turn of the AI assistant dialogue. A separate stream from
/// [`Message`](crate::models::Message): no reactions, replies or nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: ChatSender,
    pub text: String,
}

/// Row shape of the `gemini_messages` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageRow {
    pub id: String,
    pub project_id: String,
    pub sender: ChatSender,
    pub text: String,
}

impl ChatMessageRow {
    pub fn from_chat_message(project_id: &str, message: &ChatMessage) -> Self {
        Self {
            id: message.id.clone(),
            project_id: project_id.to_string(),
            sender: message.sender,
            text: message.text.clone(),
        }
    }

    pub fn into_chat_message(self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            sender: self.sender,
            text: self.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_wire_names() {
        assert_eq!(serde_json::to_string(&ChatSender::User).unwrap(), r#""user""#);
        assert_eq!(serde_json::to_string(&ChatSender::Ai).unwrap(), r#""ai""#);
    }
}
