//! AI orchestration gateway.
//!
//! Builds a provider-agnostic request from conversation context and task
//! type, calls the completion service with a single fallback-model retry,
//! and normalizes the (possibly malformed) response into typed results.

pub mod parse;
pub mod prompt;
mod provider;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{DEFAULT_MODEL, FALLBACK_MODEL, MODEL_ALLOW_LIST, PROVIDER_API_BASE};
use crate::models::{AIState, ChatMessage, ChatSender, Message, Sender, ToDo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Chat,
    Summary,
    Todos,
    Suggestions,
    Mindmap,
    All,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Chat => "chat",
            TaskType::Summary => "summary",
            TaskType::Todos => "todos",
            TaskType::Suggestions => "suggestions",
            TaskType::Mindmap => "mindmap",
            TaskType::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Jp,
    #[default]
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Jp => "jp",
            Language::En => "en",
        }
    }

    /// `jp` selects Japanese; anything else is English.
    pub fn from_code(code: &str) -> Self {
        if code == "jp" {
            Language::Jp
        } else {
            Language::En
        }
    }
}

/// One conversation turn as the gateway sees it. `sender` is the wire
/// string: `me`/`partner` for analysis, `user`/`ai` for chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub sender: String,
    pub text: String,
}

impl From<&Message> for Turn {
    fn from(message: &Message) -> Self {
        Turn {
            sender: match message.sender {
                Sender::Me => "me".to_string(),
                Sender::Partner => "partner".to_string(),
            },
            text: message.text.clone(),
        }
    }
}

impl From<&ChatMessage> for Turn {
    fn from(message: &ChatMessage) -> Self {
        Turn {
            sender: match message.sender {
                ChatSender::User => "user".to_string(),
                ChatSender::Ai => "ai".to_string(),
            },
            text: message.text.clone(),
        }
    }
}

/// Wire shape of an analysis request (also the `/api/analyze` body).
/// `messages` stays optional so an absent array can be told apart from an
/// empty one: absent is a validation error, empty is a valid provider call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub messages: Option<Vec<Turn>>,
    #[serde(default)]
    pub api_key: String,
    #[serde(rename = "type")]
    pub task: TaskType,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub language: Language,
}

/// Typed result of one task run. Serializes to the per-type response body
/// (`{"chatResponse": ...}`, `{"summary": [...]}`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TaskResult {
    Chat {
        #[serde(rename = "chatResponse")]
        chat_response: String,
    },
    Summary {
        summary: Vec<String>,
    },
    Todos {
        todos: Vec<ToDo>,
    },
    Suggestions {
        suggestions: String,
    },
    Mindmap {
        mindmap: String,
    },
    All(Value),
}

impl TaskResult {
    /// Merge into an [`AIState`], replacing only this task's field. Chat
    /// turns flow into the chat stream instead, and `All` passes through
    /// to API consumers untouched.
    pub fn apply_to(&self, state: &mut AIState) {
        match self {
            TaskResult::Summary { summary } => state.summary = summary.clone(),
            TaskResult::Todos { todos } => state.todos = todos.clone(),
            TaskResult::Suggestions { suggestions } => state.suggestions = suggestions.clone(),
            TaskResult::Mindmap { mindmap } => state.mindmap = Some(mindmap.clone()),
            TaskResult::Chat { .. } | TaskResult::All(_) => {}
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("API Key is missing")]
    MissingApiKey,

    #[error("Messages array is missing or invalid")]
    MissingMessages,

    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    #[error("No Content Returned")]
    EmptyCompletion,

    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl GatewayError {
    /// HTTP status the `/api/analyze` surface reports for this error.
    pub fn status(&self) -> u16 {
        match self {
            GatewayError::MissingApiKey => 401,
            GatewayError::MissingMessages => 400,
            GatewayError::Upstream { status, .. } => *status,
            GatewayError::EmptyCompletion | GatewayError::Transport(_) => 500,
        }
    }
}

pub struct Gateway {
    http: reqwest::Client,
    api_base: String,
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}

impl Gateway {
    pub fn new() -> Self {
        Self::with_api_base(PROVIDER_API_BASE)
    }

    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
        }
    }

    /// Allow-listed model id, or the default for anything unrecognized.
    pub fn select_model(requested: Option<&str>) -> &'static str {
        requested
            .and_then(|m| MODEL_ALLOW_LIST.iter().find(|allowed| **allowed == m))
            .copied()
            .unwrap_or(DEFAULT_MODEL)
    }

    pub async fn run_task(&self, request: &AnalyzeRequest) -> Result<TaskResult, GatewayError> {
        if request.api_key.trim().is_empty() {
            return Err(GatewayError::MissingApiKey);
        }
        let Some(turns) = request.messages.as_deref() else {
            return Err(GatewayError::MissingMessages);
        };

        let prompt = prompt::build_prompt(
            request.task,
            turns,
            request.system_prompt.as_deref(),
            request.language,
        );
        let model = Self::select_model(request.model.as_deref());

        let mut response =
            provider::generate_content(&self.http, &self.api_base, model, &request.api_key, &prompt)
                .await?;

        // One retry against the fixed fallback, unless that was the first
        // attempt already.
        if !response.status().is_success() && model != FALLBACK_MODEL {
            tracing::warn!(model, status = %response.status(), "model failed, retrying with fallback");
            response = provider::generate_content(
                &self.http,
                &self.api_base,
                FALLBACK_MODEL,
                &request.api_key,
                &prompt,
            )
            .await?;
        }

        if !response.status().is_success() {
            let status = response.status();
            let details: Value = response.json().await.unwrap_or_else(|_| serde_json::json!({}));
            let message = details
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Gemini API Error: {status}"));
            tracing::error!(status = status.as_u16(), %message, "provider call failed");
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                message,
                details: Some(details),
            });
        }

        let envelope: Value = response.json().await?;
        let raw = provider::extract_text(&envelope).ok_or(GatewayError::EmptyCompletion)?;
        Ok(parse::normalize(request.task, &raw))
    }
}

/// Per-task in-flight markers. Task types are keyed independently so
/// concurrent runs of different types never interfere; a second run of
/// the same type is refused at the trigger site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThinkingFlags {
    summary: bool,
    todos: bool,
    suggestions: bool,
    mindmap: bool,
    chat: bool,
    all: bool,
}

impl ThinkingFlags {
    fn slot(&mut self, task: TaskType) -> &mut bool {
        match task {
            TaskType::Summary => &mut self.summary,
            TaskType::Todos => &mut self.todos,
            TaskType::Suggestions => &mut self.suggestions,
            TaskType::Mindmap => &mut self.mindmap,
            TaskType::Chat => &mut self.chat,
            TaskType::All => &mut self.all,
        }
    }

    pub fn is_thinking(&self, task: TaskType) -> bool {
        match task {
            TaskType::Summary => self.summary,
            TaskType::Todos => self.todos,
            TaskType::Suggestions => self.suggestions,
            TaskType::Mindmap => self.mindmap,
            TaskType::Chat => self.chat,
            TaskType::All => self.all,
        }
    }

    /// Mark the task in flight; false when one is already running.
    pub fn try_begin(&mut self, task: TaskType) -> bool {
        let slot = self.slot(task);
        if *slot {
            false
        } else {
            *slot = true;
            true
        }
    }

    pub fn end(&mut self, task: TaskType) {
        *self.slot(task) = false;
    }
}
