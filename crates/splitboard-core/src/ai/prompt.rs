//! Prompt assembly for the completion provider.
//!
//! Each task type fixes the exact JSON schema the model must emit; the
//! instruction strings are behavioral constants shared with the hosted
//! deployment and must not be reworded casually.

use crate::ai::{Language, TaskType, Turn};
use crate::constants::ANALYSIS_HISTORY_WINDOW;

const DEFAULT_CHAT_PERSONA: &str = "You are a helpful, friendly, and intelligent AI assistant. You are talking directly to the user. Answer their questions effectively.";
const DEFAULT_ANALYSIS_PERSONA: &str = "You are an AI Staff Officer for a business chat.";

fn language_directive(language: Language) -> &'static str {
    match language {
        Language::Jp => "IMPORTANT: Respond in Japanese (日本語).",
        Language::En => "IMPORTANT: Respond in English.",
    }
}

fn instructions(task: TaskType) -> &'static str {
    match task {
        TaskType::Summary => {
            r#"Provide up to 5 concise bullet points summarizing the discussion. Output JSON: { "summary": ["point"] }."#
        }
        TaskType::Todos => {
            r#"Detect action items. Output JSON: { "todos": [{ "id": 123, "task": "text", "status": "pending" }] }. Return empty list if none."#
        }
        TaskType::Suggestions => {
            r#"Provide one suggestion. Output JSON: { "suggestions": "text" }."#
        }
        TaskType::Mindmap => {
            r#"Create a Mermaid.js mindmap syntax summarizing usage. Output JSON: { "mindmap": "mindmap\n  root((Main Topic))\n    Child1\n    Child2" }. Keep it simple."#
        }
        TaskType::All | TaskType::Chat => {
            "Provide summary, todos, suggestions, and mindmap in JSON."
        }
    }
}

/// Build the single text prompt sent to the provider.
///
/// Chat mode keeps the full history; analysis modes keep the trailing
/// window. The system prompt, when present, overrides the task persona.
pub fn build_prompt(
    task: TaskType,
    turns: &[Turn],
    system_prompt: Option<&str>,
    language: Language,
) -> String {
    let custom = system_prompt.map(str::trim).filter(|s| !s.is_empty());

    if task == TaskType::Chat {
        let conversation = turns
            .iter()
            .map(|t| {
                let role = if t.sender == "user" { "User" } else { "Model" };
                format!("{role}: {}", t.text)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let persona = custom.unwrap_or(DEFAULT_CHAT_PERSONA);

        format!(
            "System: {persona}\n\nConversation History:\n{conversation}\n\nAssistant's Response:\n{} Respond naturally. Output valid JSON: {{ \"chatResponse\": \"your response string\" }}",
            language_directive(language),
        )
    } else {
        let role_definition = match custom {
            Some(prompt) => format!("You are a custom AI assistant: {prompt}"),
            None => DEFAULT_ANALYSIS_PERSONA.to_string(),
        };

        let window_start = turns.len().saturating_sub(ANALYSIS_HISTORY_WINDOW);
        let chat_history = turns[window_start..]
            .iter()
            .map(|t| {
                let role = if t.sender == "me" { "User" } else { "Partner" };
                format!("{role}: {}", t.text)
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{role_definition}\nConversation:\n{chat_history}\n\nInstructions:\n{}\n{}\n\nReturn valid JSON only. No markdown formatting.",
            instructions(task),
            language_directive(language),
        )
    }
}
