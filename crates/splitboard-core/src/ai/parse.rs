//! Completion-text normalization.
//!
//! Providers frequently wrap JSON in markdown fences or ignore the schema
//! entirely; parse failures degrade per task type instead of surfacing.

use serde_json::Value;

use crate::ai::{TaskResult, TaskType};
use crate::models::{ToDo, TodoStatus};

/// Strip markdown code-fence wrappers (```json ... ```) anywhere in the
/// text, then trim.
pub fn strip_code_fence(raw: &str) -> String {
    raw.replace("```json\n", "")
        .replace("```json", "")
        .replace("\n```", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Turn raw completion text into a typed result. Unparseable text falls
/// back per task type; todos additionally get stable ids assigned.
pub fn normalize(task: TaskType, raw: &str) -> TaskResult {
    let stripped = strip_code_fence(raw);

    let parsed: Option<Value> = serde_json::from_str(&stripped).ok();

    match task {
        TaskType::Chat => {
            let text = parsed
                .as_ref()
                .and_then(|v| v.get("chatResponse"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| raw.to_string());
            TaskResult::Chat { chat_response: text }
        }
        TaskType::Summary => {
            let summary = parsed
                .as_ref()
                .and_then(|v| v.get("summary"))
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_else(|| vec![raw.to_string()]);
            TaskResult::Summary { summary }
        }
        TaskType::Todos => {
            let todos = parsed
                .as_ref()
                .and_then(|v| v.get("todos"))
                .and_then(Value::as_array)
                .map(|items| parse_todos(items))
                .unwrap_or_default();
            TaskResult::Todos { todos }
        }
        TaskType::Suggestions => {
            let suggestions = parsed
                .as_ref()
                .and_then(|v| v.get("suggestions"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| raw.to_string());
            TaskResult::Suggestions { suggestions }
        }
        TaskType::Mindmap => {
            let mindmap = parsed
                .as_ref()
                .and_then(|v| v.get("mindmap"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| raw.to_string());
            TaskResult::Mindmap { mindmap }
        }
        TaskType::All => TaskResult::All(parsed.unwrap_or_else(|| Value::Object(Default::default()))),
    }
}

/// Lenient todo extraction: items keep a provided integer id, everything
/// else is assigned from a counter continuing past the largest id seen.
/// Stable across re-renders, unlike a random stand-in.
fn parse_todos(items: &[Value]) -> Vec<ToDo> {
    let drafts: Vec<(Option<i64>, String, TodoStatus)> = items
        .iter()
        .filter_map(|item| {
            let task = item.get("task")?.as_str()?.to_string();
            let id = item.get("id").and_then(Value::as_i64).filter(|id| *id > 0);
            let status = item
                .get("status")
                .and_then(Value::as_str)
                .and_then(|s| match s {
                    "completed" => Some(TodoStatus::Completed),
                    "pending" => Some(TodoStatus::Pending),
                    _ => None,
                })
                .unwrap_or(TodoStatus::Pending);
            Some((id, task, status))
        })
        .collect();

    let mut next_id = drafts.iter().filter_map(|(id, _, _)| *id).max().unwrap_or(0);

    drafts
        .into_iter()
        .map(|(id, task, status)| {
            let id = id.unwrap_or_else(|| {
                next_id += 1;
                next_id
            });
            ToDo { id, task, status }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_summary_parses() {
        let result = normalize(TaskType::Summary, "```json\n{\"summary\":[\"a\",\"b\"]}\n```");
        assert_eq!(
            result,
            TaskResult::Summary {
                summary: vec!["a".to_string(), "b".to_string()]
            }
        );
    }

    #[test]
    fn test_plain_text_todos_degrade_to_empty() {
        let result = normalize(TaskType::Todos, "Hello there");
        assert_eq!(result, TaskResult::Todos { todos: vec![] });
    }

    #[test]
    fn test_plain_text_summary_degrades_to_single_item() {
        let result = normalize(TaskType::Summary, "Hello there");
        assert_eq!(
            result,
            TaskResult::Summary {
                summary: vec!["Hello there".to_string()]
            }
        );
    }

    #[test]
    fn test_plain_text_chat_wraps_raw() {
        let result = normalize(TaskType::Chat, "Hi!");
        assert_eq!(
            result,
            TaskResult::Chat {
                chat_response: "Hi!".to_string()
            }
        );
    }

    #[test]
    fn test_chat_json_extracts_field() {
        let result = normalize(TaskType::Chat, r#"{"chatResponse":"hey"}"#);
        assert_eq!(
            result,
            TaskResult::Chat {
                chat_response: "hey".to_string()
            }
        );
    }

    #[test]
    fn test_missing_todo_ids_assigned_past_max() {
        let raw = r#"{"todos":[
            {"id": 7, "task": "keep", "status": "pending"},
            {"task": "first unnumbered", "status": "completed"},
            {"task": "second unnumbered"}
        ]}"#;
        let TaskResult::Todos { todos } = normalize(TaskType::Todos, raw) else {
            panic!("expected todos");
        };
        assert_eq!(todos.len(), 3);
        assert_eq!(todos[0].id, 7);
        assert_eq!(todos[1].id, 8);
        assert_eq!(todos[1].status, TodoStatus::Completed);
        assert_eq!(todos[2].id, 9);
        assert_eq!(todos[2].status, TodoStatus::Pending);

        let ids: std::collections::HashSet<i64> = todos.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), todos.len(), "assigned ids must not collide");
    }

    #[test]
    fn test_unparseable_mindmap_keeps_raw_text() {
        let result = normalize(TaskType::Mindmap, "mindmap\n  root((Topic))");
        assert_eq!(
            result,
            TaskResult::Mindmap {
                mindmap: "mindmap\n  root((Topic))".to_string()
            }
        );
    }

    #[test]
    fn test_all_task_unparseable_is_empty_object() {
        let result = normalize(TaskType::All, "not json");
        assert_eq!(result, TaskResult::All(serde_json::json!({})));
    }

    #[test]
    fn test_fence_without_language_tag() {
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json{\"a\":1}```"), "{\"a\":1}");
    }
}
