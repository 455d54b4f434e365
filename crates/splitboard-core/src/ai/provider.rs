//! Raw completion-provider call (Google Generative Language API).

use reqwest::{Client, Response};
use serde_json::Value;

pub(crate) async fn generate_content(
    http: &Client,
    api_base: &str,
    model: &str,
    api_key: &str,
    prompt: &str,
) -> Result<Response, reqwest::Error> {
    let url = format!("{api_base}/v1beta/models/{model}:generateContent?key={api_key}");
    http.post(&url)
        .json(&serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        }))
        .send()
        .await
}

/// Pull the completion text out of the response envelope.
pub(crate) fn extract_text(envelope: &Value) -> Option<String> {
    envelope
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text() {
        let envelope = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "hello" }] } }]
        });
        assert_eq!(extract_text(&envelope).as_deref(), Some("hello"));
    }

    #[test]
    fn test_extract_text_missing_candidates() {
        assert!(extract_text(&serde_json::json!({})).is_none());
        let empty = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "" }] } }]
        });
        assert!(extract_text(&empty).is_none());
    }
}
