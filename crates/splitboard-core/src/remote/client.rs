use std::collections::BTreeMap;

use anyhow::{Context, Result};
use reqwest::Response;
use serde_json::json;

use crate::config::RemoteConfig;
use crate::constants::tables;
use crate::models::{
    AIState, ChatMessage, ChatMessageRow, Message, MessageRow, ProjectRow,
};

/// REST client for the hosted realtime database.
///
/// Construction only validates configuration — there is no liveness
/// probe, so an unreachable backend fails per-operation instead of
/// triggering the local fallback.
#[derive(Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RemoteClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        anyhow::ensure!(!base_url.is_empty(), "remote base url is empty");
        anyhow::ensure!(
            base_url.starts_with("http://") || base_url.starts_with("https://"),
            "remote base url must be http(s): {base_url}"
        );
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    async fn check(response: Response, what: &str) -> Result<Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{what} failed ({status}): {body}");
        }
        Ok(response)
    }

    pub async fn fetch_projects(&self) -> Result<Vec<ProjectRow>> {
        let response = self
            .http
            .get(self.table_url(tables::PROJECTS))
            .query(&[("select", "*"), ("order", "created_at")])
            .header("apikey", &self.api_key)
            .send()
            .await
            .context("fetch projects request")?;
        let response = Self::check(response, "fetch projects").await?;
        Ok(response.json().await.context("parse projects rows")?)
    }

    pub async fn fetch_messages(&self, project_id: &str) -> Result<Vec<Message>> {
        let filter = format!("eq.{project_id}");
        let response = self
            .http
            .get(self.table_url(tables::MESSAGES))
            .query(&[
                ("select", "*"),
                ("project_id", filter.as_str()),
                ("order", "created_at"),
            ])
            .header("apikey", &self.api_key)
            .send()
            .await
            .context("fetch messages request")?;
        let response = Self::check(response, "fetch messages").await?;
        let rows: Vec<MessageRow> = response.json().await.context("parse message rows")?;
        Ok(rows.into_iter().map(MessageRow::into_message).collect())
    }

    pub async fn fetch_chat_messages(&self, project_id: &str) -> Result<Vec<ChatMessage>> {
        let filter = format!("eq.{project_id}");
        let response = self
            .http
            .get(self.table_url(tables::CHAT_MESSAGES))
            .query(&[
                ("select", "*"),
                ("project_id", filter.as_str()),
                ("order", "created_at"),
            ])
            .header("apikey", &self.api_key)
            .send()
            .await
            .context("fetch chat messages request")?;
        let response = Self::check(response, "fetch chat messages").await?;
        let rows: Vec<ChatMessageRow> = response.json().await.context("parse chat rows")?;
        Ok(rows.into_iter().map(ChatMessageRow::into_chat_message).collect())
    }

    pub async fn insert_project(&self, row: &ProjectRow) -> Result<()> {
        let response = self
            .http
            .post(self.table_url(tables::PROJECTS))
            .header("apikey", &self.api_key)
            .json(row)
            .send()
            .await
            .context("insert project request")?;
        Self::check(response, "insert project").await?;
        Ok(())
    }

    pub async fn rename_project(&self, project_id: &str, name: &str) -> Result<()> {
        let response = self
            .http
            .patch(self.table_url(tables::PROJECTS))
            .query(&[("id", &format!("eq.{project_id}"))])
            .header("apikey", &self.api_key)
            .json(&json!({ "name": name }))
            .send()
            .await
            .context("rename project request")?;
        Self::check(response, "rename project").await?;
        Ok(())
    }

    /// Whole-object overwrite of a project's AI state.
    pub async fn update_ai_state(&self, project_id: &str, state: &AIState) -> Result<()> {
        let response = self
            .http
            .patch(self.table_url(tables::PROJECTS))
            .query(&[("id", &format!("eq.{project_id}"))])
            .header("apikey", &self.api_key)
            .json(&json!({ "ai_state": state }))
            .send()
            .await
            .context("update ai state request")?;
        Self::check(response, "update ai state").await?;
        Ok(())
    }

    pub async fn insert_message(&self, row: &MessageRow) -> Result<()> {
        let response = self
            .http
            .post(self.table_url(tables::MESSAGES))
            .header("apikey", &self.api_key)
            .json(row)
            .send()
            .await
            .context("insert message request")?;
        Self::check(response, "insert message").await?;
        Ok(())
    }

    /// Write back the full reactions map for one message.
    pub async fn update_reactions(
        &self,
        message_id: &str,
        reactions: &BTreeMap<String, u32>,
    ) -> Result<()> {
        let response = self
            .http
            .patch(self.table_url(tables::MESSAGES))
            .query(&[("id", &format!("eq.{message_id}"))])
            .header("apikey", &self.api_key)
            .json(&json!({ "reactions": reactions }))
            .send()
            .await
            .context("update reactions request")?;
        Self::check(response, "update reactions").await?;
        Ok(())
    }

    pub async fn delete_message(&self, message_id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.table_url(tables::MESSAGES))
            .query(&[("id", &format!("eq.{message_id}"))])
            .header("apikey", &self.api_key)
            .send()
            .await
            .context("delete message request")?;
        Self::check(response, "delete message").await?;
        Ok(())
    }

    pub async fn insert_chat_message(&self, row: &ChatMessageRow) -> Result<()> {
        let response = self
            .http
            .post(self.table_url(tables::CHAT_MESSAGES))
            .header("apikey", &self.api_key)
            .json(row)
            .send()
            .await
            .context("insert chat message request")?;
        Self::check(response, "insert chat message").await?;
        Ok(())
    }

    /// Open the SSE change feed; the caller consumes the byte stream.
    pub async fn open_change_feed(&self) -> Result<Response> {
        let response = self
            .http
            .get(format!("{}/realtime/v1/changes", self.base_url))
            .header("apikey", &self.api_key)
            .header("accept", "text/event-stream")
            .send()
            .await
            .context("change feed request")?;
        Self::check(response, "change feed connect").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_http_base_url() {
        let config = RemoteConfig {
            base_url: "ftp://example".to_string(),
            api_key: "k".to_string(),
        };
        assert!(RemoteClient::new(&config).is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = RemoteConfig {
            base_url: "https://db.example/".to_string(),
            api_key: "k".to_string(),
        };
        let client = RemoteClient::new(&config).unwrap();
        assert_eq!(client.table_url("projects"), "https://db.example/rest/v1/projects");
    }
}
