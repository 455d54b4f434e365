//! Background worker owning all remote I/O.
//!
//! The controller thread sends [`RemoteCommand`]s over a channel; parsed
//! change events and fetch results come back over a second channel and
//! are merged into the cache when the controller polls. Failed writes are
//! logged and dropped — they must never corrupt the local cache.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, SendError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;

use crate::config::RemoteConfig;
use crate::constants::CHANGE_FEED_RETRY_SECS;
use crate::models::{AIState, ChatMessage, ChatMessageRow, Message, MessageRow, ProjectRow};
use crate::remote::changes::{parse_change, ChangeEvent};
use crate::remote::client::RemoteClient;

#[derive(Debug)]
pub enum RemoteCommand {
    FetchProjects,
    FetchProjectState { project_id: String },
    InsertProject { row: ProjectRow },
    RenameProject { project_id: String, name: String },
    InsertMessage { project_id: String, message: Message },
    UpdateReactions {
        message_id: String,
        reactions: BTreeMap<String, u32>,
    },
    DeleteMessage { message_id: String },
    InsertChatMessage { project_id: String, message: ChatMessage },
    UpdateAiState { project_id: String, state: AIState },
    Shutdown,
}

#[derive(Clone)]
pub struct RemoteHandle {
    command_tx: Sender<RemoteCommand>,
}

impl RemoteHandle {
    pub fn send(&self, command: RemoteCommand) -> Result<(), SendError<RemoteCommand>> {
        self.command_tx.send(command)
    }
}

pub struct RemoteWorker {
    client: RemoteClient,
    change_tx: Sender<ChangeEvent>,
    command_rx: Receiver<RemoteCommand>,
}

impl RemoteWorker {
    /// Construct the client and start the worker thread. Constructing
    /// without error is what flips the store into connected mode.
    pub fn spawn(
        config: &RemoteConfig,
    ) -> Result<(RemoteHandle, Receiver<ChangeEvent>, JoinHandle<()>)> {
        let client = RemoteClient::new(config)?;
        let (command_tx, command_rx) = mpsc::channel::<RemoteCommand>();
        let (change_tx, change_rx) = mpsc::channel::<ChangeEvent>();

        let worker = RemoteWorker {
            client,
            change_tx,
            command_rx,
        };
        let handle = std::thread::spawn(move || worker.run());

        Ok((RemoteHandle { command_tx }, change_rx, handle))
    }

    fn run(self) {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!(%err, "remote worker runtime failed to start");
                return;
            }
        };

        let feed_client = self.client.clone();
        let feed_tx = self.change_tx.clone();
        runtime.spawn(async move { change_feed_loop(feed_client, feed_tx).await });

        while let Ok(command) = self.command_rx.recv() {
            if matches!(command, RemoteCommand::Shutdown) {
                break;
            }
            if let Err(err) = runtime.block_on(self.execute(command)) {
                tracing::warn!(%err, "remote operation failed");
            }
        }
    }

    async fn execute(&self, command: RemoteCommand) -> Result<()> {
        match command {
            RemoteCommand::FetchProjects => {
                let projects = self.client.fetch_projects().await?;
                let _ = self.change_tx.send(ChangeEvent::ProjectsLoaded { projects });
            }
            RemoteCommand::FetchProjectState { project_id } => {
                let messages = self.client.fetch_messages(&project_id).await?;
                let chat_messages = self.client.fetch_chat_messages(&project_id).await?;
                let _ = self.change_tx.send(ChangeEvent::ProjectStateLoaded {
                    project_id,
                    messages,
                    chat_messages,
                });
            }
            RemoteCommand::InsertProject { row } => {
                self.client.insert_project(&row).await?;
            }
            RemoteCommand::RenameProject { project_id, name } => {
                self.client.rename_project(&project_id, &name).await?;
            }
            RemoteCommand::InsertMessage { project_id, message } => {
                let row = MessageRow::from_message(&project_id, &message);
                self.client.insert_message(&row).await?;
            }
            RemoteCommand::UpdateReactions { message_id, reactions } => {
                self.client.update_reactions(&message_id, &reactions).await?;
            }
            RemoteCommand::DeleteMessage { message_id } => {
                self.client.delete_message(&message_id).await?;
            }
            RemoteCommand::InsertChatMessage { project_id, message } => {
                let row = ChatMessageRow::from_chat_message(&project_id, &message);
                self.client.insert_chat_message(&row).await?;
            }
            RemoteCommand::UpdateAiState { project_id, state } => {
                self.client.update_ai_state(&project_id, &state).await?;
            }
            RemoteCommand::Shutdown => {}
        }
        Ok(())
    }
}

/// Consume the SSE change feed forever, reconnecting with a fixed
/// backoff. Ends only when the receiving side is gone.
async fn change_feed_loop(client: RemoteClient, tx: Sender<ChangeEvent>) {
    loop {
        match client.open_change_feed().await {
            Ok(response) => {
                tracing::info!("change feed connected");
                let mut stream = response.bytes_stream();
                let mut buffer = String::new();
                while let Some(chunk) = stream.next().await {
                    match chunk {
                        Ok(bytes) => {
                            buffer.push_str(&String::from_utf8_lossy(&bytes));
                            while let Some(pos) = buffer.find('\n') {
                                let line: String = buffer.drain(..=pos).collect();
                                let line = line.trim();
                                if let Some(payload) = line.strip_prefix("data:") {
                                    if let Some(event) = parse_change(payload.trim()) {
                                        if tx.send(event).is_err() {
                                            return;
                                        }
                                    }
                                }
                            }
                        }
                        Err(err) => {
                            tracing::warn!(%err, "change feed read failed");
                            break;
                        }
                    }
                }
                tracing::warn!("change feed disconnected");
            }
            Err(err) => {
                tracing::warn!(%err, "change feed connect failed");
            }
        }
        tokio::time::sleep(Duration::from_secs(CHANGE_FEED_RETRY_SECS)).await;
    }
}
