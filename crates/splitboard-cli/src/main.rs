use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use splitboard_core::ai::{
    AnalyzeRequest, Gateway, Language, TaskResult, TaskType, ThinkingFlags, Turn,
};
use splitboard_core::models::{
    timestamp_id, ChatMessage, ChatSender, Message, Position, Project, Sender,
};
use splitboard_core::tracing_setup;
use splitboard_core::{tree, CoreConfig, HybridStore, Settings};

#[derive(Parser)]
#[command(name = "splitboard")]
#[command(about = "Chat workspace with AI-assisted analysis")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, short)]
    pretty: bool,

    /// Data directory (defaults to the platform data dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show connection mode and the active project
    Status,

    /// List all projects
    Projects,

    /// Create a new project
    CreateProject {
        /// Project name (defaults to "Project N")
        name: Option<String>,
    },

    /// Rename a project
    RenameProject {
        project_id: String,
        new_name: String,
    },

    /// Send a message into a project conversation
    Send {
        /// Project ID (defaults to the active project)
        #[arg(long)]
        project: Option<String>,
        /// Message text
        text: String,
        /// Message ID this replies to
        #[arg(long)]
        reply_to: Option<String>,
        /// Mind-map node partition (defaults to the master conversation)
        #[arg(long)]
        node: Option<String>,
    },

    /// List messages in a project (optionally one node partition)
    Messages {
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        node: Option<String>,
    },

    /// Add a reaction to a message
    React { message_id: String, emoji: String },

    /// Delete a message
    DeleteMessage { message_id: String },

    /// Send one AI chat turn and print the reply
    Chat {
        #[arg(long)]
        project: Option<String>,
        text: String,
    },

    /// Run an AI analysis task over the conversation
    Analyze {
        #[arg(long)]
        project: Option<String>,
        /// One of: summary, todos, suggestions, mindmap, all
        task: String,
    },

    /// Add a mind-map branch node
    TreeAdd {
        #[arg(long)]
        project: Option<String>,
        label: String,
        /// Parent node ID (omit for a new root)
        #[arg(long)]
        parent: Option<String>,
        /// Context text seeding the new branch conversation
        #[arg(long)]
        context: Option<String>,
    },

    /// Collapse or expand a node
    TreeCollapse {
        #[arg(long)]
        project: Option<String>,
        node_id: String,
    },

    /// Persist a dragged node position
    TreeMove {
        #[arg(long)]
        project: Option<String>,
        node_id: String,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },

    /// Print the node structure with visibility and layout
    TreeShow {
        #[arg(long)]
        project: Option<String>,
    },

    /// Read or write a setting
    Config {
        /// One of: api-key, system-prompt, chat-system-prompt, model, language
        key: String,
        /// New value; omit to print the current one
        value: Option<String>,
    },
}

fn data_dir(cli: &Cli) -> PathBuf {
    cli.data_dir.clone().unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("splitboard")
    })
}

/// Give the remote echo a moment to arrive, then merge it.
fn settle(store: &mut HybridStore) {
    if store.is_connected() {
        std::thread::sleep(Duration::from_millis(400));
        store.poll_changes();
    }
}

fn resolve_project(store: &mut HybridStore, requested: Option<&str>) -> String {
    match requested {
        Some(id) => {
            store.select_project(id);
            id.to_string()
        }
        None => store.active_project_id().to_string(),
    }
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}

fn missing_key_alert(language: Language) -> &'static str {
    match language {
        Language::Jp => "APIキーを設定してください。",
        Language::En => "Please set your Gemini API Key first.",
    }
}

fn chat_error_turn(language: Language) -> &'static str {
    match language {
        Language::Jp => "エラーが発生しました。",
        Language::En => "Sorry, I encountered an error.",
    }
}

fn analysis_failed_alert(language: Language) -> &'static str {
    match language {
        Language::Jp => "AI分析に失敗しました。",
        Language::En => "AI Analysis failed.",
    }
}

fn parse_task(task: &str) -> Result<TaskType> {
    Ok(match task {
        "summary" => TaskType::Summary,
        "todos" => TaskType::Todos,
        "suggestions" => TaskType::Suggestions,
        "mindmap" => TaskType::Mindmap,
        "all" => TaskType::All,
        other => bail!("unknown task type: {other}"),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_setup::init_tracing();
    let cli = Cli::parse();

    let config = CoreConfig::new(data_dir(&cli));
    let mut store = HybridStore::new(config)?;
    settle(&mut store);
    let local = splitboard_core::LocalStore::new(data_dir(&cli).join("splitboard.db"))?;
    let mut settings = Settings::load(&local)?;

    match &cli.command {
        Commands::Status => {
            let mode = if store.is_connected() {
                "Online Multi-User"
            } else {
                "Offline (Local)"
            };
            println!("{mode}");
            println!("active project: {}", store.active_project_id());
        }

        Commands::Projects => {
            print_json(&store.projects(), cli.pretty)?;
        }

        Commands::CreateProject { name } => {
            let name = name
                .clone()
                .unwrap_or_else(|| format!("Project {}", store.projects().len() + 1));
            let color = Project::random_color();
            let id = store.create_project(&name, &color);
            settle(&mut store);
            println!("{id}");
        }

        Commands::RenameProject { project_id, new_name } => {
            let trimmed = new_name.trim();
            if trimmed.is_empty() {
                bail!("project name must not be empty");
            }
            store.rename_project(project_id, trimmed);
            settle(&mut store);
        }

        Commands::Send {
            project,
            text,
            reply_to,
            node,
        } => {
            let project_id = resolve_project(&mut store, project.as_deref());
            let message = Message {
                id: timestamp_id(),
                sender: Sender::Me,
                text: text.clone(),
                timestamp: chrono_time(),
                reply_to: reply_to.clone(),
                reactions: Default::default(),
                node_id: node.clone(),
            };
            store.append_message(&project_id, message);
            settle(&mut store);
        }

        Commands::Messages { project, node } => {
            let project_id = resolve_project(&mut store, project.as_deref());
            settle(&mut store);
            let state = store
                .state_of(&project_id)
                .cloned()
                .unwrap_or_default();
            let shown: Vec<&Message> = tree::visible_messages(
                &state.messages,
                &state.ai_state.structure,
                node.as_deref(),
            );
            print_json(&shown, cli.pretty)?;
        }

        Commands::React { message_id, emoji } => {
            if !store.react_to_message(message_id, emoji) {
                bail!("no such message in the active project: {message_id}");
            }
            settle(&mut store);
        }

        Commands::DeleteMessage { message_id } => {
            store.delete_message(message_id);
            settle(&mut store);
        }

        Commands::Chat { project, text } => {
            if settings.api_key.trim().is_empty() {
                bail!("{}", missing_key_alert(settings.language));
            }
            let project_id = resolve_project(&mut store, project.as_deref());
            settle(&mut store);

            let user_turn = ChatMessage {
                id: timestamp_id(),
                sender: ChatSender::User,
                text: text.clone(),
            };

            // History for the call: the cached turns plus the one being
            // sent, captured before the append so both backends see the
            // same context.
            let mut history: Vec<Turn> = store
                .state_of(&project_id)
                .map(|s| s.chat_messages.iter().map(Turn::from).collect())
                .unwrap_or_default();
            history.push(Turn::from(&user_turn));
            store.append_chat_message(&project_id, user_turn);

            let gateway = Gateway::new();
            let request = AnalyzeRequest {
                messages: Some(history),
                api_key: settings.api_key.clone(),
                task: TaskType::Chat,
                system_prompt: Some(settings.chat_system_prompt.clone()),
                model: Some(settings.model.clone()),
                language: settings.language,
            };

            let reply_text = match gateway.run_task(&request).await {
                Ok(TaskResult::Chat { chat_response }) => {
                    if chat_response.is_empty() {
                        "Available (No response text)".to_string()
                    } else {
                        chat_response
                    }
                }
                Ok(_) => "Available (No response text)".to_string(),
                Err(err) => {
                    tracing::error!(%err, "chat turn failed");
                    chat_error_turn(settings.language).to_string()
                }
            };

            let ai_turn = ChatMessage {
                id: timestamp_id(),
                sender: ChatSender::Ai,
                text: reply_text.clone(),
            };
            store.append_chat_message(&project_id, ai_turn);
            settle(&mut store);
            println!("{reply_text}");
        }

        Commands::Analyze { project, task } => {
            if settings.api_key.trim().is_empty() {
                bail!("{}", missing_key_alert(settings.language));
            }
            let task = parse_task(task)?;
            let project_id = resolve_project(&mut store, project.as_deref());
            settle(&mut store);

            let mut thinking = ThinkingFlags::default();
            if !thinking.try_begin(task) {
                bail!("a {} run is already in flight", task.as_str());
            }

            let turns: Vec<Turn> = store
                .state_of(&project_id)
                .map(|s| s.messages.iter().map(Turn::from).collect())
                .unwrap_or_default();

            let gateway = Gateway::new();
            let request = AnalyzeRequest {
                messages: Some(turns),
                api_key: settings.api_key.clone(),
                task,
                system_prompt: Some(settings.system_prompt.clone()),
                model: Some(settings.model.clone()),
                language: settings.language,
            };

            let result = gateway.run_task(&request).await;
            thinking.end(task);

            match result {
                Ok(result) => {
                    let mut ai_state = store
                        .state_of(&project_id)
                        .map(|s| s.ai_state.clone())
                        .unwrap_or_default();
                    result.apply_to(&mut ai_state);
                    store.set_ai_state(&project_id, ai_state);
                    settle(&mut store);
                    print_json(&result, cli.pretty)?;
                }
                Err(err) => {
                    tracing::error!(%err, "analysis failed");
                    bail!("{}", analysis_failed_alert(settings.language));
                }
            }
        }

        Commands::TreeAdd {
            project,
            label,
            parent,
            context,
        } => {
            let project_id = resolve_project(&mut store, project.as_deref());
            settle(&mut store);

            let mut ai_state = store
                .state_of(&project_id)
                .map(|s| s.ai_state.clone())
                .unwrap_or_default();
            let added = tree::add_child(
                &mut ai_state.structure,
                parent.as_deref(),
                label,
                context.as_deref(),
            )?;
            store.set_ai_state(&project_id, ai_state);
            if let Some(seed) = added.seed {
                store.append_message(&project_id, seed);
            }
            settle(&mut store);
            println!("{}", added.node_id);
        }

        Commands::TreeCollapse { project, node_id } => {
            let project_id = resolve_project(&mut store, project.as_deref());
            settle(&mut store);

            let mut ai_state = store
                .state_of(&project_id)
                .map(|s| s.ai_state.clone())
                .unwrap_or_default();
            if !tree::toggle_collapse(&mut ai_state.structure, node_id) {
                bail!("no such node: {node_id}");
            }
            store.set_ai_state(&project_id, ai_state);
            settle(&mut store);
        }

        Commands::TreeMove {
            project,
            node_id,
            x,
            y,
        } => {
            let project_id = resolve_project(&mut store, project.as_deref());
            settle(&mut store);

            let mut ai_state = store
                .state_of(&project_id)
                .map(|s| s.ai_state.clone())
                .unwrap_or_default();
            if !tree::set_position(&mut ai_state.structure, node_id, Position { x: *x, y: *y }) {
                bail!("no such node: {node_id}");
            }
            store.set_ai_state(&project_id, ai_state);
            settle(&mut store);
        }

        Commands::TreeShow { project } => {
            let project_id = resolve_project(&mut store, project.as_deref());
            settle(&mut store);

            let mut structure = store
                .state_of(&project_id)
                .map(|s| s.ai_state.structure.clone())
                .unwrap_or_default();
            tree::layout::assign_positions(&mut structure);

            #[derive(serde::Serialize)]
            struct NodeView {
                id: String,
                label: String,
                parent_id: Option<String>,
                is_collapsed: bool,
                hidden: bool,
                position: Option<Position>,
            }
            let views: Vec<NodeView> = structure
                .iter()
                .map(|n| NodeView {
                    id: n.id.clone(),
                    label: n.label.clone(),
                    parent_id: n.parent_id.clone(),
                    is_collapsed: n.is_collapsed,
                    hidden: tree::is_hidden(&structure, &n.id),
                    position: n.position,
                })
                .collect();
            print_json(&views, cli.pretty)?;
        }

        Commands::Config { key, value } => match value {
            Some(value) => match key.as_str() {
                "api-key" => settings.save_api_key(&local, value)?,
                "system-prompt" => settings.save_system_prompt(&local, value)?,
                "chat-system-prompt" => settings.save_chat_system_prompt(&local, value)?,
                "model" => settings.save_model(&local, value)?,
                "language" => settings.save_language(&local, Language::from_code(value))?,
                other => bail!("unknown setting: {other}"),
            },
            None => {
                let shown = match key.as_str() {
                    "api-key" => settings.api_key.clone(),
                    "system-prompt" => settings.system_prompt.clone(),
                    "chat-system-prompt" => settings.chat_system_prompt.clone(),
                    "model" => settings.model.clone(),
                    "language" => settings.language.as_str().to_string(),
                    other => bail!("unknown setting: {other}"),
                };
                println!("{shown}");
            }
        },
    }

    store.shutdown();
    Ok(())
}

fn chrono_time() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}
