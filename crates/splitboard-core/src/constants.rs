//! Application-wide constants
//!
//! Centralized location for magic strings and configuration values
//! that are used across multiple modules.

/// Base URL of the completion provider (Google Generative Language API)
pub const PROVIDER_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Default completion model when the configured one is not on the allow-list
pub const DEFAULT_MODEL: &str = "gemini-3-flash";

/// Model retried once after a non-success provider response
pub const FALLBACK_MODEL: &str = "gemini-2.5-flash";

/// Models a caller is allowed to select
pub const MODEL_ALLOW_LIST: &[&str] = &[
    "gemini-3-pro",
    "gemini-3-flash",
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-2.0-flash",
];

/// Number of trailing conversation turns sent to analysis tasks
pub const ANALYSIS_HISTORY_WINDOW: usize = 10;

/// Project colors assigned round-robin-by-chance on creation
pub const PROJECT_COLORS: &[&str] = &[
    "#ef4444", "#f97316", "#f59e0b", "#84cc16", "#10b981",
    "#06b6d4", "#3b82f6", "#8b5cf6", "#d946ef", "#f43f5e",
];

/// The project every local-only session starts with
pub const DEFAULT_PROJECT_ID: &str = "default";
pub const DEFAULT_PROJECT_NAME: &str = "Local Project";
pub const DEFAULT_PROJECT_COLOR: &str = "#6366f1";

/// Placeholder shown until the first suggestions run
pub const INITIAL_SUGGESTIONS: &str = "Waiting for conversation to start...";

// Local store snapshot keys
pub const SNAPSHOT_PROJECTS_KEY: &str = "split_ai_projects";
pub const SNAPSHOT_PROJECTS_DATA_KEY: &str = "split_ai_projects_data";

// Settings keys, one per scalar
pub mod settings_keys {
    pub const API_KEY: &str = "gemini_api_key";
    pub const SYSTEM_PROMPT: &str = "gemini_system_prompt";
    pub const CHAT_SYSTEM_PROMPT: &str = "gemini_chat_system_prompt";
    pub const MODEL: &str = "gemini_model";
    pub const LANGUAGE: &str = "gemini_language";
}

// Remote table names
pub mod tables {
    pub const PROJECTS: &str = "projects";
    pub const MESSAGES: &str = "messages";
    /// Historical name kept for wire compatibility with the hosted schema
    pub const CHAT_MESSAGES: &str = "gemini_messages";
}

/// Seconds to wait before reconnecting a dropped change feed
pub const CHANGE_FEED_RETRY_SECS: u64 = 5;
