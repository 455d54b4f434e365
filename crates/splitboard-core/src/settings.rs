//! User settings - five independent scalars, each under its own key in
//! the local store. Loaded once at startup, written on every change.

use anyhow::Result;

use crate::ai::Language;
use crate::constants::{settings_keys, DEFAULT_MODEL};
use crate::store::LocalStore;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub system_prompt: String,
    pub chat_system_prompt: String,
    pub model: String,
    pub language: Language,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            system_prompt: String::new(),
            chat_system_prompt: String::new(),
            model: DEFAULT_MODEL.to_string(),
            language: Language::Jp,
        }
    }
}

impl Settings {
    pub fn load(store: &LocalStore) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(value) = store.get(settings_keys::API_KEY)? {
            settings.api_key = value;
        }
        if let Some(value) = store.get(settings_keys::SYSTEM_PROMPT)? {
            settings.system_prompt = value;
        }
        if let Some(value) = store.get(settings_keys::CHAT_SYSTEM_PROMPT)? {
            settings.chat_system_prompt = value;
        }
        if let Some(value) = store.get(settings_keys::MODEL)? {
            settings.model = value;
        }
        if let Some(value) = store.get(settings_keys::LANGUAGE)? {
            settings.language = Language::from_code(&value);
        }
        Ok(settings)
    }

    pub fn save_api_key(&mut self, store: &LocalStore, value: &str) -> Result<()> {
        self.api_key = value.to_string();
        store.set(settings_keys::API_KEY, value)
    }

    pub fn save_system_prompt(&mut self, store: &LocalStore, value: &str) -> Result<()> {
        self.system_prompt = value.to_string();
        store.set(settings_keys::SYSTEM_PROMPT, value)
    }

    pub fn save_chat_system_prompt(&mut self, store: &LocalStore, value: &str) -> Result<()> {
        self.chat_system_prompt = value.to_string();
        store.set(settings_keys::CHAT_SYSTEM_PROMPT, value)
    }

    pub fn save_model(&mut self, store: &LocalStore, value: &str) -> Result<()> {
        self.model = value.to_string();
        store.set(settings_keys::MODEL, value)
    }

    pub fn save_language(&mut self, store: &LocalStore, language: Language) -> Result<()> {
        self.language = language;
        store.set(settings_keys::LANGUAGE, language.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_round_trip() {
        let store = LocalStore::in_memory().unwrap();
        let mut settings = Settings::load(&store).unwrap();
        assert!(settings.api_key.is_empty());
        assert_eq!(settings.language, Language::Jp);

        settings.save_api_key(&store, "key-123").unwrap();
        settings.save_model(&store, "gemini-2.5-pro").unwrap();
        settings.save_language(&store, Language::En).unwrap();

        let reloaded = Settings::load(&store).unwrap();
        assert_eq!(reloaded.api_key, "key-123");
        assert_eq!(reloaded.model, "gemini-2.5-pro");
        assert_eq!(reloaded.language, Language::En);
    }

    #[test]
    fn test_unknown_language_code_reads_as_english() {
        let store = LocalStore::in_memory().unwrap();
        store.set(settings_keys::LANGUAGE, "fr").unwrap();
        let settings = Settings::load(&store).unwrap();
        assert_eq!(settings.language, Language::En);
    }
}
