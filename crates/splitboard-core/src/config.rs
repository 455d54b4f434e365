use std::path::{Path, PathBuf};

/// Connection details for the hosted realtime database.
///
/// Presence of this config is what makes the store "connected" — there is
/// no liveness probe, so a configured-but-unreachable backend still takes
/// the remote path and fails per-operation.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
}

impl RemoteConfig {
    /// Read `SPLITBOARD_REMOTE_URL` / `SPLITBOARD_REMOTE_KEY`; both must
    /// be set and non-empty for the remote path to activate.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("SPLITBOARD_REMOTE_URL").ok()?;
        let api_key = std::env::var("SPLITBOARD_REMOTE_KEY").ok()?;
        if base_url.trim().is_empty() || api_key.trim().is_empty() {
            return None;
        }
        Some(Self { base_url, api_key })
    }
}

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub remote: Option<RemoteConfig>,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            remote: RemoteConfig::from_env(),
        }
    }

    pub fn local_only<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            remote: None,
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new("splitboard_data")
    }
}
