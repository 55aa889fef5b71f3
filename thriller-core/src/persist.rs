//! Save-file persistence for the game state.
//!
//! Every save and load resolves its path through [`resolve_save_path`]:
//! an explicit path wins, then the `THRILLER_SAVE_PATH` environment
//! variable, then [`DEFAULT_SAVE_PATH`]. The environment is read on each
//! call, so tests and deployments can redirect saves without code changes.

use crate::state::{GameState, SharedState};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Environment variable that overrides the default save path.
pub const SAVE_PATH_ENV: &str = "THRILLER_SAVE_PATH";

/// Save path used when neither an explicit path nor the environment names one.
pub const DEFAULT_SAVE_PATH: &str = "assets/sample_runs/session_latest.json";

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No saved game found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Duplicate inventory item in save: {name}")]
    DuplicateItem { name: String },
}

impl PersistError {
    /// Whether this is the recoverable "no save yet" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PersistError::NotFound { .. })
    }
}

/// Pick the save path: explicit argument, then environment, then default.
pub fn resolve_save_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    match std::env::var(SAVE_PATH_ENV) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_SAVE_PATH),
    }
}

/// Save the shared state to the resolved path and return that path.
///
/// The state lock is held only while the snapshot is serialized.
pub async fn save_state(state: &SharedState, path: Option<&Path>) -> Result<PathBuf, PersistError> {
    let resolved = resolve_save_path(path);
    let content = state.lock().await.to_json_string()?;
    write_atomic(&resolved, &content).await?;
    debug!(path = %resolved.display(), "state saved");
    Ok(resolved)
}

/// Replace the shared state's content with the save at the resolved path.
///
/// Fails with [`PersistError::NotFound`] when there is no save, which
/// callers treat as "start fresh". A malformed save is a hard error and the
/// in-memory state is left untouched.
pub async fn load_state(state: &SharedState, path: Option<&Path>) -> Result<PathBuf, PersistError> {
    let resolved = resolve_save_path(path);
    let loaded = GameState::load_json(&resolved).await?;

    info!(
        path = %resolved.display(),
        events = loaded.game_log.len(),
        items = loaded.items.len(),
        "state loaded"
    );

    *state.lock().await = loaded;
    Ok(resolved)
}

/// Save path for a named session inside `base_dir`.
pub fn session_save_path(base_dir: impl AsRef<Path>, session_name: &str) -> PathBuf {
    let sanitized = session_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();
    base_dir.as_ref().join(format!("{sanitized}_session.json"))
}

/// Write `content` to a sibling temp file, then rename it over `path`.
pub(crate) async fn write_atomic(path: &Path, content: &str) -> Result<(), PersistError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).await?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "save".to_string());
    let tmp = parent.join(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

    fs::write(&tmp, content).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}
