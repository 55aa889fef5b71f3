//! The game state container.
//!
//! `GameState` holds the three ordered sequences that make up a run: the
//! narrative game log, the research log and the inventory. Order within each
//! sequence is the story's timeline and is preserved through save/load.

use crate::entry::{
    GameLogCategory, GameLogEntry, InventoryItem, ResearchCategory, ResearchLogEntry,
};
use crate::persist::{write_atomic, PersistError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

/// State shared between the session and the tools that mutate it.
pub type SharedState = Arc<Mutex<GameState>>;

/// Outcome of an inventory mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemChange {
    Added,
    AlreadyPresent,
    Removed(InventoryItem),
    NotFound,
}

/// Structured game state: logs plus inventory.
///
/// Item names are unique among the current items. A removed item's name may
/// be added again later.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(default)]
    pub game_log: Vec<GameLogEntry>,

    #[serde(default)]
    pub research_log: Vec<ResearchLogEntry>,

    #[serde(default)]
    pub items: Vec<InventoryItem>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap this state for sharing with tools and a session.
    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    /// Append a game-log entry stamped with the current time.
    pub fn log_event(&mut self, category: GameLogCategory, text: impl Into<String>) -> &GameLogEntry {
        self.game_log.push(GameLogEntry::new(category, text));
        &self.game_log[self.game_log.len() - 1]
    }

    /// Append a research-log entry stamped with the current time.
    pub fn log_research(
        &mut self,
        category: ResearchCategory,
        text: impl Into<String>,
    ) -> &ResearchLogEntry {
        self.research_log.push(ResearchLogEntry::new(category, text));
        &self.research_log[self.research_log.len() - 1]
    }

    /// Add an item unless one with the same name is already held.
    pub fn add_item(&mut self, name: impl Into<String>, description: impl Into<String>) -> ItemChange {
        let name = name.into();
        if self.has_item(&name) {
            return ItemChange::AlreadyPresent;
        }
        self.items.push(InventoryItem::new(name, description));
        ItemChange::Added
    }

    /// Remove the first item with exactly this name.
    pub fn remove_item(&mut self, name: &str) -> ItemChange {
        match self.items.iter().position(|it| it.name == name) {
            Some(index) => ItemChange::Removed(self.items.remove(index)),
            None => ItemChange::NotFound,
        }
    }

    pub fn has_item(&self, name: &str) -> bool {
        self.items.iter().any(|it| it.name == name)
    }

    pub fn item(&self, name: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|it| it.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.game_log.is_empty() && self.research_log.is_empty() && self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.game_log.clear();
        self.research_log.clear();
        self.items.clear();
    }

    // ---------- conversion ----------

    /// Plain JSON value with the `game_log`, `research_log` and `items` keys.
    pub fn to_value(&self) -> Value {
        json!({
            "game_log": self.game_log,
            "research_log": self.research_log,
            "items": self.items,
        })
    }

    /// Rebuild a state from a value shaped like [`to_value`](Self::to_value).
    ///
    /// Parsing is strict: unknown categories fail, and so does an inventory
    /// that lists the same item name twice. Missing top-level keys are
    /// treated as empty sequences.
    pub fn from_value(value: Value) -> Result<Self, PersistError> {
        let state: GameState = serde_json::from_value(value)?;
        state.check_unique_items()?;
        Ok(state)
    }

    pub fn to_json_string(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, PersistError> {
        let state: GameState = serde_json::from_str(content)?;
        state.check_unique_items()?;
        Ok(state)
    }

    fn check_unique_items(&self) -> Result<(), PersistError> {
        let mut seen = HashSet::new();
        for item in &self.items {
            if !seen.insert(item.name.as_str()) {
                return Err(PersistError::DuplicateItem {
                    name: item.name.clone(),
                });
            }
        }
        Ok(())
    }

    // ---------- file I/O ----------

    /// Write the state as indented JSON, creating parent directories.
    ///
    /// The file is replaced by rename, so a concurrent reader sees either the
    /// previous save or this one.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = self.to_json_string()?;
        write_atomic(path.as_ref(), &content).await
    }

    /// Read a state previously written by [`save_json`](Self::save_json).
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PersistError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_state() -> GameState {
        let mut state = GameState::new();
        state.log_event(GameLogCategory::Event, "Door kicked open");
        state.log_event(GameLogCategory::Ambient, "Sirens in the distance");
        state.log_research(ResearchCategory::Technical, "Keycards use 13.56 MHz");
        state.add_item("keycard", "Blue access card");
        state.add_item("phone", "");
        state
    }

    #[test]
    fn test_add_item_rejects_duplicates() {
        let mut state = GameState::new();
        assert_eq!(state.add_item("flashlight", "dim beam"), ItemChange::Added);
        assert_eq!(state.add_item("flashlight", "other"), ItemChange::AlreadyPresent);
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].description, "dim beam");
    }

    #[test]
    fn test_removed_name_can_be_added_again() {
        let mut state = GameState::new();
        state.add_item("keycard", "");
        assert!(matches!(state.remove_item("keycard"), ItemChange::Removed(_)));
        assert_eq!(state.add_item("keycard", "found it again"), ItemChange::Added);
        assert_eq!(state.item("keycard").unwrap().description, "found it again");
    }

    #[test]
    fn test_remove_missing_item_is_not_an_error() {
        let mut state = GameState::new();
        state.add_item("phone", "");
        assert_eq!(state.remove_item("ghost"), ItemChange::NotFound);
        assert_eq!(state.items.len(), 1);
    }

    #[test]
    fn test_to_value_shape() {
        let value = sample_state().to_value();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(value["game_log"][0]["entry"], "Door kicked open");
        assert_eq!(value["game_log"][1]["category"], "ambient");
        assert!(value["game_log"][0]["ts"].is_f64());
        assert_eq!(value["research_log"][0]["category"], "technical");
        assert_eq!(value["items"][1], json!({"name": "phone", "description": ""}));
    }

    #[test]
    fn test_value_round_trip() {
        let state = sample_state();
        let restored = GameState::from_value(state.to_value()).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_from_value_tolerates_missing_keys() {
        let state = GameState::from_value(json!({"items": [{"name": "lighter"}]})).unwrap();
        assert!(state.game_log.is_empty());
        assert!(state.research_log.is_empty());
        assert_eq!(state.items[0].name, "lighter");
    }

    #[test]
    fn test_from_value_rejects_unknown_category() {
        let err = GameState::from_value(json!({
            "game_log": [{"category": "rumour", "entry": "x", "ts": 1.0}]
        }))
        .unwrap_err();
        assert!(matches!(err, PersistError::Json(_)));
    }

    #[test]
    fn test_from_value_rejects_duplicate_items() {
        let err = GameState::from_value(json!({
            "items": [{"name": "key"}, {"name": "key"}]
        }))
        .unwrap_err();
        assert!(matches!(err, PersistError::DuplicateItem { ref name } if name == "key"));
    }

    #[tokio::test]
    async fn test_save_creates_parent_dirs_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("runs").join("nested").join("save.json");
        let state = sample_state();

        state.save_json(&path).await.unwrap();
        let loaded = GameState::load_json(&path).await.unwrap();
        assert_eq!(loaded, state);

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_save_is_indented_and_keeps_unicode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("save.json");
        let mut state = GameState::new();
        state.log_event(GameLogCategory::Discovery, "Café receipt — 3:14 AM");
        state.save_json(&path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains('\n'));
        assert!(text.contains("Café receipt — 3:14 AM"));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = GameState::load_json(dir.path().join("nope.json"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_load_invalid_json_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{invalid json").unwrap();
        let err = GameState::load_json(&path).await.unwrap_err();
        assert!(matches!(err, PersistError::Json(_)));
    }
}
