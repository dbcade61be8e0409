use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Versioned storage key; bump it when the saved shape changes.
pub const SAVE_KEY: &str = "2MarsChronicaMartis_Save_v3";

/// Single local snapshot blob, written on explicit save, plus the server
/// session cookie it belongs to.
#[derive(Debug, Clone)]
pub struct SaveSlot {
    path: PathBuf,
    session_path: PathBuf,
}

impl SaveSlot {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{SAVE_KEY}.json")),
            session_path: dir.as_ref().join(format!("{SAVE_KEY}.session")),
        }
    }

    pub fn default_location() -> Self {
        let mut dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.push("mars_chronica");
        Self::in_dir(dir)
    }

    #[cfg(test)]
    fn path(&self) -> &Path {
        &self.path
    }

    /// Refuses documents without a `player_id`; they could never be loaded back.
    pub fn write(&self, document: &Map<String, Value>) -> Result<()> {
        if !has_identity(document) {
            bail!("game state has no player id; nothing to save");
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating save directory {}", parent.display()))?;
        }

        let json = serde_json::to_string(document)?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing save {}", self.path.display()))?;

        info!(path = %self.path.display(), "game saved locally");
        Ok(())
    }

    /// Malformed blobs are removed and reported as absent.
    pub fn load(&self) -> Option<Map<String, Value>> {
        let text = fs::read_to_string(&self.path).ok()?;

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(doc)) if has_identity(&doc) => {
                debug!(path = %self.path.display(), "local save found");
                Some(doc)
            }
            _ => {
                warn!(path = %self.path.display(), "discarding malformed local save");
                self.clear();
                None
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.load().is_some()
    }

    /// Without the session cookie the server cannot match a saved game to its player.
    pub fn write_session(&self, cookie: &str) -> Result<()> {
        if let Some(parent) = self.session_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating save directory {}", parent.display()))?;
        }
        fs::write(&self.session_path, cookie)
            .with_context(|| format!("writing session {}", self.session_path.display()))?;

        debug!(path = %self.session_path.display(), "server session stored");
        Ok(())
    }

    pub fn load_session(&self) -> Option<String> {
        let cookie = fs::read_to_string(&self.session_path).ok()?;
        let cookie = cookie.trim();
        (!cookie.is_empty()).then(|| cookie.to_string())
    }

    /// Removes the save and its session.
    pub fn clear(&self) {
        remove(&self.path, "local save");
        remove(&self.session_path, "server session");
    }
}

fn remove(path: &Path, what: &str) {
    match fs::remove_file(path) {
        Ok(()) => info!(path = %path.display(), "{what} removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove {what}"),
    }
}

fn has_identity(doc: &Map<String, Value>) -> bool {
    matches!(doc.get("player_id"), Some(Value::String(id)) if !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_slot(tag: &str) -> SaveSlot {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("mars-chronica-save-{tag}-{nanos}"));
        SaveSlot::in_dir(dir)
    }

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn write_then_load_round_trips() {
        let slot = temp_slot("roundtrip");
        let saved = doc(json!({ "player_id": "p1", "current_turn": 7 }));
        slot.write(&saved).unwrap();

        assert_eq!(slot.load(), Some(saved));
        assert!(slot.is_available());
        slot.clear();
        assert!(!slot.is_available());
    }

    #[test]
    fn session_is_kept_beside_the_save_and_cleared_with_it() {
        let slot = temp_slot("session");
        assert_eq!(slot.load_session(), None);

        slot.write(&doc(json!({ "player_id": "p1" }))).unwrap();
        slot.write_session("session=abc123\n").unwrap();
        assert_eq!(slot.load_session().as_deref(), Some("session=abc123"));

        slot.clear();
        assert_eq!(slot.load_session(), None);
        assert!(!slot.is_available());
    }

    #[test]
    fn refuses_to_write_without_player_id() {
        let slot = temp_slot("noid");
        assert!(slot.write(&doc(json!({ "current_turn": 1 }))).is_err());
        assert!(!slot.path().exists());
    }

    #[test]
    fn malformed_blob_is_discarded_silently() {
        let slot = temp_slot("garbage");
        fs::create_dir_all(slot.path().parent().unwrap()).unwrap();
        fs::write(slot.path(), "{not json").unwrap();

        assert!(slot.load().is_none());
        assert!(!slot.path().exists());
    }

    #[test]
    fn blob_missing_identity_is_discarded() {
        let slot = temp_slot("anon");
        fs::create_dir_all(slot.path().parent().unwrap()).unwrap();
        fs::write(slot.path(), r#"{"current_turn": 3}"#).unwrap();

        assert!(!slot.is_available());
        assert!(!slot.path().exists());
    }
}
