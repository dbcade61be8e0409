use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::model::catalog::Catalog;
use crate::model::game_state::GameStateSnapshot;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("server payload is not a JSON object")]
    NotAnObject,
    #[error("server field `{key}` has an unexpected shape: {reason}")]
    InvalidField { key: String, reason: String },
}

/// The client's copy of server state.
///
/// Keeps the raw merged document (so unknown keys survive and can be
/// saved back) next to the typed snapshot the panels read. Static tables
/// from the catalog are filled into the snapshot only, never the document.
#[derive(Debug, Default)]
pub struct StateStore {
    document: Map<String, Value>,
    snapshot: GameStateSnapshot,
    catalog: Arc<Catalog>,
}

impl StateStore {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Arc<Catalog>) -> Self {
        let mut snapshot = GameStateSnapshot::default();
        catalog.fill(&mut snapshot);
        Self {
            document: Map::new(),
            snapshot,
            catalog,
        }
    }

    pub fn snapshot(&self) -> &GameStateSnapshot {
        &self.snapshot
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    pub fn player_id(&self) -> Option<&str> {
        self.snapshot.player_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn reset(&mut self) {
        self.document.clear();
        self.snapshot = GameStateSnapshot::default();
        self.catalog.fill(&mut self.snapshot);
    }

    /// Key-wise shallow merge of a server payload.
    ///
    /// Objects meeting objects merge one level deep, everything else is
    /// replaced. The payload is validated against the typed schema first;
    /// on any error the store is left exactly as it was.
    pub fn apply_server_update(&mut self, partial: &Value) -> Result<(), StoreError> {
        let Value::Object(incoming) = partial else {
            return Err(StoreError::NotAnObject);
        };

        let mut merged = self.document.clone();
        merge_shallow(&mut merged, incoming);

        for key in incoming.keys() {
            validate_field(key, &merged[key])?;
        }

        let mut snapshot: GameStateSnapshot = serde_json::from_value(Value::Object(merged.clone()))
            .map_err(|e| StoreError::InvalidField {
                key: "<document>".to_string(),
                reason: e.to_string(),
            })?;
        self.catalog.fill(&mut snapshot);

        debug!(keys = ?incoming.keys().collect::<Vec<_>>(), "merged server update");
        self.document = merged;
        self.snapshot = snapshot;
        Ok(())
    }
}

fn merge_shallow(current: &mut Map<String, Value>, incoming: &Map<String, Value>) {
    for (key, value) in incoming {
        match (current.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(update)) => {
                for (sub_key, sub_value) in update {
                    existing.insert(sub_key.clone(), sub_value.clone());
                }
            }
            _ => {
                current.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Checks one top-level field in isolation so errors name the offending key.
/// Keys the schema does not know are ignored by the typed parse and pass.
fn validate_field(key: &str, value: &Value) -> Result<(), StoreError> {
    let mut single = Map::new();
    single.insert(key.to_string(), value.clone());

    serde_json::from_value::<GameStateSnapshot>(Value::Object(single))
        .map(|_| ())
        .map_err(|e| StoreError::InvalidField {
            key: key.to_string(),
            reason: e.to_string(),
        })
}
