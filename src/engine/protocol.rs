use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use thiserror::Error;

pub type RequestId = u64;

/// Everything the client can ask of the server.
#[derive(Debug, Clone, PartialEq)]
pub enum GameAction {
    FetchState,
    AdvanceTurn,
    Build { blueprint_id: String, q: i32, r: i32 },
    Upgrade { blueprint_id: String, habitat_id: String },
    StartResearch { tech_id: String },
    CancelResearch { tech_id: String },
    ExploreHex { q: i32, r: i32 },
    SpendAttributePoint { attribute_name: String },
    AcquireBonus { bonus_id: String },
    StartGame(NewGameForm),
    ResetGame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    FetchState,
    AdvanceTurn,
    Build,
    Upgrade,
    StartResearch,
    CancelResearch,
    ExploreHex,
    SpendAttributePoint,
    AcquireBonus,
    StartGame,
    ResetGame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    PostJson,
    PostForm,
}

/// Fields of the server's `/start_game` form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewGameForm {
    pub player_name: String,
    pub faction_id: String,
    pub choice: CharacterChoice,
}

/// Attribute points a custom commander must distribute above the base of 1.
pub const CUSTOM_ATTRIBUTE_POINTS: i64 = 17;
pub const ATTRIBUTE_MIN: i64 = 1;
pub const ATTRIBUTE_MAX: i64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum CharacterChoice {
    /// Server-side character id, e.g. `commander_shepard`
    Predefined(String),
    Custom(CustomCommander),
}

impl Default for CharacterChoice {
    fn default() -> Self {
        CharacterChoice::Predefined(String::new())
    }
}

/// A commander built on the setup form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomCommander {
    pub name: String,
    /// Keyed by attribute enum name, e.g. `STRENGTH`
    pub attributes: BTreeMap<String, i64>,
    pub bonus_id: String,
}

impl CustomCommander {
    /// Points spent above the base value of every attribute.
    pub fn points_spent(&self) -> i64 {
        self.attributes.values().map(|v| v - ATTRIBUTE_MIN).sum()
    }

    fn attributes_valid(&self) -> bool {
        !self.attributes.is_empty()
            && self
                .attributes
                .values()
                .all(|v| (ATTRIBUTE_MIN..=ATTRIBUTE_MAX).contains(v))
            && self.points_spent() == CUSTOM_ATTRIBUTE_POINTS
    }
}

impl NewGameForm {
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("player_name".to_string(), self.player_name.trim().to_string()),
            ("factionId".to_string(), self.faction_id.trim().to_string()),
        ];
        match &self.choice {
            CharacterChoice::Predefined(id) => {
                fields.push(("character_choice_type".to_string(), "predefined".to_string()));
                fields.push(("character_selection".to_string(), id.trim().to_string()));
            }
            CharacterChoice::Custom(custom) => {
                fields.push(("character_choice_type".to_string(), "custom".to_string()));
                fields.push(("character_selection".to_string(), custom.name.trim().to_string()));
                for (attr, value) in &custom.attributes {
                    fields.push((format!("custom_attr_{attr}"), value.to_string()));
                }
                fields.push(("custom_char_bonus_id".to_string(), custom.bonus_id.clone()));
            }
        }
        fields
    }

    /// Names of required fields left empty or invalid.
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.player_name.trim().is_empty() {
            missing.push("game name".to_string());
        }
        if self.faction_id.trim().is_empty() {
            missing.push("faction".to_string());
        }
        match &self.choice {
            CharacterChoice::Predefined(id) => {
                if id.trim().is_empty() {
                    missing.push("character".to_string());
                }
            }
            CharacterChoice::Custom(custom) => {
                if custom.name.trim().is_empty() {
                    missing.push("character".to_string());
                }
                if !custom.attributes_valid() {
                    missing.push(format!(
                        "attributes ({} of {CUSTOM_ATTRIBUTE_POINTS} points used)",
                        custom.points_spent()
                    ));
                }
                if custom.bonus_id.is_empty() {
                    missing.push("starting bonus".to_string());
                }
            }
        }
        missing
    }
}

impl GameAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            GameAction::FetchState => ActionKind::FetchState,
            GameAction::AdvanceTurn => ActionKind::AdvanceTurn,
            GameAction::Build { .. } => ActionKind::Build,
            GameAction::Upgrade { .. } => ActionKind::Upgrade,
            GameAction::StartResearch { .. } => ActionKind::StartResearch,
            GameAction::CancelResearch { .. } => ActionKind::CancelResearch,
            GameAction::ExploreHex { .. } => ActionKind::ExploreHex,
            GameAction::SpendAttributePoint { .. } => ActionKind::SpendAttributePoint,
            GameAction::AcquireBonus { .. } => ActionKind::AcquireBonus,
            GameAction::StartGame(_) => ActionKind::StartGame,
            GameAction::ResetGame => ActionKind::ResetGame,
        }
    }

    pub fn method(&self) -> Method {
        match self {
            GameAction::FetchState => Method::Get,
            GameAction::StartGame(_) => Method::PostForm,
            _ => Method::PostJson,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            GameAction::FetchState => "/api/game_state",
            GameAction::AdvanceTurn => "/api/action/next_turn",
            GameAction::Build { .. } => "/api/action/build",
            GameAction::Upgrade { .. } => "/api/action/upgrade",
            GameAction::StartResearch { .. } => "/api/action/research",
            GameAction::CancelResearch { .. } => "/api/action/cancel_research",
            GameAction::ExploreHex { .. } => "/api/action/explore_hex",
            GameAction::SpendAttributePoint { .. } => "/api/action/character_spend_ap",
            GameAction::AcquireBonus { .. } => "/api/action/character_acquire_bonus",
            GameAction::StartGame(_) => "/start_game",
            GameAction::ResetGame => "/api/admin/reset_game",
        }
    }

    /// JSON body for `PostJson` actions that carry one.
    pub fn body(&self) -> Option<Value> {
        match self {
            GameAction::Build { blueprint_id, q, r } => {
                Some(json!({ "blueprint_id": blueprint_id, "q": q, "r": r }))
            }
            GameAction::Upgrade { blueprint_id, habitat_id } => {
                Some(json!({ "blueprint_id": blueprint_id, "habitat_id": habitat_id }))
            }
            GameAction::StartResearch { tech_id } | GameAction::CancelResearch { tech_id } => {
                Some(json!({ "tech_id": tech_id }))
            }
            GameAction::ExploreHex { q, r } => Some(json!({ "q": q, "r": r })),
            GameAction::SpendAttributePoint { attribute_name } => {
                Some(json!({ "attribute_name": attribute_name }))
            }
            GameAction::AcquireBonus { bonus_id } => Some(json!({ "bonus_id": bonus_id })),
            GameAction::FetchState
            | GameAction::AdvanceTurn
            | GameAction::StartGame(_)
            | GameAction::ResetGame => None,
        }
    }

    /// Replies to these carry game state to merge.
    pub fn returns_state(&self) -> bool {
        !matches!(self, GameAction::StartGame(_) | GameAction::ResetGame)
    }
}

/// Decoded 2xx reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionReply {
    /// State to merge; `None` for replies that carry no game state.
    pub state: Option<Value>,
    pub event_messages: Vec<String>,
    pub message: Option<String>,
    /// Session cookie the server handed out, for replies that open a session.
    pub session: Option<String>,
}

/// Keys that describe the reply itself rather than game state.
const TRANSPORT_KEYS: [&str; 3] = ["event_messages", "message", "error"];

impl ActionReply {
    /// Accepts both `{game_state: {...}, ...}` and a bare snapshot.
    pub fn from_body(action: &GameAction, body: Value) -> Result<Self, ApiError> {
        let Value::Object(mut body) = body else {
            return Err(ApiError::Malformed("reply is not a JSON object".to_string()));
        };

        let event_messages = match body.remove("event_messages") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        let state = if action.returns_state() {
            match body.remove("game_state") {
                Some(Value::Object(state)) => Some(Value::Object(state)),
                Some(_) => {
                    return Err(ApiError::Malformed("`game_state` is not an object".to_string()))
                }
                None => {
                    let mut state: Map<String, Value> = body;
                    for key in TRANSPORT_KEYS {
                        state.remove(key);
                    }
                    Some(Value::Object(state))
                }
            }
        } else {
            None
        };

        Ok(Self {
            state,
            event_messages,
            message,
            session: None,
        })
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("session invalid or game not found (HTTP {status})")]
    SessionExpired { status: u16 },
    #[error("unexpected server reply: {0}")]
    Malformed(String),
}

pub enum EngineCommand {
    Request { id: RequestId, action: GameAction },
    Shutdown,
}

pub struct EngineResponse {
    pub id: RequestId,
    pub action: GameAction,
    pub outcome: Result<ActionReply, ApiError>,
}
