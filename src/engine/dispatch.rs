use std::collections::HashMap;
use std::sync::mpsc::Sender;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::engine::protocol::{
    ActionKind, ApiError, EngineCommand, EngineResponse, GameAction, NewGameForm, RequestId,
};
use crate::engine::store::StateStore;
use crate::model::game_state::{GameStateSnapshot, HexCoord};

/// Lifecycle of one action kind. `Succeeded`/`Failed` are idle for dispatch purposes.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchState {
    Idle,
    Sending { id: RequestId },
    Succeeded,
    Failed(String),
}

/// A precondition failed; nothing was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("{} already in progress...", busy_label(.0))]
    AlreadySending(ActionKind),
    #[error("Select a hex on the map to build.")]
    NoHexSelected,
    #[error("Player state is not valid. Cannot {0}.")]
    UnknownPlayer(&'static str),
    #[error("A research project is already running. Cancel it before starting a new one.")]
    ResearchInProgress,
    #[error("Invalid technology id.")]
    MissingTechId,
    #[error("No valid primary habitat found for the upgrade.")]
    NoHabitat,
    #[error("No attribute points available.")]
    NoAttributePoints,
    #[error("Missing or invalid fields to start: {0}.")]
    IncompleteSetup(String),
    #[error("The network worker is not running.")]
    Disconnected,
}

/// What the UI should show once a reply has been handled.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// State merged; panels must be re-rendered.
    Applied {
        action: GameAction,
        notice: String,
        system_messages: Vec<String>,
    },
    /// Reply carried no state (new game, reset).
    Completed {
        action: GameAction,
        notice: String,
        /// Server session opened by the action, if any
        session: Option<String>,
    },
    Failed { action: GameAction, notice: String },
    SessionExpired,
    /// An older reply arrived after a newer one had been merged.
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub id: RequestId,
    pub progress: String,
}

/// Validates intents, hands them to the network worker and folds replies
/// back into the store. One request per action kind may be in flight.
pub struct Dispatcher {
    tx: Sender<EngineCommand>,
    next_id: RequestId,
    states: HashMap<ActionKind, DispatchState>,
    last_merged: RequestId,
}

impl Dispatcher {
    pub fn new(tx: Sender<EngineCommand>) -> Self {
        Self {
            tx,
            next_id: 0,
            states: HashMap::new(),
            last_merged: 0,
        }
    }

    fn state(&self, kind: ActionKind) -> &DispatchState {
        self.states.get(&kind).unwrap_or(&DispatchState::Idle)
    }

    pub fn is_sending(&self, kind: ActionKind) -> bool {
        matches!(self.state(kind), DispatchState::Sending { .. })
    }

    pub fn fetch_state(&mut self) -> Result<Dispatched, Rejection> {
        self.send(GameAction::FetchState, "Synchronizing with the server...".to_string())
    }

    pub fn advance_turn(&mut self) -> Result<Dispatched, Rejection> {
        self.send(GameAction::AdvanceTurn, "Advancing turn...".to_string())
    }

    pub fn build_building(
        &mut self,
        snapshot: &GameStateSnapshot,
        selected: Option<HexCoord>,
        blueprint_id: &str,
    ) -> Result<Dispatched, Rejection> {
        let coord = selected.ok_or(Rejection::NoHexSelected)?;
        require_player(snapshot, "build")?;

        let name = snapshot.building_display_name(blueprint_id);
        self.send(
            GameAction::Build {
                blueprint_id: blueprint_id.to_string(),
                q: coord.q,
                r: coord.r,
            },
            format!("Starting construction: {name}..."),
        )
    }

    pub fn upgrade_building(
        &mut self,
        snapshot: &GameStateSnapshot,
        blueprint_id: &str,
    ) -> Result<Dispatched, Rejection> {
        let habitat = snapshot.primary_habitat().ok_or(Rejection::NoHabitat)?;

        let name = snapshot.building_display_name(blueprint_id);
        self.send(
            GameAction::Upgrade {
                blueprint_id: blueprint_id.to_string(),
                habitat_id: habitat.id.clone(),
            },
            format!("Starting upgrade: {name}..."),
        )
    }

    pub fn start_research(
        &mut self,
        snapshot: &GameStateSnapshot,
        tech_id: &str,
    ) -> Result<Dispatched, Rejection> {
        if tech_id.is_empty() {
            return Err(Rejection::MissingTechId);
        }
        require_player(snapshot, "research")?;
        if snapshot
            .current_research
            .as_ref()
            .is_some_and(|cr| !cr.tech_id.is_empty())
        {
            return Err(Rejection::ResearchInProgress);
        }

        let name = snapshot.tech_display_name(tech_id);
        self.send(
            GameAction::StartResearch { tech_id: tech_id.to_string() },
            format!("Starting research: {name}..."),
        )
    }

    pub fn cancel_research(
        &mut self,
        snapshot: &GameStateSnapshot,
        tech_id: &str,
    ) -> Result<Dispatched, Rejection> {
        if tech_id.is_empty() {
            return Err(Rejection::MissingTechId);
        }

        let name = snapshot.tech_display_name(tech_id);
        self.send(
            GameAction::CancelResearch { tech_id: tech_id.to_string() },
            format!("Cancelling research: {name}..."),
        )
    }

    pub fn explore_hex(&mut self, coord: HexCoord) -> Result<Dispatched, Rejection> {
        self.send(
            GameAction::ExploreHex { q: coord.q, r: coord.r },
            format!("Sending an exploration team to {coord}..."),
        )
    }

    pub fn spend_attribute_point(
        &mut self,
        snapshot: &GameStateSnapshot,
        attribute_name: &str,
    ) -> Result<Dispatched, Rejection> {
        let points = snapshot
            .character
            .as_ref()
            .map(|c| c.attribute_points_available)
            .unwrap_or(0);
        if points <= 0 {
            return Err(Rejection::NoAttributePoints);
        }

        self.send(
            GameAction::SpendAttributePoint { attribute_name: attribute_name.to_string() },
            format!("Improving {attribute_name}..."),
        )
    }

    pub fn acquire_bonus(&mut self, bonus_id: &str) -> Result<Dispatched, Rejection> {
        self.send(
            GameAction::AcquireBonus { bonus_id: bonus_id.to_string() },
            "Acquiring bonus...".to_string(),
        )
    }

    pub fn start_game(&mut self, form: &NewGameForm) -> Result<Dispatched, Rejection> {
        let missing = form.missing_fields();
        if !missing.is_empty() {
            return Err(Rejection::IncompleteSetup(missing.join(", ")));
        }

        self.send(
            GameAction::StartGame(form.clone()),
            "Starting a new Mars colonization...".to_string(),
        )
    }

    pub fn reset_game(&mut self) -> Result<Dispatched, Rejection> {
        self.send(GameAction::ResetGame, "Resetting the server game state...".to_string())
    }

    fn send(&mut self, action: GameAction, progress: String) -> Result<Dispatched, Rejection> {
        let kind = action.kind();
        if self.is_sending(kind) {
            debug!(?kind, "single-flight guard rejected dispatch");
            return Err(Rejection::AlreadySending(kind));
        }

        let id = self.next_id + 1;
        self.tx
            .send(EngineCommand::Request { id, action })
            .map_err(|_| Rejection::Disconnected)?;

        self.next_id = id;
        self.states.insert(kind, DispatchState::Sending { id });
        Ok(Dispatched { id, progress })
    }

    /// Folds a worker reply into the store. Must run on the UI thread.
    pub fn settle(&mut self, response: EngineResponse, store: &mut StateStore) -> Settlement {
        let EngineResponse { id, action, outcome } = response;
        let kind = action.kind();

        let reply = match outcome {
            Ok(reply) => reply,
            Err(ApiError::SessionExpired { status }) => {
                warn!(status, "session expired");
                self.finish(kind, id, DispatchState::Failed("session expired".to_string()));
                return Settlement::SessionExpired;
            }
            Err(err) => {
                let notice = failure_text(&action, &err);
                warn!(id, ?kind, error = %err, "action failed");
                self.finish(kind, id, DispatchState::Failed(err.to_string()));
                return Settlement::Failed { action, notice };
            }
        };

        let Some(state) = reply.state else {
            self.finish(kind, id, DispatchState::Succeeded);
            let notice = reply
                .message
                .unwrap_or_else(|| default_completion_text(&action));
            return Settlement::Completed {
                action,
                notice,
                session: reply.session,
            };
        };

        if id < self.last_merged {
            info!(id, newest = self.last_merged, ?kind, "dropping stale reply");
            self.finish(kind, id, DispatchState::Succeeded);
            return Settlement::Stale;
        }

        if let Err(err) = store.apply_server_update(&state) {
            warn!(id, ?kind, error = %err, "server payload quarantined");
            self.finish(kind, id, DispatchState::Failed(err.to_string()));
            return Settlement::Failed {
                notice: format!("{} failed: {err}", capitalize(label(kind))),
                action,
            };
        }

        self.last_merged = id;
        self.finish(kind, id, DispatchState::Succeeded);

        let notice = success_text(&action, store.snapshot(), reply.message.as_deref());
        Settlement::Applied {
            action,
            notice,
            system_messages: reply.event_messages,
        }
    }

    fn finish(&mut self, kind: ActionKind, id: RequestId, next: DispatchState) {
        let current = self.states.get(&kind);
        if matches!(current, Some(DispatchState::Sending { id: sending }) if *sending == id) {
            self.states.insert(kind, next);
        }
    }
}

fn require_player(snapshot: &GameStateSnapshot, verb: &'static str) -> Result<(), Rejection> {
    match snapshot.player_id.as_deref() {
        Some(id) if !id.is_empty() => Ok(()),
        _ => Err(Rejection::UnknownPlayer(verb)),
    }
}

fn label(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::FetchState => "state sync",
        ActionKind::AdvanceTurn => "turn advance",
        ActionKind::Build => "construction",
        ActionKind::Upgrade => "upgrade",
        ActionKind::StartResearch => "research start",
        ActionKind::CancelResearch => "research cancellation",
        ActionKind::ExploreHex => "exploration",
        ActionKind::SpendAttributePoint => "attribute upgrade",
        ActionKind::AcquireBonus => "bonus acquisition",
        ActionKind::StartGame => "new game setup",
        ActionKind::ResetGame => "game reset",
    }
}

fn busy_label(kind: &ActionKind) -> String {
    capitalize(label(*kind))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn failure_text(action: &GameAction, err: &ApiError) -> String {
    let what = label(action.kind());
    match err {
        ApiError::Network(e) => format!("Network error during {what}: {e}"),
        ApiError::Rejected { message, .. } => format!("{} failed: {message}", capitalize(what)),
        ApiError::SessionExpired { .. } => {
            "Session invalid or game not found. Returning to the start screen.".to_string()
        }
        ApiError::Malformed(e) => format!("{} failed: {e}", capitalize(what)),
    }
}

fn default_completion_text(action: &GameAction) -> String {
    match action {
        GameAction::ResetGame => "Game state reset.".to_string(),
        _ => format!("{} completed.", capitalize(label(action.kind()))),
    }
}

fn success_text(action: &GameAction, snapshot: &GameStateSnapshot, message: Option<&str>) -> String {
    match action {
        GameAction::FetchState => "Synchronization complete.".to_string(),
        GameAction::AdvanceTurn => format!(
            "Turn {} completed. Year: {}",
            snapshot.turn.map_or("?".to_string(), |t| t.to_string()),
            snapshot.year.map_or("?".to_string(), |y| y.to_string()),
        ),
        GameAction::Build { blueprint_id, .. } => {
            format!("{} built successfully!", snapshot.building_display_name(blueprint_id))
        }
        GameAction::Upgrade { blueprint_id, .. } => {
            format!("{} upgraded successfully!", snapshot.building_display_name(blueprint_id))
        }
        GameAction::StartResearch { tech_id } => {
            format!("Research on {} started!", snapshot.tech_display_name(tech_id))
        }
        GameAction::CancelResearch { tech_id } => {
            format!("Research on {} cancelled.", snapshot.tech_display_name(tech_id))
        }
        GameAction::ExploreHex { q, r } => message
            .map(str::to_string)
            .unwrap_or_else(|| format!("Exploration of ({q}, {r}) complete!")),
        GameAction::SpendAttributePoint { attribute_name } => {
            format!("Attribute point spent on {attribute_name}.")
        }
        GameAction::AcquireBonus { .. } => message
            .map(str::to_string)
            .unwrap_or_else(|| "Bonus acquired.".to_string()),
        GameAction::StartGame(_) | GameAction::ResetGame => {
            message.map(str::to_string).unwrap_or_else(|| default_completion_text(action))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::protocol::{ActionReply, CharacterChoice};
    use serde_json::json;
    use std::sync::mpsc::{self, Receiver};

    fn dispatcher() -> (Dispatcher, Receiver<EngineCommand>) {
        let (tx, rx) = mpsc::channel();
        (Dispatcher::new(tx), rx)
    }

    fn player_snapshot() -> GameStateSnapshot {
        GameStateSnapshot {
            player_id: Some("p1".into()),
            ..Default::default()
        }
    }

    fn sent(rx: &Receiver<EngineCommand>) -> Vec<(RequestId, GameAction)> {
        rx.try_iter()
            .filter_map(|c| match c {
                EngineCommand::Request { id, action } => Some((id, action)),
                EngineCommand::Shutdown => None,
            })
            .collect()
    }

    fn ok_reply(id: RequestId, action: GameAction, state: serde_json::Value) -> EngineResponse {
        EngineResponse {
            id,
            action,
            outcome: Ok(ActionReply { state: Some(state), ..Default::default() }),
        }
    }

    #[test]
    fn second_turn_advance_is_rejected_while_pending() {
        let (mut d, rx) = dispatcher();

        let first = d.advance_turn().unwrap();
        assert_eq!(d.advance_turn(), Err(Rejection::AlreadySending(ActionKind::AdvanceTurn)));

        assert_eq!(sent(&rx), vec![(first.id, GameAction::AdvanceTurn)]);
        assert_eq!(d.state(ActionKind::AdvanceTurn), &DispatchState::Sending { id: first.id });
    }

    #[test]
    fn turn_advance_is_allowed_again_after_settling() {
        let (mut d, rx) = dispatcher();
        let mut store = StateStore::new();

        let first = d.advance_turn().unwrap();
        let settlement = d.settle(
            ok_reply(first.id, GameAction::AdvanceTurn, json!({ "current_turn": 2, "current_year": 2091 })),
            &mut store,
        );

        assert!(matches!(
            settlement,
            Settlement::Applied { ref notice, .. } if notice == "Turn 2 completed. Year: 2091"
        ));
        assert!(d.advance_turn().is_ok());
        assert_eq!(sent(&rx).len(), 2);
    }

    #[test]
    fn build_requires_selection_and_player() {
        let (mut d, rx) = dispatcher();

        assert_eq!(
            d.build_building(&player_snapshot(), None, "SolarArrayMk1"),
            Err(Rejection::NoHexSelected)
        );
        assert_eq!(
            d.build_building(&GameStateSnapshot::default(), Some(HexCoord::ORIGIN), "SolarArrayMk1"),
            Err(Rejection::UnknownPlayer("build"))
        );
        assert!(sent(&rx).is_empty());

        d.build_building(&player_snapshot(), Some(HexCoord::new(1, 2)), "SolarArrayMk1")
            .unwrap();
        assert_eq!(
            sent(&rx)[0].1,
            GameAction::Build { blueprint_id: "SolarArrayMk1".into(), q: 1, r: 2 }
        );
    }

    #[test]
    fn research_slot_is_exclusive() {
        let (mut d, rx) = dispatcher();
        let mut snapshot = player_snapshot();
        snapshot.current_research = Some(crate::model::game_state::CurrentResearch {
            tech_id: "t1".into(),
            ..Default::default()
        });

        assert_eq!(d.start_research(&snapshot, "t2"), Err(Rejection::ResearchInProgress));
        assert_eq!(d.start_research(&player_snapshot(), ""), Err(Rejection::MissingTechId));
        assert!(sent(&rx).is_empty());
    }

    #[test]
    fn upgrade_needs_a_primary_habitat() {
        let (mut d, rx) = dispatcher();
        assert_eq!(
            d.upgrade_building(&player_snapshot(), "ResearchLab"),
            Err(Rejection::NoHabitat)
        );
        assert!(sent(&rx).is_empty());
    }

    #[test]
    fn failure_leaves_store_untouched() {
        let (mut d, _rx) = dispatcher();
        let mut store = StateStore::new();
        store.apply_server_update(&json!({ "current_turn": 5 })).unwrap();
        let before = store.document().clone();

        let dispatched = d.explore_hex(HexCoord::new(1, 0)).unwrap();
        let settlement = d.settle(
            EngineResponse {
                id: dispatched.id,
                action: GameAction::ExploreHex { q: 1, r: 0 },
                outcome: Err(ApiError::Rejected { status: 400, message: "Too far".into() }),
            },
            &mut store,
        );

        assert!(matches!(
            settlement,
            Settlement::Failed { ref notice, .. } if notice == "Exploration failed: Too far"
        ));
        assert_eq!(store.document(), &before);
        assert!(matches!(d.state(ActionKind::ExploreHex), DispatchState::Failed(_)));
    }

    #[test]
    fn older_reply_does_not_overwrite_newer_state() {
        let (mut d, _rx) = dispatcher();
        let mut store = StateStore::new();
        let snapshot = player_snapshot();

        let build = d
            .build_building(&snapshot, Some(HexCoord::ORIGIN), "SolarArrayMk1")
            .unwrap();
        let research = d.start_research(&snapshot, "t1").unwrap();

        let newer = d.settle(
            ok_reply(research.id, GameAction::StartResearch { tech_id: "t1".into() }, json!({ "current_turn": 9 })),
            &mut store,
        );
        assert!(matches!(newer, Settlement::Applied { .. }));

        let older = d.settle(
            ok_reply(
                build.id,
                GameAction::Build { blueprint_id: "SolarArrayMk1".into(), q: 0, r: 0 },
                json!({ "current_turn": 8 }),
            ),
            &mut store,
        );
        assert_eq!(older, Settlement::Stale);
        assert_eq!(store.snapshot().turn, Some(9));
        assert!(!d.is_sending(ActionKind::Build));
    }

    #[test]
    fn session_expiry_is_reported_without_merging() {
        let (mut d, _rx) = dispatcher();
        let mut store = StateStore::new();

        let fetch = d.fetch_state().unwrap();
        assert_eq!(d.fetch_state(), Err(Rejection::AlreadySending(ActionKind::FetchState)));

        let settlement = d.settle(
            EngineResponse {
                id: fetch.id,
                action: GameAction::FetchState,
                outcome: Err(ApiError::SessionExpired { status: 401 }),
            },
            &mut store,
        );
        assert_eq!(settlement, Settlement::SessionExpired);
        assert!(store.document().is_empty());
    }

    #[test]
    fn malformed_payload_is_reported_as_failure() {
        let (mut d, _rx) = dispatcher();
        let mut store = StateStore::new();

        let fetch = d.fetch_state().unwrap();
        let settlement = d.settle(ok_reply(fetch.id, GameAction::FetchState, json!({ "events": 3 })), &mut store);

        assert!(matches!(settlement, Settlement::Failed { .. }));
        assert!(store.document().is_empty());
    }

    #[test]
    fn reset_reply_completes_with_server_message() {
        let (mut d, _rx) = dispatcher();
        let mut store = StateStore::new();

        let reset = d.reset_game().unwrap();
        let settlement = d.settle(
            EngineResponse {
                id: reset.id,
                action: GameAction::ResetGame,
                outcome: Ok(ActionReply { message: Some("Global game state reset.".into()), ..Default::default() }),
            },
            &mut store,
        );
        assert_eq!(
            settlement,
            Settlement::Completed {
                action: GameAction::ResetGame,
                notice: "Global game state reset.".into(),
                session: None,
            }
        );
    }

    #[test]
    fn new_game_completion_carries_the_session() {
        let (mut d, _rx) = dispatcher();
        let mut store = StateStore::new();
        let form = NewGameForm {
            player_name: "Ares".into(),
            faction_id: "MUSK_CORP".into(),
            choice: CharacterChoice::Predefined("commander_shepard".into()),
        };

        let start = d.start_game(&form).unwrap();
        let settlement = d.settle(
            EngineResponse {
                id: start.id,
                action: GameAction::StartGame(form),
                outcome: Ok(ActionReply { session: Some("session=s1".into()), ..Default::default() }),
            },
            &mut store,
        );

        assert!(matches!(
            settlement,
            Settlement::Completed { session: Some(ref s), .. } if s == "session=s1"
        ));
        assert!(!d.is_sending(ActionKind::StartGame));
    }

    #[test]
    fn rejection_messages_read_naturally() {
        assert_eq!(
            Rejection::AlreadySending(ActionKind::AdvanceTurn).to_string(),
            "Turn advance already in progress..."
        );
    }

    #[test]
    fn closed_worker_is_reported() {
        let (mut d, rx) = dispatcher();
        drop(rx);
        assert_eq!(d.advance_turn(), Err(Rejection::Disconnected));
        assert!(!d.is_sending(ActionKind::AdvanceTurn));
    }
}
