use eframe::egui;
use serde_json::Value;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::engine::dispatch::{Dispatched, Dispatcher, Rejection, Settlement};
use crate::engine::protocol::{
    ActionKind, CharacterChoice, CustomCommander, EngineCommand, EngineResponse, GameAction,
    NewGameForm, ATTRIBUTE_MIN,
};
use crate::engine::store::StateStore;
use crate::model::catalog::Catalog;
use crate::model::game_save::SaveSlot;
use crate::model::game_state::HexCoord;
use crate::model::message::{NoticeBoard, NoticeKind};
use crate::model::selection::Selection;
use crate::ui::hex_geometry::HexHitMap;
use crate::ui::settings::UiSettings;
use crate::ui::{center_panel, landing, left_panel, right_panel, settings_io, top_bar};

/// Progress notices stay up until the reply replaces them.
const PROGRESS_LIFETIME: Duration = Duration::from_secs(15);
const SYSTEM_LOG_CAP: usize = 50;

/// Everything a painter can ask for. Painters never touch the store.
#[derive(Debug, Clone, PartialEq)]
pub enum UiIntent {
    SelectHex(HexCoord),
    Deselect,
    AdvanceTurn,
    Resync,
    SaveLocally,
    Build(String),
    Upgrade(String),
    StartResearch(String),
    CancelResearch(String),
    Explore(HexCoord),
    SpendAttributePoint(String),
    AcquireBonus(String),

    ContinueSaved,
    StartGame,
    ResetServer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Landing,
    Game,
}

/* =========================
   Landing form state
   ========================= */

#[derive(Debug, Clone, Default)]
pub struct LandingState {
    pub player_name: String,
    pub faction_id: String,
    pub custom_character: bool,
    pub predefined_id: String,
    pub custom: CustomCommander,
    pub confirm_reset: bool,
}

impl LandingState {
    /// Preselects the first faction, commander and starting bonus; custom
    /// attributes start at their minimum.
    pub fn new(catalog: &Catalog, player_name: Option<String>) -> Self {
        Self {
            player_name: player_name.unwrap_or_default(),
            faction_id: catalog.factions.first().map(|f| f.id.clone()).unwrap_or_default(),
            predefined_id: catalog
                .predefined_characters
                .first()
                .map(|c| c.id.clone())
                .unwrap_or_default(),
            custom: CustomCommander {
                attributes: catalog
                    .attributes
                    .iter()
                    .map(|a| (a.key.clone(), ATTRIBUTE_MIN))
                    .collect(),
                bonus_id: catalog
                    .starting_bonuses()
                    .next()
                    .map(|b| b.id.clone())
                    .unwrap_or_default(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn form(&self) -> NewGameForm {
        NewGameForm {
            player_name: self.player_name.clone(),
            faction_id: self.faction_id.clone(),
            choice: if self.custom_character {
                CharacterChoice::Custom(self.custom.clone())
            } else {
                CharacterChoice::Predefined(self.predefined_id.clone())
            },
        }
    }
}

/* =========================
   App
   ========================= */

pub struct ChronicaApp {
    page: Page,
    store: StateStore,
    selection: Selection,
    dispatcher: Dispatcher,
    hits: HexHitMap,

    notices: NoticeBoard,
    /// Client-side log lines, oldest first
    system_log: Vec<String>,
    needs_initial_selection: bool,

    save: SaveSlot,
    save_available: bool,
    settings: UiSettings,
    /// Settings as last read from or written to disk
    persisted_settings: UiSettings,
    catalog: Arc<Catalog>,
    landing: LandingState,

    cmd_tx: Sender<EngineCommand>,
    resp_rx: Receiver<EngineResponse>,
}

impl ChronicaApp {
    pub fn new(
        cmd_tx: Sender<EngineCommand>,
        resp_rx: Receiver<EngineResponse>,
        save: SaveSlot,
        settings: UiSettings,
        catalog: Arc<Catalog>,
        player_name: Option<String>,
    ) -> Self {
        let save_available = save.is_available();

        Self {
            page: Page::Landing,
            store: StateStore::with_catalog(Arc::clone(&catalog)),
            selection: Selection::default(),
            dispatcher: Dispatcher::new(cmd_tx.clone()),
            hits: HexHitMap::default(),
            notices: NoticeBoard::default(),
            system_log: Vec::new(),
            needs_initial_selection: false,
            save,
            save_available,
            persisted_settings: settings.clone(),
            settings,
            landing: LandingState::new(&catalog, player_name),
            catalog,
            cmd_tx,
            resp_rx,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    fn notify(&mut self, kind: NoticeKind, text: impl Into<String>, now: Instant) {
        let lifetime = match kind {
            NoticeKind::Progress => PROGRESS_LIFETIME,
            _ => self.settings.notice_lifetime(),
        };
        self.notices.show(kind, text, lifetime, now);
    }

    fn push_system(&mut self, line: impl Into<String>) {
        self.system_log.push(line.into());
        if self.system_log.len() > SYSTEM_LOG_CAP {
            let excess = self.system_log.len() - SYSTEM_LOG_CAP;
            self.system_log.drain(..excess);
        }
    }

    fn report(&mut self, result: Result<Dispatched, Rejection>, now: Instant) {
        match result {
            Ok(d) => self.notify(NoticeKind::Progress, d.progress, now),
            Err(rejection) => {
                debug!(%rejection, "intent rejected locally");
                self.notify(NoticeKind::Error, rejection.to_string(), now);
            }
        }
    }

    fn enter_game(&mut self, now: Instant) {
        self.page = Page::Game;
        self.selection.deselect();
        self.needs_initial_selection = true;
        let fetch = self.dispatcher.fetch_state();
        self.report(fetch, now);
    }

    fn leave_game(&mut self) {
        self.page = Page::Landing;
        self.store.reset();
        self.selection.deselect();
        self.system_log.clear();
        self.needs_initial_selection = false;
    }

    pub fn handle_intent(&mut self, intent: UiIntent, now: Instant) {
        let result = match intent {
            UiIntent::SelectHex(coord) => {
                let hits = &self.hits;
                self.selection.select(coord, |c| hits.is_tagged(c));
                return;
            }
            UiIntent::Deselect => {
                self.selection.deselect();
                return;
            }
            UiIntent::SaveLocally => {
                match self.save.write(self.store.document()) {
                    Ok(()) => {
                        self.save_available = true;
                        self.notify(NoticeKind::Success, "Game saved locally.", now);
                    }
                    Err(e) => {
                        warn!(error = %e, "local save failed");
                        self.notify(NoticeKind::Error, format!("Could not save: {e}"), now);
                    }
                }
                return;
            }
            UiIntent::ContinueSaved => {
                self.continue_saved(now);
                return;
            }

            UiIntent::AdvanceTurn => self.dispatcher.advance_turn(),
            UiIntent::Resync => self.dispatcher.fetch_state(),
            UiIntent::Build(id) => {
                self.dispatcher
                    .build_building(self.store.snapshot(), self.selection.selected(), &id)
            }
            UiIntent::Upgrade(id) => self.dispatcher.upgrade_building(self.store.snapshot(), &id),
            UiIntent::StartResearch(id) => {
                self.dispatcher.start_research(self.store.snapshot(), &id)
            }
            UiIntent::CancelResearch(id) => {
                self.dispatcher.cancel_research(self.store.snapshot(), &id)
            }
            UiIntent::Explore(coord) => self.dispatcher.explore_hex(coord),
            UiIntent::SpendAttributePoint(attr) => {
                self.dispatcher
                    .spend_attribute_point(self.store.snapshot(), &attr)
            }
            UiIntent::AcquireBonus(id) => self.dispatcher.acquire_bonus(&id),
            UiIntent::StartGame => self.dispatcher.start_game(&self.landing.form()),
            UiIntent::ResetServer => {
                self.landing.confirm_reset = false;
                self.dispatcher.reset_game()
            }
        };
        self.report(result, now);
    }

    fn continue_saved(&mut self, now: Instant) {
        let Some(document) = self.save.load() else {
            self.save_available = false;
            self.notify(NoticeKind::Error, "No local save found.", now);
            return;
        };

        self.store.reset();
        if let Err(e) = self.store.apply_server_update(&Value::Object(document)) {
            warn!(error = %e, "local save does not match the game schema");
            self.save.clear();
            self.save_available = false;
            self.notify(NoticeKind::Error, format!("Local save is unusable: {e}"), now);
            return;
        }

        info!("continuing from local save");
        self.enter_game(now);
    }

    pub fn handle_response(&mut self, response: EngineResponse, now: Instant) {
        match self.dispatcher.settle(response, &mut self.store) {
            Settlement::Applied {
                action,
                notice,
                system_messages,
            } => {
                self.notify(NoticeKind::Success, notice, now);
                for line in system_messages {
                    self.push_system(line);
                }
                if action == GameAction::FetchState {
                    self.push_system("Game state synchronized with the server.");
                }
                self.refresh_selection();
            }
            Settlement::Completed {
                action,
                notice,
                session,
            } => {
                self.notify(NoticeKind::Success, notice, now);
                match action {
                    GameAction::StartGame(_) => {
                        match session {
                            Some(cookie) => {
                                if let Err(e) = self.save.write_session(&cookie) {
                                    warn!(error = %e, "could not store the server session");
                                }
                            }
                            None => warn!("new game opened no session; it will not survive a restart"),
                        }
                        self.store.reset();
                        self.enter_game(now);
                    }
                    GameAction::ResetGame => {
                        self.save.clear();
                        self.save_available = false;
                        self.leave_game();
                    }
                    _ => {}
                }
            }
            Settlement::Failed { notice, .. } => {
                self.notify(NoticeKind::Error, notice, now);
            }
            Settlement::SessionExpired => {
                if self.page == Page::Game {
                    warn!("server session is gone; returning to landing page");
                    self.save.clear();
                    self.save_available = false;
                    self.leave_game();
                    self.notify(
                        NoticeKind::Error,
                        "Session invalid or game not found. Returning to the start screen.",
                        now,
                    );
                } else {
                    debug!("session expiry already handled");
                }
            }
            Settlement::Stale => self.notices.clear_progress(),
        }
    }

    /// First merge selects the start hex; later merges drop vanished cells.
    fn refresh_selection(&mut self) {
        let snapshot = self.store.snapshot();
        if self.needs_initial_selection {
            if let Some(start) = snapshot.default_selection() {
                self.selection.select(start, |c| snapshot.hex(c).is_some());
                self.needs_initial_selection = false;
            }
        } else {
            self.selection.reconcile(|c| snapshot.hex(c).is_some());
        }
    }

    fn busy(&self) -> bool {
        [
            ActionKind::FetchState,
            ActionKind::AdvanceTurn,
            ActionKind::StartGame,
            ActionKind::ResetGame,
        ]
        .into_iter()
        .any(|k| self.dispatcher.is_sending(k))
    }
}

/* =========================
   egui App
   ========================= */

impl eframe::App for ChronicaApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        ctx.set_pixels_per_point(self.settings.ui_scale);
        let now = Instant::now();

        while let Ok(resp) = self.resp_rx.try_recv() {
            self.handle_response(resp, now);
        }

        let mut intents = Vec::new();
        let notice = self.notices.active(now).cloned();

        match self.page {
            Page::Landing => {
                let busy = self.busy();
                landing::draw_landing(
                    ctx,
                    &mut self.landing,
                    &self.catalog,
                    self.save_available,
                    busy,
                    notice.as_ref(),
                    &mut intents,
                );
            }
            Page::Game => {
                let snapshot = self.store.snapshot();
                top_bar::draw_top_bar(
                    ctx,
                    snapshot,
                    notice.as_ref(),
                    self.dispatcher.is_sending(ActionKind::AdvanceTurn),
                    &mut self.settings,
                    &mut intents,
                );
                left_panel::draw_left_panel(ctx, snapshot, &mut intents);
                right_panel::draw_right_panel(ctx, snapshot, &self.system_log, &mut intents);
                center_panel::draw_center_panel(
                    ctx,
                    snapshot,
                    &self.selection,
                    &mut self.hits,
                    &mut self.settings.map_zoom,
                    &mut intents,
                );
            }
        }

        for intent in intents {
            self.handle_intent(intent, now);
        }

        // replies arrive on a channel, not as input events
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

impl Drop for ChronicaApp {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        if self.settings != self.persisted_settings {
            if let Err(e) = settings_io::save_settings(&self.settings) {
                error!(error = %e, "could not persist ui settings");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::protocol::{ActionReply, ApiError, RequestId};
    use serde_json::json;
    use std::sync::mpsc;

    struct Harness {
        app: ChronicaApp,
        cmd_rx: Receiver<EngineCommand>,
        save: SaveSlot,
    }

    fn harness(name: &str) -> Harness {
        let dir = std::env::temp_dir().join(format!(
            "mars_chronica_app_{}_{name}",
            std::process::id()
        ));
        let save = SaveSlot::in_dir(&dir);
        save.clear();

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (_resp_tx, resp_rx) = mpsc::channel();
        let catalog = Arc::new(Catalog::bundled().unwrap());
        let app = ChronicaApp::new(
            cmd_tx,
            resp_rx,
            save.clone(),
            UiSettings::default(),
            catalog,
            None,
        );
        Harness { app, cmd_rx, save }
    }

    fn last_request(rx: &Receiver<EngineCommand>) -> (RequestId, GameAction) {
        rx.try_iter()
            .filter_map(|c| match c {
                EngineCommand::Request { id, action } => Some((id, action)),
                EngineCommand::Shutdown => None,
            })
            .last()
            .expect("a request was sent")
    }

    fn saved_document() -> serde_json::Map<String, Value> {
        match json!({
            "player_id": "p1",
            "current_turn": 3,
            "map_data": [ { "q": 1, "r": 0 }, { "q": 0, "r": 0, "is_explored": true } ]
        }) {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn continue_seeds_store_and_selects_start_hex_after_fetch() {
        let mut h = harness("continue");
        h.save.write(&saved_document()).unwrap();
        let now = Instant::now();

        h.app.handle_intent(UiIntent::ContinueSaved, now);
        assert_eq!(h.app.page(), Page::Game);
        assert_eq!(h.app.store.snapshot().turn, Some(3));

        let (id, action) = last_request(&h.cmd_rx);
        assert_eq!(action, GameAction::FetchState);
        h.app.handle_response(
            EngineResponse {
                id,
                action,
                outcome: Ok(ActionReply {
                    state: Some(json!({ "current_turn": 4 })),
                    ..Default::default()
                }),
            },
            now,
        );

        assert_eq!(h.app.selection.selected(), Some(HexCoord::ORIGIN));
        assert_eq!(h.app.store.snapshot().turn, Some(4));
        h.save.clear();
    }

    #[test]
    fn session_expiry_clears_save_and_leaves_once() {
        let mut h = harness("expiry");
        h.save.write(&saved_document()).unwrap();
        let now = Instant::now();

        h.app.handle_intent(UiIntent::ContinueSaved, now);
        let (id, action) = last_request(&h.cmd_rx);

        let expired = |id| EngineResponse {
            id,
            action: GameAction::FetchState,
            outcome: Err(ApiError::SessionExpired { status: 401 }),
        };
        h.app.handle_response(expired(id), now);

        assert_eq!(action, GameAction::FetchState);
        assert_eq!(h.app.page(), Page::Landing);
        assert!(!h.save.is_available());
        assert!(h.app.store.document().is_empty());
        let first_notice = h.app.notices.active(now).cloned();
        assert!(first_notice.is_some());

        // a late duplicate does nothing further
        h.app.notices = NoticeBoard::default();
        h.app.handle_response(expired(id + 1), now);
        assert_eq!(h.app.page(), Page::Landing);
        assert!(h.app.notices.active(now).is_none());
    }

    #[test]
    fn selection_is_dropped_when_hex_disappears() {
        let mut h = harness("reconcile");
        h.save.write(&saved_document()).unwrap();
        let now = Instant::now();
        h.app.handle_intent(UiIntent::ContinueSaved, now);

        let (id, action) = last_request(&h.cmd_rx);
        h.app.handle_response(
            EngineResponse { id, action, outcome: Ok(ActionReply { state: Some(json!({})), ..Default::default() }) },
            now,
        );
        assert_eq!(h.app.selection.selected(), Some(HexCoord::ORIGIN));

        h.app.handle_intent(UiIntent::AdvanceTurn, now);
        let (id, action) = last_request(&h.cmd_rx);
        h.app.handle_response(
            EngineResponse {
                id,
                action,
                outcome: Ok(ActionReply {
                    state: Some(json!({ "map_data": [ { "q": 1, "r": 0 } ] })),
                    event_messages: vec!["Dust storm incoming".into()],
                    ..Default::default()
                }),
            },
            now,
        );

        assert_eq!(h.app.selection.selected(), None);
        assert_eq!(h.app.system_log.last().map(String::as_str), Some("Dust storm incoming"));
        h.save.clear();
    }

    #[test]
    fn save_without_identity_is_refused() {
        let mut h = harness("refuse");
        let now = Instant::now();

        h.app.handle_intent(UiIntent::SaveLocally, now);

        let notice = h.app.notices.active(now).unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(!h.save.is_available());
    }

    #[test]
    fn new_game_stores_the_session_for_the_next_launch() {
        let mut h = harness("session");
        let now = Instant::now();
        h.app.landing.player_name = "Ares".into();

        h.app.handle_intent(UiIntent::StartGame, now);
        let (id, action) = last_request(&h.cmd_rx);
        assert!(matches!(action, GameAction::StartGame(_)));
        h.app.handle_response(
            EngineResponse {
                id,
                action,
                outcome: Ok(ActionReply {
                    session: Some("session=s42".into()),
                    ..Default::default()
                }),
            },
            now,
        );

        assert_eq!(h.app.page(), Page::Game);
        assert_eq!(h.save.load_session().as_deref(), Some("session=s42"));
        let (_, fetch) = last_request(&h.cmd_rx);
        assert_eq!(fetch, GameAction::FetchState);
        h.save.clear();
    }

    #[test]
    fn landing_defaults_come_from_the_catalog() {
        let h = harness("defaults");
        let form = h.app.landing.form();

        assert_eq!(form.faction_id, "MUSK_CORP");
        assert_eq!(form.choice, CharacterChoice::Predefined("commander_shepard".into()));
        assert_eq!(h.app.landing.custom.attributes.len(), 6);
        assert_eq!(h.app.landing.custom.bonus_id, "l1_sharp_mind");
        assert!(!h.app.store.snapshot().factions.is_empty());
    }

    #[test]
    fn custom_commander_with_unspent_points_sends_nothing() {
        let mut h = harness("custom");
        h.app.landing.player_name = "Ares".into();
        h.app.landing.custom_character = true;
        h.app.landing.custom.name = "Ripley".into();

        h.app.handle_intent(UiIntent::StartGame, Instant::now());

        assert!(h.cmd_rx.try_recv().is_err());
        let notice = h.app.notices.active(Instant::now()).unwrap();
        assert!(notice.text.contains("0 of 17 points used"), "{}", notice.text);
    }

    #[test]
    fn incomplete_setup_sends_nothing() {
        let mut h = harness("setup");
        h.app.handle_intent(UiIntent::StartGame, Instant::now());

        assert!(h.cmd_rx.try_recv().is_err());
        assert_eq!(h.app.page(), Page::Landing);
    }
}
