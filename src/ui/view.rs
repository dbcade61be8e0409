//! Pure projections from a snapshot to what each panel shows.
//!
//! Painters draw these and nothing else, so comparing two projections of
//! the same input is enough to check that a repaint is idempotent.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::model::game_state::{GameStateSnapshot, HexCell, HexCoord, TechStatus, Technology};
use crate::model::message::Message;
use crate::model::selection::Selection;
use crate::model::visuals::{building_glyph, resource_glyph, tech_glyph};

/// Hand-picked display order; these are always shown, even at zero.
pub const RESOURCE_ORDER: [&str; 5] = [
    "Energia",
    "Acqua Ghiacciata",
    "Cibo",
    "Composti di Regolite",
    "Elementi Rari",
];

const MISSING_TIER: i64 = 99;

/* =========================
   Header & resource bar
   ========================= */

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderView {
    pub title: String,
    pub year: String,
    pub turn: String,
}

pub fn header(s: &GameStateSnapshot) -> HeaderView {
    let name = s
        .character
        .as_ref()
        .and_then(|c| c.name.clone())
        .or_else(|| s.player_name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Commander".to_string());
    let faction = s.faction_name.clone().unwrap_or_else(|| "N/A".to_string());

    HeaderView {
        title: format!("- {name} ({faction})"),
        year: s.year.map_or_else(|| "?".to_string(), |y| y.to_string()),
        turn: s.turn.map_or_else(|| "?".to_string(), |t| t.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Positive,
    Negative,
    Flat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEntry {
    pub key: String,
    pub glyph: &'static str,
    pub label: String,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceBarView {
    pub entries: Vec<ResourceEntry>,
    pub research: String,
}

fn signed(value: f64) -> String {
    // avoid "+-0.0"
    let value = if value == 0.0 { 0.0 } else { value };
    let sign = if value >= 0.0 { "+" } else { "" };
    format!("{sign}{value:.1}")
}

pub fn resource_bar(s: &GameStateSnapshot) -> ResourceBarView {
    let extra = s
        .resources
        .keys()
        .filter(|k| !RESOURCE_ORDER.contains(&k.as_str()))
        .map(String::as_str);

    let entries = RESOURCE_ORDER
        .iter()
        .copied()
        .chain(extra)
        .map(|key| {
            let amount = s.resources.get(key).copied().unwrap_or(0.0);
            let net = s.net_production.get(key).copied().unwrap_or(0.0);
            let trend = match net.partial_cmp(&0.0) {
                Some(Ordering::Greater) => Trend::Positive,
                Some(Ordering::Less) => Trend::Negative,
                _ => Trend::Flat,
            };
            ResourceEntry {
                key: key.to_string(),
                glyph: resource_glyph(key),
                label: format!("{key}: {} ({})", amount.floor() as i64, signed(net)),
                trend,
            }
        })
        .collect();

    ResourceBarView {
        entries,
        research: format!("RP ({})", signed(s.research_production_total())),
    }
}

/// `ENE:10 CIB:5`, or `Free` for an empty cost table.
pub fn cost_label(cost: &BTreeMap<String, f64>) -> String {
    if cost.is_empty() {
        return "Free".to_string();
    }
    cost.iter()
        .map(|(res, amount)| {
            let abbr: String = res.chars().take(3).collect::<String>().to_uppercase();
            format!("{abbr}:{amount}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/* =========================
   Event log
   ========================= */

/// Client-side system lines (newest last in `system`) on top, then
/// server events newest first.
pub fn event_log(s: &GameStateSnapshot, system: &[String]) -> Vec<Message> {
    system
        .iter()
        .rev()
        .map(|t| Message::System(t.clone()))
        .chain(s.events.iter().rev().map(|e| Message::Event {
            turn: e.turn,
            kind: e.kind.clone().unwrap_or_else(|| "general".to_string()),
            text: e.message.clone(),
        }))
        .collect()
}

/* =========================
   Research
   ========================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TechAction {
    Research,
    InProgress,
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TechRow {
    pub id: String,
    pub glyph: &'static str,
    pub title: String,
    pub description: String,
    pub cost: String,
    pub action: TechAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentResearchView {
    pub tech_id: String,
    pub name: String,
    pub fraction: f32,
    pub progress: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResearchView {
    pub rp_total: String,
    pub current: Option<CurrentResearchView>,
    pub techs: Vec<TechRow>,
}

fn status_rank(status: &TechStatus) -> u8 {
    match status {
        TechStatus::Researching => 0,
        TechStatus::Available => 1,
        TechStatus::Researched => 2,
        _ => 3,
    }
}

/// Researching, available, researched, then the rest; tier, then name.
pub fn sorted_techs(s: &GameStateSnapshot) -> Vec<&Technology> {
    let mut techs: Vec<&Technology> = s
        .technologies
        .values()
        .filter(|t| !matches!(t.status, TechStatus::Locked | TechStatus::Invalid))
        .collect();

    techs.sort_by(|a, b| {
        status_rank(&a.status)
            .cmp(&status_rank(&b.status))
            .then_with(|| {
                a.tier
                    .unwrap_or(MISSING_TIER)
                    .cmp(&b.tier.unwrap_or(MISSING_TIER))
            })
            .then_with(|| a.name.cmp(&b.name))
    });
    techs
}

pub fn research(s: &GameStateSnapshot) -> ResearchView {
    let current = s
        .current_research
        .as_ref()
        .filter(|cr| !cr.tech_id.is_empty())
        .map(|cr| {
            let required = if cr.required_rp > 0.0 {
                cr.required_rp
            } else {
                s.tech_tree_definitions
                    .get(&cr.tech_id)
                    .and_then(|d| d.cost_rp)
                    .filter(|c| *c > 0.0)
                    .unwrap_or(1.0)
            };
            CurrentResearchView {
                tech_id: cr.tech_id.clone(),
                name: s.tech_display_name(&cr.tech_id),
                fraction: (cr.progress_rp / required).clamp(0.0, 1.0) as f32,
                progress: format!(
                    "{} / {} RP",
                    cr.progress_rp.floor() as i64,
                    required.floor() as i64
                ),
            }
        });

    let techs = sorted_techs(s)
        .into_iter()
        .map(|t| {
            let mut cost = match t.cost_rp {
                Some(rp) => format!("RP: {rp}"),
                None => "RP: N/A".to_string(),
            };
            if !t.cost_resources.is_empty() {
                cost.push_str(" | ");
                cost.push_str(&cost_label(&t.cost_resources));
            }

            TechRow {
                id: t.id.clone(),
                glyph: tech_glyph(&t.id),
                title: format!(
                    "{} [T{}] ({})",
                    t.name,
                    t.tier.map_or_else(|| "?".to_string(), |n| n.to_string()),
                    t.status.label()
                ),
                description: t.description.clone().unwrap_or_default(),
                cost,
                action: match t.status {
                    TechStatus::Available => TechAction::Research,
                    TechStatus::Researching => TechAction::InProgress,
                    _ => TechAction::None,
                },
            }
        })
        .collect();

    ResearchView {
        rp_total: format!("{:.1}", s.research_production_total()),
        current,
        techs,
    }
}

/* =========================
   Habitat
   ========================= */

#[derive(Debug, Clone, PartialEq)]
pub struct InstalledRow {
    pub blueprint_id: String,
    pub glyph: &'static str,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlueprintRow {
    pub id: String,
    pub glyph: &'static str,
    pub name: String,
    pub cost: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HabitatView {
    pub population: String,
    pub installed: Vec<InstalledRow>,
    pub report: String,
    pub buildable: Vec<BlueprintRow>,
}

fn blueprint_rows(s: &GameStateSnapshot) -> Vec<BlueprintRow> {
    s.available_buildings
        .iter()
        .filter(|b| !b.id.is_empty() && !b.name.is_empty())
        .map(|b| BlueprintRow {
            id: b.id.clone(),
            glyph: building_glyph(&b.id),
            name: b.name.clone(),
            cost: cost_label(&b.cost),
        })
        .collect()
}

pub fn habitat(s: &GameStateSnapshot) -> HabitatView {
    let pop = s.population();
    let report = if s.primary_habitat_report.trim().is_empty() {
        "No habitat report available.".to_string()
    } else {
        s.primary_habitat_report.clone()
    };

    HabitatView {
        population: format!("{} / {}", pop.current.floor() as i64, pop.max.floor() as i64),
        installed: s
            .habitat_buildings
            .iter()
            .filter(|(_, b)| !b.name.is_empty())
            .map(|(id, b)| InstalledRow {
                blueprint_id: id.clone(),
                glyph: building_glyph(id),
                label: format!("{} (Lvl {})", b.name, b.level),
            })
            .collect(),
        report,
        buildable: blueprint_rows(s),
    }
}

/* =========================
   Map & hex details
   ========================= */

/// Why a hex cannot take a new building. Variant order is report precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildBlock {
    Unexplored,
    AlreadyBuilt,
    ForeignOwned,
}

impl fmt::Display for BuildBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            BuildBlock::Unexplored => "the hex is unexplored.",
            BuildBlock::AlreadyBuilt => "there is already a building.",
            BuildBlock::ForeignOwned => "the hex is controlled by another player.",
        };
        write!(f, "Cannot build here: {reason}")
    }
}

fn owned_by_other(cell: &HexCell, local_player: Option<&str>) -> bool {
    match cell.owner_player_id.as_deref() {
        None | Some("") => false,
        Some(owner) => Some(owner) != local_player,
    }
}

pub fn buildability(cell: &HexCell, local_player: Option<&str>) -> Result<(), BuildBlock> {
    if !cell.is_explored {
        Err(BuildBlock::Unexplored)
    } else if cell.building.is_some() {
        Err(BuildBlock::AlreadyBuilt)
    } else if owned_by_other(cell, local_player) {
        Err(BuildBlock::ForeignOwned)
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HexCellView {
    pub coord: HexCoord,
    /// Terrain name, or `None` while unexplored
    pub terrain: Option<String>,
    pub glyph: Option<&'static str>,
    pub selected: bool,
    pub player_owned: bool,
    pub start_hex: bool,
    pub tooltip: String,
}

fn resource_list(cell: &HexCell) -> String {
    cell.resources
        .iter()
        .map(|r| {
            let glyph = resource_glyph(r);
            if glyph == crate::model::visuals::DEFAULT_RESOURCE_GLYPH {
                r.clone()
            } else {
                glyph.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn building_label(cell: &HexCell) -> Option<String> {
    cell.building.as_ref().map(|b| {
        let name = b
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| b.blueprint_id.clone());
        format!("{name} (Lvl {})", b.level.unwrap_or(1))
    })
}

pub fn hex_tooltip(cell: &HexCell) -> String {
    let mut text = format!(
        "Coordinates: ({}, {})\nType: {}",
        cell.q,
        cell.r,
        cell.hex_type.as_deref().unwrap_or("Unknown")
    );
    if cell.is_explored {
        if !cell.resources.is_empty() {
            text.push_str(&format!("\nResources: {}", resource_list(cell)));
        }
        if let Some(b) = building_label(cell) {
            text.push_str(&format!("\nBuilding: {b}"));
        }
        if let Some(poi) = &cell.poi {
            text.push_str(&format!("\nPOI: {poi}"));
        }
    } else {
        text.push_str("\n(Unexplored)");
    }
    text
}

pub fn map_cells(s: &GameStateSnapshot, selection: &Selection) -> Vec<HexCellView> {
    let local = s.player_id.as_deref().filter(|id| !id.is_empty());

    s.map_data
        .iter()
        .map(|cell| {
            let glyph = if !cell.is_explored {
                None
            } else if let Some(b) = &cell.building {
                Some(building_glyph(&b.blueprint_id))
            } else {
                cell.resources.first().map(|r| resource_glyph(r))
            };

            HexCellView {
                coord: cell.coord(),
                terrain: cell
                    .is_explored
                    .then(|| cell.hex_type.clone().unwrap_or_else(|| "UnknownTerrain".to_string())),
                glyph,
                selected: selection.is_selected(cell.coord()),
                player_owned: local.is_some() && cell.owner_player_id.as_deref() == local,
                start_hex: cell.coord() == HexCoord::ORIGIN,
                tooltip: hex_tooltip(cell),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Yours,
    Other,
    Nobody,
}

impl Owner {
    pub fn label(&self) -> &'static str {
        match self {
            Owner::Yours => "Yours",
            Owner::Other => "Other player",
            Owner::Nobody => "None",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HexDetailsView {
    pub coord: HexCoord,
    pub terrain: String,
    pub resources: String,
    pub building: String,
    pub owner: Owner,
    pub poi: Option<String>,
    pub explored: bool,
    pub can_explore: bool,
    pub construction: Result<Vec<BlueprintRow>, BuildBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HexPanelView {
    NoSelection,
    /// Selected coordinate has no cell in the snapshot.
    Missing(HexCoord),
    Details(HexDetailsView),
}

pub fn location_label(selected: Option<HexCoord>) -> String {
    match selected {
        Some(c) => format!("Location: Q:{}, R:{}", c.q, c.r),
        None => "Location: N/A".to_string(),
    }
}

pub fn hex_details(s: &GameStateSnapshot, selection: &Selection) -> HexPanelView {
    let Some(coord) = selection.selected() else {
        return HexPanelView::NoSelection;
    };
    let Some(cell) = s.hex(coord) else {
        return HexPanelView::Missing(coord);
    };
    let local = s.player_id.as_deref().filter(|id| !id.is_empty());

    let owner = match cell.owner_player_id.as_deref() {
        None | Some("") => Owner::Nobody,
        Some(id) if Some(id) == local => Owner::Yours,
        Some(_) => Owner::Other,
    };

    HexPanelView::Details(HexDetailsView {
        coord,
        terrain: cell.hex_type.clone().unwrap_or_else(|| "Unknown".to_string()),
        resources: if cell.resources.is_empty() {
            "None".to_string()
        } else {
            resource_list(cell)
        },
        building: building_label(cell).unwrap_or_else(|| "None".to_string()),
        owner,
        poi: cell.poi.clone(),
        explored: cell.is_explored,
        can_explore: !cell.is_explored && cell.can_be_explored,
        construction: buildability(cell, local).map(|()| blueprint_rows(s)),
    })
}

/* =========================
   Character & factions
   ========================= */

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRow {
    pub key: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BonusRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub cost: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterView {
    pub name: String,
    pub level: String,
    pub attributes: Vec<AttributeRow>,
    pub active_bonuses: Vec<BonusRow>,
    pub offered_bonuses: Vec<BonusRow>,
    pub xp: String,
    pub xp_fraction: f32,
    pub attribute_points: i64,
    pub bonus_points: i64,
}

pub fn character(s: &GameStateSnapshot) -> Option<CharacterView> {
    let c = s.character.as_ref()?;
    let xp_needed = if c.xp_to_next_level > 0.0 { c.xp_to_next_level } else { 1.0 };

    Some(CharacterView {
        name: c
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unnamed Commander".to_string()),
        level: format!("Lvl {}", c.level.unwrap_or(1)),
        attributes: c
            .attributes
            .iter()
            .map(|(key, attr)| AttributeRow {
                key: key.clone(),
                label: attr.display_name.clone().unwrap_or_else(|| key.clone()),
                value: format!("{}", attr.value),
            })
            .collect(),
        active_bonuses: c
            .active_bonuses_details
            .iter()
            .map(|b| BonusRow {
                id: b.name.clone(),
                name: b.name.clone(),
                description: b.description.clone().unwrap_or_default(),
                cost: None,
            })
            .collect(),
        offered_bonuses: c
            .available_bonuses
            .iter()
            .filter(|b| !b.id.is_empty())
            .map(|b| BonusRow {
                id: b.id.clone(),
                name: if b.name.is_empty() { b.id.clone() } else { b.name.clone() },
                description: b.description.clone().unwrap_or_default(),
                cost: b.cost_bp.map(|bp| format!("{bp} BP")),
            })
            .collect(),
        xp: format!("{} / {}", c.xp.floor() as i64, xp_needed.floor() as i64),
        xp_fraction: (c.xp / xp_needed).clamp(0.0, 1.0) as f32,
        attribute_points: c.attribute_points_available,
        bonus_points: c.bonus_points_available,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    Allied,
    Friendly,
    Neutral,
    Hostile,
}

impl Standing {
    pub fn from_score(score: f64) -> Self {
        if score > 50.0 {
            Standing::Friendly
        } else if score > 0.0 {
            Standing::Neutral
        } else {
            Standing::Hostile
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Standing::Allied => "Allied (You)",
            Standing::Friendly => "Friendly",
            Standing::Neutral => "Neutral",
            Standing::Hostile => "Hostile",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactionRow {
    pub name: String,
    pub standing: Standing,
}

pub fn faction_relations(s: &GameStateSnapshot) -> Vec<FactionRow> {
    s.factions
        .iter()
        .filter(|f| !f.name.is_empty())
        .map(|f| {
            let standing = if s.faction_name.as_deref() == Some(f.name.as_str()) {
                Standing::Allied
            } else {
                s.player_relations
                    .get(&f.id)
                    .map_or(Standing::Hostile, |r| Standing::from_score(r.standing))
            };
            FactionRow {
                name: f.name.clone(),
                standing,
            }
        })
        .collect()
}
