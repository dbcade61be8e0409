use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Typed view of the merged server document.
/// Rebuilt by the store after every accepted update; READ-ONLY everywhere else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameStateSnapshot {
    pub player_id: Option<String>,
    pub player_name: Option<String>,
    pub faction_name: Option<String>,

    #[serde(rename = "current_turn")]
    pub turn: Option<i64>,
    #[serde(rename = "current_year")]
    pub year: Option<i64>,

    pub resources: BTreeMap<String, f64>,
    pub storage_capacity: BTreeMap<String, f64>,
    pub net_production: BTreeMap<String, f64>,
    pub research_production: BTreeMap<String, f64>,

    pub population: f64,
    pub max_population: f64,
    pub morale: f64,

    /// Keyed by blueprint id
    pub habitat_buildings: BTreeMap<String, HabitatBuilding>,
    pub primary_habitat_report: String,
    pub habitats_overview: Vec<HabitatSummary>,

    /// Keyed by tech id
    pub technologies: BTreeMap<String, Technology>,
    pub current_research: Option<CurrentResearch>,

    pub map_data: Vec<HexCell>,

    /// Chronological; the log panel reverses it.
    pub events: Vec<GameEvent>,

    pub character: Option<Character>,
    pub available_buildings: Vec<BuildingBlueprint>,

    pub factions: Vec<FactionSummary>,
    pub player_relations: BTreeMap<String, Relation>,

    #[serde(rename = "TECH_TREE_DEFINITIONS")]
    pub tech_tree_definitions: BTreeMap<String, TechDefinition>,
    #[serde(rename = "BUILDING_BLUEPRINT_DEFINITIONS")]
    pub building_blueprint_definitions: BTreeMap<String, BlueprintDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub const ORIGIN: HexCoord = HexCoord { q: 0, r: 0 };

    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }
}

impl std::fmt::Display for HexCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HexCell {
    pub q: i32,
    pub r: i32,
    pub is_explored: bool,
    pub hex_type: Option<String>,
    /// Ordered; the first entry is used as the cell icon.
    pub resources: Vec<String>,
    pub building: Option<PlacedBuilding>,
    pub owner_player_id: Option<String>,
    pub poi: Option<String>,
    pub can_be_explored: bool,
}

impl HexCell {
    pub fn coord(&self) -> HexCoord {
        HexCoord::new(self.q, self.r)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacedBuilding {
    pub blueprint_id: String,
    pub name: Option<String>,
    pub level: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HabitatBuilding {
    pub name: String,
    pub level: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HabitatSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechStatus {
    Locked,
    Available,
    Researching,
    Researched,
    Invalid,
    #[serde(other)]
    Other,
}

impl Default for TechStatus {
    fn default() -> Self {
        TechStatus::Locked
    }
}

impl TechStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TechStatus::Locked => "locked",
            TechStatus::Available => "available",
            TechStatus::Researching => "researching",
            TechStatus::Researched => "researched",
            TechStatus::Invalid => "invalid",
            TechStatus::Other => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Technology {
    /// Such as `energy_t3_compact_fusion`; the prefix selects the icon.
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub tier: Option<i64>,
    pub status: TechStatus,
    pub cost_rp: Option<f64>,
    pub cost_resources: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentResearch {
    pub tech_id: String,
    pub progress_rp: f64,
    pub required_rp: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameEvent {
    pub turn: i64,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
    pub name: Option<String>,
    pub level: Option<i64>,
    pub icon: Option<String>,
    /// Keyed by attribute enum name, e.g. `STRENGTH`
    pub attributes: BTreeMap<String, CharacterAttribute>,
    pub active_bonus_ids: Vec<String>,
    pub active_bonuses_details: Vec<BonusDetail>,
    /// Bonuses the commander can still acquire with bonus points.
    pub available_bonuses: Vec<BonusOffer>,
    pub xp: f64,
    pub xp_to_next_level: f64,
    pub attribute_points_available: i64,
    pub bonus_points_available: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterAttribute {
    pub value: f64,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusDetail {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusOffer {
    #[serde(alias = "id_name")]
    pub id: String,
    #[serde(alias = "display_name")]
    pub name: String,
    pub description: Option<String>,
    pub tier: Option<i64>,
    pub cost_bp: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingBlueprint {
    pub id: String,
    pub name: String,
    pub cost: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactionSummary {
    pub id: String,
    pub name: String,
    pub leader_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Relation {
    pub standing: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechDefinition {
    pub display_name: Option<String>,
    pub cost_rp: Option<f64>,
    pub tier: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlueprintDefinition {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Population {
    pub current: f64,
    pub max: f64,
}

impl GameStateSnapshot {
    pub fn population(&self) -> Population {
        Population {
            current: self.population,
            max: self.max_population,
        }
    }

    pub fn hex(&self, coord: HexCoord) -> Option<&HexCell> {
        self.map_data.iter().find(|h| h.coord() == coord)
    }

    /// Origin if it exists, otherwise the first cell served.
    pub fn default_selection(&self) -> Option<HexCoord> {
        self.hex(HexCoord::ORIGIN)
            .or_else(|| self.map_data.first())
            .map(HexCell::coord)
    }

    pub fn primary_habitat(&self) -> Option<&HabitatSummary> {
        self.habitats_overview.first().filter(|h| !h.id.is_empty())
    }

    pub fn building_display_name(&self, blueprint_id: &str) -> String {
        self.building_blueprint_definitions
            .get(blueprint_id)
            .and_then(|d| d.display_name.clone())
            .unwrap_or_else(|| blueprint_id.to_string())
    }

    pub fn tech_display_name(&self, tech_id: &str) -> String {
        self.technologies
            .get(tech_id)
            .map(|t| t.name.clone())
            .filter(|n| !n.is_empty())
            .or_else(|| {
                self.tech_tree_definitions
                    .get(tech_id)
                    .and_then(|d| d.display_name.clone())
            })
            .unwrap_or_else(|| tech_id.to_string())
    }

    pub fn research_production_total(&self) -> f64 {
        self.research_production.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_server_shape_with_nulls_and_unknown_status() {
        let snapshot: GameStateSnapshot = serde_json::from_value(json!({
            "current_turn": 4,
            "current_year": 2091,
            "current_research": null,
            "technologies": {
                "t1": { "id": "t1", "name": "Fusion", "tier": null, "status": "embargoed" }
            },
            "map_data": [
                { "q": 0, "r": 0, "is_explored": true, "building": null, "owner_player_id": null }
            ]
        }))
        .unwrap();

        assert_eq!(snapshot.turn, Some(4));
        assert_eq!(snapshot.technologies["t1"].status, TechStatus::Other);
        assert!(snapshot.current_research.is_none());
        assert_eq!(snapshot.default_selection(), Some(HexCoord::ORIGIN));
    }

    #[test]
    fn default_selection_falls_back_to_first_cell() {
        let snapshot = GameStateSnapshot {
            map_data: vec![
                HexCell { q: 3, r: -1, ..Default::default() },
                HexCell { q: 1, r: 1, ..Default::default() },
            ],
            ..Default::default()
        };
        assert_eq!(snapshot.default_selection(), Some(HexCoord::new(3, -1)));
        assert_eq!(GameStateSnapshot::default().default_selection(), None);
    }

    #[test]
    fn tech_name_prefers_player_view_then_tree() {
        let mut snapshot = GameStateSnapshot::default();
        snapshot.tech_tree_definitions.insert(
            "hab_1".into(),
            TechDefinition { display_name: Some("Domes".into()), ..Default::default() },
        );
        assert_eq!(snapshot.tech_display_name("hab_1"), "Domes");
        assert_eq!(snapshot.tech_display_name("nope"), "nope");
    }
}
