//! Static game tables the server renders into its web page but never
//! returns from the game state endpoint.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::model::game_state::{
    BlueprintDefinition, BonusOffer, FactionSummary, GameStateSnapshot, TechDefinition,
};

const BUNDLED: &str = include_str!("catalog.json");

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Commander attributes in the server's declaration order.
    pub attributes: Vec<AttributeEntry>,
    pub factions: Vec<FactionSummary>,
    pub predefined_characters: Vec<PredefinedCharacter>,
    /// Every commander bonus; tier 1 ones can be picked at setup.
    pub bonuses: Vec<BonusOffer>,
    pub technologies: BTreeMap<String, TechDefinition>,
    pub blueprints: BTreeMap<String, BlueprintDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AttributeEntry {
    /// Enum name sent back to the server, e.g. `STRENGTH`
    pub key: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PredefinedCharacter {
    pub id: String,
    pub name: String,
    pub attributes: BTreeMap<String, i64>,
    pub starting_bonus_id: String,
}

impl Catalog {
    /// Parses the tables compiled into the binary.
    pub fn bundled() -> Result<Self, serde_json::Error> {
        serde_json::from_str(BUNDLED)
    }

    pub fn starting_bonuses(&self) -> impl Iterator<Item = &BonusOffer> {
        self.bonuses.iter().filter(|b| b.tier == Some(1))
    }

    pub fn bonus(&self, id: &str) -> Option<&BonusOffer> {
        self.bonuses.iter().find(|b| b.id == id)
    }

    pub fn faction(&self, id: &str) -> Option<&FactionSummary> {
        self.factions.iter().find(|f| f.id == id)
    }

    pub fn predefined(&self, id: &str) -> Option<&PredefinedCharacter> {
        self.predefined_characters.iter().find(|c| c.id == id)
    }

    /// Fills what the server left out. Anything it did send wins.
    pub fn fill(&self, snapshot: &mut GameStateSnapshot) {
        for (id, def) in &self.technologies {
            snapshot
                .tech_tree_definitions
                .entry(id.clone())
                .or_insert_with(|| def.clone());
        }
        for (id, def) in &self.blueprints {
            snapshot
                .building_blueprint_definitions
                .entry(id.clone())
                .or_insert_with(|| def.clone());
        }
        if snapshot.factions.is_empty() {
            snapshot.factions = self.factions.clone();
        }

        if let Some(character) = snapshot.character.as_mut() {
            if character.available_bonuses.is_empty() {
                character.available_bonuses = self
                    .bonuses
                    .iter()
                    .filter(|b| !character.active_bonus_ids.contains(&b.id))
                    .cloned()
                    .collect();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::game_state::Character;

    #[test]
    fn bundled_tables_parse() {
        let catalog = Catalog::bundled().unwrap();

        assert_eq!(catalog.attributes.len(), 6);
        assert_eq!(catalog.attributes[0].key, "STRENGTH");
        assert!(catalog.faction("MUSK_CORP").is_some());
        assert_eq!(catalog.starting_bonuses().count(), 10);
        assert_eq!(
            catalog.blueprints["SolarArrayMk1"].display_name.as_deref(),
            Some("Pannello Solare Mk1")
        );
        assert_eq!(catalog.technologies["hab_t1_basic_shelters"].tier, Some(1));
    }

    #[test]
    fn predefined_commanders_spend_the_full_budget() {
        let catalog = Catalog::bundled().unwrap();
        for c in &catalog.predefined_characters {
            let spent: i64 = c.attributes.values().map(|v| v - 1).sum();
            assert_eq!(spent, 17, "{} spends {spent}", c.id);
            assert!(catalog.bonus(&c.starting_bonus_id).is_some(), "{}", c.id);
        }
    }

    #[test]
    fn server_values_win_over_bundled_ones() {
        let catalog = Catalog::bundled().unwrap();
        let mut snapshot = GameStateSnapshot::default();
        snapshot.building_blueprint_definitions.insert(
            "SolarArrayMk1".into(),
            BlueprintDefinition { display_name: Some("Solar Array".into()) },
        );
        snapshot.factions.push(FactionSummary { id: "X".into(), name: "Only".into(), ..Default::default() });

        catalog.fill(&mut snapshot);

        assert_eq!(snapshot.building_display_name("SolarArrayMk1"), "Solar Array");
        assert_eq!(snapshot.building_display_name("ResearchLab"), "Laboratorio di Ricerca");
        assert_eq!(snapshot.factions.len(), 1);
    }

    #[test]
    fn offers_skip_bonuses_already_held() {
        let catalog = Catalog::bundled().unwrap();
        let mut snapshot = GameStateSnapshot {
            character: Some(Character {
                active_bonus_ids: vec!["l1_sharp_mind".into()],
                ..Default::default()
            }),
            ..Default::default()
        };

        catalog.fill(&mut snapshot);

        let offers = &snapshot.character.as_ref().unwrap().available_bonuses;
        assert_eq!(offers.len(), catalog.bonuses.len() - 1);
        assert!(offers.iter().all(|b| b.id != "l1_sharp_mind"));
        assert!(offers.iter().any(|b| b.id == "t2_master_builder"));
    }
}
