//! Static glyph tables for blueprints, technology categories and resources.

pub const DEFAULT_BUILDING_GLYPH: &str = "🏢";
pub const DEFAULT_TECH_GLYPH: &str = "⚛";
pub const DEFAULT_RESOURCE_GLYPH: &str = "❔";

pub fn building_glyph(blueprint_id: &str) -> &'static str {
    match blueprint_id {
        "BasicHabitatModule" => "🏠",
        "RegolithExtractorMk1" => "🚜",
        "WaterIceExtractorMk1" => "💧",
        "SolarArrayMk1" => "🔆",
        "ResearchLab" => "⚗",
        "BasicFactory" => "🏭",
        "HydroponicsFarmMk1" => "🌱",
        _ => DEFAULT_BUILDING_GLYPH,
    }
}

fn tech_category_glyph(category: &str) -> Option<&'static str> {
    let glyph = match category {
        "hab" => "🏙",
        "energy" => "⚡",
        "expl" => "🧭",
        "mil" => "🛡",
        "biotech" => "🧬",
        "data" => "💻",
        "terra" => "🌍",
        "civ" => "🏛",
        _ => return None,
    };
    Some(glyph)
}

/// Exact id first, then the category prefix before the first `_`.
pub fn tech_glyph(tech_id: &str) -> &'static str {
    tech_category_glyph(tech_id)
        .or_else(|| {
            tech_id
                .split('_')
                .next()
                .and_then(tech_category_glyph)
        })
        .unwrap_or(DEFAULT_TECH_GLYPH)
}

pub fn resource_glyph(resource: &str) -> &'static str {
    match resource {
        "Acqua Ghiacciata" => "🧊",
        "Composti di Regolite" => "🧱",
        "Elementi Rari" => "💎",
        "Energia" => "⚡",
        "Cibo" => "🍎",
        "Subsurface_Ice" => "🧊",
        "Regolith" => "🪨",
        "Silica" => "🔮",
        "Minerals" => "⛏",
        "Geothermal_Energy_Spot" => "♨",
        "Sulfur" => "🧪",
        "Rare_Metals" => "🔩",
        "Exposed_Minerals" => "⛰",
        "Sheltered_Location" => "🛡",
        "Possible_Alien_Artifact_Fragment" => "❓",
        "Water_Seep" => "💧",
        "Surface_Ice" => "❄",
        "Deep_Ice_Core" => "🧊⬇",
        "Frozen_Gases" => "💨",
        "Impact_Minerals" => "☄",
        "Sedimentary_Deposits" => "🏞",
        "Clays" => "🏺",
        "Trace_Organics" => "🌿",
        "TerraformingGas" => "🌍",
        "ResearchPoints" => "🔬",
        "ResearchPoints_Xeno" => "👽",
        "ResearchPoints_Bio" => "🧬",
        "ResearchPoints_Military" => "⚔",
        _ => DEFAULT_RESOURCE_GLYPH,
    }
}
