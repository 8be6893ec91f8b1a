//! Tuning for the local rules.

use serde::{Deserialize, Serialize};

use crate::{Area, FurnitureKind};

/// Movement, combat, and search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Movement speed in pixels per second.
    pub speed: f32,

    /// An opponent's trap fires within this distance (inclusive).
    pub trap_radius: f32,

    /// Attacks land within this distance (exclusive).
    pub attack_radius: f32,

    /// Health removed by one attack.
    pub attack_damage: f32,

    /// Where each furniture kind can be searched from, indexed by
    /// [`FurnitureKind::index`].
    pub search_areas: [Area; FurnitureKind::COUNT],
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            speed: 600.0,
            trap_radius: 80.0,
            attack_radius: 100.0,
            attack_damage: 20.0,
            search_areas: [
                Area::new(150.0, 350.0, 300.0),
                Area::new(530.0, 295.0, 300.0),
                Area::new(1090.0, 75.0, 200.0),
            ],
        }
    }
}

impl RulesConfig {
    pub fn search_area(&self, kind: FurnitureKind) -> &Area {
        &self.search_areas[kind.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = RulesConfig::default();
        assert_eq!(rules.speed, 600.0);
        assert_eq!(rules.trap_radius, 80.0);
        assert_eq!(rules.attack_radius, 100.0);
        assert_eq!(rules.attack_damage, 20.0);
        assert_eq!(rules.search_area(FurnitureKind::Bookshelf).radius, 200.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let rules: RulesConfig = serde_json::from_str(r#"{ "speed": 300.0 }"#).unwrap();
        assert_eq!(rules.speed, 300.0);
        assert_eq!(rules.attack_damage, 20.0);
    }
}
