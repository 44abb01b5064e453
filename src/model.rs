use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const STAT_MIN: f32 = 0.0;
pub const STAT_MAX: f32 = 100.0;
pub const XP_PER_LEVEL: u32 = 100;

pub(crate) fn clamp_stat(v: f32) -> f32 {
    v.clamp(STAT_MIN, STAT_MAX)
}

pub fn level_for(experience: u32) -> u32 {
    experience / XP_PER_LEVEL + 1
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Sleepy,
    Eating,
    Washing,
    Listening,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PetStats {
    pub hunger: f32,
    pub energy: f32,
    pub happiness: f32,
    pub hygiene: f32,
}

impl Default for PetStats {
    fn default() -> Self {
        Self {
            hunger: 80.0,
            energy: 100.0,
            happiness: 70.0,
            hygiene: 90.0,
        }
    }
}

impl PetStats {
    pub(crate) fn clamped(self) -> Self {
        Self {
            hunger: clamp_stat(self.hunger),
            energy: clamp_stat(self.energy),
            happiness: clamp_stat(self.happiness),
            hygiene: clamp_stat(self.hygiene),
        }
    }
}

/// Partial stat change carried by a catalog item. Missing fields mean "no change".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StatDelta {
    pub hunger: Option<f32>,
    pub energy: Option<f32>,
    pub happiness: Option<f32>,
    pub hygiene: Option<f32>,
}

impl StatDelta {
    pub const NONE: StatDelta = StatDelta {
        hunger: None,
        energy: None,
        happiness: None,
        hygiene: None,
    };

    pub const fn food(hunger: f32, happiness: f32) -> Self {
        Self {
            hunger: Some(hunger),
            energy: None,
            happiness: Some(happiness),
            hygiene: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemCategory {
    Food,
    Hat,
    Toy,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InventoryItem {
    pub id: &'static str,
    pub display_name: &'static str,
    pub cost: u32,
    pub category: ItemCategory,
    pub effect: StatDelta,
}

/// Everything that survives a restart. Serialized as-is under the save key.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    pub stats: PetStats,
    pub coins: u32,
    pub level: u32,
    pub experience: u32,
    pub is_sleeping: bool,
    pub is_washing: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_update: DateTime<Utc>,
    #[serde(default)]
    pub wardrobe: BTreeSet<String>,
    #[serde(default)]
    pub hat: Option<String>,
}

impl SimulationState {
    pub fn new_default(now: DateTime<Utc>) -> Self {
        Self {
            stats: PetStats::default(),
            coins: 100,
            level: 1,
            experience: 0,
            is_sleeping: false,
            is_washing: false,
            last_update: now,
            wardrobe: BTreeSet::new(),
            hat: None,
        }
    }

    /// Repairs values a hand-edited or older snapshot may carry.
    pub(crate) fn normalized(mut self) -> Self {
        self.stats = self.stats.clamped();
        self.level = level_for(self.experience);
        if let Some(hat) = &self.hat {
            if !self.wardrobe.contains(hat) {
                self.hat = None;
            }
        }
        self
    }
}

/// Percentage points lost per minute.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct DecayRates {
    pub hunger: f32,
    pub energy: f32,
    pub happiness: f32,
    pub hygiene: f32,
}

impl Default for DecayRates {
    fn default() -> Self {
        Self {
            hunger: 2.0,
            energy: 1.5,
            happiness: 1.0,
            hygiene: 1.2,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Rules {
    pub tick_interval_ms: u64,
    pub decay: DecayRates,
    pub sleep_energy_recovery: f32, // per tick
    pub sleep_hunger_factor: f32,   // fraction of awake hunger decay
    pub wash_duration_ms: u64,
    pub eating_duration_ms: u64,
    pub reward_xp_per_coin: u32,
    pub reward_energy_cost: f32,
    pub reward_happiness_gain: f32,
    pub catchup_max_secs: i64,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            decay: DecayRates::default(),
            sleep_energy_recovery: 5.0,
            sleep_hunger_factor: 0.5,
            wash_duration_ms: 3000,
            eating_duration_ms: 2000,
            reward_xp_per_coin: 2,
            reward_energy_cost: 10.0,
            reward_happiness_gain: 20.0,
            catchup_max_secs: 7 * 24 * 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_follows_experience() {
        assert_eq!(level_for(0), 1);
        assert_eq!(level_for(99), 1);
        assert_eq!(level_for(100), 2);
        assert_eq!(level_for(250), 3);
    }

    #[test]
    fn snapshot_uses_camel_case_and_epoch_millis() {
        let now = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let st = SimulationState::new_default(now);
        let v = serde_json::to_value(&st).unwrap();
        assert_eq!(v["isSleeping"], false);
        assert_eq!(v["lastUpdate"], 1_700_000_000_000i64);
        assert_eq!(v["stats"]["hygiene"], 90.0);
    }

    #[test]
    fn older_snapshot_without_wardrobe_loads() {
        let raw = r#"{"stats":{"hunger":80,"energy":100,"happiness":70,"hygiene":90},
            "coins":100,"level":1,"experience":0,"isSleeping":false,"isWashing":false,
            "lastUpdate":1700000000000}"#;
        let st: SimulationState = serde_json::from_str(raw).unwrap();
        assert!(st.wardrobe.is_empty());
        assert_eq!(st.hat, None);
    }

    #[test]
    fn normalized_repairs_out_of_range_values() {
        let mut st = SimulationState::new_default(Utc::now());
        st.stats.hunger = 140.0;
        st.stats.energy = -3.0;
        st.experience = 230;
        st.level = 9;
        st.hat = Some("crown".to_string());
        let st = st.normalized();
        assert_eq!(st.stats.hunger, 100.0);
        assert_eq!(st.stats.energy, 0.0);
        assert_eq!(st.level, 3);
        assert_eq!(st.hat, None);
    }
}
