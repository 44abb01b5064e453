use crate::error::PetError;
use crate::model::{clamp_stat, level_for, InventoryItem, ItemCategory, Rules, SimulationState};
use chrono::{DateTime, Duration as ChronoDuration, Utc};

/// What a successful wash start asks the caller to schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WashStart {
    Started,
    AlreadyWashing,
}

impl SimulationState {
    /// Advances decay (or sleep recovery) by `elapsed_secs` logical seconds.
    /// Washing does not pause decay.
    pub fn tick(&mut self, rules: &Rules, elapsed_secs: f32) {
        let minutes = elapsed_secs / 60.0;
        let decay = rules.decay;
        let s = &mut self.stats;

        if self.is_sleeping {
            s.energy = clamp_stat(s.energy + rules.sleep_energy_recovery * elapsed_secs);
            s.hunger = clamp_stat(s.hunger - decay.hunger * rules.sleep_hunger_factor * minutes);
            return;
        }

        s.hunger = clamp_stat(s.hunger - decay.hunger * minutes);
        s.energy = clamp_stat(s.energy - decay.energy * minutes);
        s.happiness = clamp_stat(s.happiness - decay.happiness * minutes);
        s.hygiene = clamp_stat(s.hygiene - decay.hygiene * minutes);
    }

    pub fn feed(&mut self, item: &InventoryItem) -> Result<(), PetError> {
        if item.category != ItemCategory::Food {
            return Err(PetError::NotFood(item.id));
        }
        self.spend(item.cost)?;
        self.stats.hunger = clamp_stat(self.stats.hunger + item.effect.hunger.unwrap_or(0.0));
        self.stats.happiness =
            clamp_stat(self.stats.happiness + item.effect.happiness.unwrap_or(0.0));
        Ok(())
    }

    pub fn toggle_sleep(&mut self) {
        self.is_sleeping = !self.is_sleeping;
    }

    pub fn start_wash(&mut self) -> WashStart {
        if self.is_washing {
            return WashStart::AlreadyWashing;
        }
        self.is_washing = true;
        WashStart::Started
    }

    pub fn finish_wash(&mut self) {
        self.is_washing = false;
        self.stats.hygiene = 100.0;
    }

    pub fn apply_minigame_reward(&mut self, rules: &Rules, earned_coins: u32) {
        self.coins = self.coins.saturating_add(earned_coins);
        self.experience = self
            .experience
            .saturating_add(earned_coins.saturating_mul(rules.reward_xp_per_coin));
        self.level = level_for(self.experience);
        self.stats.energy = clamp_stat(self.stats.energy - rules.reward_energy_cost);
        self.stats.happiness = clamp_stat(self.stats.happiness + rules.reward_happiness_gain);
    }

    pub fn purchase(&mut self, item: &InventoryItem) -> Result<(), PetError> {
        if item.category != ItemCategory::Hat {
            return Err(PetError::NotForSale(item.id));
        }
        if self.wardrobe.contains(item.id) {
            return Err(PetError::AlreadyOwned(item.id));
        }
        self.spend(item.cost)?;
        self.wardrobe.insert(item.id.to_string());
        Ok(())
    }

    pub fn equip(&mut self, hat: Option<&str>) -> Result<(), PetError> {
        match hat {
            Some(id) if !self.wardrobe.contains(id) => Err(PetError::NotOwned(id.to_string())),
            Some(id) => {
                self.hat = Some(id.to_string());
                Ok(())
            }
            None => {
                self.hat = None;
                Ok(())
            }
        }
    }

    pub fn can_afford(&self, cost: u32) -> bool {
        self.coins >= cost
    }

    fn spend(&mut self, cost: u32) -> Result<(), PetError> {
        if !self.can_afford(cost) {
            return Err(PetError::InsufficientFunds {
                cost,
                coins: self.coins,
            });
        }
        self.coins -= cost;
        Ok(())
    }
}

/// Replays the ticks that would have fired between `last_seen` and `now`, capped by the rules.
/// Returns the number of ticks applied.
pub fn catch_up(
    state: &mut SimulationState,
    last_seen: DateTime<Utc>,
    now: DateTime<Utc>,
    rules: &Rules,
) -> u64 {
    let elapsed = now - last_seen;
    let max_elapsed = ChronoDuration::seconds(rules.catchup_max_secs.max(0));
    let elapsed = elapsed.clamp(ChronoDuration::zero(), max_elapsed);

    let step_ms = rules.tick_interval_ms.max(1) as i64;
    let ticks = (elapsed.num_milliseconds() / step_ms).max(0) as u64;
    let step_secs = step_ms as f32 / 1000.0;
    for _ in 0..ticks {
        state.tick(rules, step_secs);
    }
    ticks
}
