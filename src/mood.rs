use crate::model::{Mood, PetStats};

pub const LOW_NEEDS: f32 = 20.0;
pub const LOW_HYGIENE: f32 = 20.0;
pub const TIRED: f32 = 40.0;

/// Derives the displayed mood. `None` means "keep whatever was shown before": a sleeping pet
/// has its own visuals and does not get a fresh mood.
pub fn classify(
    stats: &PetStats,
    is_sleeping: bool,
    is_washing: bool,
    is_listening: bool,
    override_mood: Option<Mood>,
) -> Option<Mood> {
    if let Some(m) = override_mood {
        return Some(m);
    }
    if is_sleeping {
        return None;
    }
    if is_washing {
        return Some(Mood::Washing);
    }
    if stats.hunger < LOW_NEEDS || stats.energy < LOW_NEEDS {
        return Some(Mood::Sad);
    }
    if stats.hygiene < LOW_HYGIENE {
        return Some(Mood::Angry);
    }
    if stats.energy < TIRED {
        return Some(Mood::Sleepy);
    }
    if is_listening {
        return Some(Mood::Listening);
    }
    Some(Mood::Happy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(hunger: f32, energy: f32, happiness: f32, hygiene: f32) -> PetStats {
        PetStats {
            hunger,
            energy,
            happiness,
            hygiene,
        }
    }

    #[test]
    fn healthy_pet_is_happy() {
        let s = PetStats::default();
        assert_eq!(classify(&s, false, false, false, None), Some(Mood::Happy));
    }

    #[test]
    fn override_beats_everything() {
        let s = stats(0.0, 0.0, 0.0, 0.0);
        assert_eq!(
            classify(&s, true, true, true, Some(Mood::Eating)),
            Some(Mood::Eating)
        );
    }

    #[test]
    fn sleeping_suppresses_recompute() {
        let s = stats(5.0, 5.0, 5.0, 5.0);
        assert_eq!(classify(&s, true, true, false, None), None);
    }

    #[test]
    fn washing_beats_low_stats() {
        let s = stats(5.0, 5.0, 50.0, 5.0);
        assert_eq!(classify(&s, false, true, false, None), Some(Mood::Washing));
    }

    #[test]
    fn priority_order_resolves_ties() {
        // hungry and filthy: sad wins over angry
        let s = stats(10.0, 80.0, 50.0, 10.0);
        assert_eq!(classify(&s, false, false, true, None), Some(Mood::Sad));
        // filthy and tired: angry wins over sleepy
        let s = stats(50.0, 30.0, 50.0, 10.0);
        assert_eq!(classify(&s, false, false, true, None), Some(Mood::Angry));
        // tired and listening: sleepy wins
        let s = stats(50.0, 30.0, 50.0, 50.0);
        assert_eq!(classify(&s, false, false, true, None), Some(Mood::Sleepy));
        let s = stats(50.0, 50.0, 50.0, 50.0);
        assert_eq!(classify(&s, false, false, true, None), Some(Mood::Listening));
    }

    #[test]
    fn thresholds_are_strict() {
        let s = stats(20.0, 40.0, 0.0, 20.0);
        assert_eq!(classify(&s, false, false, false, None), Some(Mood::Happy));
        let s = stats(19.99, 40.0, 0.0, 20.0);
        assert_eq!(classify(&s, false, false, false, None), Some(Mood::Sad));
        let s = stats(20.0, 39.9, 0.0, 20.0);
        assert_eq!(classify(&s, false, false, false, None), Some(Mood::Sleepy));
    }
}
