//! Star catcher: objects fall from the top, the player slides a basket along the bottom.
//!
//! Coordinates are percentages of the play field. `x` runs left to right, `y` top to bottom;
//! objects enter above the field at `y = -10` and leave it at `y = 100`.
//!
//! All motion is driven by three timers on the game's own [`Scheduler`]:
//!
//! | timer     | period  | effect                              |
//! |-----------|---------|-------------------------------------|
//! | advance   | 50 ms   | every object falls 2 units, catches |
//! | spawn     | 800 ms  | new object at a random `x`          |
//! | countdown | 1000 ms | one second off the clock            |
//!
//! When deadlines coincide the timers fire in the order above. Dropping the game drops its
//! timers, which is how an early close cancels everything.

use crate::clock::Scheduler;
use crate::error::PetError;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;
use tracing::{debug, info};

pub const ROUND_SECS: u32 = 30;
pub const PLAYER_START: f32 = 50.0;
pub const PLAYER_MIN: f32 = 10.0;
pub const PLAYER_MAX: f32 = 90.0;

pub const SPAWN_Y: f32 = -10.0;
pub const SPAWN_X_MIN: f32 = 5.0;
pub const SPAWN_X_MAX: f32 = 95.0;
pub const FALL_STEP: f32 = 2.0;
pub const CATCH_TOP: f32 = 85.0;
pub const CATCH_BOTTOM: f32 = 95.0;
pub const CATCH_REACH: f32 = 15.0;
pub const MISS_Y: f32 = 100.0;

pub const POINTS_PER_CATCH: u32 = 10;
pub const POINTS_PER_COIN: u32 = 5;

const ADVANCE_EVERY: Duration = Duration::from_millis(50);
const SPAWN_EVERY: Duration = Duration::from_millis(800);
const COUNTDOWN_EVERY: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FallingObject {
    pub id: u64,
    pub x: f32,
    pub y: f32,
}

impl FallingObject {
    fn in_catch_band(&self) -> bool {
        self.y > CATCH_TOP && self.y < CATCH_BOTTOM
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GameEvent {
    Advance,
    Spawn,
    Countdown,
}

pub struct MiniGame {
    phase: Phase,
    score: u32,
    time_left: u32,
    player_x: f32,
    objects: Vec<FallingObject>,
    next_id: u64,
    timers: Scheduler<GameEvent>,
    rng: StdRng,
}

impl MiniGame {
    pub fn new(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            phase: Phase::Idle,
            score: 0,
            time_left: ROUND_SECS,
            player_x: PLAYER_START,
            objects: Vec::new(),
            next_id: 0,
            timers: Scheduler::new(),
            rng,
        }
    }

    pub fn start(&mut self) {
        self.score = 0;
        self.time_left = ROUND_SECS;
        self.player_x = PLAYER_START;
        self.objects.clear();
        self.timers.cancel_all();
        self.timers.every(ADVANCE_EVERY, GameEvent::Advance);
        self.timers.every(SPAWN_EVERY, GameEvent::Spawn);
        self.timers.every(COUNTDOWN_EVERY, GameEvent::Countdown);
        self.phase = Phase::Running;
        info!("mini-game started");
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn player_position(&self) -> f32 {
        self.player_x
    }

    pub fn objects(&self) -> &[FallingObject] {
        &self.objects
    }

    pub fn move_player(&mut self, x: f32) {
        if x.is_nan() {
            return;
        }
        self.player_x = x.clamp(PLAYER_MIN, PLAYER_MAX);
    }

    pub fn nudge_player(&mut self, dx: f32) {
        self.move_player(self.player_x + dx);
    }

    /// Runs game time forward. Does nothing unless the round is running.
    pub fn advance(&mut self, dt: Duration) {
        if self.phase != Phase::Running {
            return;
        }
        let deadline = self.timers.deadline(dt);
        while let Some(ev) = self.timers.poll(deadline) {
            match ev {
                GameEvent::Advance => self.step_objects(),
                GameEvent::Spawn => self.spawn(),
                GameEvent::Countdown => self.count_down(),
            }
            if self.phase != Phase::Running {
                break;
            }
        }
        self.timers.settle(deadline);
    }

    fn spawn(&mut self) {
        let x = self.rng.gen_range(SPAWN_X_MIN..SPAWN_X_MAX);
        self.spawn_at(x);
    }

    fn spawn_at(&mut self, x: f32) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.objects.push(FallingObject { id, x, y: SPAWN_Y });
        id
    }

    fn step_objects(&mut self) {
        let player_x = self.player_x;
        let mut caught = 0u32;
        self.objects.retain_mut(|o| {
            o.y += FALL_STEP;
            if o.in_catch_band() && (o.x - player_x).abs() < CATCH_REACH {
                caught += 1;
                return false;
            }
            o.y < MISS_Y
        });
        if caught > 0 {
            self.score += caught * POINTS_PER_CATCH;
            debug!(caught, score = self.score, "caught");
        }
    }

    fn count_down(&mut self) {
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.timers.cancel_all();
            self.phase = Phase::Finished;
            info!(score = self.score, "mini-game over");
        }
    }

    /// Coins the current score is worth.
    pub fn earnings(&self) -> u32 {
        self.score / POINTS_PER_COIN
    }

    /// Ends the game and reports what it earned. Consumes the engine.
    pub fn finish(self) -> Result<u32, PetError> {
        match self.phase {
            Phase::Finished => Ok(self.earnings()),
            Phase::Running => Err(PetError::GameNotFinished),
            Phase::Idle => Err(PetError::NoActiveGame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn running(seed: u64) -> MiniGame {
        let mut g = MiniGame::new(seed);
        g.start();
        g
    }

    #[test]
    fn start_resets_round() {
        let g = running(1);
        assert_eq!(g.phase(), Phase::Running);
        assert_eq!(g.score(), 0);
        assert_eq!(g.time_left(), 30);
        assert_eq!(g.player_position(), 50.0);
        assert!(g.objects().is_empty());
    }

    #[test]
    fn idle_game_does_not_move() {
        let mut g = MiniGame::new(1);
        g.advance(ms(5000));
        assert_eq!(g.phase(), Phase::Idle);
        assert!(g.objects().is_empty());
        assert_eq!(g.finish(), Err(PetError::NoActiveGame));
    }

    #[test]
    fn spawn_happens_every_800ms_within_bounds() {
        let mut g = running(7);
        g.advance(ms(799));
        assert!(g.objects().is_empty());
        g.advance(ms(1));
        assert_eq!(g.objects().len(), 1);
        let o = g.objects()[0];
        assert_eq!(o.y, SPAWN_Y);
        assert!((SPAWN_X_MIN..SPAWN_X_MAX).contains(&o.x));
    }

    #[test]
    fn object_reaches_catch_band_after_48_steps() {
        let mut g = running(3);
        g.advance(ms(800));
        let x = g.objects()[0].x;
        g.move_player(x);
        g.advance(ms(47 * 50));
        let first = g.objects().iter().find(|o| o.id == 0).copied().unwrap();
        assert_eq!(first.y, 84.0);
        assert_eq!(g.score(), 0);
        g.advance(ms(50));
        assert!(g.objects().iter().all(|o| o.id != 0));
        assert_eq!(g.score(), 10);
    }

    #[test]
    fn object_out_of_reach_is_missed() {
        let mut g = MiniGame::new(3);
        g.start();
        let id = g.spawn_at(80.0);
        g.move_player(10.0);
        for _ in 0..60 {
            g.step_objects();
        }
        assert!(g.objects().iter().all(|o| o.id != id));
        assert_eq!(g.score(), 0);
    }

    #[test]
    fn catch_reach_is_strict() {
        let mut g = MiniGame::new(3);
        g.start();
        g.move_player(50.0);
        g.spawn_at(65.0);
        g.spawn_at(64.5);
        for _ in 0..48 {
            g.step_objects();
        }
        assert_eq!(g.score(), 10);
        assert_eq!(g.objects().len(), 1);
        assert_eq!(g.objects()[0].x, 65.0);
    }

    #[test]
    fn player_is_clamped() {
        let mut g = running(1);
        g.move_player(-40.0);
        assert_eq!(g.player_position(), PLAYER_MIN);
        g.move_player(400.0);
        assert_eq!(g.player_position(), PLAYER_MAX);
        g.nudge_player(-5.0);
        assert_eq!(g.player_position(), 85.0);
        g.move_player(f32::NAN);
        assert_eq!(g.player_position(), 85.0);
    }

    #[test]
    fn round_ends_after_thirty_seconds_and_freezes() {
        let mut g = running(9);
        g.advance(ms(29_999));
        assert_eq!(g.phase(), Phase::Running);
        assert_eq!(g.time_left(), 1);
        g.advance(ms(1));
        assert_eq!(g.phase(), Phase::Finished);
        assert_eq!(g.time_left(), 0);

        let snapshot: Vec<_> = g.objects().to_vec();
        let score = g.score();
        g.advance(ms(10_000));
        assert_eq!(g.objects(), snapshot.as_slice());
        assert_eq!(g.score(), score);
    }

    #[test]
    fn finish_converts_score_to_coins() {
        let mut g = running(1);
        g.advance(ms(30_000));
        g.score = 47;
        assert_eq!(g.finish(), Ok(9));
    }

    #[test]
    fn finish_while_running_is_rejected() {
        let g = running(1);
        assert_eq!(g.finish(), Err(PetError::GameNotFinished));
    }

    #[test]
    fn restart_clears_previous_round() {
        let mut g = running(2);
        g.advance(ms(5_000));
        g.move_player(20.0);
        g.start();
        assert!(g.objects().is_empty());
        assert_eq!(g.player_position(), 50.0);
        assert_eq!(g.time_left(), 30);
        g.advance(ms(799));
        assert!(g.objects().is_empty());
    }
}
