//! The live pet: state, timers, mood, voice and the optional mini-game, owned in one place.
//!
//! Every public method is one complete read-modify-write of the state followed by a save, so
//! no caller ever observes a half-applied action. Time only moves through
//! [`Session::advance`]; the front end feeds it frame deltas and tests feed it whatever they
//! like.

use crate::catalog;
use crate::clock::{Scheduler, TimerId};
use crate::error::PetError;
use crate::minigame::{MiniGame, Phase};
use crate::model::{Mood, Rules, SimulationState};
use crate::mood::classify;
use crate::sim::{catch_up, WashStart};
use crate::storage::Persistence;
use crate::voice::{Speech, Utterance, VoiceBackend, ALIEN_VOICE};
use chrono::{DateTime, Utc};
use std::sync::mpsc::TryRecvError;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PetEvent {
    Decay,
    WashDone,
    EatingOver,
}

pub struct SessionOptions {
    pub rules: Rules,
    pub seed: u64,
    pub catch_up_offline: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            rules: Rules::default(),
            seed: 0,
            catch_up_offline: false,
        }
    }
}

pub struct Session<P: Persistence> {
    state: SimulationState,
    rules: Rules,
    mood: Mood,
    timers: Scheduler<PetEvent>,
    wash_timer: Option<TimerId>,
    eating_timer: Option<TimerId>,
    listening: Option<Utterance>,
    last_speech: Option<Speech>,
    voice: Box<dyn VoiceBackend>,
    game: Option<MiniGame>,
    games_started: u64,
    seed: u64,
    store: P,
}

impl<P: Persistence> Session<P> {
    /// Loads the saved pet (or a new one) and starts the decay clock.
    pub fn open(
        store: P,
        voice: Box<dyn VoiceBackend>,
        opts: SessionOptions,
        now: DateTime<Utc>,
    ) -> Self {
        let loaded = store.load();
        let resumed = loaded.is_some();
        let mut state = loaded.unwrap_or_else(|| SimulationState::new_default(now));

        let mut caught_up = 0;
        if resumed && opts.catch_up_offline {
            let last_seen = state.last_update;
            caught_up = catch_up(&mut state, last_seen, now, &opts.rules);
            info!(ticks = caught_up, "caught up offline decay");
        }

        let mut timers = Scheduler::new();
        timers.every(
            Duration::from_millis(opts.rules.tick_interval_ms),
            PetEvent::Decay,
        );

        // A wash interrupted by a restart still has to finish.
        let wash_timer = state.is_washing.then(|| {
            timers.once(
                Duration::from_millis(opts.rules.wash_duration_ms),
                PetEvent::WashDone,
            )
        });

        let mut session = Self {
            state,
            rules: opts.rules,
            mood: Mood::Happy,
            timers,
            wash_timer,
            eating_timer: None,
            listening: None,
            last_speech: None,
            voice,
            game: None,
            games_started: 0,
            seed: opts.seed,
            store,
        };
        session.refresh_mood();
        if caught_up > 0 {
            session.persist();
        }
        info!(resumed, coins = session.state.coins, level = session.state.level, "session open");
        session
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn is_listening(&self) -> bool {
        self.listening.is_some()
    }

    pub fn last_speech(&self) -> Option<&Speech> {
        self.last_speech.as_ref()
    }

    pub fn voice_available(&self) -> bool {
        self.voice.is_available()
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn minigame(&self) -> Option<&MiniGame> {
        self.game.as_ref()
    }

    pub fn minigame_mut(&mut self) -> Option<&mut MiniGame> {
        self.game.as_mut()
    }

    /// Runs every timer that falls due within `dt`, in time order, then the mini-game.
    pub fn advance(&mut self, dt: Duration) {
        let deadline = self.timers.deadline(dt);
        while let Some(ev) = self.timers.poll(deadline) {
            self.handle(ev);
        }
        self.timers.settle(deadline);

        self.poll_voice();

        if let Some(game) = self.game.as_mut() {
            game.advance(dt);
        }
    }

    fn handle(&mut self, ev: PetEvent) {
        match ev {
            PetEvent::Decay => {
                let secs = self.rules.tick_interval_ms as f32 / 1000.0;
                self.state.tick(&self.rules, secs);
            }
            PetEvent::WashDone => {
                self.wash_timer = None;
                self.state.finish_wash();
                info!("wash finished");
            }
            PetEvent::EatingOver => {
                self.eating_timer = None;
                self.refresh_mood();
                return;
            }
        }
        self.refresh_mood();
        self.persist();
    }

    pub fn feed(&mut self, item_id: &str) -> Result<(), PetError> {
        let item = catalog::find(item_id)?;
        self.state.feed(item)?;
        debug!(item = item.id, coins = self.state.coins, "fed");

        if let Some(old) = self.eating_timer.take() {
            self.timers.cancel(old);
        }
        self.eating_timer = Some(self.timers.once(
            Duration::from_millis(self.rules.eating_duration_ms),
            PetEvent::EatingOver,
        ));
        self.refresh_mood();
        self.persist();
        Ok(())
    }

    pub fn toggle_sleep(&mut self) {
        self.state.toggle_sleep();
        debug!(sleeping = self.state.is_sleeping, "sleep toggled");
        self.refresh_mood();
        self.persist();
    }

    pub fn start_wash(&mut self) -> WashStart {
        let started = self.state.start_wash();
        if started == WashStart::Started {
            self.wash_timer = Some(self.timers.once(
                Duration::from_millis(self.rules.wash_duration_ms),
                PetEvent::WashDone,
            ));
            info!("wash started");
            self.refresh_mood();
            self.persist();
        }
        started
    }

    pub fn purchase(&mut self, item_id: &str) -> Result<(), PetError> {
        let item = catalog::find(item_id)?;
        self.state.purchase(item)?;
        info!(item = item.id, coins = self.state.coins, "bought");
        self.persist();
        Ok(())
    }

    pub fn equip(&mut self, hat: Option<&str>) -> Result<(), PetError> {
        self.state.equip(hat)?;
        self.persist();
        Ok(())
    }

    pub fn begin_listening(&mut self) -> Result<(), PetError> {
        let rx = self.voice.begin_listening().map_err(|e| {
            warn!(error = %e, "cannot listen");
            e
        })?;
        self.listening = Some(rx);
        self.refresh_mood();
        Ok(())
    }

    pub fn stop_listening(&mut self) {
        if self.listening.take().is_some() {
            self.refresh_mood();
        }
    }

    fn poll_voice(&mut self) {
        let Some(rx) = self.listening.as_ref() else {
            return;
        };
        match rx.try_recv() {
            Ok(text) => {
                self.listening = None;
                self.voice.speak(&text, ALIEN_VOICE);
                self.last_speech = Some(Speech {
                    text,
                    params: ALIEN_VOICE,
                });
                self.refresh_mood();
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.listening = None;
                self.refresh_mood();
            }
        }
    }

    /// Starts a fresh round, replacing any round that was already open.
    pub fn start_minigame(&mut self) -> &mut MiniGame {
        let seed = self.seed ^ self.games_started.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        self.games_started += 1;
        let game = self.game.insert(MiniGame::new(seed));
        game.start();
        game
    }

    /// Claims the reward of a finished round. The round is gone afterwards.
    pub fn collect_minigame(&mut self) -> Result<u32, PetError> {
        match self.game.as_ref().map(MiniGame::phase) {
            None | Some(Phase::Idle) => return Err(PetError::NoActiveGame),
            Some(Phase::Running) => return Err(PetError::GameNotFinished),
            Some(Phase::Finished) => {}
        }
        let game = self.game.take().ok_or(PetError::NoActiveGame)?;
        let earned = game.finish()?;
        self.state.apply_minigame_reward(&self.rules, earned);
        info!(earned, level = self.state.level, "mini-game reward collected");
        self.refresh_mood();
        self.persist();
        Ok(earned)
    }

    /// Closes the game window. Whatever was on the board is forfeited.
    pub fn close_minigame(&mut self) -> bool {
        let closed = self.game.take().is_some();
        if closed {
            debug!("mini-game closed without collecting");
        }
        closed
    }

    /// Cancels every pending timer and writes a final snapshot.
    pub fn shutdown(mut self) -> P {
        for id in [self.wash_timer.take(), self.eating_timer.take()]
            .into_iter()
            .flatten()
        {
            self.timers.cancel(id);
        }
        self.timers.cancel_all();
        self.game = None;
        self.listening = None;
        self.persist();
        self.store
    }

    fn refresh_mood(&mut self) {
        let st = &self.state;
        let listening = self.listening.is_some();
        let override_mood = self.eating_timer.map(|_| Mood::Eating);
        self.mood = match classify(&st.stats, st.is_sleeping, st.is_washing, listening, override_mood)
        {
            Some(m) => m,
            // asleep: the shown mood stays unless whatever caused it is over
            None if self.transient_ended() => {
                classify(&st.stats, false, st.is_washing, listening, None).unwrap_or(Mood::Happy)
            }
            None => self.mood,
        };
    }

    fn transient_ended(&self) -> bool {
        match self.mood {
            Mood::Eating => self.eating_timer.is_none(),
            Mood::Washing => !self.state.is_washing,
            Mood::Listening => self.listening.is_none(),
            Mood::Happy | Mood::Sad | Mood::Angry | Mood::Sleepy => false,
        }
    }

    fn persist(&mut self) {
        self.state.last_update = Utc::now();
        if let Err(e) = self.store.save(&self.state) {
            warn!(error = %e, "save failed");
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_timers(&self) -> usize {
        self.timers.pending()
    }
}
