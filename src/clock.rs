//! Virtual-time timers.
//!
//! Nothing here reads the wall clock except [`Ticker`]. A [`Scheduler`] only moves when its
//! owner hands it a deadline, which makes every timer-driven behavior reproducible in tests.
//! Dropping a scheduler drops all of its pending timers, so teardown is cancellation.

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Timer<E> {
    id: TimerId,
    due: Duration,
    period: Option<Duration>,
    event: E,
}

#[derive(Debug)]
pub struct Scheduler<E> {
    now: Duration,
    next_id: u64,
    timers: Vec<Timer<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            timers: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn once(&mut self, delay: Duration, event: E) -> TimerId {
        self.insert(delay, None, event)
    }

    /// First fire is one full `period` from now.
    pub fn every(&mut self, period: Duration, event: E) -> TimerId {
        let period = period.max(Duration::from_millis(1));
        self.insert(period, Some(period), event)
    }

    fn insert(&mut self, delay: Duration, period: Option<Duration>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            due: self.now + delay,
            period,
            event,
        });
        id
    }

    /// Returns true if the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn deadline(&self, dt: Duration) -> Duration {
        self.now + dt
    }

    /// Pops the earliest timer due at or before `deadline` and moves `now` to its due time.
    /// Ties fire in registration order. Call [`Scheduler::settle`] once this returns `None`.
    pub fn poll(&mut self, deadline: Duration) -> Option<E>
    where
        E: Clone,
    {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= deadline)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(i, _)| i)?;

        let due = self.timers[idx].due;
        self.now = self.now.max(due);

        match self.timers[idx].period {
            Some(period) => {
                let timer = &mut self.timers[idx];
                timer.due += period;
                Some(timer.event.clone())
            }
            None => Some(self.timers.swap_remove(idx).event),
        }
    }

    pub fn settle(&mut self, deadline: Duration) {
        self.now = self.now.max(deadline);
    }

    /// Convenience for owners that need no work between events.
    pub fn advance(&mut self, dt: Duration) -> Vec<E>
    where
        E: Clone,
    {
        let deadline = self.deadline(dt);
        let mut fired = Vec::new();
        while let Some(ev) = self.poll(deadline) {
            fired.push(ev);
        }
        self.settle(deadline);
        fired
    }
}

/// Measures real frame time for the front end.
pub struct Ticker {
    last: Instant,
    max_step: Duration,
}

impl Ticker {
    pub fn start(max_step: Duration) -> Self {
        Self {
            last: Instant::now(),
            max_step,
        }
    }

    /// Time since the previous lap, clamped so a suspended terminal does not replay minutes
    /// of mini-game in a single frame.
    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last);
        self.last = now;
        dt.min(self.max_step)
    }

    /// Blocks until `frame` has passed since the last lap. Coarse sleeps first, then a short
    /// spin so the frame ends close to on time.
    pub fn pace(&self, frame: Duration) {
        let end = self.last + frame;
        while let Some(left) = end.checked_duration_since(Instant::now()) {
            if left.is_zero() {
                break;
            }
            if left > Duration::from_millis(2) {
                std::thread::sleep(left - Duration::from_millis(1));
            } else {
                std::hint::spin_loop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn periodic_fires_once_per_period() {
        let mut s = Scheduler::new();
        s.every(ms(1000), "tick");
        assert!(s.advance(ms(999)).is_empty());
        assert_eq!(s.advance(ms(1)), vec!["tick"]);
        assert_eq!(s.advance(ms(3000)).len(), 3);
        assert_eq!(s.now(), ms(4000));
    }

    #[test]
    fn one_shot_fires_exactly_once() {
        let mut s = Scheduler::new();
        s.once(ms(3000), 'w');
        assert_eq!(s.advance(ms(10_000)), vec!['w']);
        assert!(s.advance(ms(10_000)).is_empty());
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut s = Scheduler::new();
        let id = s.once(ms(50), 1);
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(s.advance(ms(100)).is_empty());
    }

    #[test]
    fn coincident_deadlines_fire_in_registration_order() {
        let mut s = Scheduler::new();
        s.every(ms(50), "advance");
        s.every(ms(800), "spawn");
        let fired = s.advance(ms(800));
        assert_eq!(fired.len(), 17);
        assert_eq!(&fired[15..], &["advance", "spawn"]);
    }

    #[test]
    fn pace_waits_out_the_rest_of_the_frame() {
        let mut t = Ticker::start(Duration::from_millis(250));
        t.lap();
        let before = Instant::now();
        t.pace(ms(5));
        assert!(before.elapsed() + ms(1) >= ms(5));
        assert!(t.lap() >= ms(5));
    }

    #[test]
    fn lap_is_clamped() {
        let mut t = Ticker::start(ms(1));
        std::thread::sleep(ms(5));
        assert_eq!(t.lap(), ms(1));
    }

    #[test]
    fn events_interleave_in_time_order() {
        let mut s = Scheduler::new();
        s.every(ms(300), 'a');
        s.once(ms(500), 'b');
        assert_eq!(s.advance(ms(1000)), vec!['a', 'b', 'a', 'a']);
    }
}
