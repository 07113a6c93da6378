//! Score tally fed by outcome events
//!
//! Counts each successful challenge exactly once, so replaying a drained
//! event batch or listening and draining at the same time never double
//! counts.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::sim::events::{EventListener, GameEvent, OutcomeNotice};

/// Running score for one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreTally {
    total: u64,
    successes: u32,
    failures: u32,
    counted: HashSet<u32>,
    /// Total announced by the core when the session finished
    final_total: Option<u64>,
}

impl ScoreTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one outcome; returns true if it changed the tally
    pub fn record(&mut self, notice: &OutcomeNotice) -> bool {
        if !self.counted.insert(notice.challenge_id) {
            return false;
        }
        if notice.success {
            self.total += notice.reward as u64;
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        true
    }

    /// Feed a drained batch of events
    pub fn consume<'a>(&mut self, events: impl IntoIterator<Item = &'a GameEvent>) {
        for event in events {
            self.on_event(event);
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn successes(&self) -> u32 {
        self.successes
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Share of resolved challenges that succeeded (0 when none resolved)
    pub fn success_rate(&self) -> f32 {
        let resolved = self.successes + self.failures;
        if resolved == 0 {
            return 0.0;
        }
        self.successes as f32 / resolved as f32
    }

    pub fn final_total(&self) -> Option<u64> {
        self.final_total
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl EventListener for ScoreTally {
    fn on_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Outcome(notice) => {
                self.record(notice);
            }
            GameEvent::SessionComplete { total_reward } => {
                if *total_reward != self.total {
                    log::warn!(
                        "Tally {} disagrees with session total {}",
                        self.total,
                        total_reward
                    );
                }
                self.final_total = Some(*total_reward);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TICK_MS;
    use crate::settings::Settings;
    use crate::sim::input::InteractionSample;
    use crate::sim::state::SessionState;
    use crate::sim::tick::{TickInput, tick};
    use glam::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn notice(id: u32, reward: u32, success: bool) -> OutcomeNotice {
        OutcomeNotice {
            challenge_id: id,
            reward,
            success,
            position: Vec2::ZERO,
        }
    }

    #[test]
    fn test_counts_each_challenge_once() {
        let mut tally = ScoreTally::new();
        assert!(tally.record(&notice(1, 10, true)));
        assert!(!tally.record(&notice(1, 10, true)));
        assert!(tally.record(&notice(2, 0, false)));

        assert_eq!(tally.total(), 10);
        assert_eq!(tally.successes(), 1);
        assert_eq!(tally.failures(), 1);
        assert_eq!(tally.success_rate(), 0.5);
    }

    #[test]
    fn test_empty_tally() {
        let tally = ScoreTally::new();
        assert_eq!(tally.total(), 0);
        assert_eq!(tally.success_rate(), 0.0);
        assert!(tally.final_total().is_none());
    }

    #[test]
    fn test_matches_session_total() {
        let shared = Rc::new(RefCell::new(ScoreTally::new()));
        let mut drained = ScoreTally::new();

        let mut state = SessionState::with_builtin_templates(Settings::with_seed(21));
        state.subscribe(Box::new(Rc::clone(&shared)));
        state.start();

        for i in 0..7000 {
            let input = match state.active().first() {
                Some(c) if i % 10 == 0 => {
                    TickInput::with_samples(vec![InteractionSample::tap(c.pos.x, c.pos.y)])
                }
                _ => TickInput::default(),
            };
            tick(&mut state, &input, TICK_MS);

            // Draining twice over the same events must not double count
            let events = state.drain_events();
            drained.consume(&events);
            drained.consume(&events);
        }

        assert!(state.total_reward() > 0);
        assert_eq!(shared.borrow().total(), state.total_reward());
        assert_eq!(drained.total(), state.total_reward());
        assert_eq!(shared.borrow().final_total(), Some(state.total_reward()));
    }
}
