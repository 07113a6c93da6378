//! Adaptive difficulty controller
//!
//! Closed loop: the resolver reports every terminal outcome here, and the
//! generator asks for an effective difficulty and a scaled time limit when it
//! spawns. Adjustments are driven by consecutive-result streaks (hysteresis)
//! and rate-limited by a cooldown. The rolling history window is kept for
//! statistics only.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::stage::Phase;
use crate::clamp_difficulty;
use crate::consts::*;

/// A single terminal outcome reported by the resolver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub success: bool,
    /// Difficulty the challenge was spawned at
    pub difficulty: u8,
    /// Time from spawn to completion (successes only)
    pub completion_ms: Option<f64>,
    /// Session clock when the outcome happened
    pub timestamp_ms: f64,
}

impl OutcomeRecord {
    pub fn success(difficulty: u8, completion_ms: f64, timestamp_ms: f64) -> Self {
        Self {
            success: true,
            difficulty,
            completion_ms: Some(completion_ms),
            timestamp_ms,
        }
    }

    pub fn failure(difficulty: u8, timestamp_ms: f64) -> Self {
        Self {
            success: false,
            difficulty,
            completion_ms: None,
            timestamp_ms,
        }
    }
}

/// Direction of a modifier change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Adjustment {
    Harder,
    Easier,
}

/// Whether a streak is being held back by a modifier bound
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionStatus {
    /// Failures keep accruing but the modifier is already at its floor
    pub decrease_blocked: bool,
    /// Successes keep accruing but the modifier is already at its ceiling
    pub increase_blocked: bool,
}

impl ProtectionStatus {
    pub fn is_active(&self) -> bool {
        self.decrease_blocked || self.increase_blocked
    }
}

/// Summary of the rolling performance window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerformanceStats {
    pub samples: usize,
    /// Successes / samples (0 when empty)
    pub success_rate: f32,
    /// Mean completion time over successful samples
    pub average_completion_ms: Option<f64>,
    /// Mean difficulty over all samples
    pub average_difficulty: f32,
}

/// Streak and cooldown tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyTuning {
    pub streak_threshold: u32,
    pub cooldown_ms: f64,
}

impl Default for DifficultyTuning {
    fn default() -> Self {
        Self {
            streak_threshold: STREAK_THRESHOLD,
            cooldown_ms: ADJUSTMENT_COOLDOWN_MS,
        }
    }
}

/// Difficulty state plus the rules that move it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyController {
    modifier: i8,
    history: VecDeque<OutcomeRecord>,
    consecutive_successes: u32,
    consecutive_failures: u32,
    last_adjustment_ms: f64,
    tuning: DifficultyTuning,
}

impl Default for DifficultyController {
    fn default() -> Self {
        Self::new(DifficultyTuning::default())
    }
}

impl DifficultyController {
    pub fn new(tuning: DifficultyTuning) -> Self {
        Self {
            modifier: 0,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
            consecutive_successes: 0,
            consecutive_failures: 0,
            last_adjustment_ms: 0.0,
            tuning,
        }
    }

    /// Clear all performance state (tuning is kept)
    pub fn reset(&mut self) {
        *self = Self::new(self.tuning);
    }

    pub fn modifier(&self) -> i8 {
        self.modifier
    }

    pub fn consecutive_successes(&self) -> u32 {
        self.consecutive_successes
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_adjustment_ms(&self) -> f64 {
        self.last_adjustment_ms
    }

    /// Rolling window, oldest first
    pub fn history(&self) -> impl Iterator<Item = &OutcomeRecord> {
        self.history.iter()
    }

    /// Difficulty of the phase itself after the modifier
    pub fn current_difficulty(&self, phase: &Phase) -> u8 {
        clamp_difficulty(phase.base_difficulty as i32 + self.modifier as i32)
    }

    /// Difficulty a template spawns at during `phase`
    pub fn effective_difficulty(&self, template_base: u8, phase: &Phase) -> u8 {
        clamp_difficulty(
            template_base as i32 + phase.base_difficulty as i32 - 1 + self.modifier as i32,
        )
    }

    /// Record an outcome and apply any streak adjustment.
    ///
    /// Returns the adjustment made, if any.
    pub fn record_outcome(&mut self, outcome: OutcomeRecord) -> Option<Adjustment> {
        self.history.push_back(outcome);
        while self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }

        if outcome.success {
            self.consecutive_successes += 1;
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures += 1;
            self.consecutive_successes = 0;
        }

        self.evaluate(outcome.timestamp_ms)
    }

    fn evaluate(&mut self, now_ms: f64) -> Option<Adjustment> {
        let cooled_down = now_ms - self.last_adjustment_ms >= self.tuning.cooldown_ms;
        let threshold = self.tuning.streak_threshold;

        let adjustment = if self.consecutive_successes >= threshold
            && self.modifier < MAX_MODIFIER
            && cooled_down
        {
            self.modifier += 1;
            Adjustment::Harder
        } else if self.consecutive_failures >= threshold
            && self.modifier > MIN_MODIFIER
            && cooled_down
        {
            self.modifier -= 1;
            Adjustment::Easier
        } else {
            return None;
        };

        self.consecutive_successes = 0;
        self.consecutive_failures = 0;
        self.last_adjustment_ms = now_ms;
        log::info!(
            "Difficulty {:?}: modifier now {} at {:.0}ms",
            adjustment,
            self.modifier,
            now_ms
        );
        Some(adjustment)
    }

    /// Which direction a full streak is currently pinned against a bound
    pub fn protection_status(&self) -> ProtectionStatus {
        let threshold = self.tuning.streak_threshold;
        ProtectionStatus {
            decrease_blocked: self.modifier <= MIN_MODIFIER
                && self.consecutive_failures >= threshold,
            increase_blocked: self.modifier >= MAX_MODIFIER
                && self.consecutive_successes >= threshold,
        }
    }

    pub fn stats(&self) -> PerformanceStats {
        let samples = self.history.len();
        if samples == 0 {
            return PerformanceStats::default();
        }
        let successes = self.history.iter().filter(|o| o.success).count();
        let durations: Vec<f64> = self.history.iter().filter_map(|o| o.completion_ms).collect();
        let average_completion_ms =
            (!durations.is_empty()).then(|| durations.iter().sum::<f64>() / durations.len() as f64);
        let difficulty_sum: u32 = self.history.iter().map(|o| o.difficulty as u32).sum();

        PerformanceStats {
            samples,
            success_rate: successes as f32 / samples as f32,
            average_completion_ms,
            average_difficulty: difficulty_sum as f32 / samples as f32,
        }
    }

    /// True when every invariant on the state holds (checked on restore)
    pub fn is_consistent(&self) -> bool {
        (MIN_MODIFIER..=MAX_MODIFIER).contains(&self.modifier)
            && self.history.len() <= HISTORY_CAPACITY
            && (self.consecutive_successes == 0 || self.consecutive_failures == 0)
            && self.last_adjustment_ms.is_finite()
    }
}

/// Time limit after difficulty scaling: max(1000, round(base * multiplier))
pub fn scaled_time_limit(base_ms: f64, difficulty: u8) -> f64 {
    let index = clamp_difficulty(difficulty as i32) as usize - 1;
    (base_ms * TIME_LIMIT_MULTIPLIERS[index])
        .round()
        .max(MIN_TIME_LIMIT_MS)
}
