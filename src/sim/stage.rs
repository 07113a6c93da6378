//! Life stages and the clock that walks through them
//!
//! The phase table is static data. The clock owns nothing but elapsed time;
//! the current phase is always derived from it, so a phase can never be
//! skipped or re-entered.

use serde::{Deserialize, Serialize};

/// Identifier of a life stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PhaseId {
    Infancy,
    Childhood,
    Adolescence,
    Adulthood,
    Elder,
}

/// One entry of the static phase timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phase {
    pub id: PhaseId,
    pub name: &'static str,
    /// Offset from session start (ms)
    pub start_ms: f64,
    pub duration_ms: f64,
    /// Base difficulty 1..=5
    pub base_difficulty: u8,
}

impl Phase {
    /// End offset (exclusive)
    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }
}

/// The life timeline, ordered by strictly increasing start offset
pub const PHASES: [Phase; 5] = [
    Phase {
        id: PhaseId::Infancy,
        name: "Infancy",
        start_ms: 0.0,
        duration_ms: 15_000.0,
        base_difficulty: 1,
    },
    Phase {
        id: PhaseId::Childhood,
        name: "Childhood",
        start_ms: 15_000.0,
        duration_ms: 20_000.0,
        base_difficulty: 2,
    },
    Phase {
        id: PhaseId::Adolescence,
        name: "Adolescence",
        start_ms: 35_000.0,
        duration_ms: 20_000.0,
        base_difficulty: 3,
    },
    Phase {
        id: PhaseId::Adulthood,
        name: "Adulthood",
        start_ms: 55_000.0,
        duration_ms: 25_000.0,
        base_difficulty: 4,
    },
    Phase {
        id: PhaseId::Elder,
        name: "Elder",
        start_ms: 80_000.0,
        duration_ms: 20_000.0,
        base_difficulty: 3,
    },
];

/// Total session length: end of the final phase
pub fn total_duration_ms() -> f64 {
    PHASES[PHASES.len() - 1].end_ms()
}

/// Phase active at elapsed time `t` (scan from the end, last match wins)
pub fn phase_at(t: f64) -> &'static Phase {
    PHASES
        .iter()
        .rev()
        .find(|p| p.start_ms <= t)
        .unwrap_or(&PHASES[0])
}

/// Elapsed-time clock over [`PHASES`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageClock {
    elapsed_ms: f64,
    started: bool,
}

impl StageClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin the timeline; the phase becomes the first entry
    pub fn start(&mut self) {
        self.started = true;
    }

    /// Back to pre-start: elapsed 0, no phase
    pub fn reset(&mut self) {
        self.elapsed_ms = 0.0;
        self.started = false;
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Add `dt` to elapsed time.
    ///
    /// Returns every phase entered during this step, in table order. A
    /// single large step can cross several boundaries. Ignored before
    /// start, after completion, and for non-finite or negative deltas.
    pub fn advance(&mut self, dt: f64) -> Vec<&'static Phase> {
        if !self.started || self.is_complete() || !dt.is_finite() || dt <= 0.0 {
            return Vec::new();
        }
        let before = self.elapsed_ms;
        self.elapsed_ms = (self.elapsed_ms + dt).min(total_duration_ms());
        let after = self.elapsed_ms;
        PHASES
            .iter()
            .filter(|p| p.start_ms > before && p.start_ms <= after)
            .collect()
    }

    /// Current phase, or `None` before the clock has been started
    pub fn current_phase(&self) -> Option<&'static Phase> {
        self.started.then(|| phase_at(self.elapsed_ms))
    }

    /// Fraction of the current phase elapsed, in [0, 1]
    pub fn phase_progress(&self) -> f32 {
        match self.current_phase() {
            Some(phase) => {
                ((self.elapsed_ms - phase.start_ms) / phase.duration_ms).clamp(0.0, 1.0) as f32
            }
            None => 0.0,
        }
    }

    /// Fraction of the whole session elapsed, in [0, 1]
    pub fn global_progress(&self) -> f32 {
        (self.elapsed_ms / total_duration_ms()).clamp(0.0, 1.0) as f32
    }

    /// True once elapsed has reached the end of the final phase
    pub fn is_complete(&self) -> bool {
        self.started && self.elapsed_ms >= total_duration_ms()
    }

    /// Elapsed is finite, within the session, and zero until started
    pub fn is_consistent(&self) -> bool {
        self.elapsed_ms.is_finite()
            && (0.0..=total_duration_ms()).contains(&self.elapsed_ms)
            && (self.started || self.elapsed_ms == 0.0)
    }
}
