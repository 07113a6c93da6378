//! Per-tick session update
//!
//! Step order is fixed: resolve samples, age challenges (and sweep the
//! failed ones), advance the stage clock, run the generator. A sample can
//! therefore never hit a challenge spawned in the same tick, and a challenge
//! that times out this tick can still be completed by this tick's samples.

use super::events::GameEvent;
use super::generator::SpawnContext;
use super::input::InteractionSample;
use super::resolver::{resolve_sample, sweep_failed};
use super::state::{SessionState, SessionStatus};

/// Input gathered by the host for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Samples captured since the previous tick, in arrival order
    pub samples: Vec<InteractionSample>,
    /// Pause toggle
    pub pause: bool,
}

impl TickInput {
    pub fn with_samples(samples: Vec<InteractionSample>) -> Self {
        Self {
            samples,
            pause: false,
        }
    }
}

/// Advance the session by `dt` milliseconds
pub fn tick(state: &mut SessionState, input: &TickInput, dt: f64) {
    // Handle pause toggle
    if input.pause {
        match state.status {
            SessionStatus::Running => {
                state.status = SessionStatus::Paused;
                log::info!("Session paused");
                return;
            }
            SessionStatus::Paused => {
                state.status = SessionStatus::Running;
                log::info!("Session resumed");
            }
            _ => {}
        }
    }

    // Nothing moves while idle or paused
    if matches!(state.status, SessionStatus::Idle | SessionStatus::Paused) {
        return;
    }

    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

    // 1. Resolve buffered samples, then this tick's
    let queued = std::mem::take(&mut state.pending_samples);
    for sample in queued.iter().chain(input.samples.iter()) {
        resolve_sample(state, sample);
    }

    // 2. Age active challenges, then drop the ones that timed out
    let movement = state.movement_area();
    for challenge in &mut state.active {
        challenge.age(dt, &movement, &mut state.rng);
    }
    sweep_failed(state);

    // A finished life keeps resolving what is on screen but spawns nothing
    if state.status == SessionStatus::Finished {
        return;
    }

    // 3. Advance the stage clock, announcing every phase crossed
    for phase in state.clock.advance(dt) {
        log::info!(
            "Entering {} (base difficulty {}) by {:.0}ms",
            phase.name,
            phase.base_difficulty,
            state.clock.elapsed_ms()
        );
        state.events.emit(GameEvent::PhaseEntered { phase: phase.id });
    }
    if state.clock.is_complete() {
        state.status = SessionStatus::Finished;
        let total_reward = state.total_reward();
        log::info!("Session complete: total reward {}", total_reward);
        state.events.emit(GameEvent::SessionComplete { total_reward });
        return;
    }

    // 4. Spawn
    let Some(phase) = state.clock.current_phase() else {
        return;
    };
    let ctx = SpawnContext {
        phase,
        templates: state.templates.as_ref(),
        difficulty: &state.difficulty,
        surface: state.surface,
        now_ms: state.clock.elapsed_ms(),
    };
    let first_new = state.active.len();
    state.generator.update(
        dt,
        &ctx,
        &mut state.active,
        &mut state.next_id,
        &mut state.rng,
    );
    for challenge in &state.active[first_new..] {
        state.events.emit(GameEvent::ChallengeSpawned {
            challenge_id: challenge.id,
            name: challenge.template.name.clone(),
            kind: challenge.kind(),
            difficulty: challenge.difficulty,
            position: challenge.pos,
        });
    }
}
