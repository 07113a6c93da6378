//! Matching interaction samples to active challenges
//!
//! At most one challenge completes per sample. Terminal challenges leave the
//! active set here and nowhere else: completions immediately, failures in
//! the per-tick sweep.

use super::challenge::{Challenge, ChallengeStatus};
use super::difficulty::OutcomeRecord;
use super::events::{GameEvent, OutcomeNotice};
use super::input::InteractionSample;
use super::state::{CompletedChallenge, SessionState};

/// Offer `sample` to active challenges in insertion order.
///
/// Every challenge that passes the hit test handles the sample until one
/// reports completion; iteration stops there. Returns the index of the
/// completed challenge.
pub fn find_completion(active: &mut [Challenge], sample: &InteractionSample) -> Option<usize> {
    let point = sample.point();
    active
        .iter_mut()
        .position(|c| c.is_active() && c.hit_test(point) && c.handle_interaction(sample))
}

/// Resolve one sample against the session.
///
/// Invalid samples and samples that match nothing change no state.
/// Returns the id of the challenge the sample completed.
pub fn resolve_sample(state: &mut SessionState, sample: &InteractionSample) -> Option<u32> {
    if !sample.is_valid(&state.surface) {
        log::debug!("Dropping invalid sample {:?}", sample);
        return None;
    }

    let index = find_completion(&mut state.active, sample)?;
    let challenge = state.active.remove(index);
    let now_ms = state.clock.elapsed_ms();
    let completion_ms = challenge.elapsed_ms();

    if let Some(adjustment) = state.difficulty.record_outcome(OutcomeRecord::success(
        challenge.difficulty,
        completion_ms,
        now_ms,
    )) {
        state.events.emit(GameEvent::DifficultyAdjusted {
            adjustment,
            modifier: state.difficulty.modifier(),
        });
    }

    log::debug!(
        "Completed #{} '{}' in {:.0}ms (+{})",
        challenge.id,
        challenge.template.name,
        completion_ms,
        challenge.reward
    );
    state.events.emit(GameEvent::Outcome(OutcomeNotice {
        challenge_id: challenge.id,
        reward: challenge.reward,
        success: true,
        position: challenge.pos,
    }));

    if !state.completed.iter().any(|c| c.id == challenge.id) {
        state.completed.push(CompletedChallenge {
            id: challenge.id,
            name: challenge.template.name,
            reward: challenge.reward,
            difficulty: challenge.difficulty,
            completion_ms,
            position: challenge.pos,
            completed_at_ms: now_ms,
        });
    }

    Some(challenge.id)
}

/// Remove Failed challenges from the active set, reporting each one.
///
/// Returns the number removed.
pub fn sweep_failed(state: &mut SessionState) -> usize {
    let now_ms = state.clock.elapsed_ms();
    let (failed, kept): (Vec<Challenge>, Vec<Challenge>) = std::mem::take(&mut state.active)
        .into_iter()
        .partition(|c| c.status() == ChallengeStatus::Failed);
    state.active = kept;

    for challenge in &failed {
        log::debug!("Failed #{} '{}'", challenge.id, challenge.template.name);
        if let Some(adjustment) = state
            .difficulty
            .record_outcome(OutcomeRecord::failure(challenge.difficulty, now_ms))
        {
            state.events.emit(GameEvent::DifficultyAdjusted {
                adjustment,
                modifier: state.difficulty.modifier(),
            });
        }
        state.events.emit(GameEvent::Outcome(OutcomeNotice {
            challenge_id: challenge.id,
            reward: 0,
            success: false,
            position: challenge.pos,
        }));
    }

    failed.len()
}
