//! Snapshot/restore of the full session
//!
//! Features:
//! - Versioned JSON envelope
//! - RNG state included, so a restored session replays identically
//! - Invariant checks on restore (corrupted or hand-edited snapshots are
//!   rejected instead of producing an inconsistent session)

use std::collections::HashSet;

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::{Settings, SettingsError};
use crate::sim::bounds::Bounds;
use crate::sim::challenge::Challenge;
use crate::sim::difficulty::DifficultyController;
use crate::sim::events::EventBus;
use crate::sim::generator::ChallengeGenerator;
use crate::sim::input::InteractionSample;
use crate::sim::stage::{PhaseId, StageClock};
use crate::sim::state::{CompletedChallenge, SessionState, SessionStatus};
use crate::sim::templates::ChallengeTemplateProvider;

/// Current snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Reasons a snapshot cannot be restored
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported snapshot version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error("snapshot settings are invalid: {0}")]
    Settings(#[from] SettingsError),
    #[error("difficulty state out of bounds")]
    Difficulty,
    #[error("stage clock out of range")]
    Clock,
    #[error("session status {status:?} does not match the stage clock")]
    StatusMismatch { status: SessionStatus },
    #[error("{count} active challenges exceed the limit of {max}")]
    TooManyActive { count: usize, max: usize },
    #[error("active challenge #{id} is not in the Active state")]
    TerminalInActiveSet { id: u32 },
    #[error("challenge id {id} appears more than once")]
    DuplicateId { id: u32 },
    #[error("next id {next_id} would reuse existing id {max_id}")]
    IdCounter { next_id: u32, max_id: u32 },
    #[error("phase {recorded:?} does not match elapsed time (expected {expected:?})")]
    PhaseMismatch {
        recorded: Option<PhaseId>,
        expected: Option<PhaseId>,
    },
    #[error("reward total {recorded} does not match completed challenges ({computed})")]
    RewardMismatch { recorded: u64, computed: u64 },
}

/// Plain structured record of the complete core state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub settings: Settings,
    pub rng: Pcg32,
    pub status: SessionStatus,
    pub clock: StageClock,
    /// Derived from the clock; stored for inspection and cross-checked
    pub phase: Option<PhaseId>,
    pub difficulty: DifficultyController,
    pub generator: ChallengeGenerator,
    pub active: Vec<Challenge>,
    pub completed: Vec<CompletedChallenge>,
    pub total_reward: u64,
    pub surface: Bounds,
    #[serde(default)]
    pub pending_samples: Vec<InteractionSample>,
    pub next_id: u32,
}

impl Snapshot {
    /// Capture the session
    pub fn capture(state: &SessionState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            settings: state.settings.clone(),
            rng: state.rng.clone(),
            status: state.status,
            clock: state.clock.clone(),
            phase: state.clock.current_phase().map(|p| p.id),
            difficulty: state.difficulty.clone(),
            generator: state.generator.clone(),
            active: state.active.clone(),
            completed: state.completed.clone(),
            total_reward: state.total_reward(),
            surface: state.surface,
            pending_samples: state.pending_samples.clone(),
            next_id: state.next_id,
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check every invariant the session relies on
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        self.settings.validate()?;
        if !self.difficulty.is_consistent() {
            return Err(SnapshotError::Difficulty);
        }
        if !self.clock.is_consistent() {
            return Err(SnapshotError::Clock);
        }
        let status_matches = match self.status {
            SessionStatus::Idle => !self.clock.is_started(),
            SessionStatus::Running | SessionStatus::Paused => {
                self.clock.is_started() && !self.clock.is_complete()
            }
            SessionStatus::Finished => self.clock.is_complete(),
        };
        if !status_matches {
            return Err(SnapshotError::StatusMismatch {
                status: self.status,
            });
        }

        let max = self.generator.max_active();
        if self.active.len() > max {
            return Err(SnapshotError::TooManyActive {
                count: self.active.len(),
                max,
            });
        }
        if let Some(c) = self.active.iter().find(|c| !c.is_active()) {
            return Err(SnapshotError::TerminalInActiveSet { id: c.id });
        }

        let mut seen = HashSet::new();
        let ids = self
            .active
            .iter()
            .map(|c| c.id)
            .chain(self.completed.iter().map(|c| c.id));
        for id in ids {
            if !seen.insert(id) {
                return Err(SnapshotError::DuplicateId { id });
            }
        }
        if let Some(&max_id) = seen.iter().max() {
            if self.next_id <= max_id {
                return Err(SnapshotError::IdCounter {
                    next_id: self.next_id,
                    max_id,
                });
            }
        }

        let expected = self.clock.current_phase().map(|p| p.id);
        if self.phase != expected {
            return Err(SnapshotError::PhaseMismatch {
                recorded: self.phase,
                expected,
            });
        }

        let computed: u64 = self.completed.iter().map(|c| c.reward as u64).sum();
        if computed != self.total_reward {
            return Err(SnapshotError::RewardMismatch {
                recorded: self.total_reward,
                computed,
            });
        }
        Ok(())
    }

    /// Rebuild a session. Templates and subscribers are not part of the
    /// snapshot and are supplied by the host.
    pub fn restore(
        self,
        templates: Box<dyn ChallengeTemplateProvider>,
    ) -> Result<SessionState, SnapshotError> {
        self.validate()?;
        log::info!(
            "Restoring session at {:.0}ms ({} active, {} completed)",
            self.clock.elapsed_ms(),
            self.active.len(),
            self.completed.len()
        );
        Ok(SessionState {
            settings: self.settings,
            rng: self.rng,
            status: self.status,
            clock: self.clock,
            difficulty: self.difficulty,
            generator: self.generator,
            active: self.active,
            completed: self.completed,
            surface: self.surface,
            pending_samples: self.pending_samples,
            next_id: self.next_id,
            templates,
            events: EventBus::new(),
        })
    }
}

impl SessionState {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TICK_MS;
    use crate::sim::templates::BuiltinTemplates;
    use crate::sim::tick::{TickInput, tick};

    fn played_session(seed: u64, ticks: usize) -> SessionState {
        let mut state = SessionState::with_builtin_templates(Settings::with_seed(seed));
        state.start();
        for i in 0..ticks {
            let input = match state.active().first() {
                Some(c) if i % 25 == 0 => {
                    TickInput::with_samples(vec![InteractionSample::tap(c.pos.x, c.pos.y)])
                }
                _ => TickInput::default(),
            };
            tick(&mut state, &input, TICK_MS);
        }
        state
    }

    /// No input: the first challenge spawns at 2000ms and stays active
    fn idle_session(seed: u64, ticks: usize) -> SessionState {
        let mut state = SessionState::with_builtin_templates(Settings::with_seed(seed));
        state.start();
        for _ in 0..ticks {
            tick(&mut state, &TickInput::default(), TICK_MS);
        }
        state
    }

    #[test]
    fn test_restore_continues_identically() {
        let mut original = played_session(31, 1500);
        let json = original.snapshot().to_json().unwrap();
        let mut restored = Snapshot::from_json(&json)
            .unwrap()
            .restore(Box::new(BuiltinTemplates::new()))
            .unwrap();

        assert_eq!(restored.snapshot(), original.snapshot());

        for _ in 0..1500 {
            tick(&mut original, &TickInput::default(), TICK_MS);
            tick(&mut restored, &TickInput::default(), TICK_MS);
        }
        assert_eq!(restored.snapshot(), original.snapshot());
    }

    #[test]
    fn test_fresh_session_snapshot() {
        let state = SessionState::with_builtin_templates(Settings::default());
        let snapshot = state.snapshot();
        assert_eq!(snapshot.phase, None);
        assert_eq!(snapshot.total_reward, 0);
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_rejects_wrong_version() {
        let mut snapshot = played_session(1, 10).snapshot();
        snapshot.version = 99;
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::Version { found: 99, .. })
        ));
    }

    #[test]
    fn test_rejects_inconsistent_phase() {
        let mut snapshot = played_session(2, 10).snapshot();
        snapshot.phase = Some(PhaseId::Elder);
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::PhaseMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_tampered_rewards() {
        let mut snapshot = played_session(3, 10).snapshot();
        snapshot.total_reward += 100;
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::RewardMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_too_many_active() {
        let mut snapshot = idle_session(4, 200).snapshot();
        let extra = snapshot.active[0].clone();
        while snapshot.active.len() <= snapshot.generator.max_active() {
            let mut c = extra.clone();
            c.id += 1000 + snapshot.active.len() as u32;
            snapshot.active.push(c);
        }
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::TooManyActive { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut snapshot = idle_session(5, 200).snapshot();
        let dup = snapshot.active[0].clone();
        snapshot.active.truncate(1);
        snapshot.active.push(dup);
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::DuplicateId { .. })
        ));
    }

    #[test]
    fn test_rejects_clock_out_of_range() {
        let snapshot = played_session(6, 10).snapshot();
        let mut json: serde_json::Value =
            serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        json["clock"]["elapsed_ms"] = serde_json::json!(-50.0);
        assert!(matches!(
            Snapshot::from_json(&json.to_string()),
            Err(SnapshotError::Clock)
        ));
    }

    #[test]
    fn test_rejects_reused_id_counter() {
        let mut state = idle_session(7, 130);
        let target = state.active()[0].pos;
        for _ in 0..3 {
            let input = TickInput::with_samples(vec![InteractionSample::tap(target.x, target.y)]);
            tick(&mut state, &input, TICK_MS);
        }
        assert_eq!(state.completed().len(), 1);

        let mut snapshot = state.snapshot();
        assert!(snapshot.validate().is_ok());
        snapshot.next_id = 1;
        assert!(matches!(
            snapshot.restore(Box::new(BuiltinTemplates::new())),
            Err(SnapshotError::IdCounter { next_id: 1, max_id: 1 })
        ));
    }

    #[test]
    fn test_rejects_status_clock_disagreement() {
        let mut snapshot = idle_session(8, 10).snapshot();
        snapshot.status = SessionStatus::Idle;
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::StatusMismatch { status: SessionStatus::Idle })
        ));

        let mut fresh = SessionState::with_builtin_templates(Settings::default()).snapshot();
        fresh.status = SessionStatus::Running;
        assert!(matches!(
            fresh.validate(),
            Err(SnapshotError::StatusMismatch { .. })
        ));

        let mut finished = idle_session(9, 6300).snapshot();
        assert_eq!(finished.status, SessionStatus::Finished);
        assert!(finished.validate().is_ok());
        finished.status = SessionStatus::Running;
        assert!(matches!(
            finished.validate(),
            Err(SnapshotError::StatusMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            Snapshot::from_json("not json"),
            Err(SnapshotError::Parse(_))
        ));
    }
}
