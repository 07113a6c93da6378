//! Session state
//!
//! [`SessionState`] is the single owner of everything the core mutates: the
//! stage clock, difficulty state, spawn timer, and the active and completed
//! challenge sets. Collaborators only ever see copies (views, events,
//! snapshots).

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bounds::Bounds;
use super::challenge::Challenge;
use super::difficulty::{DifficultyController, ProtectionStatus};
use super::events::{EventBus, EventListener, GameEvent};
use super::generator::ChallengeGenerator;
use super::input::InteractionSample;
use super::stage::{Phase, StageClock};
use super::templates::{BuiltinTemplates, ChallengeTemplateProvider};
use crate::settings::Settings;

/// Lifecycle of the whole session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Reset, waiting for `start`
    Idle,
    Running,
    Paused,
    /// The final phase has ended; nothing new spawns
    Finished,
}

/// A challenge that reached Completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedChallenge {
    pub id: u32,
    pub name: String,
    pub reward: u32,
    pub difficulty: u8,
    pub completion_ms: f64,
    pub position: Vec2,
    /// Session clock at completion
    pub completed_at_ms: f64,
}

/// Complete core state for one life
pub struct SessionState {
    pub(crate) settings: Settings,
    pub(crate) rng: Pcg32,
    pub(crate) status: SessionStatus,
    pub(crate) clock: StageClock,
    pub(crate) difficulty: DifficultyController,
    pub(crate) generator: ChallengeGenerator,
    /// Active challenges in insertion order
    pub(crate) active: Vec<Challenge>,
    pub(crate) completed: Vec<CompletedChallenge>,
    pub(crate) surface: Bounds,
    /// Samples queued between ticks
    pub(crate) pending_samples: Vec<InteractionSample>,
    pub(crate) next_id: u32,
    pub(crate) templates: Box<dyn ChallengeTemplateProvider>,
    pub(crate) events: EventBus,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("status", &self.status)
            .field("clock", &self.clock)
            .field("difficulty", &self.difficulty)
            .field("active", &self.active.len())
            .field("completed", &self.completed.len())
            .finish()
    }
}

impl SessionState {
    /// Create an idle session. Settings are assumed validated.
    pub fn new(settings: Settings, templates: Box<dyn ChallengeTemplateProvider>) -> Self {
        let generator = ChallengeGenerator::new(
            settings.spawn_interval_ms,
            settings.max_active_challenges,
            settings.spawn_margin,
        );
        Self {
            rng: Pcg32::seed_from_u64(settings.seed),
            status: SessionStatus::Idle,
            clock: StageClock::new(),
            difficulty: DifficultyController::new(settings.difficulty_tuning()),
            generator,
            active: Vec::new(),
            completed: Vec::new(),
            surface: settings.surface(),
            pending_samples: Vec::new(),
            next_id: 1,
            templates,
            events: EventBus::new(),
            settings,
        }
    }

    /// Idle session using the built-in templates
    pub fn with_builtin_templates(settings: Settings) -> Self {
        Self::new(settings, Box::new(BuiltinTemplates::new()))
    }

    /// Leave Idle and enter the first phase
    pub fn start(&mut self) {
        if self.status != SessionStatus::Idle {
            return;
        }
        self.clock.start();
        self.status = SessionStatus::Running;
        if let Some(phase) = self.clock.current_phase() {
            log::info!("Session started: entering {}", phase.name);
            self.events.emit(GameEvent::PhaseEntered { phase: phase.id });
        }
    }

    /// Stop and return to Idle, clearing every challenge and all
    /// difficulty/clock state in one step. Subscribers and templates stay.
    pub fn reset(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.settings.seed);
        self.status = SessionStatus::Idle;
        self.clock.reset();
        self.difficulty.reset();
        self.generator.reset();
        self.active.clear();
        self.completed.clear();
        self.pending_samples.clear();
        self.next_id = 1;
        self.events.clear();
        log::info!("Session reset");
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn clock(&self) -> &StageClock {
        &self.clock
    }

    pub fn difficulty(&self) -> &DifficultyController {
        &self.difficulty
    }

    pub fn generator(&self) -> &ChallengeGenerator {
        &self.generator
    }

    pub fn current_phase(&self) -> Option<&'static Phase> {
        self.clock.current_phase()
    }

    /// Difficulty of the current phase after the modifier
    pub fn current_difficulty(&self) -> Option<u8> {
        self.current_phase()
            .map(|phase| self.difficulty.current_difficulty(phase))
    }

    pub fn protection_status(&self) -> ProtectionStatus {
        self.difficulty.protection_status()
    }

    pub fn active(&self) -> &[Challenge] {
        &self.active
    }

    pub fn completed(&self) -> &[CompletedChallenge] {
        &self.completed
    }

    /// Sum of rewards over completed challenges
    pub fn total_reward(&self) -> u64 {
        self.completed.iter().map(|c| c.reward as u64).sum()
    }

    pub fn surface(&self) -> Bounds {
        self.surface
    }

    /// Renderer reports a new play surface; degenerate bounds are ignored
    pub fn set_surface(&mut self, surface: Bounds) {
        if surface.is_valid() {
            self.surface = surface;
        } else {
            log::warn!("Ignoring invalid play surface {:?}", surface);
        }
    }

    /// Area moving targets bounce within
    pub fn movement_area(&self) -> Bounds {
        self.generator.spawn_area(&self.surface)
    }

    /// Replace the template source (takes effect on the next spawn)
    pub fn set_templates(&mut self, templates: Box<dyn ChallengeTemplateProvider>) {
        self.templates = templates;
    }

    /// Buffer a sample for the start of the next tick
    pub fn queue_sample(&mut self, sample: InteractionSample) {
        self.pending_samples.push(sample);
    }

    pub fn subscribe(&mut self, listener: Box<dyn EventListener>) {
        self.events.subscribe(listener);
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::stage::PhaseId;

    #[test]
    fn test_new_session_is_idle() {
        let state = SessionState::with_builtin_templates(Settings::default());
        assert_eq!(state.status(), SessionStatus::Idle);
        assert!(state.current_phase().is_none());
        assert!(state.current_difficulty().is_none());
        assert_eq!(state.total_reward(), 0);
    }

    #[test]
    fn test_start_enters_first_phase_once() {
        let mut state = SessionState::with_builtin_templates(Settings::default());
        state.start();
        state.start();
        assert_eq!(state.status(), SessionStatus::Running);
        assert_eq!(state.current_phase().map(|p| p.id), Some(PhaseId::Infancy));
        assert_eq!(state.current_difficulty(), Some(1));
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::PhaseEntered {
                phase: PhaseId::Infancy
            }]
        );
    }

    #[test]
    fn test_set_surface_rejects_degenerate() {
        let mut state = SessionState::with_builtin_templates(Settings::default());
        state.set_surface(Bounds::from_size(0.0, 100.0));
        assert_eq!(state.surface(), Bounds::default());
        state.set_surface(Bounds::from_size(1024.0, 768.0));
        assert_eq!(state.surface().width(), 1024.0);
        assert_eq!(state.movement_area().min, Vec2::splat(100.0));
    }
}
