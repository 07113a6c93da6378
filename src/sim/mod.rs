//! Deterministic session module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Host-driven ticks only
//! - Seeded RNG only
//! - Stable iteration order (insertion order of challenges)
//! - No rendering, audio or platform dependencies

pub mod bounds;
pub mod challenge;
pub mod difficulty;
pub mod events;
pub mod generator;
pub mod input;
pub mod resolver;
pub mod stage;
pub mod state;
pub mod templates;
pub mod tick;
pub mod view;

pub use bounds::Bounds;
pub use challenge::{
    Challenge, ChallengeStatus, ChallengeTemplate, InteractionKind, Progress, TargetShape,
};
pub use difficulty::{
    Adjustment, DifficultyController, DifficultyTuning, OutcomeRecord, PerformanceStats,
    ProtectionStatus, scaled_time_limit,
};
pub use events::{EventBus, EventListener, GameEvent, OutcomeNotice};
pub use generator::{ChallengeGenerator, SpawnContext, scale_target};
pub use input::{InteractionSample, SampleKind};
pub use resolver::{resolve_sample, sweep_failed};
pub use stage::{PHASES, Phase, PhaseId, StageClock};
pub use state::{CompletedChallenge, SessionState, SessionStatus};
pub use templates::{
    BuiltinTemplates, ChallengeTemplateProvider, NoTemplates, TemplateCatalog, TemplateError,
    WithFallback,
};
pub use tick::{TickInput, tick};
pub use view::{ChallengeView, HudView};
