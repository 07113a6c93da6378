//! Lifeline - adaptive challenge core for a phase-driven life simulation
//!
//! Core modules:
//! - `sim`: Deterministic session logic (stage clock, difficulty, challenges)
//! - `platform`: Host integration helpers (cross-thread sample queue)
//! - `persistence`: Snapshot/restore with invariant verification
//! - `settings`: Data-driven session tuning
//! - `score`: Reference score collaborator fed by outcome events

pub mod persistence;
pub mod platform;
pub mod score;
pub mod settings;
pub mod sim;

pub use persistence::{Snapshot, SnapshotError};
pub use score::ScoreTally;
pub use settings::{Settings, SettingsError};

use glam::Vec2;

/// Session configuration constants (all times in milliseconds)
pub mod consts {
    /// Conventional host tick length
    pub const TICK_MS: f64 = 16.0;

    /// Total length of a life (sum of all phase durations)
    pub const SESSION_LENGTH_MS: f64 = 100_000.0;

    /// Time between spawn attempts
    pub const SPAWN_INTERVAL_MS: f64 = 2000.0;
    /// Maximum simultaneously active challenges
    pub const MAX_ACTIVE_CHALLENGES: usize = 3;
    /// Inset from the play surface edge for spawn positions and movement
    pub const SPAWN_MARGIN: f32 = 100.0;

    /// Difficulty levels are 1..=5
    pub const MIN_DIFFICULTY: u8 = 1;
    pub const MAX_DIFFICULTY: u8 = 5;
    /// Difficulty modifier bounds
    pub const MIN_MODIFIER: i8 = -2;
    pub const MAX_MODIFIER: i8 = 2;
    /// Rolling performance window capacity
    pub const HISTORY_CAPACITY: usize = 5;
    /// Consecutive results needed before an adjustment
    pub const STREAK_THRESHOLD: u32 = 3;
    /// Minimum time between two difficulty adjustments
    pub const ADJUSTMENT_COOLDOWN_MS: f64 = 5000.0;

    /// Floor for any scaled time limit
    pub const MIN_TIME_LIMIT_MS: f64 = 1000.0;
    /// Time limit multiplier indexed by difficulty - 1
    pub const TIME_LIMIT_MULTIPLIERS: [f64; 5] = [1.5, 1.2, 1.0, 0.8, 0.6];

    /// Drag distance growth per difficulty level above 1
    pub const DRAG_SCALE_PER_LEVEL: f32 = 0.3;
    /// Moving target speed growth per difficulty level above 1
    pub const SPEED_SCALE_PER_LEVEL: f32 = 0.4;
    /// Moving target shrink per difficulty level above 1
    pub const SIZE_SHRINK_PER_LEVEL: f32 = 5.0;
    /// Smallest a moving target may shrink to
    pub const MIN_TARGET_SIZE: f32 = 30.0;

    /// Default play surface (reported by the renderer, replaceable at runtime)
    pub const DEFAULT_SURFACE_WIDTH: f32 = 800.0;
    pub const DEFAULT_SURFACE_HEIGHT: f32 = 600.0;
}

/// Clamp a signed difficulty sum into the valid 1..=5 range
#[inline]
pub fn clamp_difficulty(value: i32) -> u8 {
    value.clamp(consts::MIN_DIFFICULTY as i32, consts::MAX_DIFFICULTY as i32) as u8
}

/// Unit vector pointing at `angle` radians
#[inline]
pub fn direction_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}
