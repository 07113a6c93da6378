//! Challenges: templates, spawned instances and their lifecycle
//!
//! A challenge is created Active and moves to Completed or Failed exactly
//! once. Terminal challenges ignore every further input and aging step.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bounds::Bounds;
use super::input::{InteractionSample, SampleKind};
use crate::direction_from_angle;

/// How the player has to interact with a challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Tap,
    RapidTap,
    Drag,
    MovingTarget,
}

/// Target geometry plus the kind-specific requirement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetShape {
    pub width: f32,
    pub height: f32,
    /// Taps needed (tap / rapid-tap)
    #[serde(default = "default_required_taps")]
    pub required_taps: u32,
    /// Drag length needed (drag)
    #[serde(default)]
    pub required_distance: f32,
    /// Movement speed in units per second (moving target)
    #[serde(default)]
    pub speed: f32,
}

fn default_required_taps() -> u32 {
    1
}

impl TargetShape {
    pub fn rect(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            required_taps: 1,
            required_distance: 0.0,
            speed: 0.0,
        }
    }

    pub fn square(size: f32) -> Self {
        Self::rect(size, size)
    }

    pub fn with_taps(mut self, taps: u32) -> Self {
        self.required_taps = taps;
        self
    }

    pub fn with_distance(mut self, distance: f32) -> Self {
        self.required_distance = distance;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

/// Blueprint the generator spawns challenges from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeTemplate {
    pub name: String,
    pub kind: InteractionKind,
    pub base_difficulty: u8,
    pub base_time_limit_ms: f64,
    pub base_reward: u32,
    pub shape: TargetShape,
}

impl ChallengeTemplate {
    pub fn new(
        name: impl Into<String>,
        kind: InteractionKind,
        base_difficulty: u8,
        base_time_limit_ms: f64,
        base_reward: u32,
        shape: TargetShape,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            base_difficulty,
            base_time_limit_ms,
            base_reward,
            shape,
        }
    }
}

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeStatus {
    Active,
    Completed,
    Failed,
}

impl ChallengeStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ChallengeStatus::Active)
    }
}

/// Kind-specific mutable progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Progress {
    Taps { count: u32, required: u32 },
    Drag { max_distance: f32, required: f32 },
    /// Velocity is chosen lazily on the first aging step
    Moving { speed: f32, velocity: Option<Vec2> },
}

impl Progress {
    /// Completion fraction in [0, 1] for display
    pub fn fraction(&self) -> f32 {
        match *self {
            Progress::Taps { count, required } => {
                if required == 0 {
                    1.0
                } else {
                    (count as f32 / required as f32).min(1.0)
                }
            }
            Progress::Drag {
                max_distance,
                required,
            } => {
                if required <= 0.0 {
                    1.0
                } else {
                    (max_distance / required).clamp(0.0, 1.0)
                }
            }
            Progress::Moving { .. } => 0.0,
        }
    }
}

/// A spawned, time-limited target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: u32,
    pub template: ChallengeTemplate,
    /// Effective difficulty at spawn
    pub difficulty: u8,
    pub reward: u32,
    /// Session clock at spawn
    pub spawn_ms: f64,
    /// Post-scaling limit
    pub time_limit_ms: f64,
    pub remaining_ms: f64,
    pub pos: Vec2,
    /// Current target size (width, height)
    pub size: Vec2,
    pub progress: Progress,
    status: ChallengeStatus,
}

impl Challenge {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        template: ChallengeTemplate,
        difficulty: u8,
        spawn_ms: f64,
        time_limit_ms: f64,
        pos: Vec2,
        size: Vec2,
        progress: Progress,
    ) -> Self {
        let reward = template.base_reward;
        Self {
            id,
            template,
            difficulty,
            reward,
            spawn_ms,
            time_limit_ms,
            remaining_ms: time_limit_ms,
            pos,
            size,
            progress,
            status: ChallengeStatus::Active,
        }
    }

    pub fn kind(&self) -> InteractionKind {
        self.template.kind
    }

    pub fn status(&self) -> ChallengeStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == ChallengeStatus::Active
    }

    /// Radius of the circular hit area.
    ///
    /// The target is drawn as a rectangle but hit-tested as a circle of
    /// half its larger side. Corners of wide targets are therefore outside
    /// and points just beyond the short side are inside.
    pub fn hit_radius(&self) -> f32 {
        self.size.x.max(self.size.y) / 2.0
    }

    /// Inclusive circular hit test
    pub fn hit_test(&self, point: Vec2) -> bool {
        self.pos.distance(point) <= self.hit_radius()
    }

    /// Time spent alive so far
    pub fn elapsed_ms(&self) -> f64 {
        self.time_limit_ms - self.remaining_ms
    }

    /// Remaining / limit, in [0, 1]
    pub fn time_ratio(&self) -> f32 {
        if self.time_limit_ms <= 0.0 {
            return 0.0;
        }
        (self.remaining_ms / self.time_limit_ms).clamp(0.0, 1.0) as f32
    }

    /// Advance countdown and motion by `dt` ms.
    ///
    /// Returns true when this step timed the challenge out.
    pub fn age<R: Rng + ?Sized>(&mut self, dt: f64, movement: &Bounds, rng: &mut R) -> bool {
        if !self.is_active() || !dt.is_finite() || dt <= 0.0 {
            return false;
        }

        self.remaining_ms -= dt;
        if self.remaining_ms <= 0.0 {
            self.remaining_ms = 0.0;
            self.status = ChallengeStatus::Failed;
            return true;
        }

        if let Progress::Moving { speed, velocity } = &mut self.progress {
            let vel = velocity.get_or_insert_with(|| {
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                direction_from_angle(angle) * *speed
            });
            self.pos += *vel * (dt / 1000.0) as f32;

            // Elastic reflection: flip the component heading out of bounds
            if (self.pos.x <= movement.min.x && vel.x < 0.0)
                || (self.pos.x >= movement.max.x && vel.x > 0.0)
            {
                vel.x = -vel.x;
            }
            if (self.pos.y <= movement.min.y && vel.y < 0.0)
                || (self.pos.y >= movement.max.y && vel.y > 0.0)
            {
                vel.y = -vel.y;
            }
            self.pos = movement.clamp(self.pos);
        }

        false
    }

    /// Apply a sample that already passed the hit test.
    ///
    /// Returns true when the sample completed the challenge.
    pub fn handle_interaction(&mut self, sample: &InteractionSample) -> bool {
        if !self.is_active() {
            return false;
        }

        let done = match (&mut self.progress, sample.kind) {
            (Progress::Taps { count, required }, SampleKind::Tap) => {
                *count += 1;
                *count >= *required
            }
            (
                Progress::Drag {
                    max_distance,
                    required,
                },
                SampleKind::Drag,
            ) => {
                *max_distance = (*max_distance).max(sample.drag_magnitude());
                *max_distance >= *required
            }
            (Progress::Moving { .. }, SampleKind::Tap) => true,
            _ => false,
        };

        if done {
            self.status = ChallengeStatus::Completed;
        }
        done
    }
}
