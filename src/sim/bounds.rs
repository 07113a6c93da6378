//! Axis-aligned play surface rectangle

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH};

/// Rectangle in play-surface units (min inclusive, max inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::from_size(DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT)
    }
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Surface anchored at the origin
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width, height))
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.width() > 0.0 && self.height() > 0.0
    }

    /// Shrink by `margin` on every side; collapses to the center line on an
    /// axis that is too small for the margin
    pub fn inset(&self, margin: f32) -> Self {
        let margin = Vec2::splat(margin.max(0.0));
        let center = self.center();
        let min = (self.min + margin).min(center);
        let max = (self.max - margin).max(center);
        Self { min, max }
    }

    /// Inclusive containment
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }

    /// Uniform point inside the rectangle
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        let x = if self.width() > 0.0 {
            rng.random_range(self.min.x..=self.max.x)
        } else {
            self.min.x
        };
        let y = if self.height() > 0.0 {
            rng.random_range(self.min.y..=self.max.y)
        } else {
            self.min.y
        };
        Vec2::new(x, y)
    }
}
