//! Interaction samples delivered by the input collaborator
//!
//! Coordinates arrive already normalized to play-surface units. The core
//! only checks that a sample is usable; anything else is dropped.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bounds::Bounds;

/// Recognized sample kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SampleKind {
    Tap,
    Drag,
    DragStart,
    DragEnd,
}

impl SampleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleKind::Tap => "tap",
            SampleKind::Drag => "drag",
            SampleKind::DragStart => "dragStart",
            SampleKind::DragEnd => "dragEnd",
        }
    }

    /// Parse a host-supplied kind name; unknown names yield `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tap" => Some(SampleKind::Tap),
            "drag" => Some(SampleKind::Drag),
            "dragStart" | "drag_start" => Some(SampleKind::DragStart),
            "dragEnd" | "drag_end" => Some(SampleKind::DragEnd),
            _ => None,
        }
    }
}

/// One captured pointer/touch event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionSample {
    pub kind: SampleKind,
    pub x: f32,
    pub y: f32,
    /// Drag displacement (zero for taps)
    #[serde(default)]
    pub dx: f32,
    #[serde(default)]
    pub dy: f32,
    /// Host timestamp (ms), informational only
    #[serde(default)]
    pub timestamp_ms: f64,
}

impl InteractionSample {
    pub fn tap(x: f32, y: f32) -> Self {
        Self {
            kind: SampleKind::Tap,
            x,
            y,
            dx: 0.0,
            dy: 0.0,
            timestamp_ms: 0.0,
        }
    }

    pub fn drag(x: f32, y: f32, dx: f32, dy: f32) -> Self {
        Self {
            kind: SampleKind::Drag,
            x,
            y,
            dx,
            dy,
            timestamp_ms: 0.0,
        }
    }

    pub fn at(mut self, timestamp_ms: f64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn point(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Length of the drag displacement
    pub fn drag_magnitude(&self) -> f32 {
        Vec2::new(self.dx, self.dy).length()
    }

    /// Sample is finite and lands on the play surface
    pub fn is_valid(&self, surface: &Bounds) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.dx.is_finite()
            && self.dy.is_finite()
            && surface.contains(self.point())
    }
}
