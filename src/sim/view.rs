//! Read-only snapshots for the render surface
//!
//! Views are plain copies; the renderer never holds references into the
//! live session.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::challenge::{Challenge, InteractionKind};
use super::difficulty::ProtectionStatus;
use super::stage::PhaseId;
use super::state::{SessionState, SessionStatus};

/// Everything needed to draw one active challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeView {
    pub id: u32,
    pub position: Vec2,
    pub hit_radius: f32,
    /// Remaining / limit
    pub time_ratio: f32,
    pub label: String,
    pub kind: InteractionKind,
    /// Kind-specific completion fraction
    pub progress: f32,
}

impl From<&Challenge> for ChallengeView {
    fn from(c: &Challenge) -> Self {
        Self {
            id: c.id,
            position: c.pos,
            hit_radius: c.hit_radius(),
            time_ratio: c.time_ratio(),
            label: c.template.name.clone(),
            kind: c.kind(),
            progress: c.progress.fraction(),
        }
    }
}

/// Session-level HUD data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudView {
    pub status: SessionStatus,
    pub phase: Option<PhaseId>,
    pub phase_name: Option<&'static str>,
    pub phase_progress: f32,
    pub global_progress: f32,
    pub difficulty: Option<u8>,
    pub modifier: i8,
    pub protection: ProtectionStatus,
    pub total_reward: u64,
    pub active_count: usize,
}

impl SessionState {
    /// Snapshot of active challenges in insertion order
    pub fn challenge_views(&self) -> Vec<ChallengeView> {
        self.active.iter().map(ChallengeView::from).collect()
    }

    pub fn hud_view(&self) -> HudView {
        let phase = self.clock.current_phase();
        HudView {
            status: self.status,
            phase: phase.map(|p| p.id),
            phase_name: phase.map(|p| p.name),
            phase_progress: self.clock.phase_progress(),
            global_progress: self.clock.global_progress(),
            difficulty: self.current_difficulty(),
            modifier: self.difficulty.modifier(),
            protection: self.difficulty.protection_status(),
            total_reward: self.total_reward(),
            active_count: self.active.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::challenge::{ChallengeTemplate, Progress, TargetShape};

    #[test]
    fn test_challenge_view_fields() {
        let template = ChallengeTemplate::new(
            "Cram for Exams",
            InteractionKind::RapidTap,
            2,
            4000.0,
            30,
            TargetShape::rect(100.0, 60.0).with_taps(4),
        );
        let mut c = Challenge::new(
            5,
            template,
            3,
            0.0,
            4000.0,
            Vec2::new(250.0, 150.0),
            Vec2::new(100.0, 60.0),
            Progress::Taps {
                count: 1,
                required: 4,
            },
        );
        c.remaining_ms = 1000.0;

        let view = ChallengeView::from(&c);
        assert_eq!(view.id, 5);
        assert_eq!(view.hit_radius, 50.0);
        assert_eq!(view.time_ratio, 0.25);
        assert_eq!(view.progress, 0.25);
        assert_eq!(view.label, "Cram for Exams");
    }

    #[test]
    fn test_hud_before_and_after_start() {
        let mut state = SessionState::with_builtin_templates(Settings::default());
        let hud = state.hud_view();
        assert_eq!(hud.status, SessionStatus::Idle);
        assert!(hud.phase.is_none());
        assert!(hud.difficulty.is_none());

        state.start();
        let hud = state.hud_view();
        assert_eq!(hud.phase, Some(PhaseId::Infancy));
        assert_eq!(hud.phase_name, Some("Infancy"));
        assert_eq!(hud.difficulty, Some(1));
        assert_eq!(hud.active_count, 0);
        assert!(state.challenge_views().is_empty());
    }
}
