//! Rate-limited procedural challenge spawner

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bounds::Bounds;
use super::challenge::{Challenge, ChallengeTemplate, InteractionKind, Progress};
use super::difficulty::{DifficultyController, scaled_time_limit};
use super::stage::Phase;
use super::templates::ChallengeTemplateProvider;
use crate::consts::*;

/// Everything the generator reads from the rest of the session for one update
pub struct SpawnContext<'a> {
    pub phase: &'static Phase,
    pub templates: &'a dyn ChallengeTemplateProvider,
    pub difficulty: &'a DifficultyController,
    /// Play surface reported by the renderer
    pub surface: Bounds,
    /// Session clock at this update
    pub now_ms: f64,
}

/// Spawn timer plus concurrency limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeGenerator {
    accumulator_ms: f64,
    interval_ms: f64,
    max_active: usize,
    margin: f32,
}

impl Default for ChallengeGenerator {
    fn default() -> Self {
        Self::new(SPAWN_INTERVAL_MS, MAX_ACTIVE_CHALLENGES, SPAWN_MARGIN)
    }
}

impl ChallengeGenerator {
    pub fn new(interval_ms: f64, max_active: usize, margin: f32) -> Self {
        Self {
            accumulator_ms: 0.0,
            interval_ms,
            max_active,
            margin,
        }
    }

    pub fn reset(&mut self) {
        self.accumulator_ms = 0.0;
    }

    pub fn accumulator_ms(&self) -> f64 {
        self.accumulator_ms
    }

    pub fn max_active(&self) -> usize {
        self.max_active
    }

    /// Area spawns are drawn from (and moving targets bounce within)
    pub fn spawn_area(&self, surface: &Bounds) -> Bounds {
        surface.inset(self.margin)
    }

    /// Accumulate `dt` and spawn as many challenges as the timer and the
    /// concurrency bound allow. New challenges are appended to `active`.
    ///
    /// Returns the number spawned.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        ctx: &SpawnContext<'_>,
        active: &mut Vec<Challenge>,
        next_id: &mut u32,
        rng: &mut R,
    ) -> usize {
        if !dt.is_finite() || dt <= 0.0 || self.interval_ms <= 0.0 {
            return 0;
        }
        self.accumulator_ms += dt;

        let mut spawned = 0;
        while self.accumulator_ms >= self.interval_ms && active.len() < self.max_active {
            self.accumulator_ms -= self.interval_ms;

            let Some(challenge) = self.spawn_one(ctx, *next_id, rng) else {
                continue;
            };
            *next_id += 1;
            log::debug!(
                "Spawned #{} '{}' ({:?}) difficulty {} limit {}ms at ({:.0}, {:.0})",
                challenge.id,
                challenge.template.name,
                challenge.kind(),
                challenge.difficulty,
                challenge.time_limit_ms,
                challenge.pos.x,
                challenge.pos.y
            );
            active.push(challenge);
            spawned += 1;
        }

        // At capacity: keep at most one pending interval so a freed slot
        // fills on the next update instead of in a burst
        if active.len() >= self.max_active {
            self.accumulator_ms = self.accumulator_ms.min(self.interval_ms);
        }

        spawned
    }

    /// Build one challenge for the current phase, or `None` when the phase
    /// has no templates
    pub fn spawn_one<R: Rng + ?Sized>(
        &self,
        ctx: &SpawnContext<'_>,
        id: u32,
        rng: &mut R,
    ) -> Option<Challenge> {
        let templates = ctx.templates.templates_for_phase(ctx.phase.id);
        if templates.is_empty() {
            log::debug!("No challenge templates for {}; skipping spawn", ctx.phase.name);
            return None;
        }
        let template = &templates[rng.random_range(0..templates.len())];

        let difficulty = ctx
            .difficulty
            .effective_difficulty(template.base_difficulty, ctx.phase);
        let time_limit = scaled_time_limit(template.base_time_limit_ms, difficulty);
        let (size, progress) = scale_target(template, difficulty);
        let pos = self.spawn_area(&ctx.surface).sample(rng);

        Some(Challenge::new(
            id,
            template.clone(),
            difficulty,
            ctx.now_ms,
            time_limit,
            pos,
            size,
            progress,
        ))
    }
}

/// Apply difficulty scaling to a template's target, producing the spawned
/// size and initial progress
pub fn scale_target(template: &ChallengeTemplate, difficulty: u8) -> (Vec2, Progress) {
    let shape = &template.shape;
    let levels_above_one = difficulty.saturating_sub(1) as f32;
    let mut size = Vec2::new(shape.width, shape.height);

    let progress = match template.kind {
        InteractionKind::Tap | InteractionKind::RapidTap => {
            let required = if difficulty >= 3 {
                shape.required_taps.max(difficulty as u32)
            } else {
                shape.required_taps
            };
            Progress::Taps { count: 0, required }
        }
        InteractionKind::Drag => Progress::Drag {
            max_distance: 0.0,
            required: shape.required_distance * (1.0 + levels_above_one * DRAG_SCALE_PER_LEVEL),
        },
        InteractionKind::MovingTarget => {
            let shrink = levels_above_one * SIZE_SHRINK_PER_LEVEL;
            size = (size - Vec2::splat(shrink)).max(Vec2::splat(MIN_TARGET_SIZE));
            Progress::Moving {
                speed: shape.speed * (1.0 + levels_above_one * SPEED_SCALE_PER_LEVEL),
                velocity: None,
            }
        }
    };

    (size, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::challenge::TargetShape;
    use crate::sim::stage::{PHASES, PhaseId};
    use crate::sim::templates::{BuiltinTemplates, NoTemplates, TemplateCatalog};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn single(template: ChallengeTemplate) -> TemplateCatalog {
        let mut catalog = TemplateCatalog::default();
        for phase in &PHASES {
            catalog.insert(phase.id, template.clone());
        }
        catalog
    }

    fn tap_template() -> ChallengeTemplate {
        ChallengeTemplate::new(
            "Tap",
            InteractionKind::Tap,
            1,
            3000.0,
            10,
            TargetShape::square(80.0),
        )
    }

    fn ctx<'a>(
        phase: usize,
        templates: &'a dyn ChallengeTemplateProvider,
        difficulty: &'a DifficultyController,
    ) -> SpawnContext<'a> {
        SpawnContext {
            phase: &PHASES[phase],
            templates,
            difficulty,
            surface: Bounds::default(),
            now_ms: 0.0,
        }
    }

    #[test]
    fn test_spawn_interval_and_bound() {
        let catalog = single(tap_template());
        let difficulty = DifficultyController::default();
        let ctx = ctx(0, &catalog, &difficulty);
        let mut generator = ChallengeGenerator::default();
        let mut active = Vec::new();
        let mut next_id = 1;
        let mut rng = Pcg32::seed_from_u64(5);

        assert_eq!(generator.update(1999.0, &ctx, &mut active, &mut next_id, &mut rng), 0);
        assert_eq!(generator.update(1.0, &ctx, &mut active, &mut next_id, &mut rng), 1);
        assert_eq!(active[0].id, 1);

        // A long step spawns several, but never past the bound
        assert_eq!(generator.update(20_000.0, &ctx, &mut active, &mut next_id, &mut rng), 2);
        assert_eq!(active.len(), MAX_ACTIVE_CHALLENGES);
        assert_eq!(generator.accumulator_ms(), SPAWN_INTERVAL_MS);

        // Freeing a slot fills it promptly, one at a time
        active.remove(0);
        assert_eq!(generator.update(16.0, &ctx, &mut active, &mut next_id, &mut rng), 1);
        assert_eq!(active.len(), MAX_ACTIVE_CHALLENGES);
        let ids: Vec<u32> = active.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_empty_phase_spawns_nothing() {
        let difficulty = DifficultyController::default();
        let ctx = ctx(2, &NoTemplates, &difficulty);
        let mut generator = ChallengeGenerator::default();
        let mut active = Vec::new();
        let mut next_id = 1;
        let mut rng = Pcg32::seed_from_u64(5);
        assert_eq!(generator.update(10_000.0, &ctx, &mut active, &mut next_id, &mut rng), 0);
        assert!(active.is_empty());
        assert_eq!(next_id, 1);
        assert!(generator.accumulator_ms() < SPAWN_INTERVAL_MS);
    }

    #[test]
    fn test_spawn_uses_difficulty_and_time_limit() {
        let catalog = single(tap_template());
        let difficulty = DifficultyController::default();
        let ctx = ctx(0, &catalog, &difficulty);
        let generator = ChallengeGenerator::default();
        let mut rng = Pcg32::seed_from_u64(11);

        let c = generator.spawn_one(&ctx, 1, &mut rng).unwrap();
        assert_eq!(c.difficulty, 1);
        assert_eq!(c.time_limit_ms, 4500.0);
        assert_eq!(c.remaining_ms, 4500.0);
        assert_eq!(c.reward, 10);
        assert!(generator.spawn_area(&ctx.surface).contains(c.pos));
    }

    #[test]
    fn test_tap_scaling() {
        let template = ChallengeTemplate::new(
            "Tap",
            InteractionKind::RapidTap,
            1,
            3000.0,
            10,
            TargetShape::square(80.0).with_taps(2),
        );
        assert_eq!(scale_target(&template, 2).1, Progress::Taps { count: 0, required: 2 });
        assert_eq!(scale_target(&template, 3).1, Progress::Taps { count: 0, required: 3 });
        assert_eq!(scale_target(&template, 5).1, Progress::Taps { count: 0, required: 5 });

        let many = ChallengeTemplate {
            shape: TargetShape::square(80.0).with_taps(8),
            ..template
        };
        assert_eq!(scale_target(&many, 4).1, Progress::Taps { count: 0, required: 8 });
    }

    #[test]
    fn test_drag_scaling() {
        let template = ChallengeTemplate::new(
            "Drag",
            InteractionKind::Drag,
            1,
            3000.0,
            10,
            TargetShape::square(80.0).with_distance(100.0),
        );
        let Progress::Drag { required, .. } = scale_target(&template, 3).1 else {
            panic!("expected drag progress");
        };
        assert!((required - 160.0).abs() < 1e-4);
    }

    #[test]
    fn test_moving_scaling() {
        let template = ChallengeTemplate::new(
            "Move",
            InteractionKind::MovingTarget,
            1,
            3000.0,
            10,
            TargetShape::square(50.0).with_speed(100.0),
        );
        let (size, progress) = scale_target(&template, 3);
        assert_eq!(size, Vec2::splat(40.0));
        let Progress::Moving { speed, velocity } = progress else {
            panic!("expected moving progress");
        };
        assert!((speed - 180.0).abs() < 1e-4);
        assert!(velocity.is_none());

        // Shrinking is floored
        let (size, _) = scale_target(&template, 5);
        assert_eq!(size, Vec2::splat(MIN_TARGET_SIZE));
    }

    #[test]
    fn test_seeded_spawns_are_reproducible() {
        let builtin = BuiltinTemplates::new();
        let difficulty = DifficultyController::default();
        let ctx = ctx(3, &builtin, &difficulty);
        assert_eq!(ctx.phase.id, PhaseId::Adulthood);
        let generator = ChallengeGenerator::default();

        let mut a = Pcg32::seed_from_u64(77);
        let mut b = Pcg32::seed_from_u64(77);
        for id in 0..10 {
            assert_eq!(
                generator.spawn_one(&ctx, id, &mut a),
                generator.spawn_one(&ctx, id, &mut b)
            );
        }
    }
}
