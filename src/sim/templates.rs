//! Challenge template sources
//!
//! The generator only sees [`ChallengeTemplateProvider`]. Rich template data
//! comes from a JSON [`TemplateCatalog`]; [`BuiltinTemplates`] is the minimal
//! set used when a phase has no data, combined through [`WithFallback`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::challenge::{ChallengeTemplate, InteractionKind, TargetShape};
use super::stage::PhaseId;
use crate::consts::{MAX_DIFFICULTY, MIN_DIFFICULTY};

/// Source of per-phase challenge templates
pub trait ChallengeTemplateProvider {
    /// Templates for `phase`; an empty slice means nothing spawns
    fn templates_for_phase(&self, phase: PhaseId) -> &[ChallengeTemplate];
}

impl<T: ChallengeTemplateProvider + ?Sized> ChallengeTemplateProvider for Box<T> {
    fn templates_for_phase(&self, phase: PhaseId) -> &[ChallengeTemplate] {
        (**self).templates_for_phase(phase)
    }
}

/// Provider with no templates at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplates;

impl ChallengeTemplateProvider for NoTemplates {
    fn templates_for_phase(&self, _phase: PhaseId) -> &[ChallengeTemplate] {
        &[]
    }
}

/// Errors raised when template data is unusable
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("template in {phase:?} has an empty name")]
    EmptyName { phase: PhaseId },
    #[error("template '{name}' base difficulty {value} outside {min}..={max}")]
    Difficulty {
        name: String,
        value: u8,
        min: u8,
        max: u8,
    },
    #[error("template '{name}': {field} must be positive (got {value})")]
    NotPositive {
        name: String,
        field: &'static str,
        value: f64,
    },
}

fn validate_template(phase: PhaseId, t: &ChallengeTemplate) -> Result<(), TemplateError> {
    if t.name.trim().is_empty() {
        return Err(TemplateError::EmptyName { phase });
    }
    if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&t.base_difficulty) {
        return Err(TemplateError::Difficulty {
            name: t.name.clone(),
            value: t.base_difficulty,
            min: MIN_DIFFICULTY,
            max: MAX_DIFFICULTY,
        });
    }

    let positive = |field: &'static str, value: f64| {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(TemplateError::NotPositive {
                name: t.name.clone(),
                field,
                value,
            })
        }
    };
    positive("base_time_limit_ms", t.base_time_limit_ms)?;
    positive("width", t.shape.width as f64)?;
    positive("height", t.shape.height as f64)?;
    match t.kind {
        InteractionKind::Tap | InteractionKind::RapidTap => {
            positive("required_taps", t.shape.required_taps as f64)
        }
        InteractionKind::Drag => positive("required_distance", t.shape.required_distance as f64),
        InteractionKind::MovingTarget => positive("speed", t.shape.speed as f64),
    }
}

/// Data-driven templates keyed by phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateCatalog {
    #[serde(default)]
    pub phases: HashMap<PhaseId, Vec<ChallengeTemplate>>,
}

impl TemplateCatalog {
    /// Parse and validate a catalog such as
    /// `{"phases": {"Infancy": [{"name": ..., "kind": "tap", ...}]}}`
    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        let catalog: TemplateCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        log::info!(
            "Loaded template catalog: {} templates over {} phases",
            catalog.phases.values().map(Vec::len).sum::<usize>(),
            catalog.phases.len()
        );
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        for (phase, templates) in &self.phases {
            for template in templates {
                validate_template(*phase, template)?;
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, phase: PhaseId, template: ChallengeTemplate) {
        self.phases.entry(phase).or_default().push(template);
    }
}

impl ChallengeTemplateProvider for TemplateCatalog {
    fn templates_for_phase(&self, phase: PhaseId) -> &[ChallengeTemplate] {
        self.phases.get(&phase).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Minimal built-in templates covering every phase
#[derive(Debug, Clone)]
pub struct BuiltinTemplates {
    catalog: TemplateCatalog,
}

impl Default for BuiltinTemplates {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinTemplates {
    pub fn new() -> Self {
        use InteractionKind::*;
        let mut catalog = TemplateCatalog::default();
        let mut add = |phase, name: &str, kind, difficulty, limit, reward, shape| {
            catalog.insert(
                phase,
                ChallengeTemplate::new(name, kind, difficulty, limit, reward, shape),
            );
        };

        add(PhaseId::Infancy, "First Steps", Tap, 1, 3000.0, 10, TargetShape::square(90.0));
        add(
            PhaseId::Infancy,
            "Shake the Rattle",
            RapidTap,
            1,
            4000.0,
            15,
            TargetShape::square(90.0).with_taps(3),
        );

        add(
            PhaseId::Childhood,
            "Catch the Ball",
            MovingTarget,
            1,
            4000.0,
            20,
            TargetShape::square(70.0).with_speed(120.0),
        );
        add(
            PhaseId::Childhood,
            "Ride the Bike",
            Drag,
            1,
            3500.0,
            20,
            TargetShape::square(90.0).with_distance(150.0),
        );

        add(
            PhaseId::Adolescence,
            "Cram for Exams",
            RapidTap,
            2,
            4000.0,
            30,
            TargetShape::square(80.0).with_taps(5),
        );
        add(
            PhaseId::Adolescence,
            "Chase the Bus",
            MovingTarget,
            2,
            4000.0,
            30,
            TargetShape::square(70.0).with_speed(160.0),
        );

        add(PhaseId::Adulthood, "Land the Job", Tap, 2, 2500.0, 40, TargetShape::square(60.0));
        add(
            PhaseId::Adulthood,
            "Pay the Bills",
            Drag,
            2,
            3500.0,
            40,
            TargetShape::square(80.0).with_distance(200.0),
        );
        add(
            PhaseId::Adulthood,
            "Commute",
            MovingTarget,
            2,
            4000.0,
            45,
            TargetShape::square(70.0).with_speed(180.0),
        );

        add(PhaseId::Elder, "Remember Names", Tap, 1, 3500.0, 35, TargetShape::square(80.0));
        add(
            PhaseId::Elder,
            "Tend the Garden",
            Drag,
            1,
            4000.0,
            35,
            TargetShape::square(90.0).with_distance(120.0),
        );

        Self { catalog }
    }
}

impl ChallengeTemplateProvider for BuiltinTemplates {
    fn templates_for_phase(&self, phase: PhaseId) -> &[ChallengeTemplate] {
        self.catalog.templates_for_phase(phase)
    }
}

/// Use `primary`, falling back per phase when it has nothing
#[derive(Debug, Clone)]
pub struct WithFallback<P, F> {
    pub primary: P,
    pub fallback: F,
}

impl<P, F> WithFallback<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: ChallengeTemplateProvider, F: ChallengeTemplateProvider> ChallengeTemplateProvider
    for WithFallback<P, F>
{
    fn templates_for_phase(&self, phase: PhaseId) -> &[ChallengeTemplate] {
        let primary = self.primary.templates_for_phase(phase);
        if primary.is_empty() {
            self.fallback.templates_for_phase(phase)
        } else {
            primary
        }
    }
}
