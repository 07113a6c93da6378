//! Outbound notifications
//!
//! The core writes every event to an outbox the host drains, and also hands
//! it to any subscribed listeners. Neither side is required; delivery is
//! fire-and-forget.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::challenge::InteractionKind;
use super::difficulty::Adjustment;
use super::stage::PhaseId;

/// Terminal-transition notice for audio/score collaborators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeNotice {
    pub challenge_id: u32,
    /// Reward earned (0 on failure)
    pub reward: u32,
    pub success: bool,
    pub position: Vec2,
}

/// Everything the core announces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ChallengeSpawned {
        challenge_id: u32,
        name: String,
        kind: InteractionKind,
        difficulty: u8,
        position: Vec2,
    },
    /// Exactly one per challenge, on Completed or Failed
    Outcome(OutcomeNotice),
    DifficultyAdjusted {
        adjustment: Adjustment,
        modifier: i8,
    },
    PhaseEntered {
        phase: PhaseId,
    },
    SessionComplete {
        total_reward: u64,
    },
}

/// Subscriber to core events
pub trait EventListener {
    fn on_event(&mut self, event: &GameEvent);
}

impl<L: EventListener + ?Sized> EventListener for Rc<RefCell<L>> {
    fn on_event(&mut self, event: &GameEvent) {
        self.borrow_mut().on_event(event);
    }
}

/// Outbox plus subscriber list
#[derive(Default)]
pub struct EventBus {
    outbox: Vec<GameEvent>,
    listeners: Vec<Box<dyn EventListener>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("outbox", &self.outbox)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub fn emit(&mut self, event: GameEvent) {
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
        self.outbox.push(event);
    }

    /// Take all queued events, oldest first
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Drop queued events (subscribers are kept)
    pub fn clear(&mut self) {
        self.outbox.clear();
    }
}
