//! Platform abstraction layer
//!
//! The core assumes single-threaded access. Hosts whose input callbacks run
//! on another thread hand samples to a [`SampleSender`]; the game loop
//! drains the matching [`SampleQueue`] into the session at the start of
//! each tick.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use serde::Deserialize;

use crate::sim::input::{InteractionSample, SampleKind};
use crate::sim::state::SessionState;
use crate::sim::tick::TickInput;

/// Sample as delivered by a host input layer, before kind validation
#[derive(Debug, Clone, Deserialize)]
pub struct RawSample {
    pub kind: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub dx: f32,
    #[serde(default)]
    pub dy: f32,
    #[serde(default)]
    pub timestamp_ms: f64,
}

impl RawSample {
    /// Convert to a core sample; unrecognized kinds yield `None`
    pub fn parse(&self) -> Option<InteractionSample> {
        let kind = SampleKind::parse(&self.kind)?;
        Some(InteractionSample {
            kind,
            x: self.x,
            y: self.y,
            dx: self.dx,
            dy: self.dy,
            timestamp_ms: self.timestamp_ms,
        })
    }
}

/// Cloneable producer side, safe to move to input threads
#[derive(Debug, Clone)]
pub struct SampleSender {
    tx: Sender<InteractionSample>,
}

impl SampleSender {
    /// Queue a sample; returns false once the queue has been dropped
    pub fn send(&self, sample: InteractionSample) -> bool {
        self.tx.send(sample).is_ok()
    }

    /// Queue a raw host sample, dropping unrecognized kinds
    pub fn send_raw(&self, raw: &RawSample) -> bool {
        match raw.parse() {
            Some(sample) => self.send(sample),
            None => {
                log::warn!("Dropping sample with unknown kind '{}'", raw.kind);
                false
            }
        }
    }
}

/// Consumer side, owned by the game loop
#[derive(Debug)]
pub struct SampleQueue {
    rx: Receiver<InteractionSample>,
}

impl SampleQueue {
    pub fn new() -> (SampleSender, SampleQueue) {
        let (tx, rx) = mpsc::channel();
        (SampleSender { tx }, SampleQueue { rx })
    }

    /// Everything queued so far, in arrival order
    pub fn drain(&self) -> Vec<InteractionSample> {
        let mut samples = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(sample) => samples.push(sample),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        samples
    }

    /// Build the input for the next tick from everything queued
    pub fn tick_input(&self) -> TickInput {
        TickInput::with_samples(self.drain())
    }

    /// Move everything queued into the session's own buffer
    pub fn drain_into(&self, state: &mut SessionState) -> usize {
        let samples = self.drain();
        let count = samples.len();
        for sample in samples {
            state.queue_sample(sample);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::tick::tick;
    use std::thread;

    #[test]
    fn test_raw_sample_kinds() {
        let raw: RawSample = serde_json::from_str(r#"{"kind":"tap","x":1.0,"y":2.0}"#).unwrap();
        assert_eq!(raw.parse(), Some(InteractionSample::tap(1.0, 2.0)));

        let raw = RawSample {
            kind: "pinch".into(),
            ..raw
        };
        assert_eq!(raw.parse(), None);
    }

    #[test]
    fn test_samples_cross_threads_in_order() {
        let (sender, queue) = SampleQueue::new();
        let handle = thread::spawn(move || {
            for i in 0..50 {
                sender.send(InteractionSample::tap(i as f32, 0.0));
            }
            sender.send_raw(&RawSample {
                kind: "wiggle".into(),
                x: 0.0,
                y: 0.0,
                dx: 0.0,
                dy: 0.0,
                timestamp_ms: 0.0,
            })
        });
        assert!(!handle.join().unwrap());

        let samples = queue.drain();
        assert_eq!(samples.len(), 50);
        assert!(samples.windows(2).all(|w| w[0].x < w[1].x));
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_queued_samples_resolve_on_next_tick() {
        let (sender, queue) = SampleQueue::new();
        let mut state = SessionState::with_builtin_templates(Settings::with_seed(12));
        state.start();
        tick(&mut state, &TickInput::default(), 2000.0);
        let target = state.active()[0].pos;

        // Several taps cover rapid-tap templates too
        for _ in 0..5 {
            sender.send(InteractionSample::tap(target.x, target.y));
        }
        assert_eq!(queue.drain_into(&mut state), 5);
        assert_eq!(state.completed().len(), 0);

        tick(&mut state, &queue.tick_input(), 16.0);
        assert_eq!(state.completed().len(), 1);
    }
}
