//! The gate in front of the host's "loaded" signal.
//!
//! Widgets get a bounded number of frames to mount and announce that they
//! load asynchronously. After that the barrier waits for every announced
//! widget to report ready, then fires once. Hiding and re-showing the HUD
//! starts a new session.

use tracing::debug;

use crate::common::collections::HashSet;
use crate::model::widget::WidgetId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyPhase {
    Mounting { frames_left: u32 },
    Waiting,
    Ready,
}

/// Proof that the barrier fired. Handed out once per session.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllLoaded {
    pub session: u64,
}

#[derive(Debug, Clone)]
pub struct ReadinessBarrier {
    phase: ReadyPhase,
    frame_budget: u32,
    pending: HashSet<WidgetId>,
    // ready signals that arrived before their registration
    early: HashSet<WidgetId>,
    session: u64,
}

impl ReadinessBarrier {
    pub fn new(frame_budget: u32) -> Self {
        Self {
            phase: ReadyPhase::Mounting { frames_left: frame_budget },
            frame_budget,
            pending: HashSet::default(),
            early: HashSet::default(),
            session: 0,
        }
    }

    pub fn phase(&self) -> &ReadyPhase { &self.phase }

    pub fn is_ready(&self) -> bool { self.phase == ReadyPhase::Ready }

    pub fn session(&self) -> u64 { self.session }

    pub fn pending(&self) -> usize { self.pending.len() }

    /// Announces a widget that will signal readiness later. Ignored once the
    /// session is ready.
    pub fn register_async(&mut self, id: WidgetId) -> bool {
        if self.is_ready() {
            debug!(%id, "late async registration ignored");
            return false;
        }
        if self.early.remove(&id) {
            return false;
        }
        self.pending.insert(id)
    }

    pub fn signal_ready(&mut self, id: &WidgetId) -> Option<AllLoaded> {
        if self.is_ready() {
            return None;
        }
        if !self.pending.remove(id) {
            self.early.insert(id.clone());
        }
        self.try_complete()
    }

    /// Advances the mount window by one render cycle.
    pub fn on_frame(&mut self) -> Option<AllLoaded> {
        match self.phase {
            ReadyPhase::Mounting { frames_left } if frames_left > 1 => {
                self.phase = ReadyPhase::Mounting { frames_left: frames_left - 1 };
                None
            }
            ReadyPhase::Mounting { .. } => {
                self.phase = ReadyPhase::Waiting;
                debug!(session = self.session, pending = self.pending.len(), "mount window closed");
                None
            }
            ReadyPhase::Waiting => self.try_complete(),
            ReadyPhase::Ready => None,
        }
    }

    fn try_complete(&mut self) -> Option<AllLoaded> {
        if self.phase != ReadyPhase::Waiting || !self.pending.is_empty() {
            return None;
        }
        self.phase = ReadyPhase::Ready;
        debug!(session = self.session, "all widgets loaded");
        Some(AllLoaded { session: self.session })
    }

    /// Starts a new visibility session.
    pub fn reset(&mut self) {
        self.phase = ReadyPhase::Mounting { frames_left: self.frame_budget };
        self.pending.clear();
        self.early.clear();
        self.session += 1;
        debug!(session = self.session, "readiness reset");
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn frames(barrier: &mut ReadinessBarrier, n: usize) -> Vec<AllLoaded> {
        (0..n).filter_map(|_| barrier.on_frame()).collect()
    }

    #[test_log::test]
    fn nothing_registered_still_becomes_ready() {
        let mut barrier = ReadinessBarrier::new(3);
        assert!(frames(&mut barrier, 2).is_empty());
        assert_eq!(barrier.phase(), &ReadyPhase::Mounting { frames_left: 1 });

        assert!(barrier.on_frame().is_none());
        assert_eq!(barrier.phase(), &ReadyPhase::Waiting);

        assert_eq!(barrier.on_frame(), Some(AllLoaded { session: 0 }));
        assert!(barrier.is_ready());
    }

    #[test]
    fn waits_for_every_async_widget() {
        let mut barrier = ReadinessBarrier::new(1);
        barrier.register_async(WidgetId::from("minimap"));
        barrier.register_async(WidgetId::from("chat"));

        assert!(frames(&mut barrier, 5).is_empty());
        assert_eq!(barrier.phase(), &ReadyPhase::Waiting);

        assert!(barrier.signal_ready(&WidgetId::from("minimap")).is_none());
        assert_eq!(
            barrier.signal_ready(&WidgetId::from("chat")),
            Some(AllLoaded { session: 0 })
        );
    }

    #[test]
    fn fires_exactly_once_per_session() {
        let mut barrier = ReadinessBarrier::new(1);
        let fired = frames(&mut barrier, 10);
        assert_eq!(fired.len(), 1);
        assert!(barrier.signal_ready(&WidgetId::from("x")).is_none());
        assert!(!barrier.register_async(WidgetId::from("y")));

        barrier.reset();
        assert_eq!(barrier.phase(), &ReadyPhase::Mounting { frames_left: 1 });
        assert_eq!(frames(&mut barrier, 10), [AllLoaded { session: 1 }]);
    }

    #[test]
    fn ready_signal_before_registration_does_not_block() {
        let mut barrier = ReadinessBarrier::new(1);
        let _ = barrier.signal_ready(&WidgetId::from("compass"));
        assert!(!barrier.register_async(WidgetId::from("compass")));
        assert_eq!(barrier.pending(), 0);
        assert_eq!(frames(&mut barrier, 2).len(), 1);
    }

    #[test]
    fn zero_budget_closes_on_first_frame() {
        let mut barrier = ReadinessBarrier::new(0);
        assert!(barrier.on_frame().is_none());
        assert_eq!(barrier.phase(), &ReadyPhase::Waiting);
    }
}
