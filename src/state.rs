use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::overlay::OverlayLimits;

#[derive(Clone)]
pub struct AppState {
    pub limits: OverlayLimits,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(limits: OverlayLimits) -> Self {
        AppState {
            limits,
            started_at: Instant::now(),
        }
    }
}

/// Handle for one in-flight image generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket {
    pub index: usize,
    token: u64,
}

#[derive(Debug, Default)]
struct SlotState {
    latest: u64,
    loading: bool,
}

/// Tracks image generations per outfit index. Only the most recently begun
/// request for an index may commit its result; older completions are stale.
#[derive(Clone, Default)]
pub struct GenerationTracker {
    slots: Arc<Mutex<HashMap<usize, SlotState>>>,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, index: usize) -> GenerationTicket {
        let mut slots = self.slots.lock();
        let slot = slots.entry(index).or_default();
        slot.latest += 1;
        slot.loading = true;
        GenerationTicket {
            index,
            token: slot.latest,
        }
    }

    /// Returns true when the ticket is still current and its result should be
    /// kept. The loading flag clears only for the current ticket.
    pub fn finish(&self, ticket: GenerationTicket) -> bool {
        let mut slots = self.slots.lock();
        match slots.get_mut(&ticket.index) {
            Some(slot) if slot.latest == ticket.token => {
                slot.loading = false;
                true
            }
            _ => false,
        }
    }

    pub fn is_loading(&self, index: usize) -> bool {
        self.slots
            .lock()
            .get(&index)
            .map(|slot| slot.loading)
            .unwrap_or(false)
    }
}
