// Event Catalog
// Ordered events from one feed load or browse search, plus a cursor.
// Every successful move yields the event to hand to `select`.

use serde::{Deserialize, Serialize};

use crate::physics_engine::ImpactEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogMode {
    /// Latest feed; "next" wraps around.
    Feed,
    /// Year-scoped search; prev/next stop at the ends.
    Browse { year: i32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCatalog {
    mode: CatalogMode,
    events: Vec<ImpactEvent>,
    index: usize,
}

impl Default for EventCatalog {
    fn default() -> Self {
        Self::new(CatalogMode::Feed)
    }
}

impl EventCatalog {
    pub fn new(mode: CatalogMode) -> Self {
        Self {
            mode,
            events: Vec::new(),
            index: 0,
        }
    }

    /// Replace the contents (a new feed load or search) and rewind.
    pub fn load(&mut self, mode: CatalogMode, events: Vec<ImpactEvent>) -> Option<&ImpactEvent> {
        tracing::info!(?mode, count = events.len(), "catalog loaded");
        self.mode = mode;
        self.events = events;
        self.index = 0;
        self.events.first()
    }

    pub fn mode(&self) -> CatalogMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn events(&self) -> &[ImpactEvent] {
        &self.events
    }

    pub fn current(&self) -> Option<&ImpactEvent> {
        self.events.get(self.index)
    }

    /// 1-based position and total, e.g. (3, 20). `None` when empty.
    pub fn counter(&self) -> Option<(usize, usize)> {
        (!self.events.is_empty()).then(|| (self.index + 1, self.events.len()))
    }

    /// Feed mode only: step forward, wrapping to the start.
    pub fn advance(&mut self) -> Option<&ImpactEvent> {
        if self.mode != CatalogMode::Feed || self.events.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.events.len();
        self.events.get(self.index)
    }

    pub fn has_next(&self) -> bool {
        matches!(self.mode, CatalogMode::Browse { .. }) && self.index + 1 < self.events.len()
    }

    pub fn has_previous(&self) -> bool {
        matches!(self.mode, CatalogMode::Browse { .. }) && self.index > 0 && !self.events.is_empty()
    }

    /// Browse mode only.
    pub fn next(&mut self) -> Option<&ImpactEvent> {
        if !self.has_next() {
            return None;
        }
        self.index += 1;
        self.events.get(self.index)
    }

    /// Browse mode only.
    pub fn previous(&mut self) -> Option<&ImpactEvent> {
        if !self.has_previous() {
            return None;
        }
        self.index -= 1;
        self.events.get(self.index)
    }
}
