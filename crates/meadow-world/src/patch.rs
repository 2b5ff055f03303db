//! A single patch of the meadow: some greens and the bunnies sitting on them.

use meadow_core::BunnyId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    resource: f64,
    cap: f64,
    occupants: Vec<BunnyId>,
}

impl Patch {
    pub fn new(resource: f64, cap: f64) -> Self {
        debug_assert!(cap > 0.0);
        Self {
            resource: resource.clamp(0.0, cap),
            cap,
            occupants: Vec::new(),
        }
    }

    pub fn resource(&self) -> f64 {
        self.resource
    }

    pub fn cap(&self) -> f64 {
        self.cap
    }

    /// How green the patch is, from 0 (bare dirt) to 1 (full).
    pub fn green_fraction(&self) -> f64 {
        self.resource / self.cap
    }

    /// Exponential growth clamped at the cap. A bare patch stays bare.
    pub fn grow(&mut self, rate: f64) {
        self.resource = (self.resource + self.resource * rate).min(self.cap);
    }

    /// Remove up to `requested` greens and return how much was actually eaten.
    pub fn consume(&mut self, requested: f64) -> f64 {
        let eaten = requested.max(0.0).min(self.resource);
        self.resource -= eaten;
        eaten
    }

    /// Bunnies on this patch, in arrival order
    pub fn occupants(&self) -> &[BunnyId] {
        &self.occupants
    }

    pub fn first_occupant(&self) -> Option<BunnyId> {
        self.occupants.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    pub(crate) fn move_in(&mut self, id: BunnyId) {
        self.occupants.push(id);
    }

    /// Panics if the bunny is not here; that means the bookkeeping is broken.
    pub(crate) fn move_out(&mut self, id: BunnyId) {
        let index = self
            .occupants
            .iter()
            .position(|&occupant| occupant == id)
            .unwrap_or_else(|| panic!("bunny {id} is not on this patch"));
        self.occupants.remove(index);
    }
}
