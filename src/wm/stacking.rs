//! Stacking Module
//!
//! Ordering of the windows attached to one parent. Children are kept bottom
//! to top by sub-layer; among equal sub-layers a negative one goes below its
//! siblings and a non-negative one goes above them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::wm::window::WindowId;

/// One attached child and the sub-layer it was inserted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildEntry {
    pub id: WindowId,
    pub sub_layer: i32,
}

/// Child windows of a parent, bottom to top
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildWindows {
    entries: Vec<ChildEntry>,
}

impl ChildWindows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a child at its sub-layer position
    pub fn insert(&mut self, id: WindowId, sub_layer: i32) {
        let position = self
            .entries
            .iter()
            .position(|child| {
                sub_layer < child.sub_layer || (sub_layer == child.sub_layer && child.sub_layer < 0)
            })
            .unwrap_or(self.entries.len());

        debug!("Attaching child {} (sub-layer {}) at index {}", id, sub_layer, position);
        self.entries.insert(position, ChildEntry { id, sub_layer });
    }

    /// Detach a child, returns whether it was attached
    pub fn remove(&mut self, id: WindowId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|child| child.id != id);
        before != self.entries.len()
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.entries.iter().any(|child| child.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Child ids, bottom to top
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = WindowId> + '_ {
        self.entries.iter().map(|child| child.id)
    }

    pub fn entries(&self) -> &[ChildEntry] {
        &self.entries
    }

    /// Children drawn under the parent surface
    pub fn below_parent(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.entries.iter().filter(|c| c.sub_layer < 0).map(|c| c.id)
    }

    /// Children drawn over the parent surface
    pub fn above_parent(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.entries.iter().filter(|c| c.sub_layer >= 0).map(|c| c.id)
    }
}
