//! Expand/collapse coordination for the saved-collection panels.
//!
//! Tracks which panel indices are open and reconciles individual toggles
//! with the single global expand-all/collapse-all affordance: the global
//! control mirrors panel state, it is not an independent switch.

use std::collections::BTreeSet;

/// Derived signal reported upward after a toggle, driving the global
/// affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Every panel is now open
    ExpandAll,
    /// Every panel is now closed
    CollapseAll,
}

/// Expansion state over a list of `len` collections.
#[derive(Debug, Clone, Default)]
pub struct ExpansionCoordinator {
    len: usize,
    active: BTreeSet<usize>,
}

impl ExpansionCoordinator {
    /// Coordinator over `len` panels, all collapsed
    pub fn new(len: usize) -> Self {
        Self {
            len,
            active: BTreeSet::new(),
        }
    }

    /// Number of panels tracked
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no panels are tracked
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether panel `index` is open
    pub fn is_active(&self, index: usize) -> bool {
        self.active.contains(&index)
    }

    /// Open panel indices, ascending
    pub fn active_indices(&self) -> Vec<usize> {
        self.active.iter().copied().collect()
    }

    /// Whether every panel is open
    pub fn all_expanded(&self) -> bool {
        self.active.len() == self.len
    }

    /// Whether every panel is closed
    pub fn none_expanded(&self) -> bool {
        self.active.is_empty()
    }

    /// Flip panel `index`; returns the derived global signal, if any.
    pub fn toggle(&mut self, index: usize) -> Option<Signal> {
        if index >= self.len {
            return None;
        }
        if !self.active.remove(&index) {
            self.active.insert(index);
        }
        if self.all_expanded() {
            Some(Signal::ExpandAll)
        } else if self.none_expanded() {
            Some(Signal::CollapseAll)
        } else {
            None
        }
    }

    /// Open or close every panel at once
    pub fn set_all(&mut self, expand: bool) {
        self.active = if expand {
            (0..self.len).collect()
        } else {
            BTreeSet::new()
        };
    }

    /// Account for the deletion of panel `index`: it leaves the active set
    /// and every open index above it shifts down one (list compaction).
    ///
    /// The tracked length is NOT shortened here: the collection list itself
    /// is only replaced by the follow-up wholesale refresh, which calls
    /// [`resize`](Self::resize). Until then the derived predicates are
    /// computed against the pre-delete list size.
    pub fn on_delete(&mut self, index: usize) {
        if index >= self.len {
            return;
        }
        self.active = self
            .active
            .iter()
            .filter(|&&j| j != index)
            .map(|&j| if j > index { j - 1 } else { j })
            .collect();
    }

    /// Track a wholesale list replacement of `len` panels. Open panels keep
    /// their index; indices beyond the new length are pruned.
    pub fn resize(&mut self, len: usize) {
        self.len = len;
        self.active.retain(|&i| i < len);
    }
}
