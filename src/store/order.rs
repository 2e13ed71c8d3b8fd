//! Visible order of records.
//!
//! Keeps the flattened slot sequence together with a per-slot position index
//! so "where is id X" is O(1) for scroll requests and resize invalidation.

use super::INVALID;

/// Depth-first, pre-order sequence of visible slots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Order {
    slots: Vec<u32>,
    position: Vec<u32>,
}

impl Order {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn slots(&self) -> &[u32] {
        &self.slots
    }

    pub(crate) fn slot_at(&self, index: usize) -> Option<u32> {
        self.slots.get(index).copied()
    }

    pub(crate) fn position(&self, slot: u32) -> Option<usize> {
        match self.position.get(slot as usize) {
            Some(&pos) if pos != INVALID => Some(pos as usize),
            _ => None,
        }
    }

    /// Install a freshly flattened sequence. `store_len` sizes the position index.
    pub(crate) fn replace(&mut self, slots: Vec<u32>, store_len: usize) {
        for &old in &self.slots {
            if let Some(pos) = self.position.get_mut(old as usize) {
                *pos = INVALID;
            }
        }
        self.position.resize(store_len, INVALID);
        for (index, &slot) in slots.iter().enumerate() {
            self.position[slot as usize] = index as u32;
        }
        self.slots = slots;
    }

    /// Remove `count` entries starting at `start`, shifting the tail left.
    pub(crate) fn remove_range(&mut self, start: usize, count: usize) {
        if count == 0 {
            return;
        }
        for slot in self.slots.drain(start..start + count) {
            self.position[slot as usize] = INVALID;
        }
        for (index, &slot) in self.slots.iter().enumerate().skip(start) {
            self.position[slot as usize] = index as u32;
        }
    }

    /// Rewrite slots after the record store was compacted.
    pub(crate) fn remap(&mut self, remap: &[u32], store_len: usize) {
        let slots = self
            .slots
            .iter()
            .map(|&slot| remap[slot as usize])
            .filter(|&slot| slot != INVALID)
            .collect();
        self.position = vec![INVALID; store_len];
        self.slots = Vec::new();
        self.replace(slots, store_len);
    }
}
