//! Record Store
//!
//! Arena of per-node records plus the structural links the flattening pass
//! rebuilds on every walk. Links are `u32` slot handles into the same arena
//! ([`INVALID`] when absent); nothing here owns anything else, so rebuilding
//! the topology is plain overwriting.
//!
//! Records are created on first encounter and are never dropped by a pass.
//! Visibility is expressed through [`Order`] membership and
//! [`RecordStore::is_shown`], not by deletion.

pub mod order;
pub mod traverse;

pub use order::Order;
pub use traverse::Children;
pub(crate) use traverse::Descendants;

use crate::types::NodeData;
use std::collections::HashMap;

/// Sentinel for "no slot".
pub const INVALID: u32 = u32::MAX;

/// Durable engine-owned state for one node id
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T: NodeData> {
    id: T::Id,
    data: T,
    is_open: bool,
    size: Option<f64>,
    depth: u32,
}

impl<T: NodeData> Record<T> {
    fn new(data: T) -> Self {
        Self {
            id: data.id().clone(),
            is_open: data.is_open_by_default(),
            size: data.default_size(),
            depth: 0,
            data,
        }
    }

    pub fn id(&self) -> &T::Id {
        &self.id
    }

    /// Latest descriptor seen on a refresh pull.
    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Change openness. Takes effect on Order at the next recomputation.
    pub fn set_open(&mut self, open: bool) {
        self.is_open = open;
    }

    pub fn size(&self) -> Option<f64> {
        self.size
    }

    pub fn set_size(&mut self, size: Option<f64>) {
        self.size = size;
    }

    /// Nesting depth at the record's most recent visit.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub(crate) fn refresh(&mut self, data: T, use_default_openness: bool, use_default_size: bool) {
        if use_default_openness {
            self.is_open = data.is_open_by_default();
        }
        if use_default_size {
            self.size = data.default_size();
        }
        self.data = data;
    }
}

/// Arena of records with parent / first-child / next-sibling links
#[derive(Debug, Clone)]
pub struct RecordStore<T: NodeData> {
    records: Vec<Record<T>>,
    index: HashMap<T::Id, u32>,

    // -- Topology (rebuilt per pass for visited slots) --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    last_child: Vec<u32>,
    first_root: u32,
    last_root: u32,

    // -- Pass bookkeeping --
    seen: Vec<u64>,
    /// Pass that last descended into the slot; 0 if its children are unknown.
    descended: Vec<u64>,
    pass: u64,
}

impl<T: NodeData> Default for RecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NodeData> RecordStore<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            last_child: Vec::new(),
            first_root: INVALID,
            last_root: INVALID,
            seen: Vec::new(),
            descended: Vec::new(),
            pass: 0,
        }
    }

    /// Number of records ever captured (shown or not).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &T::Id) -> Option<&Record<T>> {
        self.slot(id).map(|slot| &self.records[slot as usize])
    }

    pub fn get_mut(&mut self, id: &T::Id) -> Option<&mut Record<T>> {
        let slot = self.slot(id)?;
        Some(&mut self.records[slot as usize])
    }

    /// All records in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Record<T>> {
        self.records.iter()
    }

    /// Number of completed or in-progress walks over this store.
    pub fn pass(&self) -> u64 {
        self.pass
    }

    /// Whether the record was reached by the latest walk and every ancestor is open.
    pub fn is_shown(&self, id: &T::Id) -> bool {
        self.slot(id).is_some_and(|slot| self.is_shown_at(slot))
    }

    pub fn parent(&self, id: &T::Id) -> Option<&Record<T>> {
        let slot = self.slot(id)?;
        self.parent_of(slot).map(|p| &self.records[p as usize])
    }

    /// Direct children as linked by the latest walk that descended into `id`.
    pub fn children(&self, id: &T::Id) -> Option<Children<'_, T>> {
        self.slot(id).map(|slot| self.children_at(slot))
    }

    /// Roots of the latest walk, in walk order.
    pub fn roots(&self) -> Children<'_, T> {
        Children::roots(self, self.first_root)
    }

    // -- Slot-level API (crate internal) --

    pub(crate) fn slot(&self, id: &T::Id) -> Option<u32> {
        self.index.get(id).copied()
    }

    pub(crate) fn record(&self, slot: u32) -> &Record<T> {
        &self.records[slot as usize]
    }

    pub(crate) fn record_mut(&mut self, slot: u32) -> &mut Record<T> {
        &mut self.records[slot as usize]
    }

    /// Mutable access to `slot` alongside shared access to a different `owner` slot.
    ///
    /// # Panics
    ///
    /// Panics if both slots are equal.
    pub(crate) fn record_pair(&mut self, slot: u32, owner: u32) -> (&mut Record<T>, &Record<T>) {
        assert_ne!(slot, owner, "record_pair needs distinct slots");
        let (slot, owner) = (slot as usize, owner as usize);
        if slot < owner {
            let (head, tail) = self.records.split_at_mut(owner);
            (&mut head[slot], &tail[0])
        } else {
            let (head, tail) = self.records.split_at_mut(slot);
            (&mut tail[0], &head[owner])
        }
    }

    pub(crate) fn parent_of(&self, slot: u32) -> Option<u32> {
        let p = self.parent[slot as usize];
        (p != INVALID).then_some(p)
    }

    pub(crate) fn children_at(&self, slot: u32) -> Children<'_, T> {
        Children::new(self, slot)
    }

    pub(crate) fn descendants_at(&self, slot: u32) -> Descendants {
        Descendants::new(self, slot)
    }

    pub(crate) fn is_seen(&self, slot: u32) -> bool {
        self.seen[slot as usize] == self.pass
    }

    pub(crate) fn has_descended(&self, slot: u32) -> bool {
        self.descended[slot as usize] != 0
    }

    /// Whether a walk from `slot` through open records would reach an open
    /// record whose children no walk has produced yet.
    pub(crate) fn exposes_undiscovered(&self, slot: u32) -> bool {
        let mut stack = vec![slot];
        while let Some(current) = stack.pop() {
            if !self.records[current as usize].is_open {
                continue;
            }
            if self.descended[current as usize] == 0 {
                return true;
            }
            let mut children = self.children_at(current);
            while let Some(child) = children.next_slot() {
                stack.push(child);
            }
        }
        false
    }

    pub(crate) fn is_shown_at(&self, slot: u32) -> bool {
        if self.pass == 0 || !self.is_seen(slot) {
            return false;
        }
        let mut current = self.parent[slot as usize];
        while current != INVALID {
            if !self.records[current as usize].is_open {
                return false;
            }
            current = self.parent[current as usize];
        }
        true
    }

    /// Capture a new record with default openness and size.
    pub(crate) fn insert(&mut self, data: T) -> u32 {
        let slot = self.records.len() as u32;
        self.index.insert(data.id().clone(), slot);
        self.records.push(Record::new(data));
        self.parent.push(INVALID);
        self.first_child.push(INVALID);
        self.next_sibling.push(INVALID);
        self.last_child.push(INVALID);
        self.seen.push(0);
        self.descended.push(0);
        slot
    }

    // -- Walk-time topology rebuild --

    /// Start a new walk. Root links are cleared; per-slot links are
    /// overwritten as slots are visited.
    pub(crate) fn begin_pass(&mut self) -> u64 {
        self.pass += 1;
        self.first_root = INVALID;
        self.last_root = INVALID;
        self.pass
    }

    /// Link `slot` as the last child of `parent` (or the last root).
    pub(crate) fn visit(&mut self, slot: u32, parent: u32, depth: u32) {
        let s = slot as usize;
        self.seen[s] = self.pass;
        self.records[s].depth = depth;
        self.parent[s] = parent;
        self.next_sibling[s] = INVALID;

        let tail = if parent == INVALID {
            self.last_root
        } else {
            self.last_child[parent as usize]
        };
        if tail == INVALID {
            if parent == INVALID {
                self.first_root = slot;
            } else {
                self.first_child[parent as usize] = slot;
            }
        } else {
            self.next_sibling[tail as usize] = slot;
        }
        if parent == INVALID {
            self.last_root = slot;
        } else {
            self.last_child[parent as usize] = slot;
        }
    }

    /// The walk is about to descend into `slot`: forget its old child list.
    pub(crate) fn begin_children(&mut self, slot: u32) {
        self.first_child[slot as usize] = INVALID;
        self.last_child[slot as usize] = INVALID;
        self.descended[slot as usize] = self.pass;
    }

    /// Drop every record `keep` rejects and renumber the rest.
    ///
    /// Returns the old-slot to new-slot mapping ([`INVALID`] for dropped slots).
    /// Links into dropped slots are cut. A record keeps its known children
    /// only if the latest pass descended into it and every child it linked
    /// then survives; any other record is marked as never descended so its
    /// children get rediscovered.
    pub(crate) fn compact(&mut self, keep: impl Fn(u32) -> bool) -> Vec<u32> {
        let old_len = self.records.len();
        let mut remap = vec![INVALID; old_len];
        let mut next = 0u32;
        for (slot, entry) in remap.iter_mut().enumerate() {
            if keep(slot as u32) {
                *entry = next;
                next += 1;
            }
        }

        // Older child chains may have lost members to other parents, so
        // their completeness cannot be checked.
        let children_intact: Vec<bool> = (0..old_len as u32)
            .map(|slot| {
                if self.descended[slot as usize] != self.pass {
                    return false;
                }
                let mut children = self.children_at(slot);
                std::iter::from_fn(|| children.next_slot())
                    .all(|child| remap[child as usize] != INVALID)
            })
            .collect();

        let map = |link: u32| {
            if link == INVALID {
                INVALID
            } else {
                remap[link as usize]
            }
        };

        let mut records = Vec::with_capacity(next as usize);
        let mut parent = Vec::with_capacity(next as usize);
        let mut first_child = Vec::with_capacity(next as usize);
        let mut next_sibling = Vec::with_capacity(next as usize);
        let mut seen = Vec::with_capacity(next as usize);
        let mut descended = Vec::with_capacity(next as usize);
        for (slot, record) in std::mem::take(&mut self.records).into_iter().enumerate() {
            if remap[slot] == INVALID {
                continue;
            }
            records.push(record);
            parent.push(map(self.parent[slot]));
            first_child.push(map(self.first_child[slot]));
            next_sibling.push(map(self.next_sibling[slot]));
            seen.push(self.seen[slot]);
            descended.push(if children_intact[slot] {
                self.descended[slot]
            } else {
                0
            });
        }

        self.index = records
            .iter()
            .enumerate()
            .map(|(slot, record)| (record.id.clone(), slot as u32))
            .collect();
        self.last_child = vec![INVALID; records.len()];
        self.records = records;
        self.parent = parent;
        self.first_child = first_child;
        self.next_sibling = next_sibling;
        self.seen = seen;
        self.descended = descended;
        self.first_root = map(self.first_root);
        self.last_root = map(self.last_root);
        remap
    }
}
