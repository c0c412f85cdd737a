//! Fixed-capacity object pool.
//!
//! Slots are allocated up front and handed out from a free-list stack, so
//! acquiring and releasing are O(1) and the pool never grows past its capacity.
//! `acquire` returns `None` when every slot is in use; callers treat that as a
//! silent no-op.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

#[derive(Debug, Clone)]
pub struct Pool<T> {
    slots: Vec<Option<T>>,
    free_list: Vec<usize>,
}

impl<T> Pool<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        // Reverse so the lowest index is handed out first.
        let free_list = (0..capacity).rev().collect();
        Self { slots, free_list }
    }

    pub fn count_active(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn acquire(&mut self, value: T) -> Option<SlotId> {
        let index = self.free_list.pop()?;
        self.slots[index] = Some(value);
        Some(SlotId(index))
    }

    pub fn release(&mut self, id: SlotId) -> Option<T> {
        let value = self.slots.get_mut(id.0)?.take()?;
        self.free_list.push(id.0);
        Some(value)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots.get(id.0)?.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (SlotId(i), v)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotId, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|v| (SlotId(i), v)))
    }

    /// Snapshot of live slot ids, for loops that release while walking.
    pub fn active_ids(&self) -> Vec<SlotId> {
        self.iter().map(|(id, _)| id).collect()
    }
}
