//! Generational slot arena.
//!
//! Values live in one `Vec`. Vacant slots are chained into a free list
//! through the vector itself, so a removed slot is reused by the next insert
//! without any side allocation. Every slot carries a generation that is
//! bumped when its value leaves; a [`SlotId`] records the generation it was
//! issued under, so a handle to a removed value never resolves to whatever
//! took its place.
//!
//! ```text
//!   slots: [ Occupied{g0, A} | Vacant{g1, next: 3} | Occupied{g0, C} | Vacant{g2, next: -} ]
//!                                ▲
//!   free_head ───────────────────┘
//! ```

use std::fmt;

/// Stable, non-owning handle to a value in a [`SlotArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    index: usize,
    generation: u32,
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

#[derive(Debug)]
enum Entry<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32, next_free: Option<usize> },
}

/// Vector-backed storage addressed by [`SlotId`].
#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Entry<T>>,
    free_head: Option<usize>,
    len: usize,
}

impl<T> SlotArena<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores `value`, reusing the most recently freed slot if there is one.
    pub fn insert(&mut self, value: T) -> SlotId {
        self.len += 1;
        if let Some(index) = self.free_head
            && let Some(&Entry::Vacant {
                generation,
                next_free,
            }) = self.slots.get(index)
        {
            self.slots[index] = Entry::Occupied { generation, value };
            self.free_head = next_free;
            return SlotId { index, generation };
        }

        self.slots.push(Entry::Occupied {
            generation: 0,
            value,
        });
        SlotId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Takes the value out of `id`. Returns `None` for a stale handle.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let slot = self.slots.get_mut(id.index)?;
        if !matches!(slot, Entry::Occupied { generation, .. } if *generation == id.generation) {
            return None;
        }
        let vacant = Entry::Vacant {
            generation: id.generation.wrapping_add(1),
            next_free: self.free_head,
        };
        let Entry::Occupied { value, .. } = std::mem::replace(slot, vacant) else {
            return None;
        };
        self.free_head = Some(id.index);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        match self.slots.get(id.index)? {
            Entry::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        match self.slots.get_mut(id.index)? {
            Entry::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    /// Drops every value. Outstanding handles stay invalid afterwards.
    pub fn clear(&mut self) {
        self.free_head = None;
        for index in (0..self.slots.len()).rev() {
            let slot = &mut self.slots[index];
            let generation = match slot {
                Entry::Occupied { generation, .. } => generation.wrapping_add(1),
                Entry::Vacant { generation, .. } => *generation,
            };
            *slot = Entry::Vacant {
                generation,
                next_free: self.free_head,
            };
            self.free_head = Some(index);
        }
        self.len = 0;
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
