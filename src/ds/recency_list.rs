//! Keyed recency list.
//!
//! A doubly linked list whose nodes live in a [`SlotArena`] and point at each
//! other by [`SlotId`]. Each node carries the key it was filed under next to
//! its value, so taking the oldest node out hands back the key the caller
//! has to drop from its index without asking the value for it.
//!
//! ```text
//!   newest                                         oldest
//!     │                                               │
//!     ▼                                               ▼
//!   ┌─────────┐  older  ┌─────────┐  older  ┌─────────┐
//!   │ "k3", C │ ──────► │ "k2", B │ ──────► │ "k1", A │
//!   │         │ ◄────── │         │ ◄────── │         │
//!   └─────────┘  newer  └─────────┘  newer  └─────────┘
//! ```
//!
//! `push_newest`, `promote`, `remove` and `pop_oldest` are O(1).

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

#[derive(Debug)]
struct Node<T> {
    key: String,
    value: T,
    newer: Option<SlotId>,
    older: Option<SlotId>,
}

/// Values ordered from most to least recently promoted, each filed under a key.
#[derive(Debug)]
pub struct RecencyList<T> {
    nodes: SlotArena<Node<T>>,
    newest: Option<SlotId>,
    oldest: Option<SlotId>,
}

impl<T> RecencyList<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        RecencyList {
            nodes: SlotArena::with_capacity(capacity),
            newest: None,
            oldest: None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.nodes.get(id).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.nodes.get_mut(id).map(|node| &mut node.value)
    }

    /// Key and value of the node `pop_oldest` would take.
    pub fn oldest(&self) -> Option<(&str, &T)> {
        let node = self.nodes.get(self.oldest?)?;
        Some((&node.key, &node.value))
    }

    /// Links a new node as the newest and returns its handle.
    pub fn push_newest(&mut self, key: String, value: T) -> SlotId {
        let id = self.nodes.insert(Node {
            key,
            value,
            newer: None,
            older: None,
        });
        self.link_newest(id);
        id
    }

    /// Makes `id` the newest node. Returns `false` for a stale handle.
    pub fn promote(&mut self, id: SlotId) -> bool {
        if self.nodes.get(id).is_none() {
            return false;
        }
        if self.newest != Some(id) {
            self.unlink(id);
            self.link_newest(id);
        }
        true
    }

    pub fn remove(&mut self, id: SlotId) -> Option<(String, T)> {
        self.unlink(id)?;
        let node = self.nodes.remove(id)?;
        Some((node.key, node.value))
    }

    pub fn pop_oldest(&mut self) -> Option<(String, T)> {
        let id = self.oldest?;
        self.remove(id)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.newest = None;
        self.oldest = None;
    }

    /// Walks newest to oldest.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            next: self.newest,
            remaining: self.len(),
        }
    }

    /// Follows the links from both ends and checks they describe one chain
    /// covering every stored node.
    pub fn validate(&self) -> Result<(), InvariantError> {
        let mut seen = 0usize;
        let mut expected_newer = None;
        let mut cursor = self.newest;
        while let Some(id) = cursor {
            let node = self
                .nodes
                .get(id)
                .ok_or_else(|| InvariantError::new(format!("recency chain reaches freed node {id}")))?;
            if node.newer != expected_newer {
                return Err(InvariantError::new(format!("node {id} has a broken newer link")));
            }
            seen += 1;
            if seen > self.len() {
                return Err(InvariantError::new("recency chain loops"));
            }
            expected_newer = Some(id);
            cursor = node.older;
        }
        if expected_newer != self.oldest {
            return Err(InvariantError::new("oldest pointer is not the end of the chain"));
        }
        if seen != self.len() {
            return Err(InvariantError::new(format!(
                "recency chain links {seen} of {} nodes",
                self.len()
            )));
        }
        Ok(())
    }

    fn link_newest(&mut self, id: SlotId) {
        let previous = self.newest.replace(id);
        if let Some(node) = self.nodes.get_mut(id) {
            node.newer = None;
            node.older = previous;
        }
        match previous {
            Some(prev) => {
                if let Some(node) = self.nodes.get_mut(prev) {
                    node.newer = Some(id);
                }
            }
            None => self.oldest = Some(id),
        }
    }

    fn unlink(&mut self, id: SlotId) -> Option<()> {
        let node = self.nodes.get_mut(id)?;
        let (newer, older) = (node.newer.take(), node.older.take());

        match newer {
            Some(n) => {
                if let Some(node) = self.nodes.get_mut(n) {
                    node.older = older;
                }
            }
            None => self.newest = older,
        }
        match older {
            Some(o) => {
                if let Some(node) = self.nodes.get_mut(o) {
                    node.newer = newer;
                }
            }
            None => self.oldest = newer,
        }
        Some(())
    }
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over `(SlotId, key, value)`, newest first.
pub struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    next: Option<SlotId>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (SlotId, &'a str, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.list.nodes.get(id)?;
        self.next = node.older;
        self.remaining = self.remaining.saturating_sub(1);
        Some((id, node.key.as_str(), &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
