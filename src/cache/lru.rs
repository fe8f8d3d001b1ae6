//! LRU List Module
//!
//! Recency order for eviction, stored as an arena of nodes linked by slot
//! indices instead of pointers.
//!
//! - Head = Most recently used
//! - Tail = Least recently used

use crate::cache::CacheEntry;

/// Stable handle to a node in the arena.
pub type NodeId = usize;

// == Node ==
#[derive(Debug)]
struct Node<V> {
    key: String,
    entry: CacheEntry<V>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

// == LRU List ==
/// Doubly-linked recency list over an arena of slots.
///
/// Freed slots are recycled, so a `NodeId` is only valid until its node is
/// removed.
#[derive(Debug)]
pub struct LruList<V> {
    slots: Vec<Option<Node<V>>>,
    free: Vec<NodeId>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl<V> Default for LruList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> LruList<V> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Push Front ==
    /// Inserts a node as most recently used and returns its handle.
    pub fn push_front(&mut self, key: String, entry: CacheEntry<V>) -> NodeId {
        let node = Node {
            key,
            entry,
            prev: None,
            next: None,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.attach_front(id);
        self.len += 1;
        id
    }

    // == Touch ==
    /// Marks a node as recently used (moves to head).
    pub fn move_to_front(&mut self, id: NodeId) {
        if self.head == Some(id) || !self.is_live(id) {
            return;
        }
        self.detach(id);
        self.attach_front(id);
    }

    // == Remove ==
    /// Unlinks a node and frees its slot, returning its key and entry.
    pub fn remove(&mut self, id: NodeId) -> Option<(String, CacheEntry<V>)> {
        if !self.is_live(id) {
            return None;
        }
        self.detach(id);
        let node = self.slots[id].take()?;
        self.free.push(id);
        self.len -= 1;
        Some((node.key, node.entry))
    }

    // == Pop Back ==
    /// Removes and returns the least recently used node.
    pub fn pop_back(&mut self) -> Option<(String, CacheEntry<V>)> {
        let tail = self.tail?;
        self.remove(tail)
    }

    // == Accessors ==
    pub fn entry(&self, id: NodeId) -> Option<&CacheEntry<V>> {
        self.node(id).map(|node| &node.entry)
    }

    pub fn entry_mut(&mut self, id: NodeId) -> Option<&mut CacheEntry<V>> {
        self.slots
            .get_mut(id)
            .and_then(Option::as_mut)
            .map(|node| &mut node.entry)
    }

    /// Walks the list from most to least recently used.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every node and releases the arena.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    // == Internal Linking ==
    fn node(&self, id: NodeId) -> Option<&Node<V>> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    fn is_live(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    fn links(&mut self, id: NodeId) -> &mut Node<V> {
        // Only called with ids checked by the public entry points.
        self.slots[id]
            .as_mut()
            .unwrap_or_else(|| unreachable!("linked slot {id} is vacant"))
    }

    fn attach_front(&mut self, id: NodeId) {
        let old_head = self.head;
        {
            let node = self.links(id);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.links(h).prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    fn detach(&mut self, id: NodeId) {
        let (prev, next) = {
            let node = self.links(id);
            (node.prev.take(), node.next.take())
        };
        match prev {
            Some(p) => self.links(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.links(n).prev = prev,
            None => self.tail = prev,
        }
    }
}

// == Iterator ==
/// Head-to-tail iterator yielding `(key, entry)`.
pub struct Iter<'a, V> {
    list: &'a LruList<V>,
    cursor: Option<NodeId>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a CacheEntry<V>);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.cursor?)?;
        self.cursor = node.next;
        Some((node.key.as_str(), &node.entry))
    }
}
