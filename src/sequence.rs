//! Sequence: owning doubly-linked list whose nodes live in a slot arena.
//!
//! Links are generational slot keys rather than pointers. A `Handle` names
//! one node and stays valid across inserts and removals of other nodes; once
//! its own node is removed it never resolves again, even if the slot is
//! reused for a later node.

use core::fmt;
use core::iter::FusedIterator;
use slotmap::{DefaultKey, SecondaryMap, SlotMap};

/// Position of one node in a `Sequence` (or in a table built on one).
/// "End" is spelled `None` wherever a position is optional.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Handle(k)
    }
    pub(crate) fn raw(self) -> DefaultKey {
        self.0
    }
}

#[derive(Clone, Debug)]
struct Node<T> {
    item: T,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

/// Owning doubly-linked sequence. Every node is owned here and destroyed
/// only by `remove`/`erase`/`pop_front`/`clear` or by dropping the sequence.
#[derive(Clone)]
pub struct Sequence<T> {
    slots: SlotMap<DefaultKey, Node<T>>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

impl<T> Sequence<T> {
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Handle to the first node (the "begin" position).
    pub fn first(&self) -> Option<Handle> {
        self.head.map(Handle::new)
    }
    pub fn last(&self) -> Option<Handle> {
        self.tail.map(Handle::new)
    }

    /// The node after `h`, or `None` at the end or for a stale handle.
    pub fn next(&self, h: Handle) -> Option<Handle> {
        self.slots.get(h.raw())?.next.map(Handle::new)
    }
    pub fn prev(&self, h: Handle) -> Option<Handle> {
        self.slots.get(h.raw())?.prev.map(Handle::new)
    }

    pub fn contains(&self, h: Handle) -> bool {
        self.slots.contains_key(h.raw())
    }

    pub fn get(&self, h: Handle) -> Option<&T> {
        self.slots.get(h.raw()).map(|n| &n.item)
    }
    pub fn get_mut(&mut self, h: Handle) -> Option<&mut T> {
        self.slots.get_mut(h.raw()).map(|n| &mut n.item)
    }

    pub fn push_back(&mut self, item: T) -> Handle {
        self.insert_before(None, item)
    }

    pub fn push_front(&mut self, item: T) -> Handle {
        let head = self.first();
        self.insert_before(head, item)
    }

    /// Links a new node immediately before `pos`, or at the back when `pos`
    /// is `None` or no longer names a live node. No other handle is
    /// invalidated.
    pub fn insert_before(&mut self, pos: Option<Handle>, item: T) -> Handle {
        let at = pos
            .map(Handle::raw)
            .filter(|&k| self.slots.contains_key(k));
        let k = self.slots.insert(Node {
            item,
            prev: None,
            next: None,
        });
        self.link_before(at, k);
        Handle::new(k)
    }

    /// Unlinks and returns the item at `h` together with the handle of the
    /// node that followed it.
    pub fn remove(&mut self, h: Handle) -> Option<(T, Option<Handle>)> {
        self.unlink(h.raw())
            .map(|(item, next)| (item, next.map(Handle::new)))
    }

    /// Destroys the node at `pos` and returns its follower. Erasing the end
    /// position (`None`) or a stale handle does nothing and returns `None`.
    pub fn erase(&mut self, pos: Option<Handle>) -> Option<Handle> {
        let h = pos?;
        self.remove(h).and_then(|(_item, next)| next)
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let k = self.head?;
        self.unlink(k).map(|(item, _next)| item)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: &self.slots,
            cur: self.head,
            remaining: self.slots.len(),
        }
    }

    /// Mutable walk in sequence order.
    ///
    /// Builds a key-indexed side table of node borrows first, so each call
    /// costs O(capacity of the arena) before yielding anything.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        let cur = self.head;
        let remaining = self.slots.len();
        // Split the arena into disjoint per-node borrows so the walk can
        // follow links while handing out `&mut T`.
        let mut nodes = SecondaryMap::with_capacity(self.slots.capacity());
        for (k, node) in self.slots.iter_mut() {
            nodes.insert(k, node);
        }
        IterMut {
            nodes,
            cur,
            remaining,
        }
    }

    /// Re-links every node in place, visiting them in current order. For each
    /// node, `place` returns the already re-linked node it must precede, or
    /// `None` to append it. Nodes are neither allocated nor freed, so every
    /// outstanding handle stays valid.
    pub(crate) fn rethread<F>(&mut self, mut place: F)
    where
        F: FnMut(Handle, &T) -> Option<Handle>,
    {
        let mut cur = self.head.take();
        self.tail = None;
        while let Some(k) = cur {
            let node = &self.slots[k];
            cur = node.next;
            let at = place(Handle::new(k), &node.item).map(Handle::raw);
            self.link_before(at, k);
        }
    }

    // `k` must be live and detached; `at`, if set, must be live and linked.
    fn link_before(&mut self, at: Option<DefaultKey>, k: DefaultKey) {
        let prev = match at {
            Some(a) => self.slots[a].prev,
            None => self.tail,
        };
        let node = &mut self.slots[k];
        node.prev = prev;
        node.next = at;
        match prev {
            Some(p) => self.slots[p].next = Some(k),
            None => self.head = Some(k),
        }
        match at {
            Some(a) => self.slots[a].prev = Some(k),
            None => self.tail = Some(k),
        }
    }

    fn unlink(&mut self, k: DefaultKey) -> Option<(T, Option<DefaultKey>)> {
        let node = self.slots.remove(k)?;
        match node.prev {
            Some(p) => self.slots[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.slots[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        Some((node.item, node.next))
    }
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|(_h, t)| t)).finish()
    }
}

impl<T> FromIterator<T> for Sequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut seq = Sequence::new();
        seq.extend(iter);
        seq
    }
}

impl<T> Extend<T> for Sequence<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push_back(item);
        }
    }
}

/// Iterator over the nodes of a `Sequence`, front to back.
pub struct Iter<'a, T> {
    slots: &'a SlotMap<DefaultKey, Node<T>>,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, T> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        Iter {
            slots: self.slots,
            cur: self.cur,
            remaining: self.remaining,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Handle, &'a T);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cur?;
        let node = self.slots.get(k)?;
        self.cur = node.next;
        self.remaining -= 1;
        Some((Handle::new(k), &node.item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// Mutable iterator over the nodes of a `Sequence`, front to back.
pub struct IterMut<'a, T> {
    nodes: SecondaryMap<DefaultKey, &'a mut Node<T>>,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = (Handle, &'a mut T);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cur?;
        let node = self.nodes.remove(k)?;
        self.cur = node.next;
        self.remaining -= 1;
        Some((Handle::new(k), &mut node.item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

/// Owning iterator, front to back.
pub struct IntoIter<T> {
    seq: Sequence<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;
    #[inline]
    fn next(&mut self) -> Option<T> {
        self.seq.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.seq.len(), Some(self.seq.len()))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}

impl<T> IntoIterator for Sequence<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;
    fn into_iter(self) -> IntoIter<T> {
        IntoIter { seq: self }
    }
}

impl<'a, T> IntoIterator for &'a Sequence<T> {
    type Item = (Handle, &'a T);
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
