//! Bucket descriptors: per-bucket lookup references into the shared sequence.

use crate::error::{Error, Result};
use crate::sequence::Handle;

/// One bucket's chain: the handle of its first node and how many consecutive
/// nodes, starting there, belong to it. Never owns the node it points at;
/// `first` is `None` exactly when `len` is zero.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Bucket {
    first: Option<Handle>,
    len: usize,
}

impl Bucket {
    pub fn first(&self) -> Option<Handle> {
        self.first
    }
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Fallibility {
    Fallible,
    Infallible,
}

#[derive(Clone, Debug)]
pub(crate) struct BucketTable {
    buckets: Vec<Bucket>,
}

impl BucketTable {
    /// Allocates `n` empty buckets (at least one). The infallible path leaves
    /// allocation failure to the global handler.
    pub(crate) fn alloc(n: usize, fallibility: Fallibility) -> Result<Self> {
        if fallibility == Fallibility::Infallible {
            return Ok(Self::new(n));
        }
        let n = n.max(1);
        let mut buckets = Vec::new();
        buckets.try_reserve_exact(n).map_err(Error::OutOfMemory)?;
        buckets.resize(n, Bucket::default());
        Ok(Self { buckets })
    }

    pub(crate) fn new(n: usize) -> Self {
        Self {
            buckets: vec![Bucket::default(); n.max(1)],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn index_for(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    pub(crate) fn get(&self, idx: usize) -> &Bucket {
        &self.buckets[idx]
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> core::slice::Iter<'_, Bucket> {
        self.buckets.iter()
    }

    /// Sum of all chain lengths; equals the number of stored nodes.
    #[cfg(test)]
    pub(crate) fn total_len(&self) -> usize {
        self.buckets.iter().map(|b| b.len).sum()
    }

    /// Records `h` as the new head of chain `idx`. The caller must already
    /// have linked `h` directly before the previous head.
    pub(crate) fn attach(&mut self, idx: usize, h: Handle) {
        let b = &mut self.buckets[idx];
        b.first = Some(h);
        b.len += 1;
    }

    /// Forgets `h`, which was just unlinked from chain `idx`; `next` is the
    /// node that followed it in the sequence.
    pub(crate) fn detach(&mut self, idx: usize, h: Handle, next: Option<Handle>) {
        let b = &mut self.buckets[idx];
        debug_assert!(b.len > 0, "detach from empty bucket");
        b.len -= 1;
        if b.len == 0 {
            b.first = None;
        } else if b.first == Some(h) {
            // Contiguity: the follower of a non-last chain member is still
            // in the chain.
            b.first = next;
        }
    }
}
