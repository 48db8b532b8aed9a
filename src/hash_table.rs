//! HashTable: separate chaining where every chain is a contiguous run of one
//! shared `Sequence`, indexed by a `BucketTable`.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::mem;

use hashbrown::hash_map::DefaultHashBuilder;

use crate::bucket_table::{Bucket, BucketTable, Fallibility};
use crate::config::{validate_load_factor, TableConfig, DEFAULT_BUCKETS, DEFAULT_MAX_LOAD_FACTOR};
use crate::error::{Error, Result};
use crate::sequence::{self, Handle, Sequence};

#[derive(Clone, Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
}

pub struct HashTable<K, V, S = DefaultHashBuilder> {
    hasher: S,
    seq: Sequence<Entry<K, V>>,
    buckets: BucketTable,
    max_load_factor: f32,
}

impl<K, V> HashTable<K, V, DefaultHashBuilder> {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    pub fn with_buckets(buckets: usize) -> Self {
        Self::with_buckets_and_hasher(buckets, DefaultHashBuilder::default())
    }
}

impl<K, V, S> HashTable<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_buckets_and_hasher(DEFAULT_BUCKETS, hasher)
    }

    pub fn with_buckets_and_hasher(buckets: usize, hasher: S) -> Self {
        Self::from_parts(BucketTable::new(buckets), DEFAULT_MAX_LOAD_FACTOR, hasher)
    }

    /// # Panics
    /// If `config` carries an invalid max load factor.
    pub fn with_config(config: TableConfig, hasher: S) -> Self {
        infallible(Self::build(config, hasher, Fallibility::Infallible))
    }

    pub fn try_with_config(config: TableConfig, hasher: S) -> Result<Self> {
        Self::build(config, hasher, Fallibility::Fallible)
    }

    fn build(config: TableConfig, hasher: S, fallibility: Fallibility) -> Result<Self> {
        config.validate()?;
        let buckets = BucketTable::alloc(config.buckets, fallibility)?;
        Ok(Self::from_parts(buckets, config.max_load_factor, hasher))
    }

    fn from_parts(buckets: BucketTable, max_load_factor: f32, hasher: S) -> Self {
        Self {
            hasher,
            seq: Sequence::new(),
            buckets,
            max_load_factor,
        }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f32 {
        self.len() as f32 / self.bucket_count() as f32
    }

    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Handle of the first entry in traversal order, `None` when empty.
    pub fn first(&self) -> Option<Handle> {
        self.seq.first()
    }

    /// Advances a traversal position; `None` marks the end.
    pub fn next(&self, h: Handle) -> Option<Handle> {
        self.seq.next(h)
    }

    pub fn key_at(&self, h: Handle) -> Option<&K> {
        self.seq.get(h).map(|e| &e.key)
    }

    pub fn value_at(&self, h: Handle) -> Option<&V> {
        self.seq.get(h).map(|e| &e.value)
    }

    pub fn value_at_mut(&mut self, h: Handle) -> Option<&mut V> {
        self.seq.get_mut(h).map(|e| &mut e.value)
    }

    pub fn entry_at(&self, h: Handle) -> Option<(&K, &V)> {
        self.seq.get(h).map(|e| (&e.key, &e.value))
    }

    /// Descriptor of bucket `idx`.
    ///
    /// # Panics
    /// If `idx >= bucket_count()`.
    pub fn bucket(&self, idx: usize) -> &Bucket {
        self.buckets.get(idx)
    }

    pub fn bucket_len(&self, idx: usize) -> usize {
        self.buckets.get(idx).len()
    }

    /// The chain of bucket `idx`: exactly `bucket_len(idx)` entries, starting
    /// at the bucket's first node and following sequence order.
    pub fn bucket_iter(&self, idx: usize) -> ChainIter<'_, K, V> {
        let bucket = self.buckets.get(idx);
        ChainIter {
            seq: &self.seq,
            cur: bucket.first(),
            remaining: bucket.len(),
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.seq.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.seq.iter_mut(),
        }
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.seq.iter().map(|(h, _)| h)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.seq.iter().map(|(_, e)| &e.key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.seq.iter().map(|(_, e)| &e.value)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.seq.iter_mut().map(|(_, e)| &mut e.value)
    }

    /// Drops every entry and resets to the default bucket count. The hasher
    /// and max load factor are kept.
    pub fn clear(&mut self) {
        log::trace!("clear: dropping {} entries", self.len());
        self.seq.clear();
        self.buckets = BucketTable::new(DEFAULT_BUCKETS);
    }

    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Bucket that `q` belongs to under the current bucket count.
    pub fn bucket_index<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Hash,
    {
        self.buckets.index_for(self.make_hash(q))
    }

    // Looks only inside chain `idx`, never past its `len` nodes.
    fn scan_chain<Q>(&self, idx: usize, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let bucket = self.buckets.get(idx);
        let mut cur = bucket.first();
        for _ in 0..bucket.len() {
            let h = cur?;
            if self.seq.get(h)?.key.borrow() == q {
                return Some(h);
            }
            cur = self.seq.next(h);
        }
        None
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.scan_chain(self.bucket_index(q), q)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).and_then(|h| self.value_at(h))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let h = self.find(q)?;
        self.value_at_mut(h)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).and_then(|h| self.entry_at(h))
    }

    /// Inserts `key -> value` unless the key is already present.
    ///
    /// Returns the handle of the entry now holding `key` and whether it was
    /// newly inserted. A duplicate leaves the stored value untouched and
    /// drops the arguments.
    ///
    /// # Panics
    /// If growing would need more than `usize::MAX` buckets.
    pub fn insert(&mut self, key: K, value: V) -> (Handle, bool) {
        self.find_or_insert_with(key, move || value)
    }

    pub fn try_insert(&mut self, key: K, value: V) -> Result<(Handle, bool)> {
        self.insert_inner(key, move || value, Fallibility::Fallible)
    }

    /// Like `insert`, but only builds the value when the key is absent.
    pub fn find_or_insert_with<F>(&mut self, key: K, default: F) -> (Handle, bool)
    where
        F: FnOnce() -> V,
    {
        infallible(self.insert_inner(key, default, Fallibility::Infallible))
    }

    fn insert_inner<F>(
        &mut self,
        key: K,
        default: F,
        fallibility: Fallibility,
    ) -> Result<(Handle, bool)>
    where
        F: FnOnce() -> V,
    {
        // Growth changes bucket_count, so it must precede indexing.
        self.grow_for(1, fallibility)?;
        let idx = self.bucket_index(&key);
        if let Some(h) = self.scan_chain(idx, &key) {
            return Ok((h, false));
        }
        let entry = Entry {
            key,
            value: default(),
        };
        Ok((self.link_new(idx, entry), true))
    }

    // New nodes go right before the chain head (or at the back for an empty
    // chain), keeping the chain contiguous.
    fn link_new(&mut self, idx: usize, entry: Entry<K, V>) -> Handle {
        let h = self.seq.insert_before(self.buckets.get(idx).first(), entry);
        self.buckets.attach(idx, h);
        h
    }

    /// Removes the entry at `h` and returns the handle that followed it.
    /// A stale handle is a no-op returning `None`.
    pub fn erase(&mut self, h: Handle) -> Option<Handle> {
        self.unlink(h).and_then(|(_entry, next)| next)
    }

    pub fn remove_at(&mut self, h: Handle) -> Option<(K, V)> {
        self.unlink(h).map(|(e, _next)| (e.key, e.value))
    }

    /// Returns how many entries were removed: 1 if `q` was present, else 0.
    pub fn erase_key<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.find(q) {
            Some(h) => usize::from(self.unlink(h).is_some()),
            None => 0,
        }
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_k, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let h = self.find(q)?;
        self.remove_at(h)
    }

    fn unlink(&mut self, h: Handle) -> Option<(Entry<K, V>, Option<Handle>)> {
        // The owning bucket comes from the stored key, never from a cache.
        let idx = self.bucket_index(&self.seq.get(h)?.key);
        let (entry, next) = self.seq.remove(h)?;
        self.buckets.detach(idx, h, next);
        Some((entry, next))
    }

    /// Keeps only the entries for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut cur = self.seq.first();
        while let Some(h) = cur {
            let kept = match self.seq.get_mut(h) {
                Some(e) => keep(&e.key, &mut e.value),
                None => break,
            };
            cur = if kept { self.seq.next(h) } else { self.erase(h) };
        }
    }

    /// Grows to `buckets` buckets if that exceeds the current count, and
    /// re-threads every chain. Handles stay valid; traversal order may change.
    pub fn reserve(&mut self, buckets: usize) {
        infallible(self.rehash_to(buckets, Fallibility::Infallible))
    }

    /// Fallible `reserve`. On error the table is unchanged.
    pub fn try_reserve(&mut self, buckets: usize) -> Result<()> {
        self.rehash_to(buckets, Fallibility::Fallible)
    }

    /// Changes the load bound. If the current load already exceeds `f`, the
    /// table grows at once so the bound keeps holding.
    pub fn set_max_load_factor(&mut self, f: f32) -> Result<()> {
        validate_load_factor(f)?;
        if exceeds_load(self.len(), self.bucket_count(), f) {
            let target = grown_bucket_count(self.len(), f)?;
            log::debug!(
                "max load factor {} -> {} forces a rehash",
                self.max_load_factor,
                f
            );
            self.rehash_to(target, Fallibility::Fallible)?;
        }
        self.max_load_factor = f;
        Ok(())
    }

    fn grow_for(&mut self, additional: usize, fallibility: Fallibility) -> Result<()> {
        let wanted = self
            .len()
            .checked_add(additional)
            .ok_or(Error::CapacityOverflow)?;
        if !exceeds_load(wanted, self.bucket_count(), self.max_load_factor) {
            return Ok(());
        }
        let target = grown_bucket_count(wanted, self.max_load_factor)?;
        self.rehash_to(target, fallibility)
    }

    fn rehash_to(&mut self, n: usize, fallibility: Fallibility) -> Result<()> {
        if n <= self.bucket_count() {
            return Ok(());
        }
        // Allocate and hash everything before touching a link, so a failed
        // allocation or a panicking `Hash` leaves the table as it was.
        let mut fresh = BucketTable::alloc(n, fallibility)?;
        let mut targets = Vec::new();
        match fallibility {
            Fallibility::Fallible => targets.try_reserve_exact(self.len())?,
            Fallibility::Infallible => targets.reserve_exact(self.len()),
        }
        for (_h, entry) in self.seq.iter() {
            targets.push(fresh.index_for(self.hasher.hash_one(&entry.key)));
        }
        log::debug!(
            "rehash: {} -> {} buckets, {} entries",
            self.bucket_count(),
            fresh.len(),
            self.len()
        );
        // `rethread` visits nodes in the same order `iter` did.
        let mut next = 0;
        self.seq.rethread(|h, _entry| {
            let idx = targets[next];
            next += 1;
            let at = fresh.get(idx).first();
            fresh.attach(idx, h);
            at
        });
        self.buckets = fresh;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert_eq!(self.buckets.total_len(), self.len(), "conservation");
        let mut covered = 0;
        for (idx, bucket) in self.buckets.iter().enumerate() {
            assert_eq!(bucket.first().is_none(), bucket.is_empty());
            let mut chain = 0;
            for (_h, k, _v) in self.bucket_iter(idx) {
                assert_eq!(self.bucket_index(k), idx, "contiguity");
                chain += 1;
            }
            assert_eq!(chain, bucket.len(), "chain runs off the sequence");
            covered += chain;
        }
        assert_eq!(covered, self.len());
        assert!(
            !exceeds_load(self.len(), self.bucket_count(), self.max_load_factor),
            "load bound"
        );
        for (h, k) in self.handles().zip(self.keys()) {
            assert_eq!(self.find(k), Some(h), "uniqueness");
        }
    }
}

fn exceeds_load(len: usize, buckets: usize, max_load_factor: f32) -> bool {
    len as f64 > buckets as f64 * f64::from(max_load_factor)
}

// Double the smallest bucket count that holds `len` entries under the bound,
// so a run of inserts pays for each rehash.
fn grown_bucket_count(len: usize, max_load_factor: f32) -> Result<usize> {
    let needed = (len as f64 / f64::from(max_load_factor)).ceil();
    if needed >= usize::MAX as f64 {
        return Err(Error::CapacityOverflow);
    }
    (needed as usize)
        .max(1)
        .checked_mul(2)
        .ok_or(Error::CapacityOverflow)
}

fn infallible<T>(r: Result<T>) -> T {
    match r {
        Ok(t) => t,
        Err(e) => panic!("{e}"),
    }
}

impl<K, V, S: Default> Default for HashTable<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

/// Deep copy: an empty table with the same bucket count, load bound and
/// hasher, into which every entry is replayed.
impl<K, V, S> Clone for HashTable<K, V, S>
where
    K: Clone + Eq + Hash,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        let mut copy = Self::from_parts(
            BucketTable::new(self.bucket_count()),
            self.max_load_factor,
            self.hasher.clone(),
        );
        copy.seq = Sequence::with_capacity(self.len());
        for (k, v) in self.iter() {
            copy.insert(k.clone(), v.clone());
        }
        copy
    }
}

impl<K, V, S> fmt::Debug for HashTable<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for HashTable<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |ov| v == ov))
    }
}

impl<K, V, S> Eq for HashTable<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> Extend<(K, V)> for HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        infallible(self.grow_for(iter.size_hint().0, Fallibility::Infallible));
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::with_hasher(S::default());
        table.extend(iter);
        table
    }
}

/// Iterator over `(&K, &V)` in traversal order.
pub struct Iter<'a, K, V> {
    inner: sequence::Iter<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_h, e)| (&e.key, &e.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in traversal order.
pub struct IterMut<'a, K, V> {
    inner: sequence::IterMut<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_h, e)| (&e.key, &mut e.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

pub struct IntoIter<K, V> {
    inner: sequence::IntoIter<Entry<K, V>>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next().map(|e| (e.key, e.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

/// Walks one bucket's chain, yielding `(Handle, &K, &V)`.
pub struct ChainIter<'a, K, V> {
    seq: &'a Sequence<Entry<K, V>>,
    cur: Option<Handle>,
    remaining: usize,
}

impl<'a, K, V> Iterator for ChainIter<'a, K, V> {
    type Item = (Handle, &'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let h = self.cur?;
        let e = self.seq.get(h)?;
        self.cur = self.seq.next(h);
        self.remaining -= 1;
        Some((h, &e.key, &e.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl<K, V, S> IntoIterator for HashTable<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            inner: self.seq.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut HashTable<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::BTreeSet;
    use std::hash::Hasher;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // every key lands in bucket 0
    }

    /// Invariant: inserting N distinct keys yields len N, each findable, with
    /// all table invariants intact after every step.
    #[test]
    fn distinct_inserts_are_all_findable() {
        let mut t: HashTable<u32, u32> = HashTable::new();
        for i in 0..200 {
            let (h, inserted) = t.insert(i, i * 10);
            assert!(inserted);
            assert_eq!(t.value_at(h), Some(&(i * 10)));
            t.assert_invariants();
        }
        assert_eq!(t.len(), 200);
        for i in 0..200 {
            assert_eq!(t.get(&i), Some(&(i * 10)));
        }
        assert!(!t.contains_key(&200));
    }

    /// Invariant: a duplicate insert reports `false`, returns the existing
    /// handle, and leaves the stored value alone.
    #[test]
    fn duplicate_insert_does_not_overwrite() {
        let mut t: HashTable<String, i32> = HashTable::new();
        let (h1, fresh) = t.insert("dup".to_string(), 1);
        assert!(fresh);
        let (h2, fresh) = t.insert("dup".to_string(), 2);
        assert!(!fresh);
        assert_eq!(h1, h2);
        assert_eq!(t.get("dup"), Some(&1));
        assert_eq!(t.len(), 1);
    }

    /// Invariant: `find_or_insert_with` only runs the value constructor when
    /// the key is absent.
    #[test]
    fn find_or_insert_with_is_lazy() {
        let mut t: HashTable<&'static str, i32> = HashTable::new();
        let calls = Cell::new(0);
        let (h, fresh) = t.find_or_insert_with("k", || {
            calls.set(calls.get() + 1);
            7
        });
        assert!(fresh);
        let (h2, fresh) = t.find_or_insert_with("k", || {
            calls.set(calls.get() + 1);
            8
        });
        assert!(!fresh);
        assert_eq!(h, h2);
        assert_eq!(calls.get(), 1);
        assert_eq!(t.get(&"k"), Some(&7));
    }

    /// Invariant: with every key in one bucket, the chain holds them all,
    /// lookups resolve by equality, and erasing the head moves the head to
    /// the next chain member.
    #[test]
    fn collisions_share_one_contiguous_chain() {
        let mut t: HashTable<String, i32, ConstBuildHasher> =
            HashTable::with_hasher(ConstBuildHasher);
        for (i, k) in ["a", "b", "c", "d"].iter().enumerate() {
            t.insert((*k).to_string(), i as i32);
        }
        t.assert_invariants();
        assert_eq!(t.bucket_len(0), 4);
        let head = t.bucket(0).first().unwrap();
        // Newest entry heads its chain.
        assert_eq!(t.key_at(head).map(String::as_str), Some("d"));
        let follower = t.next(head);

        assert_eq!(t.erase(head), follower);
        assert_eq!(t.bucket(0).first(), follower);
        assert_eq!(t.bucket_len(0), 3);
        t.assert_invariants();

        assert_eq!(t.get("b"), Some(&1));
        assert_eq!(t.erase_key("b"), 1);
        assert_eq!(t.erase_key("b"), 0);
        assert_eq!(t.bucket(0).first(), follower);
        t.assert_invariants();
    }

    /// Invariant: erasing a non-head chain member leaves the head alone.
    #[test]
    fn erase_inside_chain_keeps_head() {
        let mut t: HashTable<u8, (), ConstBuildHasher> =
            HashTable::with_buckets_and_hasher(4, ConstBuildHasher);
        let (tail, _) = t.insert(1, ());
        t.insert(2, ());
        let (head, _) = t.insert(3, ());
        assert_eq!(t.erase(tail), None);
        assert_eq!(t.bucket(0).first(), Some(head));
        t.assert_invariants();
    }

    /// Invariant: a stale handle is never dereferenced and erasing it is a
    /// no-op.
    #[test]
    fn stale_handle_erase_is_noop() {
        let mut t: HashTable<i32, i32> = HashTable::new();
        let (h, _) = t.insert(1, 1);
        t.insert(2, 2);
        assert_eq!(t.remove_at(h), Some((1, 1)));
        assert_eq!(t.erase(h), None);
        assert_eq!(t.remove_at(h), None);
        assert_eq!(t.len(), 1);
        assert!(t.value_at(h).is_none());
        t.assert_invariants();
    }

    /// Invariant: growth keeps load <= max load factor; handles taken before
    /// any number of rehashes still resolve to their entries.
    #[test]
    fn growth_preserves_handles_and_load_bound() {
        let mut t: HashTable<u64, u64> = HashTable::with_buckets(1);
        let mut handles = Vec::new();
        for i in 0..500u64 {
            handles.push((t.insert(i, i + 1).0, i));
            assert!(t.load_factor() <= t.max_load_factor());
        }
        assert!(t.bucket_count() >= 500);
        for (h, k) in handles {
            assert_eq!(t.entry_at(h), Some((&k, &(k + 1))));
        }
        t.assert_invariants();
    }

    /// Invariant: `reserve` grows only when asked for more buckets, and
    /// keeps every key findable.
    #[test]
    fn reserve_rehashes_and_preserves_membership() {
        let mut t: HashTable<u32, u32> = (0..50).map(|i| (i, i)).collect();
        let before = t.bucket_count();
        t.reserve(before - 1);
        assert_eq!(t.bucket_count(), before);
        t.reserve(before * 8 + 3);
        assert_eq!(t.bucket_count(), before * 8 + 3);
        for i in 0..50 {
            assert!(t.contains_key(&i));
        }
        t.assert_invariants();
    }

    /// Invariant: a failed fallible reserve reports `OutOfMemory` and leaves
    /// the table as it was.
    #[test]
    fn try_reserve_failure_leaves_table_intact() {
        let mut t: HashTable<u32, u32> = (0..10).map(|i| (i, i)).collect();
        let before = t.bucket_count();
        assert!(matches!(t.try_reserve(usize::MAX), Err(Error::OutOfMemory(_))));
        assert_eq!(t.bucket_count(), before);
        assert_eq!(t.len(), 10);
        t.assert_invariants();
        assert!(matches!(t.try_insert(10, 10), Ok((_, true))));
    }

    /// Invariant: lowering the max load factor rehashes immediately so the
    /// bound holds; invalid factors are rejected without side effects.
    #[test]
    fn set_max_load_factor_keeps_bound() {
        let mut t: HashTable<u32, ()> = HashTable::with_buckets(16);
        for i in 0..16 {
            t.insert(i, ());
        }
        assert_eq!(t.bucket_count(), 16);
        t.set_max_load_factor(0.25).unwrap();
        assert_eq!(t.max_load_factor(), 0.25);
        assert!(t.load_factor() <= 0.25);
        t.assert_invariants();

        assert!(matches!(
            t.set_max_load_factor(0.0),
            Err(Error::InvalidLoadFactor(_))
        ));
        assert_eq!(t.max_load_factor(), 0.25);
    }

    #[test]
    fn config_controls_initial_shape() {
        let cfg = TableConfig::new().with_buckets(3).with_max_load_factor(2.0);
        let mut t: HashTable<u32, u32> =
            HashTable::with_config(cfg, DefaultHashBuilder::default());
        assert_eq!(t.bucket_count(), 3);
        for i in 0..6 {
            t.insert(i, i);
        }
        assert_eq!(t.bucket_count(), 3);
        t.insert(6, 6);
        assert!(t.bucket_count() > 3);
        t.assert_invariants();

        let bad = TableConfig::new().with_max_load_factor(f32::NAN);
        let built: Result<HashTable<u32, u32>> =
            HashTable::try_with_config(bad, DefaultHashBuilder::default());
        assert!(matches!(built, Err(Error::InvalidLoadFactor(_))));
    }

    /// Invariant: `clear` empties the table and restores the default bucket
    /// count.
    #[test]
    fn clear_resets_to_default_shape() {
        let mut t: HashTable<u32, u32> = (0..100).map(|i| (i, i)).collect();
        assert!(t.bucket_count() > DEFAULT_BUCKETS);
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.bucket_count(), DEFAULT_BUCKETS);
        assert_eq!(t.find(&1), None);
        t.assert_invariants();
    }

    /// Invariant: clones are deep; mutating one side never shows through the
    /// other.
    #[test]
    fn clone_is_independent() {
        let mut a: HashTable<String, Vec<u8>> = HashTable::new();
        a.insert("x".into(), vec![1]);
        a.insert("y".into(), vec![2]);
        let mut b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.bucket_count(), a.bucket_count());
        assert!(b.seq.capacity() >= a.len());
        b.get_mut("x").unwrap().push(9);
        b.remove("y");
        assert_eq!(a.get("x"), Some(&vec![1]));
        assert_eq!(a.get("y"), Some(&vec![2]));
        assert_ne!(a, b);
        b.assert_invariants();
    }

    /// Invariant: moving out leaves a valid empty table; `swap` exchanges
    /// contents.
    #[test]
    fn take_and_swap() {
        let mut a: HashTable<u32, u32> = (0..5).map(|i| (i, i)).collect();
        let mut b = mem::take(&mut a);
        assert!(a.is_empty());
        a.assert_invariants();
        a.insert(100, 100);
        a.swap(&mut b);
        assert_eq!(a.len(), 5);
        assert_eq!(b.len(), 1);
        assert!(b.contains_key(&100));
    }

    #[test]
    fn retain_erases_in_one_pass() {
        let mut t: HashTable<u32, u32> = (0..64).map(|i| (i, i)).collect();
        t.retain(|k, v| {
            *v += 1;
            k % 3 == 0
        });
        assert_eq!(t.len(), 22);
        for (k, v) in t.iter() {
            assert_eq!(k % 3, 0);
            assert_eq!(*v, k + 1);
        }
        t.assert_invariants();
    }

    /// Invariant: the traversal visits every entry once, through `first`/
    /// `next` as well as the iterator adaptors.
    #[test]
    fn traversal_visits_each_entry_once() {
        let mut t: HashTable<u32, u32> = (0..30).map(|i| (i, i * 2)).collect();
        let mut walked = BTreeSet::new();
        let mut cur = t.first();
        while let Some(h) = cur {
            assert!(walked.insert(*t.key_at(h).unwrap()));
            cur = t.next(h);
        }
        assert_eq!(walked, (0..30).collect());
        assert_eq!(t.iter().len(), 30);
        for v in t.values_mut() {
            *v += 1;
        }
        let sum: u32 = t.values().sum();
        assert_eq!(sum, (0..30).map(|i| i * 2 + 1).sum::<u32>());
        let owned: BTreeSet<(u32, u32)> = t.into_iter().collect();
        assert_eq!(owned.len(), 30);
    }

    #[test]
    fn debug_renders_as_map() {
        let mut t: HashTable<u8, char, ConstBuildHasher> =
            HashTable::with_hasher(ConstBuildHasher);
        t.insert(1, 'a');
        assert_eq!(format!("{:?}", t), "{1: 'a'}");
    }

    /// Invariant: if a `Hash` impl panics during a rehash, the table keeps
    /// its old shape and every entry stays linked and findable.
    #[test]
    fn panic_during_rehash_leaves_table_intact() {
        thread_local! {
            static EXPLODE_ON: Cell<Option<u32>> = Cell::new(None);
        }
        #[derive(Debug, PartialEq, Eq)]
        struct Fragile(u32);
        impl Hash for Fragile {
            fn hash<H: Hasher>(&self, state: &mut H) {
                if EXPLODE_ON.with(|e| e.get()) == Some(self.0) {
                    panic!("hash exploded");
                }
                self.0.hash(state);
            }
        }

        let mut t: HashTable<Fragile, ()> = HashTable::new();
        for i in 0..6 {
            t.insert(Fragile(i), ());
        }
        let buckets = t.bucket_count();
        EXPLODE_ON.with(|e| e.set(Some(2)));
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            t.reserve(64);
        }));
        assert!(res.is_err());
        EXPLODE_ON.with(|e| e.set(None));

        assert_eq!(t.bucket_count(), buckets);
        assert_eq!(t.len(), 6);
        assert_eq!(t.iter().count(), 6);
        for i in 0..6 {
            assert!(t.contains_key(&Fragile(i)), "key {i} lost");
        }
        t.assert_invariants();

        // No duplicate can sneak in, and a later rehash succeeds.
        assert!(!t.insert(Fragile(2), ()).1);
        t.reserve(64);
        assert_eq!(t.bucket_count(), 64);
        assert_eq!(t.len(), 6);
        t.assert_invariants();
    }

    /// Invariant: growth jumps to twice the smallest bucket count that holds
    /// the pending entries, never to a bare +1.
    #[test]
    fn growth_doubles_the_needed_bucket_count() {
        let mut t: HashTable<u32, ()> = HashTable::with_buckets(1);
        let mut steps = Vec::new();
        let mut last = t.bucket_count();
        for i in 0..40 {
            t.insert(i, ());
            if t.bucket_count() != last {
                last = t.bucket_count();
                steps.push((t.len(), last));
            }
        }
        assert_eq!(steps, vec![(2, 4), (5, 10), (11, 22), (23, 46)]);

        // Same rule under a non-unit load factor: ceil(len / 0.5) * 2.
        let cfg = TableConfig::new().with_buckets(1).with_max_load_factor(0.5);
        let mut t: HashTable<u32, ()> =
            HashTable::with_config(cfg, DefaultHashBuilder::default());
        t.insert(0, ());
        assert_eq!(t.bucket_count(), 4);
        t.insert(1, ());
        assert_eq!(t.bucket_count(), 4);
        t.insert(2, ());
        assert_eq!(t.bucket_count(), 12);
    }
}
