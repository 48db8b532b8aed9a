//! ChainMap: key/value façade over `HashTable` with the usual map helpers.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;

use hashbrown::hash_map::DefaultHashBuilder;

use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::hash_table::{HashTable, IntoIter, Iter, IterMut};

pub struct ChainMap<K, V, S = DefaultHashBuilder> {
    inner: HashTable<K, V, S>,
}

impl<K, V> ChainMap<K, V> {
    pub fn new() -> Self {
        Self {
            inner: HashTable::new(),
        }
    }

    pub fn with_buckets(buckets: usize) -> Self {
        Self {
            inner: HashTable::with_buckets(buckets),
        }
    }
}

impl<K, V, S> ChainMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            inner: HashTable::with_hasher(hasher),
        }
    }

    pub fn with_config(config: TableConfig, hasher: S) -> Self {
        Self {
            inner: HashTable::with_config(config, hasher),
        }
    }

    pub fn try_with_config(config: TableConfig, hasher: S) -> Result<Self> {
        HashTable::try_with_config(config, hasher).map(|inner| Self { inner })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    pub fn bucket_count(&self) -> usize {
        self.inner.bucket_count()
    }
    pub fn load_factor(&self) -> f32 {
        self.inner.load_factor()
    }

    pub fn clear(&mut self) {
        self.inner.clear()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.inner.iter()
    }
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.inner.iter_mut()
    }
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.keys()
    }
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.inner.values()
    }
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.inner.values_mut()
    }

    pub fn as_table(&self) -> &HashTable<K, V, S> {
        &self.inner
    }
    pub fn into_table(self) -> HashTable<K, V, S> {
        self.inner
    }
}

impl<K, V, S> ChainMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Inserts only if `key` is absent; returns whether it was inserted.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.inner.insert(key, value).1
    }

    /// Inserts or overwrites; returns the previous value, if any.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> Option<V> {
        match self.inner.find(&key) {
            Some(h) => self
                .inner
                .value_at_mut(h)
                .map(|slot| core::mem::replace(slot, value)),
            None => {
                self.inner.insert(key, value);
                None
            }
        }
    }

    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let (h, _) = self.inner.find_or_insert_with(key, default);
        self.inner
            .value_at_mut(h)
            .expect("handle returned by insert is live")
    }

    /// The `map[key]` of languages with auto-vivifying indexers.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.get(q)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.get_mut(q)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.get_key_value(q)
    }

    /// Like `get`, but a missing key is an `Error::KeyNotFound`.
    pub fn at<Q>(&self, q: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.get(q).ok_or(Error::KeyNotFound)
    }

    pub fn at_mut<Q>(&mut self, q: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.get_mut(q).ok_or(Error::KeyNotFound)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.contains_key(q)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.remove(q)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.remove_entry(q)
    }

    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.inner.retain(keep)
    }

    /// Grows to at least `buckets` buckets.
    pub fn reserve(&mut self, buckets: usize) {
        self.inner.reserve(buckets)
    }

    pub fn try_reserve(&mut self, buckets: usize) -> Result<()> {
        self.inner.try_reserve(buckets)
    }
}

impl<K, V, S: Default> Default for ChainMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> Clone for ChainMap<K, V, S>
where
    K: Clone + Eq + Hash,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for ChainMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<K, V, S> PartialEq for ChainMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<K, V, S> Eq for ChainMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, Q, V, S> Index<&Q> for ChainMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    /// # Panics
    /// If the key is not present.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not found")
    }
}

impl<K, V, S> Extend<(K, V)> for ChainMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.inner.extend(iter)
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: HashTable::from_iter(iter),
        }
    }
}

impl<K, V, S> IntoIterator for ChainMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> IntoIter<K, V> {
        self.inner.into_iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Iter<'a, K, V> {
        self.inner.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ChainMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> IterMut<'a, K, V> {
        self.inner.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_or_assign_overwrites_and_reports_old() {
        let mut m: ChainMap<&'static str, i32> = ChainMap::new();
        assert_eq!(m.insert_or_assign("a", 1), None);
        assert_eq!(m.insert_or_assign("a", 2), Some(1));
        assert_eq!(m.get(&"a"), Some(&2));
        assert!(!m.insert("a", 3));
        assert_eq!(m["a"], 2);
        m.as_table().assert_invariants();
    }

    #[test]
    fn get_or_insert_default_auto_vivifies() {
        let mut m: ChainMap<String, Vec<u32>> = ChainMap::new();
        m.get_or_insert_default("xs".to_string()).push(1);
        m.get_or_insert_default("xs".to_string()).push(2);
        assert_eq!(m.get("xs"), Some(&vec![1, 2]));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn at_reports_key_not_found() {
        let mut m: ChainMap<u32, u32> = [(1, 10)].into_iter().collect();
        assert_eq!(m.at(&1), Ok(&10));
        *m.at_mut(&1).unwrap() += 1;
        assert_eq!(m.at(&1), Ok(&11));
        assert_eq!(m.at(&2), Err(Error::KeyNotFound));
        assert!(matches!(m.at_mut(&2), Err(Error::KeyNotFound)));
    }

    #[test]
    #[should_panic(expected = "key not found")]
    fn index_panics_on_missing_key() {
        let m: ChainMap<u32, u32> = ChainMap::new();
        let _ = m[&7];
    }
}
