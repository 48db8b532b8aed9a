//! ChainSet: a set façade over `HashTable<T, ()>`.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};

use hashbrown::hash_map::DefaultHashBuilder;

use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::hash_table::{self, HashTable};

pub struct ChainSet<T, S = DefaultHashBuilder> {
    inner: HashTable<T, (), S>,
}

impl<T> ChainSet<T> {
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

impl<T, S> ChainSet<T, S> {
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

    pub fn iter(&self) -> SetIter<'_, T> {
        SetIter {
            inner: self.inner.iter(),
        }
    }

    pub fn as_table(&self) -> &HashTable<T, (), S> {
        &self.inner
    }
}

impl<T, S> ChainSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    /// Adds `value` unless an equal one is present; returns whether it was
    /// added.
    pub fn insert(&mut self, value: T) -> bool {
        self.inner.insert(value, ()).1
    }

    /// Adds `value`, replacing and returning an equal stored value if any.
    pub fn replace(&mut self, value: T) -> Option<T> {
        let old = self.inner.remove_entry(&value).map(|(k, ())| k);
        self.inner.insert(value, ());
        old
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.contains_key(q)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.get_key_value(q).map(|(k, _)| k)
    }

    pub fn at<Q>(&self, q: &Q) -> Result<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(Error::KeyNotFound)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.erase_key(q) == 1
    }

    pub fn take<Q>(&mut self, q: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.remove_entry(q).map(|(k, ())| k)
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.inner.retain(|k, _| keep(k))
    }

    pub fn reserve(&mut self, buckets: usize) {
        self.inner.reserve(buckets)
    }

    pub fn try_reserve(&mut self, buckets: usize) -> Result<()> {
        self.inner.try_reserve(buckets)
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|t| other.contains(t))
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().all(|t| !large.contains(t))
    }
}

impl<T, S: Default> Default for ChainSet<T, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<T, S> Clone for ChainSet<T, S>
where
    T: Clone + Eq + Hash,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug, S> fmt::Debug for ChainSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> PartialEq for ChainSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T, S> Eq for ChainSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
}

impl<T, S> Extend<T> for ChainSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.inner.extend(iter.into_iter().map(|t| (t, ())))
    }
}

impl<T, S> FromIterator<T> for ChainSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.extend(iter);
        set
    }
}

pub struct SetIter<'a, T> {
    inner: hash_table::Iter<'a, T, ()>,
}

impl<'a, T> Iterator for SetIter<'a, T> {
    type Item = &'a T;
    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        self.inner.next().map(|(k, _)| k)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for SetIter<'_, T> {}

pub struct SetIntoIter<T> {
    inner: hash_table::IntoIter<T, ()>,
}

impl<T> Iterator for SetIntoIter<T> {
    type Item = T;
    #[inline]
    fn next(&mut self) -> Option<T> {
        self.inner.next().map(|(k, ())| k)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for SetIntoIter<T> {}

impl<T, S> IntoIterator for ChainSet<T, S> {
    type Item = T;
    type IntoIter = SetIntoIter<T>;
    fn into_iter(self) -> SetIntoIter<T> {
        SetIntoIter {
            inner: self.inner.into_iter(),
        }
    }
}

impl<'a, T, S> IntoIterator for &'a ChainSet<T, S> {
    type Item = &'a T;
    type IntoIter = SetIter<'a, T>;
    fn into_iter(self) -> SetIter<'a, T> {
        self.iter()
    }
}
