#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can call the
// crate-private invariant checker after every operation.

use crate::hash_table::HashTable;
use crate::sequence::Handle;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations so that shrinking moves toward earlier keys.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    EraseKey(usize),
    EraseHandle(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Reserve(usize),
    Retain(u8),
    Clear,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            2 => idx.clone().prop_map(Op::EraseKey),
            2 => idx.clone().prop_map(Op::EraseHandle),
            2 => idx.clone().prop_map(Op::Find),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(Op::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => (0usize..64).prop_map(Op::Reserve),
            1 => any::<u8>().prop_map(Op::Retain),
            1 => Just(Op::Clear),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Drives one scenario against a std HashMap model. After every operation the
// table must satisfy conservation, contiguity, uniqueness and the load bound,
// and agree with the model on membership, values and size. Handles taken at
// insert time must keep resolving across rehashes until their entry goes.
fn run_scenario<S>(
    mut sut: HashTable<Key, i32, S>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut live: HashMap<Key, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = key_from(pool, i);
                let already = model.get(&k).copied();
                let (h, fresh) = sut.insert(k.clone(), v);
                prop_assert_eq!(fresh, already.is_none());
                if fresh {
                    live.insert(k.clone(), h);
                    model.insert(k, v);
                } else {
                    // No overwrite on duplicate.
                    prop_assert_eq!(Some(&h), live.get(&k));
                    prop_assert_eq!(sut.value_at(h).copied(), already);
                }
            }
            Op::EraseKey(i) => {
                let k = key_from(pool, i);
                let removed = sut.erase_key(&k);
                let expected = usize::from(model.remove(&k).is_some());
                prop_assert_eq!(removed, expected);
                if let Some(h) = live.remove(&k) {
                    stale.push(h);
                }
                prop_assert_eq!(sut.erase_key(&k), 0);
            }
            Op::EraseHandle(i) => {
                let k = key_from(pool, i);
                if let Some(h) = live.remove(&k) {
                    let expected_next = sut.next(h);
                    prop_assert_eq!(sut.erase(h), expected_next);
                    model.remove(&k);
                    stale.push(h);
                } else {
                    prop_assert!(sut.find(&k).is_none());
                }
            }
            Op::Find(i) => {
                let k = key_from(pool, i);
                let found = sut.find(&k);
                prop_assert_eq!(found.is_some(), model.contains_key(&k));
                prop_assert_eq!(found.as_ref(), live.get(&k));
            }
            Op::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            Op::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.wrapping_add(d);
                    let mv = model.get_mut(&k).expect("model tracks live key");
                    *mv = mv.wrapping_add(d);
                }
            }
            Op::Reserve(extra) => {
                let before: BTreeSet<Key> = sut.keys().cloned().collect();
                sut.reserve(sut.bucket_count() + extra);
                let after: BTreeSet<Key> = sut.keys().cloned().collect();
                prop_assert_eq!(before, after);
            }
            Op::Retain(mask) => {
                let drop_key = |k: &Key| (k.0.len() as u8 & mask & 1) == 1;
                sut.retain(|k, _| !drop_key(k));
                model.retain(|k, _| !drop_key(k));
                live.retain(|k, h| {
                    if drop_key(k) {
                        stale.push(*h);
                        false
                    } else {
                        true
                    }
                });
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                stale.extend(live.drain().map(|(_, h)| h));
            }
            Op::Iterate => {
                let s_keys: BTreeSet<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
            }
        }

        sut.assert_invariants();
        prop_assert!(sut.load_factor() <= sut.max_load_factor());
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        for (k, h) in &live {
            prop_assert_eq!(sut.key_at(*h), Some(k));
            prop_assert_eq!(sut.value_at(*h), model.get(k));
        }
        for &h in &stale {
            prop_assert!(sut.value_at(h).is_none());
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(HashTable::with_buckets(1), &pool, ops)?;
    }
}

// Collision variant: every key hashes to zero, so all entries share bucket 0
// and equality alone separates them.
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
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(HashTable::with_hasher(ConstBuildHasher), &pool, ops)?;
    }
}
