//! chained-hashtable: a separate-chaining hash table whose buckets are
//! contiguous runs of one shared, owning linked sequence.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a chained hash table with a single global traversal order and
//!   amortized O(1) insert/find/erase, built from small layers that can be
//!   reasoned about independently.
//! - Layers:
//!   - Sequence<T>: owning doubly-linked list over a slot arena. Positions
//!     are generational `Handle`s; links are slot keys, not pointers.
//!   - BucketTable: one descriptor per bucket holding the handle of the
//!     chain's first node and the chain length. Descriptors never own nodes.
//!   - HashTable<K, V, S>: composes the two; hashing, equality, growth and
//!     erase live here.
//!   - ChainMap / ChainSet: thin façades adding map/set conveniences
//!     (`insert_or_assign`, `get_or_insert_default`, `at`).
//!
//! Invariants (hold between any two public calls)
//! - Uniqueness: at most one entry per key.
//! - Contiguity: the `len` nodes starting at a bucket's `first` all hash to
//!   that bucket; no foreign node sits inside the run.
//! - Conservation: bucket lengths sum to the sequence length.
//! - Bounded load: after any insert, `len / bucket_count <= max_load_factor`.
//!
//! Placement rule
//! - A new entry is linked directly before its bucket's current head, or at
//!   the back when the bucket is empty, and becomes the new head. This keeps
//!   each chain contiguous without per-bucket containers.
//! - Erasing a chain head moves the head to the follower returned by the
//!   sequence's unlink; any other member leaves the head alone.
//!
//! Rehashing
//! - Growth doubles the smallest bucket count that satisfies the load bound
//!   for the pending inserts, so inserts stay O(1) amortized.
//! - The new bucket array is allocated and every key hashed first; only then
//!   is each node re-threaded in place through the placement rule. A failed
//!   allocation or a panicking `Hash` impl leaves the old table intact. No entry moves in memory, so
//!   handles survive a rehash. Global traversal order after a rehash is
//!   unspecified.
//! - The owning bucket of a node is always recomputed from its key; nothing
//!   caches a hash or index on the node.
//!
//! Failure model
//! - Found/not-found and inserted/duplicate are ordinary return values.
//! - `try_insert`/`try_reserve`/`try_with_config` surface a failed
//!   bucket-array allocation as `Error::OutOfMemory`; their infallible
//!   counterparts follow the global allocator policy like `std` collections.
//! - Erasing a stale handle is a no-op.
//!
//! Concurrency
//! - Single-threaded, synchronous, no interior mutability. The table is
//!   `Send`/`Sync` when its contents are; share it behind an external lock.

pub mod bucket_table;
pub mod config;
pub mod error;
pub mod hash_table;
mod hash_table_proptest;
pub mod map;
pub mod sequence;
pub mod set;

// Public surface
pub use bucket_table::Bucket;
pub use config::TableConfig;
pub use error::{Error, Result};
pub use hash_table::HashTable;
pub use map::ChainMap;
pub use sequence::{Handle, Sequence};
pub use set::ChainSet;
