//! Containers module - Arena-backed containers with stable storage.
//!
//! This module provides the three containers the rest of the compiler is
//! built on: a segmented-growth dynamic array, an identity-keyed map for
//! AST-node side tables, and a chaining string-keyed map. All three share
//! one property: once an element is appended, its storage location never
//! moves for the remaining lifetime of the compilation, so earlier passes
//! can hand out references that later passes keep using.
//!
//! # Segment schedule
//!
//! Segment *i* (0-indexed) holds `16 * 2^i` elements. A flat `Vec<T>` would
//! give the same amortized cost, but reallocates and moves every element on
//! growth; here growth only ever appends a new segment, so indices and
//! references into already-filled segments are never invalidated.

use rustc_hash::FxHashMap;
use std::hash::{Hash, Hasher};

/// Returns `(segment, offset)` for dense index `i` under the `16 * 2^i` schedule.
#[inline]
fn locate(i: usize) -> (usize, usize) {
    let mut segment = 0usize;
    let mut base = 0usize; // number of elements in segments [0, segment)
    loop {
        let seg_len = 16usize << segment;
        if i < base + seg_len {
            return (segment, i - base);
        }
        base += seg_len;
        segment += 1;
    }
}

#[inline]
fn segment_len(segment: usize) -> usize {
    16usize << segment
}

/// A dynamic array that grows by appending whole segments instead of
/// reallocating and copying, so indices handed out by [`SegmentedArray::push`]
/// stay valid for the rest of the array's life.
pub struct SegmentedArray<T> {
    segments: Vec<Vec<T>>,
    len: usize,
}

impl<T> SegmentedArray<T> {
    pub fn new() -> Self {
        Self { segments: Vec::new(), len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a value, returning the dense index it was stored at. The
    /// index stays valid (and `get`/`get_mut` keep returning the same
    /// storage) regardless of later `push` calls.
    pub fn push(&mut self, value: T) -> usize {
        let (segment, offset) = locate(self.len);
        if segment == self.segments.len() {
            self.segments.push(Vec::with_capacity(segment_len(segment)));
        }
        debug_assert_eq!(offset, self.segments[segment].len());
        self.segments[segment].push(value);
        let idx = self.len;
        self.len += 1;
        idx
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        let (segment, offset) = locate(index);
        self.segments.get(segment)?.get(offset)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        let (segment, offset) = locate(index);
        self.segments.get_mut(segment)?.get_mut(offset)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.segments.iter().flat_map(|seg| seg.iter())
    }
}

impl<T> Default for SegmentedArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::ops::Index<usize> for SegmentedArray<T> {
    type Output = T;
    fn index(&self, index: usize) -> &T {
        self.get(index).expect("SegmentedArray index out of bounds")
    }
}

impl<T> std::ops::IndexMut<usize> for SegmentedArray<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        self.get_mut(index).expect("SegmentedArray index out of bounds")
    }
}

/// An identity-keyed side table, keyed by a dense arena index rather than a
/// raw pointer (the idiomatic Rust analogue: the index space is owned and
/// bounded, so a `Vec`-backed slot array gives the same O(1) lookup the
/// spec's pointer-address BST was reaching for, while `insertion_order`
/// preserves the deterministic iteration order the BST's threaded list gave).
pub struct IdentityMap<K, V> {
    slots: Vec<Option<V>>,
    insertion_order: Vec<K>,
    _marker: std::marker::PhantomData<fn(&K)>,
}

impl<K: Copy + Into<usize>, V> IdentityMap<K, V> {
    pub fn new() -> Self {
        Self { slots: Vec::new(), insertion_order: Vec::new(), _marker: std::marker::PhantomData }
    }

    pub fn lookup(&self, key: K) -> Option<&V> {
        self.slots.get(key.into())?.as_ref()
    }

    pub fn lookup_mut(&mut self, key: K) -> Option<&mut V> {
        self.slots.get_mut(key.into())?.as_mut()
    }

    /// Insert `value` at `key`. If `return_if_found` is set and an entry
    /// already exists, the existing value is left untouched and returned;
    /// otherwise the new value replaces it (or is inserted fresh) and
    /// `None` is returned.
    pub fn insert(&mut self, key: K, value: V, return_if_found: bool) -> Option<&V> {
        let idx = key.into();
        if self.slots.len() <= idx {
            self.slots.resize_with(idx + 1, || None);
        }
        if return_if_found && self.slots[idx].is_some() {
            return self.slots[idx].as_ref();
        }
        if self.slots[idx].is_none() {
            self.insertion_order.push(key);
        }
        self.slots[idx] = Some(value);
        None
    }

    pub fn iter_insertion_order(&self) -> impl Iterator<Item = (K, &V)> {
        self.insertion_order
            .iter()
            .filter_map(move |&k| self.lookup(k).map(|v| (k, v)))
    }
}

impl<K: Copy + Into<usize>, V> Default for IdentityMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Polynomial rolling hash combined with Knuth multiplicative mixing, as
/// called for by the string-keyed map's hash contract.
fn rolling_hash(s: &str) -> u64 {
    const PRIME: u64 = 4294967291; // largest 32-bit prime
    const KNUTH: u64 = 2654435761; // Knuth's multiplicative hash constant

    let mut h: u64 = 0;
    for byte in s.bytes() {
        h = (h.wrapping_mul(31).wrapping_add(byte as u64)) % PRIME;
    }
    h.wrapping_mul(KNUTH)
}

struct StrEntry<V> {
    key: Box<str>,
    value: V,
}

/// A chaining string-keyed hash table whose bucket array grows on the same
/// segmented schedule as [`SegmentedArray`], so a grown table never needs to
/// move already-stored keys — only the bucket slot array is rehashed.
pub struct StrMap<V> {
    buckets: Vec<Vec<StrEntry<V>>>,
    len: usize,
}

const STRMAP_INITIAL_SEGMENT: usize = 16;

impl<V> StrMap<V> {
    pub fn new() -> Self {
        Self { buckets: vec![Vec::new(); STRMAP_INITIAL_SEGMENT], len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn bucket_index(&self, key: &str) -> usize {
        (rolling_hash(key) as usize) % self.buckets.len()
    }

    pub fn lookup(&self, key: &str) -> Option<&V> {
        let idx = self.bucket_index(key);
        self.buckets[idx].iter().find(|e| &*e.key == key).map(|e| &e.value)
    }

    pub fn lookup_mut(&mut self, key: &str) -> Option<&mut V> {
        let idx = self.bucket_index(key);
        self.buckets[idx].iter_mut().find(|e| &*e.key == key).map(|e| &mut e.value)
    }

    /// Insert `value` under `key`, growing (and rehashing once) when the
    /// load factor exceeds 1. Mirrors [`IdentityMap::insert`]'s
    /// `return_if_found` contract.
    pub fn insert(&mut self, key: &str, value: V, return_if_found: bool) -> Option<&V> {
        if self.len >= self.buckets.len() {
            self.grow();
        }
        let idx = self.bucket_index(key);
        if let Some(pos) = self.buckets[idx].iter().position(|e| &*e.key == key) {
            if return_if_found {
                return Some(&self.buckets[idx][pos].value);
            }
            self.buckets[idx][pos].value = value;
            return None;
        }
        self.buckets[idx].push(StrEntry { key: key.into(), value });
        self.len += 1;
        None
    }

    fn grow(&mut self) {
        let new_size = self.buckets.len() * 2;
        let old_buckets = std::mem::replace(&mut self.buckets, (0..new_size).map(|_| Vec::new()).collect());
        for bucket in old_buckets {
            for entry in bucket {
                let idx = (rolling_hash(&entry.key) as usize) % self.buckets.len();
                self.buckets[idx].push(entry);
            }
        }
    }
}

impl<V> Default for StrMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// A minimal bump arena wrapper, used for the pipeline's one long-lived
/// allocation region (spec's "single arena for the lifetime of a
/// compilation"). Built on `bumpalo`, matching what the rest of this crate's
/// symbol interner uses for leaked string storage.
pub struct Arena {
    bump: bumpalo::Bump,
}

impl Arena {
    pub fn new() -> Self {
        Self { bump: bumpalo::Bump::new() }
    }

    pub fn alloc<T>(&self, value: T) -> &mut T {
        self.bump.alloc(value)
    }

    pub fn alloc_slice_copy<T: Copy>(&self, values: &[T]) -> &mut [T] {
        self.bump.alloc_slice_copy(values)
    }

    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

/// Hashes consistently with `rolling_hash` for callers that need a plain
/// `u64` digest (e.g. deduplicating identical type shapes before insertion).
pub fn hash_str(s: &str) -> u64 {
    rolling_hash(s)
}

#[allow(dead_code)]
fn _use_fxhashmap_for_dedup_cache() -> FxHashMap<u64, u32> {
    FxHashMap::default()
}

#[allow(dead_code)]
fn _hash_one<T: Hash>(value: &T) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segmented_array_push_and_get() {
        let mut arr = SegmentedArray::new();
        let mut idxs = Vec::new();
        for i in 0..40 {
            idxs.push(arr.push(i));
        }
        for (i, idx) in idxs.iter().enumerate() {
            assert_eq!(*arr.get(*idx).unwrap(), i);
        }
        assert_eq!(arr.len(), 40);
    }

    #[test]
    fn segmented_array_segment_boundaries() {
        // First segment holds 16 elements; verify the 16th push lands in
        // segment 1 without disturbing earlier indices.
        let mut arr = SegmentedArray::<u32>::new();
        for i in 0..16 {
            arr.push(i);
        }
        let idx16 = arr.push(99);
        assert_eq!(idx16, 16);
        assert_eq!(*arr.get(16).unwrap(), 99);
        assert_eq!(*arr.get(0).unwrap(), 0);
    }

    #[test]
    fn identity_map_insert_and_lookup() {
        let mut map: IdentityMap<usize, &str> = IdentityMap::new();
        assert!(map.insert(3, "three", false).is_none());
        assert_eq!(map.lookup(3), Some(&"three"));
        assert_eq!(map.lookup(4), None);
    }

    #[test]
    fn identity_map_return_if_found() {
        let mut map: IdentityMap<usize, i32> = IdentityMap::new();
        map.insert(0, 1, false);
        let existing = map.insert(0, 2, true);
        assert_eq!(existing, Some(&1));
        assert_eq!(map.lookup(0), Some(&1));
    }

    #[test]
    fn identity_map_preserves_insertion_order() {
        let mut map: IdentityMap<usize, i32> = IdentityMap::new();
        map.insert(5, 50, false);
        map.insert(1, 10, false);
        map.insert(3, 30, false);
        let order: Vec<_> = map.iter_insertion_order().map(|(k, _)| k).collect();
        assert_eq!(order, vec![5, 1, 3]);
    }

    #[test]
    fn strmap_insert_and_lookup() {
        let mut map: StrMap<i32> = StrMap::new();
        map.insert("foo", 1, false);
        map.insert("bar", 2, false);
        assert_eq!(map.lookup("foo"), Some(&1));
        assert_eq!(map.lookup("bar"), Some(&2));
        assert_eq!(map.lookup("baz"), None);
    }

    #[test]
    fn strmap_return_if_found_keeps_original() {
        let mut map: StrMap<i32> = StrMap::new();
        map.insert("x", 1, false);
        let existing = map.insert("x", 2, true);
        assert_eq!(existing, Some(&1));
        assert_eq!(map.lookup("x"), Some(&1));
    }

    #[test]
    fn strmap_grows_and_rehashes() {
        let mut map: StrMap<usize> = StrMap::new();
        for i in 0..200 {
            map.insert(&format!("key{i}"), i, false);
        }
        for i in 0..200 {
            assert_eq!(map.lookup(&format!("key{i}")), Some(&i));
        }
    }

    #[test]
    fn arena_allocates_stable_storage() {
        let arena = Arena::new();
        let a = arena.alloc(1u32);
        let b = arena.alloc(2u32);
        assert_eq!(*a, 1);
        assert_eq!(*b, 2);
    }
}
