//! LRU Eviction Engine
//!
//! Implements a byte-budgeted least-recently-used cache. Entries live in an
//! arena of slots linked into a recency list by stable indices (front = most
//! recently touched, back = eviction candidate) and are indexed by a
//! key-to-slot map, giving O(1) lookup and O(1) move-to-front.
//!
//! The engine is not safe for unsynchronized concurrent use; callers must
//! hold an external lock (see [`crate::cache::SharedCache`]).

use ahash::AHashMap;

/// Sentinel slot index marking the end of the recency list.
const NIL: usize = usize::MAX;

// == Weighted ==
/// Capability required of cached values: report their byte size.
///
/// The engine never inspects value contents; the weight is the only thing
/// it needs for byte accounting.
pub trait Weighted {
    /// Byte size of the value.
    fn weight(&self) -> usize;
}

// == Slot ==
/// One arena slot holding an entry and its recency-list links.
struct Slot<V> {
    key: String,
    value: V,
    prev: usize,
    next: usize,
}

/// Callback invoked with the owned (key, value) of every evicted entry.
pub type EvictionCallback<V> = Box<dyn FnMut(String, V) + Send>;

// == LRU Cache ==
/// Byte-budgeted LRU cache keyed by string.
///
/// `max_bytes == 0` means unbounded. The byte budget counts
/// `key.len() + value.weight()` per entry; whenever the total exceeds the
/// budget, entries are evicted from the back of the recency list until the
/// cache fits again.
pub struct LruCache<V> {
    /// Capacity in bytes; 0 disables eviction
    max_bytes: usize,
    /// Sum of size contributions of all current entries
    used_bytes: usize,
    /// Slot arena; freed slots are recycled via the free list
    slots: Vec<Option<Slot<V>>>,
    /// Indices of vacated slots available for reuse
    free: Vec<usize>,
    /// Most recently used slot index, or NIL
    head: usize,
    /// Least recently used slot index, or NIL
    tail: usize,
    /// Key to slot index
    index: AHashMap<String, usize>,
    /// Optional callback fired on every eviction
    on_evicted: Option<EvictionCallback<V>>,
}

impl<V: Weighted> LruCache<V> {
    // == Constructors ==
    /// Creates an empty cache with the given byte budget (0 = unbounded).
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            index: AHashMap::new(),
            on_evicted: None,
        }
    }

    /// Creates an empty cache that invokes `callback` with the owned
    /// (key, value) of every entry removed by eviction.
    ///
    /// The callback runs synchronously while the caller's lock (if any) is
    /// held; it must not re-enter the cache.
    pub fn with_eviction_callback(
        max_bytes: usize,
        callback: impl FnMut(String, V) + Send + 'static,
    ) -> Self {
        let mut cache = Self::new(max_bytes);
        cache.on_evicted = Some(Box::new(callback));
        cache
    }

    // == Add ==
    /// Inserts or updates an entry, then evicts from the back until the
    /// cache is within budget.
    ///
    /// An existing key is promoted to the front and its byte accounting is
    /// adjusted by the difference between the new and old value weights. A
    /// single oversized insert may trigger multiple evictions; an entry
    /// larger than the whole budget is evicted immediately after insertion.
    pub fn add(&mut self, key: &str, value: V) {
        if let Some(&idx) = self.index.get(key) {
            self.detach(idx);
            self.attach_front(idx);
            let new_weight = value.weight();
            let slot = self.slot_mut(idx);
            let old_weight = slot.value.weight();
            slot.value = value;
            self.used_bytes = self.used_bytes - old_weight + new_weight;
        } else {
            let contribution = key.len() + value.weight();
            let idx = self.alloc(Slot {
                key: key.to_string(),
                value,
                prev: NIL,
                next: NIL,
            });
            self.index.insert(key.to_string(), idx);
            self.attach_front(idx);
            self.used_bytes += contribution;
        }

        while self.max_bytes != 0 && self.used_bytes > self.max_bytes {
            self.remove_oldest();
        }
    }

    // == Get ==
    /// Looks up a key, promoting the entry to most recently used on a hit.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.detach(idx);
        self.attach_front(idx);
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    // == Remove Oldest ==
    /// Evicts the least recently used entry, if any.
    ///
    /// No-op on an empty cache. Fires the eviction callback if one is set.
    pub fn remove_oldest(&mut self) {
        if self.tail == NIL {
            return;
        }
        let idx = self.tail;
        self.detach(idx);
        let slot = self.slots[idx].take().expect("tail slot is occupied");
        self.free.push(idx);
        self.index.remove(&slot.key);
        self.used_bytes -= slot.key.len() + slot.value.weight();
        if let Some(callback) = self.on_evicted.as_mut() {
            callback(slot.key, slot.value);
        }
    }

    // == Observers ==
    /// Number of entries currently held (not a byte count).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Current sum of entry size contributions.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// Configured byte budget (0 = unbounded).
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    // == Arena Internals ==
    fn slot(&self, idx: usize) -> &Slot<V> {
        self.slots[idx].as_ref().expect("linked slot is occupied")
    }

    fn slot_mut(&mut self, idx: usize) -> &mut Slot<V> {
        self.slots[idx].as_mut().expect("linked slot is occupied")
    }

    /// Places a slot into the arena, reusing a vacated index if available.
    fn alloc(&mut self, slot: Slot<V>) -> usize {
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(slot);
            idx
        } else {
            self.slots.push(Some(slot));
            self.slots.len() - 1
        }
    }

    /// Unlinks a slot from the recency list.
    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let slot = self.slot(idx);
            (slot.prev, slot.next)
        };
        if prev == NIL {
            self.head = next;
        } else {
            self.slot_mut(prev).next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.slot_mut(next).prev = prev;
        }
        let slot = self.slot_mut(idx);
        slot.prev = NIL;
        slot.next = NIL;
    }

    /// Links a detached slot in as the most recently used entry.
    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let slot = self.slot_mut(idx);
            slot.prev = NIL;
            slot.next = old_head;
        }
        if old_head != NIL {
            self.slot_mut(old_head).prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Simple weighted value for engine tests.
    #[derive(Debug, Clone, PartialEq)]
    struct Text(String);

    impl Text {
        fn new(s: &str) -> Self {
            Text(s.to_string())
        }
    }

    impl Weighted for Text {
        fn weight(&self) -> usize {
            self.0.len()
        }
    }

    #[test]
    fn test_lru_new_is_empty() {
        let cache: LruCache<Text> = LruCache::new(64);
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.used_bytes(), 0);
        assert_eq!(cache.max_bytes(), 64);
    }

    #[test]
    fn test_lru_add_and_get() {
        let mut cache = LruCache::new(0);

        cache.add("key1", Text::new("1234"));
        assert_eq!(cache.get("key1"), Some(&Text::new("1234")));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.used_bytes(), "key1".len() + 4);
    }

    #[test]
    fn test_lru_get_miss_has_no_side_effects() {
        let mut cache: LruCache<Text> = LruCache::new(0);
        assert!(cache.get("absent").is_none());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.used_bytes(), 0);
    }

    #[test]
    fn test_lru_readd_updates_value_and_bytes() {
        let mut cache = LruCache::new(0);

        cache.add("key", Text::new("short"));
        let before = cache.used_bytes();

        cache.add("key", Text::new("considerably longer"));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("key"), Some(&Text::new("considerably longer")));
        assert_eq!(
            cache.used_bytes(),
            before - "short".len() + "considerably longer".len()
        );
    }

    #[test]
    fn test_lru_readd_shrinks_bytes() {
        let mut cache = LruCache::new(0);

        cache.add("key", Text::new("a longer initial value"));
        cache.add("key", Text::new("tiny"));

        assert_eq!(cache.used_bytes(), "key".len() + 4);
    }

    #[test]
    fn test_lru_eviction_over_budget() {
        // Budget fits exactly two 8-byte entries ("k1" + "value1" = 8)
        let mut cache = LruCache::new(16);

        cache.add("k1", Text::new("value1"));
        cache.add("k2", Text::new("value2"));
        assert_eq!(cache.len(), 2);

        // Third entry pushes over budget; k1 is the LRU victim
        cache.add("k3", Text::new("value3"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("k1").is_none());
        assert!(cache.get("k2").is_some());
        assert!(cache.get("k3").is_some());
        assert!(cache.used_bytes() <= 16);
    }

    #[test]
    fn test_lru_mixed_size_eviction() {
        // 16-byte budget: k1/v1 (4) + k2/v2 (4) fit; k3/v123456789 (12)
        // evicts k1
        let mut cache = LruCache::new(16);

        cache.add("k1", Text::new("v1"));
        cache.add("k2", Text::new("v2"));
        cache.add("k3", Text::new("v123456789"));

        assert!(cache.get("k1").is_none());
        assert!(cache.get("k2").is_some());
        assert!(cache.get("k3").is_some());
        assert_eq!(cache.used_bytes(), 16);
    }

    #[test]
    fn test_lru_get_promotes_entry() {
        let mut cache = LruCache::new(16);

        cache.add("k1", Text::new("value1"));
        cache.add("k2", Text::new("value2"));

        // Touch k1 so k2 becomes the eviction candidate
        assert!(cache.get("k1").is_some());

        cache.add("k3", Text::new("value3"));

        assert!(cache.get("k1").is_some());
        assert!(cache.get("k2").is_none());
    }

    #[test]
    fn test_lru_readd_promotes_entry() {
        let mut cache = LruCache::new(16);

        cache.add("k1", Text::new("value1"));
        cache.add("k2", Text::new("value2"));

        // Re-adding k1 promotes it; k2 becomes the victim
        cache.add("k1", Text::new("value!"));
        cache.add("k3", Text::new("value3"));

        assert!(cache.get("k1").is_some());
        assert!(cache.get("k2").is_none());
    }

    #[test]
    fn test_lru_oversized_entry_evicts_itself() {
        let mut cache = LruCache::new(8);

        cache.add("huge", Text::new("far too large for the budget"));

        // The entry alone exceeds the budget, so it is evicted immediately
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.used_bytes(), 0);
        assert!(cache.get("huge").is_none());
    }

    #[test]
    fn test_lru_single_insert_multiple_evictions() {
        let mut cache = LruCache::new(24);

        cache.add("a", Text::new("1234567"));
        cache.add("b", Text::new("1234567"));
        cache.add("c", Text::new("1234567"));
        assert_eq!(cache.len(), 3);

        // 16-byte entry forces out both oldest entries
        cache.add("d", Text::new("123456789012345"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
        assert!(cache.get("d").is_some());
    }

    #[test]
    fn test_lru_unbounded_never_evicts() {
        let mut cache = LruCache::new(0);

        for i in 0..100 {
            cache.add(&format!("key{}", i), Text::new("some value payload"));
        }

        assert_eq!(cache.len(), 100);
    }

    #[test]
    fn test_lru_remove_oldest_empty_is_noop() {
        let mut cache: LruCache<Text> = LruCache::new(16);
        cache.remove_oldest();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_remove_oldest_order() {
        let mut cache = LruCache::new(0);

        cache.add("first", Text::new("v"));
        cache.add("second", Text::new("v"));
        cache.add("third", Text::new("v"));

        cache.remove_oldest();

        assert!(cache.get("first").is_none());
        assert!(cache.get("second").is_some());
        assert!(cache.get("third").is_some());
    }

    #[test]
    fn test_lru_eviction_callback_fires_once_with_entry() {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&evicted);

        let mut cache = LruCache::with_eviction_callback(16, move |key, value: Text| {
            sink.lock().unwrap().push((key, value));
        });

        cache.add("k1", Text::new("value1"));
        cache.add("k2", Text::new("value2"));
        cache.add("k3", Text::new("value3"));

        let evicted = evicted.lock().unwrap();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0], ("k1".to_string(), Text::new("value1")));
    }

    #[test]
    fn test_lru_callback_counts_all_evictions() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let mut cache = LruCache::with_eviction_callback(16, move |_key, _value: Text| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        for i in 0..10 {
            cache.add(&format!("k{}", i), Text::new("value!"));
        }

        // Budget holds two entries, so eight were evicted along the way
        assert_eq!(cache.len(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_lru_slot_reuse_after_eviction() {
        let mut cache = LruCache::new(16);

        cache.add("k1", Text::new("value1"));
        cache.add("k2", Text::new("value2"));
        cache.add("k3", Text::new("value3"));
        cache.add("k4", Text::new("value4"));

        // Evicted slots were recycled; the arena holds only live entries
        assert_eq!(cache.len(), 2);
        assert!(cache.get("k3").is_some());
        assert!(cache.get("k4").is_some());
        assert_eq!(cache.used_bytes(), 16);
    }

    #[test]
    fn test_lru_used_bytes_matches_recomputation() {
        let mut cache = LruCache::new(64);
        let keys = ["alpha", "beta", "gamma", "delta", "epsilon"];

        for key in keys {
            cache.add(key, Text::new("0123456789"));
        }
        cache.get("alpha");
        cache.add("beta", Text::new("012"));

        let expected: usize = keys
            .iter()
            .filter_map(|&k| cache.get(k).map(Weighted::weight).map(|w| k.len() + w))
            .sum();

        assert_eq!(cache.used_bytes(), expected);
    }
}
