//! Bounded object cache keyed by object id.
//!
//! Entries are replaced or evicted whole, never patched. A fetch takes a
//! [`FetchTicket`] before issuing its request; inserting with that ticket
//! fails if the object was evicted after the ticket was taken, so a fetch
//! that raced a mutation cannot bring the pre-mutation copy back.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::atompub::ObjectFetchOptions;
use crate::model::ObjectData;

/// Proof of when a fetch started, in eviction epochs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    epoch: u64,
}

#[derive(Debug)]
struct CacheEntry {
    object: ObjectData,
    options: ObjectFetchOptions,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Insertion order, oldest first
    order: VecDeque<String>,
    epoch: u64,
    /// Epoch of the last eviction per id
    tombstones: HashMap<String, u64>,
    tombstone_order: VecDeque<(String, u64)>,
    /// Tickets older than this are refused; raised as tombstones are dropped
    floor: u64,
}

impl CacheState {
    fn unlink(&mut self, object_id: &str) {
        if let Some(pos) = self.order.iter().position(|id| id == object_id) {
            self.order.remove(pos);
        }
    }
}

#[derive(Debug)]
pub struct ObjectCache {
    capacity: usize,
    tombstone_limit: usize,
    state: Mutex<CacheState>,
}

impl ObjectCache {
    /// A cache holding at most `capacity` objects. Zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tombstone_limit: capacity.max(64),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn ticket(&self) -> FetchTicket {
        FetchTicket {
            epoch: self.state.lock().epoch,
        }
    }

    /// Cached copy of `object_id`, whatever options it was fetched with.
    pub fn get(&self, object_id: &str) -> Option<ObjectData> {
        self.state
            .lock()
            .entries
            .get(object_id)
            .map(|entry| entry.object.clone())
    }

    /// Cached copy of `object_id` fetched with exactly `options`.
    pub fn get_matching(&self, object_id: &str, options: &ObjectFetchOptions) -> Option<ObjectData> {
        self.state
            .lock()
            .entries
            .get(object_id)
            .filter(|entry| entry.options == *options)
            .map(|entry| entry.object.clone())
    }

    pub fn contains(&self, object_id: &str) -> bool {
        self.state.lock().entries.contains_key(object_id)
    }

    /// Store `object`, replacing any previous copy. Returns false when the
    /// object was evicted after `ticket` was taken; nothing is stored then.
    pub fn insert(&self, ticket: FetchTicket, object: ObjectData, options: ObjectFetchOptions) -> bool {
        if self.capacity == 0 {
            return false;
        }
        let mut state = self.state.lock();
        if ticket.epoch < state.floor {
            return false;
        }
        if state
            .tombstones
            .get(&object.object_id)
            .is_some_and(|&evicted| evicted > ticket.epoch)
        {
            return false;
        }

        let object_id = object.object_id.clone();
        if state.entries.contains_key(&object_id) {
            state.unlink(&object_id);
        } else if state.entries.len() >= self.capacity
            && let Some(oldest) = state.order.pop_front()
        {
            state.entries.remove(&oldest);
        }
        state.order.push_back(object_id.clone());
        state.entries.insert(object_id, CacheEntry { object, options });
        true
    }

    /// Drop `object_id` and refuse any insert from a fetch that started
    /// before now. Returns whether an entry was present.
    pub fn evict(&self, object_id: &str) -> bool {
        let mut state = self.state.lock();
        state.epoch += 1;
        let epoch = state.epoch;
        state.tombstones.insert(object_id.to_string(), epoch);
        state.tombstone_order.push_back((object_id.to_string(), epoch));
        while state.tombstone_order.len() > self.tombstone_limit {
            let Some((id, dropped)) = state.tombstone_order.pop_front() else {
                break;
            };
            if state.tombstones.get(&id) == Some(&dropped) {
                state.tombstones.remove(&id);
            }
            state.floor = dropped;
        }

        let present = state.entries.remove(object_id).is_some();
        if present {
            state.unlink(object_id);
        }
        present
    }

    /// Drop every entry and refuse inserts from all fetches started before now.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.epoch += 1;
        state.floor = state.epoch;
        state.entries.clear();
        state.order.clear();
        state.tombstones.clear();
        state.tombstone_order.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(id: &str) -> ObjectData {
        ObjectData {
            object_id: id.to_string(),
            ..ObjectData::default()
        }
    }

    #[test]
    fn test_replace_not_merge() {
        let cache = ObjectCache::new(4);
        let mut first = object("a");
        first.policy_ids.push("p1".to_string());
        assert!(cache.insert(cache.ticket(), first, ObjectFetchOptions::new()));
        assert!(cache.insert(cache.ticket(), object("a"), ObjectFetchOptions::new()));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").unwrap().policy_ids.is_empty());
    }

    #[test]
    fn test_options_must_match() {
        let cache = ObjectCache::new(4);
        let options = ObjectFetchOptions::new().include_acl(true);
        cache.insert(cache.ticket(), object("a"), options.clone());
        assert!(cache.get_matching("a", &options).is_some());
        assert!(cache.get_matching("a", &ObjectFetchOptions::new()).is_none());
        assert!(cache.get("a").is_some());
    }

    #[test]
    fn test_oldest_evicted_when_full() {
        let cache = ObjectCache::new(2);
        for id in ["a", "b", "c"] {
            cache.insert(cache.ticket(), object(id), ObjectFetchOptions::new());
        }
        assert!(!cache.contains("a"));
        assert!(cache.contains("b") && cache.contains("c"));
    }

    #[test]
    fn test_fetch_racing_eviction_is_refused() {
        let cache = ObjectCache::new(4);
        cache.insert(cache.ticket(), object("a"), ObjectFetchOptions::new());

        let stale = cache.ticket();
        assert!(cache.evict("a"));
        assert!(!cache.insert(stale, object("a"), ObjectFetchOptions::new()));
        assert!(!cache.contains("a"));

        // Other ids are unaffected, and a fresh fetch may repopulate.
        assert!(cache.insert(stale, object("b"), ObjectFetchOptions::new()));
        assert!(cache.insert(cache.ticket(), object("a"), ObjectFetchOptions::new()));
    }

    #[test]
    fn test_dropped_tombstones_raise_floor() {
        let cache = ObjectCache::new(1);
        let old = cache.ticket();
        for i in 0..100 {
            cache.evict(&format!("x{i}"));
        }
        // The tombstone for x0 is gone, so the old ticket is refused outright.
        assert!(!cache.insert(old, object("x0"), ObjectFetchOptions::new()));
        assert!(cache.insert(cache.ticket(), object("x0"), ObjectFetchOptions::new()));
    }

    #[test]
    fn test_clear_refuses_earlier_tickets() {
        let cache = ObjectCache::new(4);
        let stale = cache.ticket();
        cache.insert(cache.ticket(), object("a"), ObjectFetchOptions::new());
        cache.clear();

        assert!(cache.is_empty());
        assert!(!cache.insert(stale, object("b"), ObjectFetchOptions::new()));
        assert!(!cache.contains("b"));
        assert!(cache.insert(cache.ticket(), object("b"), ObjectFetchOptions::new()));
    }

    #[test]
    fn test_zero_capacity_disables() {
        let cache = ObjectCache::new(0);
        assert!(!cache.insert(cache.ticket(), object("a"), ObjectFetchOptions::new()));
        assert!(cache.is_empty());
    }
}
