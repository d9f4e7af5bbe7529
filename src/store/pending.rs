//! The holding area for optimistic writes
//!
//! A locally created or updated item lands here first, so that month reads show
//! it immediately, before the remote service has round-tripped. Entries leave
//! this area opportunistically, whenever a read observes the confirmed item in
//! the authoritative base; there is no separate expiry timer.

use std::collections::{HashMap, HashSet};

use crate::item::{CalendarItem, ItemId, MonthKey};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PendingBuckets {
    buckets: HashMap<MonthKey, Vec<CalendarItem>>,
}

impl PendingBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `item` to the bucket for `key`, replacing any existing entry with the
    /// same id first
    pub fn add(&mut self, key: MonthKey, item: CalendarItem) {
        let bucket = self.buckets.entry(key).or_default();
        bucket.retain(|existing| existing.id() != item.id());
        bucket.push(item);
    }

    /// Remove and return the entry with `id` from the bucket for `key`
    pub fn remove(&mut self, key: MonthKey, id: ItemId) -> Option<CalendarItem> {
        let bucket = self.buckets.get_mut(&key)?;
        let position = bucket.iter().position(|item| item.id() == id)?;
        let removed = bucket.remove(position);
        if bucket.is_empty() {
            self.buckets.remove(&key);
        }
        Some(removed)
    }

    pub fn contains(&self, key: MonthKey, id: ItemId) -> bool {
        self.buckets.get(&key)
            .map(|bucket| bucket.iter().any(|item| item.id() == id))
            .unwrap_or(false)
    }

    /// Merge the pending entries for `key` into `base`.
    ///
    /// Entries whose id is already present in `base` are dropped for good: the
    /// remote has caught up, keeping them would only produce duplicates. The
    /// remaining entries are appended to `base`.
    pub fn merge_into_base(&mut self, base: &mut Vec<CalendarItem>, key: MonthKey) {
        let bucket = match self.buckets.get_mut(&key) {
            None => return,
            Some(bucket) => bucket,
        };

        let confirmed: HashSet<ItemId> = base.iter().map(|item| item.id()).collect();
        bucket.retain(|item| {
            if confirmed.contains(&item.id()) {
                log::debug!("Pending entry {} is confirmed in the base, clearing it", item.id());
                false
            } else {
                true
            }
        });

        base.extend(bucket.iter().cloned());
        if bucket.is_empty() {
            self.buckets.remove(&key);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn clear_all(&mut self) {
        self.buckets.clear();
    }
}
