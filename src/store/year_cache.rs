//! The per-owner full-year item lists
//!
//! Tracks which `(owner, year)` pairs have been fetched in full, so redundant
//! year-wide fetches can be skipped, and keeps the materialized lists around so
//! slice buckets can be regenerated after a local mutation without re-fetching.

use std::collections::{HashMap, HashSet};

use crate::item::{CalendarItem, Owner};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct YearCache {
    loaded: HashSet<(Owner, i32)>,
    cache: HashMap<(Owner, i32), Vec<CalendarItem>>,
}

impl YearCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the full year of `owner` has already been fetched
    pub fn has(&self, owner: Owner, year: i32) -> bool {
        self.loaded.contains(&(owner, year))
    }

    /// The materialized year list, or empty if never loaded
    pub fn get(&self, owner: Owner, year: i32) -> Vec<CalendarItem> {
        self.cache.get(&(owner, year)).cloned().unwrap_or_default()
    }

    /// Mark the year loaded and store its full list.
    /// The caller is responsible for re-deriving the slice index from `list`
    /// (the [`CacheStore`](crate::store::CacheStore) does this).
    pub fn put(&mut self, owner: Owner, year: i32, list: Vec<CalendarItem>) {
        self.loaded.insert((owner, year));
        self.cache.insert((owner, year), list);
    }

    /// Replace the item with the same id in the year list, or append it.
    ///
    /// The list is created when the year was never loaded, but the year is NOT
    /// marked loaded: a partial list accrued through upserts must not make
    /// [`has`](YearCache::has) skip the real fetch later.
    pub fn upsert(&mut self, owner: Owner, year: i32, item: &CalendarItem) {
        let list = self.cache.entry((owner, year)).or_default();
        match list.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => *existing = item.clone(),
            None => list.push(item.clone()),
        }
    }

    /// Remove every item of the year list matching `predicate`. Used for delete
    /// propagation. Returns whether anything was removed
    pub fn evict<P>(&mut self, owner: Owner, year: i32, predicate: P) -> bool
    where
        P: Fn(&CalendarItem) -> bool,
    {
        let list = match self.cache.get_mut(&(owner, year)) {
            None => return false,
            Some(list) => list,
        };

        let before = list.len();
        list.retain(|item| predicate(item) == false);
        before != list.len()
    }

    pub fn clear_all(&mut self) {
        self.loaded.clear();
        self.cache.clear();
    }
}
