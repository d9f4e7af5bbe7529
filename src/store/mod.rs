//! The owned, in-memory cache state
//!
//! All local state lives in one [`CacheStore`] owned by the
//! [`Provider`](crate::provider::Provider): created at session start, cleared on
//! account or company switch, never persisted (cache state is scoped to process
//! lifetime). Nothing here contacts the network.

pub mod slice_index;
pub mod year_cache;
pub mod tombstones;
pub mod pending;

use chrono::Datelike;

use crate::item::{CalendarItem, Collection, MonthKey, Owner};
use crate::utils::sort_chronologically;
use pending::PendingBuckets;
use slice_index::SliceIndex;
use tombstones::TombstoneSet;
use year_cache::YearCache;

/// The cache state of one collection: its month slices, its full-year lists,
/// its deletion markers and its optimistic holding area
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectionCache {
    pub slice: SliceIndex,
    pub years: YearCache,
    pub tombstones: TombstoneSet,
    pub pending: PendingBuckets,
}

impl CollectionCache {
    /// Compute the merged view of one month: the indexed base, minus tombstoned
    /// ids, plus the still-unconfirmed pending entries, in chronological order.
    ///
    /// Aside from the monotonic tombstone/pending cleanup this performs no cache
    /// mutation, which is what makes repeated reads idempotent.
    pub fn read_month(&mut self, key: MonthKey) -> Vec<CalendarItem> {
        let mut base = self.slice.read(key);
        self.tombstones.filter_suppressed(&mut base);
        self.pending.merge_into_base(&mut base, key);
        sort_chronologically(&mut base);
        base
    }

    /// Store a freshly fetched full year and re-derive the slice buckets from it
    pub fn put_year(&mut self, owner: Owner, year: i32, items: Vec<CalendarItem>) {
        self.slice.index(&items);
        self.years.put(owner, year, items);
    }

    /// Absorb a server-confirmed item into the year list and the slice index.
    ///
    /// When the owner's year is materialized the slice buckets are re-derived
    /// from it, so both structures stay consistent; otherwise the item is
    /// upserted into its month bucket directly.
    pub fn absorb_confirmed(&mut self, owner: Option<Owner>, item: &CalendarItem) {
        if let Some(owner) = owner {
            let year = item.date().year();
            if self.years.has(owner, year) {
                self.years.upsert(owner, year, item);
                let list = self.years.get(owner, year);
                self.slice.index(&list);
                return;
            }
        }
        self.slice.upsert(item);
    }

    /// Absorb a confirmed patch, migrating the item between month buckets (and
    /// between year lists) when its date moved
    pub fn absorb_patched(&mut self, owner: Option<Owner>, prior: &CalendarItem, updated: &CalendarItem) {
        let old_key = prior.month_key();
        let new_key = updated.month_key();
        if old_key != new_key {
            self.slice.remove(old_key, prior.id());
        }

        if let Some(owner) = owner {
            let old_year = prior.date().year();
            let new_year = updated.date().year();
            if old_year != new_year {
                self.years.evict(owner, old_year, |i| i.id() == prior.id());
            }
        }

        self.absorb_confirmed(owner, updated);
    }

    /// Remove `item` from the year list and its month bucket. Used for delete
    /// propagation to other owners' caches
    pub fn evict_item(&mut self, owner: Option<Owner>, item: &CalendarItem) {
        if let Some(owner) = owner {
            self.years.evict(owner, item.date().year(), |i| i.id() == item.id());
        }
        self.slice.remove(item.month_key(), item.id());
    }

    pub fn clear(&mut self) {
        self.slice.clear();
        self.years.clear_all();
        self.tombstones.clear_all();
        self.pending.clear_all();
    }
}

/// All cache state of a session, one [`CollectionCache`] per collection
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CacheStore {
    user_events: CollectionCache,
    user_shifts: CollectionCache,
    company_shifts: CollectionCache,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(&self, collection: Collection) -> &CollectionCache {
        match collection {
            Collection::UserEvents => &self.user_events,
            Collection::UserShifts => &self.user_shifts,
            Collection::CompanyShifts => &self.company_shifts,
        }
    }

    pub fn collection_mut(&mut self, collection: Collection) -> &mut CollectionCache {
        match collection {
            Collection::UserEvents => &mut self.user_events,
            Collection::UserShifts => &mut self.user_shifts,
            Collection::CompanyShifts => &mut self.company_shifts,
        }
    }

    /// Full reset, e.g. on account or company switch
    pub fn clear_all(&mut self) {
        for collection in Collection::ALL.iter() {
            self.collection_mut(*collection).clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemId, ItemKind};
    use chrono::{NaiveDate, NaiveTime};

    fn item(id: i64, year: i32, month: u32, day: u32) -> CalendarItem {
        CalendarItem::new_with_parameters(
            ItemId::from(id),
            format!("Item {}", id),
            ItemKind::Shift,
            NaiveDate::from_ymd_opt(year, month, day).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            None, None, Vec::new(),
        )
    }

    #[test]
    fn read_month_merges_pending_entries() {
        let mut cache = CollectionCache::default();
        let key = MonthKey::new(2025, 2);
        cache.slice.index(&[item(1, 2025, 3, 10)]);
        cache.pending.add(key, item(-5, 2025, 3, 12));

        let merged = cache.read_month(key);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id(), ItemId::from(1));
        assert_eq!(merged[1].id(), ItemId::from(-5));
    }

    #[test]
    fn absorb_confirmed_rederives_a_loaded_year() {
        let mut cache = CollectionCache::default();
        let owner = Owner::user(1);
        cache.put_year(owner, 2025, vec![item(1, 2025, 3, 10)]);

        cache.absorb_confirmed(Some(owner), &item(2, 2025, 3, 20));

        assert_eq!(cache.years.get(owner, 2025).len(), 2);
        assert_eq!(cache.slice.read(MonthKey::new(2025, 2)).len(), 2);
    }

    #[test]
    fn absorb_patched_migrates_between_months() {
        let mut cache = CollectionCache::default();
        let owner = Owner::user(1);
        let prior = item(1, 2025, 3, 10);
        cache.put_year(owner, 2025, vec![prior.clone()]);

        let updated = item(1, 2025, 4, 2);
        cache.absorb_patched(Some(owner), &prior, &updated);

        assert!(cache.slice.read(MonthKey::new(2025, 2)).is_empty());
        assert_eq!(cache.slice.read(MonthKey::new(2025, 3)).len(), 1);
        assert_eq!(cache.years.get(owner, 2025).len(), 1);
    }

    #[test]
    fn clear_all_resets_every_collection() {
        let mut store = CacheStore::new();
        store.collection_mut(Collection::UserEvents).slice.index(&[item(1, 2025, 3, 10)]);
        store.collection_mut(Collection::CompanyShifts).tombstones.mark_deleted(ItemId::from(7));

        store.clear_all();

        assert_eq!(store.collection(Collection::UserEvents).slice.month_count(), 0);
        assert!(store.collection(Collection::CompanyShifts).tombstones.is_empty());
    }
}
