//! The month-keyed index of a collection

use std::collections::HashMap;

use crate::item::{CalendarItem, ItemId, MonthKey};
use crate::utils::sort_chronologically;

/// How many distinct `(year, month)` keys a slice index may hold.
/// Insertions beyond this evict the chronologically oldest keys first.
pub const MAX_MONTH_KEYS: usize = 12;

/// Maps `(year, month)` to the ordered list of items visible in that month.
///
/// This structure never contacts the network; it is pure in-memory bookkeeping.
/// Writes go through [`index`](SliceIndex::index) (whole-bucket overwrites) or
/// the single-item [`upsert`](SliceIndex::upsert)/[`remove`](SliceIndex::remove)
/// used when a mutation is reconciled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SliceIndex {
    buckets: HashMap<MonthKey, Vec<CalendarItem>>,
}

impl SliceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group `items` by the month of their date and overwrite the corresponding
    /// buckets. Last writer wins per bucket, not per item: callers must pass the
    /// full bucket contents, not a delta.
    pub fn index(&mut self, items: &[CalendarItem]) {
        let mut grouped: HashMap<MonthKey, Vec<CalendarItem>> = HashMap::new();
        for item in items {
            grouped.entry(item.month_key()).or_default().push(item.clone());
        }

        for (key, mut bucket) in grouped {
            sort_chronologically(&mut bucket);
            self.buckets.insert(key, bucket);
        }

        self.evict_oldest_beyond(MAX_MONTH_KEYS);
    }

    /// Overwrite one bucket with exactly `items`, even when `items` is empty
    /// (an empty fetch result means "this month is known to be empty", which
    /// `index` alone cannot express).
    pub fn replace_bucket(&mut self, key: MonthKey, mut items: Vec<CalendarItem>) {
        sort_chronologically(&mut items);
        self.buckets.insert(key, items);
        self.evict_oldest_beyond(MAX_MONTH_KEYS);
    }

    /// The bucket for `key`, or empty if that month has never been indexed
    pub fn read(&self, key: MonthKey) -> Vec<CalendarItem> {
        self.buckets.get(&key).cloned().unwrap_or_default()
    }

    /// Insert `item` into the bucket of its own month, replacing any entry with
    /// the same id
    pub fn upsert(&mut self, item: &CalendarItem) {
        let bucket = self.buckets.entry(item.month_key()).or_default();
        bucket.retain(|existing| existing.id() != item.id());
        bucket.push(item.clone());
        sort_chronologically(bucket);
        self.evict_oldest_beyond(MAX_MONTH_KEYS);
    }

    /// Remove the item with `id` from the bucket for `key`, if present
    pub fn remove(&mut self, key: MonthKey, id: ItemId) {
        if let Some(bucket) = self.buckets.get_mut(&key) {
            bucket.retain(|item| item.id() != id);
        }
    }

    /// Drop the chronologically oldest keys until at most `max` remain
    pub fn evict_oldest_beyond(&mut self, max: usize) {
        if self.buckets.len() <= max {
            return;
        }

        let mut keys: Vec<MonthKey> = self.buckets.keys().copied().collect();
        keys.sort();
        let excess = self.buckets.len() - max;
        for key in keys.into_iter().take(excess) {
            log::debug!("Evicting stale slice {}", key);
            self.buckets.remove(&key);
        }
    }

    /// How many distinct month keys are currently held
    pub fn month_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use chrono::{NaiveDate, NaiveTime};

    fn item(id: i64, year: i32, month: u32, day: u32) -> CalendarItem {
        CalendarItem::new_with_parameters(
            ItemId::from(id),
            format!("Item {}", id),
            ItemKind::Event,
            NaiveDate::from_ymd_opt(year, month, day).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            None, None, Vec::new(),
        )
    }

    #[test]
    fn buckets_are_keyed_by_the_item_date() {
        let mut index = SliceIndex::new();
        index.index(&[item(1, 2025, 3, 10), item(2, 2025, 3, 20), item(3, 2025, 4, 1)]);

        assert_eq!(index.read(MonthKey::new(2025, 2)).len(), 2);
        assert_eq!(index.read(MonthKey::new(2025, 3)).len(), 1);
        assert_eq!(index.read(MonthKey::new(2025, 0)).len(), 0);
    }

    #[test]
    fn indexing_overwrites_whole_buckets() {
        let mut index = SliceIndex::new();
        index.index(&[item(1, 2025, 3, 10), item(2, 2025, 3, 20)]);
        index.index(&[item(3, 2025, 3, 5)]);

        let march = index.read(MonthKey::new(2025, 2));
        assert_eq!(march.len(), 1);
        assert_eq!(march[0].id(), ItemId::from(3));
    }

    #[test]
    fn never_more_than_twelve_month_keys() {
        let mut index = SliceIndex::new();
        for month in 1..=12 {
            index.index(&[item(month as i64, 2024, month, 1)]);
        }
        for month in 1..=8 {
            index.index(&[item(100 + month as i64, 2025, month, 1)]);
        }

        assert_eq!(index.month_count(), MAX_MONTH_KEYS);
        // the oldest keys are the ones that went away
        assert!(index.read(MonthKey::new(2024, 0)).is_empty());
        assert!(index.read(MonthKey::new(2024, 7)).is_empty());
        // the newest are still there
        assert_eq!(index.read(MonthKey::new(2025, 7)).len(), 1);
        assert_eq!(index.read(MonthKey::new(2024, 8)).len(), 1);
    }

    #[test]
    fn buckets_are_ordered() {
        let mut index = SliceIndex::new();
        index.index(&[item(3, 2025, 3, 20), item(1, 2025, 3, 5), item(2, 2025, 3, 10)]);

        let ids: Vec<ItemId> = index.read(MonthKey::new(2025, 2)).iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec![ItemId::from(1), ItemId::from(2), ItemId::from(3)]);
    }

    #[test]
    fn upsert_replaces_by_id() {
        let mut index = SliceIndex::new();
        index.index(&[item(1, 2025, 3, 10)]);

        let mut changed = item(1, 2025, 3, 10);
        changed.set_title("Renamed".to_string());
        index.upsert(&changed);

        let march = index.read(MonthKey::new(2025, 2));
        assert_eq!(march.len(), 1);
        assert_eq!(march[0].title(), "Renamed");
    }

    #[test]
    fn replace_bucket_can_empty_a_month() {
        let mut index = SliceIndex::new();
        index.index(&[item(1, 2025, 3, 10)]);
        index.replace_bucket(MonthKey::new(2025, 2), Vec::new());
        assert!(index.read(MonthKey::new(2025, 2)).is_empty());
    }
}
