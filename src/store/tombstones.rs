//! Deletion markers that outlive the items they suppress
//!
//! A remote service may keep returning a deleted item for a while (eventual
//! consistency). Marking the id here makes every read suppress it until some
//! read observes the id gone from the authoritative base, at which point the
//! marker has served its purpose and is dropped.

use std::collections::HashSet;

use crate::item::{CalendarItem, ItemId};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TombstoneSet {
    ids: HashSet<ItemId>,
}

impl TombstoneSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the deletion of `id` has been requested
    pub fn mark_deleted(&mut self, id: ItemId) {
        self.ids.insert(id);
    }

    /// Forget the tombstone for `id` (the deletion was rolled back, or the marker
    /// no longer suppresses anything)
    pub fn clear(&mut self, id: ItemId) -> bool {
        self.ids.remove(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Remove every tombstoned item from `items`.
    ///
    /// Tombstones whose id does not appear in the unfiltered input are cleared:
    /// the authoritative base no longer carries them, so there is nothing left to
    /// suppress. A tombstoned id that does reappear (a late write-after-delete
    /// race) stays suppressed: the deletion intent wins.
    pub fn filter_suppressed(&mut self, items: &mut Vec<CalendarItem>) {
        if self.ids.is_empty() {
            return;
        }

        let present: HashSet<ItemId> = items.iter().map(|item| item.id()).collect();
        let served: Vec<ItemId> = self.ids.iter()
            .filter(|id| present.contains(*id) == false)
            .copied()
            .collect();
        for id in served {
            log::debug!("Tombstone for {} has served its purpose, clearing it", id);
            self.ids.remove(&id);
        }

        items.retain(|item| self.ids.contains(&item.id()) == false);
    }

    pub fn clear_all(&mut self) {
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use chrono::{NaiveDate, NaiveTime};

    fn item(id: i64) -> CalendarItem {
        CalendarItem::new_with_parameters(
            ItemId::from(id),
            format!("Item {}", id),
            ItemKind::Shift,
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            None, None, Vec::new(),
        )
    }

    #[test]
    fn tombstoned_items_are_suppressed() {
        let mut tombstones = TombstoneSet::new();
        tombstones.mark_deleted(ItemId::from(2));

        let mut items = vec![item(1), item(2), item(3)];
        tombstones.filter_suppressed(&mut items);

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.id() != ItemId::from(2)));
        // the base still carries id 2, so the tombstone must keep suppressing it
        assert!(tombstones.contains(ItemId::from(2)));
    }

    #[test]
    fn a_tombstone_is_cleared_once_the_base_forgot_the_id() {
        let mut tombstones = TombstoneSet::new();
        tombstones.mark_deleted(ItemId::from(2));

        let mut items = vec![item(1), item(3)];
        tombstones.filter_suppressed(&mut items);

        assert_eq!(items.len(), 2);
        assert!(tombstones.is_empty());
    }

    #[test]
    fn filtering_without_tombstones_is_a_noop() {
        let mut tombstones = TombstoneSet::new();
        let mut items = vec![item(1)];
        tombstones.filter_suppressed(&mut items);
        assert_eq!(items.len(), 1);
    }
}
