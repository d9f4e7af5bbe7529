//! An in-memory stand-in for the remote scheduling service
//!
//! Integration tests use this the way a real deployment would use an HTTP
//! gateway: seed it with records, hand it to a
//! [`Provider`](crate::provider::Provider), optionally make it fail on demand
//! through a [`MockBehaviour`](crate::mock_behaviour::MockBehaviour).

use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Datelike, Duration};

use crate::item::{CalendarItem, Collection, ItemId, Owner};
use crate::mock_behaviour::MockBehaviour;
use crate::settings;
use crate::traits::{DirectoryEntry, Period, RawItem, RemoteGateway};

/// A gateway backed by plain in-memory collections.
///
/// The store is single-tenant: the `owner` argument of fetches is not used to
/// partition data, collections are. Period windows are anchored on the current
/// date, like the real backend anchors them on the request date.
#[derive(Debug)]
pub struct InMemoryGateway {
    items: Mutex<HashMap<Collection, Vec<RawItem>>>,
    directory: Mutex<Vec<DirectoryEntry>>,
    next_server_id: Mutex<i64>,
    mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            directory: Mutex::new(Vec::new()),
            next_server_id: Mutex::new(1),
            mock_behaviour: None,
        }
    }

    pub fn with_mock_behaviour(mock_behaviour: Arc<Mutex<MockBehaviour>>) -> Self {
        let mut gateway = Self::new();
        gateway.mock_behaviour = Some(mock_behaviour);
        gateway
    }

    /// Replace the stored records of `collection`
    pub fn seed_items(&self, collection: Collection, items: Vec<RawItem>) {
        self.items.lock().unwrap().insert(collection, items);
    }

    /// Replace the participant directory
    pub fn seed_directory(&self, entries: Vec<DirectoryEntry>) {
        *self.directory.lock().unwrap() = entries;
    }

    /// Choose the id the next `create_item` call will assign
    pub fn set_next_server_id(&self, id: i64) {
        *self.next_server_id.lock().unwrap() = id;
    }

    /// The current records of `collection`, for test assertions
    pub fn items(&self, collection: Collection) -> Vec<RawItem> {
        self.items.lock().unwrap().get(&collection).cloned().unwrap_or_default()
    }

    pub fn contains(&self, collection: Collection, id: i64) -> bool {
        self.items(collection).iter().any(|item| item.id == id)
    }

    fn raw_from_item(&self, item: &CalendarItem, id: i64) -> RawItem {
        // participant names go back to ids through the directory; unknown names are dropped
        let directory = self.directory.lock().unwrap();
        let participant_ids = item.participants().iter()
            .filter_map(|name| {
                directory.iter()
                    .find(|entry| &entry.display_name == name)
                    .map(|entry| entry.id)
            })
            .collect();

        RawItem {
            id,
            date: item.date(),
            start_time: item.start_time(),
            end_time: item.end_time(),
            title: item.title().to_string(),
            description: item.description().map(|d| d.to_string()),
            color: item.color().map(|c| c.to_hex_string()),
            participant_ids,
            company_id: None,
            kind: item.kind(),
        }
    }
}

fn in_period(period: Period, date: chrono::NaiveDate) -> bool {
    let today = settings::today();
    match period {
        Period::Day => date == today,
        Period::Week => {
            let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
            date >= monday && date < monday + Duration::days(7)
        },
        Period::Month => date.year() == today.year() && date.month() == today.month(),
        Period::Year => date.year() == today.year(),
    }
}

#[async_trait]
impl RemoteGateway for InMemoryGateway {
    async fn fetch_by_period(&self, period: Period, _owner: Owner, collection: Collection) -> Result<Vec<RawItem>, Box<dyn Error>> {
        if let Some(mock) = &self.mock_behaviour {
            mock.lock().unwrap().can_fetch_by_period()?;
        }

        let items = self.items.lock().unwrap();
        Ok(items.get(&collection)
            .map(|list| {
                list.iter()
                    .filter(|item| in_period(period, item.date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create_item(&self, collection: Collection, item: &CalendarItem) -> Result<ItemId, Box<dyn Error>> {
        if let Some(mock) = &self.mock_behaviour {
            mock.lock().unwrap().can_create_item()?;
        }

        let id = {
            let mut next = self.next_server_id.lock().unwrap();
            let id = *next;
            *next = *next + 1;
            id
        };

        let raw = self.raw_from_item(item, id);
        self.items.lock().unwrap().entry(collection).or_default().push(raw);
        Ok(ItemId::from(id))
    }

    async fn patch_item(&self, collection: Collection, item: &CalendarItem) -> Result<(), Box<dyn Error>> {
        if let Some(mock) = &self.mock_behaviour {
            mock.lock().unwrap().can_patch_item()?;
        }

        let raw = self.raw_from_item(item, item.id().as_i64());
        let mut items = self.items.lock().unwrap();
        let list = items.entry(collection).or_default();
        match list.iter_mut().find(|existing| existing.id == raw.id) {
            None => Err(format!("No item with id {} in {}", raw.id, collection).into()),
            Some(existing) => {
                *existing = raw;
                Ok(())
            },
        }
    }

    async fn delete_item(&self, collection: Collection, id: ItemId) -> Result<(), Box<dyn Error>> {
        if let Some(mock) = &self.mock_behaviour {
            mock.lock().unwrap().can_delete_item()?;
        }

        let mut items = self.items.lock().unwrap();
        let list = items.entry(collection).or_default();
        let before = list.len();
        list.retain(|item| item.id != id.as_i64());
        if list.len() == before {
            return Err(format!("No item with id {} in {}", id, collection).into());
        }
        Ok(())
    }

    async fn fetch_owner_directory(&self, _company_id: i64) -> Result<Vec<DirectoryEntry>, Box<dyn Error>> {
        if let Some(mock) = &self.mock_behaviour {
            mock.lock().unwrap().can_fetch_owner_directory()?;
        }

        Ok(self.directory.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use chrono::{NaiveDate, NaiveTime};

    fn raw(id: i64, year: i32, month: u32, day: u32) -> RawItem {
        RawItem {
            id,
            date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            title: format!("Item {}", id),
            description: None,
            color: None,
            participant_ids: Vec::new(),
            company_id: None,
            kind: ItemKind::Shift,
        }
    }

    #[tokio::test]
    async fn fetches_are_period_scoped() {
        *crate::settings::TODAY_OVERRIDE.lock().unwrap() = Some(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());

        let gateway = InMemoryGateway::new();
        gateway.seed_items(Collection::CompanyShifts, vec![
            raw(1, 2025, 3, 15),
            raw(2, 2025, 3, 1),
            raw(3, 2025, 6, 1),
            raw(4, 2024, 3, 15),
        ]);

        let owner = Owner::company(5);
        let day = gateway.fetch_by_period(Period::Day, owner, Collection::CompanyShifts).await.unwrap();
        assert_eq!(day.len(), 1);
        let month = gateway.fetch_by_period(Period::Month, owner, Collection::CompanyShifts).await.unwrap();
        assert_eq!(month.len(), 2);
        let year = gateway.fetch_by_period(Period::Year, owner, Collection::CompanyShifts).await.unwrap();
        assert_eq!(year.len(), 3);
    }

    #[tokio::test]
    async fn deleting_an_unknown_id_fails() {
        let gateway = InMemoryGateway::new();
        assert!(gateway.delete_item(Collection::UserEvents, ItemId::from(12)).await.is_err());
    }
}
