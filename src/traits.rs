use std::collections::HashMap;
use std::error::Error;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use csscolorparser::Color;
use serde::{Deserialize, Serialize};

use crate::item::{CalendarItem, Collection, ItemId, ItemKind, Owner};

/// The time window a [`RemoteGateway::fetch_by_period`] call covers, anchored on the current date
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

/// The wire shape of a calendar item, as the scheduling backend returns it.
///
/// Participants are referenced by id here; they are resolved to display names
/// through the company directory when the record is converted to a [`CalendarItem`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub title: String,
    pub description: Option<String>,
    /// A CSS color string. Unparseable values degrade to no color
    pub color: Option<String>,
    pub participant_ids: Vec<i64>,
    /// The owning company, when the backend payload exposes it.
    /// Scope filtering is fail-open: records without this field are kept
    pub company_id: Option<i64>,
    pub kind: ItemKind,
}

impl RawItem {
    /// Convert this record to a [`CalendarItem`], resolving participant ids against `directory`.
    ///
    /// Ids missing from the directory are rendered as `#<id>` rather than dropped.
    pub fn into_item(self, directory: &HashMap<i64, String>) -> CalendarItem {
        let id = self.id;
        let color = self.color.and_then(|text| match text.parse::<Color>() {
            Ok(color) => Some(color),
            Err(err) => {
                log::warn!("Invalid color {:?} for item {}: {}. Ignoring it", text, id, err);
                None
            },
        });

        let participants = self.participant_ids.iter()
            .map(|id| match directory.get(id) {
                Some(name) => name.clone(),
                None => format!("#{}", id),
            })
            .collect();

        CalendarItem::new_with_parameters(
            ItemId::from(self.id),
            self.title,
            self.kind,
            self.date,
            self.start_time,
            self.end_time,
            self.description,
            color,
            participants,
        )
    }
}

/// One entry of a company's participant directory
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: i64,
    pub display_name: String,
}

/// The remote scheduling service.
///
/// This is the only seam through which this crate talks to the network. HTTP
/// transport, authentication and wire encoding all live behind it, in the
/// embedding application. \
/// Every method may be slow and may fail; the [`Provider`](crate::provider::Provider)
/// never lets a failure here corrupt its caches.
#[async_trait]
pub trait RemoteGateway {
    /// Fetch the items of `collection` owned by `owner` within `period`, anchored on the current date
    async fn fetch_by_period(&self, period: Period, owner: Owner, collection: Collection) -> Result<Vec<RawItem>, Box<dyn Error>>;

    /// Persist a new item. Returns the server-assigned id
    async fn create_item(&self, collection: Collection, item: &CalendarItem) -> Result<ItemId, Box<dyn Error>>;

    /// Replace the stored value of an existing item
    async fn patch_item(&self, collection: Collection, item: &CalendarItem) -> Result<(), Box<dyn Error>>;

    /// Delete an item
    async fn delete_item(&self, collection: Collection, id: ItemId) -> Result<(), Box<dyn Error>>;

    /// Fetch the participant directory of a company, used to resolve participant ids to display names
    async fn fetch_owner_directory(&self, company_id: i64) -> Result<Vec<DirectoryEntry>, Box<dyn Error>>;
}

/// Where the caller's organizational scope comes from.
///
/// The embedding application derives the scope id from its session credential;
/// this crate only consumes it. `None` means the caller has no company scope,
/// in which case scope filtering is skipped entirely.
pub trait ScopeSource {
    fn current_scope_id(&self) -> Option<i64>;
}
