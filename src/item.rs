//! Calendar items (personal events and work shifts)

use std::fmt::{Display, Formatter};

use chrono::{Datelike, NaiveDate, NaiveTime};
use csscolorparser::Color;
use serde::{Deserialize, Serialize};

/// The identifier of a [`CalendarItem`].
///
/// Non-negative ids have been confirmed by the server. \
/// Negative ids are temporary: they are minted locally by
/// [`Provider::create`](crate::provider::Provider::create) and are replaced by the
/// server-assigned id as soon as the remote service confirms the creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId {
    content: i64,
}

impl ItemId {
    /// The placeholder id of an item that has not been handed to [`Provider::create`](crate::provider::Provider::create) yet
    pub const UNSAVED: ItemId = ItemId { content: 0 };

    /// Whether this id was minted locally and is still awaiting server confirmation
    pub fn is_temporary(&self) -> bool {
        self.content < 0
    }

    pub fn as_i64(&self) -> i64 {
        self.content
    }
}

impl From<i64> for ItemId {
    fn from(content: i64) -> Self {
        Self { content }
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.content)
    }
}

/// Whether an item is a personal event or a work shift
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Event,
    Shift,
}

/// The three collections this crate caches independently.
///
/// Each collection has its own slice index, tombstone set and pending buckets;
/// ids are unique within one collection but may repeat across collections
/// (a shift assigned to the session user typically appears both in
/// `CompanyShifts` and in `UserShifts` under the same server id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    /// The session user's personal events
    UserEvents,
    /// The session user's own shift assignments
    UserShifts,
    /// The company-wide shift roster
    CompanyShifts,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::UserEvents,
        Collection::UserShifts,
        Collection::CompanyShifts,
    ];
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Collection::UserEvents => write!(f, "user events"),
            Collection::UserShifts => write!(f, "user shifts"),
            Collection::CompanyShifts => write!(f, "company shifts"),
        }
    }
}

/// Who a fetched list of items belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerKind {
    User,
    Company,
}

/// An owner of calendar data: a user (personal events, own shift assignments)
/// or a company (the company-wide shift roster)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    pub kind: OwnerKind,
    pub id: i64,
}

impl Owner {
    pub fn user(id: i64) -> Self {
        Self { kind: OwnerKind::User, id }
    }

    pub fn company(id: i64) -> Self {
        Self { kind: OwnerKind::Company, id }
    }
}

impl Display for Owner {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self.kind {
            OwnerKind::User => write!(f, "user {}", self.id),
            OwnerKind::Company => write!(f, "company {}", self.id),
        }
    }
}

/// A `(year, month)` pair, the key of one slice of a collection.
///
/// `month0` is 0-indexed (January is 0), like `chrono::Datelike::month0`.
/// The derived `Ord` is chronological, which is what slice eviction relies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month0: u32,
}

impl MonthKey {
    pub fn new(year: i32, month0: u32) -> Self {
        debug_assert!(month0 < 12);
        Self { year, month0 }
    }

    /// The key of the month `date` falls in
    pub fn of(date: NaiveDate) -> Self {
        Self { year: date.year(), month0: date.month0() }
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{:04}-{:02}", self.year, self.month0 + 1)
    }
}

/// A calendar item: a personal event or a work shift
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarItem {
    /// The item id. See [`ItemId`] for the temporary-id convention
    id: ItemId,

    /// The calendar day this item falls on (no time component)
    date: NaiveDate,
    /// Start of the item, local wall clock
    start_time: NaiveTime,
    /// End of the item, local wall clock
    end_time: NaiveTime,

    /// The display title
    title: String,
    description: Option<String>,
    /// The display color, when the backend provides one
    color: Option<Color>,

    /// Display names of the people taking part (shift assignees, event attendees)
    participants: Vec<String>,

    kind: ItemKind,
}

impl CalendarItem {
    /// Create a brand new item that is not on the server yet.
    ///
    /// Its id is [`ItemId::UNSAVED`] until it is handed to
    /// [`Provider::create`](crate::provider::Provider::create), which mints a temporary id for it.
    pub fn new(title: String, kind: ItemKind, date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self::new_with_parameters(ItemId::UNSAVED, title, kind, date, start_time, end_time, None, None, Vec::new())
    }

    /// Create an item instance that may exist on the server already
    pub fn new_with_parameters(id: ItemId, title: String, kind: ItemKind,
                               date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime,
                               description: Option<String>, color: Option<Color>,
                               participants: Vec<String>,
                            ) -> Self
    {
        Self {
            id,
            date,
            start_time,
            end_time,
            title,
            description,
            color,
            participants,
            kind,
        }
    }

    pub fn id(&self) -> ItemId             { self.id                       }
    pub fn date(&self) -> NaiveDate        { self.date                     }
    pub fn start_time(&self) -> NaiveTime  { self.start_time               }
    pub fn end_time(&self) -> NaiveTime    { self.end_time                 }
    pub fn title(&self) -> &str            { &self.title                   }
    pub fn description(&self) -> Option<&str>  { self.description.as_deref()   }
    pub fn color(&self) -> Option<&Color>  { self.color.as_ref()           }
    pub fn participants(&self) -> &[String] { &self.participants           }
    pub fn kind(&self) -> ItemKind         { self.kind                     }

    /// The key of the slice this item belongs to
    pub fn month_key(&self) -> MonthKey {
        MonthKey::of(self.date)
    }

    /// Rewrite the id of this item.
    ///
    /// This is how a temporary id is promoted to the server-assigned one once the
    /// remote service confirms a creation.
    pub fn set_id(&mut self, id: ItemId) {
        self.id = id;
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
    }

    pub fn set_times(&mut self, start_time: NaiveTime, end_time: NaiveTime) {
        self.start_time = start_time;
        self.end_time = end_time;
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn set_color(&mut self, color: Option<Color>) {
        self.color = color;
    }

    pub fn set_participants(&mut self, participants: Vec<String>) {
        self.participants = participants;
    }
}
