//! Shared helpers for the integration scenarios
// Not every scenario file uses every helper
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveTime};

use staff_rota::mock_behaviour::MockBehaviour;
use staff_rota::traits::{DirectoryEntry, RawItem, ScopeSource};
use staff_rota::{CalendarItem, InMemoryGateway, ItemKind, Provider};

/// The company every scenario is scoped to
pub const COMPANY: i64 = 5;
/// The signed-in user. Known as "Alice" in the participant directory
pub const SESSION_USER: i64 = 1;

/// All scenarios pin "today" to the same date: the override is process-global,
/// and tests within one binary run concurrently
pub const TODAY: (i32, u32, u32) = (2025, 3, 15);

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
    *staff_rota::settings::TODAY_OVERRIDE.lock().unwrap() = Some(date(TODAY.0, TODAY.1, TODAY.2));
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

/// A scope source returning a fixed company id (or none)
pub struct FixedScope(pub Option<i64>);

impl ScopeSource for FixedScope {
    fn current_scope_id(&self) -> Option<i64> {
        self.0
    }
}

/// A provider over a fresh in-memory gateway, scoped to [`COMPANY`]
pub fn provider() -> Provider<InMemoryGateway, FixedScope> {
    init();
    Provider::new(InMemoryGateway::new(), FixedScope(Some(COMPANY)), SESSION_USER)
}

/// A provider whose gateway behaves as `mock_behaviour` dictates
pub fn provider_with_behaviour(mock_behaviour: MockBehaviour) -> Provider<InMemoryGateway, FixedScope> {
    init();
    let gateway = InMemoryGateway::with_mock_behaviour(Arc::new(Mutex::new(mock_behaviour)));
    Provider::new(gateway, FixedScope(Some(COMPANY)), SESSION_USER)
}

/// A provider whose gateway fails every call, `n_fails` times
pub fn failing_provider(n_fails: u32) -> Provider<InMemoryGateway, FixedScope> {
    provider_with_behaviour(MockBehaviour::fail_now(n_fails))
}

/// A draft personal event, 9:00 to 10:00, not on the server yet
pub fn event(title: &str, year: i32, month: u32, day: u32) -> CalendarItem {
    CalendarItem::new(title.to_string(), ItemKind::Event, date(year, month, day), time(9, 0), time(10, 0))
}

/// A draft shift, 14:00 to 22:00, assigned to `participants`, not on the server yet
pub fn shift(title: &str, year: i32, month: u32, day: u32, participants: &[&str]) -> CalendarItem {
    let mut item = CalendarItem::new(title.to_string(), ItemKind::Shift, date(year, month, day), time(14, 0), time(22, 0));
    item.set_participants(participants.iter().map(|name| name.to_string()).collect());
    item
}

/// A server-side personal event record
pub fn raw_event(id: i64, year: i32, month: u32, day: u32) -> RawItem {
    RawItem {
        id,
        date: date(year, month, day),
        start_time: time(9, 0),
        end_time: time(10, 0),
        title: format!("Event {}", id),
        description: None,
        color: None,
        participant_ids: Vec::new(),
        company_id: None,
        kind: ItemKind::Event,
    }
}

/// A server-side shift record
pub fn raw_shift(id: i64, year: i32, month: u32, day: u32, participant_ids: &[i64], company_id: Option<i64>) -> RawItem {
    RawItem {
        id,
        date: date(year, month, day),
        start_time: time(14, 0),
        end_time: time(22, 0),
        title: format!("Shift {}", id),
        description: None,
        color: None,
        participant_ids: participant_ids.to_vec(),
        company_id,
        kind: ItemKind::Shift,
    }
}

/// The participant directory of [`COMPANY`]: Alice (the session user) and Bob
pub fn directory() -> Vec<DirectoryEntry> {
    vec![
        DirectoryEntry { id: 1, display_name: "Alice".to_string() },
        DirectoryEntry { id: 2, display_name: "Bob".to_string() },
    ]
}
