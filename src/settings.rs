//! Support for library configuration options

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use once_cell::sync::Lazy;

/// Overrides the date this library considers to be "today" (used by the today-view
/// maintenance). `None` means the system clock is used.
/// Feel free to override it when initing this library, or from tests.
pub static TODAY_OVERRIDE: Lazy<Arc<Mutex<Option<NaiveDate>>>> = Lazy::new(|| Arc::new(Mutex::new(None)));

/// The current calendar day, honouring [`TODAY_OVERRIDE`]
pub fn today() -> NaiveDate {
    match *TODAY_OVERRIDE.lock().unwrap() {
        Some(date) => date,
        None => chrono::Local::now().date_naive(),
    }
}
