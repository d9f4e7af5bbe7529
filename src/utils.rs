///! Some utility functions

use crate::item::CalendarItem;

/// Sort items the way every read of this crate returns them: by date, then start
/// time, then id. Reads are idempotent because this order is deterministic.
pub fn sort_chronologically(items: &mut [CalendarItem]) {
    items.sort_by(|a, b| {
        (a.date(), a.start_time(), a.id())
            .cmp(&(b.date(), b.start_time(), b.id()))
    });
}

/// A debug utility that pretty-prints a list of items
pub fn print_items(title: &str, items: &[CalendarItem]) {
    println!("{} ({} items)", title, items.len());
    for item in items {
        print_item(item);
    }
}

pub fn print_item(item: &CalendarItem) {
    let sync = if item.id().is_temporary() { "~" } else { "=" };
    println!("    {}{} {} {}-{}\t{}", sync, item.id(), item.date(), item.start_time(), item.end_time(), item.title());
}
