//! Organizational scope filtering
//!
//! The backend, not this client, is the authority for access control. The filter
//! here is deliberately fail-open: a record that does not expose a company id is
//! kept, and a caller without a scope id sees everything. An aggressive filter
//! would silently hide valid data whenever the backend's payload shape varies.

use crate::traits::RawItem;

/// Restrict `items` to the caller's organizational scope.
///
/// * `scope_id` is `None`: filtering is skipped entirely, everything is kept.
/// * A record has no `company_id`: it is kept.
/// * A record's `company_id` differs from `scope_id`: it is dropped.
pub fn filter_by_scope(scope_id: Option<i64>, items: Vec<RawItem>) -> Vec<RawItem> {
    let scope = match scope_id {
        None => return items,
        Some(scope) => scope,
    };

    items.into_iter()
        .filter(|item| match item.company_id {
            None => true,
            Some(company) => {
                if company != scope {
                    log::debug!("Dropping item {} from foreign company {}", item.id, company);
                }
                company == scope
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use chrono::{NaiveDate, NaiveTime};

    fn raw(id: i64, company_id: Option<i64>) -> RawItem {
        RawItem {
            id,
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            title: format!("Item {}", id),
            description: None,
            color: None,
            participant_ids: Vec::new(),
            company_id,
            kind: ItemKind::Shift,
        }
    }

    #[test]
    fn no_scope_keeps_everything() {
        let filtered = filter_by_scope(None, vec![raw(1, Some(5)), raw(2, Some(6)), raw(3, None)]);
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn foreign_scope_is_dropped() {
        let filtered = filter_by_scope(Some(5), vec![raw(1, Some(5)), raw(2, Some(6))]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);
    }

    #[test]
    fn missing_scope_id_is_kept() {
        let filtered = filter_by_scope(Some(5), vec![raw(1, None), raw(2, Some(6))]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);
    }
}
