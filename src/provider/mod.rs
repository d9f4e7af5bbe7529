//! This module merges the remote scheduling service and the local optimistic state
//! into one virtual source
//!
//! Every mutation follows the same optimistic-transaction pattern: the in-memory
//! state is changed synchronously (the caller sees the effect immediately, before
//! the network call is even issued), then the gateway call is awaited, then the
//! outcome is reconciled — a confirmed item is promoted into every cache it
//! appears in, a failure undoes the optimistic change. Rollback is plain
//! synchronous code over the optimistic state, so it does not depend on how the
//! caller schedules these futures.

use std::collections::HashMap;
use std::error::Error;

use chrono::Datelike;

use crate::item::{CalendarItem, Collection, ItemId, MonthKey, Owner};
use crate::scope;
use crate::settings;
use crate::store::CacheStore;
use crate::traits::{Period, RawItem, RemoteGateway, ScopeSource};
use crate::utils::sort_chronologically;

/// The synchronisation engine of a session.
///
/// `R` is usually a real HTTP gateway in the embedding application;
/// integration tests use an [`InMemoryGateway`](crate::InMemoryGateway) instead. \
/// All cache state is owned here: created with the provider at session start,
/// dropped with it, cleared by [`clear_all_caches`](Provider::clear_all_caches)
/// on account or company switch. Nothing is ever persisted.
///
/// Every method takes `&mut self`: cache mutation is fully serialized by the
/// borrow checker, which is what the single-writer model of this crate relies on.
pub struct Provider<R, S>
where
    R: RemoteGateway,
    S: ScopeSource,
{
    gateway: R,
    scope: S,
    /// The id of the signed-in user, the owner of the user-events and user-shifts collections
    session_user: i64,

    store: CacheStore,

    /// What the caller currently sees, per collection
    visible: HashMap<Collection, Vec<CalendarItem>>,
    /// The month each collection is currently showing, so mutations can refresh it
    shown: HashMap<Collection, MonthKey>,
    /// The merged "today" view across all collections
    today: Vec<CalendarItem>,

    /// Participant directory of the scoped company, `id → display name`
    directory: HashMap<i64, String>,

    /// The next temporary id to mint; decremented at every create so temporary ids stay unique
    next_temp_id: i64,
}

impl<R, S> Provider<R, S>
where
    R: RemoteGateway,
    S: ScopeSource,
{
    /// Create a provider with empty caches. Call this at session start
    pub fn new(gateway: R, scope: S, session_user: i64) -> Self {
        Self {
            gateway,
            scope,
            session_user,
            store: CacheStore::new(),
            visible: HashMap::new(),
            shown: HashMap::new(),
            today: Vec::new(),
            directory: HashMap::new(),
            next_temp_id: -1,
        }
    }

    /// Returns the gateway this provider talks to
    pub fn gateway(&self) -> &R {
        &self.gateway
    }

    /// Returns the cache store.
    ///
    /// Apart from tests, there are very few (if any) reasons to inspect it directly.
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn session_user(&self) -> i64 {
        self.session_user
    }

    /// The items the caller currently sees for `collection`
    pub fn visible(&self, collection: Collection) -> &[CalendarItem] {
        self.visible.get(&collection).map(|list| list.as_slice()).unwrap_or(&[])
    }

    /// The merged "today" view across all collections
    pub fn today(&self) -> &[CalendarItem] {
        &self.today
    }

    /// Replace the visible collection with the merged view of one month.
    ///
    /// This never contacts the network: it reads the indexed base, suppresses
    /// tombstoned ids and merges the still-unconfirmed pending entries. Calling
    /// it twice with no intervening mutation yields the same ordered result.
    pub fn show_month(&mut self, collection: Collection, year: i32, month0: u32) -> &[CalendarItem] {
        let key = MonthKey::new(year, month0);
        let items = self.store.collection_mut(collection).read_month(key);
        self.shown.insert(collection, key);
        self.visible.insert(collection, items);
        self.visible(collection)
    }

    /// Recompute the "today" view from the caches. No network
    pub fn refresh_today(&mut self) {
        let date = settings::today();
        let key = MonthKey::of(date);

        let mut items = Vec::new();
        for collection in Collection::ALL.iter() {
            let month = self.store.collection_mut(*collection).read_month(key);
            items.extend(month.into_iter().filter(|item| item.date() == date));
        }
        sort_chronologically(&mut items);
        // the same shift can surface both from the company roster and from the
        // user's own assignments, under the same server id
        items.dedup_by(|a, b| a.id() == b.id() && a.kind() == b.kind());
        self.today = items;
    }

    /// Full reset, e.g. on account or company switch
    pub fn clear_all_caches(&mut self) {
        log::debug!("Clearing every cache");
        self.store.clear_all();
        self.visible.clear();
        self.shown.clear();
        self.today.clear();
        self.directory.clear();
    }

    /// Fetch the current year of `collection` unless it is already cached, and
    /// re-derive the month slices from it.
    ///
    /// On failure the caches are left untouched and the error is surfaced.
    pub async fn load_year(&mut self, collection: Collection) -> Result<(), Box<dyn Error>> {
        let year = settings::today().year();
        let owner = self.owner_of(collection)
            .ok_or_else(|| format!("Cannot fetch {} without a company scope", collection))?;

        if self.store.collection(collection).years.has(owner, year) {
            log::debug!("Year {} of {} is already loaded for {}", year, collection, owner);
            return Ok(());
        }

        let raws = self.gateway.fetch_by_period(Period::Year, owner, collection).await?;
        let items = self.absorbable_items(raws).await;
        self.store.collection_mut(collection).put_year(owner, year, items);
        self.reapply_shown(collection);
        Ok(())
    }

    /// Fetch the current month of `collection` and overwrite its slice bucket.
    ///
    /// Skipped when the year cache already covers it (no redundant fetch).
    /// On failure the caches are left untouched and the error is surfaced.
    pub async fn load_month(&mut self, collection: Collection) -> Result<(), Box<dyn Error>> {
        let today = settings::today();
        let key = MonthKey::of(today);
        let owner = self.owner_of(collection)
            .ok_or_else(|| format!("Cannot fetch {} without a company scope", collection))?;

        if self.store.collection(collection).years.has(owner, today.year()) {
            log::debug!("Month {} of {} is covered by the year cache", key, collection);
            self.reapply_shown(collection);
            return Ok(());
        }

        let raws = self.gateway.fetch_by_period(Period::Month, owner, collection).await?;
        let items = self.absorbable_items(raws).await;
        let (in_month, spill): (Vec<CalendarItem>, Vec<CalendarItem>) =
            items.into_iter().partition(|item| item.month_key() == key);

        let cache = self.store.collection_mut(collection);
        cache.slice.replace_bucket(key, in_month);
        if spill.is_empty() == false {
            cache.slice.index(&spill);
        }
        self.reapply_shown(collection);
        Ok(())
    }

    /// Create `item` in `collection`.
    ///
    /// The item is visible to the caller (under a temporary negative id) before
    /// the gateway call is issued. On success the returned item carries the
    /// server-assigned id and has replaced the temporary one in every cache; on
    /// failure no trace of it is left behind.
    pub async fn create(&mut self, collection: Collection, mut item: CalendarItem) -> Result<CalendarItem, Box<dyn Error>> {
        let temp_id = self.mint_temp_id();
        item.set_id(temp_id);
        let key = item.month_key();
        log::debug!("Creating {:?} in {} under temporary id {}", item.title(), collection, temp_id);

        self.insert_visible(collection, item.clone());
        self.store.collection_mut(collection).pending.add(key, item.clone());
        self.insert_today(&item);

        match self.gateway.create_item(collection, &item).await {
            Ok(server_id) => {
                let mut confirmed = item;
                confirmed.set_id(server_id);
                self.promote_confirmed(collection, temp_id, &confirmed);
                if collection == Collection::CompanyShifts {
                    self.ensure_directory().await;
                    self.propagate_company_upsert(&confirmed);
                }
                Ok(confirmed)
            },
            Err(err) => {
                self.rollback_create(collection, temp_id, key);
                Err(format!("Unable to create item in {}: {}", collection, err).into())
            },
        }
    }

    /// Replace the item with `updated.id()` by `updated`.
    ///
    /// A patch for an id this provider does not hold is a no-op: it indicates a
    /// desync in the calling layer, not a server problem. \
    /// On failure the previous value is restored in full.
    pub async fn patch(&mut self, collection: Collection, updated: CalendarItem) -> Result<(), Box<dyn Error>> {
        let prior = match self.visible.get(&collection).and_then(|list| list.iter().find(|i| i.id() == updated.id())) {
            None => {
                log::debug!("Patch for unknown id {} in {}: ignoring", updated.id(), collection);
                return Ok(());
            },
            Some(prior) => prior.clone(),
        };

        self.insert_visible(collection, updated.clone());
        self.apply_today_change(&prior, &updated);

        match self.gateway.patch_item(collection, &updated).await {
            Ok(()) => {
                let old_key = prior.month_key();
                let new_key = updated.month_key();
                let owner = self.owner_of(collection);

                let cache = self.store.collection_mut(collection);
                if old_key != new_key {
                    // the item changed month: its pending entry migrates with it
                    cache.pending.remove(old_key, updated.id());
                    cache.pending.add(new_key, updated.clone());
                } else if cache.pending.contains(old_key, updated.id()) {
                    cache.pending.add(old_key, updated.clone());
                }
                cache.absorb_patched(owner, &prior, &updated);

                if collection == Collection::CompanyShifts {
                    self.ensure_directory().await;
                    self.propagate_company_patch(&prior, &updated);
                }
                self.reapply_shown(collection);
                Ok(())
            },
            Err(err) => {
                self.rollback_patch(collection, &prior);
                Err(format!("Unable to update item {}: {}", updated.id(), err).into())
            },
        }
    }

    /// Delete `item` from `collection`.
    ///
    /// The item disappears from the caller's view immediately and its id is
    /// tombstoned, so a stale remote page cannot resurrect it later. On failure
    /// the item reappears identical to its pre-delete value and the tombstone is
    /// cleared — the deletion did not happen.
    pub async fn delete(&mut self, collection: Collection, item: &CalendarItem) -> Result<(), Box<dyn Error>> {
        let id = item.id();
        let key = item.month_key();
        log::debug!("Deleting item {} from {}", id, collection);

        let removed = self.visible.get_mut(&collection)
            .and_then(|list| {
                let position = list.iter().position(|i| i.id() == id);
                position.map(|position| list.remove(position))
            })
            .unwrap_or_else(|| item.clone());
        self.store.collection_mut(collection).tombstones.mark_deleted(id);
        self.store.collection_mut(collection).pending.remove(key, id);
        self.today.retain(|i| i.id() != id);

        match self.gateway.delete_item(collection, id).await {
            Ok(()) => {
                // the tombstone stays: it suppresses stale reappearances until a
                // read observes the id gone from the authoritative base
                if collection == Collection::CompanyShifts {
                    self.propagate_company_evict(&removed);
                }
                Ok(())
            },
            Err(err) => {
                self.rollback_delete(collection, removed);
                Err(format!("Unable to delete item {}: {}", id, err).into())
            },
        }
    }

    fn mint_temp_id(&mut self) -> ItemId {
        let id = ItemId::from(self.next_temp_id);
        self.next_temp_id = self.next_temp_id - 1;
        id
    }

    /// The owner of a collection's data: the session user, or the scoped company.
    /// `None` when company data is requested without a company scope
    fn owner_of(&self, collection: Collection) -> Option<Owner> {
        match collection {
            Collection::UserEvents | Collection::UserShifts => Some(Owner::user(self.session_user)),
            Collection::CompanyShifts => self.scope.current_scope_id().map(Owner::company),
        }
    }

    /// Scope-filter and convert freshly fetched records
    async fn absorbable_items(&mut self, raws: Vec<RawItem>) -> Vec<CalendarItem> {
        let raws = scope::filter_by_scope(self.scope.current_scope_id(), raws);
        if raws.iter().any(|raw| raw.participant_ids.is_empty() == false) {
            self.ensure_directory().await;
        }
        raws.into_iter().map(|raw| raw.into_item(&self.directory)).collect()
    }

    /// Fetch the participant directory once. Failing to get it is not fatal:
    /// participant ids are then rendered as `#<id>` until a later fetch succeeds
    async fn ensure_directory(&mut self) {
        if self.directory.is_empty() == false {
            return;
        }
        let company = match self.scope.current_scope_id() {
            None => return,
            Some(company) => company,
        };

        match self.gateway.fetch_owner_directory(company).await {
            Ok(entries) => {
                self.directory = entries.into_iter().map(|entry| (entry.id, entry.display_name)).collect();
            },
            Err(err) => {
                log::warn!("Unable to fetch the participant directory of company {}: {}", company, err);
            },
        }
    }

    /// Insert or replace `item` in the visible collection, keeping it ordered
    fn insert_visible(&mut self, collection: Collection, item: CalendarItem) {
        let list = self.visible.entry(collection).or_default();
        list.retain(|existing| existing.id() != item.id());
        list.push(item);
        sort_chronologically(list);
    }

    /// Insert or replace `item` in the today view, if it falls on the current date
    fn insert_today(&mut self, item: &CalendarItem) {
        if item.date() != settings::today() {
            return;
        }
        self.today.retain(|existing| existing.id() != item.id());
        self.today.push(item.clone());
        sort_chronologically(&mut self.today);
    }

    fn apply_today_change(&mut self, prior: &CalendarItem, updated: &CalendarItem) {
        self.today.retain(|existing| existing.id() != prior.id());
        self.insert_today(updated);
    }

    /// Re-read the currently shown month of `collection`, if any
    fn reapply_shown(&mut self, collection: Collection) {
        if let Some(key) = self.shown.get(&collection).copied() {
            let items = self.store.collection_mut(collection).read_month(key);
            self.visible.insert(collection, items);
        }
    }

    /// Replace a just-confirmed item's temporary id with its server id everywhere
    /// it is cached, and absorb it into the year/slice caches
    fn promote_confirmed(&mut self, collection: Collection, temp_id: ItemId, confirmed: &CalendarItem) {
        log::debug!("Item {} confirmed as {}", temp_id, confirmed.id());
        let key = confirmed.month_key();
        let owner = self.owner_of(collection);

        if let Some(list) = self.visible.get_mut(&collection) {
            if let Some(slot) = list.iter_mut().find(|i| i.id() == temp_id) {
                *slot = confirmed.clone();
            }
            sort_chronologically(list);
        }
        if let Some(slot) = self.today.iter_mut().find(|i| i.id() == temp_id) {
            *slot = confirmed.clone();
        }

        let cache = self.store.collection_mut(collection);
        // the pending entry keeps carrying the item, under its final id, until a
        // read proves the indexed base has caught up
        cache.pending.remove(key, temp_id);
        cache.pending.add(key, confirmed.clone());
        cache.absorb_confirmed(owner, confirmed);
    }

    fn rollback_create(&mut self, collection: Collection, temp_id: ItemId, key: MonthKey) {
        log::warn!("Creation of {} failed, undoing the optimistic insert", temp_id);
        if let Some(list) = self.visible.get_mut(&collection) {
            list.retain(|i| i.id() != temp_id);
        }
        self.store.collection_mut(collection).pending.remove(key, temp_id);
        self.today.retain(|i| i.id() != temp_id);
    }

    fn rollback_patch(&mut self, collection: Collection, prior: &CalendarItem) {
        log::warn!("Update of {} failed, restoring the previous value", prior.id());
        self.insert_visible(collection, prior.clone());
        self.today.retain(|i| i.id() != prior.id());
        self.insert_today(prior);
    }

    fn rollback_delete(&mut self, collection: Collection, removed: CalendarItem) {
        log::warn!("Deletion of {} failed, restoring it", removed.id());
        self.store.collection_mut(collection).tombstones.clear(removed.id());
        self.insert_today(&removed);
        self.insert_visible(collection, removed);
    }

    /// Which directory users are assigned to `item`, by display name
    fn assignee_ids(&self, item: &CalendarItem) -> Vec<i64> {
        self.directory.iter()
            .filter(|(_, name)| item.participants().iter().any(|p| p == *name))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Make a confirmed company shift visible in each assignee's own caches
    fn propagate_company_upsert(&mut self, confirmed: &CalendarItem) {
        let assignees = self.assignee_ids(confirmed);
        for user in assignees.iter() {
            self.upsert_user_shift(*user, confirmed);
        }
        if assignees.contains(&self.session_user) {
            self.reapply_shown(Collection::UserShifts);
            if confirmed.date() == settings::today() {
                self.refresh_today();
            }
        }
    }

    fn propagate_company_patch(&mut self, prior: &CalendarItem, updated: &CalendarItem) {
        let before = self.assignee_ids(prior);
        let after = self.assignee_ids(updated);

        for user in before.iter().filter(|user| after.contains(*user) == false) {
            self.evict_user_shift(*user, prior);
        }
        for user in after.iter() {
            self.upsert_user_shift(*user, updated);
        }

        if before.contains(&self.session_user) || after.contains(&self.session_user) {
            self.reapply_shown(Collection::UserShifts);
            if prior.date() == settings::today() || updated.date() == settings::today() {
                self.refresh_today();
            }
        }
    }

    fn propagate_company_evict(&mut self, removed: &CalendarItem) {
        let assignees = self.assignee_ids(removed);
        for user in assignees.iter() {
            self.evict_user_shift(*user, removed);
        }
        if assignees.contains(&self.session_user) {
            // suppress stale reappearance in the user's own view as well
            self.store.collection_mut(Collection::UserShifts).tombstones.mark_deleted(removed.id());
            self.reapply_shown(Collection::UserShifts);
            if removed.date() == settings::today() {
                self.refresh_today();
            }
        }
    }

    /// The session user's shifts also drive their slice index; other users only
    /// have their year lists maintained (their slices belong to their own session)
    fn upsert_user_shift(&mut self, user: i64, item: &CalendarItem) {
        let owner = Owner::user(user);
        let cache = self.store.collection_mut(Collection::UserShifts);
        if user == self.session_user {
            cache.absorb_confirmed(Some(owner), item);
        } else {
            cache.years.upsert(owner, item.date().year(), item);
        }
    }

    fn evict_user_shift(&mut self, user: i64, item: &CalendarItem) {
        let owner = Owner::user(user);
        let cache = self.store.collection_mut(Collection::UserShifts);
        if user == self.session_user {
            cache.evict_item(Some(owner), item);
        } else {
            cache.years.evict(owner, item.date().year(), |i| i.id() == item.id());
        }
    }
}
