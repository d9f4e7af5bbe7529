//! This crate provides the caching and synchronisation core of a workforce-scheduling client.
//!
//! Calendar items (personal events and work shifts) are fetched from a remote scheduling service through the narrow [`RemoteGateway`](traits::RemoteGateway) trait, and indexed locally by month and by owner-year in the [`store`] module.
//!
//! Because the remote service may be slow, and a user-friendly app must never show a lag between a user action and its visible effect, all mutations are optimistic: a [`Provider`](provider::Provider) applies them to the in-memory state synchronously, confirms them against the remote service in the background, and rolls them back if the service refuses them. \
//! A `Provider` merges these two sources (server-confirmed data and speculative local changes) into one virtual source, which is what the UI renders.

pub mod traits;

pub mod store;
mod item;
pub use item::CalendarItem;
pub use item::Collection;
pub use item::ItemId;
pub use item::ItemKind;
pub use item::MonthKey;
pub use item::Owner;
pub use item::OwnerKind;
pub mod provider;
pub use provider::Provider;

pub mod scope;
pub mod in_memory_gateway;
pub use in_memory_gateway::InMemoryGateway;
pub mod mock_behaviour;

pub mod settings;
pub mod utils;
