//! Keyed async query cache for data fetching.
//!
//! Inspired by TanStack Query: reads are identified by a structural
//! [`QueryKey`], fetched once no matter how many views subscribe, cached
//! with loading/success/error states, and refreshed through invalidation
//! rather than by callers writing into the cache.
//!
//! - `key` defines cache identities
//! - `state` defines entry states, values, and snapshots
//! - `cache` is the store: subscriptions, invalidation, the tick pump

mod cache;
mod key;
mod state;

pub use cache::{QueryClient, QueryNotification, QuerySubscription, SubscriberId};
pub use key::QueryKey;
pub use state::{FetchResult, QuerySnapshot, QueryStatus, QueryValue};
