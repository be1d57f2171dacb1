//! Cookie jar, key-value stores, expiring sessions, validators, and polling.

pub mod clock;
pub mod cookie;
pub mod poll;
pub mod session;
pub mod store;
pub mod validate;

use nestkit_core::NestkitResult;

pub use clock::{Clock, FixedClock, SystemClock};
pub use cookie::{CookieAge, CookieJar, CookieValue};
pub use poll::{wait_for, wait_for_truthy, PollConfig};
pub use session::SessionStore;
pub use store::{FileStore, MemoryStore};

/// Abstraction over a persistent string-to-string store.
///
/// Failures surface as [`NestkitError::Storage`](nestkit_core::NestkitError::Storage).
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> NestkitResult<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> NestkitResult<()>;
    fn remove_item(&mut self, key: &str) -> NestkitResult<()>;
    fn keys(&self) -> Vec<String>;
}
