//! Expiring JSON records on top of a [`KeyValueStore`].
//!
//! Each record is stored as an envelope `{"value": ..., "expires": <unix ms>|null}`.
//! Any failure, whether serialization or storage, is reported as
//! [`NestkitError::Session`].

use crate::clock::{Clock, SystemClock};
use crate::KeyValueStore;
use chrono::{DateTime, Utc};
use nestkit_core::error::{NestkitError, NestkitResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    value: Value,
    #[serde(default)]
    expires: Option<i64>,
}

pub struct SessionStore<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Persists `value` under `key`, optionally expiring at `expires_at`.
    pub fn set<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
        expires_at: Option<DateTime<Utc>>,
    ) -> NestkitResult<()> {
        let envelope = Envelope {
            value: serde_json::to_value(value).map_err(session_err)?,
            expires: expires_at.map(|t| t.timestamp_millis()),
        };
        let text = serde_json::to_string(&envelope).map_err(session_err)?;
        self.store.set_item(key, &text).map_err(session_err)?;

        tracing::debug!(key, expires = ?envelope.expires, "session item stored");
        Ok(())
    }

    /// Reads `key`.
    ///
    /// Returns `None` when absent. A record whose expiry has passed is
    /// deleted and reads as an empty object.
    pub fn get(&mut self, key: &str) -> NestkitResult<Option<Value>> {
        let Some(text) = self.store.get_item(key).map_err(session_err)? else {
            return Ok(None);
        };
        let envelope: Envelope = serde_json::from_str(&text).map_err(session_err)?;

        if let Some(expires) = envelope.expires {
            let now = self.clock.now().timestamp_millis();
            if now > expires {
                self.store.remove_item(key).map_err(session_err)?;
                tracing::debug!(key, expires, now, "session item expired");
                return Ok(Some(Value::Object(Map::new())));
            }
        }

        Ok(Some(envelope.value))
    }

    /// [`get`](Self::get) deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &str) -> NestkitResult<Option<T>> {
        self.get(key)?
            .map(|value| serde_json::from_value(value).map_err(session_err))
            .transpose()
    }

    pub fn remove(&mut self, key: &str) -> NestkitResult<()> {
        self.store.remove_item(key).map_err(session_err)
    }
}

fn session_err(e: impl std::fmt::Display) -> NestkitError {
    NestkitError::Session(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn session() -> (SessionStore<MemoryStore>, FixedClock) {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        let store = SessionStore::new(MemoryStore::new()).with_clock(Arc::new(clock.clone()));
        (store, clock)
    }

    #[test]
    fn stores_and_reads_value() {
        let (mut s, _) = session();
        s.set("user", &json!({ "id": 7, "name": "ada" }), None).unwrap();
        assert_eq!(s.get("user").unwrap(), Some(json!({ "id": 7, "name": "ada" })));
    }

    #[test]
    fn absent_key_is_none() {
        let (mut s, _) = session();
        assert_eq!(s.get("missing").unwrap(), None);
    }

    #[test]
    fn value_survives_until_expiry() {
        let (mut s, clock) = session();
        let expiry = clock.now() + Duration::minutes(5);
        s.set("token", "abc", Some(expiry)).unwrap();

        clock.advance(Duration::minutes(5));
        assert_eq!(s.get("token").unwrap(), Some(json!("abc")));
    }

    #[test]
    fn expired_value_is_removed_and_reads_empty() {
        let (mut s, clock) = session();
        let expiry = clock.now() + Duration::minutes(5);
        s.set("token", "abc", Some(expiry)).unwrap();

        clock.advance(Duration::minutes(6));
        assert_eq!(s.get("token").unwrap(), Some(json!({})));
        assert_eq!(s.get("token").unwrap(), None);
        assert!(s.into_inner().keys().is_empty());
    }

    #[test]
    fn quota_failure_is_session_error() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        let mut s = SessionStore::new(MemoryStore::new().with_quota(16))
            .with_clock(Arc::new(clock));
        let err = s.set("big", &"x".repeat(64), None).unwrap_err();
        assert!(matches!(err, NestkitError::Session(_)));
    }

    #[test]
    fn unserializable_value_is_session_error() {
        use std::collections::HashMap;

        let (mut s, _) = session();
        let mut bad: HashMap<(u8, u8), u8> = HashMap::new();
        bad.insert((1, 2), 3);
        assert!(matches!(
            s.set("bad", &bad, None),
            Err(NestkitError::Session(_))
        ));
    }

    #[test]
    fn corrupt_record_is_session_error() {
        let mut store = MemoryStore::new();
        store.set_item("raw", "{not json").unwrap();
        let mut s = SessionStore::new(store);
        assert!(matches!(s.get("raw"), Err(NestkitError::Session(_))));
    }

    #[test]
    fn get_as_deserializes() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Prefs {
            theme: String,
        }

        let (mut s, _) = session();
        s.set("prefs", &Prefs { theme: "dark".into() }, None).unwrap();
        let prefs: Option<Prefs> = s.get_as("prefs").unwrap();
        assert_eq!(prefs, Some(Prefs { theme: "dark".into() }));
    }
}
