//! Per-actor attribute cache entries.
//!
//! One [`CacheEntry`] holds everything computed for one actor object:
//!
//! - an initialization marker per actor type, storing the aggregate result of
//!   that type's init functions
//! - attribute values written by init functions
//! - deny reasons, as an ordered list per action (or attribute) name
//!
//! Entries are shared as `Arc<CacheEntry>` and synchronize internally, so init
//! and assertion functions can write through a shared reference.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, RwLock};

use serde::Serialize;

use crate::error::Result;
use crate::value::Value;

/// Initialization state for one actor type.
///
/// `done` is written once, after init succeeds; `running` serializes init
/// attempts so only one runs at a time.
#[derive(Debug, Default)]
struct Marker {
    done: OnceLock<bool>,
    running: Mutex<()>,
}

/// Attribute and deny-reason storage for one actor.
#[derive(Debug, Default)]
pub struct CacheEntry {
    markers: Mutex<HashMap<String, Arc<Marker>>>,
    attributes: RwLock<HashMap<String, Option<Value>>>,
    reasons: RwLock<HashMap<String, Vec<String>>>,
}

impl CacheEntry {
    /// Creates an empty entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an attribute value.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.put_attribute(name, Some(value.into()));
    }

    /// Stores an attribute that may be null.
    ///
    /// A stored `None` reads back exactly like an attribute that was never set.
    pub fn put_attribute(&self, name: impl Into<String>, value: Option<Value>) {
        self.attributes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value);
    }

    /// Reads an attribute. Missing and null attributes both return `None`.
    pub fn get_attribute(&self, name: &str) -> Option<Value> {
        self.attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .flatten()
    }

    /// Appends a deny reason for `action`.
    pub fn set_deny_reason(&self, action: impl Into<String>, message: impl Into<String>) {
        self.reasons
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(action.into())
            .or_default()
            .push(message.into());
    }

    /// Returns the deny reasons recorded for `action`, oldest first.
    pub fn get_deny_reason(&self, action: &str) -> Vec<String> {
        self.reasons
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(action)
            .cloned()
            .unwrap_or_default()
    }

    /// Seeds deny reasons for several actions or attributes at once.
    ///
    /// Each key replaces whatever list was stored under it; keys not named
    /// here are left alone.
    pub fn set_default_reasons<I, K, V>(&self, defaults: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ReasonList>,
    {
        let mut reasons = self.reasons.write().unwrap_or_else(PoisonError::into_inner);
        for (key, list) in defaults {
            reasons.insert(key.into(), list.into().0);
        }
    }

    /// Aggregate init result for `actor_type`, if initialization has completed.
    ///
    /// Returns `None` while initialization for that type is still running.
    pub fn initialized(&self, actor_type: &str) -> Option<bool> {
        lock(&self.markers)
            .get(actor_type)
            .and_then(|marker| marker.done.get().copied())
    }

    /// Runs `init` unless `actor_type` already has a marker, then records its
    /// result as the marker.
    ///
    /// Concurrent callers for the same actor type wait for the first one and
    /// reuse its result. A failed `init` leaves no marker behind. `init` must
    /// not re-enter initialization for the same actor type on this entry.
    pub(crate) fn initialize_with<F>(&self, actor_type: &str, init: F) -> Result<bool>
    where
        F: FnOnce() -> Result<bool>,
    {
        let marker = Arc::clone(lock(&self.markers).entry(actor_type.to_string()).or_default());
        if let Some(&done) = marker.done.get() {
            return Ok(done);
        }

        let _running = lock(&marker.running);
        if let Some(&done) = marker.done.get() {
            return Ok(done);
        }

        let done = init()?;
        Ok(*marker.done.get_or_init(|| done))
    }

    /// Serializable copy of the entry, for logging and debugging.
    pub fn snapshot(&self) -> EntrySnapshot {
        let initialized = lock(&self.markers)
            .iter()
            .filter_map(|(actor_type, marker)| {
                marker.done.get().map(|&done| (actor_type.clone(), done))
            })
            .collect();

        let attributes = self
            .attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let reasons = self
            .reasons
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        EntrySnapshot {
            initialized,
            attributes,
            reasons,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Point-in-time view of a [`CacheEntry`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySnapshot {
    pub initialized: BTreeMap<String, bool>,
    pub attributes: BTreeMap<String, Option<Value>>,
    pub reasons: BTreeMap<String, Vec<String>>,
}

/// One or more deny reasons; a single message becomes a one-element list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReasonList(pub Vec<String>);

impl From<&str> for ReasonList {
    fn from(message: &str) -> Self {
        ReasonList(vec![message.to_string()])
    }
}

impl From<String> for ReasonList {
    fn from(message: String) -> Self {
        ReasonList(vec![message])
    }
}

impl From<Vec<String>> for ReasonList {
    fn from(messages: Vec<String>) -> Self {
        ReasonList(messages)
    }
}

impl From<Vec<&str>> for ReasonList {
    fn from(messages: Vec<&str>) -> Self {
        ReasonList(messages.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ReasonList {
    fn from(messages: [&str; N]) -> Self {
        ReasonList(messages.iter().map(|m| (*m).to_string()).collect())
    }
}
