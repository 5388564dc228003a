//! # abacus: Attribute-Based Access Control
//!
//! Actors have attributes that are computed once, cached, and then used to
//! decide whether an action is allowed.
//!
//! - [`Engine::get`] returns the value of an attribute for an actor.
//! - [`Engine::can`] runs the assertion chain registered for an action.
//! - [`Engine::is_`] checks an attribute against a value or predicate and
//!   raises [`Error::PermissionDenied`] with the recorded deny reasons.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  can / is_ / get                             │
//! │  (actor type, actor, action, context)        │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Engine                                      │
//! │  ├─ Registry: init functions + assertions    │
//! │  ├─ EntryStore: actor → CacheEntry           │
//! │  └─ Init once per (entry, actor type)        │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Result                                      │
//! │  - can: Ok(bool), short-circuits on false    │
//! │  - is_: Ok(()) or PermissionDenied(reasons)  │
//! │  - get: Option<Value>                        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Principals
//!
//! A [`Principal`] is the authority for one actor type. Its init functions
//! receive the shared [`CacheEntry`], the actor and the context, and write
//! attributes into the entry. Its assertions receive a [`Request`] and return
//! whether the action may proceed.
//!
//! ## Examples
//!
//! ```
//! use abacus::{Actor, CacheEntry, Engine, Expected, Principal, Registry, Request, Value};
//!
//! struct User {
//!     id: u64,
//!     age: i64,
//! }
//!
//! impl Actor for User {
//!     type Id = u64;
//!
//!     fn actor_id(&self) -> u64 {
//!         self.id
//!     }
//! }
//!
//! let registry = Registry::new().with_principal(
//!     "user",
//!     Principal::new()
//!         .with_init(|entry: &CacheEntry, user: &User, _: Option<&()>| {
//!             entry.set_attribute("age", user.age);
//!             entry.set_default_reasons([("age", "must be an adult")]);
//!             Ok(None)
//!         })
//!         .with_assertion("buy", |request: &Request<'_, User>| {
//!             request.is_(
//!                 "age",
//!                 Expected::matching(|v| v.and_then(Value::as_int).is_some_and(|age| age >= 18)),
//!             )
//!         }),
//! );
//! let engine: Engine<User> = Engine::new(registry).without_audit();
//!
//! let adult = User { id: 1, age: 30 };
//! let minor = User { id: 2, age: 17 };
//!
//! assert!(engine.can("user", &adult, "buy", None, None)?);
//!
//! let denied = engine.can("user", &minor, "buy", None, None).unwrap_err();
//! assert_eq!(denied.reasons(), ["must be an adult"]);
//!
//! // Nothing registered for this action: allowed.
//! assert!(engine.can("user", &minor, "browse", None, None)?);
//! # Ok::<(), abacus::Error>(())
//! ```
//!
//! ## Concurrency
//!
//! Cache entries synchronize internally and an actor type's init functions
//! run at most once per entry, even when several threads evaluate the same
//! actor at once. The registry is read-mostly and swapped atomically by
//! [`Engine::register_principals`].

pub mod cache;
pub mod engine;
pub mod error;
pub mod registry;
pub mod store;
pub mod value;

// Re-export commonly used types
pub use abacus_config::{AbacusConfig, ConfigError, ConfigLoader, EngineConfig};
pub use abacus_roles::{Rank, Role, RoleError, RoleSet, RoleSetBuilder};
pub use cache::{CacheEntry, EntrySnapshot, ReasonList};
pub use engine::{Engine, Expected, Request};
pub use error::{BoxError, Error, Result};
pub use registry::{Assertion, AssertionFn, InitFn, Initializer, Principal, Registry};
pub use store::{Actor, AttachedStore, CacheSlot, EntryStore, HasCacheSlot, KeyedStore};
pub use value::Value;
