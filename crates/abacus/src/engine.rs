//! Assertion engine: `get`, `is_` and `can`.
//!
//! The engine combines the [`Registry`] with an [`EntryStore`]:
//!
//! 1. the store yields the actor's cache entry
//! 2. the actor type's init functions run once per entry
//! 3. attributes are read, compared, or handed to the action's assertions
//!
//! `is_` raises [`Error::PermissionDenied`] with the recorded deny reasons.
//! `can` only aggregates: it returns `Ok(false)` on the first falsy assertion
//! and relies on assertions to raise when a denial needs a reason.

use std::fmt;
use std::sync::{Arc, RwLock};

use abacus_config::{AbacusConfig, EngineConfig};
use tracing::{debug, info, trace, warn};

use crate::cache::CacheEntry;
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::store::{Actor, EntryStore, KeyedStore};
use crate::value::Value;

// ============================================================================
// Expected
// ============================================================================

/// What `is_` compares an attribute against.
pub enum Expected {
    /// Attribute must equal this value (`None` matches a missing attribute).
    Equals(Option<Value>),
    /// Attribute must satisfy this predicate.
    Matches(Box<dyn Fn(Option<&Value>) -> bool + Send + Sync>),
}

impl Expected {
    /// Expects the attribute to equal `value`.
    pub fn value(value: impl Into<Value>) -> Self {
        Expected::Equals(Some(value.into()))
    }

    /// Expects the attribute to be missing or null.
    pub fn absent() -> Self {
        Expected::Equals(None)
    }

    /// Expects `predicate` to hold for the attribute.
    pub fn matching<F>(predicate: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        Expected::Matches(Box::new(predicate))
    }

    /// Returns whether `actual` satisfies the expectation.
    pub fn matches(&self, actual: Option<&Value>) -> bool {
        match self {
            Expected::Equals(expected) => expected.as_ref() == actual,
            Expected::Matches(predicate) => predicate(actual),
        }
    }
}

impl Default for Expected {
    /// The attribute must be `true`.
    fn default() -> Self {
        Expected::value(true)
    }
}

impl fmt::Debug for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Equals(value) => f.debug_tuple("Equals").field(value).finish(),
            Expected::Matches(_) => f.write_str("Matches(<predicate>)"),
        }
    }
}

macro_rules! expected_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expected {
                fn from(value: $ty) -> Self {
                    Expected::value(value)
                }
            }
        )*
    };
}

expected_from!(bool, i64, i32, u32, f64, &str, String, abacus_roles::Role, Value);

impl From<Option<Value>> for Expected {
    fn from(value: Option<Value>) -> Self {
        Expected::Equals(value)
    }
}

// ============================================================================
// Request
// ============================================================================

/// Everything an assertion sees while `can` evaluates an action.
pub struct Request<'a, A, R = (), C = ()> {
    engine: &'a Engine<A, R, C>,
    actor_type: &'a str,
    actor: &'a A,
    resource: Option<&'a R>,
    action: &'a str,
    context: Option<&'a C>,
    entry: &'a CacheEntry,
}

impl<'a, A, R, C> Request<'a, A, R, C> {
    pub fn engine(&self) -> &'a Engine<A, R, C> {
        self.engine
    }

    pub fn actor_type(&self) -> &'a str {
        self.actor_type
    }

    pub fn actor(&self) -> &'a A {
        self.actor
    }

    pub fn resource(&self) -> Option<&'a R> {
        self.resource
    }

    pub fn action(&self) -> &'a str {
        self.action
    }

    pub fn context(&self) -> Option<&'a C> {
        self.context
    }

    /// The actor's cache entry, already initialized for this actor type.
    pub fn entry(&self) -> &'a CacheEntry {
        self.entry
    }

    /// Reads an attribute of the actor.
    pub fn get(&self, attribute: &str) -> Option<Value> {
        self.entry.get_attribute(attribute)
    }

    /// Runs [`Engine::is_`] for this actor, type and context.
    pub fn is_(&self, attribute: &str, expected: impl Into<Expected>) -> Result<bool> {
        self.engine
            .is_(self.actor_type, self.actor, attribute, expected, self.context)?;
        Ok(true)
    }

    /// Records `reason` against this action and returns the denial to raise.
    ///
    /// The error's `key` is the action name.
    ///
    /// ```ignore
    /// return Err(request.deny("not the owner"));
    /// ```
    pub fn deny(&self, reason: impl Into<String>) -> Error {
        self.entry.set_deny_reason(self.action, reason);
        Error::permission_denied(
            self.action,
            self.entry.get_deny_reason(self.action),
            &self.engine.config.reason_separator,
        )
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Attribute-based access-control engine.
///
/// The registry sits behind a lock so it can be swapped at runtime with
/// [`Engine::register_principals`]; every evaluation works on the registry
/// snapshot it started with.
pub struct Engine<A, R = (), C = ()> {
    registry: RwLock<Arc<Registry<A, R, C>>>,
    store: Box<dyn EntryStore<A, C>>,
    config: EngineConfig,
}

impl<A, R, C> Engine<A, R, C>
where
    A: Actor,
{
    /// Creates an engine that caches entries by actor identifier.
    pub fn new(registry: Registry<A, R, C>) -> Self {
        Self::with_store(registry, KeyedStore::<A::Id>::new())
    }

    /// Creates an engine that caches entries by actor identifier, using the
    /// `[engine]` section of a loaded configuration.
    ///
    /// ```ignore
    /// let config = ConfigLoader::new().load()?;
    /// let engine = Engine::from_config(registry, &config);
    /// ```
    pub fn from_config(registry: Registry<A, R, C>, config: &AbacusConfig) -> Self {
        Self::new(registry).with_config(config.engine.clone())
    }
}

impl<A, R, C> Engine<A, R, C> {
    /// Creates an engine with a custom entry lookup strategy.
    pub fn with_store(registry: Registry<A, R, C>, store: impl EntryStore<A, C> + 'static) -> Self {
        Self {
            registry: RwLock::new(Arc::new(registry)),
            store: Box::new(store),
            config: EngineConfig::default(),
        }
    }

    /// Applies engine settings.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Disables audit logging (for testing).
    #[must_use]
    pub fn without_audit(mut self) -> Self {
        self.config.audit = false;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces the whole registry.
    ///
    /// Evaluations already running finish against the previous registry.
    pub fn register_principals(&self, registry: Registry<A, R, C>) -> Result<()> {
        let mut current = self
            .registry
            .write()
            .map_err(|_| Error::poisoned("registry"))?;
        *current = Arc::new(registry);

        if self.config.audit {
            info!(actor_types = ?current.actor_types(), "Principals registered");
        }
        Ok(())
    }

    /// Snapshot of the current registry.
    pub fn registry(&self) -> Result<Arc<Registry<A, R, C>>> {
        let current = self
            .registry
            .read()
            .map_err(|_| Error::poisoned("registry"))?;
        Ok(Arc::clone(&current))
    }

    /// Returns the actor's cache entry without initializing it.
    pub fn acquire_entry(
        &self,
        actor_type: &str,
        actor: &A,
        context: Option<&C>,
    ) -> Result<Arc<CacheEntry>> {
        self.store.acquire(actor_type, actor, context)
    }

    /// Returns the actor's cache entry, running the actor type's init
    /// functions first if they have not run for this entry yet.
    pub fn ensure_initialized(
        &self,
        actor_type: &str,
        actor: &A,
        context: Option<&C>,
    ) -> Result<Arc<CacheEntry>> {
        let registry = self.registry()?;
        let entry = self.acquire_entry(actor_type, actor, context)?;
        self.initialize(&registry, &entry, actor_type, actor, context)?;
        Ok(entry)
    }

    /// Returns an attribute of the actor.
    ///
    /// `None` means either "never set" or "set to null"; the two cannot be
    /// told apart here.
    pub fn get(
        &self,
        actor_type: &str,
        actor: &A,
        attribute: &str,
        context: Option<&C>,
    ) -> Result<Option<Value>> {
        let entry = self.ensure_initialized(actor_type, actor, context)?;
        Ok(entry.get_attribute(attribute))
    }

    /// Checks that an attribute matches `expected`.
    ///
    /// # Errors
    ///
    /// [`Error::PermissionDenied`] on mismatch, carrying the deny reasons
    /// recorded under the attribute name (possibly none). Failures from init
    /// functions pass through unchanged.
    pub fn is_(
        &self,
        actor_type: &str,
        actor: &A,
        attribute: &str,
        expected: impl Into<Expected>,
        context: Option<&C>,
    ) -> Result<()> {
        let entry = self.ensure_initialized(actor_type, actor, context)?;
        let value = entry.get_attribute(attribute);

        if expected.into().matches(value.as_ref()) {
            return Ok(());
        }

        let reasons = entry.get_deny_reason(attribute);
        if self.config.audit {
            warn!(
                actor_type = %actor_type,
                attribute = %attribute,
                reasons = ?reasons,
                "Attribute check denied"
            );
        }
        Err(Error::permission_denied(
            attribute,
            reasons,
            &self.config.reason_separator,
        ))
    }

    /// Evaluates the assertion chain for `action`.
    ///
    /// Assertions run in registration order and stop at the first one that
    /// returns `false`. An action without assertions is allowed.
    ///
    /// # Errors
    ///
    /// Whatever an init function or assertion raises, unchanged. Assertions
    /// that call [`Request::is_`] or [`Request::deny`] surface as
    /// [`Error::PermissionDenied`].
    pub fn can(
        &self,
        actor_type: &str,
        actor: &A,
        action: &str,
        resource: Option<&R>,
        context: Option<&C>,
    ) -> Result<bool> {
        let registry = self.registry()?;
        let entry = self.acquire_entry(actor_type, actor, context)?;
        self.initialize(&registry, &entry, actor_type, actor, context)?;

        let request = Request {
            engine: self,
            actor_type,
            actor,
            resource,
            action,
            context,
            entry: &entry,
        };

        for (position, assertion) in registry
            .lookup_assertions(actor_type, action)
            .iter()
            .enumerate()
        {
            let passed = assertion.check(&request).inspect_err(|err| {
                if self.config.audit && err.is_permission_denied() {
                    warn!(
                        actor_type = %actor_type,
                        action = %action,
                        assertion = position,
                        reasons = ?err.reasons(),
                        "Action denied"
                    );
                }
            })?;

            if !passed {
                if self.config.audit {
                    warn!(
                        actor_type = %actor_type,
                        action = %action,
                        assertion = position,
                        "Action denied"
                    );
                }
                return Ok(false);
            }
        }

        if self.config.audit {
            info!(actor_type = %actor_type, action = %action, "Action allowed");
        }
        Ok(true)
    }

    fn initialize(
        &self,
        registry: &Registry<A, R, C>,
        entry: &CacheEntry,
        actor_type: &str,
        actor: &A,
        context: Option<&C>,
    ) -> Result<bool> {
        entry.initialize_with(actor_type, || {
            let mut aggregate = true;
            for init in registry.lookup_init(actor_type) {
                if let Some(result) = init.init(entry, actor, context)? {
                    aggregate &= result;
                }
            }

            if self.config.audit {
                debug!(
                    actor_type = %actor_type,
                    result = aggregate,
                    "Attributes initialized"
                );
                if tracing::enabled!(tracing::Level::TRACE) {
                    match serde_json::to_string(&entry.snapshot()) {
                        Ok(snapshot) => trace!(actor_type = %actor_type, %snapshot, "Cache entry"),
                        Err(err) => trace!(actor_type = %actor_type, error = %err, "Cache entry not serializable"),
                    }
                }
            }
            Ok(aggregate)
        })
    }
}

impl<A, R, C> fmt::Debug for Engine<A, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry.read().ok().map(|r| Arc::clone(&r)))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
