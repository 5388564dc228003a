//! Principal registry: the rule set for each actor type.
//!
//! A principal is the authority over one actor-type domain. It supplies:
//!
//! - init functions, run once per actor to populate the cache entry
//! - for each action, an ordered chain of assertions
//!
//! Unknown actor types and actions resolve to empty lists, which the engine
//! treats as "nothing to initialize" and "nothing to check".

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::cache::CacheEntry;
use crate::engine::Request;
use crate::error::Result;

/// Populates attributes for an actor.
///
/// Returns `Some(result)` to contribute to the aggregate init result stored in
/// the initialization marker, or `None` to stay out of it.
pub trait Initializer<A, C>: Send + Sync {
    fn init(&self, entry: &CacheEntry, actor: &A, context: Option<&C>) -> Result<Option<bool>>;
}

impl<A, C, F> Initializer<A, C> for F
where
    F: Fn(&CacheEntry, &A, Option<&C>) -> Result<Option<bool>> + Send + Sync,
{
    fn init(&self, entry: &CacheEntry, actor: &A, context: Option<&C>) -> Result<Option<bool>> {
        self(entry, actor, context)
    }
}

/// One link in an action's assertion chain.
///
/// Returning `Ok(false)` stops the chain. To deny with a reason, return the
/// error produced by [`Request::is_`] or [`Request::deny`].
pub trait Assertion<A, R, C>: Send + Sync {
    fn check(&self, request: &Request<'_, A, R, C>) -> Result<bool>;
}

impl<A, R, C, F> Assertion<A, R, C> for F
where
    F: Fn(&Request<'_, A, R, C>) -> Result<bool> + Send + Sync,
{
    fn check(&self, request: &Request<'_, A, R, C>) -> Result<bool> {
        self(request)
    }
}

/// Shared handle to an init function.
pub type InitFn<A, C> = Arc<dyn Initializer<A, C>>;

/// Shared handle to an assertion.
pub type AssertionFn<A, R, C> = Arc<dyn Assertion<A, R, C>>;

/// Init functions and assertion chains for one actor type.
pub struct Principal<A, R = (), C = ()> {
    init: Vec<InitFn<A, C>>,
    assertions: HashMap<String, Vec<AssertionFn<A, R, C>>>,
}

impl<A, R, C> Principal<A, R, C> {
    pub fn new() -> Self {
        Self {
            init: Vec::new(),
            assertions: HashMap::new(),
        }
    }

    /// Appends an init function given as a closure.
    #[must_use]
    pub fn with_init<F>(self, init: F) -> Self
    where
        F: Fn(&CacheEntry, &A, Option<&C>) -> Result<Option<bool>> + Send + Sync + 'static,
    {
        self.with_initializer(init)
    }

    /// Appends an init function.
    #[must_use]
    pub fn with_initializer(mut self, init: impl Initializer<A, C> + 'static) -> Self {
        self.init.push(Arc::new(init));
        self
    }

    /// Appends an assertion, given as a closure, to the chain for `action`.
    #[must_use]
    pub fn with_assertion<F>(self, action: impl Into<String>, assertion: F) -> Self
    where
        F: Fn(&Request<'_, A, R, C>) -> Result<bool> + Send + Sync + 'static,
    {
        self.with_assertion_impl(action, assertion)
    }

    /// Appends an assertion to the chain for `action`.
    #[must_use]
    pub fn with_assertion_impl(
        mut self,
        action: impl Into<String>,
        assertion: impl Assertion<A, R, C> + 'static,
    ) -> Self {
        self.assertions
            .entry(action.into())
            .or_default()
            .push(Arc::new(assertion));
        self
    }

    /// Init functions in registration order.
    pub fn init(&self) -> &[InitFn<A, C>] {
        &self.init
    }

    /// Assertion chain for `action`, empty when none is registered.
    pub fn assertions(&self, action: &str) -> &[AssertionFn<A, R, C>] {
        self.assertions.get(action).map_or(&[], Vec::as_slice)
    }

    /// Actions that have an assertion chain.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.assertions.keys().map(String::as_str)
    }
}

impl<A, R, C> Default for Principal<A, R, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R, C> Clone for Principal<A, R, C> {
    fn clone(&self) -> Self {
        Self {
            init: self.init.clone(),
            assertions: self.assertions.clone(),
        }
    }
}

impl<A, R, C> fmt::Debug for Principal<A, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<(&str, usize)> = self
            .assertions
            .iter()
            .map(|(action, chain)| (action.as_str(), chain.len()))
            .collect();
        actions.sort_unstable();

        f.debug_struct("Principal")
            .field("init", &self.init.len())
            .field("assertions", &actions)
            .finish()
    }
}

/// Mapping from actor type to its [`Principal`].
pub struct Registry<A, R = (), C = ()> {
    principals: HashMap<String, Principal<A, R, C>>,
}

impl<A, R, C> Registry<A, R, C> {
    pub fn new() -> Self {
        Self {
            principals: HashMap::new(),
        }
    }

    /// Builder form of [`Registry::register`].
    #[must_use]
    pub fn with_principal(mut self, actor_type: impl Into<String>, principal: Principal<A, R, C>) -> Self {
        self.register(actor_type, principal);
        self
    }

    /// Sets the principal for `actor_type`, returning the one it replaced.
    ///
    /// Entries are replaced whole; nothing is merged.
    pub fn register(
        &mut self,
        actor_type: impl Into<String>,
        principal: Principal<A, R, C>,
    ) -> Option<Principal<A, R, C>> {
        self.principals.insert(actor_type.into(), principal)
    }

    pub fn principal(&self, actor_type: &str) -> Option<&Principal<A, R, C>> {
        self.principals.get(actor_type)
    }

    /// Assertion chain for `(actor_type, action)`; empty when either is unknown.
    pub fn lookup_assertions(&self, actor_type: &str, action: &str) -> &[AssertionFn<A, R, C>] {
        self.principal(actor_type)
            .map_or(&[], |principal| principal.assertions(action))
    }

    /// Init functions for `actor_type`; empty when it is unknown.
    pub fn lookup_init(&self, actor_type: &str) -> &[InitFn<A, C>] {
        self.principal(actor_type).map_or(&[], Principal::init)
    }

    pub fn contains(&self, actor_type: &str) -> bool {
        self.principals.contains_key(actor_type)
    }

    /// Registered actor types, sorted.
    pub fn actor_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.principals.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

impl<A, R, C> Default for Registry<A, R, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R, C> Clone for Registry<A, R, C> {
    fn clone(&self) -> Self {
        Self {
            principals: self.principals.clone(),
        }
    }
}

impl<A, R, C> fmt::Debug for Registry<A, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut principals: Vec<(&String, &Principal<A, R, C>)> = self.principals.iter().collect();
        principals.sort_unstable_by(|a, b| a.0.cmp(b.0));
        f.debug_map().entries(principals).finish()
    }
}
