//! Per-method condition table.
//!
//! Built once when a controller is constructed and read-only afterwards, so
//! it can be shared across concurrent requests without locking.

use crate::condition::Condition;
use crate::method::HttpMethod;
use std::collections::HashMap;
use std::fmt;

/// Mapping from HTTP method to at most one [`Condition`].
pub struct ConditionRegistry<U> {
    conditions: HashMap<HttpMethod, Condition<U>>,
}

impl<U> ConditionRegistry<U> {
    /// An empty registry. Every request against it is rejected.
    #[must_use]
    pub fn new() -> Self {
        Self {
            conditions: HashMap::new(),
        }
    }

    /// Register `condition` for `method`, replacing any earlier registration.
    #[must_use]
    pub fn with(mut self, method: HttpMethod, condition: Condition<U>) -> Self {
        self.insert(method, condition);
        self
    }

    /// Register `condition` for `method`, returning the replaced one.
    pub fn insert(&mut self, method: HttpMethod, condition: Condition<U>) -> Option<Condition<U>> {
        self.conditions.insert(method, condition)
    }

    /// Condition registered for `method`.
    #[must_use]
    pub fn get(&self, method: HttpMethod) -> Option<&Condition<U>> {
        self.conditions.get(&method)
    }

    /// Condition registered for a method string as received on the wire.
    ///
    /// The string must be one of the upper-case verbs exactly; anything else
    /// finds nothing.
    #[must_use]
    pub fn lookup(&self, method: &str) -> Option<&Condition<U>> {
        method.parse().ok().and_then(|method| self.get(method))
    }

    /// Returns `true` if `method` has a condition.
    #[must_use]
    pub fn contains(&self, method: HttpMethod) -> bool {
        self.conditions.contains_key(&method)
    }

    /// Registered methods, in [`HttpMethod::ALL`] order.
    #[must_use]
    pub fn methods(&self) -> Vec<HttpMethod> {
        HttpMethod::ALL
            .into_iter()
            .filter(|method| self.contains(*method))
            .collect()
    }

    /// Number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl<U> Default for ConditionRegistry<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> Clone for ConditionRegistry<U> {
    fn clone(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
        }
    }
}

impl<U> fmt::Debug for ConditionRegistry<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.methods()
                    .into_iter()
                    .filter_map(|method| self.get(method).map(|condition| (method, condition))),
            )
            .finish()
    }
}

impl<U> FromIterator<(HttpMethod, Condition<U>)> for ConditionRegistry<U> {
    fn from_iter<I: IntoIterator<Item = (HttpMethod, Condition<U>)>>(iter: I) -> Self {
        Self {
            conditions: iter.into_iter().collect(),
        }
    }
}
