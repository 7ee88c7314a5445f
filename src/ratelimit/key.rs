//! Rate Limit Keys
//!
//! Composite counter keys, and the registry that fixes each guard's
//! position when routes are built.

use std::collections::HashMap;
use std::fmt;

// == Endpoint Key ==
/// Position of one limiter among the guards of one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointKey {
    pub route: usize,
    pub guard: usize,
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.route, self.guard)
    }
}

// == Route Registry ==
/// Hands out endpoint keys at route-registration time.
///
/// Routes are numbered in registration order, keyed by method and path;
/// registering the same route again returns its existing index. Guards on
/// a route are numbered in the order they are attached, so two limiters on
/// one route count independently.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: HashMap<(String, String), usize>,
    guards_per_route: Vec<usize>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `method path`, registering it if new.
    pub fn route(&mut self, method: &str, path: &str) -> usize {
        let next = self.guards_per_route.len();
        let index = *self
            .routes
            .entry((method.to_ascii_uppercase(), path.to_string()))
            .or_insert(next);
        if index == next {
            self.guards_per_route.push(0);
        }
        index
    }

    /// Reserves the next guard position on `method path`.
    pub fn endpoint(&mut self, method: &str, path: &str) -> EndpointKey {
        let route = self.route(method, path);
        let guard = self.guards_per_route[route];
        self.guards_per_route[route] += 1;
        EndpointKey { route, guard }
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.guards_per_route.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards_per_route.is_empty()
    }
}

// == Key Composition ==
/// Key for a single-shot request check: `{prefix}:{identity}:{route}:{guard}`.
pub fn request_key(prefix: &str, identity: &str, endpoint: EndpointKey) -> String {
    format!("{prefix}:{identity}:{endpoint}")
}

/// Key for a per-message check: `{prefix}:ws:{identity}:{sub_context}`.
pub fn message_key(prefix: &str, identity: &str, sub_context: &str) -> String {
    format!("{prefix}:ws:{identity}:{sub_context}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_numbers_routes_and_guards() {
        let mut registry = RouteRegistry::new();

        let home_first = registry.endpoint("GET", "/");
        let cache = registry.endpoint("GET", "/cache/:key");
        let home_second = registry.endpoint("get", "/");
        let cache_put = registry.endpoint("PUT", "/cache/:key");

        assert_eq!(home_first, EndpointKey { route: 0, guard: 0 });
        assert_eq!(cache, EndpointKey { route: 1, guard: 0 });
        assert_eq!(home_second, EndpointKey { route: 0, guard: 1 });
        assert_eq!(cache_put, EndpointKey { route: 2, guard: 0 });
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_route_is_idempotent() {
        let mut registry = RouteRegistry::new();
        assert!(registry.is_empty());

        assert_eq!(registry.route("GET", "/a"), 0);
        assert_eq!(registry.route("GET", "/a"), 0);
        assert_eq!(registry.route("GET", "/b"), 1);
        assert_eq!(registry.endpoint("GET", "/a"), EndpointKey { route: 0, guard: 0 });
    }

    #[test]
    fn test_key_composition() {
        let endpoint = EndpointKey { route: 3, guard: 1 };

        assert_eq!(
            request_key("rl", "10.0.0.1:/home", endpoint),
            "rl:10.0.0.1:/home:3:1"
        );
        assert_eq!(message_key("rl", "10.0.0.1:/ws", "chat"), "rl:ws:10.0.0.1:/ws:chat");
        assert_eq!(message_key("rl", "id", ""), "rl:ws:id:");
    }
}
