//! Route dispatch
//!
//! An ordered table of `(pattern, name)` pairs. A literal pattern matches a
//! fragment exactly; a `*param` pattern matches any fragment and binds it.
//! The first matching route wins, and its observers receive a [`RouteEvent`].

use std::fmt;

use tracing::debug;

use crate::events::{Event, Observers, Subscription};

/// A compiled route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    /// Matches one fragment exactly
    Literal(String),
    /// Matches anything, binding it to the named parameter
    Splat(String),
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_prefix('*') {
            Some(param) => RoutePattern::Splat(param.to_string()),
            None => RoutePattern::Literal(normalize(pattern).to_string()),
        }
    }

    /// Arguments bound by a match, or `None` if the fragment does not match
    fn matches(&self, fragment: &str) -> Option<Vec<String>> {
        match self {
            RoutePattern::Literal(literal) => (literal == fragment).then(Vec::new),
            RoutePattern::Splat(_) => Some(vec![fragment.to_string()]),
        }
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePattern::Literal(literal) => write!(f, "{}", literal),
            RoutePattern::Splat(param) => write!(f, "*{}", param),
        }
    }
}

#[derive(Debug, Clone)]
struct Route {
    pattern: RoutePattern,
    name: String,
}

/// Result of dispatching a fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEvent {
    /// Name of the matched route
    pub name: String,
    /// Normalized fragment
    pub fragment: String,
    /// Values bound by the pattern
    pub args: Vec<String>,
}

impl Event for RouteEvent {
    type Kind = String;

    fn kind(&self) -> String {
        self.name.clone()
    }
}

/// Ordered route table
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
    history: Vec<String>,
    observers: Observers<Router, RouteEvent>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route; earlier routes take precedence
    pub fn route(mut self, pattern: &str, name: impl Into<String>) -> Self {
        self.routes.push(Route {
            pattern: RoutePattern::parse(pattern),
            name: name.into(),
        });
        self
    }

    /// Register a handler for a named route
    pub fn on_route<F>(&self, name: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&Router, &RouteEvent) + Send + Sync + 'static,
    {
        self.observers.subscribe(name.into(), handler)
    }

    /// Find the route for a fragment without dispatching
    pub fn recognize(&self, fragment: &str) -> Option<RouteEvent> {
        let fragment = normalize(fragment);
        self.routes.iter().find_map(|route| {
            route.pattern.matches(fragment).map(|args| RouteEvent {
                name: route.name.clone(),
                fragment: fragment.to_string(),
                args,
            })
        })
    }

    /// Dispatch a fragment to the first matching route
    pub fn navigate(&mut self, fragment: &str) -> Option<RouteEvent> {
        let event = self.recognize(fragment)?;
        debug!("Route '{}' -> {}", event.fragment, event.name);

        self.history.push(event.fragment.clone());
        self.observers.emit(self, &event);
        Some(event)
    }

    /// Fragments dispatched so far, oldest first
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

/// Strip leading `#` and `/` and surrounding whitespace
fn normalize(fragment: &str) -> &str {
    fragment.trim().trim_start_matches(['#', '/'])
}
