//! Pluggable strategy for deciding which scopes join the registry.
//!
//! The scope lifecycle collaborator (a plugin loader, a bundle tracker, ...)
//! describes every newly loaded unit as a [`ScopeCandidate`] and asks a
//! [`ScopeSelector`] whether it should be extended. Only selected scopes are
//! ever registered as binding publishers.

use serde::{Deserialize, Serialize};

/// Descriptor of a dynamically loaded unit that may contribute a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeCandidate {
    pub name: String,
    pub version: Option<String>,
    /// Packages the unit imports
    pub imports: Vec<String>,
    /// Fragments attach to a host unit and never get a scope of their own
    pub is_fragment: bool,
}

impl ScopeCandidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn importing(mut self, package: impl Into<String>) -> Self {
        self.imports.push(package.into());
        self
    }

    pub fn fragment(mut self) -> Self {
        self.is_fragment = true;
        self
    }
}

pub trait ScopeSelector: Send + Sync {
    /// Tells whether a candidate should be extended or not.
    fn select(&self, candidate: &ScopeCandidate) -> bool;
}

impl<F> ScopeSelector for F
where
    F: Fn(&ScopeCandidate) -> bool + Send + Sync,
{
    fn select(&self, candidate: &ScopeCandidate) -> bool {
        self(candidate)
    }
}

/// Selects non-fragment candidates that import the injection API package.
#[derive(Debug, Clone)]
pub struct DefaultScopeSelector {
    marker_package: String,
}

impl DefaultScopeSelector {
    pub const DEFAULT_MARKER: &'static str = "javax.inject";

    pub fn new(marker_package: impl Into<String>) -> Self {
        Self {
            marker_package: marker_package.into(),
        }
    }
}

impl Default for DefaultScopeSelector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MARKER)
    }
}

impl ScopeSelector for DefaultScopeSelector {
    fn select(&self, candidate: &ScopeCandidate) -> bool {
        !candidate.is_fragment && candidate.imports.iter().any(|p| *p == self.marker_package)
    }
}
