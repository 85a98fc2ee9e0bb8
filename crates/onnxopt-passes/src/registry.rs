//! Pass registry for building pipelines by name.

use crate::passes::FuseCastIntoInitializer;
use onnxopt_core::{Error, Pass, PredicatePass, Result};
use std::collections::HashMap;

/// Constructor for a registered pass.
pub type PassFactory = fn() -> Box<dyn Pass>;

/// Registry of pass constructors.
///
/// Maps pass names (e.g., "fuse_cast_into_initializer") to functions that
/// build a fresh instance.
///
/// # Example
///
/// ```
/// use onnxopt_passes::PassRegistry;
///
/// let registry = PassRegistry::builtin();
/// let pass = registry.create("fuse_cast_into_initializer").unwrap();
/// assert_eq!(pass.name(), "fuse_cast_into_initializer");
/// ```
pub struct PassRegistry {
    /// Map from pass name to constructor.
    factories: HashMap<String, PassFactory>,
}

impl PassRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding every pass this crate provides.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(FuseCastIntoInitializer::NAME, || -> Box<dyn Pass> {
            Box::new(PredicatePass::new(FuseCastIntoInitializer::new()))
        });
        registry
    }

    /// Register a pass constructor, replacing any previous one of that name.
    ///
    /// Returns `self` for method chaining.
    pub fn register(&mut self, name: &str, factory: PassFactory) -> &mut Self {
        self.factories.insert(name.to_string(), factory);
        self
    }

    /// Build a fresh instance of the named pass.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownPass` if nothing is registered under `name`.
    pub fn create(&self, name: &str) -> Result<Box<dyn Pass>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| Error::UnknownPass(name.to_string()))
    }

    /// Check if a pass is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Get the number of registered passes.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered pass names, sorted.
    pub fn pass_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for PassRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
