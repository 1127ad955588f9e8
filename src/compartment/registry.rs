//! Namespaced compartment lookup.
//!
//! Maps identifiers following the `organ.structure.compartment` convention
//! (e.g. `kidney.pct.lumen`) to compartment handles. The registry holds
//! handles only; compartments are owned by the [`SimulationContext`] and
//! unregistering a name never destroys one.
//!
//! [`SimulationContext`]: super::SimulationContext

use std::collections::HashMap;
use std::fmt;

use crate::error::TransportError;

/// Handle to a compartment owned by a [`super::SimulationContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompartmentId(pub(crate) usize);

impl CompartmentId {
    /// Position in the owning context's storage
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CompartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Build an `organ.structure.compartment` identifier
pub fn namespaced_id(organ: &str, structure: &str, compartment: &str) -> String {
    format!("{}.{}.{}", organ, structure, compartment)
}

/// Identifier → compartment handle map, scoped to one simulation instance
#[derive(Debug, Clone, Default)]
pub struct CompartmentRegistry {
    entries: HashMap<String, CompartmentId>,
}

impl CompartmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle under a unique identifier
    pub fn register(&mut self, name: impl Into<String>, id: CompartmentId) -> Result<(), TransportError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(TransportError::DuplicateCompartment(name));
        }
        log::debug!("Registered compartment {} as {}", id, name);
        self.entries.insert(name, id);
        Ok(())
    }

    /// Remove an identifier, returning the handle it pointed to
    pub fn unregister(&mut self, name: &str) -> Option<CompartmentId> {
        self.entries.remove(name)
    }

    /// Look up a handle
    pub fn get(&self, name: &str) -> Option<CompartmentId> {
        self.entries.get(name).copied()
    }

    /// Look up a handle, failing with a typed error
    pub fn resolve(&self, name: &str) -> Result<CompartmentId, TransportError> {
        self.get(name)
            .ok_or_else(|| TransportError::UnknownCompartment(name.to_string()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered identifiers, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = CompartmentRegistry::new();
        registry.register("kidney.pct.cell", CompartmentId(0)).unwrap();
        assert!(registry.exists("kidney.pct.cell"));
        assert_eq!(registry.get("kidney.pct.cell"), Some(CompartmentId(0)));
        assert_eq!(registry.get("kidney.pct.blood"), None);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = CompartmentRegistry::new();
        registry.register("kidney.pct.cell", CompartmentId(0)).unwrap();
        let err = registry.register("kidney.pct.cell", CompartmentId(1)).unwrap_err();
        assert!(matches!(err, TransportError::DuplicateCompartment(_)));
        assert_eq!(registry.get("kidney.pct.cell"), Some(CompartmentId(0)));
    }

    #[test]
    fn test_unregister() {
        let mut registry = CompartmentRegistry::new();
        registry.register("a.b.c", CompartmentId(3)).unwrap();
        assert_eq!(registry.unregister("a.b.c"), Some(CompartmentId(3)));
        assert!(!registry.exists("a.b.c"));
        assert_eq!(registry.unregister("a.b.c"), None);
    }

    #[test]
    fn test_namespaced_id() {
        assert_eq!(namespaced_id("kidney", "pct", "lumen"), "kidney.pct.lumen");
    }
}
