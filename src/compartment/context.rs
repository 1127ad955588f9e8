//! Per-instance simulation scope.
//!
//! A `SimulationContext` owns the compartments of one simulated epithelial
//! patch, the electrochemical field attached to each of them, the registry
//! that names them and the change subscribers. Nothing here is global: two
//! contexts never share compartments, so independent instances can run on
//! separate threads.

use std::fmt;

use super::registry::{CompartmentId, CompartmentRegistry};
use super::{Compartment, IonPool, Species};
use crate::electrochemistry::{ElectrochemicalField, MembraneConfig};
use crate::error::TransportError;

/// Callback fired once per tick for each compartment whose counts changed
///
/// Carries no payload beyond the handle; subscribers re-read current state.
pub type ChangeSubscriber = Box<dyn FnMut(CompartmentId) + Send>;

/// Owner of compartments, fields and their registry
pub struct SimulationContext {
    compartments: Vec<Compartment>,
    fields: Vec<ElectrochemicalField>,
    registry: CompartmentRegistry,
    subscribers: Vec<ChangeSubscriber>,
    membrane: MembraneConfig,
}

impl SimulationContext {
    /// Create an empty context; new fields use `membrane` properties
    pub fn new(membrane: MembraneConfig) -> Self {
        Self {
            compartments: Vec::new(),
            fields: Vec::new(),
            registry: CompartmentRegistry::new(),
            subscribers: Vec::new(),
            membrane,
        }
    }

    /// Take ownership of a compartment, register it and attach its field
    ///
    /// A compartment with an unusable volume is still added, but its field
    /// is inert and a warning is logged once here.
    pub fn add_compartment(
        &mut self,
        name: impl Into<String>,
        compartment: Compartment,
    ) -> Result<CompartmentId, TransportError> {
        let name = name.into();
        if self.registry.exists(&name) {
            return Err(TransportError::DuplicateCompartment(name));
        }

        let id = CompartmentId(self.compartments.len());
        if !compartment.is_valid() {
            log::warn!(
                "Compartment {} has invalid volume {} L; its field is inert",
                name,
                compartment.volume_L()
            );
        }

        let field = ElectrochemicalField::new(id, compartment.volume_L(), self.membrane.clone());
        self.registry.register(name, id)?;
        self.compartments.push(compartment);
        self.fields.push(field);
        Ok(id)
    }

    pub fn registry(&self) -> &CompartmentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CompartmentRegistry {
        &mut self.registry
    }

    /// Resolve a registered name to a handle
    pub fn lookup(&self, name: &str) -> Option<CompartmentId> {
        self.registry.get(name)
    }

    pub fn compartment(&self, id: CompartmentId) -> Option<&Compartment> {
        self.compartments.get(id.0)
    }

    pub fn compartment_mut(&mut self, id: CompartmentId) -> Option<&mut Compartment> {
        self.compartments.get_mut(id.0)
    }

    /// Compartment by registered name
    pub fn compartment_by_name(&self, name: &str) -> Option<&Compartment> {
        self.lookup(name).and_then(|id| self.compartment(id))
    }

    pub fn field(&self, id: CompartmentId) -> Option<&ElectrochemicalField> {
        self.fields.get(id.0)
    }

    pub fn field_mut(&mut self, id: CompartmentId) -> Option<&mut ElectrochemicalField> {
        self.fields.get_mut(id.0)
    }

    /// Set the outside compartment a field computes its GHK reference against
    pub fn set_field_reference(&mut self, id: CompartmentId, reference: CompartmentId) -> bool {
        if reference.0 >= self.compartments.len() {
            return false;
        }
        match self.fields.get_mut(id.0) {
            Some(field) => {
                field.set_reference(Some(reference));
                true
            }
            None => false,
        }
    }

    /// Dynamic membrane potential of a compartment's field (mV)
    pub fn membrane_potential_mV(&self, id: CompartmentId) -> Option<f64> {
        self.field(id).map(|f| f.membrane_potential_mV())
    }

    /// Report a transporter current into a compartment's field
    pub fn add_transporter_current(
        &mut self,
        field: CompartmentId,
        transporter_id: &str,
        ion_flux_per_sec: f64,
        charge_per_ion: f64,
    ) {
        if let Some(f) = self.fields.get_mut(field.0) {
            f.add_transporter_current(transporter_id, ion_flux_per_sec, charge_per_ion);
        }
    }

    /// Handles of every owned compartment, in insertion order
    pub fn compartment_ids(&self) -> impl Iterator<Item = CompartmentId> + '_ {
        (0..self.compartments.len()).map(CompartmentId)
    }

    pub fn len(&self) -> usize {
        self.compartments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compartments.is_empty()
    }

    /// Sum of a species' count across all compartments
    pub fn total_count(&self, species: Species) -> f64 {
        self.compartments.iter().map(|c| c.actual(species)).sum()
    }

    /// Integrate every field over `delta_sec`
    pub fn tick_fields(&mut self, delta_sec: f64) {
        let Self { compartments, fields, .. } = self;
        for field in fields.iter_mut() {
            let inside = match compartments.get(field.compartment().0) {
                Some(c) => c,
                None => continue,
            };
            let outside = field.reference().and_then(|r| compartments.get(r.0));
            field.tick(inside, outside, delta_sec);
        }
    }

    /// Register a change subscriber
    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(CompartmentId) + Send + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Fire change notifications for every dirty compartment
    ///
    /// Returns the number of compartments that changed.
    pub fn flush_notifications(&mut self) -> usize {
        let mut changed = 0;
        for (i, compartment) in self.compartments.iter_mut().enumerate() {
            if compartment.take_dirty() {
                changed += 1;
                for subscriber in self.subscribers.iter_mut() {
                    subscriber(CompartmentId(i));
                }
            }
        }
        changed
    }
}

impl Default for SimulationContext {
    fn default() -> Self {
        Self::new(MembraneConfig::default())
    }
}

impl fmt::Debug for SimulationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationContext")
            .field("compartments", &self.compartments)
            .field("fields", &self.fields)
            .field("registry", &self.registry)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
