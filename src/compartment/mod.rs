//! Compartment model for the proximal convoluted tubule.
//!
//! Three bounded pools of solute particles share the epithelium:
//! - Lumen: glomerular filtrate on the apical side
//! - Cell: PCT epithelial cytosol
//! - Blood: peritubular capillary plasma on the basolateral side
//!
//! Compartments store *particle counts*, not concentrations. Concentrations
//! are always derived from count and volume, so transporters that move a
//! fixed batch of ions conserve mass exactly regardless of compartment size.
//!
//! References:
//! - Boron WF, Boulpaep EL. Medical Physiology. 3rd ed. Elsevier, 2017 (ch. 35)
//! - Weinstein AM. Am J Physiol Renal Physiol. 2003;284:F1087-F1098 (PCT model)

mod context;
mod registry;
mod species;

pub use context::{ChangeSubscriber, SimulationContext};
pub use registry::{namespaced_id, CompartmentId, CompartmentRegistry};
pub use species::Species;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{count_to_mM, mM_to_count};

/// Default registry identifiers for the single-voxel PCT layout
pub const LUMEN_ID: &str = "kidney.pct.lumen";
pub const CELL_ID: &str = "kidney.pct.cell";
pub const BLOOD_ID: &str = "kidney.pct.blood";

/// Formal compartment interface used by transporters, enzymes and fields
///
/// Any pool of particles with a fixed volume can take part in transport by
/// implementing the count accessors; concentration conversion and
/// availability checks come for free.
pub trait IonPool {
    /// Compartment volume (L)
    fn volume_L(&self) -> f64;

    /// True particle count of a species
    fn actual(&self, species: Species) -> f64;

    /// Add particles; non-positive or non-finite amounts are ignored
    fn credit(&mut self, species: Species, amount: f64);

    /// Remove particles if available
    ///
    /// Returns `false` and leaves the pool untouched when fewer than
    /// `amount` particles are present, so no debit can go negative.
    fn debit(&mut self, species: Species, amount: f64) -> bool;

    /// Flag the pool as changed for the next notification flush
    fn notify_changed(&mut self);

    /// Whether the pool has a usable volume
    fn is_valid(&self) -> bool {
        let v = self.volume_L();
        v > 0.0 && v.is_finite()
    }

    /// Concentration in mM, 0 for invalid volume
    fn concentration_mM(&self, species: Species) -> f64 {
        count_to_mM(self.actual(species), self.volume_L())
    }

    /// Whether at least `amount` particles are present
    fn has_available(&self, species: Species, amount: f64) -> bool {
        amount >= 0.0 && self.actual(species) >= amount
    }
}

/// Anatomical role of a compartment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompartmentKind {
    Lumen,
    Cell,
    Blood,
}

/// Declarative description of a compartment: registry id, volume and
/// initial concentrations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompartmentSpec {
    /// Registry identifier, `organ.structure.compartment`
    pub id: String,
    /// Anatomical role
    pub kind: CompartmentKind,
    /// Volume (L)
    pub volume_L: f64,
    /// Initial concentrations (mM); absent species start at zero
    pub initial_mM: BTreeMap<Species, f64>,
    /// Outside compartment the field's GHK potential is computed against
    #[serde(default)]
    pub reference: Option<String>,
}

impl CompartmentSpec {
    /// Tubular fluid at the start of the PCT (ultrafiltrate of plasma)
    ///
    /// Reference: Boron & Boulpaep 2017, Table 35-1
    pub fn lumen() -> Self {
        Self {
            id: LUMEN_ID.to_string(),
            kind: CompartmentKind::Lumen,
            volume_L: 1e-12, // 1 pL of tubular fluid adjacent to the patch
            initial_mM: BTreeMap::from([
                (Species::Sodium, 140.0),
                (Species::Potassium, 5.0),
                (Species::Chloride, 110.0),
                (Species::Glucose, 5.0),
                (Species::AminoAcids, 2.5),
                (Species::Water, 55_500.0),
                (Species::Bicarbonate, 24.0),
                (Species::Hydrogen, 3.98e-5), // pH 7.4
                (Species::CarbonDioxide, 1.2),
                (Species::CarbonicAcid, 3.795e-3),
            ]),
            reference: None,
        }
    }

    /// PCT epithelial cytosol
    ///
    /// Reference: Weinstein 2003; Boron & Boulpaep 2017
    pub fn cell() -> Self {
        Self {
            id: CELL_ID.to_string(),
            kind: CompartmentKind::Cell,
            volume_L: 2e-12, // ~2 pL PCT cell
            initial_mM: BTreeMap::from([
                (Species::Sodium, 12.0),
                (Species::Potassium, 140.0),
                (Species::Chloride, 7.0),
                (Species::Glucose, 2.0),
                (Species::AminoAcids, 5.0),
                (Species::Water, 55_500.0),
                (Species::Bicarbonate, 15.0),
                (Species::Hydrogen, 6.36e-5), // pH 7.2
                (Species::CarbonDioxide, 1.2),
                (Species::CarbonicAcid, 3.795e-3),
                (Species::Atp, 4.0),
            ]),
            reference: Some(BLOOD_ID.to_string()),
        }
    }

    /// Peritubular capillary plasma
    ///
    /// Reference: Boron & Boulpaep 2017, Table 5-1
    pub fn blood() -> Self {
        Self {
            id: BLOOD_ID.to_string(),
            kind: CompartmentKind::Blood,
            volume_L: 5e-12,
            initial_mM: BTreeMap::from([
                (Species::Sodium, 140.0),
                (Species::Potassium, 5.0),
                (Species::Chloride, 110.0),
                (Species::Glucose, 5.0),
                (Species::AminoAcids, 2.5),
                (Species::Water, 55_500.0),
                (Species::Bicarbonate, 24.0),
                (Species::Hydrogen, 3.98e-5),
                (Species::CarbonDioxide, 1.2),
                (Species::CarbonicAcid, 3.795e-3),
            ]),
            reference: None,
        }
    }

    /// Build the compartment described by this spec
    pub fn build(&self, debug_scale: f64) -> Compartment {
        let mut compartment = Compartment::new(self.kind, self.volume_L);
        compartment.set_debug_scale(debug_scale);
        for (&species, &mM) in &self.initial_mM {
            compartment.set_concentration(species, mM);
        }
        compartment
    }
}

/// A bounded pool of solute particles with fixed volume
///
/// Counts are mutated only through [`IonPool::credit`] and
/// [`IonPool::debit`]; every mutation marks the compartment dirty so the
/// owning [`SimulationContext`] can fire one change notification per tick.
#[derive(Debug, Clone)]
pub struct Compartment {
    /// Anatomical role
    pub kind: CompartmentKind,
    debug_scale: f64,
    volume_L: f64,
    actual: [f64; Species::COUNT],
    display: [i64; Species::COUNT],
    dirty: bool,
    revision: u64,
}

impl Compartment {
    /// Default display scale (one display unit per million particles)
    pub const DEFAULT_DEBUG_SCALE: f64 = 1e-6;

    /// Create an empty compartment
    pub fn new(kind: CompartmentKind, volume_L: f64) -> Self {
        Self {
            kind,
            debug_scale: Self::DEFAULT_DEBUG_SCALE,
            volume_L,
            actual: [0.0; Species::COUNT],
            display: [0; Species::COUNT],
            dirty: false,
            revision: 0,
        }
    }

    /// Lumen with default filtrate composition
    pub fn lumen() -> Self {
        CompartmentSpec::lumen().build(Self::DEFAULT_DEBUG_SCALE)
    }

    /// Cell with default cytosolic composition
    pub fn cell() -> Self {
        CompartmentSpec::cell().build(Self::DEFAULT_DEBUG_SCALE)
    }

    /// Blood with default plasma composition
    pub fn blood() -> Self {
        CompartmentSpec::blood().build(Self::DEFAULT_DEBUG_SCALE)
    }

    /// Set a concentration (mM), converting to a particle count
    ///
    /// Does not notify: callers batching several sets call
    /// [`IonPool::notify_changed`] once afterwards.
    pub fn set_concentration(&mut self, species: Species, mM: f64) {
        let i = species.index();
        self.actual[i] = mM_to_count(mM, self.volume_L);
        self.refresh_display(species);
    }

    /// Derived concentration (mM)
    pub fn get_concentration(&self, species: Species) -> f64 {
        self.concentration_mM(species)
    }

    /// Presentation scale applied to counts for the display mirror
    pub fn debug_scale(&self) -> f64 {
        self.debug_scale
    }

    /// Change the presentation scale and refresh every display slot
    ///
    /// Counts are untouched and no change notification is raised.
    pub fn set_debug_scale(&mut self, debug_scale: f64) {
        self.debug_scale = debug_scale;
        for &species in Species::ALL.iter() {
            self.refresh_display(species);
        }
    }

    /// Display-scaled count, for presentation only
    pub fn display_count(&self, species: Species) -> i64 {
        self.display[species.index()]
    }

    /// Number of change notifications fired for this compartment
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the counts changed since the last notification flush
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consume the dirty flag, bumping the revision if it was set
    pub(crate) fn take_dirty(&mut self) -> bool {
        if self.dirty {
            self.dirty = false;
            self.revision += 1;
            true
        } else {
            false
        }
    }

    /// Intracellular-style pH from free H+ (7.4 when H+ is absent)
    pub fn ph(&self) -> f64 {
        let h_M = self.concentration_mM(Species::Hydrogen) / 1000.0;
        if h_M > 0.0 {
            -h_M.log10()
        } else {
            7.4
        }
    }

    fn refresh_display(&mut self, species: Species) {
        let i = species.index();
        let scaled = (self.actual[i] * self.debug_scale).round();
        self.display[i] = if scaled.is_finite() { scaled as i64 } else { 0 };
    }
}

impl IonPool for Compartment {
    fn volume_L(&self) -> f64 {
        self.volume_L
    }

    fn actual(&self, species: Species) -> f64 {
        self.actual[species.index()]
    }

    fn credit(&mut self, species: Species, amount: f64) {
        if amount > 0.0 && amount.is_finite() {
            self.actual[species.index()] += amount;
            self.refresh_display(species);
            self.dirty = true;
        }
    }

    fn debit(&mut self, species: Species, amount: f64) -> bool {
        if !amount.is_finite() || amount < 0.0 {
            return false;
        }
        let i = species.index();
        if self.actual[i] < amount {
            return false;
        }
        if amount > 0.0 {
            self.actual[i] = (self.actual[i] - amount).max(0.0);
            self.refresh_display(species);
            self.dirty = true;
        }
        true
    }

    fn notify_changed(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_concentration() {
        let mut c = Compartment::new(CompartmentKind::Cell, 2e-12);
        c.set_concentration(Species::Sodium, 12.0);
        assert!((c.get_concentration(Species::Sodium) - 12.0).abs() < 1e-9);
        assert!(!c.is_dirty(), "set_concentration must not notify");
    }

    #[test]
    fn test_debit_refuses_overdraw() {
        let mut c = Compartment::new(CompartmentKind::Cell, 2e-12);
        c.credit(Species::Potassium, 100.0);
        assert!(!c.debit(Species::Potassium, 100.5));
        assert_eq!(c.actual(Species::Potassium), 100.0);
        assert!(c.debit(Species::Potassium, 100.0));
        assert_eq!(c.actual(Species::Potassium), 0.0);
    }

    #[test]
    fn test_credit_ignores_invalid_amounts() {
        let mut c = Compartment::new(CompartmentKind::Blood, 5e-12);
        c.credit(Species::Sodium, -3.0);
        c.credit(Species::Sodium, f64::NAN);
        assert_eq!(c.actual(Species::Sodium), 0.0);
        assert!(!c.is_dirty());
    }

    #[test]
    fn test_display_mirror() {
        let mut c = Compartment::new(CompartmentKind::Lumen, 1e-12);
        c.credit(Species::Glucose, 3_000_000.0);
        assert_eq!(c.display_count(Species::Glucose), 3);
    }

    #[test]
    fn test_rescaling_refreshes_every_display_slot() {
        let mut c = Compartment::new(CompartmentKind::Lumen, 1e-12);
        c.credit(Species::Glucose, 3_000_000.0);
        c.credit(Species::Sodium, 5_000_000.0);
        let revision = c.revision();

        c.set_debug_scale(1e-3);
        assert_eq!(c.debug_scale(), 1e-3);
        assert_eq!(c.display_count(Species::Glucose), 3_000);
        assert_eq!(c.display_count(Species::Sodium), 5_000);
        assert_eq!(c.actual(Species::Glucose), 3_000_000.0);
        assert_eq!(c.revision(), revision);
    }

    #[test]
    fn test_zero_volume_concentration_is_zero() {
        let mut c = Compartment::new(CompartmentKind::Cell, 0.0);
        c.credit(Species::Sodium, 1e9);
        assert!(!c.is_valid());
        assert_eq!(c.get_concentration(Species::Sodium), 0.0);
    }

    #[test]
    fn test_presets() {
        let cell = Compartment::cell();
        assert!((cell.get_concentration(Species::Potassium) - 140.0).abs() < 1e-6);
        assert!((cell.ph() - 7.2).abs() < 0.01);
        let lumen = Compartment::lumen();
        assert!((lumen.ph() - 7.4).abs() < 0.01);
    }
}
