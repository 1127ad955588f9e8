//! Tracked solute species.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every solute the compartment model keeps a particle count for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    /// Na+
    Sodium,
    /// K+
    Potassium,
    /// Cl-
    Chloride,
    /// D-glucose
    Glucose,
    /// Neutral amino acids (lumped)
    AminoAcids,
    /// H2O
    Water,
    /// HCO3-
    Bicarbonate,
    /// H+
    Hydrogen,
    /// Dissolved CO2
    CarbonDioxide,
    /// H2CO3
    CarbonicAcid,
    /// Mg·ATP
    Atp,
}

impl Species {
    /// Number of tracked species
    pub const COUNT: usize = 11;

    /// All species in storage order
    pub const ALL: [Species; Species::COUNT] = [
        Species::Sodium,
        Species::Potassium,
        Species::Chloride,
        Species::Glucose,
        Species::AminoAcids,
        Species::Water,
        Species::Bicarbonate,
        Species::Hydrogen,
        Species::CarbonDioxide,
        Species::CarbonicAcid,
        Species::Atp,
    ];

    /// Storage slot in per-compartment arrays
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Charge valence z
    ///
    /// ATP is tracked as the Mg2+ complex (MgATP2-), the form hydrolysed by
    /// P-type ATPases.
    pub fn valence(self) -> i32 {
        match self {
            Species::Sodium | Species::Potassium | Species::Hydrogen => 1,
            Species::Chloride | Species::Bicarbonate => -1,
            Species::Atp => -2,
            Species::Glucose
            | Species::AminoAcids
            | Species::Water
            | Species::CarbonDioxide
            | Species::CarbonicAcid => 0,
        }
    }

    /// Whether the species contributes to osmolality (the solvent does not)
    pub fn is_osmotically_active(self) -> bool {
        self != Species::Water
    }

    /// Chemical symbol for display
    pub fn symbol(self) -> &'static str {
        match self {
            Species::Sodium => "Na+",
            Species::Potassium => "K+",
            Species::Chloride => "Cl-",
            Species::Glucose => "glucose",
            Species::AminoAcids => "amino acids",
            Species::Water => "H2O",
            Species::Bicarbonate => "HCO3-",
            Species::Hydrogen => "H+",
            Species::CarbonDioxide => "CO2",
            Species::CarbonicAcid => "H2CO3",
            Species::Atp => "ATP",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_follow_storage_order() {
        for (i, species) in Species::ALL.iter().enumerate() {
            assert_eq!(species.index(), i);
        }
    }

    #[test]
    fn test_valences() {
        assert_eq!(Species::Sodium.valence(), 1);
        assert_eq!(Species::Chloride.valence(), -1);
        assert_eq!(Species::Glucose.valence(), 0);
        assert!(!Species::Water.is_osmotically_active());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Species::CarbonDioxide).unwrap();
        assert_eq!(json, "\"carbon_dioxide\"");
    }
}
