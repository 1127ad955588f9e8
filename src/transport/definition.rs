//! Declarative transporter table.
//!
//! Transporter topology is static configuration: each entry names the
//! transporter family, its instance id, the compartments it connects (by
//! registry id) and its kinetic parameters. `build` resolves the names
//! against a context; an entry whose compartments cannot be resolved yields
//! an inert transporter and one warning instead of failing the simulation.

use serde::{Deserialize, Serialize};

use super::{NaKAtpase, NaKAtpaseConfig, Nhe3, Nhe3Config, Sglt2, Sglt2Config, Transporter, TransporterKind};
use crate::compartment::{CompartmentId, IonPool, SimulationContext, BLOOD_ID, CELL_ID, LUMEN_ID};
use crate::error::TransportError;

/// One row of the transport-definition table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransporterDefinition {
    NaKAtpase {
        id: String,
        cell: String,
        blood: String,
        #[serde(default)]
        config: NaKAtpaseConfig,
    },
    Sglt2 {
        id: String,
        lumen: String,
        cell: String,
        #[serde(default)]
        config: Sglt2Config,
    },
    Nhe3 {
        id: String,
        lumen: String,
        cell: String,
        #[serde(default)]
        config: Nhe3Config,
    },
}

impl TransporterDefinition {
    pub fn id(&self) -> &str {
        match self {
            TransporterDefinition::NaKAtpase { id, .. }
            | TransporterDefinition::Sglt2 { id, .. }
            | TransporterDefinition::Nhe3 { id, .. } => id,
        }
    }

    pub fn kind(&self) -> TransporterKind {
        match self {
            TransporterDefinition::NaKAtpase { .. } => TransporterKind::NaKAtpase,
            TransporterDefinition::Sglt2 { .. } => TransporterKind::Sglt2,
            TransporterDefinition::Nhe3 { .. } => TransporterKind::Nhe3,
        }
    }

    /// Wire the transporter against `ctx`
    pub fn build(&self, ctx: &SimulationContext) -> Box<dyn Transporter> {
        match self {
            TransporterDefinition::NaKAtpase { id, cell, blood, config } => {
                match (resolve(ctx, id, cell), resolve(ctx, id, blood)) {
                    (Ok(cell), Ok(blood)) => Box::new(NaKAtpase::new(id.clone(), cell, blood, config.clone())),
                    _ => Box::new(NaKAtpase::inert(id.clone(), config.clone())),
                }
            }
            TransporterDefinition::Sglt2 { id, lumen, cell, config } => {
                match (resolve(ctx, id, lumen), resolve(ctx, id, cell)) {
                    (Ok(lumen), Ok(cell)) => Box::new(Sglt2::new(id.clone(), lumen, cell, config.clone())),
                    _ => Box::new(Sglt2::inert(id.clone(), config.clone())),
                }
            }
            TransporterDefinition::Nhe3 { id, lumen, cell, config } => {
                match (resolve(ctx, id, lumen), resolve(ctx, id, cell)) {
                    (Ok(lumen), Ok(cell)) => Box::new(Nhe3::new(id.clone(), lumen, cell, config.clone())),
                    _ => Box::new(Nhe3::inert(id.clone(), config.clone())),
                }
            }
        }
    }
}

/// Look up a compartment for a transporter, warning once on failure
fn resolve(ctx: &SimulationContext, transporter: &str, name: &str) -> Result<CompartmentId, TransportError> {
    let id = ctx.registry().resolve(name).map_err(|err| {
        log::warn!("Transporter {}: {}; it will be inert", transporter, err);
        err
    })?;
    match ctx.compartment(id) {
        Some(c) if c.is_valid() => Ok(id),
        _ => {
            log::warn!("Transporter {}: compartment {} has no usable volume; it will be inert", transporter, name);
            Err(TransportError::UnknownCompartment(name.to_string()))
        }
    }
}

/// Apical SGLT2 and NHE3, basolateral Na+/K+-ATPase on the default layout
pub fn default_pct_table() -> Vec<TransporterDefinition> {
    vec![
        TransporterDefinition::Sglt2 {
            id: "sglt2".to_string(),
            lumen: LUMEN_ID.to_string(),
            cell: CELL_ID.to_string(),
            config: Sglt2Config::default(),
        },
        TransporterDefinition::Nhe3 {
            id: "nhe3".to_string(),
            lumen: LUMEN_ID.to_string(),
            cell: CELL_ID.to_string(),
            config: Nhe3Config::default(),
        },
        TransporterDefinition::NaKAtpase {
            id: "na_k_atpase".to_string(),
            cell: CELL_ID.to_string(),
            blood: BLOOD_ID.to_string(),
            config: NaKAtpaseConfig::default(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compartment::Compartment;

    #[test]
    fn test_parse_table_with_partial_config() {
        let json = r#"[
            {"kind": "sglt2", "id": "s", "lumen": "kidney.pct.lumen", "cell": "kidney.pct.cell",
             "config": {"transport_count": 5.0}},
            {"kind": "na_k_atpase", "id": "p", "cell": "kidney.pct.cell", "blood": "kidney.pct.blood"}
        ]"#;
        let table: Vec<TransporterDefinition> = serde_json::from_str(json).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].kind(), TransporterKind::Sglt2);
        match &table[0] {
            TransporterDefinition::Sglt2 { config, .. } => {
                assert_eq!(config.transport_count, 5.0);
                assert_eq!(config.km_glucose_mM, Sglt2Config::default().km_glucose_mM);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(table[1].id(), "p");
    }

    #[test]
    fn test_missing_compartment_builds_inert() {
        let mut ctx = SimulationContext::default();
        ctx.add_compartment(CELL_ID, Compartment::cell()).unwrap();
        let table = default_pct_table();
        let built: Vec<_> = table.iter().map(|d| d.build(&ctx)).collect();
        assert!(built.iter().all(|t| t.is_inert()));
    }

    #[test]
    fn test_default_table_wires_everything() {
        let mut ctx = SimulationContext::default();
        ctx.add_compartment(LUMEN_ID, Compartment::lumen()).unwrap();
        ctx.add_compartment(CELL_ID, Compartment::cell()).unwrap();
        ctx.add_compartment(BLOOD_ID, Compartment::blood()).unwrap();
        for def in default_pct_table() {
            let t = def.build(&ctx);
            assert!(!t.is_inert(), "{} inert", def.id());
            assert_eq!(t.kind(), def.kind());
        }
    }
}
