//! Kinetic rate laws and the intra-compartment reaction interface.
//!
//! Provides the saturation and rate expressions shared by enzymes and
//! transporters:
//! - Michaelis-Menten saturation and velocity
//! - Per-tick event probability from a first-order rate
//!
//! References:
//! - Michaelis L, Menten ML. Biochemische Zeitschrift. 1913;49:333-369
//! - Cornish-Bowden A. Fundamentals of Enzyme Kinetics. 4th ed. Wiley-Blackwell, 2012

use serde::Serialize;

use crate::compartment::IonPool;

/// Forward and backward turnover of a reaction during one tick (particles)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReactionFlux {
    pub forward: f64,
    pub backward: f64,
}

impl ReactionFlux {
    /// Forward minus backward turnover
    pub fn net(&self) -> f64 {
        self.forward - self.backward
    }
}

/// A chemical reaction confined to one compartment
///
/// Reactions read and write particle counts directly through [`IonPool`],
/// and must never debit more than is present.
pub trait CompartmentReaction: Send {
    /// Reaction name (e.g., "Carbonic anhydrase")
    fn name(&self) -> &'static str;

    /// EC number for enzyme-catalysed reactions
    fn ec_number(&self) -> Option<&'static str> {
        None
    }

    /// Advance the reaction by `delta_sec`
    fn react(&mut self, pool: &mut dyn IonPool, delta_sec: f64) -> ReactionFlux;
}

/// Fractional saturation [S] / (Km + [S])
///
/// 0 for empty or invalid substrate, exactly 0.5 at [S] = Km, → 1 as [S] → ∞.
#[inline]
pub fn fractional_saturation(s_mM: f64, km_mM: f64) -> f64 {
    if s_mM.is_nan() || s_mM <= 0.0 {
        return 0.0;
    }
    if s_mM.is_infinite() {
        return 1.0;
    }
    let km = km_mM.max(0.0);
    let sat = s_mM / (km + s_mM);
    if sat.is_finite() {
        sat.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Simple Michaelis-Menten kinetics
///
/// v = Vmax · [S] / (Km + [S])
#[inline]
pub fn michaelis_menten(vmax: f64, km_mM: f64, s_mM: f64) -> f64 {
    vmax * fractional_saturation(s_mM, km_mM)
}

/// Probability that an event with rate `rate_per_sec` fires within one tick
///
/// First-order estimate rate · Δt, clamped to [0, 1].
#[inline]
pub fn event_probability(rate_per_sec: f64, delta_sec: f64) -> f64 {
    let p = rate_per_sec * delta_sec;
    if p.is_finite() {
        p.clamp(0.0, 1.0)
    } else if p == f64::INFINITY {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturation_at_km_is_half() {
        for km in [0.001, 1.5, 15.0, 2500.0] {
            assert_eq!(fractional_saturation(km, km), 0.5);
        }
    }

    #[test]
    fn test_saturation_limits() {
        assert_eq!(fractional_saturation(0.0, 10.0), 0.0);
        assert_eq!(fractional_saturation(-1.0, 10.0), 0.0);
        assert_eq!(fractional_saturation(f64::NAN, 10.0), 0.0);
        assert!(fractional_saturation(1e-9, 10.0) < 1e-9);
        assert!(fractional_saturation(1e12, 10.0) > 1.0 - 1e-10);
        assert_eq!(fractional_saturation(f64::INFINITY, 10.0), 1.0);
    }

    #[test]
    fn test_michaelis_menten() {
        let v = michaelis_menten(100.0, 10.0, 10.0);
        assert!((v - 50.0).abs() < 1e-12);
        assert_eq!(michaelis_menten(100.0, 10.0, 0.0), 0.0);
    }

    #[test]
    fn test_event_probability_clamped() {
        assert!((event_probability(10.0, 0.01) - 0.1).abs() < 1e-15);
        assert_eq!(event_probability(1e6, 1.0), 1.0);
        assert_eq!(event_probability(-5.0, 1.0), 0.0);
        assert_eq!(event_probability(f64::NAN, 1.0), 0.0);
    }
}
