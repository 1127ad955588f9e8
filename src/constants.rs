//! Physical constants shared by the transport engine.
//!
//! SI values from the 2019 redefinition (exact where CODATA defines them so).
//!
//! References:
//! - Tiesinga E et al. Rev Mod Phys. 2021;93:025010 (CODATA 2018)
//! - Hille B. Ion Channels of Excitable Membranes. 3rd ed. Sinauer, 2001

/// Faraday constant (C/mol)
pub const FARADAY_C_PER_MOL: f64 = 96_485.332_12;

/// Molar gas constant (J/(mol·K))
pub const GAS_CONSTANT_J_PER_MOL_K: f64 = 8.314_462_618;

/// Body temperature (K), 37 °C
pub const BODY_TEMPERATURE_K: f64 = 310.15;

/// Elementary charge (C)
pub const ELEMENTARY_CHARGE_C: f64 = 1.602_176_634e-19;

/// Avogadro constant (1/mol)
pub const AVOGADRO_PER_MOL: f64 = 6.022_140_76e23;

/// Boltzmann constant (J/K)
pub const BOLTZMANN_J_PER_K: f64 = 1.380_649e-23;

/// Planck constant (J·s)
pub const PLANCK_J_S: f64 = 6.626_070_15e-34;

/// GHK slope at body temperature (mV per decade)
///
/// 2.303·RT/F ≈ 61.5 mV at 37 °C
pub const GHK_SLOPE_MV_PER_DECADE: f64 = 61.5;

/// Resting potential used whenever a voltage computation degenerates (mV)
pub const FALLBACK_POTENTIAL_MV: f64 = -70.0;

/// RT at the given temperature (J/mol)
#[inline]
pub fn rt_J_per_mol(temperature_K: f64) -> f64 {
    GAS_CONSTANT_J_PER_MOL_K * temperature_K
}

/// Transition-state-theory attempt frequency kB·T/h (1/s)
///
/// ≈ 6.46e12 /s at body temperature.
#[inline]
pub fn tst_prefactor_per_sec(temperature_K: f64) -> f64 {
    BOLTZMANN_J_PER_K * temperature_K / PLANCK_J_S
}

/// Convert a particle count in `volume_L` litres to millimolar
///
/// Returns 0 for non-positive or non-finite volumes, and never a negative
/// concentration.
#[inline]
pub fn count_to_mM(count: f64, volume_L: f64) -> f64 {
    if volume_L <= 0.0 || !volume_L.is_finite() {
        return 0.0;
    }
    let mM = count.max(0.0) / AVOGADRO_PER_MOL / volume_L * 1000.0;
    if mM.is_finite() {
        mM
    } else {
        0.0
    }
}

/// Convert a millimolar concentration in `volume_L` litres to a particle count
#[inline]
pub fn mM_to_count(mM: f64, volume_L: f64) -> f64 {
    if volume_L <= 0.0 || !volume_L.is_finite() || !mM.is_finite() {
        return 0.0;
    }
    mM.max(0.0) * 1e-3 * volume_L * AVOGADRO_PER_MOL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ghk_slope_matches_rt_over_f() {
        let slope = std::f64::consts::LN_10 * rt_J_per_mol(BODY_TEMPERATURE_K) / FARADAY_C_PER_MOL * 1000.0;
        assert!((slope - GHK_SLOPE_MV_PER_DECADE).abs() < 0.1, "slope = {}", slope);
    }

    #[test]
    fn test_count_conversion_roundtrip() {
        let volume_L = 2e-12;
        let count = mM_to_count(12.0, volume_L);
        // 12 mM in 2 pL ≈ 1.445e10 ions
        assert!((count - 1.4453e10).abs() / 1.4453e10 < 1e-3);
        assert!((count_to_mM(count, volume_L) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_volume_yields_zero() {
        assert_eq!(count_to_mM(1e9, 0.0), 0.0);
        assert_eq!(count_to_mM(1e9, f64::NAN), 0.0);
        assert_eq!(mM_to_count(10.0, -1.0), 0.0);
        assert_eq!(count_to_mM(-5.0, 1e-12), 0.0);
    }

    #[test]
    fn test_tst_prefactor_magnitude() {
        let k0 = tst_prefactor_per_sec(BODY_TEMPERATURE_K);
        assert!(k0 > 6.4e12 && k0 < 6.5e12, "k0 = {}", k0);
    }
}
