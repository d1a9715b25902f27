// thermo.rs - Canonical thermodynamics from a Wang-Landau ln g(E) table
//
// All partition sums are evaluated in the log domain with the largest
// exponent subtracted first (Am. J. Phys. 72, 1294 (2004)).

use crate::binning::linspace;
use crate::dos::DosTable;
use crate::error::{Result, WlError};
use csv::WriterBuilder;
use serde::Serialize;
use std::path::Path;

/// How to extend a sampled half-spectrum before normalizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Symmetry {
    #[default]
    None,
    /// Reflect `E → −E` (two-state models on bipartite lattices).
    Mirror,
}

/// Normalized `(E, ln g(E))` curve, energies per site.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DosCurve {
    pub energies: Vec<f64>,
    pub ln_dos: Vec<f64>,
}

impl DosCurve {
    #[inline]
    pub fn len(&self) -> usize {
        self.energies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }
}

/// Anchor the first (lowest-energy) row at `ln(num_states)`.
pub fn normalize(table: &DosTable, num_states: usize, symmetry: Symmetry) -> Result<DosCurve> {
    let anchor = table.records.first().ok_or(WlError::EmptyTable)?.ln_dos;
    let ln_q = (num_states as f64).ln();
    // subtract first so the anchor row lands on ln(q) exactly
    let shifted = |l: f64| l - anchor + ln_q;

    let mut energies: Vec<f64> = table.records.iter().map(|r| r.energy).collect();
    let mut ln_dos: Vec<f64> = table.records.iter().map(|r| shifted(r.ln_dos)).collect();

    if symmetry == Symmetry::Mirror {
        let n = table.len();
        for r in table.records[..n - 1].iter().rev() {
            energies.push(-r.energy);
            ln_dos.push(shifted(r.ln_dos));
        }
    }

    Ok(DosCurve { energies, ln_dos })
}

/// Per-site thermodynamic quantities at one temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThermoPoint {
    #[serde(rename = "T")]
    pub temperature: f64,
    #[serde(rename = "F")]
    pub free_energy: f64,
    #[serde(rename = "U")]
    pub internal_energy: f64,
    #[serde(rename = "C")]
    pub heat_capacity: f64,
    #[serde(rename = "S")]
    pub entropy: f64,
}

fn check_lengths(energies: &[f64], ln_dos: &[f64]) -> Result<()> {
    if energies.len() != ln_dos.len() {
        return Err(WlError::LengthMismatch {
            energies: energies.len(),
            ln_dos: ln_dos.len(),
        });
    }
    if energies.is_empty() {
        return Err(WlError::EmptyTable);
    }
    Ok(())
}

/// `ln g(E) − E/kT` for every bin, with total energies `E = e·N`, and its maximum.
fn exponents(t: f64, energies: &[f64], ln_dos: &[f64], n_sites: usize, k: f64) -> (Vec<f64>, f64) {
    let n = n_sites as f64;
    let ex: Vec<f64> = energies
        .iter()
        .zip(ln_dos)
        .map(|(&e, &l)| l - e * n / (k * t))
        .collect();
    let max = ex.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (ex, max)
}

/// Free energy, internal energy, heat capacity and entropy per site.
///
/// `energies` are per site, `n_sites` is the number of lattice sites and `k`
/// the Boltzmann constant.
pub fn thermodynamics(
    t: f64,
    energies: &[f64],
    ln_dos: &[f64],
    n_sites: usize,
    k: f64,
) -> Result<ThermoPoint> {
    check_lengths(energies, ln_dos)?;
    let n = n_sites as f64;
    let (ex, max) = exponents(t, energies, ln_dos, n_sites, k);

    let mut sigma = 0.0;
    let mut mu = 0.0;
    for (&x, &e) in ex.iter().zip(energies) {
        let w = (x - max).exp();
        sigma += w;
        mu += w * e * n;
    }
    let mean_e = mu / sigma;

    // second pass keeps the variance non-negative
    let mut var = 0.0;
    for (&x, &e) in ex.iter().zip(energies) {
        let d = e * n - mean_e;
        var += (x - max).exp() * d * d;
    }
    var /= sigma;

    let ln_z = max + sigma.ln();
    let free_energy = -k * t * ln_z / n;
    let internal_energy = mean_e / n;
    let heat_capacity = var / (k * t * t * n);
    let entropy = (internal_energy - free_energy) / t;

    Ok(ThermoPoint {
        temperature: t,
        free_energy,
        internal_energy,
        heat_capacity,
        entropy,
    })
}

/// Canonical weights `g(E)·e^{−E/kT}` scaled so the largest is 1.
pub fn boltzmann_distribution(
    t: f64,
    energies: &[f64],
    ln_dos: &[f64],
    n_sites: usize,
    k: f64,
) -> Result<Vec<f64>> {
    check_lengths(energies, ln_dos)?;
    let (ex, max) = exponents(t, energies, ln_dos, n_sites, k);
    Ok(ex.into_iter().map(|x| (x - max).exp()).collect())
}

/// `n` temperatures from `t_min` to `t_max`.
pub fn temperatures(t_min: f64, t_max: f64, n: usize) -> Vec<f64> {
    linspace(t_min, t_max, n)
}

pub fn temperature_sweep(curve: &DosCurve, temps: &[f64], n_sites: usize) -> Result<Vec<ThermoPoint>> {
    temps
        .iter()
        .map(|&t| thermodynamics(t, &curve.energies, &curve.ln_dos, n_sites, 1.0))
        .collect()
}

/// Temperature of the heat-capacity maximum in a sweep.
pub fn heat_capacity_peak(sweep: &[ThermoPoint]) -> Option<&ThermoPoint> {
    sweep
        .iter()
        .filter(|p| p.heat_capacity.is_finite())
        .max_by(|a, b| a.heat_capacity.total_cmp(&b.heat_capacity))
}

/// Exact transition temperature of the square-lattice q-state Potts model.
pub fn critical_temperature(q: usize, coupling: f64) -> f64 {
    coupling / (1.0 + (q as f64).sqrt()).ln()
}

#[derive(Serialize)]
struct CurveRow {
    #[serde(rename = "E")]
    energy: f64,
    #[serde(rename = "lng(E)")]
    ln_dos: f64,
}

pub fn write_curve(path: impl AsRef<Path>, curve: &DosCurve) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    for (&energy, &ln_dos) in curve.energies.iter().zip(&curve.ln_dos) {
        wtr.serialize(CurveRow { energy, ln_dos })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_sweep(path: impl AsRef<Path>, sweep: &[ThermoPoint]) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    for p in sweep {
        wtr.serialize(p)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dos::DosRecord;

    fn table(rows: &[(f64, f64)]) -> DosTable {
        DosTable::new(
            rows.iter()
                .map(|&(energy, ln_dos)| DosRecord { energy, ln_dos, histogram: 1.0 })
                .collect(),
        )
    }

    #[test]
    fn test_mirror_is_symmetric() {
        let t = table(&[(-2.0, 10.0), (-1.0, 13.0), (0.0, 15.0)]);
        let c = normalize(&t, 2, Symmetry::Mirror).unwrap();
        assert_eq!(c.energies, vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
        let n = c.len();
        for i in 0..n {
            assert!((c.ln_dos[i] - c.ln_dos[n - 1 - i]).abs() < 1e-12);
        }
        assert!((c.ln_dos[0] - 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_heat_capacity_non_negative() {
        let e = [-2.0, -1.5, -1.0, -0.5, 0.0];
        let l = [0.7, 20.0, 35.0, 42.0, 44.0];
        for &t in &[0.2, 0.8, 1.5, 5.0] {
            let p = thermodynamics(t, &e, &l, 36, 1.0).unwrap();
            assert!(p.heat_capacity >= 0.0);
            assert!(p.free_energy.is_finite());
        }
    }

    #[test]
    fn test_length_mismatch() {
        let err = thermodynamics(1.0, &[0.0, 1.0], &[0.0], 4, 1.0);
        assert!(matches!(err, Err(WlError::LengthMismatch { .. })));
    }
}
