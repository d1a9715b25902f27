//! DOS normalization and canonical thermodynamics from ln g(E).

use potts_wl::binning::linspace;
use potts_wl::dos::{DosRecord, DosTable};
use potts_wl::thermo::{
    boltzmann_distribution, critical_temperature, heat_capacity_peak, normalize, temperature_sweep,
    temperatures, thermodynamics, DosCurve, Symmetry,
};

fn table(ln_dos: &[f64]) -> DosTable {
    let energies = linspace(-2.0, 0.0, ln_dos.len());
    DosTable::new(
        energies
            .iter()
            .zip(ln_dos)
            .map(|(&energy, &ln_dos)| DosRecord { energy, ln_dos, histogram: 1.0 })
            .collect(),
    )
}

#[test]
fn test_normalization_anchors_first_row() {
    let t = table(&[17.3, 19.1, 24.8, 30.0, 31.7]);
    for q in [2usize, 3, 8] {
        let c = normalize(&t, q, Symmetry::None).unwrap();
        assert_eq!(c.ln_dos[0], (q as f64).ln());
        assert_eq!(c.len(), 5);
        // differences are preserved
        assert!((c.ln_dos[4] - c.ln_dos[0] - (31.7 - 17.3)).abs() < 1e-12);
    }
}

#[test]
fn test_empty_table_is_rejected() {
    assert!(normalize(&DosTable::default(), 2, Symmetry::None).is_err());
}

#[test]
fn test_flat_dos_high_temperature_entropy() {
    // Σ g(E) = q^N spread evenly over the bins
    let n_sites = 16;
    let m = 17;
    for q in [2usize, 3, 8] {
        let ln_g = n_sites as f64 * (q as f64).ln() - (m as f64).ln();
        let energies = linspace(-2.0, 0.0, m);
        let ln_dos = vec![ln_g; m];

        let p = thermodynamics(1e6, &energies, &ln_dos, n_sites, 1.0).unwrap();
        assert!(
            (p.entropy - (q as f64).ln()).abs() < 1e-4,
            "S = {} for q = {q}",
            p.entropy
        );
    }
}

#[test]
fn test_low_temperature_limit() {
    // a single ground state bin dominates at low T
    let energies = [-2.0, -1.0, 0.0];
    let ln_dos = [2f64.ln(), 10.0, 12.0];
    let p = thermodynamics(0.01, &energies, &ln_dos, 16, 1.0).unwrap();
    assert!((p.internal_energy + 2.0).abs() < 1e-9);
    assert!(p.heat_capacity < 1e-9);
    assert!(p.free_energy.is_finite());
}

#[test]
fn test_no_overflow_for_large_systems() {
    // ln g values far beyond f64::MAX.ln() once exponentiated naively
    let energies = linspace(-2.0, 0.0, 50);
    let ln_dos: Vec<f64> = (0..50).map(|k| 5_000.0 * (k as f64 / 49.0)).collect();
    for t in temperatures(0.05, 10.0, 40) {
        let p = thermodynamics(t, &energies, &ln_dos, 10_000, 1.0).unwrap();
        assert!(p.free_energy.is_finite());
        assert!(p.internal_energy.is_finite());
        assert!(p.heat_capacity.is_finite() && p.heat_capacity >= 0.0);
        assert!(p.entropy.is_finite());
    }
    let w = boltzmann_distribution(1.0, &energies, &ln_dos, 10_000, 1.0).unwrap();
    assert!(w.iter().all(|x| x.is_finite() && (0.0..=1.0).contains(x)));
    assert!(w.iter().any(|&x| x == 1.0));
}

#[test]
fn test_sweep_and_peak() {
    let curve = DosCurve {
        energies: linspace(-2.0, 0.0, 5),
        ln_dos: vec![0.7, 8.0, 12.0, 13.0, 13.5],
    };
    let temps = temperatures(0.1, 3.0, 60);
    let sweep = temperature_sweep(&curve, &temps, 16).unwrap();
    assert_eq!(sweep.len(), 60);
    assert_eq!(sweep[0].temperature, 0.1);

    let peak = heat_capacity_peak(&sweep).unwrap();
    assert!(sweep.iter().all(|p| p.heat_capacity <= peak.heat_capacity));
}

#[test]
fn test_ising_critical_temperature() {
    let tc = critical_temperature(2, 1.0);
    assert!((tc - 1.0 / (1.0 + 2f64.sqrt()).ln()).abs() < 1e-15);
}
