//! Parallel independent runs.

use potts_wl::batch::run_batch;
use potts_wl::config::WlConfig;
use potts_wl::lattice::EnergyMode;
use potts_wl::WlError;

fn small(size: usize) -> WlConfig {
    WlConfig {
        grid_size: size,
        bins: 12,
        q: 2,
        max_steps: 3_000,
        final_lnf: 0.05,
        energy_mode: EnergyMode::Incremental,
        ..WlConfig::default()
    }
}

#[test]
fn test_results_in_input_order_and_reproducible() {
    let configs = vec![small(4), small(3), small(5)];

    let a = run_batch(&configs, 0xC0FFEE, |_, _| {});
    let b = run_batch(&configs, 0xC0FFEE, |_, _| {});

    assert_eq!(a.len(), 3);
    for (k, (ra, rb)) in a.iter().zip(&b).enumerate() {
        assert_eq!(ra.index, k);
        assert_eq!(ra.config.grid_size, configs[k].grid_size);
        let (ta, tb) = (ra.result.as_ref().unwrap(), rb.result.as_ref().unwrap());
        assert_eq!(ta, tb);
        assert!(!ta.table.is_empty());
    }
}

#[test]
fn test_invalid_config_fails_alone() {
    let configs = vec![small(4), WlConfig { q: 0, ..small(4) }];
    let runs = run_batch(&configs, 1, |_, _| {});
    assert!(runs[0].result.is_ok());
    assert!(matches!(runs[1].result, Err(WlError::InvalidConfig(_))));
}
