// batch.rs - Independent WL runs, one per configuration, spread over rayon workers

use crate::config::WlConfig;
use crate::error::Result;
use crate::lattice::Lattice;
use crate::utils::rng::run_rng;
use crate::wang_landau::{WangLandau, WlEvent, WlResult};
use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

/// Draw an in-range starting lattice for `cfg` and run it to completion.
pub fn run_config<R, F>(cfg: &WlConfig, mut rng: R, observer: F) -> Result<WlResult>
where
    R: Rng,
    F: FnMut(&WlEvent),
{
    cfg.validate()?;
    let (lower, upper) = cfg.bounds();
    let lattice = Lattice::random_within(
        cfg.grid_size,
        cfg.q,
        cfg.coupling,
        lower,
        upper,
        cfg.max_init_attempts,
        &mut rng,
    )?;
    info!(
        "initial {}x{} lattice, energy {}",
        cfg.grid_size,
        cfg.grid_size,
        lattice.grid_energy(cfg.coupling)
    );
    let mut wl = WangLandau::new(lattice, cfg.params(), rng)?;
    wl.run_with(observer)
}

/// Outcome of one run in a batch.
#[derive(Debug)]
pub struct BatchRun {
    pub index: usize,
    pub config: WlConfig,
    pub seed: Option<u64>,
    pub result: Result<WlResult>,
}

/// Run every configuration in parallel; results come back in input order.
///
/// A configuration with an explicit seed uses it, the others derive one from
/// `master_seed` and their position. `observer` sees `(run index, event)`.
pub fn run_batch<F>(configs: &[WlConfig], master_seed: u64, observer: F) -> Vec<BatchRun>
where
    F: Fn(usize, &WlEvent) + Sync,
{
    configs
        .par_iter()
        .enumerate()
        .map(|(index, cfg)| {
            let rng = match cfg.seed {
                Some(s) => ChaCha20Rng::seed_from_u64(s),
                None => run_rng(master_seed, index),
            };
            let result = run_config(cfg, rng, |ev| observer(index, ev));
            BatchRun {
                index,
                config: cfg.clone(),
                seed: cfg.seed,
                result,
            }
        })
        .collect()
}
