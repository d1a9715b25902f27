// config.rs - Run configuration (single source of truth for one WL run)

use crate::dos::RunSummary;
use crate::error::{Result, WlError};
use crate::lattice::EnergyMode;
use crate::wang_landau::{WlParams, WlResult};
use std::path::PathBuf;

/// Run-time configuration for one Wang-Landau run.
#[derive(Debug, Clone, PartialEq)]
pub struct WlConfig {
    pub grid_size: usize,
    pub directory: PathBuf,
    pub flatness: f64,
    pub final_lnf: f64,
    pub bins: usize,
    pub q: usize,
    pub max_steps: usize,
    pub interval: usize,
    pub coupling: f64,
    pub max_proposal_retries: usize,
    /// Random lattices tried before giving up on an in-range start.
    pub max_init_attempts: usize,
    pub energy_mode: EnergyMode,
    /// `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for WlConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            directory: PathBuf::from("WLA-RUN"),
            flatness: 0.8,
            final_lnf: 1e-6,
            bins: 100,
            q: 2,
            max_steps: 1_000_000,
            interval: 100,
            coupling: 1.0,
            max_proposal_retries: 100_000,
            max_init_attempts: 10_000,
            energy_mode: EnergyMode::FullRecompute,
            seed: None,
        }
    }
}

impl WlConfig {
    #[inline]
    pub fn particles(&self) -> usize {
        self.grid_size * self.grid_size
    }

    /// `(LB, UB) = (−2·L², 0)`.
    pub fn bounds(&self) -> (f64, f64) {
        (-2.0 * self.particles() as f64, 0.0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_size < 2 {
            return Err(WlError::InvalidConfig("grid size must be at least 2".into()));
        }
        if self.max_init_attempts == 0 {
            return Err(WlError::InvalidConfig("max_init_attempts must be positive".into()));
        }
        self.params().validate()
    }

    pub fn params(&self) -> WlParams {
        let (lower, upper) = self.bounds();
        WlParams {
            q: self.q,
            coupling: self.coupling,
            lower,
            upper,
            nbins: self.bins,
            max_steps: self.max_steps,
            flatness: self.flatness,
            control_lnf: self.final_lnf,
            interval: self.interval,
            max_proposal_retries: self.max_proposal_retries,
            energy_mode: self.energy_mode,
        }
    }

    pub fn summary(&self, result: &WlResult) -> RunSummary {
        RunSummary {
            size: self.grid_size,
            q: self.q,
            bins: self.bins,
            flatness: self.flatness,
            final_lnf: self.final_lnf,
            status: result.outcome.label().to_string(),
            lnf_reached: result.outcome.lnf(),
            passes: result.passes.len(),
            active_bins: result.table.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cli() {
        let cfg = WlConfig::default();
        assert_eq!(cfg.bounds(), (-200.0, 0.0));
        assert_eq!(cfg.params().nbins, 100);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_rejects_single_state() {
        let cfg = WlConfig { q: 1, ..WlConfig::default() };
        assert!(matches!(cfg.validate(), Err(WlError::InvalidConfig(_))));
    }
}
