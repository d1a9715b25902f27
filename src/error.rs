// error.rs - Error type shared by the sampler, persistence and analysis code

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WlError>;

/// Everything that can go wrong in a Wang-Landau run or its post-processing.
///
/// Non-convergence is *not* an error: a stalled run finishes with
/// [`Outcome::Aborted`](crate::wang_landau::Outcome) instead.
#[derive(Debug, Error)]
pub enum WlError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The constrained proposal gave up.
    #[error("no in-range move found after {retries} retries (energy {energy}, bounds [{lower}, {upper}])")]
    NoInRangeMove {
        retries: usize,
        energy: f64,
        lower: f64,
        upper: f64,
    },

    #[error("energy {energy} lies below the reference grid starting at {grid_min}")]
    EnergyOutsideGrid { energy: f64, grid_min: f64 },

    #[error("no random lattice with energy in [{lower}, {upper}] after {attempts} attempts")]
    InitialLatticeOutOfRange {
        attempts: usize,
        lower: f64,
        upper: f64,
    },

    #[error("initial lattice energy {energy} lies outside [{lower}, {upper}]")]
    InitialEnergyOutOfRange { energy: f64, lower: f64, upper: f64 },

    #[error("no energy bin lies inside [{lower}, {upper}]")]
    NoActiveBins { lower: f64, upper: f64 },

    #[error("empty DOS table")]
    EmptyTable,

    #[error("length mismatch: {energies} energies vs {ln_dos} ln g(E) values")]
    LengthMismatch { energies: usize, ln_dos: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
