pub mod error;
pub mod lattice;
pub mod binning;
pub mod wang_landau;
pub mod dos;
pub mod thermo;
pub mod config;
pub mod batch;
pub mod utils;

pub use error::{Result, WlError};
pub use wang_landau::{Outcome, Phase, WangLandau, WlParams, WlResult};
