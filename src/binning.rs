// binning.rs - Discrete energy reference grid

/// Ordered, linearly spaced energies. Each point is one WL accumulator slot.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyGrid {
    values: Vec<f64>,
}

impl EnergyGrid {
    /// `n` points from `lower` to `upper` inclusive; the last point is exactly `upper`.
    pub fn linspace(lower: f64, upper: f64, n: usize) -> Self {
        Self { values: linspace(lower, upper, n) }
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn index(&self, energy: f64) -> Option<usize> {
        bin_index(&self.values, energy)
    }
}

/// `n` evenly spaced values over `[lower, upper]`, endpoints included.
pub fn linspace(lower: f64, upper: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lower],
        _ => {
            let step = (upper - lower) / (n - 1) as f64;
            let mut v: Vec<f64> = (0..n).map(|k| lower + k as f64 * step).collect();
            v[n - 1] = upper;
            v
        }
    }
}

/// Position of the greatest grid value `<= value`.
///
/// `None` when `value` is below the first grid point (or is NaN). Values at
/// or above the last point map to the last index.
#[inline]
pub fn bin_index(grid: &[f64], value: f64) -> Option<usize> {
    // right-biased search, then step back one
    grid.partition_point(|&g| g <= value).checked_sub(1)
}
