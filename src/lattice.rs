// lattice.rs - Square periodic q-state Potts lattice and its energy model

use crate::error::{Result, WlError};
use rand::Rng;

/// Site label. Valid labels are `0..q`.
pub type State = u8;

/// Largest supported number of Potts states.
pub const MAX_Q: usize = State::MAX as usize;

/// How the engine obtains the energy of a trial configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnergyMode {
    /// Recompute the whole lattice energy for every trial, O(size²).
    #[default]
    FullRecompute,
    /// Keep a running total and add the four-bond delta of each move, O(1).
    Incremental,
}

/// A single-site proposal: site `(i, j)` goes from `old_state` to `new_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub i: usize,
    pub j: usize,
    pub old_state: State,
    pub new_state: State,
}

impl Move {
    /// A proposal that keeps the site's current state.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.old_state == self.new_state
    }
}

/// Square `size × size` grid with periodic boundaries, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lattice {
    size: usize,
    grid: Vec<State>,
}

impl Lattice {
    /// All sites in state 0 (a ground state).
    pub fn new(size: usize) -> Self {
        Self {
            size,
            grid: vec![0; size * size],
        }
    }

    /// Build from explicit row-major states.
    pub fn from_states(size: usize, states: Vec<State>) -> Result<Self> {
        if states.len() != size * size {
            return Err(WlError::InvalidConfig(format!(
                "expected {} states for a {size}x{size} lattice, got {}",
                size * size,
                states.len()
            )));
        }
        Ok(Self { size, grid: states })
    }

    /// Uniformly random states in `0..q`.
    pub fn random(size: usize, q: usize, rng: &mut impl Rng) -> Self {
        let mut lattice = Self::new(size);
        lattice.randomize(q, rng);
        lattice
    }

    /// Draw random lattices until one has its energy inside `[lower, upper]`.
    pub fn random_within(
        size: usize,
        q: usize,
        coupling: f64,
        lower: f64,
        upper: f64,
        max_attempts: usize,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        for _ in 0..max_attempts {
            let lattice = Self::random(size, q, rng);
            let e = lattice.grid_energy(coupling);
            if e >= lower && e <= upper {
                return Ok(lattice);
            }
        }
        Err(WlError::InitialLatticeOutOfRange {
            attempts: max_attempts,
            lower,
            upper,
        })
    }

    /// Assign every site independently and uniformly from `0..q`.
    pub fn randomize(&mut self, q: usize, rng: &mut impl Rng) {
        for s in self.grid.iter_mut() {
            *s = rng.gen_range(0..q) as State;
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of sites, `size²`.
    #[inline]
    pub fn particles(&self) -> usize {
        self.grid.len()
    }

    #[inline]
    pub fn states(&self) -> &[State] {
        &self.grid
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> State {
        self.grid[i * self.size + j]
    }

    /// Overwrite one site. Indices are the caller's responsibility.
    #[inline]
    pub fn set_position(&mut self, i: usize, j: usize, k: State) {
        self.grid[i * self.size + j] = k;
    }

    /// The four toroidal neighbors of `(i, j)`.
    #[inline]
    pub fn neighbors(&self, i: usize, j: usize) -> [(usize, usize); 4] {
        let n = self.size;
        [
            ((i + 1) % n, j),
            ((i + n - 1) % n, j),
            (i, (j + 1) % n),
            (i, (j + n - 1) % n),
        ]
    }

    /// Number of neighbors of `(i, j)` in state `s`.
    #[inline]
    fn matching_neighbors(&self, i: usize, j: usize, s: State) -> usize {
        self.neighbors(i, j)
            .iter()
            .filter(|&&(x, y)| self.get(x, y) == s)
            .count()
    }

    /// Interaction energy of one site with its four neighbors.
    pub fn site_energy(&self, i: usize, j: usize, coupling: f64) -> f64 {
        let s = self.get(i, j);
        let mut e = 0.0;
        for (x, y) in self.neighbors(i, j) {
            if self.get(x, y) == s {
                e -= coupling;
            }
        }
        e
    }

    /// Total energy, every bond counted from both endpoints and halved.
    pub fn grid_energy(&self, coupling: f64) -> f64 {
        let mut energy = 0.0;
        for i in 0..self.size {
            for j in 0..self.size {
                energy += self.site_energy(i, j, coupling);
            }
        }
        energy / 2.0
    }

    /// Change in total energy if `(i, j)` were set to `new_state`.
    pub fn energy_delta(&self, i: usize, j: usize, new_state: State, coupling: f64) -> f64 {
        let old_state = self.get(i, j);
        if old_state == new_state {
            return 0.0;
        }
        let before = self.matching_neighbors(i, j, old_state) as f64;
        let after = self.matching_neighbors(i, j, new_state) as f64;
        -coupling * (after - before)
    }

    /// Random site and random target state in `0..q`; the lattice is untouched.
    pub fn propose_move(&self, q: usize, rng: &mut impl Rng) -> Move {
        let i = rng.gen_range(0..self.size);
        let j = rng.gen_range(0..self.size);
        let new_state = rng.gen_range(0..q) as State;
        Move {
            i,
            j,
            old_state: self.get(i, j),
            new_state,
        }
    }

    #[inline]
    pub fn apply(&mut self, mv: &Move) {
        self.set_position(mv.i, mv.j, mv.new_state);
    }

    #[inline]
    pub fn revert(&mut self, mv: &Move) {
        self.set_position(mv.i, mv.j, mv.old_state);
    }

    /// Potts order parameter `(q·max_k n_k/N − 1)/(q − 1)`, in `[0, 1]`.
    pub fn order_parameter(&self, q: usize) -> f64 {
        if q < 2 || self.grid.is_empty() {
            return 1.0;
        }
        let mut counts = vec![0usize; q];
        for &s in &self.grid {
            if let Some(c) = counts.get_mut(s as usize) {
                *c += 1;
            }
        }
        let max = counts.iter().copied().max().unwrap_or(0) as f64;
        let frac = max / self.grid.len() as f64;
        (q as f64 * frac - 1.0) / (q as f64 - 1.0)
    }
}
