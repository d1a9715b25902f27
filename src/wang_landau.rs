// wang_landau.rs - Wang-Landau density-of-states sampler for the Potts lattice
//
// One engine owns the lattice, the ln g(E) estimate, the histogram and the
// active-bin mask. `step` performs a single trial (or resolves a pass
// boundary); `run` drives it to a terminal phase.

use crate::binning::EnergyGrid;
use crate::dos::{DosRecord, DosTable};
use crate::error::{Result, WlError};
use crate::lattice::{EnergyMode, Lattice, Move, MAX_Q};
use log::{debug, info, warn};
use rand::Rng;

/// Sampler parameters. Energies are totals, not per site.
#[derive(Debug, Clone, PartialEq)]
pub struct WlParams {
    /// Number of Potts states.
    pub q: usize,
    /// Coupling constant `J`.
    pub coupling: f64,
    /// Lower energy bound `LB`.
    pub lower: f64,
    /// Upper energy bound `UB`.
    pub upper: f64,
    /// Number of energy bins.
    pub nbins: usize,
    /// Trial budget per modification factor.
    pub max_steps: usize,
    /// Flatness threshold.
    pub flatness: f64,
    /// Stop once `lnf` drops to this value.
    pub control_lnf: f64,
    /// Progress report every `size² × interval` trials.
    pub interval: usize,
    /// Ceiling on redraws while looking for an in-range proposal.
    pub max_proposal_retries: usize,
    pub energy_mode: EnergyMode,
}

impl WlParams {
    /// Defaults for a `size × size` lattice: `LB = -2·size²`, `UB = 0`.
    pub fn for_size(size: usize) -> Self {
        let particles = (size * size) as f64;
        Self {
            q: 2,
            coupling: 1.0,
            lower: -2.0 * particles,
            upper: 0.0,
            nbins: 100,
            max_steps: 1_000_000,
            flatness: 0.8,
            control_lnf: 1e-6,
            interval: 100,
            max_proposal_retries: 100_000,
            energy_mode: EnergyMode::FullRecompute,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(WlError::InvalidConfig(msg));
        if !(2..=MAX_Q).contains(&self.q) {
            return fail(format!("q must be in 2..={MAX_Q}, got {}", self.q));
        }
        if !self.coupling.is_finite() {
            return fail(format!("coupling must be finite, got {}", self.coupling));
        }
        if !(self.lower.is_finite() && self.upper.is_finite()) || self.lower > self.upper {
            return fail(format!(
                "energy bounds must satisfy LB <= UB, got [{}, {}]",
                self.lower, self.upper
            ));
        }
        if self.nbins == 0 {
            return fail("at least one energy bin is required".into());
        }
        if self.max_steps == 0 || self.interval == 0 || self.max_proposal_retries == 0 {
            return fail("max_steps, interval and max_proposal_retries must be positive".into());
        }
        if !(self.flatness > 0.0 && self.flatness <= 1.0) {
            return fail(format!("flatness must be in (0, 1], got {}", self.flatness));
        }
        if !(self.control_lnf >= 0.0 && self.control_lnf.is_finite()) {
            return fail(format!("final lnf must be >= 0, got {}", self.control_lnf));
        }
        Ok(())
    }
}

/// Engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Inside a pass, running trials.
    Iterating,
    /// The histogram became flat; `lnf` has been halved.
    Flat,
    /// The first pass ran out of steps; unvisited bins were pruned and `lnf` halved.
    StalledFirstPass,
    /// A later pass ran out of steps; `lnf` has been forced to 0.
    StalledLaterPass,
    Converged,
    Aborted,
}

impl Phase {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Converged | Phase::Aborted)
    }
}

/// How a pass (one modification factor) ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PassEnd {
    Flat,
    /// First-pass stall; these previously active bins were excluded for good.
    Pruned { bins: Vec<usize> },
    Stalled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassSummary {
    pub index: usize,
    /// Modification factor used throughout the pass.
    pub lnf: f64,
    pub trials: usize,
    pub end: PassEnd,
}

/// Periodic diagnostic snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub pass: usize,
    pub trial: usize,
    pub lnf: f64,
    /// `min / (mean · flatness)` over active bins; flat once above 1.
    pub flatness_ratio: f64,
    /// Least visited active bin.
    pub weakest_bin: Option<usize>,
    pub energy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WlEvent {
    Progress(Progress),
    PassFinished(PassSummary),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// `lnf` reached the control threshold.
    Converged { lnf: f64 },
    /// A later pass stalled at modification factor `lnf`; the estimate is partial.
    Aborted { lnf: f64 },
    /// Snapshot taken before the run finished.
    Unfinished { lnf: f64 },
}

impl Outcome {
    #[inline]
    pub fn is_converged(&self) -> bool {
        matches!(self, Outcome::Converged { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Converged { .. } => "converged",
            Outcome::Aborted { .. } => "aborted",
            Outcome::Unfinished { .. } => "unfinished",
        }
    }

    pub fn lnf(&self) -> f64 {
        match *self {
            Outcome::Converged { lnf } | Outcome::Aborted { lnf } | Outcome::Unfinished { lnf } => lnf,
        }
    }
}

/// Filtered output of a run plus how it ended.
#[derive(Debug, Clone, PartialEq)]
pub struct WlResult {
    pub table: DosTable,
    pub outcome: Outcome,
    pub passes: Vec<PassSummary>,
}

pub struct WangLandau<R: Rng> {
    lattice: Lattice,
    params: WlParams,
    grid: EnergyGrid,
    lnge: Vec<f64>,
    hist: Vec<u64>,
    mask: Vec<bool>,
    lnf: f64,
    /// Energy of the current configuration.
    energy: f64,
    phase: Phase,
    /// Trials performed in the current pass.
    trial: usize,
    passes: Vec<PassSummary>,
    stalled_lnf: Option<f64>,
    rng: R,
}

impl<R: Rng> WangLandau<R> {
    /// Set up the grid and mask for `lattice`, whose energy must lie in `[LB, UB]`.
    pub fn new(lattice: Lattice, params: WlParams, rng: R) -> Result<Self> {
        params.validate()?;
        if lattice.size() < 2 {
            return Err(WlError::InvalidConfig("lattice side must be at least 2".into()));
        }
        if lattice.states().iter().any(|&s| s as usize >= params.q) {
            return Err(WlError::InvalidConfig(format!(
                "lattice holds states outside 0..{}",
                params.q
            )));
        }

        let grid = EnergyGrid::linspace(params.lower, params.upper, params.nbins);
        let mask: Vec<bool> = grid
            .values()
            .iter()
            .map(|&e| e >= params.lower && e <= params.upper)
            .collect();
        if !mask.iter().any(|&m| m) {
            return Err(WlError::NoActiveBins { lower: params.lower, upper: params.upper });
        }

        let energy = lattice.grid_energy(params.coupling);
        if energy < params.lower || energy > params.upper {
            return Err(WlError::InitialEnergyOutOfRange {
                energy,
                lower: params.lower,
                upper: params.upper,
            });
        }
        if grid.index(energy).is_none() {
            return Err(WlError::EnergyOutsideGrid { energy, grid_min: params.lower });
        }

        let lnf = 1.0;
        let phase = if lnf > params.control_lnf { Phase::Iterating } else { Phase::Converged };

        info!(
            "WL setup: L={} q={} bins={} bounds=[{}, {}] final lnf={}",
            lattice.size(),
            params.q,
            params.nbins,
            params.lower,
            params.upper,
            params.control_lnf
        );

        Ok(Self {
            lnge: vec![0.0; params.nbins],
            hist: vec![0; params.nbins],
            lattice,
            params,
            grid,
            mask,
            lnf,
            energy,
            phase,
            trial: 0,
            passes: Vec::new(),
            stalled_lnf: None,
            rng,
        })
    }

    #[inline]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    #[inline]
    pub fn params(&self) -> &WlParams {
        &self.params
    }

    #[inline]
    pub fn grid(&self) -> &EnergyGrid {
        &self.grid
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn lnf(&self) -> f64 {
        self.lnf
    }

    /// Energy of the current configuration as tracked by the engine.
    #[inline]
    pub fn energy(&self) -> f64 {
        self.energy
    }

    #[inline]
    pub fn ln_dos(&self) -> &[f64] {
        &self.lnge
    }

    #[inline]
    pub fn histogram(&self) -> &[u64] {
        &self.hist
    }

    #[inline]
    pub fn active_mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn active_bins(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    #[inline]
    pub fn passes(&self) -> &[PassSummary] {
        &self.passes
    }

    /// Trials performed so far in the current pass.
    #[inline]
    pub fn trials_in_pass(&self) -> usize {
        self.trial
    }

    /// Advance by one trial, or resolve a pending pass boundary.
    pub fn step(&mut self) -> Result<Phase> {
        self.step_with(&mut |_: &WlEvent| {})
    }

    pub fn step_with<F: FnMut(&WlEvent)>(&mut self, observer: &mut F) -> Result<Phase> {
        match self.phase {
            Phase::Converged | Phase::Aborted => return Ok(self.phase),
            Phase::StalledLaterPass => {
                self.phase = Phase::Aborted;
                return Ok(self.phase);
            }
            Phase::Flat | Phase::StalledFirstPass => {
                if self.lnf <= self.params.control_lnf {
                    info!("converged: lnf={} after {} passes", self.lnf, self.passes.len());
                    self.phase = Phase::Converged;
                    return Ok(self.phase);
                }
                self.begin_pass();
            }
            Phase::Iterating => {}
        }
        self.trial_step(observer)?;
        Ok(self.phase)
    }

    pub fn run(&mut self) -> Result<WlResult> {
        self.run_with(|_| {})
    }

    /// Run to completion, passing progress and pass events to `observer`.
    pub fn run_with<F: FnMut(&WlEvent)>(&mut self, mut observer: F) -> Result<WlResult> {
        while !self.phase.is_terminal() {
            self.step_with(&mut observer)?;
        }
        Ok(self.result())
    }

    /// Active bins only: energy per site, ln g(E), histogram over its maximum.
    pub fn result(&self) -> WlResult {
        let particles = self.lattice.particles() as f64;
        let max = self
            .active()
            .map(|k| self.hist[k])
            .max()
            .unwrap_or(0);
        let records = self
            .active()
            .map(|k| DosRecord {
                energy: self.grid.values()[k] / particles,
                ln_dos: self.lnge[k],
                histogram: if max > 0 { self.hist[k] as f64 / max as f64 } else { 0.0 },
            })
            .collect();

        let outcome = match self.phase {
            Phase::Converged => Outcome::Converged { lnf: self.lnf },
            Phase::Aborted | Phase::StalledLaterPass => Outcome::Aborted {
                lnf: self.stalled_lnf.unwrap_or(self.lnf),
            },
            _ => Outcome::Unfinished { lnf: self.lnf },
        };

        WlResult {
            table: DosTable::new(records),
            outcome,
            passes: self.passes.clone(),
        }
    }

    fn active(&self) -> impl Iterator<Item = usize> + '_ {
        self.mask.iter().enumerate().filter_map(|(k, &m)| m.then_some(k))
    }

    fn begin_pass(&mut self) {
        self.hist.iter_mut().for_each(|h| *h = 0);
        self.trial = 0;
        self.phase = Phase::Iterating;
        debug!("pass {}: lnf={}", self.passes.len(), self.lnf);
    }

    fn bin(&self, energy: f64) -> Result<usize> {
        self.grid.index(energy).ok_or(WlError::EnergyOutsideGrid {
            energy,
            grid_min: self.grid.values().first().copied().unwrap_or(f64::NAN),
        })
    }

    fn current_energy(&self) -> f64 {
        match self.params.energy_mode {
            EnergyMode::FullRecompute => self.lattice.grid_energy(self.params.coupling),
            EnergyMode::Incremental => self.energy,
        }
    }

    /// Draw proposals until one lands in `[LB, UB]`; the winner is left applied.
    fn propose_in_range(&mut self, e_old: f64) -> Result<(Move, f64)> {
        let WlParams { q, coupling, lower, upper, energy_mode, .. } = self.params;
        for _ in 0..self.params.max_proposal_retries {
            let mv = self.lattice.propose_move(q, &mut self.rng);
            let e_new = match energy_mode {
                EnergyMode::FullRecompute => {
                    self.lattice.apply(&mv);
                    self.lattice.grid_energy(coupling)
                }
                EnergyMode::Incremental => {
                    e_old + self.lattice.energy_delta(mv.i, mv.j, mv.new_state, coupling)
                }
            };
            if e_new >= lower && e_new <= upper {
                if energy_mode == EnergyMode::Incremental {
                    self.lattice.apply(&mv);
                }
                return Ok((mv, e_new));
            }
            if energy_mode == EnergyMode::FullRecompute {
                self.lattice.revert(&mv);
            }
        }
        Err(WlError::NoInRangeMove {
            retries: self.params.max_proposal_retries,
            energy: e_old,
            lower,
            upper,
        })
    }

    fn trial_step<F: FnMut(&WlEvent)>(&mut self, observer: &mut F) -> Result<()> {
        let iter = self.trial;
        let e_old = self.current_energy();
        let old_idx = self.bin(e_old)?;
        let (mv, e_new) = self.propose_in_range(e_old)?;
        let new_idx = match self.bin(e_new) {
            Ok(k) => k,
            Err(e) => {
                self.lattice.revert(&mv);
                return Err(e);
            }
        };

        let ratio = (self.lnge[old_idx] - self.lnge[new_idx]).exp();
        let target = if ratio >= 1.0 || self.rng.gen::<f64>() < ratio {
            self.energy = e_new;
            new_idx
        } else {
            self.lattice.revert(&mv);
            self.energy = e_old;
            old_idx
        };
        self.hist[target] += 1;
        self.lnge[target] += self.lnf;
        self.trial += 1;

        let particles = self.lattice.particles();
        if iter % particles == 0 && self.is_flat() {
            let lnf = self.lnf;
            self.lnf /= 2.0;
            self.phase = Phase::Flat;
            info!("flat after {} trials: lnf {} -> {}", self.trial, lnf, self.lnf);
            self.finish_pass(lnf, PassEnd::Flat, observer);
            return Ok(());
        }

        if iter % (particles * self.params.interval) == 0 {
            let report = self.progress();
            debug!(
                "trial {}: flatness {:.3}, weakest bin {:?}, E={}",
                report.trial, report.flatness_ratio, report.weakest_bin, report.energy
            );
            observer(&WlEvent::Progress(report));
        }

        if iter == self.params.max_steps - 1 {
            let lnf = self.lnf;
            if self.passes.is_empty() {
                let pruned: Vec<usize> = (0..self.hist.len())
                    .filter(|&k| self.hist[k] == 0 && self.mask[k])
                    .collect();
                for k in 0..self.hist.len() {
                    if self.hist[k] == 0 {
                        self.mask[k] = false;
                    }
                }
                if !self.mask.iter().any(|&m| m) {
                    return Err(WlError::NoActiveBins {
                        lower: self.params.lower,
                        upper: self.params.upper,
                    });
                }
                warn!(
                    "no flat histogram in first pass; excluding {} unvisited bins: {:?}",
                    pruned.len(),
                    pruned
                );
                self.lnf /= 2.0;
                self.phase = Phase::StalledFirstPass;
                self.finish_pass(lnf, PassEnd::Pruned { bins: pruned }, observer);
            } else {
                let report = self.progress();
                warn!(
                    "no convergence after {} trials at lnf={}; weakest bin {:?} (ratio {:.3}). Aborting.",
                    self.params.max_steps, lnf, report.weakest_bin, report.flatness_ratio
                );
                self.stalled_lnf = Some(lnf);
                self.lnf = 0.0;
                self.phase = Phase::StalledLaterPass;
                self.finish_pass(lnf, PassEnd::Stalled, observer);
            }
        }
        Ok(())
    }

    fn finish_pass<F: FnMut(&WlEvent)>(&mut self, lnf: f64, end: PassEnd, observer: &mut F) {
        let summary = PassSummary {
            index: self.passes.len(),
            lnf,
            trials: self.trial,
            end,
        };
        observer(&WlEvent::PassFinished(summary.clone()));
        self.passes.push(summary);
    }

    /// `(min, mean, argmin)` of the histogram over active bins.
    fn active_stats(&self) -> (u64, f64, Option<usize>) {
        let mut min = u64::MAX;
        let mut argmin = None;
        let mut sum = 0u64;
        let mut count = 0usize;
        for k in self.active() {
            let h = self.hist[k];
            sum += h;
            count += 1;
            if h < min {
                min = h;
                argmin = Some(k);
            }
        }
        if count == 0 {
            return (0, 0.0, None);
        }
        (min, sum as f64 / count as f64, argmin)
    }

    fn is_flat(&self) -> bool {
        let (min, mean, argmin) = self.active_stats();
        argmin.is_some() && min as f64 > mean * self.params.flatness
    }

    fn progress(&self) -> Progress {
        let (min, mean, weakest_bin) = self.active_stats();
        let denom = mean * self.params.flatness;
        Progress {
            pass: self.passes.len(),
            trial: self.trial,
            lnf: self.lnf,
            flatness_ratio: if denom > 0.0 { min as f64 / denom } else { 0.0 },
            weakest_bin,
            energy: self.energy,
        }
    }
}
