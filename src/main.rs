//! Wang-Landau density of states for the 2D q-state Potts model.
//!
//! Writes `{directoryname}/out_final.txt` (E, lng(E), H(E)) and
//! `{directoryname}/run_summary.csv`.

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use potts_wl::batch::run_config;
use potts_wl::config::WlConfig;
use potts_wl::dos::save_run;
use potts_wl::lattice::EnergyMode;
use potts_wl::utils::rng::pcg_from;
use potts_wl::wang_landau::{PassEnd, WlEvent};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(about = "Wang-Landau sampling of the 2D q-state Potts model")]
struct Cli {
    /// Lattice side length
    #[arg(short = 'g', long, default_value_t = 10)]
    gridsize: usize,

    /// Output directory (reused if it exists)
    #[arg(short = 'f', long, default_value = "WLA-RUN")]
    directoryname: PathBuf,

    /// Flatness threshold
    #[arg(short = 'z', long, default_value_t = 0.8)]
    flatness: f64,

    /// Final ln(f)
    #[arg(short = 'm', long, default_value_t = 1e-6)]
    finallnf: f64,

    /// Number of energy bins
    #[arg(short = 'n', long, default_value_t = 100)]
    bins: usize,

    /// Number of Potts states
    #[arg(short = 'q', long, default_value_t = 2)]
    qstates: usize,

    /// Trial budget per modification factor
    #[arg(long, default_value_t = 1_000_000)]
    max_steps: usize,

    /// Progress report every L²·interval trials
    #[arg(long, default_value_t = 100)]
    interval: usize,

    /// Redraws allowed while searching for an in-range move
    #[arg(long, default_value_t = 100_000)]
    max_retries: usize,

    /// Track the energy incrementally instead of recomputing it every trial
    #[arg(long)]
    incremental: bool,

    /// RNG seed (OS entropy if omitted)
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn config(&self) -> WlConfig {
        WlConfig {
            grid_size: self.gridsize,
            directory: self.directoryname.clone(),
            flatness: self.flatness,
            final_lnf: self.finallnf,
            bins: self.bins,
            q: self.qstates,
            max_steps: self.max_steps,
            interval: self.interval,
            max_proposal_retries: self.max_retries,
            energy_mode: if self.incremental {
                EnergyMode::Incremental
            } else {
                EnergyMode::FullRecompute
            },
            seed: self.seed,
            ..WlConfig::default()
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = Cli::parse().config();
    cfg.validate()?;
    println!("Configuration:\n{cfg:#?}");

    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template(" {spinner} [{elapsed_precise}] {msg}")?);
    bar.enable_steady_tick(Duration::from_millis(200));

    let result = run_config(&cfg, pcg_from(cfg.seed), |ev| match ev {
        WlEvent::Progress(p) => bar.set_message(format!(
            "pass {} lnf {:.3e} trial {} flatness {:.3} weakest bin {:?} E {}",
            p.pass, p.lnf, p.trial, p.flatness_ratio, p.weakest_bin, p.energy
        )),
        WlEvent::PassFinished(s) => {
            let how = match &s.end {
                PassEnd::Flat => "flat".to_string(),
                PassEnd::Pruned { bins } => format!("stalled, pruned bins {bins:?}"),
                PassEnd::Stalled => "stalled".to_string(),
            };
            bar.println(format!("ln(f) = {:e}: {} after {} trials", s.lnf, how, s.trials));
        }
    })?;
    bar.finish_and_clear();

    if !result.outcome.is_converged() {
        warn!(
            "run did NOT converge (stalled at lnf = {}); results are partial",
            result.outcome.lnf()
        );
    }

    let path = save_run(&cfg.directory, &result.table, &cfg.summary(&result))?;
    println!(
        "Saved {} bins ({}) → {}",
        result.table.len(),
        result.outcome.label(),
        path.display()
    );
    Ok(())
}
