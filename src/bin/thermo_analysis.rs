// src/bin/thermo_analysis.rs - Thermodynamic curves from saved Wang-Landau runs

use clap::Parser;
use log::warn;
use potts_wl::dos::{ensure_dir, DosTable, RunSummary, SUMMARY_FILE, TABLE_FILE};
use potts_wl::thermo::{
    critical_temperature, heat_capacity_peak, normalize, temperature_sweep, temperatures,
    write_curve, write_sweep, Symmetry,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
struct Cli {
    /// Run directories containing out_final.txt
    #[arg(long, value_delimiter = ',', required = true)]
    runs: Vec<PathBuf>,

    /// Lattice sizes, one per run (read from run_summary.csv if omitted)
    #[arg(long, value_delimiter = ',')]
    gridsizes: Vec<usize>,

    /// Number of Potts states (read from run_summary.csv if omitted)
    #[arg(short = 'q', long)]
    qstates: Option<usize>,

    /// Mirror the DOS about E = 0 before normalizing (q = 2)
    #[arg(long)]
    mirror: bool,

    #[arg(long, default_value_t = 0.1)]
    t_min: f64,

    #[arg(long, default_value_t = 2.0)]
    t_max: f64,

    #[arg(long, default_value_t = 500)]
    t_points: usize,

    /// Output directory for the curves
    #[arg(long, default_value = "analysis")]
    output: PathBuf,
}

fn run_parameters(
    args: &Cli,
    index: usize,
    dir: &Path,
) -> Result<(usize, usize), Box<dyn std::error::Error>> {
    let summary = RunSummary::read_path(dir.join(SUMMARY_FILE)).ok();
    if let Some(s) = &summary {
        if s.status != "converged" {
            warn!("{}: run is {} at lnf={}", dir.display(), s.status, s.lnf_reached);
        }
    }
    let size = args
        .gridsizes
        .get(index)
        .copied()
        .or(summary.as_ref().map(|s| s.size))
        .ok_or_else(|| format!("{}: no grid size given and no {SUMMARY_FILE}", dir.display()))?;
    let q = args
        .qstates
        .or(summary.as_ref().map(|s| s.q))
        .ok_or_else(|| format!("{}: no q given and no {SUMMARY_FILE}", dir.display()))?;
    Ok((size, q))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Cli::parse();
    let out = ensure_dir(&args.output)?;
    let temps = temperatures(args.t_min, args.t_max, args.t_points);
    let symmetry = if args.mirror { Symmetry::Mirror } else { Symmetry::None };

    for (index, dir) in args.runs.iter().enumerate() {
        let (size, q) = run_parameters(&args, index, dir)?;
        let table = DosTable::read_path(dir.join(TABLE_FILE))?;
        let curve = normalize(&table, q, symmetry)?;
        let sweep = temperature_sweep(&curve, &temps, size * size)?;

        let tag = format!("L{size}_q{q}");
        write_curve(out.join(format!("lnge_{tag}.csv")), &curve)?;
        write_sweep(out.join(format!("thermo_{tag}.csv")), &sweep)?;

        let tc = critical_temperature(q, 1.0);
        match heat_capacity_peak(&sweep) {
            Some(p) => println!(
                "{tag}: C/N peak {:.4} at T = {:.4} (exact T_c = {:.4})",
                p.heat_capacity, p.temperature, tc
            ),
            None => println!("{tag}: no finite heat capacity in sweep"),
        }
    }

    println!("Curves written to {}", out.display());
    Ok(())
}
