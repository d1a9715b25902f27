// src/bin/multi_size_scan.rs - Wang-Landau runs at several lattice sizes in parallel

use clap::Parser;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use potts_wl::batch::run_batch;
use potts_wl::config::WlConfig;
use potts_wl::dos::save_run;
use potts_wl::lattice::EnergyMode;
use potts_wl::wang_landau::WlEvent;
use rand::RngCore;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
struct Cli {
    /// Lattice sizes to run
    #[arg(long, default_value = "8,10,16", value_delimiter = ',')]
    sizes: Vec<usize>,

    /// Number of Potts states
    #[arg(short = 'q', long, default_value_t = 2)]
    qstates: usize,

    /// Number of energy bins
    #[arg(short = 'n', long, default_value_t = 100)]
    bins: usize,

    /// Flatness threshold
    #[arg(short = 'z', long, default_value_t = 0.8)]
    flatness: f64,

    /// Final ln(f)
    #[arg(short = 'm', long, default_value_t = 1e-6)]
    finallnf: f64,

    /// Trial budget per modification factor
    #[arg(long, default_value_t = 1_000_000)]
    max_steps: usize,

    /// Output directory; each run goes to `L{size}_q{q}/` below it
    #[arg(long, default_value = "wl_data")]
    output_dir: PathBuf,

    /// Master seed (OS entropy if omitted)
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Cli::parse();

    let configs: Vec<WlConfig> = args
        .sizes
        .iter()
        .map(|&size| WlConfig {
            grid_size: size,
            directory: args.output_dir.join(format!("L{}_q{}", size, args.qstates)),
            flatness: args.flatness,
            final_lnf: args.finallnf,
            bins: args.bins,
            q: args.qstates,
            max_steps: args.max_steps,
            energy_mode: EnergyMode::Incremental,
            ..WlConfig::default()
        })
        .collect();
    for cfg in &configs {
        cfg.validate()?;
    }

    let master = args.seed.unwrap_or_else(|| rand::thread_rng().next_u64());
    println!("Running {} sizes, master seed {}", configs.len(), master);

    let multi = MultiProgress::new();
    let style = ProgressStyle::with_template(" {prefix:>6} {spinner} [{elapsed_precise}] {msg}")?;
    let bars: Vec<ProgressBar> = configs
        .iter()
        .map(|cfg| {
            let bar = multi.add(ProgressBar::new_spinner());
            bar.set_style(style.clone());
            bar.set_prefix(format!("L={}", cfg.grid_size));
            bar.enable_steady_tick(Duration::from_millis(250));
            bar
        })
        .collect();

    let runs = run_batch(&configs, master, |index, ev| {
        let bar = &bars[index];
        match ev {
            WlEvent::Progress(p) => bar.set_message(format!(
                "lnf {:.3e} trial {} flatness {:.3}",
                p.lnf, p.trial, p.flatness_ratio
            )),
            WlEvent::PassFinished(s) => bar.set_message(format!("lnf {:.3e} done ({:?})", s.lnf, s.end)),
        }
    });
    for bar in &bars {
        bar.finish_and_clear();
    }

    let mut failures = 0;
    for run in runs {
        let size = run.config.grid_size;
        match run.result {
            Ok(result) => {
                let path = save_run(&run.config.directory, &result.table, &run.config.summary(&result))?;
                println!(
                    "L={:>3}: {:>10} lnf={:.3e} bins={:>4} → {}",
                    size,
                    result.outcome.label(),
                    result.outcome.lnf(),
                    result.table.len(),
                    path.display()
                );
            }
            Err(e) => {
                failures += 1;
                eprintln!("L={size:>3}: failed: {e}");
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} run(s) failed").into());
    }
    Ok(())
}
