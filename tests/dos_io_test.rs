//! Persistence of out_final.txt and run_summary.csv.

use potts_wl::dos::{save_run, DosRecord, DosTable, RunSummary, SUMMARY_FILE, TABLE_FILE};
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("potts_wl_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn sample_table() -> DosTable {
    DosTable::new(
        (0..7)
            .map(|k| DosRecord {
                energy: -2.0 + k as f64 / 3.0,
                ln_dos: 0.1 * (k * k) as f64 + 1.0 / 3.0,
                histogram: (k + 1) as f64 / 7.0,
            })
            .collect(),
    )
}

fn summary(status: &str) -> RunSummary {
    RunSummary {
        size: 10,
        q: 2,
        bins: 100,
        flatness: 0.8,
        final_lnf: 1e-6,
        status: status.to_string(),
        lnf_reached: 6.103515625e-5,
        passes: 14,
        active_bins: 7,
    }
}

#[test]
fn test_table_survives_disk() {
    let dir = scratch_dir("table");
    let table = sample_table();
    let path = save_run(&dir, &table, &summary("converged")).unwrap();
    assert_eq!(path, dir.join(TABLE_FILE));

    let back = DosTable::read_path(&path).unwrap();
    assert_eq!(back, table);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_existing_directory_is_reused() {
    let dir = scratch_dir("reuse");
    std::fs::create_dir_all(&dir).unwrap();

    save_run(&dir, &sample_table(), &summary("converged")).unwrap();
    save_run(&dir, &sample_table(), &summary("aborted")).unwrap();

    let s = RunSummary::read_path(dir.join(SUMMARY_FILE)).unwrap();
    assert_eq!(s, summary("aborted"));

    let _ = std::fs::remove_dir_all(&dir);
}
