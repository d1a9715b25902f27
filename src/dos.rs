// dos.rs - Typed DOS table and its CSV persistence
//
// `out_final.txt` layout (pandas-compatible):
//
//     ,E,lng(E),H(E)
//     0,-2.0,0.0,0.93
//     ...

use crate::error::{Result, WlError};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// File name of the final DOS table inside a run directory.
pub const TABLE_FILE: &str = "out_final.txt";
/// File name of the run summary inside a run directory.
pub const SUMMARY_FILE: &str = "run_summary.csv";

/// One retained energy bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DosRecord {
    /// Energy per site.
    pub energy: f64,
    /// ln g(E) estimate.
    pub ln_dos: f64,
    /// Final-pass histogram normalized to its maximum.
    pub histogram: f64,
}

/// Row as it appears on disk, with the leading index column.
#[derive(Debug, Serialize, Deserialize)]
struct TableRow {
    #[serde(rename = "")]
    index: usize,
    #[serde(rename = "E")]
    energy: f64,
    #[serde(rename = "lng(E)")]
    ln_dos: f64,
    #[serde(rename = "H(E)")]
    histogram: f64,
}

/// Bins in ascending energy order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DosTable {
    pub records: Vec<DosRecord>,
}

impl DosTable {
    pub fn new(records: Vec<DosRecord>) -> Self {
        Self { records }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn energies(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.energy).collect()
    }

    pub fn ln_dos(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.ln_dos).collect()
    }

    pub fn histogram(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.histogram).collect()
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = WriterBuilder::new().from_writer(writer);
        for (index, r) in self.records.iter().enumerate() {
            wtr.serialize(TableRow {
                index,
                energy: r.energy,
                ln_dos: r.ln_dos,
                histogram: r.histogram,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let mut records = Vec::new();
        for row in rdr.deserialize() {
            let row: TableRow = row?;
            records.push(DosRecord {
                energy: row.energy,
                ln_dos: row.ln_dos,
                histogram: row.histogram,
            });
        }
        Ok(Self { records })
    }

    pub fn write_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = fs::File::create(path)?;
        self.write_to(file)
    }

    pub fn read_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = fs::File::open(path)?;
        Self::read_from(file)
    }
}

/// One-line description of a finished run, so non-converged runs are labeled on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub size: usize,
    pub q: usize,
    pub bins: usize,
    pub flatness: f64,
    pub final_lnf: f64,
    pub status: String,
    pub lnf_reached: f64,
    pub passes: usize,
    pub active_bins: usize,
}

impl RunSummary {
    pub fn write_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = WriterBuilder::new().from_path(path)?;
        wtr.serialize(self)?;
        wtr.flush()?;
        Ok(())
    }

    pub fn read_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
        match rdr.deserialize::<RunSummary>().next() {
            Some(row) => Ok(row?),
            None => Err(WlError::EmptyTable),
        }
    }
}

/// Create `dir` (and parents); an existing directory is reused.
pub fn ensure_dir(dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    Ok(dir.to_path_buf())
}

/// Write `out_final.txt` and `run_summary.csv` into `dir`.
pub fn save_run(dir: impl AsRef<Path>, table: &DosTable, summary: &RunSummary) -> Result<PathBuf> {
    let dir = ensure_dir(dir)?;
    let table_path = dir.join(TABLE_FILE);
    table.write_path(&table_path)?;
    summary.write_path(dir.join(SUMMARY_FILE))?;
    Ok(table_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_index_column() {
        let table = DosTable::new(vec![
            DosRecord { energy: -2.0, ln_dos: 0.5, histogram: 1.0 },
            DosRecord { energy: -1.5, ln_dos: 3.25, histogram: 0.75 },
        ]);
        let mut buf = Vec::new();
        table.write_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(",E,lng(E),H(E)"));
        assert!(lines.next().unwrap().starts_with("0,"));
        assert!(lines.next().unwrap().starts_with("1,"));
    }

    #[test]
    fn test_reads_pandas_output() {
        let text = ",E,lng(E),H(E)\n0,-2.0,12.5,0.9\n1,-1.9,14.0,1.0\n";
        let table = DosTable::read_from(text.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[1].energy, -1.9);
        assert_eq!(table.records[0].ln_dos, 12.5);
        assert_eq!(table.records[0].histogram, 0.9);
    }
}
