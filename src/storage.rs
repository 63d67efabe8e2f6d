//! Persistent storage for raw sweep captures.
//!
//! Each completed sweep is written as a CSV matrix, one row per sample and
//! one column per channel (phase1, magnitude1, phase2, magnitude2, phase3,
//! magnitude3). The initial and normal captures each have a fixed file that
//! is overwritten by the next measurement:
//!
//!   - `init_phaseAndMagnitudeData.csv`
//!   - `normal_phaseAndMagnitudeData.csv`
//!
//! Values use `%.18e` notation so the files match the ones produced by the
//! lab tooling.

use crate::acquisition::{CapturePhase, SweepCapture};
use crate::config::CAPTURE_FILE_SUFFIX;
use crate::error::Error;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Receives every completed capture.
pub trait CaptureSink {
    fn persist(&mut self, phase: CapturePhase, capture: &SweepCapture) -> Result<(), Error>;
}

/// Writes captures as CSV files into one directory.
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that receives captures of `phase`.
    pub fn path_for(&self, phase: CapturePhase) -> PathBuf {
        let prefix = match phase {
            CapturePhase::Initial => "init",
            CapturePhase::Normal => "normal",
        };
        self.dir.join(format!("{prefix}_{CAPTURE_FILE_SUFFIX}"))
    }
}

impl CaptureSink for CsvStore {
    fn persist(&mut self, phase: CapturePhase, capture: &SweepCapture) -> Result<(), Error> {
        fs::create_dir_all(&self.dir).map_err(Error::Storage)?;
        let path = self.path_for(phase);
        let file = File::create(&path).map_err(Error::Storage)?;
        write_csv(BufWriter::new(file), capture).map_err(Error::Storage)?;
        info!(
            "storage: {} rows -> {}",
            capture.samples(),
            path.display()
        );
        Ok(())
    }
}

/// Write `capture` as a samples × channels matrix.
pub fn write_csv<W: Write>(mut out: W, capture: &SweepCapture) -> io::Result<()> {
    for row in 0..capture.samples() {
        let line = capture
            .row(row)
            .iter()
            .map(|&v| format_sci(v))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(out, "{line}")?;
    }
    out.flush()
}

/// Format like C's `%.18e`: 18 fraction digits, signed two-digit exponent.
pub fn format_sci(value: f64) -> String {
    let raw = format!("{value:.18e}");
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
        }
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::Ambient;

    #[test]
    fn scientific_format_matches_printf() {
        assert_eq!(format_sci(1.0), "1.000000000000000000e+00");
        assert_eq!(format_sci(0.0), "0.000000000000000000e+00");
        assert_eq!(format_sci(-123.5), "-1.235000000000000000e+02");
        assert_eq!(format_sci(0.00025), "2.500000000000000052e-04");
        assert_eq!(format_sci(1e100), "1.000000000000000016e+100");
    }

    #[test]
    fn matrix_is_transposed_into_rows() {
        let capture = SweepCapture::new(
            core::array::from_fn(|c| vec![c as f64, 10.0 + c as f64]),
            Ambient::default(),
        )
        .unwrap();
        let mut out: Vec<u8> = Vec::new();
        write_csv(&mut out, &capture).unwrap();
        let text = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 2);
        let first: Vec<f64> = rows[0].split(',').map(|v| v.parse().unwrap()).collect();
        assert_eq!(first, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let second: Vec<f64> = rows[1].split(',').map(|v| v.parse().unwrap()).collect();
        assert_eq!(second, vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
    }

    #[test]
    fn file_names_follow_phase() {
        let store = CsvStore::new("/data");
        assert_eq!(
            store.path_for(CapturePhase::Initial),
            Path::new("/data/init_phaseAndMagnitudeData.csv")
        );
        assert_eq!(
            store.path_for(CapturePhase::Normal),
            Path::new("/data/normal_phaseAndMagnitudeData.csv")
        );
    }
}
