//! Directory batch decoding.  With the `parallel` feature, files are decoded
//! concurrently using Rayon; entries are always reported in file-name order.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SpcError};
use crate::options::DecodeOptions;
use crate::reader::{decode_path, SpcFile};

/// Outcome for one file.
#[derive(Debug)]
pub struct BatchEntry {
    pub file_name: String,
    pub path:      PathBuf,
    pub result:    Result<SpcFile>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &SpcFile)> {
        self.entries.iter().filter_map(|e| e.result.as_ref().ok().map(|f| (e.file_name.as_str(), f)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &SpcError)> {
        self.entries.iter().filter_map(|e| e.result.as_ref().err().map(|err| (e.file_name.as_str(), err)))
    }

    pub fn summary(&self) -> String {
        format!(
            "{} file(s): {} decoded, {} failed",
            self.entries.len(),
            self.succeeded().count(),
            self.failed().count(),
        )
    }
}

fn is_spc(path: &Path) -> bool {
    path.is_file()
        && path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("spc"))
}

/// List the `*.spc` files in `dir`, sorted by name.
pub fn spc_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if is_spc(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn decode_one(path: PathBuf, options: &DecodeOptions) -> BatchEntry {
    let file_name = path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let result = decode_path(&path, options);
    match &result {
        Ok(f)  => log::info!(target: "spcio", "{file_name}: {} spectra", f.spectra.len()),
        Err(e) => log::warn!(target: "spcio", "{file_name}: {e}"),
    }
    BatchEntry { file_name, path, result }
}

/// Decode every SPC file in `dir`, tolerating per-file failures.
pub fn decode_dir<P: AsRef<Path>>(dir: P, options: &DecodeOptions) -> Result<BatchReport> {
    let paths = spc_files(dir)?;

    #[cfg(feature = "parallel")]
    let entries = {
        use rayon::prelude::*;
        paths.into_par_iter().map(|p| decode_one(p, options)).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let entries = paths.into_iter().map(|p| decode_one(p, options)).collect();

    Ok(BatchReport { entries })
}
