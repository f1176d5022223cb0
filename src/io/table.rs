//! Tab-separated per-region summary of a correction

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use itertools::izip;

use crate::pvc::Correction;
use crate::{Error, Result};

pub const HEADER: &str = "region\tlabel\tweight\tmeasured\tcorrected";

pub fn write_to(mut out: impl Write, correction: &Correction, labels: &[u32]) -> std::io::Result<()> {
    writeln!(out, "{HEADER}")?;
    let rows = izip!(labels, &correction.weights, &correction.measured, &correction.corrected);
    for (region, (label, weight, measured, corrected)) in rows.enumerate() {
        writeln!(out, "{region}\t{label}\t{weight}\t{measured}\t{corrected}")?;
    }
    out.flush()
}

pub fn write(path: &Path, correction: &Correction, labels: &[u32]) -> Result<()> {
    if labels.len() != correction.corrected.len() {
        return Err(Error::DimensionMismatch(format!(
            "{} labels for {} corrected values", labels.len(), correction.corrected.len()
        )));
    }
    let file = File::create(path)?;
    write_to(BufWriter::new(file), correction, labels)?;
    Ok(())
}
