// ----------------------------------- CLI -----------------------------------
#[derive(clap::Parser, Debug, Clone)]
#[clap(name = "gtm", about = "Partial volume correction of a PET image by the Geometric Transfer Matrix method")]
pub struct Cli {

    /// PET image to be corrected
    pub pet: PathBuf,

    /// Region mask: a 4D stack of indicator maps, or a label image with `--labels`
    pub mask: PathBuf,

    /// Where to write the corrected image
    pub output: PathBuf,

    /// PSF FWHM along x, in mm
    #[clap(short)]
    pub x: Option<Lengthf32>,

    /// PSF FWHM along y, in mm
    #[clap(short)]
    pub y: Option<Lengthf32>,

    /// PSF FWHM along z, in mm
    #[clap(short)]
    pub z: Option<Lengthf32>,

    /// TOML configuration file; command-line options take precedence
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// The mask is a 3D image of integer labels (0 = background)
    #[clap(long)]
    pub labels: bool,

    /// Write per-region weights, measured and corrected values here (TSV)
    #[clap(long)]
    pub table: Option<PathBuf>,

    /// Truncate Gaussian kernels beyond this many sigmas [default: 3]
    #[clap(long)]
    pub cutoff: Option<Ratiof32>,

    /// How corrected values are painted back onto voxels [default: dominant]
    #[clap(long, value_enum)]
    pub composition: Option<Composition>,

    /// Value of voxels outside every region: a number or `original` [default: 0]
    #[clap(long)]
    pub background: Option<Background>,

    /// Maximum number of rayon threads
    #[clap(short = 'j', long, default_value = "4")]
    pub n_threads: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging("info");
    ExitCode::from(exit_status(run(cli), &mut std::io::stderr()))
}

/// Exit status of a run: 0 on success; on failure 1, after writing a
/// diagnostic naming the failed stage to `diagnostics`
fn exit_status(outcome: Result<()>, diagnostics: &mut impl Write) -> u8 {
    match outcome {
        Ok(()) => 0,
        Err(e) => {
            writeln!(diagnostics, "[Error]\t{}: {e}", e.stage()).ok();
            1
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut progress = Progress::new();

    let config = match &cli.config {
        Some(path) => read_config_file(path)?,
        None       => Config::default(),
    };
    let gtm = config.resolve(Overrides {
        fwhm: [cli.x.map(mm), cli.y.map(mm), cli.z.map(mm)],
        cutoff: cli.cutoff,
        composition: cli.composition,
        background: cli.background,
    })?;

    progress.start(&format!("Reading PET image {:?}", cli.pet));
    let pet = io::read_pet(&cli.pet)?;
    progress.done();

    progress.start(&format!("Reading mask {:?}", cli.mask));
    let regions = if cli.labels { io::read_labels(&cli.mask)? }
                  else          { io::read_mask  (&cli.mask)? };
    progress.done();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cli.n_threads)
        .build()
        .map_err(|e| Error::InvalidParameter(format!("cannot start {} threads: {e}", cli.n_threads)))?;

    progress.startln(&format!("Correcting {} regions on {}", regions.n_regions(), pet.fov.describe()));
    let bar = ProgressBar::new(regions.n_regions() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("Transfer matrix: [{elapsed_precise}] {wide_bar} {pos}/{len} regions ({eta_precise})") {
        bar.set_style(style);
    }
    let correction = pool.install(|| correct_with_progress(&pet, &regions, &gtm, |_| bar.inc(1)));
    bar.finish_and_clear();
    let correction = correction?;
    progress.done_with_message("GTM correction");

    report(&correction, regions.labels());

    write_outputs(&correction, regions.labels(), &cli.output, cli.table.as_deref())?;
    progress.done_with_message("Wrote outputs");
    Ok(())
}

/// Write the corrected image and, if requested, the per-region table. Either
/// both are written or neither is left behind.
fn write_outputs(correction: &Correction, labels: &[u32], output: &Path, table: Option<&Path>) -> Result<()> {
    io::write_image(&correction.image, output)?;
    if let Some(table) = table {
        if let Err(e) = table::write(table, correction, labels) {
            std::fs::remove_file(output).ok();
            return Err(e);
        }
    }
    Ok(())
}

fn report(correction: &Correction, labels: &[u32]) {
    let method = match correction.method {
        Method::Direct        => "LU decomposition",
        Method::PseudoInverse => "SVD pseudo-inverse",
    };
    println!("Solved with {method}, condition number {:.3e}", correction.condition_number);
    println!("{:>6} {:>14} {:>14}", "label", "measured", "corrected");
    for (label, m, c) in izip!(labels, &correction.measured, &correction.corrected) {
        println!("{label:>6} {m:>14.4} {c:>14.4}");
    }
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::izip;

use gtmpvc::{
    Error, Result,
    compose::{Background, Composition},
    config::gtm::{read_config_file, Config, Overrides},
    io::{self, table},
    pvc::{correct_with_progress, Correction},
    solve::Method,
    utils::{init_logging, timing::Progress},
};
use units::{mm, todo::{Lengthf32, Ratiof32}};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use gtmpvc::{GtmConfig, correct, phantom::two_cubes};

    fn two_cube_correction() -> Result<(Correction, Vec<u32>)> {
        let phantom = two_cubes();
        let regions = phantom.regions()?;
        let correction = correct(&phantom.activity(), &regions, &GtmConfig::new([mm(2.0); 3]))?;
        Ok((correction, regions.labels().to_vec()))
    }

    #[test]
    fn success_exits_quietly() {
        let mut diagnostics = Vec::new();
        assert_eq!(exit_status(Ok(()), &mut diagnostics), 0);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn failure_names_the_stage_and_exits_with_1() {
        let mut diagnostics = Vec::new();
        let status = exit_status(Err(Error::EmptyRegion { region: 3 }), &mut diagnostics);
        assert_eq!(status, 1);
        assert_eq!(String::from_utf8(diagnostics).unwrap(),
                   "[Error]\tregions: Region 3 is empty: its indicator map sums to zero\n");
    }

    #[test]
    fn input_failure_diagnostic() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("pet.gtm3");
        let mut diagnostics = Vec::new();
        let status = exit_status(io::read_pet(&missing).map(|_| ()), &mut diagnostics);
        assert_eq!(status, 1);
        let text = String::from_utf8(diagnostics).unwrap();
        assert!(text.starts_with("[Error]\tinput: Cannot read PET input file"), "{text}");
    }

    #[test]
    fn unwritable_image_leaves_no_table() -> Result<()> {
        let (correction, labels) = two_cube_correction()?;
        let dir = tempdir()?;
        let output = dir.path().join("no-such-dir").join("corrected.gtm3");
        let table = dir.path().join("regions.tsv");
        let result = write_outputs(&correction, &labels, &output, Some(&table));
        assert!(matches!(result, Err(Error::Output { .. })));
        assert!(!table.exists());
        Ok(())
    }

    #[test]
    fn unwritable_table_leaves_no_image() -> Result<()> {
        let (correction, labels) = two_cube_correction()?;
        let dir = tempdir()?;
        let output = dir.path().join("corrected.gtm3");
        let table = dir.path().join("no-such-dir").join("regions.tsv");
        assert!(write_outputs(&correction, &labels, &output, Some(&table)).is_err());
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn both_outputs_are_written() -> Result<()> {
        let (correction, labels) = two_cube_correction()?;
        let dir = tempdir()?;
        let output = dir.path().join("corrected.gtm3");
        let table = dir.path().join("regions.tsv");
        write_outputs(&correction, &labels, &output, Some(&table))?;
        assert!(output.exists());
        assert!(table.exists());
        Ok(())
    }
}
