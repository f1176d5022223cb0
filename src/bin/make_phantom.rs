// ----------------------------------- CLI -----------------------------------
#[derive(clap::Parser, Debug, Clone)]
#[clap(name = "make_phantom", about = "Generate a blurred two-region PET phantom and its mask")]
pub struct Cli {

    /// Where to write the simulated PET image
    pub pet: PathBuf,

    /// Where to write the region mask
    pub mask: PathBuf,

    /// PSF FWHM used to blur the true activity, e.g. '4 mm,4 mm,5 mm'
    #[clap(long, value_parser = parse_triplet::<Length>, default_value = "4 mm,4 mm,4 mm")]
    pub fwhm: (Length, Length, Length),

    /// Truncate Gaussian kernels beyond this many sigmas
    #[clap(long, default_value = "3")]
    pub cutoff: Ratiof32,

    /// Add Poisson noise with this many expected counts per unit activity
    #[clap(long)]
    pub counts: Option<f64>,

    /// Seed for the noise generator
    #[clap(long, default_value = "0")]
    pub seed: u64,

    /// Write the mask as a 3D label image rather than a 4D stack of indicators
    #[clap(long)]
    pub labels: bool,

    /// Also write the unblurred true activity here
    #[clap(long)]
    pub truth: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let Cli { pet, mask, fwhm: (fx, fy, fz), cutoff, counts, seed, labels, truth } = Cli::parse();
    init_logging("info");
    let mut progress = Progress::new();

    let phantom = two_cubes();
    let activity = phantom.activity();
    if let Some(truth) = truth {
        io::write_image(&activity, &truth)?;
        progress.done_with_message(&format!("Wrote true activity to {truth:?}"));
    }

    progress.start(&format!("Blurring with FWHM {:?} mm", mm3_([fx, fy, fz])));
    let variance = variance_in_voxels([fx, fy, fz], phantom.fov.voxel_size)?;
    let mut image = blur(&activity, variance, ratio(cutoff))?;
    progress.done();

    if let Some(counts) = counts {
        progress.start(&format!("Adding Poisson noise ({counts} counts per unit activity, seed {seed})"));
        image = add_poisson_noise(&image, counts, seed)?;
        progress.done();
    }

    io::write_image(&image, &pet)?;
    progress.done_with_message(&format!("Wrote PET image to {pet:?}"));

    if labels { io::write_image(&phantom.label_image(), &mask)?; }
    else      { io::write_mask (&phantom.regions()?   , &mask)?; }
    progress.done_with_message(&format!("Wrote mask to {mask:?}"));

    println!("True activities: {:?}", phantom.true_activities());
    Ok(())
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use gtmpvc::{
    gauss::blur,
    io,
    phantom::{add_poisson_noise, two_cubes},
    psf::variance_in_voxels,
    utils::{init_logging, parse_triplet, timing::Progress},
};
use units::{mm3_, ratio, Length, todo::Ratiof32};
