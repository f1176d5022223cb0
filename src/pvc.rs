//! Geometric Transfer Matrix partial volume correction, from PET image and
//! region maps to corrected regional activities and a corrected image.

use nalgebra::{DMatrix, DVector};
use tracing::{info, info_span};

use units::{mm3_, ratio_, Length, Ratio};

use crate::compose::{compose, Background, Composition};
use crate::gauss::default_cutoff;
use crate::gtm::transfer_matrix_with_progress;
use crate::image::Image;
use crate::means::regional_means;
use crate::psf::variance_in_voxels;
use crate::regions::RegionSet;
use crate::solve::{solve, Method, DEFAULT_CONDITION_LIMIT};
use crate::{Error, Result};

/// Everything that parameterizes a GTM correction. Fixed for the duration of
/// a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GtmConfig {
    /// PSF full width at half maximum along x, y and z
    pub fwhm: [Length; 3],
    /// Gaussian kernels are truncated beyond this many sigmas
    pub cutoff: Ratio,
    /// Above this condition number the pseudo-inverse is used
    pub condition_limit: f64,
    pub composition: Composition,
    pub background: Background,
}

impl GtmConfig {
    pub fn new(fwhm: [Length; 3]) -> Self {
        Self {
            fwhm,
            cutoff: default_cutoff(),
            condition_limit: DEFAULT_CONDITION_LIMIT,
            composition: Composition::default(),
            background: Background::default(),
        }
    }
}

/// The outcome of a successful correction
#[derive(Clone, Debug)]
pub struct Correction {
    /// `G[(i, j)]`: fraction of region `j`'s activity observed in region `i`
    pub transfer_matrix: DMatrix<f64>,
    /// Observed (uncorrected) regional means
    pub measured: DVector<f64>,
    /// Corrected regional activities, solving `G c = m`
    pub corrected: DVector<f64>,
    /// Total indicator weight of each region
    pub weights: Vec<f64>,
    pub method: Method,
    pub condition_number: f64,
    /// Corrected values painted onto the PET grid
    pub image: Image,
}

pub fn correct(pet: &Image, regions: &RegionSet, config: &GtmConfig) -> Result<Correction> {
    correct_with_progress(pet, regions, config, |_| {})
}

/// As `correct`, reporting each completed transfer matrix column through
/// `column_done`
pub fn correct_with_progress<F>(
    pet: &Image,
    regions: &RegionSet,
    config: &GtmConfig,
    column_done: F,
) -> Result<Correction>
where
    F: Fn(usize) + Sync,
{
    // ----- Validate everything before doing any expensive work -------------
    let variance = {
        let _span = info_span!("validation").entered();
        if !ratio_(config.cutoff).is_finite() || ratio_(config.cutoff) <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "kernel cutoff must be positive, got {} sigma", ratio_(config.cutoff)
            )));
        }
        if !(config.condition_limit >= 1.0) {
            return Err(Error::InvalidParameter(format!(
                "condition number limit must be at least 1, got {}", config.condition_limit
            )));
        }
        config.background.validate()?;
        let variance = variance_in_voxels(config.fwhm, pet.fov.voxel_size)?;
        regions.ensure_matches(&pet.fov)?;
        regions.non_empty_weights()?;
        if !pet.all_finite() {
            return Err(Error::InvalidParameter("PET image contains non-finite values".into()));
        }
        info!(fwhm_mm = ?mm3_(config.fwhm), ?variance, regions = regions.n_regions(),
              grid = %pet.fov.describe(), "validated GTM inputs");
        variance
    };

    let transfer_matrix = {
        let _span = info_span!("transfer matrix").entered();
        transfer_matrix_with_progress(regions, variance, config.cutoff, column_done)?
    };

    let measured = {
        let _span = info_span!("regional means").entered();
        regional_means(pet, regions)?
    };

    let solution = {
        let _span = info_span!("solver").entered();
        solve(&transfer_matrix, &measured, config.condition_limit)?
    };

    let image = {
        let _span = info_span!("composition").entered();
        compose(&solution.values, regions, config.composition, config.background, pet)?
    };

    Ok(Correction {
        transfer_matrix,
        measured,
        corrected: solution.values,
        weights: regions.weights(),
        method: solution.method,
        condition_number: solution.condition_number,
        image,
    })
}
