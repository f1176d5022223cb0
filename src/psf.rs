//! Point spread function model: an anisotropic Gaussian specified by its
//! full width at half maximum along each axis.

use units::{mm_, Length, todo::VoxelVariancef32};

use crate::{Error, Result};

/// Ratio of standard deviation to FWHM of a Gaussian: `1 / (2 √(2 ln 2))`
#[allow(clippy::excessive_precision)]
pub const FWHM_TO_SIGMA: f32 = 0.424_660_900_144_009_5;

/// Standard deviation of a Gaussian with the given FWHM
pub fn sigma_from_fwhm(fwhm: Length) -> Length { fwhm * FWHM_TO_SIGMA }

/// Variance of the PSF along each axis, measured in (voxel spacing)².
///
/// `fwhm` components may be zero (no blurring along that axis); `spacing`
/// components must be strictly positive. Non-finite values are rejected.
pub fn variance_in_voxels(fwhm: [Length; 3], spacing: [Length; 3]) -> Result<[VoxelVariancef32; 3]> {
    let mut variance = [0.0; 3];
    for (axis, (&f, &s)) in fwhm.iter().zip(spacing.iter()).enumerate() {
        let (f_mm, s_mm) = (mm_(f), mm_(s));
        if !f_mm.is_finite() || f_mm < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "FWHM along {} must be a non-negative length, got {f_mm} mm", AXES[axis]
            )));
        }
        if !s_mm.is_finite() || s_mm <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "voxel spacing along {} must be positive, got {s_mm} mm", AXES[axis]
            )));
        }
        let sigma_in_voxels = mm_(sigma_from_fwhm(f)) / s_mm;
        variance[axis] = sigma_in_voxels * sigma_in_voxels;
    }
    Ok(variance)
}

pub(crate) const AXES: [&str; 3] = ["x", "y", "z"];
