//! Sampled, truncated Gaussian kernels and separable 3D Gaussian blurring.

use ndarray::{Axis, Zip};

use units::{ratio, ratio_, Ratio, todo::{Ratiof32, VoxelVariancef32}};

use crate::image::Image;
use crate::{Error, Result};

/// Kernels are truncated beyond this many standard deviations, unless
/// otherwise specified
pub const DEFAULT_CUTOFF: Ratiof32 = 3.0;

pub fn default_cutoff() -> Ratio { ratio(DEFAULT_CUTOFF) }

// Unnormalized: the kernel is normalized after sampling, so the peak height
// is irrelevant.
fn make_gauss(sigma: f32, cutoff: Ratiof32) -> impl Fn(f32) -> f32 {
    let cutoff = cutoff * sigma;
    move |dx: f32| -> f32 {
        if dx.abs() <= cutoff {
            let y = dx / sigma;
            (-0.5 * y * y).exp()
        } else {
            0.0
        }
    }
}

/// Beyond this many standard deviations the sampled `f32` Gaussian underflows
/// to zero, so larger cutoffs only add zero weights
const EFFECTIVE_CUTOFF: Ratiof32 = 15.0;

/// Kernels wider than this are refused rather than allocated
const MAX_RADIUS: usize = 1 << 24;

/// 1D Gaussian kernel with the given variance (in voxels²), sampled at integer
/// offsets within `cutoff` standard deviations of the centre, normalized to
/// unit sum. The kernel has odd length `2r + 1` with the centre at index `r`.
///
/// A variance so small that no neighbouring voxel lies inside the cutoff
/// yields the identity kernel `[1.0]`.
pub fn kernel(variance: VoxelVariancef32, cutoff: Ratio) -> Result<Vec<f32>> {
    truncated_kernel(variance, cutoff, MAX_RADIUS)
}

/// As `kernel`, but without the weights more than `max_radius` voxels from the
/// centre. These are dropped after normalization, so the ones that remain are
/// those of the full kernel.
pub fn truncated_kernel(variance: VoxelVariancef32, cutoff: Ratio, max_radius: usize) -> Result<Vec<f32>> {
    let cutoff = ratio_(cutoff);
    if !variance.is_finite() || variance < 0.0 {
        return Err(Error::InvalidParameter(format!("Gaussian variance must be non-negative, got {variance}")));
    }
    if !cutoff.is_finite() || cutoff <= 0.0 {
        return Err(Error::InvalidParameter(format!("Gaussian cutoff must be positive, got {cutoff} sigma")));
    }
    let cutoff = cutoff.min(EFFECTIVE_CUTOFF);
    let sigma = variance.sqrt();
    let radius = (cutoff as f64 * sigma as f64).floor();
    if radius > MAX_RADIUS as f64 {
        return Err(Error::InvalidParameter(format!(
            "Gaussian with variance {variance} voxels² needs a kernel of radius {radius}, more than {MAX_RADIUS}"
        )));
    }
    let radius = radius as usize;
    if radius == 0 { return Ok(vec![1.0]) }

    let gauss = make_gauss(sigma, cutoff);
    let r = radius as isize;
    let total: f64 = (-r..=r).map(|d| gauss(d as f32) as f64).sum();
    let kept = radius.min(max_radius) as isize;
    Ok((-kept..=kept).map(|d| (gauss(d as f32) as f64 / total) as f32).collect())
}

/// Blur `image` with an axis-aligned Gaussian whose per-axis variances are
/// given in voxels². Applied as three 1D convolutions. Values beyond the edge
/// of the grid are taken to be zero, so signal blurred out of the grid is lost.
pub fn blur(image: &Image, variance: [VoxelVariancef32; 3], cutoff: Ratio) -> Result<Image> {
    let mut blurred = image.clone();
    for (axis, &v) in variance.iter().enumerate() {
        // No two voxels in a lane are further apart than this
        let longest_reach = image.fov.n[axis].saturating_sub(1);
        let kernel = truncated_kernel(v, cutoff, longest_reach)?;
        if kernel != [1.0] {
            convolve_axis(&mut blurred, axis, &kernel)?;
        }
    }
    Ok(blurred)
}

fn convolve_axis(image: &mut Image, axis: usize, kernel: &[f32]) -> Result<()> {
    let radius = kernel.len() / 2;
    let mut view = image.view_mut()?;
    Zip::from(view.lanes_mut(Axis(axis))).par_for_each(|mut lane| {
        let original = lane.to_vec();
        let Some(last) = original.len().checked_sub(1) else { return };
        for (i, out) in lane.iter_mut().enumerate() {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius).min(last);
            *out = (lo..=hi)
                .map(|j| kernel[j + radius - i] * original[j])
                .sum();
        }
    });
    Ok(())
}
