//! Construction of the Geometric Transfer Matrix (Rousset et al., 1998).
//!
//! `G[(i, j)]` is the fraction of a uniform unit activity in region `j` which
//! is observed, after blurring by the PSF, as the mean signal in region `i`.

use nalgebra::DMatrix;
use rayon::prelude::*;
use tracing::{debug, info};

use units::{Ratio, todo::VoxelVariancef32};

use crate::gauss;
use crate::regions::RegionSet;
use crate::{Error, Result};

pub fn transfer_matrix(
    regions : &RegionSet,
    variance: [VoxelVariancef32; 3],
    cutoff  : Ratio,
) -> Result<DMatrix<f64>> {
    transfer_matrix_with_progress(regions, variance, cutoff, |_| {})
}

/// As `transfer_matrix`, calling `column_done` with the index of each region
/// whose column has been completed. Columns are computed in parallel, so the
/// calls arrive in no particular order.
pub fn transfer_matrix_with_progress<F>(
    regions    : &RegionSet,
    variance   : [VoxelVariancef32; 3],
    cutoff     : Ratio,
    column_done: F,
) -> Result<DMatrix<f64>>
where
    F: Fn(usize) + Sync,
{
    let weights = regions.non_empty_weights()?;
    let k = regions.n_regions();

    // Each column depends only on the blurred map of one region, so the
    // columns are independent. The blurred map is dropped as soon as its
    // column has been projected onto all regions.
    let columns = regions.par_iter()
        .map(|(j, map)| -> Result<Vec<f64>> {
            let blurred = gauss::blur(map, variance, cutoff)?;
            let column: Vec<f64> = regions.iter()
                .map(|(i, region)| region.dot(&blurred) / weights[i])
                .collect();
            debug!(region = j, diagonal = column[j], "transfer matrix column");
            column_done(j);
            Ok(column)
        })
        .collect::<Result<Vec<_>>>()?;

    let g = DMatrix::from_fn(k, k, |i, j| columns[j][i]);
    if let Some(bad) = g.iter().find(|v| !v.is_finite()) {
        return Err(Error::Numerical(format!("transfer matrix contains non-finite entry {bad}")));
    }
    info!(regions = k, "built {k}x{k} transfer matrix");
    Ok(g)
}
