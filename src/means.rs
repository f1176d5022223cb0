//! Observed regional means of a PET image.

use nalgebra::DVector;
use rayon::prelude::*;

use crate::image::Image;
use crate::regions::RegionSet;
use crate::{Error, Result};

/// Indicator-weighted mean PET intensity in each region:
/// `Σ_v indicator(v) pet(v) / Σ_v indicator(v)`
pub fn regional_means(pet: &Image, regions: &RegionSet) -> Result<DVector<f64>> {
    regions.ensure_matches(&pet.fov)?;
    let means = regions.par_iter()
        .map(|(k, map)| {
            let weight = map.sum();
            if !(weight > 0.0) { return Err(Error::EmptyRegion { region: k }) }
            let mean = map.dot(pet) / weight;
            if !mean.is_finite() {
                return Err(Error::Numerical(format!("mean of region {k} is {mean}")));
            }
            Ok(mean)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(DVector::from_vec(means))
}
