//! The partition of the image grid into anatomical regions, each described
//! by an indicator (or membership probability) map.

use std::collections::BTreeSet;

use rayon::prelude::*;

use units::todo::Weightf32;

use crate::fov::FOV;
use crate::image::Image;
use crate::{Error, Result};

#[derive(Clone, Debug)]
pub struct RegionSet {
    fov: FOV,
    maps: Vec<Image>,
    labels: Vec<u32>,
}

impl RegionSet {

    /// Regions labelled `1..=K`, in the order given
    pub fn new(maps: Vec<Image>) -> Result<Self> {
        let labels = (1..=maps.len() as u32).collect();
        Self::with_labels(maps, labels)
    }

    pub fn with_labels(maps: Vec<Image>, labels: Vec<u32>) -> Result<Self> {
        let first = maps.first().ok_or_else(|| Error::DimensionMismatch(
            "the mask must contain at least one region".into()
        ))?;
        let fov = first.fov;
        if labels.len() != maps.len() {
            return Err(Error::DimensionMismatch(format!(
                "{} labels given for {} regions", labels.len(), maps.len()
            )));
        }
        for (k, map) in maps.iter().enumerate() {
            if !map.fov.matches(&fov) {
                return Err(Error::DimensionMismatch(format!(
                    "region {k} grid {} differs from region 0 grid {}",
                    map.fov.describe(), fov.describe()
                )));
            }
            if !map.all_finite() {
                return Err(Error::InvalidParameter(format!(
                    "region {k} indicator map contains non-finite values"
                )));
            }
        }
        Ok(Self { fov, maps, labels })
    }

    /// Split the data of a 4D mask (three spatial axes plus a region axis
    /// varying slowest) into `n_regions` indicator maps
    pub fn from_stacked(fov: FOV, n_regions: usize, data: Vec<Weightf32>) -> Result<Self> {
        let n = fov.n_voxels();
        if data.len() != n * n_regions {
            return Err(Error::DimensionMismatch(format!(
                "mask holds {} values, expected {n_regions} regions of {}", data.len(), fov.describe()
            )));
        }
        if n == 0 {
            return Err(Error::DimensionMismatch("mask has an empty spatial grid".into()));
        }
        let maps = data
            .chunks_exact(n)
            .map(|chunk| Image::new(fov, chunk.to_vec()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(maps)
    }

    /// Build one binary indicator map per distinct non-zero value in
    /// `label_image`, ordered by label. Zero is background.
    pub fn from_labels(label_image: &Image) -> Result<Self> {
        let mut labels = BTreeSet::new();
        for &v in &label_image.data {
            if !v.is_finite() || v < 0.0 || v.fract() != 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "label images must contain non-negative integers, found {v}"
                )));
            }
            if v >= u32::MAX as f32 {
                return Err(Error::InvalidParameter(format!(
                    "label {v} is too large, labels must be below {}", u32::MAX
                )));
            }
            if v != 0.0 { labels.insert(v as u32); }
        }
        let labels: Vec<u32> = labels.into_iter().collect();
        let maps: Vec<Image> = labels.par_iter()
            .map(|&label| {
                let data = label_image.data.iter()
                    .map(|&v| if v as u32 == label && v != 0.0 { 1.0 } else { 0.0 })
                    .collect();
                Image { fov: label_image.fov, data }
            })
            .collect();
        Self::with_labels(maps, labels)
    }

    /// Number of regions, K
    pub fn n_regions(&self) -> usize { self.maps.len() }

    pub fn fov(&self) -> FOV { self.fov }

    pub fn labels(&self) -> &[u32] { &self.labels }

    pub fn map(&self, region: usize) -> &Image { &self.maps[region] }

    /// `(region index, indicator map)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Image)> + '_ {
        self.maps.iter().enumerate()
    }

    pub fn par_iter(&self) -> impl IndexedParallelIterator<Item = (usize, &Image)> + '_ {
        self.maps.par_iter().enumerate()
    }

    /// Total indicator weight of each region: `Σ_v indicator(v)`
    pub fn weights(&self) -> Vec<f64> {
        self.maps.par_iter().map(Image::sum).collect()
    }

    /// Region weights, or `EmptyRegion` for the first region whose indicator
    /// map sums to zero
    pub fn non_empty_weights(&self) -> Result<Vec<f64>> {
        let weights = self.weights();
        match weights.iter().position(|&w| !(w > 0.0)) {
            Some(region) => Err(Error::EmptyRegion { region }),
            None         => Ok(weights),
        }
    }

    /// Fail with `DimensionMismatch` unless the regions live on the grid of
    /// the PET image
    pub fn ensure_matches(&self, pet: &FOV) -> Result<()> {
        pet.ensure_matches(&self.fov, "mask")
    }

    /// All indicator maps concatenated, region axis varying slowest
    pub fn stacked_data(&self) -> Vec<Weightf32> {
        self.maps.iter().flat_map(|m| m.data.iter().copied()).collect()
    }
}
