//! Painting corrected regional values back onto the image grid.

use nalgebra::DVector;
use rayon::prelude::*;
use serde::Deserialize;

use units::todo::Intensityf32;

use crate::image::Image;
use crate::regions::RegionSet;
use crate::{Error, Result};

/// How a voxel's value is derived from the corrected values of the regions
/// whose indicators are non-zero there
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Composition {
    /// The region with the largest indicator owns the voxel. Ties go to the
    /// region with the lowest index.
    #[default]
    Dominant,
    /// Indicator-weighted average of the corrected values: `Σ w c / Σ w`
    Weighted,
}

/// Value given to voxels which belong to no region (all indicators ≤ 0)
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    Constant(Intensityf32),
    /// Keep the uncorrected PET value
    Original,
}

impl Default for Background {
    fn default() -> Self { Background::Constant(0.0) }
}

impl Background {
    /// Constant backgrounds must be finite
    pub fn validate(&self) -> Result<()> {
        match self {
            Background::Constant(b) if !b.is_finite() => Err(Error::InvalidParameter(format!(
                "background value must be finite, got {b}"
            ))),
            _ => Ok(()),
        }
    }
}

impl std::str::FromStr for Background {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "original" { return Ok(Background::Original) }
        let background = s.parse().map(Background::Constant)
            .map_err(|_| format!("expected a number or `original`, got `{s}`"))?;
        background.validate().map_err(|_| format!("background value must be finite, got `{s}`"))?;
        Ok(background)
    }
}

pub fn compose(
    corrected  : &DVector<f64>,
    regions    : &RegionSet,
    composition: Composition,
    background : Background,
    pet        : &Image,
) -> Result<Image> {
    let k = regions.n_regions();
    if corrected.len() != k {
        return Err(Error::DimensionMismatch(format!(
            "{} corrected values for {k} regions", corrected.len()
        )));
    }
    regions.ensure_matches(&pet.fov)?;
    background.validate()?;

    let value_at = |v: usize| -> Intensityf32 {
        let background = match background {
            Background::Constant(b) => b,
            Background::Original    => pet[v],
        };
        let indicators = regions.iter().map(|(r, map)| (r, map[v]));
        match composition {
            Composition::Dominant => {
                let mut best: Option<(usize, Intensityf32)> = None;
                for (r, w) in indicators {
                    if w > 0.0 && best.map_or(true, |(_, b)| w > b) { best = Some((r, w)) }
                }
                best.map_or(background, |(r, _)| corrected[r] as Intensityf32)
            }
            Composition::Weighted => {
                let (mut weighted, mut total) = (0.0, 0.0);
                for (r, w) in indicators.filter(|&(_, w)| w > 0.0) {
                    weighted += w as f64 * corrected[r];
                    total    += w as f64;
                }
                if total > 0.0 { (weighted / total) as Intensityf32 } else { background }
            }
        }
    };

    let data = (0..pet.fov.n_voxels()).into_par_iter().map(value_at).collect();
    Image::new(pet.fov, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fov::FOV;
    use rstest::rstest;
    use pretty_assertions::assert_eq;

    fn fov() -> FOV { FOV::from_mm([4, 1, 1], [1.0, 1.0, 1.0]) }

    // Voxel 0: region 0 only; voxel 1: mostly region 1; voxel 2: a tie;
    // voxel 3: no region
    fn regions() -> RegionSet {
        RegionSet::from_stacked(fov(), 2, vec![1.0, 0.25, 0.5, 0.0,
                                               0.0, 0.75, 0.5, 0.0]).unwrap()
    }

    fn pet() -> Image { Image::new(fov(), vec![9.0, 9.0, 9.0, 7.0]).unwrap() }

    fn corrected() -> DVector<f64> { DVector::from_vec(vec![100.0, 20.0]) }

    #[rstest]
    #[case(Composition::Dominant, Background::Constant(0.0), vec![100.0, 20.0, 100.0,  0.0])]
    #[case(Composition::Dominant, Background::Constant(-1.0), vec![100.0, 20.0, 100.0, -1.0])]
    #[case(Composition::Dominant, Background::Original    , vec![100.0, 20.0, 100.0,  7.0])]
    #[case(Composition::Weighted, Background::Constant(0.0), vec![100.0, 40.0,  60.0,  0.0])]
    #[case(Composition::Weighted, Background::Original    , vec![100.0, 40.0,  60.0,  7.0])]
    fn composition_policies(
        #[case] composition: Composition,
        #[case] background: Background,
        #[case] expected: Vec<f32>,
    ) -> Result<()> {
        let image = compose(&corrected(), &regions(), composition, background, &pet())?;
        assert_eq!(image.data, expected);
        assert_eq!(image.fov, fov());
        Ok(())
    }

    #[test]
    fn wrong_number_of_values_is_rejected() {
        let result = compose(&DVector::from_vec(vec![1.0]), &regions(), Composition::Dominant,
                             Background::default(), &pet());
        assert!(matches!(result, Err(Error::DimensionMismatch(_))));
    }

    #[rstest]
    #[case("original", Background::Original)]
    #[case("0"       , Background::Constant(0.0))]
    #[case("-2.5"    , Background::Constant(-2.5))]
    fn parse_background(#[case] input: &str, #[case] expected: Background) {
        assert_eq!(input.parse::<Background>(), Ok(expected));
    }

    #[rstest]
    #[case("zero")]
    #[case("nan")]
    #[case("inf")]
    #[case("-inf")]
    fn parse_background_rejects_junk(#[case] input: &str) {
        assert!(input.parse::<Background>().is_err());
    }

    #[rstest]
    #[case(f32::NAN)]
    #[case(f32::INFINITY)]
    fn non_finite_background_is_not_painted(#[case] value: f32) {
        let result = compose(&corrected(), &regions(), Composition::Dominant,
                             Background::Constant(value), &pet());
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }
}
