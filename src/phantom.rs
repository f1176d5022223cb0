//! Synthetic phantoms built from axis-aligned cuboids of uniform activity,
//! for generating test data with known true regional activities.

use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Poisson};
use rayon::prelude::*;

use units::{mm, Length, todo::Intensityf32};

use crate::fov::FOV;
use crate::image::Image;
use crate::regions::RegionSet;
use crate::{Error, Result};

#[derive(Clone, Copy, Debug)]
pub struct Cuboid {
    pub centre: [Length; 3],
    /// Full widths along each axis
    pub size: [Length; 3],
    pub activity: Intensityf32,
}

impl Cuboid {
    /// Half-open along each axis, so that cuboids sharing a face never share
    /// a voxel
    pub fn contains(&self, p: [Length; 3]) -> bool {
        (0..3).all(|a| {
            let half = self.size[a] / 2.0;
            p[a] >= self.centre[a] - half && p[a] < self.centre[a] + half
        })
    }
}

#[derive(Clone, Debug)]
pub struct Phantom {
    pub fov: FOV,
    /// Where cuboids overlap, the earlier one takes the voxel
    pub cuboids: Vec<Cuboid>,
}

impl Phantom {

    /// Index of the cuboid which owns each voxel
    fn owners(&self) -> Vec<Option<usize>> {
        (0..self.fov.n_voxels()).into_par_iter()
            .map(|i| {
                let p = self.fov.voxel_centre1(i);
                self.cuboids.iter().position(|c| c.contains(p))
            })
            .collect()
    }

    /// One binary indicator map per cuboid
    pub fn regions(&self) -> Result<RegionSet> {
        let owners = self.owners();
        let maps = (0..self.cuboids.len())
            .map(|k| {
                let data = owners.iter()
                    .map(|&o| if o == Some(k) { 1.0 } else { 0.0 })
                    .collect();
                Image::new(self.fov, data)
            })
            .collect::<Result<Vec<_>>>()?;
        RegionSet::new(maps)
    }

    /// The true activity distribution: zero outside all cuboids
    pub fn activity(&self) -> Image {
        let data = self.owners().into_iter()
            .map(|o| o.map_or(0.0, |k| self.cuboids[k].activity))
            .collect();
        Image { fov: self.fov, data }
    }

    /// Cuboid `k` labelled `k + 1`; zero outside all cuboids
    pub fn label_image(&self) -> Image {
        let data = self.owners().into_iter()
            .map(|o| o.map_or(0.0, |k| (k + 1) as Intensityf32))
            .collect();
        Image { fov: self.fov, data }
    }

    pub fn true_activities(&self) -> Vec<f64> {
        self.cuboids.iter().map(|c| c.activity as f64).collect()
    }
}

/// Two face-sharing 10×10×10 voxel cubes on a 2 mm grid, with activities 100
/// and 50, surrounded by 5 voxels of zero-activity background
pub fn two_cubes() -> Phantom {
    let fov = FOV::from_mm([30, 20, 20], [2.0, 2.0, 2.0]);
    let side = [mm(20.0); 3];
    Phantom {
        fov,
        cuboids: vec![
            Cuboid { centre: [mm(-10.0), mm(0.0), mm(0.0)], size: side, activity: 100.0 },
            Cuboid { centre: [mm( 10.0), mm(0.0), mm(0.0)], size: side, activity:  50.0 },
        ],
    }
}

/// Replace each voxel value `v` by a Poisson sample with mean `v * counts`,
/// rescaled by `1 / counts`. Larger `counts` means less relative noise.
pub fn add_poisson_noise(image: &Image, counts: f64, seed: u64) -> Result<Image> {
    if !(counts > 0.0) || !counts.is_finite() {
        return Err(Error::InvalidParameter(format!("noise counts must be positive, got {counts}")));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut noisy = image.clone();
    for voxel in noisy.data.iter_mut() {
        let lambda = *voxel as f64 * counts;
        if lambda > 0.0 {
            let poisson = Poisson::new(lambda)
                .map_err(|e| Error::InvalidParameter(format!("voxel value {voxel}: {e}")))?;
            let sample: f64 = poisson.sample(&mut rng);
            *voxel = (sample / counts) as Intensityf32;
        } else {
            *voxel = 0.0;
        }
    }
    Ok(noisy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    #[test]
    fn two_cubes_have_1000_voxels_each() -> Result<()> {
        let phantom = two_cubes();
        let regions = phantom.regions()?;
        assert_eq!(regions.n_regions(), 2);
        assert_eq!(regions.weights(), vec![1000.0, 1000.0]);
        let activity = phantom.activity();
        assert_eq!(activity.sum(), 1000.0 * 100.0 + 1000.0 * 50.0);
        assert_eq!(phantom.true_activities(), vec![100.0, 50.0]);
        Ok(())
    }

    #[test]
    fn label_image_describes_the_same_regions() -> Result<()> {
        let phantom = two_cubes();
        let from_labels = RegionSet::from_labels(&phantom.label_image())?;
        let direct = phantom.regions()?;
        assert_eq!(from_labels.labels(), direct.labels());
        assert_eq!(from_labels.map(0), direct.map(0));
        assert_eq!(from_labels.map(1), direct.map(1));
        Ok(())
    }

    #[test]
    fn cubes_share_a_face_but_no_voxels() -> Result<()> {
        let regions = two_cubes().regions()?;
        assert_eq!(regions.map(0).dot(regions.map(1)), 0.0);
        // Voxels with x-index 14 and 15 straddle the shared face
        assert_eq!(regions.map(0)[[14, 10, 10]], 1.0);
        assert_eq!(regions.map(1)[[15, 10, 10]], 1.0);
        assert_eq!(regions.map(0)[[4, 10, 10]], 0.0);
        Ok(())
    }

    #[test]
    fn earlier_cuboid_wins_overlap() -> Result<()> {
        let fov = FOV::from_mm([4, 1, 1], [1.0, 1.0, 1.0]);
        let c = |x: f32, a: f32| Cuboid { centre: [mm(x), mm(0.0), mm(0.0)], size: [mm(3.0), mm(1.0), mm(1.0)], activity: a };
        let phantom = Phantom { fov, cuboids: vec![c(-0.5, 1.0), c(0.5, 2.0)] };
        assert_eq!(phantom.activity().data, vec![1.0, 1.0, 1.0, 2.0]);
        Ok(())
    }

    #[test]
    fn poisson_noise_is_reproducible_and_unbiased() -> Result<()> {
        let image = Image::filled(FOV::from_mm([20, 20, 20], [1.0, 1.0, 1.0]), 10.0);
        let a = add_poisson_noise(&image, 5.0, 42)?;
        let b = add_poisson_noise(&image, 5.0, 42)?;
        assert_eq!(a, b);
        assert_ne!(a, image);
        let mean = a.sum() / a.data.len() as f64;
        assert_float_eq!(mean, 10.0, abs <= 0.1);
        Ok(())
    }

    #[test]
    fn noise_requires_positive_counts() {
        let image = Image::filled(FOV::from_mm([2, 2, 2], [1.0, 1.0, 1.0]), 1.0);
        assert!(matches!(add_poisson_noise(&image, 0.0, 1), Err(Error::InvalidParameter(_))));
    }
}
