/// The extent and granularity of the voxel grid on which PET images and
/// region maps are defined

use units::{mm, mm_, Length, todo::Lengthf32};
use float_eq::float_eq;

use crate::index::{BoxDim_u, Index3_u, Index1_u, index1_to_3, n_voxels};
use crate::{Error, Result};

/// Voxel spacings which differ by less than this (relative) are considered
/// equal. Spacings are usually stored in files as `f32`s derived from
/// scanner geometry, so exact comparison is too strict.
const SPACING_TOLERANCE: Lengthf32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FOV {
    /// Number of voxels along each axis
    pub n: BoxDim_u,
    /// Physical spacing between voxel centres along each axis
    pub voxel_size: [Length; 3],
}

impl FOV {

    pub fn new(n: BoxDim_u, voxel_size: [Length; 3]) -> Self {
        Self { n, voxel_size }
    }

    /// Construct from voxel spacings given as `f32`s in mm
    pub fn from_mm(n: BoxDim_u, [dx, dy, dz]: [Lengthf32; 3]) -> Self {
        Self::new(n, [mm(dx), mm(dy), mm(dz)])
    }

    pub fn n_voxels(&self) -> usize { n_voxels(self.n) }

    /// Full width of the grid along each axis
    pub fn full_size(&self) -> [Length; 3] {
        let [nx, ny, nz] = self.n;
        let [dx, dy, dz] = self.voxel_size;
        [dx * nx as f32, dy * ny as f32, dz * nz as f32]
    }

    /// Find centre of voxel with given 3D index. The grid is centred on the
    /// origin.
    pub fn voxel_centre(&self, i: Index3_u) -> [Length; 3] {
        let full = self.full_size();
        let s = self.voxel_size;
        [(i[0] as Lengthf32 + 0.5) * s[0] - full[0] / 2.0,
         (i[1] as Lengthf32 + 0.5) * s[1] - full[1] / 2.0,
         (i[2] as Lengthf32 + 0.5) * s[2] - full[2] / 2.0,]
    }

    /// Find centre of voxel with given 1D index
    pub fn voxel_centre1(&self, i: Index1_u) -> [Length; 3] {
        self.voxel_centre(index1_to_3(i, self.n))
    }

    /// Same number of voxels, and spacings equal within tolerance
    pub fn matches(&self, other: &FOV) -> bool {
        self.n == other.n &&
            self.voxel_size.iter().zip(other.voxel_size.iter())
            .all(|(&a, &b)| float_eq!(mm_(a), mm_(b), rmax <= SPACING_TOLERANCE))
    }

    /// Fail with `DimensionMismatch` unless `other` describes the same grid.
    /// `what` names the volume being checked, for the diagnostic.
    pub fn ensure_matches(&self, other: &FOV, what: &str) -> Result<()> {
        if self.matches(other) { return Ok(()) }
        Err(Error::DimensionMismatch(format!(
            "{what} grid {} does not match PET grid {}", other.describe(), self.describe()
        )))
    }

    /// Human-readable summary, e.g. `30x20x20 voxels of 2x2x2.5 mm`
    pub fn describe(&self) -> String {
        let [nx, ny, nz] = self.n;
        let [dx, dy, dz] = self.voxel_size.map(mm_);
        format!("{nx}x{ny}x{nz} voxels of {dx}x{dy}x{dz} mm")
    }
}

#[cfg(test)]
mod test_fov {
    use super::*;
    use rstest::rstest;
    use float_eq::assert_float_eq;

    #[rstest]
    #[case([0,0,0], [-1.0, -1.0, -1.0])]
    #[case([0,0,1], [-1.0, -1.0,  1.0])]
    #[case([0,1,0], [-1.0,  1.0, -1.0])]
    #[case([1,0,0], [ 1.0, -1.0, -1.0])]
    #[case([1,1,1], [ 1.0,  1.0,  1.0])]
    fn test_voxel_centre(#[case] index: Index3_u, #[case] expected_position: [Lengthf32; 3]) {
        let fov = FOV::from_mm([2,2,2], [2.0, 2.0, 2.0]);
        let c = fov.voxel_centre(index).map(mm_);
        assert_float_eq!(c, expected_position, abs_all <= 1e-6);
    }

    #[test]
    fn voxel_centre_anisotropic() {
        let fov = FOV::from_mm([4, 2, 1], [1.0, 3.0, 5.0]);
        let c = fov.voxel_centre([3, 0, 0]).map(mm_);
        assert_float_eq!(c, [1.5, -1.5, 0.0], abs_all <= 1e-6);
        assert_eq!(fov.voxel_centre1(3), fov.voxel_centre([3, 0, 0]));
    }

    #[test]
    fn tiny_spacing_differences_match() {
        let a = FOV::from_mm([10, 10, 10], [2.0, 2.0, 2.0]);
        let b = FOV::from_mm([10, 10, 10], [2.00001, 2.0, 1.99999]);
        assert!(a.matches(&b));
        assert!(a.ensure_matches(&b, "mask").is_ok());
    }

    #[rstest]
    #[case(FOV::from_mm([10, 10,  9], [2.0, 2.0, 2.0]))]
    #[case(FOV::from_mm([10, 10, 10], [2.0, 2.0, 2.1]))]
    #[case(FOV::from_mm([ 9, 10, 10], [2.0, 2.0, 2.0]))]
    fn different_grids_do_not_match(#[case] other: FOV) {
        let pet = FOV::from_mm([10, 10, 10], [2.0, 2.0, 2.0]);
        assert!(!pet.matches(&other));
        assert!(matches!(pet.ensure_matches(&other, "mask"), Err(Error::DimensionMismatch(_))));
    }
}
