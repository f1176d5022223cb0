use ndarray::{azip, ArrayView3, ArrayViewMut3, ShapeBuilder};

use units::todo::Intensityf32;

use crate::fov::FOV;
use crate::index::{index3_to_1, Index1_u, Index3_u};
use crate::{Error, Result};

pub type ImageData = Vec<Intensityf32>;

/// A scalar field over a voxel grid. Data are stored with x varying fastest.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub fov: FOV,
    pub data: ImageData,
}

impl core::ops::IndexMut<Index1_u> for Image {
    #[inline]
    fn index_mut(&mut self, i: Index1_u) -> &mut Self::Output { &mut self.data[i] }
}

impl core::ops::Index<Index1_u> for Image {
    type Output = Intensityf32;
    #[inline]
    fn index(&self, i: Index1_u) -> &Self::Output { &self.data[i] }
}

impl core::ops::IndexMut<Index3_u> for Image {
    fn index_mut(&mut self, i3: Index3_u) -> &mut Self::Output {
        let i1 = index3_to_1(i3, self.fov.n);
        &mut self.data[i1]
    }
}

impl core::ops::Index<Index3_u> for Image {
    type Output = Intensityf32;
    fn index(&self, i3: Index3_u) -> &Self::Output {
        let i1 = index3_to_1(i3, self.fov.n);
        &self.data[i1]
    }
}

impl Image {

    pub fn new(fov: FOV, data: ImageData) -> Result<Self> {
        if data.len() != fov.n_voxels() {
            return Err(Error::DimensionMismatch(format!(
                "{} values supplied for a grid of {}", data.len(), fov.describe()
            )));
        }
        Ok(Image { fov, data })
    }

    pub fn filled(fov: FOV, value: Intensityf32) -> Self {
        Self { data: vec![value; fov.n_voxels()], fov }
    }

    pub fn zeros(fov: FOV) -> Self { Self::filled(fov, 0.0) }

    /// 3D view indexed by `[ix, iy, iz]`
    pub fn view(&self) -> Result<ArrayView3<'_, Intensityf32>> {
        let [nx, ny, nz] = self.fov.n;
        ArrayView3::from_shape((nx, ny, nz).f(), &self.data)
            .map_err(|e| Error::DimensionMismatch(e.to_string()))
    }

    /// Mutable 3D view indexed by `[ix, iy, iz]`
    pub fn view_mut(&mut self) -> Result<ArrayViewMut3<'_, Intensityf32>> {
        let [nx, ny, nz] = self.fov.n;
        ArrayViewMut3::from_shape((nx, ny, nz).f(), &mut self.data)
            .map_err(|e| Error::DimensionMismatch(e.to_string()))
    }

    /// Sum of all voxel values, accumulated in `f64`
    pub fn sum(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }

    /// Voxel-wise product of two images, summed in `f64`
    pub fn dot(&self, other: &Image) -> f64 {
        let mut total = 0.0;
        azip!((&a in self.data.as_slice(), &b in other.data.as_slice()) total += a as f64 * b as f64);
        total
    }

    pub fn max(&self) -> Intensityf32 {
        self.data.iter().copied().fold(Intensityf32::NEG_INFINITY, Intensityf32::max)
    }

    pub fn all_finite(&self) -> bool { self.data.iter().all(|v| v.is_finite()) }
}
