/// Quantities which are plain `f32` aliases rather than `uom` `Quantity`s.
///
/// Voxel-grid arithmetic (indicator weights, intensities, variances measured
/// in voxel units) happens in tight loops over flat buffers, where wrapping
/// every value in a `Quantity` buys nothing but noise. The aliases still say
/// what the numbers mean.

pub type Lengthf32    = f32;
pub type Ratiof32     = f32;
pub type Weightf32    = f32; // indicator / membership value of a voxel
pub type Intensityf32 = f32; // TODO uom activity concentration (Bq/ml)

/// Variance of a Gaussian, in units of voxel spacing squared
pub type VoxelVariancef32 = f32;
